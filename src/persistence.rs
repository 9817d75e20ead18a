pub mod db_todo_driven_ports;
pub mod db_user_driven_ports;

use crate::external_connections;
use crate::external_connections::ConnectionHandle;
use anyhow::Context;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool, Postgres};
use std::time::Duration;

/// Postgres-backed [external_connections::ExternalConnectivity]. Cloning is cheap and shares the
/// underlying pool, so each request handler takes its own copy.
#[derive(Clone)]
pub struct ExternalConnectivity {
    db: PgPool,
}

impl ExternalConnectivity {
    pub fn new(db: PgPool) -> Self {
        ExternalConnectivity { db }
    }
}

/// A pooled connection, returned to the pool on drop
pub struct PoolConnectionHandle {
    active_connection: PoolConnection<Postgres>,
}

impl ConnectionHandle for PoolConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection {
        &mut self.active_connection
    }
}

impl external_connections::ExternalConnectivity for ExternalConnectivity {
    type DbHandle<'cxn_borrow> = PoolConnectionHandle;

    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error> {
        let active_connection = self
            .db
            .acquire()
            .await
            .context("acquiring a connection from the pool")?;

        Ok(PoolConnectionHandle { active_connection })
    }
}

const MAX_POOL_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the application's connection pool, failing fast if the database can't be reached
pub async fn connect_sqlx(db_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_POOL_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(db_url)
        .await
}

/// Row shape of a `SELECT count(*) AS count` query
#[derive(sqlx::FromRow)]
struct Count {
    count: Option<i64>,
}

impl Count {
    fn count(&self) -> i64 {
        self.count.unwrap_or_default()
    }
}

/// Row shape of an `INSERT ... RETURNING id`
#[derive(sqlx::FromRow)]
struct NewId {
    id: i32,
}
