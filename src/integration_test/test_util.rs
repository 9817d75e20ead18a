use crate::app_env;
use crate::persistence;
use lazy_static::lazy_static;
use rand::{thread_rng, Rng};
use sqlx::{Connection, PgConnection, PgPool};
use std::{env, future::Future, panic, pin::Pin};
use tokio::runtime::Runtime;

lazy_static! {
    static ref TOKIO_RT: Runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Tokio runtime failed to initialize");
}

/// Future produced by a database test body
pub type DbTest = Pin<Box<dyn Future<Output = ()> + Send>>;

struct TestDatabase {
    base_url: String,
    db_name: String,
}

impl TestDatabase {
    async fn create(base_url: &str) -> Result<Self, sqlx::Error> {
        let mut rng = thread_rng();
        let schema_id: u32 = rng.gen_range(10_000..99_999);
        let db_name = format!("test_db_{}", schema_id);
        let mut conn = PgConnection::connect(base_url).await?;

        sqlx::query(format!("CREATE DATABASE {} TEMPLATE template0", db_name).as_str())
            .execute(&mut conn)
            .await?;

        Ok(Self {
            base_url: String::from(base_url),
            db_name,
        })
    }

    fn url(&self) -> String {
        format!("{}/{}", self.base_url, self.db_name)
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let db_to_drop = self.db_name.clone();
        let conn_str = self.base_url.clone();

        TOKIO_RT.block_on(async move {
            let conn = PgConnection::connect(conn_str.as_str()).await;
            let mut conn = match conn {
                Ok(cxn) => cxn,
                Err(conn_err) => {
                    println!(
                        "Failed to reconnect to database to drop test database {}, please remove it manually. Error: {}",
                        db_to_drop, conn_err
                    );
                    return;
                }
            };

            let drop_result = sqlx::query(format!("DROP DATABASE {}", db_to_drop).as_str())
                .execute(&mut conn)
                .await;
            if let Err(db_err) = drop_result {
                println!(
                    "Failed to drop test database {}, please remove it manually. Error: {}",
                    db_to_drop, db_err
                );
            }
        });
    }
}

/// Creates a fresh database for a test, applies the migrations in `migrations/`, and hands the
/// test a pool connected to it. The database is dropped afterwards even if the test panics.
///
/// Expects that the TEST_DB_URL environment variable is populated
pub fn prepare_db_and_test<F>(test_fn: F)
where
    F: FnOnce(PgPool) -> DbTest,
{
    let pg_connection_base_url = env::var(app_env::test::TEST_DB_URL).expect(
        "You must provide the TEST_DB_URL environment variable as the base postgres connection string",
    );

    let (test_db, test_outcome) = TOKIO_RT.block_on(async move {
        let test_db = match TestDatabase::create(&pg_connection_base_url).await {
            Ok(tdb) => tdb,
            Err(db_err) => panic!("Failed to start test database: {}", db_err),
        };

        let sqlx_pool = persistence::connect_sqlx(&test_db.url())
            .await
            .expect("Could not connect to the test database");
        sqlx::migrate!("./migrations")
            .run(&sqlx_pool)
            .await
            .expect("Could not migrate the test database");

        let test_outcome = tokio::spawn(test_fn(sqlx_pool.clone())).await;
        sqlx_pool.close().await;

        (test_db, test_outcome)
    });

    drop(test_db);
    if let Err(join_err) = test_outcome {
        if join_err.is_panic() {
            panic::resume_unwind(join_err.into_panic());
        }
        panic!("Test task did not finish: {join_err}");
    }
}
