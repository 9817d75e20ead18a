use sqlx::PgConnection;

/// Something that lends out a live database connection for the duration of a single operation
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Hands out clients for the external systems the application talks to, so business logic
/// can stay agnostic of where its data actually lives.
///
/// Every call to [ExternalConnectivity::database_cxn] acquires a fresh connection which is
/// released when the returned handle is dropped. Driven adapters should hold the handle for one
/// statement only.
pub trait ExternalConnectivity: Sync {
    type DbHandle<'cxn_borrow>: ConnectionHandle + Send
    where
        Self: 'cxn_borrow;

    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
}
