/// Errors from the redb-backed stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to open database: {0}")]
    Database(#[from] redb::DatabaseError),
    #[error("failed to begin transaction: {0}")]
    Transaction(#[from] redb::TransactionError),
    #[error("failed to open table: {0}")]
    Table(#[from] redb::TableError),
    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("failed to commit: {0}")]
    Commit(#[from] redb::CommitError),
    #[error("storage task did not complete: {0}")]
    Task(String),
    #[error("corrupt record for {key}: {reason}")]
    Corrupt { key: String, reason: String },
}
