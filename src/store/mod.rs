//! Client-side durable state.
//!
//! The list mirror and the sync-needed flag live in separate tables of a
//! single redb database. Every mutation commits with immediate durability,
//! so a write that returned `Ok` survives a crash right after it.

mod error;
mod flag;
mod mirror;

pub use error::StoreError;
pub use flag::{SyncFlag, SyncStatus};
pub use mirror::MirrorStore;

use redb::backends::InMemoryBackend;
use redb::{Database, StorageBackend, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// Item value -> insertion sequence number.
pub(crate) const MIRROR_TABLE: TableDefinition<&str, u64> = TableDefinition::new("mirror");
/// Small counters and markers (sync-needed flag, next sequence, timestamps).
pub(crate) const STATE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sync_state");

/// Handle to the client's local database.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Database>,
    persistent: bool,
}

impl LocalStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Database::create(path)?;
        Self::init(db, true)
    }

    /// Create a store that lives only for this process.
    pub fn in_memory() -> Result<Self, StoreError> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::init(db, false)
    }

    /// Create a store on a caller-supplied redb backend.
    pub fn with_backend(backend: impl StorageBackend) -> Result<Self, StoreError> {
        let db = Database::builder().create_with_backend(backend)?;
        Self::init(db, false)
    }

    /// Open the database file, falling back to an in-memory store if the
    /// file cannot be used. The session keeps working, it just forgets
    /// everything on exit.
    pub fn open_or_degrade(path: &Path) -> Result<Self, StoreError> {
        match Self::open(path) {
            Ok(store) => {
                info!("Opened local store at {}", path.display());
                Ok(store)
            }
            Err(e) => {
                error!(
                    "Local store at {} unavailable ({}), continuing in memory only",
                    path.display(),
                    e
                );
                Self::in_memory()
            }
        }
    }

    fn init(db: Database, persistent: bool) -> Result<Self, StoreError> {
        // Create both tables up front so read transactions never miss them.
        let txn = db.begin_write()?;
        txn.open_table(MIRROR_TABLE)?;
        txn.open_table(STATE_TABLE)?;
        txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            persistent,
        })
    }

    /// Whether writes survive process exit.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn mirror(&self) -> MirrorStore {
        MirrorStore::new(self.db.clone())
    }

    pub fn flag(&self) -> SyncFlag {
        SyncFlag::new(self.db.clone())
    }
}

/// Run a store operation on the blocking pool so redb commits never stall
/// an async worker.
pub async fn blocking<T, F>(op: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}
