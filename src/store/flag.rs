use super::{StoreError, STATE_TABLE};
use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable};
use std::fmt;
use std::sync::Arc;

const SYNC_NEEDED_KEY: &str = "sync_needed";
const LAST_SYNCED_KEY: &str = "last_synced_at_ms";

/// Whether local state has diverged from the remote authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Clean,
    Dirty,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Clean => write!(f, "CLEAN"),
            SyncStatus::Dirty => write!(f, "DIRTY"),
        }
    }
}

/// Persisted sync-needed flag.
///
/// Scoped to the local database (one per profile), not to a user. The flag
/// is set the moment a mutation skips or fails its remote confirmation and
/// is cleared only after a whole-list replace has been acknowledged.
#[derive(Clone)]
pub struct SyncFlag {
    db: Arc<Database>,
}

impl SyncFlag {
    pub(crate) fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn is_set(&self) -> Result<bool, StoreError> {
        let txn = self.db.begin_read()?;
        let state = txn.open_table(STATE_TABLE)?;
        let value = state.get(SYNC_NEEDED_KEY)?.map(|v| v.value()).unwrap_or(0);
        Ok(value != 0)
    }

    pub fn status(&self) -> Result<SyncStatus, StoreError> {
        Ok(if self.is_set()? {
            SyncStatus::Dirty
        } else {
            SyncStatus::Clean
        })
    }

    pub fn set(&self) -> Result<(), StoreError> {
        let txn = self.db.begin_write()?;
        txn.open_table(STATE_TABLE)?.insert(SYNC_NEEDED_KEY, 1u64)?;
        txn.commit()?;
        Ok(())
    }

    /// Clear the flag and record the time of the acknowledged replace.
    pub fn clear(&self) -> Result<(), StoreError> {
        let txn = self.db.begin_write()?;
        {
            let mut state = txn.open_table(STATE_TABLE)?;
            state.insert(SYNC_NEEDED_KEY, 0u64)?;
            state.insert(LAST_SYNCED_KEY, now_ms())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Drop the flag without recording a sync, discarding whatever local
    /// changes it stood for.
    pub fn reset(&self) -> Result<(), StoreError> {
        let txn = self.db.begin_write()?;
        txn.open_table(STATE_TABLE)?.insert(SYNC_NEEDED_KEY, 0u64)?;
        txn.commit()?;
        Ok(())
    }

    /// Record a confirmed read from the remote without touching the flag.
    pub fn stamp_synced(&self) -> Result<(), StoreError> {
        let txn = self.db.begin_write()?;
        txn.open_table(STATE_TABLE)?
            .insert(LAST_SYNCED_KEY, now_ms())?;
        txn.commit()?;
        Ok(())
    }

    /// When local and remote were last known to agree.
    pub fn last_synced_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let txn = self.db.begin_read()?;
        let state = txn.open_table(STATE_TABLE)?;
        let Some(ms) = state.get(LAST_SYNCED_KEY)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let ms = i64::try_from(ms).map_err(|e| StoreError::Corrupt {
            key: LAST_SYNCED_KEY.to_string(),
            reason: e.to_string(),
        })?;
        Ok(DateTime::from_timestamp_millis(ms))
    }
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;

    #[test]
    fn test_flag_starts_clean() {
        let flag = LocalStore::in_memory().unwrap().flag();
        assert!(!flag.is_set().unwrap());
        assert_eq!(flag.status().unwrap(), SyncStatus::Clean);
        assert!(flag.last_synced_at().unwrap().is_none());
    }

    #[test]
    fn test_set_then_clear() {
        let flag = LocalStore::in_memory().unwrap().flag();
        flag.set().unwrap();
        flag.set().unwrap();
        assert_eq!(flag.status().unwrap(), SyncStatus::Dirty);

        flag.clear().unwrap();
        assert_eq!(flag.status().unwrap(), SyncStatus::Clean);
        assert!(flag.last_synced_at().unwrap().is_some());
    }

    #[test]
    fn test_stamp_does_not_clear() {
        let flag = LocalStore::in_memory().unwrap().flag();
        flag.set().unwrap();
        flag.stamp_synced().unwrap();
        assert!(flag.is_set().unwrap());
        assert!(flag.last_synced_at().unwrap().is_some());
    }

    #[test]
    fn test_reset_does_not_stamp() {
        let flag = LocalStore::in_memory().unwrap().flag();
        flag.set().unwrap();
        flag.reset().unwrap();
        assert_eq!(flag.status().unwrap(), SyncStatus::Clean);
        assert!(flag.last_synced_at().unwrap().is_none());
    }

    #[test]
    fn test_flag_independent_of_mirror() {
        let store = LocalStore::in_memory().unwrap();
        store.flag().set().unwrap();
        store.mirror().put("alice").unwrap();
        store.mirror().clear().unwrap();
        assert!(store.flag().is_set().unwrap());
    }
}
