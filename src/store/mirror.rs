use super::{StoreError, MIRROR_TABLE, STATE_TABLE};
use redb::{Database, ReadableTable};
use std::sync::Arc;
use tracing::debug;

const NEXT_SEQ_KEY: &str = "next_seq";

/// Durable mirror of the user's list.
///
/// Keys are the item values themselves; presence of a key is membership.
/// The stored value is a monotonically increasing sequence number so that
/// `list_all` can return items in insertion order.
#[derive(Clone)]
pub struct MirrorStore {
    db: Arc<Database>,
}

impl MirrorStore {
    pub(crate) fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert `item`. Returns `false` if it was already present, which is
    /// an expected outcome rather than an error.
    pub fn put(&self, item: &str) -> Result<bool, StoreError> {
        let txn = self.db.begin_write()?;
        let inserted = {
            let mut mirror = txn.open_table(MIRROR_TABLE)?;
            if mirror.get(item)?.is_some() {
                false
            } else {
                let mut state = txn.open_table(STATE_TABLE)?;
                let seq = state.get(NEXT_SEQ_KEY)?.map(|v| v.value()).unwrap_or(0);
                state.insert(NEXT_SEQ_KEY, seq + 1)?;
                mirror.insert(item, seq)?;
                true
            }
        };
        txn.commit()?;

        if !inserted {
            debug!("Mirror already holds {:?}, put ignored", item);
        }
        Ok(inserted)
    }

    /// Remove `item`. Returns `false` if it was not present.
    pub fn delete(&self, item: &str) -> Result<bool, StoreError> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut mirror = txn.open_table(MIRROR_TABLE)?;
            let removed = mirror.remove(item)?.is_some();
            removed
        };
        txn.commit()?;

        if !removed {
            debug!("Mirror has no {:?}, delete ignored", item);
        }
        Ok(removed)
    }

    pub fn contains(&self, item: &str) -> Result<bool, StoreError> {
        let txn = self.db.begin_read()?;
        let mirror = txn.open_table(MIRROR_TABLE)?;
        let found = mirror.get(item)?.is_some();
        Ok(found)
    }

    /// All mirrored items, oldest insertion first.
    pub fn list_all(&self) -> Result<Vec<String>, StoreError> {
        let txn = self.db.begin_read()?;
        let mirror = txn.open_table(MIRROR_TABLE)?;

        let mut entries = Vec::new();
        for entry in mirror.iter()? {
            let (item, seq) = entry?;
            entries.push((seq.value(), item.value().to_string()));
        }
        entries.sort_by_key(|(seq, _)| *seq);

        Ok(entries.into_iter().map(|(_, item)| item).collect())
    }

    /// Empty the mirror. Called at logout so one identity's list never
    /// shows up in another session.
    pub fn clear(&self) -> Result<(), StoreError> {
        let txn = self.db.begin_write()?;
        txn.delete_table(MIRROR_TABLE)?;
        txn.open_table(MIRROR_TABLE)?;
        txn.commit()?;
        Ok(())
    }

    /// Replace the whole mirror with `items` in a single transaction.
    /// Duplicates in `items` keep their first position.
    pub fn replace_all(&self, items: &[String]) -> Result<(), StoreError> {
        let txn = self.db.begin_write()?;
        txn.delete_table(MIRROR_TABLE)?;
        {
            let mut mirror = txn.open_table(MIRROR_TABLE)?;
            let mut state = txn.open_table(STATE_TABLE)?;
            let mut seq = state.get(NEXT_SEQ_KEY)?.map(|v| v.value()).unwrap_or(0);
            for item in items {
                if mirror.get(item.as_str())?.is_some() {
                    continue;
                }
                mirror.insert(item.as_str(), seq)?;
                seq += 1;
            }
            state.insert(NEXT_SEQ_KEY, seq)?;
        }
        txn.commit()?;
        Ok(())
    }
}
