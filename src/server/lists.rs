//! Per-user list storage for the server.
//!
//! Each user's list is one JSON `{ "iconList": [...] }` value keyed by user
//! id. Every request runs in a single write transaction, so the
//! read-modify-write of one request is atomic.

use crate::remote::IconList;
use crate::store::StoreError;
use redb::backends::InMemoryBackend;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use tracing::info;

const USERS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("users");

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("value {0:?} is already saved")]
    AlreadySaved(String),
    #[error("value {0:?} is not saved")]
    NotSaved(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("corrupt list for {user}: {source}")]
    Corrupt {
        user: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode list for {user}: {source}")]
    Encode {
        user: String,
        #[source]
        source: serde_json::Error,
    },
}

fn store_err(e: impl Into<StoreError>) -> ListError {
    ListError::Store(e.into())
}

pub struct UserLists {
    db: Database,
}

impl UserLists {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::init(Database::create(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::init(Database::builder().create_with_backend(InMemoryBackend::new())?)
    }

    fn init(db: Database) -> Result<Self, StoreError> {
        let txn = db.begin_write()?;
        txn.open_table(USERS_TABLE)?;
        txn.commit()?;
        Ok(Self { db })
    }

    /// The user's list; a user seen for the first time is provisioned with
    /// an empty one.
    pub fn read(&self, user_id: &str) -> Result<Vec<String>, ListError> {
        self.update(user_id, |_| Ok(()))
    }

    pub fn append(&self, user_id: &str, value: &str) -> Result<Vec<String>, ListError> {
        self.update(user_id, |list| {
            if list.iter().any(|v| v == value) {
                return Err(ListError::AlreadySaved(value.to_string()));
            }
            list.push(value.to_string());
            Ok(())
        })
    }

    pub fn remove(&self, user_id: &str, value: &str) -> Result<Vec<String>, ListError> {
        self.update(user_id, |list| {
            let index = list
                .iter()
                .position(|v| v == value)
                .ok_or_else(|| ListError::NotSaved(value.to_string()))?;
            list.remove(index);
            Ok(())
        })
    }

    /// Overwrite the list. Repeated values keep their first occurrence.
    pub fn replace(&self, user_id: &str, items: Vec<String>) -> Result<Vec<String>, ListError> {
        self.update(user_id, move |list| {
            list.clear();
            for item in items {
                if !list.contains(&item) {
                    list.push(item);
                }
            }
            Ok(())
        })
    }

    fn update<F>(&self, user_id: &str, f: F) -> Result<Vec<String>, ListError>
    where
        F: FnOnce(&mut Vec<String>) -> Result<(), ListError>,
    {
        let txn = self.db.begin_write().map_err(store_err)?;
        let list = {
            let mut users = txn.open_table(USERS_TABLE).map_err(store_err)?;
            let existing = users
                .get(user_id)
                .map_err(store_err)?
                .map(|v| v.value().to_string());

            let mut list = match existing {
                Some(json) => {
                    serde_json::from_str::<IconList>(&json)
                        .map_err(|source| ListError::Corrupt {
                            user: user_id.to_string(),
                            source,
                        })?
                        .icon_list
                }
                None => {
                    info!("Provisioning list for new user {}", user_id);
                    Vec::new()
                }
            };

            f(&mut list)?;

            let json = serde_json::to_string(&IconList {
                icon_list: list.clone(),
            })
            .map_err(|source| ListError::Encode {
                user: user_id.to_string(),
                source,
            })?;
            users.insert(user_id, json.as_str()).map_err(store_err)?;
            list
        };
        txn.commit().map_err(store_err)?;
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_user_gets_empty_list() {
        let lists = UserLists::in_memory().unwrap();
        assert!(lists.read("auth0|new").unwrap().is_empty());
    }

    #[test]
    fn test_append_conflict_and_remove_not_found() {
        let lists = UserLists::in_memory().unwrap();
        assert_eq!(lists.append("u", "alice").unwrap(), vec!["alice"]);
        assert!(matches!(
            lists.append("u", "alice"),
            Err(ListError::AlreadySaved(v)) if v == "alice"
        ));
        assert!(matches!(
            lists.remove("u", "carol"),
            Err(ListError::NotSaved(v)) if v == "carol"
        ));
        assert!(lists.remove("u", "alice").unwrap().is_empty());
    }

    #[test]
    fn test_failed_update_leaves_list_untouched() {
        let lists = UserLists::in_memory().unwrap();
        lists.append("u", "alice").unwrap();
        let _ = lists.append("u", "alice");
        assert_eq!(lists.read("u").unwrap(), vec!["alice"]);
    }

    #[test]
    fn test_replace_collapses_duplicates() {
        let lists = UserLists::in_memory().unwrap();
        lists.append("u", "old").unwrap();
        let stored = lists
            .replace("u", vec!["a".into(), "b".into(), "a".into()])
            .unwrap();
        assert_eq!(stored, vec!["a", "b"]);
        assert_eq!(lists.read("u").unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_unparseable_stored_list_is_corrupt() {
        let lists = UserLists::in_memory().unwrap();
        let txn = lists.db.begin_write().unwrap();
        {
            let mut users = txn.open_table(USERS_TABLE).unwrap();
            users.insert("u", "not json").unwrap();
        }
        txn.commit().unwrap();

        assert!(matches!(
            lists.read("u"),
            Err(ListError::Corrupt { user, .. }) if user == "u"
        ));
    }

    #[test]
    fn test_encode_failure_is_not_reported_as_corrupt() {
        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let err = ListError::Encode {
            user: "u".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("could not encode list for u"));
    }

    #[test]
    fn test_lists_are_per_user() {
        let lists = UserLists::in_memory().unwrap();
        lists.append("alice", "x").unwrap();
        assert!(lists.read("bob").unwrap().is_empty());
    }
}
