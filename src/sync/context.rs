use crate::auth::TokenProvider;
use crate::connectivity::Connectivity;
use crate::remote::RemoteList;
use crate::store::{LocalStore, MirrorStore, SyncFlag};
use std::sync::Arc;

/// Everything a sync session touches.
///
/// Built once at session start from a [`LocalStore`]; persisted state (the
/// mirror and the flag) is whatever the store already holds, so resuming a
/// session is just opening the same database again.
#[derive(Clone)]
pub struct SyncContext {
    pub mirror: MirrorStore,
    pub flag: SyncFlag,
    pub connectivity: Arc<dyn Connectivity>,
    pub tokens: Arc<dyn TokenProvider>,
    pub remote: Arc<dyn RemoteList>,
}

impl SyncContext {
    pub fn new(
        store: &LocalStore,
        connectivity: Arc<dyn Connectivity>,
        tokens: Arc<dyn TokenProvider>,
        remote: Arc<dyn RemoteList>,
    ) -> Self {
        Self {
            mirror: store.mirror(),
            flag: store.flag(),
            connectivity,
            tokens,
            remote,
        }
    }
}
