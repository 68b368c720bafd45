use super::SyncEngine;
use crate::store;
use tracing::{debug, info, warn};

/// What a reconciliation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Local changes were pushed with a replace call; flag cleared.
    Pushed,
    /// Local changes are still pending: the replace call failed.
    PushFailed,
    /// No pending changes; the mirror was refreshed from the remote.
    Refreshed,
    /// No pending changes, but the remote read failed; showing the mirror.
    ReadFailed,
    /// Oracle reports offline; showing the mirror, flag set.
    Offline,
    /// No valid token; showing the mirror, flag unchanged.
    Unauthenticated,
}

impl SyncEngine {
    /// Bring local and remote back into agreement.
    ///
    /// Run at load/resume and after connectivity returns. Failures are
    /// absorbed: the mirror is shown and the next trigger tries again.
    pub async fn reconcile(&self) -> ReconcileOutcome {
        if self.sync_needed().await {
            self.push_local().await
        } else {
            self.refresh_from_remote().await
        }
    }

    pub(super) async fn push_local(&self) -> ReconcileOutcome {
        let local = self.local_snapshot().await;
        self.render(local.clone()).await;

        if !self.ctx.connectivity.is_online() {
            debug!("Offline, keeping {} local item(s) pending", local.len());
            return ReconcileOutcome::Offline;
        }

        let token = match self.ctx.tokens.token().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Cannot push local changes: {}", e);
                return ReconcileOutcome::Unauthenticated;
            }
        };

        match self.ctx.remote.replace(&token, &local).await {
            Ok(()) => {
                let flag = self.ctx.flag.clone();
                if let Err(e) = store::blocking(move || flag.clear()).await {
                    self.storage_failed("clear sync-needed flag", e);
                }
                info!("Pushed {} item(s) to remote", local.len());
                ReconcileOutcome::Pushed
            }
            Err(e) => {
                warn!("Replace call failed, will retry on next sync: {}", e);
                ReconcileOutcome::PushFailed
            }
        }
    }

    async fn refresh_from_remote(&self) -> ReconcileOutcome {
        if !self.ctx.connectivity.is_online() {
            let local = self.local_snapshot().await;
            self.render(local).await;
            // Local state cannot be confirmed fresh while offline.
            self.mark_dirty().await;
            return ReconcileOutcome::Offline;
        }

        let token = match self.ctx.tokens.token().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Cannot read remote list: {}", e);
                let local = self.local_snapshot().await;
                self.render(local).await;
                return ReconcileOutcome::Unauthenticated;
            }
        };

        match self.ctx.remote.read(&token).await {
            Ok(remote) => {
                let remote = dedup(remote);
                if !self.is_storage_degraded() {
                    let mirror = self.ctx.mirror.clone();
                    let items = remote.clone();
                    if let Err(e) = store::blocking(move || mirror.replace_all(&items)).await {
                        self.storage_failed("refresh local mirror", e);
                    }
                    let flag = self.ctx.flag.clone();
                    if let Err(e) = store::blocking(move || flag.stamp_synced()).await {
                        self.storage_failed("record sync time", e);
                    }
                }
                debug!("Refreshed {} item(s) from remote", remote.len());
                self.render(remote).await;
                ReconcileOutcome::Refreshed
            }
            Err(e) => {
                warn!("Failed to read remote list: {}", e);
                let local = self.local_snapshot().await;
                self.render(local).await;
                ReconcileOutcome::ReadFailed
            }
        }
    }

    /// Mirror content, or the in-memory list once storage has failed.
    async fn local_snapshot(&self) -> Vec<String> {
        if self.is_storage_degraded() {
            return self.displayed.read().await.clone();
        }

        let mirror = self.ctx.mirror.clone();
        match store::blocking(move || mirror.list_all()).await {
            Ok(items) => items,
            Err(e) => {
                self.storage_failed("read local mirror", e);
                self.displayed.read().await.clone()
            }
        }
    }

    async fn render(&self, items: Vec<String>) {
        *self.displayed.write().await = items;
    }
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
