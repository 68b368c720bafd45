use super::{ReconcileOutcome, SyncContext};
use crate::remote::RemoteError;
use crate::store::{self, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Result of an optimistic add or remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Duplicate add or removal of an absent value; nothing changed.
    Rejected,
    /// Applied locally and acknowledged by the remote.
    Confirmed,
    /// Applied locally; the remote was skipped or failed and the
    /// sync-needed flag is set.
    Deferred,
    /// Applied locally; no valid token, flag untouched.
    Unauthenticated,
    /// Applied locally; the remote refused it (already present or already
    /// gone). Local state is kept as is.
    RemoteRejected,
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Add,
    Remove,
}

impl Op {
    fn verb(self) -> &'static str {
        match self {
            Op::Add => "add",
            Op::Remove => "remove",
        }
    }
}

/// Optimistic mutation engine and reconciliation driver.
///
/// The displayed list is the presentation truth: it changes immediately on
/// every accepted mutation, before any network round trip.
pub struct SyncEngine {
    pub(super) ctx: SyncContext,
    pub(super) displayed: RwLock<Vec<String>>,
    /// Set after the first storage failure; from then on the session runs
    /// from the displayed list alone.
    pub(super) storage_degraded: AtomicBool,
}

impl SyncEngine {
    /// Start a session, showing whatever the mirror currently holds.
    pub fn new(ctx: SyncContext) -> Self {
        let storage_degraded = AtomicBool::new(false);
        let initial = ctx.mirror.list_all().unwrap_or_else(|e| {
            error!("Failed to read local mirror: {}", e);
            storage_degraded.store(true, Ordering::SeqCst);
            Vec::new()
        });

        Self {
            ctx,
            displayed: RwLock::new(initial),
            storage_degraded,
        }
    }

    pub fn context(&self) -> &SyncContext {
        &self.ctx
    }

    /// Snapshot of the list as currently shown.
    pub async fn displayed(&self) -> Vec<String> {
        self.displayed.read().await.clone()
    }

    /// Whether local storage has failed during this session.
    pub fn is_storage_degraded(&self) -> bool {
        self.storage_degraded.load(Ordering::SeqCst)
    }

    pub async fn add_item(&self, value: &str) -> MutationOutcome {
        {
            let mut displayed = self.displayed.write().await;
            if displayed.iter().any(|v| v == value) {
                debug!("{:?} is already saved, add ignored", value);
                return MutationOutcome::Rejected;
            }
            displayed.push(value.to_string());
        }

        let mirror = self.ctx.mirror.clone();
        let item = value.to_string();
        if let Err(e) = store::blocking(move || mirror.put(&item)).await {
            self.storage_failed(&format!("store {:?} locally", value), e);
        }

        self.confirm_remote(Op::Add, value).await
    }

    pub async fn remove_item(&self, value: &str) -> MutationOutcome {
        {
            let mut displayed = self.displayed.write().await;
            let Some(index) = displayed.iter().position(|v| v == value) else {
                debug!("{:?} is not saved, remove ignored", value);
                return MutationOutcome::Rejected;
            };
            displayed.remove(index);
        }

        let mirror = self.ctx.mirror.clone();
        let item = value.to_string();
        if let Err(e) = store::blocking(move || mirror.delete(&item)).await {
            self.storage_failed(&format!("remove {:?} locally", value), e);
        }

        self.confirm_remote(Op::Remove, value).await
    }

    /// End the session for the current user.
    ///
    /// Pending local changes are pushed first when possible. The mirror and
    /// the sync-needed flag are then cleared together, so the next session
    /// never replaces the remote list with an empty mirror.
    pub async fn logout(&self) {
        if self.sync_needed().await {
            match self.push_local().await {
                ReconcileOutcome::Pushed => {}
                outcome => warn!(
                    "Discarding unsynced local changes at logout ({:?})",
                    outcome
                ),
            }
        }

        self.ctx.tokens.logout().await;

        let mirror = self.ctx.mirror.clone();
        if let Err(e) = store::blocking(move || mirror.clear()).await {
            self.storage_failed("clear local mirror", e);
        }
        let flag = self.ctx.flag.clone();
        if let Err(e) = store::blocking(move || flag.reset()).await {
            self.storage_failed("reset sync-needed flag", e);
        }
        self.displayed.write().await.clear();
        info!("Logged out, local mirror cleared");
    }

    async fn confirm_remote(&self, op: Op, value: &str) -> MutationOutcome {
        if !self.ctx.connectivity.is_online() {
            self.mark_dirty().await;
            // Best effort only; without a token this is expected to bounce.
            if let Err(e) = self.call_remote(op, None, value).await {
                debug!("Offline {} of {:?} not accepted: {}", op.verb(), value, e);
            }
            return MutationOutcome::Deferred;
        }

        let token = match self.ctx.tokens.token().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Cannot {} {:?} remotely: {}", op.verb(), value, e);
                return MutationOutcome::Unauthenticated;
            }
        };

        match self.call_remote(op, Some(&token), value).await {
            Ok(()) => {
                debug!("Remote confirmed {} of {:?}", op.verb(), value);
                MutationOutcome::Confirmed
            }
            Err(RemoteError::AuthRequired) => {
                warn!("Remote {} of {:?} needs a fresh login", op.verb(), value);
                MutationOutcome::Unauthenticated
            }
            Err(e) if e.requires_sync() => {
                warn!("Remote {} of {:?} failed: {}", op.verb(), value, e);
                self.mark_dirty().await;
                MutationOutcome::Deferred
            }
            Err(e) => {
                warn!("Remote refused {} of {:?}: {}", op.verb(), value, e);
                MutationOutcome::RemoteRejected
            }
        }
    }

    async fn call_remote(
        &self,
        op: Op,
        token: Option<&str>,
        value: &str,
    ) -> Result<(), RemoteError> {
        match op {
            Op::Add => self.ctx.remote.append(token, value).await.map(|_| ()),
            Op::Remove => self.ctx.remote.remove(token, value).await.map(|_| ()),
        }
    }

    pub(super) async fn mark_dirty(&self) {
        let flag = self.ctx.flag.clone();
        if let Err(e) = store::blocking(move || flag.set()).await {
            self.storage_failed("persist sync-needed flag", e);
        }
    }

    /// Read the flag; a storage error reads as "nothing pending" so a
    /// possibly stale mirror is never pushed over the remote.
    pub(super) async fn sync_needed(&self) -> bool {
        let flag = self.ctx.flag.clone();
        match store::blocking(move || flag.is_set()).await {
            Ok(dirty) => dirty,
            Err(e) => {
                self.storage_failed("read sync-needed flag", e);
                false
            }
        }
    }

    pub(super) fn storage_failed(&self, what: &str, err: StoreError) {
        error!("Failed to {}: {}", what, err);
        if !self.storage_degraded.swap(true, Ordering::SeqCst) {
            warn!("Local storage unavailable, continuing in memory for this session");
        }
    }
}
