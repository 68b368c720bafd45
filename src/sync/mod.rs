//! Offline-first sync core.
//!
//! - [`SyncContext`]: the session's collaborators (mirror, flag, oracle,
//!   token provider, remote) passed explicitly instead of held globally.
//! - [`SyncEngine`]: optimistic add/remove plus the reconciliation pass.
//!
//! Divergence from the remote is tracked with one flag for the whole list.
//! Reconciliation pushes the mirror's end state with a single replace call;
//! which individual operations happened offline is not recorded.

mod context;
mod engine;
mod reconcile;

pub use context::SyncContext;
pub use engine::{MutationOutcome, SyncEngine};
pub use reconcile::ReconcileOutcome;
