//! Offline-first sync for a personal identicon favorites list.
//!
//! The client keeps a durable local mirror of the user's list, applies
//! adds and removes optimistically, and tracks divergence from the server
//! with a single persisted sync-needed flag. When a sync is owed, the whole
//! mirror replaces the server's copy. The crate also ships the server side
//! of the `/api/identicon` API.

pub mod auth;
pub mod cli;
pub mod config;
pub mod connectivity;
pub mod remote;
pub mod server;
pub mod store;
pub mod sync;

pub use server::{create_router, ServerState};
