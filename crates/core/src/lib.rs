//! Accord Core - runtime configuration and synchronization primitives.
//!
//! This crate provides the pieces shared by every Accord endpoint: the
//! process-wide configuration defaults, the zero-capacity [`Rendezvous`]
//! handoff used to coordinate test steps with background transport tasks,
//! and the [`ActionTracker`] wait-group that lets a test harness drain all
//! in-flight background work before tearing down.

pub mod config;
pub mod sync;
pub mod telemetry;

pub use sync::{ActionGuard, ActionTracker, Rendezvous, SyncError};
