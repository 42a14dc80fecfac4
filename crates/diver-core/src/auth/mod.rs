//! Session persistence across invocations.
//!
//! This module provides:
//! - `SessionData`: the on-disk record of a logged-in session
//! - `TokenStore`: saves and loads that record, and rebuilds a client from it
//!
//! No expiry is stored. A stale token is only discovered when the control
//! plane rejects it.

pub mod session;

pub use session::{SessionData, StoreError, TokenStore};
