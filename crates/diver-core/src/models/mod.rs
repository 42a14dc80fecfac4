//! Data models for control plane entities.
//!
//! - `Account`: identity returned by the auth status probe
//! - `Container`, `ContainerStats`, `ContainerUsage`: container listing and CPU sampling
//! - `Network`: container networks

pub mod account;
pub mod container;
pub mod network;

pub use account::Account;
pub use container::{Container, ContainerStats, ContainerUsage};
pub use network::Network;

/// Length of the abbreviated IDs shown in listings, as `docker ps` does
const SHORT_ID_LEN: usize = 12;

/// First `SHORT_ID_LEN` characters of an ID, cut on a char boundary
pub(crate) fn short_id(id: &str) -> &str {
    id.char_indices()
        .nth(SHORT_ID_LEN)
        .map_or(id, |(end, _)| &id[..end])
}
