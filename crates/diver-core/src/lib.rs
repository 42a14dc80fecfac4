//! Core library for diver's Universal Control Plane commands.
//!
//! - [`api`]: transport, login and resource calls (`UcpClient`)
//! - [`auth`]: session persistence between invocations (`TokenStore`)
//! - [`config`]: connection settings and default paths
//! - [`models`]: typed response payloads

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiError, UcpClient};
pub use auth::{SessionData, StoreError, TokenStore};
pub use config::ClientConfig;
