//! REST client for the Docker EE Universal Control Plane.
//!
//! This module provides the `UcpClient` for logging in and issuing
//! authenticated requests against a control plane endpoint.
//!
//! The API uses bearer token authentication obtained by posting
//! credentials to `/auth/login`.

pub mod client;
pub mod error;

pub use client::UcpClient;
pub use error::ApiError;
pub use reqwest::{Method, StatusCode};
