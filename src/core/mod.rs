// src/core/mod.rs
//! Request-scoped identity and the HTTP plumbing every downstream client shares

pub mod auth_context;
pub mod service_client;

pub use auth_context::{current_context, run_with_context, AuthContext};
pub use service_client::{ServiceClient, ServiceError};
