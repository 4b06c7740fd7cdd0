// src/lib.rs
//! Tool-invocation gateway for the recruitment platform.
//!
//! One catalog of recruitment tools served over two front doors: a raw surface for
//! protocol clients (tenant bearer token required) and a chat surface that renders
//! results as cards. An approval-gated generation loop drives an external engine
//! against the same catalog.

pub mod agent;
pub mod auth;
pub mod cards;
pub mod clients;
pub mod core;
pub mod environment;
pub mod token_cli;
pub mod tools;
pub mod utils;
pub mod web;

pub use environment::GatewayConfig;
pub use tools::{ToolDefinition, ToolRegistry, ToolResult};
pub use web::{build_rocket, start_web_server, GatewayState};
