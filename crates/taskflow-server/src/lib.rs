//! Taskflow Server - HTTP and real-time surface
//!
//! Wires the Taskflow domain to the outside world:
//! - REST routes under `/api/v1` with a uniform JSON envelope
//! - Bearer-token identity (argon2 passwords, HS256 tokens)
//! - An authenticated socket endpoint feeding per-user rooms
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taskflow_core::MemoryStore;
//! use taskflow_server::{build_router, AppState, ServerConfig};
//!
//! let state = AppState::new(ServerConfig::with_secret("change-me"), Arc::new(MemoryStore::new()));
//! let app = build_router(state);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod auth;
pub mod config;
pub mod http;
pub mod state;

pub use config::{LogFormat, ServerConfig, WorkflowMode};
pub use http::{build_router, ApiError, ApiResult};
pub use state::AppState;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
