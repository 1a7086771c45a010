//! REST API for tgpilot.
//!
//! This crate exposes the runtime workflows over HTTP/JSON:
//! - Session login and logout (`/api/connect`, `/api/disconnect`)
//! - Channel discovery (`/api/search-channels`)
//! - Batch joins (`/api/subscribe`)
//! - Recurring comment jobs (`/api/comment`, `/api/stop-commenting`, `/api/jobs`)
//! - Health (`/health`, `/api/health`)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tgpilot_api::{serve, ApiConfig, AppState};
//! use tgpilot_protocol::OfflineConnector;
//! use tgpilot_runtime::{Runtime, RuntimeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = Arc::new(Runtime::new(
//!         RuntimeConfig::default(),
//!         Arc::new(OfflineConnector::default()),
//!     ));
//!     let state = AppState::new(ApiConfig::default(), runtime);
//!
//!     serve(ApiConfig::default(), state, std::future::pending()).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;

pub use config::ApiConfig;
pub use error::{ApiError, Result};
pub use extract::{ApiJson, OptionalJson};
pub use router::{create_router, serve};
pub use state::AppState;
