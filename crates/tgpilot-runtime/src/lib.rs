//! Session registry and batch automation workflows.
//!
//! This crate drives a remote messaging account through the
//! `tgpilot_protocol::ProtocolClient` capability:
//! - `SessionRegistry` - one handle per `SessionKey`, created atomically
//! - `Authenticator` - the connect / code / password login handshake
//! - `discover_channels` - keyword search filtered by subscriber bounds
//! - `subscribe_channels` - sequential, paced channel joins
//! - `CommentScheduler` - cancellable recurring comment jobs, one per session
//! - `Runtime` - main entry point wiring all of the above together
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tgpilot_protocol::{ApiCredentials, OfflineConnector};
//! use tgpilot_runtime::{LoginRequest, Runtime, RuntimeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = Runtime::new(RuntimeConfig::default(), Arc::new(OfflineConnector::default()));
//!
//!     let outcome = runtime
//!         .connect(LoginRequest::new(ApiCredentials::new(12345, "hash"), "+15550001111"))
//!         .await?;
//!     println!("{:?}", outcome);
//!
//!     runtime.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Pacing
//!
//! Every per-item remote call inside a batch is followed by a pause taken
//! from the injected `Pacer`. Items are processed strictly one after
//! another; batches never fan out in parallel.

pub mod auth;
pub mod commenter;
pub mod config;
pub mod discovery;
pub mod error;
pub mod pacing;
pub mod registry;
pub mod runtime;
pub mod session;
pub mod subscription;

mod bounded;

pub use auth::{AuthOutcome, Authenticator, LoginRequest};
pub use commenter::CommentScheduler;
pub use config::RuntimeConfig;
pub use discovery::{discover_channels, DiscoveryQuery};
pub use error::{Result, WorkflowError};
pub use pacing::{FixedPacer, NoPacing, PacePoint, Pacer};
pub use registry::SessionRegistry;
pub use runtime::Runtime;
pub use session::{AuthState, SessionHandle};
pub use subscription::subscribe_channels;
