//! Remote messaging protocol capability.
//!
//! The workflows never talk to the messaging platform directly. They go
//! through two traits defined here:
//!
//! - **ProtocolConnector**: opens a connection for a set of API credentials
//! - **ProtocolClient**: one connected account (auth handshake, search,
//!   channel metadata, join, read and post messages)
//!
//! Implementations:
//!
//! - `mock::MockClient` (feature `mock`): scripted in-memory client for tests
//! - `grammers::GrammersConnector` (feature `grammers`): MTProto via grammers
//! - [`OfflineConnector`]: refuses every connection, used when no backend
//!   is compiled in
//!
//! # Example
//!
//! ```ignore
//! use tgpilot_protocol::{ApiCredentials, ProtocolConnector};
//!
//! async fn login(connector: &dyn ProtocolConnector) -> tgpilot_protocol::Result<()> {
//!     let creds = ApiCredentials::new(12345, "hash");
//!     let client = connector.connect(&creds).await?;
//!     client.send_code("+15550001111").await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod offline;
pub mod traits;
pub mod types;

#[cfg(feature = "grammers")]
pub mod grammers;
#[cfg(feature = "mock")]
pub mod mock;

pub use error::{ProtocolError, Result};
pub use offline::OfflineConnector;
pub use traits::{ProtocolClient, ProtocolConnector};
pub use types::{ApiCredentials, ChannelDetails, ChannelPeer, ChatKind, FoundChat, PeerMessage};
