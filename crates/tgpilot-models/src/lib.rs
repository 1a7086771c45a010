//! Core data models for tgpilot.
//!
//! This crate provides the plain data types shared by the workflows and the
//! HTTP surface: session identities, discovered channels, subscription
//! outcomes and recurring comment jobs.

pub mod channel;
pub mod ids;
pub mod job;
pub mod subscription;

// Re-export main types
pub use channel::{normalize_channel_ref, public_link, ChannelCandidate};
pub use ids::{JobId, SessionKey};
pub use job::{CommentJobInfo, CommentPlan};
pub use subscription::{SubscriptionResult, SubscriptionSummary};
