//! API request handlers.

pub mod channels;
pub mod comments;
pub mod health;
pub mod session;

pub use channels::*;
pub use comments::*;
pub use health::*;
pub use session::*;
