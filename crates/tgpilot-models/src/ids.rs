//! Identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of one authenticated user session.
///
/// A key is the pair of the account's phone number and the application id
/// registered with the messaging platform. The same phone number used with
/// two different application ids yields two independent sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKey {
    phone_number: String,
    api_id: i32,
}

impl SessionKey {
    /// Creates a key. Surrounding whitespace in the phone number is ignored.
    pub fn new(phone_number: impl AsRef<str>, api_id: i32) -> Self {
        Self {
            phone_number: phone_number.as_ref().trim().to_string(),
            api_id,
        }
    }

    /// Returns the phone number.
    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    /// Returns the application id.
    pub fn api_id(&self) -> i32 {
        self.api_id
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.phone_number, self.api_id)
    }
}

/// Unique identifier of a recurring comment job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generates a fresh job id.
    pub fn new() -> Self {
        Self(format!("job-{}", Uuid::new_v4()))
    }

    /// Wraps an existing id string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
