//! Message types for queue operations including core domain identifiers.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Core Domain Identifiers
// ============================================================================

/// Validated queue name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueName(String);

impl QueueName {
    /// Create new queue name with validation
    pub fn new(name: String) -> Result<Self, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "queue_name".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get queue name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Time-to-live of a posted message, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct MessageTtl(u32);

impl MessageTtl {
    /// Shortest TTL the service accepts (one minute)
    pub const MIN: u32 = 60;

    /// Longest TTL the service accepts (fourteen days)
    pub const MAX: u32 = 1_209_600;

    /// Create TTL, rejecting values outside `MIN..=MAX`
    pub fn new(seconds: u32) -> Result<Self, ValidationError> {
        if !(Self::MIN..=Self::MAX).contains(&seconds) {
            return Err(ValidationError::OutOfRange {
                field: "ttl".to_string(),
                message: Self::range_message(),
            });
        }

        Ok(Self(seconds))
    }

    /// Get TTL in seconds
    pub fn as_secs(&self) -> u32 {
        self.0
    }

    fn range_message() -> String {
        format!(
            "Message TTL must be between {} and {} seconds",
            Self::MIN,
            Self::MAX
        )
    }
}

impl Default for MessageTtl {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<u32> for MessageTtl {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MessageTtl> for u32 {
    fn from(ttl: MessageTtl) -> Self {
        ttl.0
    }
}

impl std::fmt::Display for MessageTtl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl FromStr for MessageTtl {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let seconds = s
            .trim()
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidFormat {
                field: "ttl".to_string(),
                message: Self::range_message(),
            })?;

        Self::new(seconds)
    }
}

/// Random identifier attached to every request of one client session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Generate new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier the service assigned to a posted message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Get message ID as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "message_id".to_string(),
            });
        }

        Ok(Self(s.to_string()))
    }
}

// ============================================================================
// Posted Message
// ============================================================================

/// Message as acknowledged by the queue service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedMessage {
    pub id: MessageId,
    pub href: String,
}

impl PostedMessage {
    /// Build from the resource href returned by the service
    ///
    /// The message ID is the last path segment of the href, e.g.
    /// `/v1/queues/demo/messages/51db6f78c508f17ddc924357`.
    pub fn from_href(href: &str) -> Result<Self, ValidationError> {
        let id = href
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .parse::<MessageId>()?;

        Ok(Self {
            id,
            href: href.to_string(),
        })
    }
}

/// Wire representation of one message in a post request
#[derive(Debug, Serialize)]
pub(crate) struct OutgoingMessage<'a> {
    pub ttl: u32,
    pub body: &'a str,
}

/// Body returned by the service after posting messages
#[derive(Debug, Deserialize)]
pub(crate) struct PostMessagesResponse {
    #[serde(default)]
    pub partial: bool,
    #[serde(default)]
    pub resources: Vec<String>,
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
