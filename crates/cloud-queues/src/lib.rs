//! # Cloud Queues
//!
//! Client for Rackspace Cloud Queues (OpenStack Zaqar v1) as used by
//! `cqueue-producer`.
//!
//! This library provides:
//! - Credentials file loading for Rackspace and Keystone identity
//! - Token exchange and queue endpoint resolution per region
//! - Queue existence checks and single-message posting
//!
//! ## Module Organization
//!
//! - [`error`] - Error types for all service operations
//! - [`message`] - Queue names, TTLs, client and message identifiers
//! - [`identity`] - Regions, identity types and token exchange
//! - [`credentials`] - Credentials file parsing
//! - [`client`] - The [`QueueService`] trait and its HTTP implementation

pub mod client;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod message;

pub use client::{ClientConfig, CloudQueuesClient, QueueService};
pub use credentials::{expand_user_path, Credentials, Secret};
pub use error::{QueueServiceError, ValidationError};
pub use identity::{IdentityType, Region, RACKSPACE_IDENTITY_URL};
pub use message::{ClientId, MessageId, MessageTtl, PostedMessage, QueueName};
