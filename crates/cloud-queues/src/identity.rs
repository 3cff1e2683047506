//! Identity service types: regions, identity types and token exchange.

use crate::credentials::{Credentials, Secret};
use crate::error::{QueueServiceError, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use url::Url;

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;

/// Rackspace Cloud identity endpoint (v2.0)
pub const RACKSPACE_IDENTITY_URL: &str = "https://identity.api.rackspacecloud.com/v2.0/";

// ============================================================================
// Region
// ============================================================================

/// Data center the queue requests are routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Region {
    /// Chicago
    Ord,
    /// Dallas/Fort Worth
    Dfw,
    /// London
    #[default]
    Lon,
    /// Sydney
    Syd,
    /// Northern Virginia
    Iad,
    /// Hong Kong
    Hkg,
}

impl Region {
    /// All supported regions
    pub const ALL: [Region; 6] = [
        Region::Ord,
        Region::Dfw,
        Region::Lon,
        Region::Syd,
        Region::Iad,
        Region::Hkg,
    ];

    /// Upper-case data center code, as used in the service catalog
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ord => "ORD",
            Self::Dfw => "DFW",
            Self::Lon => "LON",
            Self::Syd => "SYD",
            Self::Iad => "IAD",
            Self::Hkg => "HKG",
        }
    }

    /// Check if a service catalog region string refers to this region
    pub fn matches(&self, catalog_region: &str) -> bool {
        catalog_region.trim().eq_ignore_ascii_case(self.code())
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.matches(s))
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "region".to_string(),
                message: format!(
                    "'{}' is not one of {}",
                    s,
                    Self::ALL.map(|r| r.code()).join(", ")
                ),
            })
    }
}

impl TryFrom<String> for Region {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.code().to_string()
    }
}

// ============================================================================
// Identity Type
// ============================================================================

/// Kind of identity service used to obtain a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityType {
    /// Rackspace Cloud identity with username + API key
    #[default]
    Rackspace,
    /// Generic OpenStack Keystone with username + password
    Keystone,
}

impl IdentityType {
    /// Credentials file section holding this identity type's keys
    pub fn credentials_section(&self) -> &'static str {
        match self {
            Self::Rackspace => "rackspace_cloud",
            Self::Keystone => "keystone",
        }
    }

    /// Credentials file key holding the secret
    pub fn secret_key(&self) -> &'static str {
        match self {
            Self::Rackspace => "api_key",
            Self::Keystone => "password",
        }
    }

    /// Service catalog type of the queue service
    pub fn queue_service_type(&self) -> &'static str {
        match self {
            Self::Rackspace => "rax:queues",
            Self::Keystone => "messaging",
        }
    }

    /// Identity URL used when neither the credentials nor the client
    /// configuration name one
    pub fn default_identity_url(&self) -> Option<&'static str> {
        match self {
            Self::Rackspace => Some(RACKSPACE_IDENTITY_URL),
            Self::Keystone => None,
        }
    }

    /// Body of the token request for `credentials`
    pub(crate) fn token_request(&self, credentials: &Credentials) -> serde_json::Value {
        match self {
            Self::Rackspace => json!({
                "auth": {
                    "RAX-KSKEY:apiKeyCredentials": {
                        "username": credentials.username,
                        "apiKey": credentials.secret.expose_secret(),
                    }
                }
            }),
            Self::Keystone => {
                let mut auth = json!({
                    "passwordCredentials": {
                        "username": credentials.username,
                        "password": credentials.secret.expose_secret(),
                    }
                });
                if let Some(tenant_id) = &credentials.tenant_id {
                    auth["tenantId"] = json!(tenant_id);
                }
                json!({ "auth": auth })
            }
        }
    }
}

// ============================================================================
// Token Exchange
// ============================================================================

/// Authenticated state of a client: token plus resolved queue endpoint
#[derive(Debug, Clone)]
pub(crate) struct AuthSession {
    pub token: Secret,
    pub expires_at: Option<DateTime<Utc>>,
    pub queue_endpoint: Url,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access: Access,
}

#[derive(Debug, Deserialize)]
struct Access {
    token: Token,
    #[serde(rename = "serviceCatalog", default)]
    service_catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct Token {
    id: String,
    #[serde(default)]
    expires: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Deserialize)]
struct CatalogEndpoint {
    #[serde(default)]
    region: Option<String>,
    #[serde(rename = "publicURL")]
    public_url: String,
}

impl TokenResponse {
    /// Resolve the token and the queue endpoint for `region`
    ///
    /// A catalog without a queue endpoint in `region` means the account cannot
    /// use that region, which is reported as an authentication failure.
    pub(crate) fn into_session(
        self,
        identity_type: IdentityType,
        region: Region,
    ) -> Result<AuthSession, QueueServiceError> {
        let service_type = identity_type.queue_service_type();

        let endpoint = self
            .access
            .service_catalog
            .iter()
            .filter(|entry| entry.service_type == service_type)
            .flat_map(|entry| {
                entry.endpoints.iter().map(move |ep| (entry.name.as_deref(), ep))
            })
            .find(|(_, ep)| ep.region.as_deref().is_some_and(|r| region.matches(r)))
            .map(|(name, ep)| {
                tracing::debug!(
                    service = name.unwrap_or(service_type),
                    region = %region,
                    endpoint = %ep.public_url,
                    "Resolved queue endpoint from service catalog"
                );
                ep.public_url.as_str()
            })
            .ok_or_else(|| QueueServiceError::AuthenticationFailed {
                message: format!(
                    "no '{}' endpoint in region '{}' for this account",
                    service_type, region
                ),
            })?;

        let queue_endpoint = parse_base_url(endpoint)?;

        let expires_at = self.access.token.expires.as_deref().and_then(|e| {
            DateTime::parse_from_rfc3339(e)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        });

        Ok(AuthSession {
            token: Secret::new(self.access.token.id),
            expires_at,
            queue_endpoint,
        })
    }
}

/// Parse a base URL, making sure it ends with `/` so relative joins append
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, QueueServiceError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };

    Url::parse(&normalized)
        .map_err(|e| QueueServiceError::InvalidResponse(format!("invalid URL '{}': {}", raw, e)))
}
