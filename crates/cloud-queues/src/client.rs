//! Queue service trait and its HTTP implementation.

use crate::credentials::Credentials;
use crate::error::QueueServiceError;
use crate::identity::{parse_base_url, AuthSession, IdentityType, Region, TokenResponse};
use crate::message::{
    ClientId, MessageTtl, OutgoingMessage, PostMessagesResponse, PostedMessage, QueueName,
};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, RequestBuilder, StatusCode};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Narrow interface to the queue service used by the producer
///
/// Calls are made in order: choose the identity type, authenticate, attach a
/// client identifier, then query and post. Each call is attempted once.
#[async_trait]
pub trait QueueService: Send + Sync {
    /// Select how credentials are exchanged for a token
    fn set_identity_type(&mut self, kind: IdentityType);

    /// Load the credentials file and authenticate for `region`
    async fn authenticate(
        &mut self,
        credentials_path: &Path,
        region: Region,
    ) -> Result<(), QueueServiceError>;

    /// Identify this client to the queue service
    fn set_client_id(&mut self, id: ClientId);

    /// Check whether the named queue exists in the authenticated region
    async fn queue_exists(&self, queue: &QueueName) -> Result<bool, QueueServiceError>;

    /// Post one message with the given TTL
    async fn post_message(
        &self,
        queue: &QueueName,
        body: &str,
        ttl: MessageTtl,
    ) -> Result<PostedMessage, QueueServiceError>;
}

// ============================================================================
// Client Configuration
// ============================================================================

/// Configuration for the HTTP queue client.
///
/// # Examples
///
/// ```
/// use cloud_queues::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default().with_timeout(Duration::from_secs(10));
/// assert_eq!(config.timeout, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string for API requests
    pub user_agent: String,
    /// Request timeout duration
    pub timeout: Duration,
    /// Identity URL; the credentials file's `auth_endpoint` takes precedence
    pub identity_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("cqueue-producer/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            identity_url: None,
        }
    }
}

impl ClientConfig {
    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the identity service URL.
    pub fn with_identity_url(mut self, url: impl Into<String>) -> Self {
        self.identity_url = Some(url.into());
        self
    }
}

// ============================================================================
// HTTP Client
// ============================================================================

/// Cloud Queues client speaking the v1 REST API
pub struct CloudQueuesClient {
    http_client: HttpClient,
    config: ClientConfig,
    identity_type: IdentityType,
    client_id: ClientId,
    session: Option<AuthSession>,
}

impl CloudQueuesClient {
    /// Create new client
    ///
    /// # Errors
    ///
    /// Returns `Network` if the HTTP client cannot be built (e.g. TLS backend
    /// initialisation fails).
    pub fn new(config: ClientConfig) -> Result<Self, QueueServiceError> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                QueueServiceError::Network(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            config,
            identity_type: IdentityType::default(),
            client_id: ClientId::new(),
            session: None,
        })
    }

    /// Identity type currently in use
    pub fn identity_type(&self) -> IdentityType {
        self.identity_type
    }

    /// Client identifier sent with queue requests
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Check if a token has been obtained
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Pick the identity URL: credentials file, then configuration, then the
    /// identity type's default
    fn identity_url(
        &self,
        credentials: &Credentials,
        credentials_path: &Path,
    ) -> Result<Url, QueueServiceError> {
        let raw = credentials
            .auth_endpoint
            .as_deref()
            .or(self.config.identity_url.as_deref())
            .or(self.identity_type.default_identity_url())
            .ok_or_else(|| QueueServiceError::InvalidCredentials {
                path: credentials_path.to_path_buf(),
                message: format!(
                    "no 'auth_endpoint' configured for identity type {:?}",
                    self.identity_type
                ),
            })?;

        parse_base_url(raw).map_err(|_| QueueServiceError::InvalidCredentials {
            path: credentials_path.to_path_buf(),
            message: format!("invalid identity URL '{}'", raw),
        })
    }

    fn session(&self) -> Result<&AuthSession, QueueServiceError> {
        self.session.as_ref().ok_or(QueueServiceError::NotAuthenticated)
    }

    /// Build an authenticated request for `queues/{queue}[/{suffix}]`
    fn queue_request(
        &self,
        method: Method,
        queue: &QueueName,
        suffix: Option<&str>,
    ) -> Result<RequestBuilder, QueueServiceError> {
        let session = self.session()?;

        let mut url = session.queue_endpoint.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                QueueServiceError::InvalidResponse(format!(
                    "queue endpoint '{}' cannot be a base URL",
                    session.queue_endpoint
                ))
            })?;
            segments.pop_if_empty().push("queues").push(queue.as_str());
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }

        Ok(self
            .http_client
            .request(method, url)
            .header("X-Auth-Token", session.token.expose_secret())
            .header("Client-ID", self.client_id.to_string())
            .header("Accept", "application/json"))
    }
}

impl fmt::Debug for CloudQueuesClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudQueuesClient")
            .field("config", &self.config)
            .field("identity_type", &self.identity_type)
            .field("client_id", &self.client_id)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[async_trait]
impl QueueService for CloudQueuesClient {
    fn set_identity_type(&mut self, kind: IdentityType) {
        debug!(identity_type = ?kind, "Setting identity type");
        self.identity_type = kind;
    }

    async fn authenticate(
        &mut self,
        credentials_path: &Path,
        region: Region,
    ) -> Result<(), QueueServiceError> {
        self.session = None;

        let credentials = Credentials::from_file(credentials_path, self.identity_type)?;
        let token_url = self
            .identity_url(&credentials, credentials_path)?
            .join("tokens")
            .map_err(|e| QueueServiceError::InvalidCredentials {
                path: credentials_path.to_path_buf(),
                message: format!("invalid auth_endpoint: {}", e),
            })?;

        debug!(
            username = %credentials.username,
            region = %region,
            url = %token_url,
            "Requesting identity token"
        );

        let response = self
            .http_client
            .post(token_url)
            .header("Accept", "application/json")
            .json(&self.identity_type.token_request(&credentials))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    QueueServiceError::AuthenticationFailed {
                        message: format!("identity service returned {}", status.as_u16()),
                    }
                }
                _ => QueueServiceError::from_status(status.as_u16(), &body),
            });
        }

        let token: TokenResponse = response.json().await?;
        let session = token.into_session(self.identity_type, region)?;

        info!(
            region = %region,
            endpoint = %session.queue_endpoint,
            expires_at = ?session.expires_at,
            "Authenticated with identity service"
        );

        self.session = Some(session);
        Ok(())
    }

    fn set_client_id(&mut self, id: ClientId) {
        debug!(client_id = %id, "Setting client ID");
        self.client_id = id;
    }

    async fn queue_exists(&self, queue: &QueueName) -> Result<bool, QueueServiceError> {
        let response = self.queue_request(Method::HEAD, queue, None)?.send().await?;
        let status = response.status();

        debug!(queue = %queue, status = status.as_u16(), "Queue existence check");

        match status {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(QueueServiceError::from_status(status.as_u16(), &body))
            }
        }
    }

    async fn post_message(
        &self,
        queue: &QueueName,
        body: &str,
        ttl: MessageTtl,
    ) -> Result<PostedMessage, QueueServiceError> {
        let messages = [OutgoingMessage {
            ttl: ttl.as_secs(),
            body,
        }];

        let response = self
            .queue_request(Method::POST, queue, Some("messages"))?
            .json(&messages)
            .send()
            .await?;
        let status = response.status();

        debug!(queue = %queue, ttl = ttl.as_secs(), status = status.as_u16(), "Post message");

        if status == StatusCode::NOT_FOUND {
            return Err(QueueServiceError::QueueNotFound {
                queue_name: queue.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueueServiceError::from_status(status.as_u16(), &body));
        }

        let posted: PostMessagesResponse = response.json().await?;
        let href = match posted.resources.first() {
            Some(href) => href,
            None if posted.partial => {
                return Err(QueueServiceError::ServiceUnavailable {
                    message: "service accepted none of the posted messages".to_string(),
                })
            }
            None => {
                return Err(QueueServiceError::InvalidResponse(
                    "post response listed no message resources".to_string(),
                ))
            }
        };

        Ok(PostedMessage::from_href(href)?)
    }
}
