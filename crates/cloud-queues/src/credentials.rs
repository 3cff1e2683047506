//! Credentials file loading.
//!
//! The credentials file is an INI document with one section per identity
//! type:
//!
//! ```ini
//! [rackspace_cloud]
//! username = myusername
//! api_key = 01234567890abcdef
//! region = LON
//! ```
//!
//! Keystone deployments use a `[keystone]` section with `password` in place
//! of `api_key` and an optional `tenant_id`. Either section may carry an
//! `auth_endpoint` that overrides the identity service URL.
//!
//! Values are taken exactly as written: no escape sequences, no quote
//! stripping. Key names are case-insensitive; section names are not.

use crate::error::QueueServiceError;
use crate::identity::{IdentityType, Region};
use config::{FileStoredFormat, Format, Map, Value};
use ini::{Ini, ParseOption};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;
use zeroize::Zeroizing;

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;

/// Secret half of a credential pair (API key or password)
///
/// The buffer is wiped on drop and never shown in `Debug` output.
#[derive(Clone)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    /// Wrap a secret value
    pub fn new(value: String) -> Self {
        Self(Zeroizing::new(value))
    }

    /// Get secret as string (only for immediate use)
    pub fn expose_secret(&self) -> &str {
        self.0.as_str()
    }

    /// Get secret length without exposing content
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if secret is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("length", &self.len())
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Account credentials read from a credentials file
#[derive(Debug, Clone)]
pub struct Credentials {
    pub identity_type: IdentityType,
    pub username: String,
    pub secret: Secret,
    pub region: Option<Region>,
    pub auth_endpoint: Option<String>,
    pub tenant_id: Option<String>,
}

impl Credentials {
    /// Load credentials for `identity_type` from the INI file at `path`
    ///
    /// # Errors
    ///
    /// - `CredentialsFileNotFound` if `path` does not name an existing file
    /// - `InvalidCredentials` if the file cannot be parsed, the section is
    ///   missing, or a required key is absent or empty
    pub fn from_file(path: &Path, identity_type: IdentityType) -> Result<Self, QueueServiceError> {
        if !path.is_file() {
            return Err(QueueServiceError::CredentialsFileNotFound {
                path: path.to_path_buf(),
            });
        }

        let invalid = |message: String| QueueServiceError::InvalidCredentials {
            path: path.to_path_buf(),
            message,
        };

        let name = path
            .to_str()
            .ok_or_else(|| invalid("path is not valid UTF-8".to_string()))?;
        let settings = config::Config::builder()
            .add_source(config::File::new(name, LiteralIni).required(true))
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        let section = identity_type.credentials_section();
        let required = |key: &str| -> Result<String, QueueServiceError> {
            let value = settings
                .get_string(&format!("{}.{}", section, key))
                .map_err(|_| invalid(format!("missing '{}' in section [{}]", key, section)))?;

            if value.trim().is_empty() {
                return Err(invalid(format!("'{}' in section [{}] is empty", key, section)));
            }

            Ok(value.trim().to_string())
        };
        let optional = |key: &str| -> Option<String> {
            settings
                .get_string(&format!("{}.{}", section, key))
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let username = required("username")?;
        let secret = Secret::new(required(identity_type.secret_key())?);

        // Requests always target the region chosen by the caller
        let region = optional("region").and_then(|r| match r.parse::<Region>() {
            Ok(region) => Some(region),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Ignoring region in credentials file"
                );
                None
            }
        });

        Ok(Self {
            identity_type,
            username,
            secret,
            region,
            auth_endpoint: optional("auth_endpoint"),
            tenant_id: optional("tenant_id"),
        })
    }
}

/// INI format that keeps values literal and lowercases key names
#[derive(Debug, Clone, Copy)]
struct LiteralIni;

impl Format for LiteralIni {
    fn parse(
        &self,
        uri: Option<&String>,
        text: &str,
    ) -> Result<Map<String, Value>, Box<dyn std::error::Error + Send + Sync>> {
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(text, options)?;

        let mut sections = Map::new();
        for (section, properties) in ini.iter() {
            let Some(section) = section else {
                continue;
            };

            let mut table = Map::new();
            for (key, value) in properties.iter() {
                table.insert(key.to_lowercase(), Value::new(uri, value.to_string()));
            }
            sections.insert(section.to_string(), Value::new(uri, table));
        }

        Ok(sections)
    }
}

impl FileStoredFormat for LiteralIni {
    fn file_extensions(&self) -> &'static [&'static str] {
        &["ini"]
    }
}

/// Expand a leading `~` to the current user's home directory and make the
/// result absolute
///
/// A `~` is left in place when the home directory cannot be determined.
pub fn expand_user_path(path: &Path) -> PathBuf {
    let expanded = match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    };

    std::path::absolute(&expanded).unwrap_or(expanded)
}
