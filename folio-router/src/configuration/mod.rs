//! Logic for loading configuration in to an object model

use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use displaydoc::Display;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error, Display)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// could not read configuration file: {0}
    CannotReadConfigurationFile(std::io::Error),
    /// could not deserialize configuration: {0}
    DeserializeConfigError(serde_yaml::Error),
    /// no signing secret configured: set auth.secret or the FOLIO_JWT_SECRET environment variable
    MissingJwtSecret,
    /// service schema failed to compile: {0}
    ServiceSchema(String),
}

/// The configuration for the folio router.
///
/// Can be created through `serde::Deserialize` from YAML, or inline in Rust
/// code with the builder. Loaded once at startup and passed explicitly into
/// request handling — never read from ambient global state.
#[derive(Clone, Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    /// Configuration options pertaining to the http server component.
    #[serde(default)]
    pub server: Server,

    /// Limits applied to incoming operations.
    #[serde(default)]
    pub limits: Limits,

    /// Credential signing configuration.
    #[serde(default)]
    pub auth: Auth,
}

#[buildstructor::buildstructor]
impl Configuration {
    #[builder(visibility = "pub")]
    fn new(server: Option<Server>, limits: Option<Limits>, auth: Option<Auth>) -> Self {
        Self {
            server: server.unwrap_or_default(),
            limits: limits.unwrap_or_default(),
            auth: auth.unwrap_or_default(),
        }
    }
}

impl Configuration {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let raw = std::fs::read_to_string(path)
            .map_err(ConfigurationError::CannotReadConfigurationFile)?;
        serde_yaml::from_str(&raw).map_err(ConfigurationError::DeserializeConfigError)
    }
}

/// Configuration options pertaining to the http server component.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Server {
    /// The socket address and port to listen on
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from_str("127.0.0.1:4000").unwrap()
}

/// Limits applied to incoming operations.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Limits {
    /// The deepest nesting of field selections the first top-level selection
    /// group of a request may reach.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Log limit breaches instead of rejecting the request.
    #[serde(default)]
    pub warn_only: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            warn_only: false,
        }
    }
}

fn default_max_depth() -> u32 {
    5
}

/// Credential signing configuration.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Auth {
    /// The process-wide credential signing secret. Required at startup; a
    /// missing secret is a fatal configuration error, never a silent default.
    #[serde(default)]
    pub secret: Option<String>,

    /// Lifetime of minted credentials, in human-readable format; defaults to 1h
    #[serde(default = "default_token_expiry", with = "humantime_serde")]
    pub token_expiry: Duration,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            secret: None,
            token_expiry: default_token_expiry(),
        }
    }
}

impl Auth {
    pub(crate) fn secret(&self) -> Result<&str, ConfigurationError> {
        self.secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigurationError::MissingJwtSecret)
    }
}

fn default_token_expiry() -> Duration {
    Duration::from_secs(60 * 60)
}
