use std::path::PathBuf;
use thiserror::Error;

use crate::transport::TransportError;

/// A problem with the client configuration, detected before any request is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("no host provided")]
    MissingHost,

    #[error("no authentication provided: supply either oauth or basic_auth")]
    MissingAuth,

    #[error("oauth: no consumer_key provided")]
    MissingConsumerKey,

    #[error("oauth: no private_key provided")]
    MissingPrivateKey,

    #[error("oauth: no token provided")]
    MissingOAuthToken,

    #[error("oauth: no token_secret provided")]
    MissingOAuthTokenSecret,

    #[error("basic_auth: no username provided")]
    MissingUsername,

    #[error("basic_auth: no password provided")]
    MissingPassword,

    #[error("unrecognised authentication property: {0}")]
    InvalidAuthenticationProperty(String),

    #[error("invalid host {host}: {reason}")]
    InvalidHost { host: String, reason: String },
}

/// Crate level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, Error>;
