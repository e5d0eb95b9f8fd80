use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};
use url::Url;

use crate::auth::{Authentication, BasicAuth, OAuthConfig};
use crate::error::{ConfigurationError, Error, Result};

pub const DEFAULT_PROTOCOL: &str = "https";

/// Connection settings as supplied by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    pub host: Option<String>,
    pub protocol: Option<String>,
    pub port: Option<u16>,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// The `auth` table. Exactly one of `oauth` or `basic_auth` is expected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    pub oauth: Option<OAuthCredentials>,
    pub basic_auth: Option<BasicAuthCredentials>,
    /// Anything else found in the table.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

#[derive(Clone, Default, Deserialize)]
pub struct OAuthCredentials {
    pub consumer_key: Option<String>,
    pub private_key: Option<String>,
    pub token: Option<String>,
    pub token_secret: Option<String>,
    /// Accepted for compatibility, always replaced by RSA-SHA1.
    pub signature_method: Option<String>,
}

#[derive(Clone, Default, Deserialize)]
pub struct BasicAuthCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token)
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .field("signature_method", &self.signature_method)
            .finish()
    }
}

impl std::fmt::Debug for BasicAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthCredentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl OAuthCredentials {
    pub fn new(
        consumer_key: impl Into<String>,
        private_key: impl Into<String>,
        token: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: Some(consumer_key.into()),
            private_key: Some(private_key.into()),
            token: Some(token.into()),
            token_secret: Some(token_secret.into()),
            signature_method: None,
        }
    }
}

impl BasicAuthCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn oauth(mut self, credentials: OAuthCredentials) -> Self {
        self.auth.oauth = Some(credentials);
        self
    }

    pub fn basic_auth(mut self, credentials: BasicAuthCredentials) -> Self {
        self.auth.basic_auth = Some(credentials);
        self
    }

    /// Parse a configuration from TOML.
    ///
    /// ```toml
    /// host = "jira.example.com"
    /// port = 8443
    ///
    /// [auth.basic_auth]
    /// username = "jdoe"
    /// password = "secret"
    /// ```
    ///
    /// # Errors
    ///
    /// If the document is not valid TOML or has fields of the wrong type.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Read and parse a TOML configuration file.
    ///
    /// # Errors
    ///
    /// - If the file cannot be read.
    /// - If its contents do not parse.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = ?path, "Loading client config");

        let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}

/// A configuration that passed [`validate`].
#[derive(Debug, Clone)]
pub struct ValidConfig {
    pub host: String,
    pub protocol: String,
    pub port: Option<u16>,
    pub auth: Authentication,
}

/// Check a configuration, reporting the first problem found.
///
/// Checks run in a fixed order: host, presence of any authentication, the
/// individual credential fields of the chosen scheme, unrecognised
/// authentication properties, and finally whether the host forms a URL.
/// Empty strings count as missing.
///
/// # Errors
///
/// The [`ConfigurationError`] describing the first failed check.
pub fn validate(config: ClientConfig) -> std::result::Result<ValidConfig, ConfigurationError> {
    let host = required(config.host, ConfigurationError::MissingHost)?;
    let protocol = config
        .protocol
        .map(|p| p.trim_end_matches(':').to_owned())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_PROTOCOL.to_owned());

    let AuthConfig {
        oauth,
        basic_auth,
        unknown,
    } = config.auth;

    if oauth.is_none() && basic_auth.is_none() {
        return Err(ConfigurationError::MissingAuth);
    }

    let auth = match (oauth, basic_auth) {
        (Some(oauth), basic_auth) => {
            if basic_auth.is_some() {
                warn!("Both oauth and basic_auth configured, using oauth");
            }
            Authentication::OAuth(OAuthConfig::new(
                required(oauth.consumer_key, ConfigurationError::MissingConsumerKey)?,
                required(oauth.private_key, ConfigurationError::MissingPrivateKey)?,
                required(oauth.token, ConfigurationError::MissingOAuthToken)?,
                required(oauth.token_secret, ConfigurationError::MissingOAuthTokenSecret)?,
            ))
        }
        (None, Some(basic)) => Authentication::Basic(BasicAuth {
            user: required(basic.username, ConfigurationError::MissingUsername)?,
            pass: required(basic.password, ConfigurationError::MissingPassword)?,
        }),
        (None, None) => return Err(ConfigurationError::MissingAuth),
    };

    if let Some(key) = unknown.into_keys().next() {
        return Err(ConfigurationError::InvalidAuthenticationProperty(key));
    }

    check_host(&protocol, &host, config.port)?;

    Ok(ValidConfig {
        host,
        protocol,
        port: config.port,
        auth,
    })
}

fn required(
    value: Option<String>,
    missing: ConfigurationError,
) -> std::result::Result<String, ConfigurationError> {
    value.filter(|v| !v.is_empty()).ok_or(missing)
}

fn check_host(
    protocol: &str,
    host: &str,
    port: Option<u16>,
) -> std::result::Result<(), ConfigurationError> {
    let invalid = |reason: &str| ConfigurationError::InvalidHost {
        host: host.to_owned(),
        reason: reason.to_owned(),
    };

    let mut url =
        Url::parse(&format!("{protocol}://{host}")).map_err(|e| invalid(&e.to_string()))?;
    if url.host_str().is_none() {
        return Err(invalid("no host name"));
    }
    if !matches!(url.path(), "" | "/") || url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("host must not contain a path, query or fragment"));
    }
    if port.is_some() {
        url.set_port(port)
            .map_err(|()| invalid("port cannot be set for this protocol"))?;
    }
    Ok(())
}
