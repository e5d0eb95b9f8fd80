use reqwest::Method;
use serde::Serialize;
use std::fmt;
use url::Url;

/// The only signature method Jira accepts for OAuth 1.0a application links.
pub const SIGNATURE_METHOD: &str = "RSA-SHA1";

/// The authentication scheme attached to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    OAuth(OAuthConfig),
    Basic(BasicAuth),
}

impl Authentication {
    /// Short name of the scheme, safe to log.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::OAuth(_) => "oauth",
            Self::Basic(_) => "basic",
        }
    }
}

/// OAuth signing configuration handed to an [`OAuthSigner`].
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct OAuthConfig {
    pub consumer_key: String,
    pub private_key: String,
    pub token: String,
    pub token_secret: String,
    pub signature_method: &'static str,
}

impl OAuthConfig {
    pub(crate) fn new(
        consumer_key: String,
        private_key: String,
        token: String,
        token_secret: String,
    ) -> Self {
        Self {
            consumer_key,
            private_key,
            token,
            token_secret,
            signature_method: SIGNATURE_METHOD,
        }
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("consumer_key", &self.consumer_key)
            .field("private_key", &"<redacted>")
            .field("token", &self.token)
            .field("token_secret", &"<redacted>")
            .field("signature_method", &self.signature_method)
            .finish()
    }
}

/// Basic-auth credentials in the shape the transport expects.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct BasicAuth {
    pub user: String,
    pub pass: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

/// Computes OAuth 1.0a request signatures.
///
/// Implementations receive the stored signing configuration together with the
/// request line and return the complete `Authorization` header value
/// (`OAuth oauth_consumer_key="...", ...`).
pub trait OAuthSigner: Send + Sync {
    /// # Errors
    ///
    /// If the signature cannot be computed, e.g. the private key does not parse.
    fn authorization(
        &self,
        oauth: &OAuthConfig,
        method: &Method,
        url: &Url,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}
