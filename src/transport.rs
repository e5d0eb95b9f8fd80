use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::auth::{BasicAuth, OAuthConfig, OAuthSigner};

/// Description of a single request, understood by every [`Transport`].
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    /// Filled by the client when OAuth is configured.
    pub oauth: Option<OAuthConfig>,
    /// Filled by the client when basic auth is configured.
    pub auth: Option<BasicAuth>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Text(String),
}

impl RequestOptions {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            oauth: None,
            auth: None,
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn put(uri: impl Into<String>) -> Self {
        Self::new(Method::PUT, uri)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(Method::DELETE, uri)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self
    }
}

/// A response, passed through as received.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Sends a request and resolves once with its outcome.
#[async_trait]
pub trait Transport: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn send(&self, options: RequestOptions) -> Result<Response, Self::Error>;
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid request URL {uri}: {source}")]
    InvalidUrl {
        uri: String,
        source: url::ParseError,
    },

    #[error("OAuth request without a signer configured")]
    MissingSigner,

    #[error("Failed to sign request: {0}")]
    Signing(Box<dyn std::error::Error + Send + Sync>),
}

/// [`Transport`] backed by a [`reqwest::Client`].
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    signer: Option<Arc<dyn OAuthSigner>>,
}

impl ReqwestTransport {
    /// Create a new transport.
    ///
    /// # Errors
    ///
    /// If creating a [reqwest::Client] fails.
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self {
            client: Client::builder().build()?,
            signer: None,
        })
    }

    /// Create a new transport using a specific `User-Agent`.
    ///
    /// # Errors
    ///
    /// If creating a [reqwest::Client] fails.
    pub fn new_with_user_agent(user_agent: &str) -> Result<Self, TransportError> {
        Ok(Self {
            client: Client::builder().user_agent(user_agent).build()?,
            signer: None,
        })
    }

    /// Sign OAuth requests with `signer`. Without one, OAuth requests fail.
    pub fn with_signer(mut self, signer: Arc<dyn OAuthSigner>) -> Self {
        self.signer = Some(signer);
        self
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    type Error = TransportError;

    async fn send(&self, options: RequestOptions) -> Result<Response, TransportError> {
        let RequestOptions {
            method,
            uri,
            headers,
            query,
            body,
            oauth,
            auth,
        } = options;

        let mut url = Url::parse(&uri).map_err(|source| TransportError::InvalidUrl {
            uri: uri.clone(),
            source,
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(&query);
        }

        debug!(method = %method, url = %url, "Sending request");

        let mut request = self.client.request(method.clone(), url.clone());
        for (name, value) in &headers {
            request = request.header(name, value);
        }
        request = match body {
            Some(RequestBody::Json(value)) => request.json(&value),
            Some(RequestBody::Text(text)) => request.body(text),
            None => request,
        };

        if let Some(oauth) = &oauth {
            let signer = self.signer.as_ref().ok_or(TransportError::MissingSigner)?;
            let header = signer
                .authorization(oauth, &method, &url)
                .map_err(TransportError::Signing)?;
            request = request.header(AUTHORIZATION, header);
        } else if let Some(auth) = &auth {
            request = request.basic_auth(&auth.user, Some(&auth.pass));
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect();
        let body = response.text().await?;

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
