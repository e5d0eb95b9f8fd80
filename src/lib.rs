use async_trait::async_trait;
use tracing::debug;

use crate::auth::Authentication;
use crate::config::{validate, ClientConfig, ValidConfig};
use crate::error::{ConfigurationError, Result};
use crate::issue::Issue;
use crate::transport::{ReqwestTransport, RequestOptions, Response, Transport};

pub mod auth;
pub mod config;
pub mod error;
pub mod issue;
pub mod transport;

/// Jira REST API version all URLs are built for.
pub const API_VERSION: u8 = 2;

/// What a sub-resource needs from its client.
#[async_trait]
pub trait RestApi: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fully qualified, percent-decoded URL for `path` below `rest/api/2/`.
    fn build_url(&self, path: &str) -> String;

    /// Attach authentication to `options` and send it.
    async fn make_request(
        &self,
        options: RequestOptions,
    ) -> std::result::Result<Response, Self::Error>;
}

/// The Jira client.
pub struct JiraClient<T = ReqwestTransport> {
    host: String,
    protocol: String,
    port: Option<u16>,
    auth: Authentication,
    transport: T,
}

impl JiraClient {
    /// Create a new Jira client using the default reqwest transport.
    ///
    /// OAuth configurations need a signer; build the transport yourself with
    /// [`ReqwestTransport::with_signer`] and use [`JiraClient::with_transport`].
    ///
    /// # Errors
    ///
    /// - If the configuration is invalid.
    /// - If creating a [reqwest::Client] fails.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let valid = validate(config)?;
        Ok(Self::from_valid(valid, ReqwestTransport::new()?))
    }

    /// Create a new Jira client using a specific `User-Agent`.
    ///
    /// # Errors
    ///
    /// - If the configuration is invalid.
    /// - If creating a [reqwest::Client] fails.
    pub fn new_with_user_agent(config: ClientConfig, user_agent: &str) -> Result<Self> {
        let valid = validate(config)?;
        Ok(Self::from_valid(
            valid,
            ReqwestTransport::new_with_user_agent(user_agent)?,
        ))
    }
}

impl<T: Transport> JiraClient<T> {
    /// Create a new Jira client sending requests through `transport`.
    ///
    /// # Errors
    ///
    /// If the configuration is invalid.
    pub fn with_transport(
        config: ClientConfig,
        transport: T,
    ) -> std::result::Result<Self, ConfigurationError> {
        Ok(Self::from_valid(validate(config)?, transport))
    }

    fn from_valid(valid: ValidConfig, transport: T) -> Self {
        Self {
            host: valid.host,
            protocol: valid.protocol,
            port: valid.port,
            auth: valid.auth,
            transport,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// `None` means the protocol's default port.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn version(&self) -> u8 {
        API_VERSION
    }

    pub fn authentication(&self) -> &Authentication {
        &self.auth
    }

    /// Build `<protocol>://<host>[:<port>]/rest/api/2/<path>`.
    ///
    /// The result is percent-decoded. `path` is used verbatim.
    pub fn build_url(&self, path: &str) -> String {
        let port = self.port.map(|p| format!(":{p}")).unwrap_or_default();
        decode(&format!(
            "{}://{}{port}/rest/api/{API_VERSION}/{path}",
            self.protocol, self.host
        ))
    }

    /// Attach the configured authentication to `options` and send them.
    ///
    /// Exactly one of `options.oauth` or `options.auth` is set; the other is
    /// cleared. Transport errors are returned as they are.
    ///
    /// # Errors
    ///
    /// Whatever the transport reports.
    pub async fn make_request(
        &self,
        mut options: RequestOptions,
    ) -> std::result::Result<Response, T::Error> {
        match &self.auth {
            Authentication::OAuth(oauth) => {
                options.oauth = Some(oauth.clone());
                options.auth = None;
            }
            Authentication::Basic(basic) => {
                options.auth = Some(basic.clone());
                options.oauth = None;
            }
        }

        debug!(
            method = %options.method,
            uri = %options.uri,
            auth = self.auth.scheme(),
            "Dispatching request"
        );
        self.transport.send(options).await
    }

    /// Access issue operations.
    pub fn issue(&self) -> Issue<'_, Self> {
        Issue::new(self)
    }
}

#[async_trait]
impl<T: Transport> RestApi for JiraClient<T> {
    type Error = T::Error;

    fn build_url(&self, path: &str) -> String {
        JiraClient::build_url(self, path)
    }

    async fn make_request(
        &self,
        options: RequestOptions,
    ) -> std::result::Result<Response, T::Error> {
        JiraClient::make_request(self, options).await
    }
}

fn decode(url: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(url.as_bytes())).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BasicAuthCredentials, OAuthCredentials};
    use std::convert::Infallible;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<RequestOptions>>,
    }

    #[async_trait]
    impl Transport for Recorder {
        type Error = Infallible;

        async fn send(
            &self,
            options: RequestOptions,
        ) -> std::result::Result<Response, Infallible> {
            self.sent.lock().unwrap().push(options);
            Ok(Response {
                status: 200,
                headers: Vec::new(),
                body: String::new(),
            })
        }
    }

    fn basic_client(config: ClientConfig) -> JiraClient<Recorder> {
        JiraClient::with_transport(
            config.basic_auth(BasicAuthCredentials::new("jdoe", "hunter2")),
            Recorder::default(),
        )
        .unwrap()
    }

    #[test]
    fn builds_versioned_url() {
        let client = basic_client(ClientConfig::new("example.com").protocol("https"));
        assert_eq!(
            client.build_url("issue/TEST-1"),
            "https://example.com/rest/api/2/issue/TEST-1"
        );
    }

    #[test]
    fn builds_url_with_port() {
        let client = basic_client(ClientConfig::new("example.com").port(8080));
        assert_eq!(
            client.build_url("issue/TEST-1"),
            "https://example.com:8080/rest/api/2/issue/TEST-1"
        );
    }

    #[test]
    fn builds_url_with_default_port() {
        let client = basic_client(ClientConfig::new("example.com").port(443));
        assert_eq!(
            client.build_url("issue/TEST-1"),
            "https://example.com:443/rest/api/2/issue/TEST-1"
        );

        let client = basic_client(ClientConfig::new("example.com").protocol("http").port(80));
        assert_eq!(
            client.build_url("issue/TEST-1"),
            "http://example.com:80/rest/api/2/issue/TEST-1"
        );
    }

    #[test]
    fn build_url_keeps_path_verbatim() {
        let client = basic_client(ClientConfig::new("example.com"));
        assert_eq!(
            client.build_url("issue/../search"),
            "https://example.com/rest/api/2/issue/../search"
        );
        assert_eq!(
            client.build_url("/issue/./TEST-1"),
            "https://example.com/rest/api/2//issue/./TEST-1"
        );
    }

    #[test]
    fn build_url_keeps_host_as_configured() {
        let client = basic_client(ClientConfig::new("Jira.Example.com"));
        assert_eq!(client.host(), "Jira.Example.com");
        assert_eq!(
            client.build_url("issue/TEST-1"),
            "https://Jira.Example.com/rest/api/2/issue/TEST-1"
        );
    }

    #[test]
    fn build_url_decodes_escapes() {
        let client = basic_client(ClientConfig::new("example.com"));
        assert_eq!(
            client.build_url("search?jql=project%20%3D%20TEST"),
            "https://example.com/rest/api/2/search?jql=project = TEST"
        );
        assert_eq!(
            client.build_url("issue/my issue"),
            "https://example.com/rest/api/2/issue/my issue"
        );
    }

    #[test]
    fn build_url_is_pure() {
        let client = basic_client(ClientConfig::new("example.com"));
        assert_eq!(client.build_url("issue/X-1"), client.build_url("issue/X-1"));
    }

    #[test]
    fn client_exposes_settings() {
        let client = basic_client(ClientConfig::new("example.com").protocol("http"));
        assert_eq!(client.host(), "example.com");
        assert_eq!(client.protocol(), "http");
        assert_eq!(client.port(), None);
        assert_eq!(client.version(), 2);
        assert_eq!(client.authentication().scheme(), "basic");
    }

    #[tokio::test]
    async fn basic_client_sets_auth_only() {
        let client = basic_client(ClientConfig::new("example.com"));
        let mut options = RequestOptions::get(client.build_url("myself"));
        options.oauth = client_oauth_config();
        client.make_request(options).await.unwrap();

        let sent = client.transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let auth = sent[0].auth.as_ref().unwrap();
        assert_eq!(auth.user, "jdoe");
        assert_eq!(auth.pass, "hunter2");
        assert!(sent[0].oauth.is_none());
    }

    #[tokio::test]
    async fn oauth_client_sets_oauth_only() {
        let client = JiraClient::with_transport(
            ClientConfig::new("example.com").oauth(OAuthCredentials::new("ck", "pk", "t", "ts")),
            Recorder::default(),
        )
        .unwrap();
        client
            .make_request(RequestOptions::get(client.build_url("myself")))
            .await
            .unwrap();

        let sent = client.transport.sent.lock().unwrap();
        let oauth = sent[0].oauth.as_ref().unwrap();
        assert_eq!(oauth.consumer_key, "ck");
        assert_eq!(oauth.private_key, "pk");
        assert_eq!(oauth.token, "t");
        assert_eq!(oauth.token_secret, "ts");
        assert_eq!(oauth.signature_method, "RSA-SHA1");
        assert!(sent[0].auth.is_none());
    }

    #[tokio::test]
    async fn issue_resource_goes_through_client() {
        let client = basic_client(ClientConfig::new("example.com"));
        client.issue().transitions("TEST-1").await.unwrap();
        client
            .issue()
            .create(serde_json::json!({"fields": {"summary": "hi"}}))
            .await
            .unwrap();

        let sent = client.transport.sent.lock().unwrap();
        assert_eq!(
            sent[0].uri,
            "https://example.com/rest/api/2/issue/TEST-1/transitions"
        );
        assert_eq!(sent[1].method, reqwest::Method::POST);
        assert_eq!(sent[1].uri, "https://example.com/rest/api/2/issue");
        assert!(sent.iter().all(|o| o.auth.is_some()));
    }

    #[test]
    fn construction_fails_fast() {
        let err = JiraClient::with_transport(ClientConfig::new("example.com"), Recorder::default())
            .err()
            .unwrap();
        assert_eq!(err, ConfigurationError::MissingAuth);
    }

    fn client_oauth_config() -> Option<crate::auth::OAuthConfig> {
        Some(crate::auth::OAuthConfig::new(
            "a".into(),
            "b".into(),
            "c".into(),
            "d".into(),
        ))
    }
}
