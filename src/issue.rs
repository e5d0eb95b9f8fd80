use crate::transport::{RequestOptions, Response};
use crate::RestApi;
use serde_json::Value;

const ISSUE_ENDPOINT: &str = "issue";

/// Issue operations, borrowed from a client via [`JiraClient::issue`](crate::JiraClient::issue).
pub struct Issue<'a, C: RestApi + ?Sized> {
    client: &'a C,
}

impl<'a, C: RestApi + ?Sized> Issue<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    fn url(&self, key: &str, suffix: &str) -> String {
        self.client
            .build_url(&format!("{ISSUE_ENDPOINT}/{key}{suffix}"))
    }

    /// Fetch a single issue by key or id.
    ///
    /// # Errors
    ///
    /// If the transport fails to deliver the request.
    pub async fn get(&self, key: &str) -> Result<Response, C::Error> {
        self.client
            .make_request(RequestOptions::get(self.url(key, "")))
            .await
    }

    /// Create an issue. `body` is the full payload, usually `{"fields": {...}}`.
    ///
    /// # Errors
    ///
    /// If the transport fails to deliver the request.
    pub async fn create(&self, body: Value) -> Result<Response, C::Error> {
        let url = self.client.build_url(ISSUE_ENDPOINT);
        self.client
            .make_request(RequestOptions::post(url).json(body))
            .await
    }

    /// Edit an issue. Jira answers `204 No Content` on success.
    ///
    /// # Errors
    ///
    /// If the transport fails to deliver the request.
    pub async fn edit(&self, key: &str, body: Value) -> Result<Response, C::Error> {
        self.client
            .make_request(RequestOptions::put(self.url(key, "")).json(body))
            .await
    }

    /// # Errors
    ///
    /// If the transport fails to deliver the request.
    pub async fn delete(&self, key: &str) -> Result<Response, C::Error> {
        self.client
            .make_request(RequestOptions::delete(self.url(key, "")))
            .await
    }

    /// List the transitions available to the current user.
    ///
    /// # Errors
    ///
    /// If the transport fails to deliver the request.
    pub async fn transitions(&self, key: &str) -> Result<Response, C::Error> {
        self.client
            .make_request(RequestOptions::get(self.url(key, "/transitions")))
            .await
    }

    /// Perform a transition, e.g. `{"transition": {"id": "31"}}`.
    ///
    /// # Errors
    ///
    /// If the transport fails to deliver the request.
    pub async fn transition(&self, key: &str, body: Value) -> Result<Response, C::Error> {
        self.client
            .make_request(RequestOptions::post(self.url(key, "/transitions")).json(body))
            .await
    }

    /// # Errors
    ///
    /// If the transport fails to deliver the request.
    pub async fn add_comment(&self, key: &str, body: Value) -> Result<Response, C::Error> {
        self.client
            .make_request(RequestOptions::post(self.url(key, "/comment")).json(body))
            .await
    }
}
