//! Stateless HTTP request builder and response normalizer for the user API.
//!
//! # Design
//! `RadiusClient` holds the immutable connection settings (base URL, API key
//! and the derived header set) and nothing else. Every operation is split
//! into a `build_*` method that produces an `HttpRequest` and a single
//! `parse_response` that folds any `HttpResponse` into the server's JSON
//! envelope. Executing the request is someone else's job (see `transport`).

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    self, BandwidthQuery, ExportFormat, HistoryQuery, NewUser, NewWebhook, UserQuery, UserUpdate,
};

pub const LOGIN: &str = "login";
pub const STATS: &str = "stats";
pub const USERS: &str = "users";
pub const USER: &str = "user";
pub const HISTORY: &str = "history";
pub const BANDWIDTH_STATS: &str = "bandwidth-stats";
pub const EXPORT: &str = "export";
pub const WEBHOOKS: &str = "webhooks";

/// Synchronous, stateless request builder for the user management API.
#[derive(Debug, Clone)]
pub struct RadiusClient {
    base_url: String,
    api_key: String,
    headers: Vec<(String, String)>,
}

impl RadiusClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            headers: vec![
                ("Authorization".to_string(), format!("Bearer {api_key}")),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// `base_url/endpoint`, with exactly one slash between the two.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Build a request for any endpoint.
    ///
    /// POST and PUT serialize `body` as JSON and ignore `params`; GET and
    /// DELETE send `params` as the query string and ignore `body`.
    pub fn build_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
        params: Option<&[(String, String)]>,
    ) -> Result<HttpRequest, ApiError> {
        let (body, query) = if method.has_body() {
            let body = body
                .map(serde_json::to_string)
                .transpose()
                .map_err(|e| ApiError::SerializationError(e.to_string()))?;
            (body, Vec::new())
        } else {
            (None, params.map(<[_]>::to_vec).unwrap_or_default())
        };

        Ok(HttpRequest {
            method,
            path: self.url_for(endpoint),
            headers: self.headers.clone(),
            query,
            body,
        })
    }

    fn build_json<T: Serialize>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_value(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        self.build_request(method, endpoint, Some(&body), None)
    }

    fn build_query(
        &self,
        method: HttpMethod,
        endpoint: &str,
        params: &[(String, String)],
    ) -> HttpRequest {
        HttpRequest {
            method,
            path: self.url_for(endpoint),
            headers: self.headers.clone(),
            query: params.to_vec(),
            body: None,
        }
    }

    pub fn build_login(&self) -> Result<HttpRequest, ApiError> {
        self.build_json(HttpMethod::Post, LOGIN, &json!({ "api_key": self.api_key }))
    }

    pub fn build_stats(&self) -> HttpRequest {
        self.build_query(HttpMethod::Get, STATS, &[])
    }

    pub fn build_list_users(&self, query: &UserQuery) -> HttpRequest {
        self.build_query(HttpMethod::Get, USERS, &query.to_params())
    }

    pub fn build_create_user(&self, input: &NewUser) -> Result<HttpRequest, ApiError> {
        self.build_json(HttpMethod::Post, USERS, input)
    }

    pub fn build_get_user(&self, username: &str) -> HttpRequest {
        self.build_query(HttpMethod::Get, USER, &username_param(username))
    }

    pub fn build_update_user(&self, input: &UserUpdate) -> Result<HttpRequest, ApiError> {
        self.build_json(HttpMethod::Put, USER, input)
    }

    pub fn build_delete_user(&self, username: &str) -> HttpRequest {
        self.build_query(HttpMethod::Delete, USER, &username_param(username))
    }

    pub fn build_history(&self, query: &HistoryQuery) -> HttpRequest {
        self.build_query(HttpMethod::Get, HISTORY, &query.to_params())
    }

    pub fn build_bandwidth_stats(&self, query: &BandwidthQuery) -> HttpRequest {
        self.build_query(HttpMethod::Get, BANDWIDTH_STATS, &query.to_params())
    }

    pub fn build_export(&self, format: ExportFormat) -> HttpRequest {
        let params = [("format".to_string(), format.as_str().to_string())];
        self.build_query(HttpMethod::Get, EXPORT, &params)
    }

    pub fn build_list_webhooks(&self) -> HttpRequest {
        self.build_query(HttpMethod::Get, WEBHOOKS, &[])
    }

    pub fn build_create_webhook(&self, input: &NewWebhook) -> Result<HttpRequest, ApiError> {
        self.build_json(HttpMethod::Post, WEBHOOKS, input)
    }

    pub fn build_delete_webhook(&self, id: &str) -> HttpRequest {
        let params = [("id".to_string(), id.to_string())];
        self.build_query(HttpMethod::Delete, WEBHOOKS, &params)
    }

    /// Fold a response into the server envelope.
    ///
    /// Non-2xx statuses and non-JSON bodies become `{success: false, message}`;
    /// anything else is returned exactly as the server sent it.
    pub fn parse_response(&self, response: HttpResponse) -> Value {
        match decode(response) {
            Ok(value) => value,
            Err(err) => types::failure(err.to_string()),
        }
    }
}

fn username_param(username: &str) -> [(String, String); 1] {
    [("username".to_string(), username.to_string())]
}

fn decode(response: HttpResponse) -> Result<Value, ApiError> {
    if !response.is_success() {
        return Err(ApiError::HttpError {
            status: response.status,
            body: response.body,
        });
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}
