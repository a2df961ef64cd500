//! Failure-tolerant facade over the user management API.
//!
//! # Design
//! `RadiusApi` pairs a `RadiusClient` with a `Transport` and exposes one
//! method per server operation. None of them return an error: network
//! failures, HTTP error statuses, unparseable bodies and server-side
//! `success: false` all collapse into the operation's empty default
//! (`false`, `[]`, an empty map, or `None`). Mutating operations also write
//! a one-line notice to the notice sink, stdout unless `with_notices` swaps it.

use std::cell::RefCell;
use std::io::{self, Write};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::RadiusClient;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    self, data_of, is_success, message_of, records_of, BandwidthQuery, ExportFormat,
    HistoryQuery, NewUser, NewWebhook, Record, UserQuery, UserUpdate,
};

pub struct RadiusApi<T = UreqTransport> {
    client: RadiusClient,
    transport: T,
    notices: RefCell<Box<dyn Write>>,
}

impl RadiusApi<UreqTransport> {
    /// Connect to `base_url` over blocking HTTP, authenticating with `api_key`.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_transport(RadiusClient::new(base_url, api_key), UreqTransport::new())
    }
}

impl<T: Transport> RadiusApi<T> {
    pub fn with_transport(client: RadiusClient, transport: T) -> Self {
        Self {
            client,
            transport,
            notices: RefCell::new(Box::new(io::stdout())),
        }
    }

    /// Send the `✅`/`❌` notices of mutating calls to `sink` instead of stdout.
    pub fn with_notices(mut self, sink: impl Write + 'static) -> Self {
        self.notices = RefCell::new(Box::new(sink));
        self
    }

    pub fn client(&self) -> &RadiusClient {
        &self.client
    }

    /// Send a request to any endpoint and return the server envelope.
    ///
    /// The method must be one of `GET`, `POST`, `PUT`, `DELETE`; anything
    /// else is rejected before a request is built. Every other failure is
    /// returned as `Ok({"success": false, "message": ...})`.
    pub fn dispatch(
        &self,
        method: &str,
        endpoint: &str,
        body: Option<&Value>,
        params: Option<&[(String, String)]>,
    ) -> Result<Value, ApiError> {
        let method: HttpMethod = method.parse()?;
        Ok(self.send(self.client.build_request(method, endpoint, body, params)))
    }

    fn send(&self, built: Result<HttpRequest, ApiError>) -> Value {
        let request = match built {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "could not build request");
                return types::failure(err.to_string());
            }
        };
        debug!(method = %request.method, url = %request.path, "dispatching request");

        match self.transport.execute(&request) {
            Ok(response) => {
                if !response.is_success() {
                    warn!(url = %request.path, status = response.status, "request failed");
                }
                self.client.parse_response(response)
            }
            Err(err) => {
                warn!(url = %request.path, error = %err, "request failed");
                types::failure(err.to_string())
            }
        }
    }

    /// Verify the stored API key against the `login` endpoint.
    pub fn login(&self) -> bool {
        is_success(&self.send(self.client.build_login()))
    }

    /// Aggregate counters (`total_users`, `active_sessions`), or an empty map.
    pub fn get_stats(&self) -> Record {
        let envelope = self.send(Ok(self.client.build_stats()));
        success_object(&envelope).unwrap_or_default()
    }

    /// One page of users, optionally filtered by a username substring.
    pub fn list_users(&self, query: &UserQuery) -> Vec<Record> {
        let envelope = self.send(Ok(self.client.build_list_users(query)));
        if !is_success(&envelope) {
            return Vec::new();
        }
        records_of(data_of(&envelope).and_then(|data| data.get("users")))
    }

    pub fn create_user(&self, user: &NewUser) -> bool {
        let envelope = self.send(self.client.build_create_user(user));
        self.report(
            &envelope,
            || format!("User '{}' created", user.username),
            "create user",
        )
    }

    /// The user's check/reply attribute rows, or `None` when the lookup fails.
    pub fn get_user(&self, username: &str) -> Option<Record> {
        let envelope = self.send(Ok(self.client.build_get_user(username)));
        if !is_success(&envelope) {
            return None;
        }
        Some(success_object(&envelope).unwrap_or_default())
    }

    pub fn update_user(&self, update: &UserUpdate) -> bool {
        let envelope = self.send(self.client.build_update_user(update));
        self.report(
            &envelope,
            || format!("User '{}' updated", update.username),
            "update user",
        )
    }

    pub fn delete_user(&self, username: &str) -> bool {
        let envelope = self.send(Ok(self.client.build_delete_user(username)));
        self.report(
            &envelope,
            || format!("User '{username}' deleted"),
            "delete user",
        )
    }

    /// Accounting sessions for one user, newest first.
    pub fn history(&self, query: &HistoryQuery) -> Vec<Record> {
        self.list(Ok(self.client.build_history(query)))
    }

    /// Daily byte and session-time totals over the last `days` days.
    pub fn bandwidth_stats(&self, query: &BandwidthQuery) -> Vec<Record> {
        self.list(Ok(self.client.build_bandwidth_stats(query)))
    }

    pub fn export_users(&self) -> Vec<Record> {
        self.list(Ok(self.client.build_export(ExportFormat::Json)))
    }

    /// The CSV export as raw text. The body is not JSON, so this bypasses
    /// envelope parsing and only checks the status.
    pub fn export_csv(&self) -> Option<String> {
        let request = self.client.build_export(ExportFormat::Csv);
        debug!(method = %request.method, url = %request.path, "dispatching request");
        match self.transport.execute(&request) {
            Ok(response) if response.is_success() => Some(response.body),
            Ok(response) => {
                warn!(url = %request.path, status = response.status, "request failed");
                None
            }
            Err(err) => {
                warn!(url = %request.path, error = %err, "request failed");
                None
            }
        }
    }

    pub fn list_webhooks(&self) -> Vec<Record> {
        self.list(Ok(self.client.build_list_webhooks()))
    }

    /// Register a webhook; returns the stored record (with its server id).
    pub fn create_webhook(&self, webhook: &NewWebhook) -> Option<Record> {
        let envelope = self.send(self.client.build_create_webhook(webhook));
        let created = self.report(
            &envelope,
            || format!("Webhook for '{}' created", webhook.url),
            "create webhook",
        );
        if created {
            success_object(&envelope)
        } else {
            None
        }
    }

    pub fn delete_webhook(&self, id: &str) -> bool {
        let envelope = self.send(Ok(self.client.build_delete_webhook(id)));
        self.report(
            &envelope,
            || format!("Webhook '{id}' deleted"),
            "delete webhook",
        )
    }

    /// Write the outcome of a mutating call and return whether it succeeded.
    fn report(&self, envelope: &Value, done: impl FnOnce() -> String, action: &str) -> bool {
        if is_success(envelope) {
            let notice = done();
            info!("{notice}");
            self.notify(&format!("✅ {notice}"));
            true
        } else {
            let reason = message_of(envelope).unwrap_or("unknown error");
            warn!(action, reason, "operation rejected");
            self.notify(&format!("❌ Failed to {action}: {reason}"));
            false
        }
    }

    fn notify(&self, line: &str) {
        let mut sink = self.notices.borrow_mut();
        if let Err(err) = writeln!(sink, "{line}").and_then(|()| sink.flush()) {
            warn!(error = %err, "could not write notice");
        }
    }

    fn list(&self, built: Result<HttpRequest, ApiError>) -> Vec<Record> {
        let envelope = self.send(built);
        if !is_success(&envelope) {
            return Vec::new();
        }
        records_of(data_of(&envelope))
    }
}

/// `data` as an object, only for a successful envelope.
fn success_object(envelope: &Value) -> Option<Record> {
    if !is_success(envelope) {
        return None;
    }
    data_of(envelope).and_then(Value::as_object).cloned()
}
