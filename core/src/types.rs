//! Request DTOs and helpers for reading the response envelope.
//!
//! # Design
//! Requests are typed so the wire shape is decided in one place (which
//! fields are always sent, which are dropped when blank). Responses are
//! deliberately left as `serde_json::Value`: the server's user records are
//! opaque to the client and passed through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A single server-side record (user row, session, webhook) as returned.
pub type Record = Map<String, Value>;

pub const DEFAULT_BANDWIDTH: &str = "10M";
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const DEFAULT_BANDWIDTH_DAYS: u32 = 30;

fn default_bandwidth() -> String {
    DEFAULT_BANDWIDTH.to_string()
}

/// `None` and `Some("")` are both treated as "not supplied".
fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

/// Request payload for creating a user. All five fields are always sent,
/// an empty `profile` included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default = "default_bandwidth")]
    pub bandwidth_up: String,
    #[serde(default = "default_bandwidth")]
    pub bandwidth_down: String,
    #[serde(default)]
    pub profile: String,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            bandwidth_up: default_bandwidth(),
            bandwidth_down: default_bandwidth(),
            profile: String::new(),
        }
    }

    pub fn bandwidth(mut self, up: impl Into<String>, down: impl Into<String>) -> Self {
        self.bandwidth_up = up.into();
        self.bandwidth_down = down.into();
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }
}

/// Request payload for updating a user. `username` is always sent; the
/// optional fields are omitted when absent or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub username: String,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub bandwidth_up: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub bandwidth_down: Option<String>,
}

impl UserUpdate {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn bandwidth_up(mut self, rate: impl Into<String>) -> Self {
        self.bandwidth_up = Some(rate.into());
        self
    }

    pub fn bandwidth_down(mut self, rate: impl Into<String>) -> Self {
        self.bandwidth_down = Some(rate.into());
        self
    }
}

/// Query parameters for listing users. An empty `search` is not sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuery {
    #[serde(default = "default_page_size")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub search: String,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            search: String::new(),
        }
    }
}

impl UserQuery {
    pub fn page(limit: u32, offset: u32) -> Self {
        Self {
            limit,
            offset,
            search: String::new(),
        }
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: term.into(),
            ..Self::default()
        }
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
        ];
        if !self.search.is_empty() {
            params.push(("search".to_string(), self.search.clone()));
        }
        params
    }
}

/// Query parameters for a user's connection history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub username: String,
    pub limit: u32,
}

impl HistoryQuery {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        vec![
            ("username".to_string(), self.username.clone()),
            ("limit".to_string(), self.limit.to_string()),
        ]
    }
}

/// Query parameters for daily bandwidth usage. An empty `username` means
/// all users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandwidthQuery {
    pub username: String,
    pub days: u32,
}

impl Default for BandwidthQuery {
    fn default() -> Self {
        Self {
            username: String::new(),
            days: DEFAULT_BANDWIDTH_DAYS,
        }
    }
}

impl BandwidthQuery {
    pub fn for_user(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("days".to_string(), self.days.to_string())];
        if !self.username.is_empty() {
            params.push(("username".to_string(), self.username.clone()));
        }
        params
    }
}

/// Output format of the `export` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Request payload for registering a webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWebhook {
    pub url: String,
    pub events: Vec<String>,
}

// ---------------------------------------------------------------------------
// Response envelope: {"success": bool, "message": string, "data": any}
// ---------------------------------------------------------------------------

/// Build the envelope every failure collapses into.
pub fn failure(message: impl Into<String>) -> Value {
    json!({ "success": false, "message": message.into() })
}

/// True only when `success` is present and exactly `true`.
pub fn is_success(envelope: &Value) -> bool {
    envelope
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

pub fn message_of(envelope: &Value) -> Option<&str> {
    envelope.get("message").and_then(Value::as_str)
}

/// The `data` member, if present and not null.
pub fn data_of(envelope: &Value) -> Option<&Value> {
    envelope.get("data").filter(|d| !d.is_null())
}

/// Keep only the JSON objects of an array, dropping anything else.
pub(crate) fn records_of(value: Option<&Value>) -> Vec<Record> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect()
        })
        .unwrap_or_default()
}
