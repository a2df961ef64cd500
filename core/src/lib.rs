//! Blocking client for a RADIUS user management HTTP API.
//!
//! # Overview
//! Creates, reads, updates and deletes subscriber accounts (with their
//! bandwidth attributes), lists and searches them, and fetches aggregate
//! statistics, connection history, bandwidth usage, exports and webhooks.
//!
//! # Design
//! - `RadiusClient` is immutable connection settings plus pure `build_*`
//!   methods and one `parse_response`; it never touches the network.
//! - `Transport` performs the round-trip; `UreqTransport` is the blocking
//!   default and closures stand in for it in tests.
//! - `RadiusApi` ties the two together and never returns an error from a
//!   public operation: every failure becomes `false`, `[]`, `{}` or `None`.
//! - Server records stay `serde_json` maps; only request payloads are typed.

pub mod api;
pub mod client;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use api::RadiusApi;
pub use client::RadiusClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{
    BandwidthQuery, ExportFormat, HistoryQuery, NewUser, NewWebhook, Record, UserQuery, UserUpdate,
};
