//! Error types for the user API client.
//!
//! # Design
//! The public operations on `RadiusApi` never return these: every failure
//! collapses into a `{success: false, message}` envelope and then into the
//! operation's empty default. `ApiError` exists for the layers underneath
//! (building, transport, parsing) and for the one failure that is raised
//! eagerly: an unsupported HTTP method passed to `dispatch`.

use std::fmt;

/// Errors produced while building, executing, or parsing a request.
#[derive(Debug)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, I/O).
    Transport(String),

    /// The server answered with a non-2xx status.
    HttpError { status: u16, body: String },

    /// The response body was not valid JSON.
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    SerializationError(String),

    /// `dispatch` was given a method other than GET, POST, PUT or DELETE.
    UnsupportedMethod(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "transport error: {msg}"),
            ApiError::HttpError { status, body } => {
                write!(f, "HTTP {status}: {body}")
            }
            ApiError::DeserializationError(msg) => {
                write!(f, "deserialization failed: {msg}")
            }
            ApiError::SerializationError(msg) => {
                write!(f, "serialization failed: {msg}")
            }
            ApiError::UnsupportedMethod(method) => {
                write!(f, "unsupported HTTP method: {method}")
            }
        }
    }
}

impl std::error::Error for ApiError {}
