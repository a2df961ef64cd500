//! Executing `HttpRequest` values over the network.
//!
//! # Design
//! `Transport` is the only seam where I/O happens. `UreqTransport` is the
//! real, blocking implementation; any closure with the right signature is a
//! transport too, which is how tests script responses and failures without a
//! server.

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Perform one HTTP round-trip.
///
/// Implementations must return non-2xx responses as `Ok` data; status
/// interpretation belongs to `RadiusClient::parse_response`.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, ApiError>,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self(request)
    }
}

/// Blocking transport backed by a ureq agent. No timeout is configured, so a
/// call against an unresponsive server blocks until the OS gives up.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn decorate<B>(mut builder: ureq::RequestBuilder<B>, req: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in &req.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (key, value) in &req.query {
        builder = builder.query(key, value);
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, req: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let result = match (req.method, req.body.as_deref()) {
            (HttpMethod::Get, _) => decorate(self.agent.get(&req.path), req).call(),
            (HttpMethod::Delete, _) => decorate(self.agent.delete(&req.path), req).call(),
            (HttpMethod::Post, Some(body)) => {
                decorate(self.agent.post(&req.path), req).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => decorate(self.agent.post(&req.path), req).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                decorate(self.agent.put(&req.path), req).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => decorate(self.agent.put(&req.path), req).send_empty(),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}
