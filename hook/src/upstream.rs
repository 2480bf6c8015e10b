//! The connection to the search indexer.
//!
//! # Design
//! `Transport` is the seam between the relay loop and the network: it
//! executes one `HttpRequest` and reports either the indexer's response or a
//! `TransportError`. After an error the loop calls `reset`, and the next
//! `execute` starts from a fresh connection.
//!
//! `Upstream` is the ureq implementation. The `ureq::Agent` is created
//! lazily on first use and dropped on `reset`, taking any pooled
//! connection with it. Response bodies are read in full, with no size cap.

use std::time::Duration;

use fti_core::{HttpMethod, HttpRequest, HttpResponse};
use tracing::debug;
use ureq::http::Response;
use ureq::typestate::WithBody;
use ureq::{Agent, Body, RequestBuilder};

use crate::error::TransportError;

pub trait Transport {
    fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Discard the current connection; the next `execute` opens a new one.
    fn reset(&mut self);
}

/// Blocking HTTP connection to the indexer, recreated after failures.
pub struct Upstream {
    agent: Option<Agent>,
    timeout: Option<Duration>,
    opened: u64,
}

impl Upstream {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            agent: None,
            timeout,
            opened: 0,
        }
    }

    /// How many agents have been created so far.
    pub fn connections_opened(&self) -> u64 {
        self.opened
    }

    pub fn is_connected(&self) -> bool {
        self.agent.is_some()
    }

    fn agent(&mut self) -> &Agent {
        if self.agent.is_none() {
            self.opened += 1;
            debug!(opened = self.opened, "opening connection to search indexer");
        }
        let timeout = self.timeout;
        self.agent.get_or_insert_with(|| {
            // 4xx/5xx come back as data; the relay passes them through.
            Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(timeout)
                .build()
                .new_agent()
        })
    }
}

impl Transport for Upstream {
    fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent();
        let url = request.url.as_str();
        let headers = &request.headers;
        let body = request.body.as_deref();

        let result = match request.method {
            HttpMethod::Get => with_headers(agent.get(url), headers).call(),
            HttpMethod::Head => with_headers(agent.head(url), headers).call(),
            HttpMethod::Delete => with_headers(agent.delete(url), headers).call(),
            HttpMethod::Post => send(with_headers(agent.post(url), headers), body),
            HttpMethod::Put => send(with_headers(agent.put(url), headers), body),
        };
        let mut response = result?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()?;

        Ok(HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    fn reset(&mut self) {
        if self.agent.take().is_some() {
            debug!("dropped connection to search indexer");
        }
    }
}

fn send(
    builder: RequestBuilder<WithBody>,
    body: Option<&str>,
) -> Result<Response<Body>, ureq::Error> {
    match body {
        Some(body) => builder.send(body),
        None => builder.send_empty(),
    }
}

fn with_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
