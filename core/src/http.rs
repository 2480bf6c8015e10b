//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe the outbound request to the search indexer and its
//! response as plain data. The core crate builds `HttpRequest` values and
//! consumes `HttpResponse` values without touching the network; the hook
//! binary executes the actual round-trip. This keeps the translation
//! deterministic and testable without a live indexer.

use std::fmt;
use std::str::FromStr;

use crate::error::RelayError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// POST and PUT forward the CouchDB request body.
    pub fn has_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl FromStr for HttpMethod {
    type Err = RelayError;

    /// Method names are matched case-insensitively; CouchDB always sends them
    /// upper-case but older hook scripts did not care.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "HEAD" => Ok(HttpMethod::Head),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(RelayError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound request to the search indexer, described as plain data.
///
/// Built by `Translator::build_request`. `url` is absolute and already
/// carries the percent-encoded path and the query string. `body` is only
/// set for methods that send one.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// A response from the search indexer, described as plain data.
///
/// Constructed by the host after executing an `HttpRequest`, then handed to
/// `Translator::parse_response`. Header names may arrive in any case.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}
