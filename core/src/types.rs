//! Wire shapes of the CouchDB external-process protocol.
//!
//! # Design
//! CouchDB writes one `InboundRequest` per line and expects exactly one
//! `HookResponse` line back. Only the fields the relay needs are modelled;
//! serde ignores the rest (`info`, `userCtx`, `peer`, ...). Maps are
//! `BTreeMap` so the outbound query string comes out in a stable order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::http::HttpMethod;

/// A request description as sent by CouchDB to an external hook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundRequest {
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Newer CouchDB releases name the method `method`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Older CouchDB releases name the method `verb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
    /// CouchDB sends the literal string `"undefined"` when there is no body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl InboundRequest {
    /// Parse one input line.
    pub fn from_line(line: &str) -> Result<Self, RelayError> {
        serde_json::from_str(line).map_err(|e| RelayError::MalformedRequest(e.to_string()))
    }

    /// The request method: `method` if present, else `verb`, else GET.
    pub fn http_method(&self) -> Result<HttpMethod, RelayError> {
        match self.method.as_deref().or(self.verb.as_deref()) {
            Some(name) => name.parse(),
            None => Ok(HttpMethod::Get),
        }
    }

    /// The request body, if CouchDB sent a real one.
    pub fn payload(&self) -> Option<&str> {
        self.body
            .as_deref()
            .filter(|body| !body.is_empty() && *body != NO_BODY)
    }
}

/// What CouchDB puts in `body` for requests without one.
const NO_BODY: &str = "undefined";

/// The response line written back to CouchDB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookResponse {
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub body: String,
}

impl HookResponse {
    /// A `text/plain` response with the given status.
    pub fn plain_text(code: u16, body: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        Self {
            code,
            headers: Some(headers),
            body: body.into(),
        }
    }

    /// Map a translation error onto the response CouchDB will see.
    pub fn from_error(err: &RelayError) -> Self {
        let body = match err {
            RelayError::InvalidPath { path } => usage(path),
            other => format!("{other}\n"),
        };
        Self::plain_text(err.status(), body)
    }

    /// The 500 reported when the indexer could not be reached at all.
    pub fn transport_failure(target: &str, detail: &str) -> Self {
        Self::plain_text(
            500,
            format!("error contacting {target}: {detail}\nis the search indexer running?\n"),
        )
    }

    /// Serialize as a single JSON line, without the trailing newline.
    pub fn to_line(&self) -> String {
        // A struct of strings and integers always serializes.
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"code\":{}}}", self.code))
    }
}

fn usage(path: &[String]) -> String {
    let hook = path.get(1).map(String::as_str).unwrap_or("_fti");
    format!(
        "Invalid path: /{}\n\
         Paths should be: /db_name/{hook}/docid/index_name?q=...\n\
         'docid' is from the '_design/docid' that defines index_name\n",
        path.join("/")
    )
}
