//! Stateless translation between CouchDB hook requests and indexer requests.
//!
//! # Design
//! `Translator` holds only the indexer base URL and the route selector and
//! carries no mutable state between calls. `build_request` produces an
//! `HttpRequest` and `parse_response` consumes an `HttpResponse`; the caller
//! executes the HTTP round-trip in between, keeping this crate free of I/O.

use std::collections::BTreeMap;

use url::{form_urlencoded, Url};

use crate::error::RelayError;
use crate::headers::{self, FORWARDED_REQUEST_HEADERS, FORWARDED_RESPONSE_HEADERS};
use crate::http::{HttpRequest, HttpResponse};
use crate::route::Route;
use crate::types::{HookResponse, InboundRequest};

/// Number of segments CouchDB sends for `/db/_fti/docid/index`.
pub const PATH_SEGMENTS: usize = 4;

/// Builds indexer requests and turns indexer responses into hook responses.
#[derive(Debug, Clone)]
pub struct Translator {
    base_url: String,
    route: Route,
}

impl Translator {
    pub fn new(base_url: &str, route: Route) -> Result<Self, RelayError> {
        let invalid = |reason: String| RelayError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("cannot carry a path".to_string()));
        }
        url.set_query(None);
        url.set_fragment(None);
        Ok(Self {
            base_url: url.as_str().trim_end_matches('/').to_string(),
            route,
        })
    }

    /// The indexer base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Parse one input line and build the indexer request for it.
    pub fn translate_line(&self, line: &str) -> Result<HttpRequest, RelayError> {
        let request = InboundRequest::from_line(line)?;
        self.build_request(&request)
    }

    pub fn build_request(&self, request: &InboundRequest) -> Result<HttpRequest, RelayError> {
        if request.path.len() != PATH_SEGMENTS {
            return Err(RelayError::InvalidPath {
                path: request.path.clone(),
            });
        }
        let method = request.http_method()?;

        // path[1] names the hook itself and is never forwarded.
        let target = [&request.path[0], &request.path[2], &request.path[3]];
        let mut url = self.base_url.clone();
        for segment in self
            .route
            .prefix(&request.query)
            .iter()
            .chain(target.into_iter())
        {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        if !request.query.is_empty() {
            url.push('?');
            url.push_str(&encode_query(&request.query));
        }

        let headers = headers::filter(
            FORWARDED_REQUEST_HEADERS,
            request
                .headers
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        if let Some((name, _)) = headers.iter().find(|(_, v)| !headers::is_valid_value(v)) {
            return Err(RelayError::InvalidHeader { name: name.clone() });
        }

        let body = if method.has_body() {
            request.payload().map(str::to_string)
        } else {
            None
        };

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Convert the indexer's answer into the line sent back to CouchDB.
    ///
    /// Error statuses pass through as `{code, body}`; everything below 400
    /// also carries the allowed headers, so a 304 keeps its `ETag`.
    pub fn parse_response(&self, response: HttpResponse) -> HookResponse {
        let headers = if response.status < 400 {
            let kept = headers::filter(
                FORWARDED_RESPONSE_HEADERS,
                response
                    .headers
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            );
            if kept.is_empty() {
                None
            } else {
                Some(kept.into_iter().collect::<BTreeMap<_, _>>())
            }
        } else {
            None
        };

        HookResponse {
            code: response.status,
            headers,
            body: response.body,
        }
    }
}

fn encode_query(query: &BTreeMap<String, String>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query.iter())
        .finish()
}
