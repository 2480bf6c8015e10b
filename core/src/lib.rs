//! Request translation core for the CouchDB full-text-search hook.
//!
//! # Overview
//! Turns the JSON request descriptions CouchDB pipes to an external process
//! into `HttpRequest` values aimed at the search indexer, and turns the
//! indexer's `HttpResponse` into the single JSON line CouchDB expects back.
//! Nothing here touches the network (host-does-IO pattern).
//!
//! # Design
//! - `Translator` is stateless; it holds the indexer base URL and a `Route`.
//! - `build_request` / `parse_response` make the I/O boundary explicit.
//! - Header allow-lists live in one table (`headers`) used in both
//!   directions.
//! - Client-input problems are `RelayError`s and map onto in-band
//!   responses via `HookResponse::from_error`.

pub mod error;
pub mod headers;
pub mod http;
pub mod route;
pub mod translate;
pub mod types;

pub use error::RelayError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use route::Route;
pub use translate::Translator;
pub use types::{HookResponse, InboundRequest};
