//! CouchDB external-process hook that relays full-text search requests.
//!
//! # Overview
//! CouchDB pipes one JSON request description per line to this process
//! (configured under `[external]` in `local.ini`). Each line is translated
//! by `fti-core` into a request against the search indexer, executed over
//! one lazily-created HTTP connection, and answered with exactly one JSON
//! line on stdout.
//!
//! # Design
//! - `config`: clap flags → `RelayConfig`.
//! - `upstream`: the `Transport` seam and its ureq implementation.
//! - `relay`: the blocking read-execute-write loop.
//! - `logging`: tracing to stderr or a log file, never stdout.

pub mod config;
pub mod error;
pub mod logging;
pub mod relay;
pub mod upstream;

pub use config::{Args, RelayConfig};
pub use error::{HookError, TransportError};
pub use relay::{Relay, RelayStats};
pub use upstream::{Transport, Upstream};
