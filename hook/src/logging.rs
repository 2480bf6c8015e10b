//! Diagnostics setup.
//!
//! stdout belongs to CouchDB, so logs go to stderr or, with `--log-file`, to
//! a file opened in append mode. `RUST_LOG` overrides the default filter.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::HookError;

pub const DEFAULT_FILTER: &str = "fti_hook=info,couchdb_fti_hook=info";

pub fn init(log_file: Option<&Path>) -> Result<(), HookError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            registry
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .try_init()?;
        }
        None => {
            registry
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
    }
    Ok(())
}
