//! Command-line configuration.
//!
//! CouchDB starts the hook from its `[external]` section, e.g.
//! `fti=/usr/bin/couchdb-fti-hook --remote-port 5985 --local-key local`.
//! `Args` is what clap parses; `RelayConfig` is the validated form the relay
//! is built from.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use fti_core::Route;

pub const DEFAULT_REMOTE_HOST: &str = "localhost";
pub const DEFAULT_REMOTE_PORT: u16 = 5985;
pub const DEFAULT_LOCAL_PORT: u16 = 5984;

#[derive(Debug, Parser)]
#[command(name = "couchdb-fti-hook", version)]
#[command(about = "Relay CouchDB external-hook requests to a full-text search indexer", long_about = None)]
pub struct Args {
    /// Host of the search indexer.
    #[arg(long, default_value = DEFAULT_REMOTE_HOST, conflicts_with = "url")]
    pub remote_host: String,

    /// Port of the search indexer.
    #[arg(long, default_value_t = DEFAULT_REMOTE_PORT, conflicts_with = "url")]
    pub remote_port: u16,

    /// Full base URL of the search indexer, e.g. http://search:5985/lucene.
    #[arg(short, long)]
    pub url: Option<String>,

    /// Key identifying this CouchDB to the indexer; used as the route prefix.
    #[arg(long, conflicts_with = "local_host")]
    pub local_key: Option<String>,

    /// Host of this CouchDB; with --local-port, used as the route prefix.
    #[arg(long)]
    pub local_host: Option<String>,

    /// Port of this CouchDB [default: 5984].
    #[arg(long, requires = "local_host")]
    pub local_port: Option<u16>,

    /// Give up on an indexer request after this many seconds.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Append diagnostics to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Validated relay settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub base_url: String,
    pub route: Route,
    pub timeout: Option<Duration>,
}

impl Args {
    pub fn base_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        // Bare IPv6 literals need brackets in a URL authority.
        if self.remote_host.contains(':') && !self.remote_host.starts_with('[') {
            format!("http://[{}]:{}", self.remote_host, self.remote_port)
        } else {
            format!("http://{}:{}", self.remote_host, self.remote_port)
        }
    }

    pub fn route(&self) -> Route {
        if let Some(key) = &self.local_key {
            Route::Key(key.clone())
        } else if let Some(host) = &self.local_host {
            Route::Local {
                host: host.clone(),
                port: self.local_port.unwrap_or(DEFAULT_LOCAL_PORT),
            }
        } else {
            Route::Command
        }
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            base_url: self.base_url(),
            route: self.route(),
            timeout: self.timeout.map(Duration::from_secs),
        }
    }
}
