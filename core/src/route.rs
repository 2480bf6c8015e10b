//! Route selection: the path prefix that tells the indexer what a request is
//! for.

use std::collections::BTreeMap;

/// How the outbound path prefix is chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Route {
    /// `/search/...` for queries, `/info/...` when there are no parameters.
    #[default]
    Command,
    /// `/<key>/...`, identifying the calling CouchDB by a configured key.
    Key(String),
    /// `/<host>/<port>/...`, identifying the calling CouchDB by address.
    Local { host: String, port: u16 },
}

impl Route {
    /// Unencoded prefix segments for a request with the given query.
    pub fn prefix(&self, query: &BTreeMap<String, String>) -> Vec<String> {
        match self {
            Route::Command if query.is_empty() => vec!["info".to_string()],
            Route::Command => vec!["search".to_string()],
            Route::Key(key) => vec![key.clone()],
            Route::Local { host, port } => vec![host.clone(), port.to_string()],
        }
    }
}
