use std::{collections::BTreeMap, collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Doc {
    pub id: String,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexKey {
    pub db: String,
    pub ddoc: String,
    pub index: String,
}

impl IndexKey {
    pub fn new(db: &str, ddoc: &str, index: &str) -> Self {
        Self {
            db: db.to_string(),
            ddoc: ddoc.to_string(),
            index: index.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResult {
    pub q: String,
    pub etag: String,
    pub total_rows: usize,
    pub rows: Vec<Doc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexInfo {
    pub db: String,
    pub ddoc: String,
    pub index: String,
    pub doc_count: usize,
    pub etag: String,
}

/// Echo of a request that matched neither `/search` nor `/info`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub segments: Vec<String>,
    pub query: BTreeMap<String, String>,
    pub accept: Option<String>,
    pub body: String,
}

pub type Indexes = Arc<HashMap<IndexKey, Vec<Doc>>>;

/// How long `/slow/...` stalls before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(5);

/// Header the indexer sets that the relay must never pass back.
pub const SERVER_HEADER: &str = "x-indexer";

/// Index and documents every fresh `app()` starts with.
pub fn sample_indexes() -> Indexes {
    let mut indexes = HashMap::new();
    indexes.insert(
        IndexKey::new("mydb", "mydoc", "myindex"),
        vec![
            Doc {
                id: "doc1".to_string(),
                title: "foo fighters".to_string(),
            },
            Doc {
                id: "doc2".to_string(),
                title: "bar none".to_string(),
            },
            Doc {
                id: "doc3".to_string(),
                title: "foo bar".to_string(),
            },
        ],
    );
    indexes.insert(
        IndexKey::new("my db", "a/b", "what?"),
        vec![Doc {
            id: "odd".to_string(),
            title: "foo in an oddly named index".to_string(),
        }],
    );
    Arc::new(indexes)
}

pub fn app() -> Router {
    Router::new()
        .route("/search/{db}/{ddoc}/{index}", get(search))
        .route("/info/{db}/{ddoc}/{index}", get(info))
        .route("/slow/{*rest}", get(slow))
        .fallback(echo)
        .with_state(sample_indexes())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn etag_for(key: &IndexKey, docs: &[Doc]) -> String {
    let ids: usize = docs.iter().map(|d| d.id.len()).sum();
    format!("\"{}-{}-{ids}\"", key.index.len(), docs.len())
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain")],
        "no such index\n",
    )
        .into_response()
}

async fn search(
    State(indexes): State<Indexes>,
    Path((db, ddoc, index)): Path<(String, String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let key = IndexKey::new(&db, &ddoc, &index);
    let Some(docs) = indexes.get(&key) else {
        return not_found();
    };
    let Some(q) = params.get("q") else {
        return (StatusCode::BAD_REQUEST, "missing q\n").into_response();
    };

    let etag = etag_for(&key, docs);
    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());
    if if_none_match == Some(etag.as_str()) {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }

    let rows: Vec<Doc> = docs
        .iter()
        .filter(|d| d.title.contains(q.as_str()))
        .cloned()
        .collect();
    let result = SearchResult {
        q: q.clone(),
        etag: etag.clone(),
        total_rows: rows.len(),
        rows,
    };
    let content_type = if wants_json(&headers) {
        "application/json"
    } else {
        "text/plain;charset=utf-8"
    };
    let body = serde_json::to_string(&result).unwrap_or_default();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::ETAG, etag),
            (header::HeaderName::from_static(SERVER_HEADER), "mock".to_string()),
        ],
        body,
    )
        .into_response()
}

async fn info(
    State(indexes): State<Indexes>,
    Path((db, ddoc, index)): Path<(String, String, String)>,
) -> Response {
    let key = IndexKey::new(&db, &ddoc, &index);
    let Some(docs) = indexes.get(&key) else {
        return not_found();
    };
    let etag = etag_for(&key, docs);
    let info = IndexInfo {
        doc_count: docs.len(),
        etag: etag.clone(),
        db,
        ddoc,
        index,
    };
    (
        [
            (header::ETAG, etag),
            (header::HeaderName::from_static(SERVER_HEADER), "mock".to_string()),
        ],
        Json(info),
    )
        .into_response()
}

async fn slow() -> &'static str {
    tokio::time::sleep(SLOW_DELAY).await;
    "finally\n"
}

async fn echo(
    method: Method,
    uri: Uri,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Json<Echo> {
    let segments = uri
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .map(percent_decode)
        .collect();
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        segments,
        query,
        accept: headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    })
}

fn percent_decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}
