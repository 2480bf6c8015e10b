//! The relay loop: one request line in, one response line out.
//!
//! # Design
//! Strictly sequential. A line is translated, executed and answered (and the
//! answer flushed) before the next line is read, because CouchDB waits for
//! each response before sending the next request. Every request gets exactly
//! one response line, whatever goes wrong with it; only a failure of
//! stdin/stdout stops the loop early.

use std::io::{BufRead, Write};

use fti_core::{HookResponse, Translator};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::RelayConfig;
use crate::error::{HookError, TransportError};
use crate::upstream::{Transport, Upstream};

/// Outcome counters for one relay session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Requests that reached the indexer and got an answer.
    pub forwarded: u64,
    /// Requests answered locally with a 4xx.
    pub rejected: u64,
    /// Requests that failed in transit.
    pub failed: u64,
}

pub struct Relay<T> {
    translator: Translator,
    transport: T,
    stats: RelayStats,
}

impl Relay<Upstream> {
    pub fn from_config(config: &RelayConfig) -> Result<Self, HookError> {
        let translator = Translator::new(&config.base_url, config.route.clone())?;
        Ok(Self::new(translator, Upstream::new(config.timeout)))
    }
}

impl<T: Transport> Relay<T> {
    pub fn new(translator: Translator, transport: T) -> Self {
        Self {
            translator,
            transport,
            stats: RelayStats::default(),
        }
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Answer one request line.
    pub fn handle_line(&mut self, line: &str) -> HookResponse {
        let request = match self.translator.translate_line(line) {
            Ok(request) => request,
            Err(err) => {
                warn!(%err, "rejected request");
                self.stats.rejected += 1;
                return HookResponse::from_error(&err);
            }
        };

        debug!(method = %request.method, url = %request.url, "forwarding to search indexer");
        match self.transport.execute(&request) {
            Ok(response) => {
                self.stats.forwarded += 1;
                let response = self.translator.parse_response(response);
                info!(code = response.code, url = %request.url, "relayed");
                response
            }
            Err(err) => self.transport_failed(&request.url, err),
        }
    }

    fn transport_failed(&mut self, url: &str, err: TransportError) -> HookResponse {
        error!(%err, url, "search indexer request failed; recreating connection");
        self.transport.reset();
        self.stats.failed += 1;
        HookResponse::transport_failure(self.translator.base_url(), &err.to_string())
    }

    /// Relay until `input` is exhausted.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> Result<RelayStats, HookError> {
        info!(indexer = self.translator.base_url(), route = ?self.translator.route(), "relay ready");

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            // Invalid UTF-8 turns into a JSON parse error, answered in-band.
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let span = info_span!("request", id = %Uuid::new_v4());
            let response = span.in_scope(|| self.handle_line(line));

            output.write_all(response.to_line().as_bytes())?;
            output.write_all(b"\n")?;
            output.flush()?;
        }

        info!(stats = ?self.stats, "stdin closed, relay shutting down");
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::{self, ErrorKind};

    use fti_core::{HttpRequest, HttpResponse, Route};

    use super::*;

    /// Scripted transport: pops one outcome per request.
    #[derive(Default)]
    struct Scripted {
        outcomes: VecDeque<Result<HttpResponse, ErrorKind>>,
        seen: Vec<HttpRequest>,
        resets: usize,
    }

    impl Scripted {
        fn then_ok(mut self, status: u16, body: &str) -> Self {
            self.outcomes.push_back(Ok(HttpResponse {
                status,
                headers: vec![
                    ("content-type".to_string(), "application/json".to_string()),
                    ("x-other".to_string(), "dropped".to_string()),
                ],
                body: body.to_string(),
            }));
            self
        }

        fn then_fail(mut self, kind: ErrorKind) -> Self {
            self.outcomes.push_back(Err(kind));
            self
        }
    }

    impl Transport for Scripted {
        fn execute(&mut self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.push(request.clone());
            match self.outcomes.pop_front().expect("unscripted request") {
                Ok(response) => Ok(response),
                Err(kind) => Err(io::Error::from(kind).into()),
            }
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    const SEARCH: &str = r#"{"method":"GET","path":["mydb","_fti","mydoc","myindex"],"query":{"q":"foo"},"headers":{}}"#;

    fn relay(transport: Scripted) -> Relay<Scripted> {
        Relay::new(
            Translator::new("http://localhost:5985", Route::Command).unwrap(),
            transport,
        )
    }

    fn run_lines(relay: &mut Relay<Scripted>, input: &str) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        relay.run(input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn forwards_search_and_filters_headers() {
        let mut relay = relay(Scripted::default().then_ok(200, r#"{"rows":[]}"#));
        let resp = relay.handle_line(SEARCH);

        assert_eq!(resp.code, 200);
        let headers = resp.headers.unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["Content-Type"], "application/json");
        assert_eq!(
            relay.transport().seen[0].url,
            "http://localhost:5985/search/mydb/mydoc/myindex?q=foo"
        );
    }

    #[test]
    fn bad_path_never_reaches_transport() {
        let mut relay = relay(Scripted::default());
        let resp = relay.handle_line(r#"{"path":["mydb","_fti"],"query":{}}"#);

        assert_eq!(resp.code, 400);
        assert_eq!(resp.headers.unwrap()["Content-Type"], "text/plain");
        assert!(relay.transport().seen.is_empty());
        assert_eq!(relay.transport().resets, 0);
        assert_eq!(relay.stats().rejected, 1);
    }

    #[test]
    fn transport_failure_resets_and_next_request_succeeds() {
        let mut relay = relay(
            Scripted::default()
                .then_fail(ErrorKind::ConnectionRefused)
                .then_ok(200, "{}"),
        );

        let first = relay.handle_line(SEARCH);
        assert_eq!(first.code, 500);
        assert!(!first.body.is_empty());
        assert_eq!(relay.transport().resets, 1);

        let second = relay.handle_line(SEARCH);
        assert_eq!(second.code, 200);
        assert_eq!(relay.transport().resets, 1);
        assert_eq!(
            relay.stats(),
            RelayStats {
                forwarded: 1,
                rejected: 0,
                failed: 1,
            }
        );
    }

    #[test]
    fn one_response_line_per_request_line() {
        let mut relay = relay(
            Scripted::default()
                .then_ok(200, "a")
                .then_fail(ErrorKind::TimedOut)
                .then_ok(404, "no such index"),
        );
        let input = format!("{SEARCH}\nnot json\n{SEARCH}\n\n{SEARCH}\n");
        let lines = run_lines(&mut relay, &input);

        let codes: Vec<u64> = lines.iter().map(|l| l["code"].as_u64().unwrap()).collect();
        assert_eq!(codes, vec![200, 400, 500, 404]);
        assert!(lines[3].get("headers").is_none());
        assert_eq!(lines[3]["body"], "no such index");
    }

    #[test]
    fn final_line_without_newline_is_answered() {
        let mut relay = relay(Scripted::default().then_ok(200, "x"));
        let lines = run_lines(&mut relay, SEARCH);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["body"], "x");
    }

    #[test]
    fn empty_input_ends_cleanly() {
        let mut relay = relay(Scripted::default());
        assert!(run_lines(&mut relay, "").is_empty());
    }

    #[test]
    fn invalid_utf8_is_answered_in_band() {
        let mut relay = relay(Scripted::default());
        let mut out = Vec::new();
        relay.run(&b"\xff\xfe{\n"[..], &mut out).unwrap();
        let line: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(line["code"], 400);
    }

    #[test]
    fn illegal_header_value_is_rejected_without_reset() {
        let mut relay = relay(Scripted::default().then_ok(200, "{}"));
        assert_eq!(relay.handle_line(SEARCH).code, 200);

        let resp = relay.handle_line(
            r#"{"method":"GET","path":["mydb","_fti","mydoc","myindex"],"query":{"q":"foo"},"headers":{"Accept":"a\u0001b"}}"#,
        );
        assert_eq!(resp.code, 400);
        assert!(resp.body.contains("Accept"));
        assert_eq!(relay.transport().seen.len(), 1);
        assert_eq!(relay.transport().resets, 0);
        assert_eq!(relay.stats().failed, 0);
        assert_eq!(relay.stats().rejected, 1);
    }

    #[test]
    fn posted_body_reaches_transport() {
        let mut relay = relay(Scripted::default().then_ok(200, "{}"));
        relay.handle_line(
            r#"{"method":"POST","path":["mydb","_fti","mydoc","myindex"],"query":{},"body":"{\"q\":\"bar\"}"}"#,
        );
        let seen = &relay.transport().seen[0];
        assert_eq!(seen.body.as_deref(), Some(r#"{"q":"bar"}"#));
    }

    #[test]
    fn unsupported_method_is_405() {
        let mut relay = relay(Scripted::default());
        let resp = relay.handle_line(
            r#"{"method":"PATCH","path":["mydb","_fti","mydoc","myindex"],"query":{}}"#,
        );
        assert_eq!(resp.code, 405);
        assert!(relay.transport().seen.is_empty());
    }
}
