//! Header allow-lists shared by both directions of the relay.
//!
//! Names are stored in canonical casing; matching ignores ASCII case and the
//! emitted name is always the canonical one.

/// Headers copied from the CouchDB request onto the indexer request.
pub const FORWARDED_REQUEST_HEADERS: &[&str] = &["Accept", "If-None-Match"];

/// Headers copied from the indexer response into the hook response.
pub const FORWARDED_RESPONSE_HEADERS: &[&str] = &["Content-Type", "ETag"];

/// Canonical name of `name` if it is on `allow_list`.
pub fn canonical_name(allow_list: &'static [&'static str], name: &str) -> Option<&'static str> {
    allow_list
        .iter()
        .copied()
        .find(|allowed| allowed.eq_ignore_ascii_case(name))
}

/// Whether `value` may be sent as an HTTP header value: visible characters,
/// spaces and tabs, no other control bytes.
pub fn is_valid_value(value: &str) -> bool {
    value.bytes().all(|b| b == b'\t' || (b >= 0x20 && b != 0x7f))
}

/// Keep only the allowed headers, renamed to canonical casing.
///
/// Duplicate names collapse to the last value seen.
pub fn filter<'a, I>(allow_list: &'static [&'static str], headers: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut kept: Vec<(String, String)> = Vec::new();
    for (name, value) in headers {
        let Some(canonical) = canonical_name(allow_list, name) else {
            continue;
        };
        match kept.iter_mut().find(|(k, _)| k == canonical) {
            Some(entry) => entry.1 = value.to_string(),
            None => kept.push((canonical.to_string(), value.to_string())),
        }
    }
    kept
}
