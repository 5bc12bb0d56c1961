//! URL and path helpers shared by the endpoints and the validation engine.

use std::collections::HashMap;

use url::Url;

/// Joins a base URL and a path fragment with exactly one slash between them.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if base.is_empty() {
        path.to_string()
    } else {
        format!("{base}/{path}")
    }
}

/// Normalizes a path for comparison: resolves `.`/`..` segments, collapses
/// duplicate slashes and strips leading and trailing slashes.
pub(crate) fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// A URL is usable for an outbound request when it parses and names both a
/// scheme and a host.
pub(crate) fn is_valid_url(candidate: &str) -> bool {
    matches!(Url::parse(candidate), Ok(parsed) if parsed.has_host())
}

/// Splits a raw query string into a name -> ordered values map.
pub(crate) fn parse_query(raw: &str) -> HashMap<String, Vec<String>> {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        params.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    params
}
