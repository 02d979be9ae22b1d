//! Metric name decoding.
//!
//! Grammar: `<name>[<tag>(,<tag>)*]?` where
//! - `name = [A-Za-z0-9]+(\.[A-Za-z0-9]+)*`
//! - `tag  = [A-Za-z0-9_-]+(:[A-Za-z0-9_-]+)?`
//!
//! Parsing never fails. Whatever the two patterns capture is used; anything
//! else in the input is ignored.

use once_cell::sync::Lazy;
use regex::Regex;

const NAME_PATTERN: &str = r"[A-Za-z0-9]+(?:\.[A-Za-z0-9]+)*";
const TAG_BLOCK_PATTERN: &str =
    r"\[[A-Za-z0-9_-]+(?::[A-Za-z0-9_-]+)?(?:,[A-Za-z0-9_-]+(?::[A-Za-z0-9_-]+)?)*\]";

#[allow(clippy::expect_used)]
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(NAME_PATTERN).expect("NAME_PATTERN is a valid literal"));

#[allow(clippy::expect_used)]
static TAG_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(TAG_BLOCK_PATTERN).expect("TAG_BLOCK_PATTERN is a valid literal"));

/// Root name and inline tags decoded from a registry key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedName {
    pub name: String,
    pub tags: Vec<String>,
}

/// Decode a registry key such as `"http.requests[route:login,canary]"`.
pub fn parse_metric_name(raw: &str) -> ParsedName {
    let name = NAME_RE
        .find(raw)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let tags = TAG_BLOCK_RE
        .find(raw)
        .map(|m| split_tag_block(m.as_str()))
        .unwrap_or_default();

    ParsedName { name, tags }
}

/// Split a matched `[...]` block into tags, in written order.
fn split_tag_block(block: &str) -> Vec<String> {
    let inner = block.trim_start_matches('[').trim_end_matches(']');
    if inner.is_empty() {
        return Vec::new();
    }
    inner.split(',').map(str::to_string).collect()
}

/// Force compilation of both patterns.
///
/// Call once at startup so the first report pass does not pay for it.
pub fn warm_up() {
    Lazy::force(&NAME_RE);
    Lazy::force(&TAG_BLOCK_RE);
}
