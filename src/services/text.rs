//! Text derivations shared by the publishing services: slugs, excerpts,
//! and tag lists.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

pub const EXCERPT_CHARS: usize = 200;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\x{0E00}-\x{0E7F}-]+").expect("valid regex"));
static HYPHEN_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("valid regex"));
static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Normalize free text into a URL slug.
///
/// Lower-cases, turns whitespace runs into `-`, drops everything except
/// ASCII word characters, the Thai block and `-`, collapses hyphen runs, and trims
/// hyphens from both ends. Idempotent.
#[must_use]
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let hyphenated = WHITESPACE.replace_all(&lowered, "-");
    let stripped = DISALLOWED.replace_all(&hyphenated, "");
    let collapsed = HYPHEN_RUNS.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_owned()
}

/// Pick the stored slug for a record: an explicit slug wins, otherwise the
/// title. Falls back to `<kind>-<id prefix>` when normalization leaves
/// nothing.
#[must_use]
pub fn resolve_slug(explicit: Option<&str>, title: &str, kind: &str, id: Uuid) -> String {
    let slug = match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(explicit) => slugify(explicit),
        None => slugify(title),
    };
    if slug.is_empty() {
        let simple = id.simple().to_string();
        format!("{kind}-{}", &simple[..8])
    } else {
        slug
    }
}

/// Plain-text summary of HTML content: tags stripped, first 200 characters,
/// `...` appended when truncated.
#[must_use]
pub fn excerpt_from_html(content: &str) -> String {
    let text = HTML_TAG.replace_all(content, "");
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() { format!("{head}...") } else { head }
}

/// Tag list as sent by clients: a JSON array or a comma-separated string.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Csv(String),
}

impl TagsInput {
    /// Trimmed, non-empty tags in input order.
    #[must_use]
    pub fn into_tags(self) -> Vec<String> {
        let raw: Vec<String> = match self {
            Self::List(list) => list,
            Self::Csv(csv) => csv.split(',').map(str::to_owned).collect(),
        };
        raw.into_iter()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// `value || existing`: absent or blank input keeps the stored text.
#[must_use]
pub fn or_keep(input: Option<String>, existing: String) -> String {
    match input {
        Some(value) if !value.trim().is_empty() => value,
        _ => existing,
    }
}

/// Trimmed text, or `None` when absent or blank.
#[must_use]
pub fn non_blank(input: Option<&str>) -> Option<&str> {
    input.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "text_test.rs"]
mod tests;
