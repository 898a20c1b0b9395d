//! URL-safe slugs derived from strain names.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

static NON_ALPHANUMERIC_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-z0-9]+").expect("valid slug pattern"));

/// Used when a strain contains no ASCII alphanumerics at all.
pub const FALLBACK_SLUG: &str = "product";

/// Lower-case, collapse every run of non-alphanumerics to one hyphen, trim hyphens.
///
/// May return an empty string; callers decide on a fallback.
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    NON_ALPHANUMERIC_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Suffix a colliding slug with the write timestamp (unix millis).
pub fn disambiguate(slug: &str, now: DateTime<Utc>) -> String {
    format!("{slug}-{}", now.timestamp_millis())
}
