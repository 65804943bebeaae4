//! Include/exclude tag filters attached to a subscription.
//!
//! A filter string is a list of tags separated by whitespace or commas.
//! Tags prefixed with `-` are excluded, every other tag is required:
//!
//! ```ignore
//! let filter = TagFilter::parse("fox, -gore cute");
//! // include: {"fox", "cute"}, exclude: {"gore"}
//! ```

use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

static SEPARATOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s,]+").expect("BUG: Failed to compile hardcoded regex pattern [\\s,]+")
});

/// Why a post did not pass a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    Accepted,
    /// None of the required tags is present
    MissingRequired,
    /// At least one excluded tag is present
    Excluded(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    include: BTreeSet<String>,
    exclude: BTreeSet<String>,
}

impl TagFilter {
    /// Parse a raw filter string. Empty or missing input yields an empty filter.
    pub fn parse(raw: &str) -> Self {
        let mut include = BTreeSet::new();
        let mut exclude = BTreeSet::new();

        for token in SEPARATOR_PATTERN.split(raw.trim()) {
            if token.is_empty() {
                continue;
            }
            if let Some(stripped) = token.strip_prefix('-') {
                if !stripped.is_empty() {
                    exclude.insert(stripped.to_lowercase());
                }
            } else {
                include.insert(token.to_lowercase());
            }
        }

        Self { include, exclude }
    }

    pub fn from_optional(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or_default()
    }

    pub fn include(&self) -> &BTreeSet<String> {
        &self.include
    }

    pub fn exclude(&self) -> &BTreeSet<String> {
        &self.exclude
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Evaluate a post's (lowercase) tags.
    ///
    /// - If include tags are specified, the post must contain at least one of them.
    /// - The post must not contain any exclude tag.
    pub fn check(&self, tags: &HashSet<String>) -> FilterOutcome {
        if !self.include.is_empty() && !self.include.iter().any(|t| tags.contains(t)) {
            return FilterOutcome::MissingRequired;
        }

        let matched: Vec<String> = self
            .exclude
            .iter()
            .filter(|t| tags.contains(*t))
            .cloned()
            .collect();
        if !matched.is_empty() {
            return FilterOutcome::Excluded(matched);
        }

        FilterOutcome::Accepted
    }
}
