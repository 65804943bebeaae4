//! Spoiler gating for posts carrying configured sensitive tags.

use super::markdown;
use std::collections::{BTreeSet, HashSet};

/// Outcome of [`SpoilerPolicy::apply`]. `content` is MarkdownV2 text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoilerDecision {
    pub content: Option<String>,
    pub should_post: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SpoilerPolicy {
    tags: BTreeSet<String>,
}

impl SpoilerPolicy {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tags: tags
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Spoiler tags present on the post, sorted (case-insensitive match)
    pub fn matched(&self, post_tags: &HashSet<String>) -> Vec<String> {
        let lowered: HashSet<String> = post_tags.iter().map(|t| t.to_lowercase()).collect();
        self.tags
            .iter()
            .filter(|t| lowered.contains(*t))
            .cloned()
            .collect()
    }

    /// Decide how (and whether) `url` may be shown.
    ///
    /// `adult_destination` is true for NSFW channels and direct messages. A post
    /// with spoiler tags is never sent anywhere else, not even partially.
    pub fn apply(
        &self,
        post_tags: &HashSet<String>,
        url: &str,
        adult_destination: bool,
    ) -> SpoilerDecision {
        let hit = self.matched(post_tags);

        if hit.is_empty() {
            return SpoilerDecision {
                content: Some(markdown::escape(url)),
                should_post: true,
            };
        }

        if !adult_destination {
            return SpoilerDecision {
                content: None,
                should_post: false,
            };
        }

        let warning = markdown::escape(&format!("⚠️ CW: {}", hit.join(", ")));
        SpoilerDecision {
            content: Some(format!(
                "{}\n{}",
                warning,
                markdown::spoiler(&markdown::escape(url))
            )),
            should_post: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn policy() -> SpoilerPolicy {
        SpoilerPolicy::new(["Gore", "noncon", " "])
    }

    #[test]
    fn test_no_spoiler_tags_posts_plain_url() {
        let decision = policy().apply(&tags(&["fox"]), "https://a.net/1", false);
        assert_eq!(
            decision,
            SpoilerDecision {
                content: Some("https://a\\.net/1".to_string()),
                should_post: true,
            }
        );
    }

    #[test]
    fn test_spoiler_tags_blocked_in_safe_channel() {
        let decision = policy().apply(&tags(&["fox", "gore"]), "https://a.net/1", false);
        assert!(!decision.should_post);
        assert!(decision.content.is_none());
    }

    #[test]
    fn test_spoiler_tags_wrapped_in_adult_channel() {
        let decision = policy().apply(&tags(&["noncon", "GORE"]), "https://a.net/1", true);
        assert!(decision.should_post);
        assert_eq!(
            decision.content.as_deref(),
            Some("⚠️ CW: gore, noncon\n||https://a\\.net/1||")
        );
    }

    #[test]
    fn test_blank_configured_tags_are_dropped() {
        assert!(policy().matched(&tags(&["", " "])).is_empty());
    }
}
