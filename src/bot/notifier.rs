use super::platform::{Channel, DeliveryTarget, MessagingPlatform, PlatformError, TenantState};
use crate::db::entities::subscriptions;
use crate::sources::Post;
use crate::utils::filter::{FilterOutcome, TagFilter};
use crate::utils::markdown;
use crate::utils::spoiler::SpoilerPolicy;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Delivers single posts to a subscription's destination.
///
/// Never returns an error: every failure is logged against the subscription's
/// guild and reported as `false`.
#[derive(Clone)]
pub struct Notifier {
    platform: Arc<dyn MessagingPlatform>,
    tenants: Arc<dyn TenantState>,
    spoiler: SpoilerPolicy,
    /// MarkdownV2 footer appended to every post
    footer: String,
}

impl Notifier {
    pub fn new(
        platform: Arc<dyn MessagingPlatform>,
        tenants: Arc<dyn TenantState>,
        spoiler: SpoilerPolicy,
        manage_url: Option<&str>,
    ) -> Self {
        let footer = match manage_url {
            Some(url) => format!("\n\n{}", markdown::link("⚙️ Manage this feed", url)),
            None => format!(
                "\n\n{}",
                markdown::escape("⚙️ Use /subscriptions to manage this feed.")
            ),
        };

        Self {
            platform,
            tenants,
            spoiler,
            footer,
        }
    }

    /// Resolve a channel, logging which of the three outcomes happened.
    pub async fn fetch_channel_safely(
        &self,
        channel_id: i64,
        subscription: &subscriptions::Model,
    ) -> Result<Channel, PlatformError> {
        debug!(
            "Fetching channel {} for subscription {}",
            channel_id, subscription.id
        );

        let result = self.platform.fetch_channel(channel_id).await;
        match &result {
            Ok(channel) => debug!(
                "Resolved channel {} (nsfw: {}) for subscription {}",
                channel.id, channel.nsfw, subscription.id
            ),
            Err(PlatformError::Forbidden(e)) => error!(
                guild_id = ?subscription.guild_id,
                "PERMISSION DENIED: cannot access channel {} for subscription {}: {}",
                channel_id, subscription.id, e
            ),
            Err(PlatformError::NotFound(e)) => error!(
                guild_id = ?subscription.guild_id,
                "CHANNEL NOT FOUND: channel {} for subscription {} no longer exists: {}",
                channel_id, subscription.id, e
            ),
            Err(PlatformError::Other(e)) => error!(
                guild_id = ?subscription.guild_id,
                "Unexpected error fetching channel {} for subscription {}: {}",
                channel_id, subscription.id, e
            ),
        }
        result
    }

    /// Bold title and author line. Hidden behind a spoiler when the post
    /// carries spoiler tags.
    fn caption(&self, post: &Post) -> Option<String> {
        let title = post.title.trim();
        if title.is_empty() {
            return None;
        }

        let mut caption = format!("*{}*", markdown::escape(title));
        if let Some(author) = post.author.as_deref().filter(|a| !a.trim().is_empty()) {
            caption.push_str(&markdown::escape(&format!(" by {}", author.trim())));
        }

        if self.spoiler.matched(&post.tags).is_empty() {
            Some(caption)
        } else {
            Some(markdown::spoiler(&caption))
        }
    }

    /// Deliver one post to one subscription.
    ///
    /// Returns `true` if the post was sent or intentionally suppressed because
    /// the tenant is frozen; `false` on filter rejection, spoiler suppression or
    /// any delivery failure.
    pub async fn process_single_post(
        &self,
        subscription: &subscriptions::Model,
        post: &Post,
    ) -> bool {
        let guild_id = subscription.guild_id;

        let filter = TagFilter::from_optional(subscription.filters.as_deref());
        if !filter.is_empty() {
            debug!(
                "Filtering {} for subscription {}: include {:?}, exclude {:?}",
                post.id,
                subscription.id,
                filter.include(),
                filter.exclude()
            );
        }
        match filter.check(&post.tags) {
            FilterOutcome::Accepted => {}
            FilterOutcome::MissingRequired => {
                info!(
                    guild_id = ?guild_id,
                    "Skipping {} for subscription {}: none of the required tags present",
                    post.id, subscription.id
                );
                return false;
            }
            FilterOutcome::Excluded(matched) => {
                info!(
                    guild_id = ?guild_id,
                    "Skipping {} for subscription {}: excluded tags {:?}",
                    post.id, subscription.id, matched
                );
                return false;
            }
        }

        let target = subscription.delivery_target();

        if let (DeliveryTarget::Channel(_), Some(guild)) = (target, guild_id) {
            match self.tenants.is_frozen(guild).await {
                Ok(true) => {
                    warn!(
                        guild_id = ?guild_id,
                        "Guild {} is FROZEN - skipping post {} to channel {}",
                        guild, post.id, subscription.channel_id
                    );
                    return true;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(
                        guild_id = ?guild_id,
                        "Failed to read guild {} state: {:#}", guild, e
                    );
                    return false;
                }
            }
        }

        // Direct messages count as adult destinations but have no mirror link
        let (url, adult_destination) = match target {
            DeliveryTarget::Channel(channel_id) => {
                match self.fetch_channel_safely(channel_id, subscription).await {
                    Ok(channel) => (post.display_url(channel.nsfw), channel.nsfw),
                    Err(_) => return false,
                }
            }
            DeliveryTarget::DirectMessage(user_id) => match self.platform.fetch_user(user_id).await
            {
                Ok(user) => {
                    debug!("Resolved user {} ({:?})", user.id, user.username);
                    (post.url.as_str(), true)
                }
                Err(e) => {
                    error!(
                        guild_id = ?guild_id,
                        "Cannot resolve user {} for subscription {}: {}",
                        user_id, subscription.id, e
                    );
                    return false;
                }
            },
        };

        let decision = self.spoiler.apply(&post.tags, url, adult_destination);
        let content = match decision.content {
            Some(content) if decision.should_post => content,
            _ => {
                info!(
                    guild_id = ?guild_id,
                    "Skipping {} for subscription {} due to spoiler tags",
                    post.id, subscription.id
                );
                return false;
            }
        };

        let message = match self.caption(post) {
            Some(caption) => format!("{}\n{}{}", caption, content, self.footer),
            None => format!("{}{}", content, self.footer),
        };

        match self.platform.send(target, &message).await {
            Ok(()) => {
                info!(
                    guild_id = ?guild_id,
                    "Posted {} [{}] to {} ({} for {})",
                    post.id,
                    post.rating,
                    target,
                    subscription.service_type,
                    subscription.search_criteria
                );
                if let Some(ref description) = post.description {
                    debug!("Post {} description: {:.120}", post.id, description);
                }
                true
            }
            Err(PlatformError::Forbidden(e)) => {
                error!(guild_id = ?guild_id, "Permission denied posting to {}: {}", target, e);
                false
            }
            Err(PlatformError::NotFound(e)) => {
                error!(guild_id = ?guild_id, "{} not found: {}", target, e);
                false
            }
            Err(PlatformError::Other(e)) => {
                error!(guild_id = ?guild_id, "Error posting {} to {}: {}", post.id, target, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::testing::{channel_subscription, pm_subscription, FakePlatform, FakeTenants};

    const GUILD: i64 = 10;
    const CHANNEL: i64 = -500;

    fn notifier(platform: Arc<FakePlatform>, tenants: FakeTenants) -> Notifier {
        Notifier::new(
            platform,
            Arc::new(tenants),
            SpoilerPolicy::new(["gore", "noncon"]),
            Some("https://example.net/manage"),
        )
    }

    fn post(id: &str, tags: &[&str]) -> Post {
        let mut post = Post::new(id, format!("https://e621.net/posts/{}", id)).with_tags(tags);
        post.nsfw_url = Some(format!("https://mirror.net/{}", id));
        post
    }

    #[tokio::test]
    async fn test_sends_with_footer() {
        let platform = Arc::new(FakePlatform::default());
        let notifier = notifier(platform.clone(), FakeTenants::default());
        let sub = channel_subscription(1, GUILD, CHANNEL, "fox");

        assert!(notifier.process_single_post(&sub, &post("5", &["fox"])).await);

        let sent = platform.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, DeliveryTarget::Channel(CHANNEL));
        assert!(sent[0].1.starts_with("https://e621\\.net/posts/5"));
        assert!(sent[0].1.ends_with("[⚙️ Manage this feed](https://example.net/manage)"));
    }

    #[tokio::test]
    async fn test_title_and_author_lead_the_message() {
        let platform = Arc::new(FakePlatform::default());
        let notifier = notifier(platform.clone(), FakeTenants::default());
        let sub = channel_subscription(1, GUILD, CHANNEL, "fox");
        let mut post = post("5", &["fox"]);
        post.title = "Fox (sketch)".to_string();
        post.author = Some("painter".to_string());

        assert!(notifier.process_single_post(&sub, &post).await);

        let sent = platform.sent();
        assert!(sent[0]
            .1
            .starts_with("*Fox \\(sketch\\)* by painter\nhttps://e621\\.net/posts/5"));
    }

    #[tokio::test]
    async fn test_caption_hidden_for_spoilered_post() {
        let platform = Arc::new(FakePlatform::default().with_nsfw_channel(CHANNEL));
        let notifier = notifier(platform.clone(), FakeTenants::default());
        let sub = channel_subscription(1, GUILD, CHANNEL, "fox");
        let mut post = post("5", &["fox", "gore"]);
        post.title = "Fox".to_string();

        assert!(notifier.process_single_post(&sub, &post).await);

        let sent = platform.sent();
        assert!(sent[0].1.starts_with("||*Fox*||\n⚠️ CW: gore\n"));
    }

    #[tokio::test]
    async fn test_filter_rejection_sends_nothing() {
        let platform = Arc::new(FakePlatform::default());
        let notifier = notifier(platform.clone(), FakeTenants::default());
        let mut sub = channel_subscription(1, GUILD, CHANNEL, "fox");
        sub.filters = Some("fox -gore".to_string());

        assert!(!notifier.process_single_post(&sub, &post("5", &["wolf"])).await);
        assert!(!notifier.process_single_post(&sub, &post("6", &["fox", "gore"])).await);
        assert!(platform.sent().is_empty());
    }

    #[tokio::test]
    async fn test_frozen_guild_is_handled_without_sending() {
        let platform = Arc::new(FakePlatform::default());
        let tenants = FakeTenants {
            frozen: [GUILD].into(),
            ..Default::default()
        };
        let notifier = notifier(platform.clone(), tenants);
        let sub = channel_subscription(1, GUILD, CHANNEL, "fox");

        assert!(notifier.process_single_post(&sub, &post("5", &["fox"])).await);
        assert!(platform.sent().is_empty());
    }

    #[tokio::test]
    async fn test_nsfw_channel_prefers_mirror_and_spoilers() {
        let platform = Arc::new(FakePlatform::default().with_nsfw_channel(CHANNEL));
        let notifier = notifier(platform.clone(), FakeTenants::default());
        let sub = channel_subscription(1, GUILD, CHANNEL, "fox");

        assert!(notifier.process_single_post(&sub, &post("5", &["fox", "gore"])).await);

        let sent = platform.sent();
        assert!(sent[0].1.starts_with("⚠️ CW: gore\n||https://mirror\\.net/5||"));
    }

    #[tokio::test]
    async fn test_spoiler_in_safe_channel_is_suppressed() {
        let platform = Arc::new(FakePlatform::default());
        let notifier = notifier(platform.clone(), FakeTenants::default());
        let sub = channel_subscription(1, GUILD, CHANNEL, "fox");

        assert!(!notifier.process_single_post(&sub, &post("5", &["gore"])).await);
        assert!(platform.sent().is_empty());
    }

    #[tokio::test]
    async fn test_direct_message_uses_plain_url_with_spoiler() {
        let platform = Arc::new(FakePlatform::default());
        let notifier = notifier(platform.clone(), FakeTenants::default());
        let sub = pm_subscription(2, 77, "fox");

        assert!(notifier.process_single_post(&sub, &post("5", &["noncon"])).await);

        let sent = platform.sent();
        assert_eq!(sent[0].0, DeliveryTarget::DirectMessage(77));
        assert!(sent[0].1.contains("||https://e621\\.net/posts/5||"));
    }

    #[tokio::test]
    async fn test_channel_failures_are_reported() {
        let platform = Arc::new(
            FakePlatform::default()
                .with_forbidden_channel(1)
                .with_missing_channel(2),
        );
        let notifier = notifier(platform.clone(), FakeTenants::default());

        let forbidden = channel_subscription(1, GUILD, 1, "fox");
        assert!(matches!(
            notifier.fetch_channel_safely(1, &forbidden).await,
            Err(PlatformError::Forbidden(_))
        ));
        let missing = channel_subscription(2, GUILD, 2, "fox");
        assert!(matches!(
            notifier.fetch_channel_safely(2, &missing).await,
            Err(PlatformError::NotFound(_))
        ));

        assert!(!notifier.process_single_post(&forbidden, &post("5", &["fox"])).await);
        assert!(!notifier.process_single_post(&missing, &post("5", &["fox"])).await);
    }

    #[tokio::test]
    async fn test_send_failure_returns_false() {
        let platform = Arc::new(
            FakePlatform::default().with_failing_target(DeliveryTarget::Channel(CHANNEL)),
        );
        let notifier = notifier(platform.clone(), FakeTenants::default());
        let sub = channel_subscription(1, GUILD, CHANNEL, "fox");

        assert!(!notifier.process_single_post(&sub, &post("5", &["fox"])).await);
    }
}
