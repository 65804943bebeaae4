//! Seams between the scheduler and the outside world.
//!
//! The scheduler and [`Notifier`](super::notifier::Notifier) only talk to these
//! traits; `telegram` provides the production implementations and the tests
//! provide in-memory fakes.

use async_trait::async_trait;
use thiserror::Error;

/// Where a post is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryTarget {
    /// A group or channel, by chat id
    Channel(i64),
    /// A private conversation with the subscription owner, by user id
    DirectMessage(i64),
}

impl std::fmt::Display for DeliveryTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryTarget::Channel(id) => write!(f, "channel {}", id),
            DeliveryTarget::DirectMessage(id) => write!(f, "user {}", id),
        }
    }
}

/// A resolved delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: i64,
    /// Channel is flagged for adult content
    pub nsfw: bool,
}

/// A resolved direct-message recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Error)]
pub enum PlatformError {
    /// The bot has no access (kicked, blocked, missing rights)
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// The chat or user no longer exists
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Other(String),
}

/// Chat platform used for delivery. `send` takes Telegram MarkdownV2 text.
#[async_trait]
pub trait MessagingPlatform: Send + Sync {
    async fn fetch_channel(&self, channel_id: i64) -> Result<Channel, PlatformError>;

    async fn fetch_user(&self, user_id: i64) -> Result<User, PlatformError>;

    async fn send(&self, target: DeliveryTarget, text: &str) -> Result<(), PlatformError>;
}

/// Per-tenant administrative state.
#[async_trait]
pub trait TenantState: Send + Sync {
    /// Frozen tenants consume posts without receiving them
    async fn is_frozen(&self, guild_id: i64) -> anyhow::Result<bool>;

    async fn is_nsfw_allowed(&self, guild_id: i64) -> anyhow::Result<bool>;
}

/// Out-of-band channel to the bot operator.
#[async_trait]
pub trait OperatorAlert: Send + Sync {
    async fn notify(&self, operator_id: i64, message: &str) -> Result<(), PlatformError>;
}
