use super::platform::{
    Channel, DeliveryTarget, MessagingPlatform, OperatorAlert, PlatformError, User,
};
use crate::config::TelegramConfig;
use crate::db::repo::Repo;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::adaptors::throttle::{Limits, Throttle};
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::{ApiError, RequestError};
use tracing::{debug, info};

pub type ThrottledBot = Throttle<Bot>;

/// Build the bot from config, honouring a custom Bot API server.
pub fn build_bot(config: &TelegramConfig) -> Result<ThrottledBot> {
    let mut bot = Bot::new(config.bot_token.clone());
    if let Some(ref api_url) = config.api_url {
        let url = reqwest::Url::parse(api_url).context("Invalid telegram.api_url")?;
        info!("Using custom Bot API server: {}", url);
        bot = bot.set_api_url(url);
    }
    Ok(bot.throttle(Limits::default()))
}

/// Map Bot API failures onto the delivery error taxonomy.
fn classify(err: RequestError) -> PlatformError {
    match err {
        RequestError::Api(api) => match api {
            ApiError::BotBlocked
            | ApiError::BotKicked
            | ApiError::BotKickedFromSupergroup
            | ApiError::UserDeactivated
            | ApiError::CantInitiateConversation
            | ApiError::NotEnoughRightsToPostMessages => PlatformError::Forbidden(api.to_string()),
            ApiError::ChatNotFound | ApiError::UserNotFound => {
                PlatformError::NotFound(api.to_string())
            }
            other => PlatformError::Other(other.to_string()),
        },
        other => PlatformError::Other(other.to_string()),
    }
}

/// Telegram delivery. Tenants are group chats; NSFW flags live in the `chats`
/// table since Telegram has no such concept.
#[derive(Clone)]
pub struct TelegramPlatform {
    bot: ThrottledBot,
    repo: Arc<Repo>,
}

impl TelegramPlatform {
    pub fn new(bot: ThrottledBot, repo: Arc<Repo>) -> Self {
        Self { bot, repo }
    }
}

#[async_trait]
impl MessagingPlatform for TelegramPlatform {
    async fn fetch_channel(&self, channel_id: i64) -> Result<Channel, PlatformError> {
        self.bot
            .get_chat(ChatId(channel_id))
            .await
            .map_err(classify)?;

        let nsfw = self
            .repo
            .is_chat_nsfw(channel_id)
            .await
            .map_err(|e| PlatformError::Other(format!("{:#}", e)))?;

        Ok(Channel {
            id: channel_id,
            nsfw,
        })
    }

    async fn fetch_user(&self, user_id: i64) -> Result<User, PlatformError> {
        let chat = self
            .bot
            .get_chat(ChatId(user_id))
            .await
            .map_err(classify)?;

        Ok(User {
            id: user_id,
            username: chat.username().map(str::to_string),
        })
    }

    async fn send(&self, target: DeliveryTarget, text: &str) -> Result<(), PlatformError> {
        let chat_id = match target {
            DeliveryTarget::Channel(id) => ChatId(id),
            DeliveryTarget::DirectMessage(user_id) => ChatId(user_id),
        };

        debug!("Sending message to {}", target);
        self.bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::MarkdownV2)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

#[async_trait]
impl OperatorAlert for TelegramPlatform {
    async fn notify(&self, operator_id: i64, message: &str) -> Result<(), PlatformError> {
        self.bot
            .send_message(ChatId(operator_id), message)
            .await
            .map_err(classify)?;
        info!("✅ Operator {} notified", operator_id);
        Ok(())
    }
}
