//! In-memory fakes of the platform traits for unit tests.

use super::platform::{
    Channel, DeliveryTarget, MessagingPlatform, OperatorAlert, PlatformError, TenantState, User,
};
use crate::db::entities::subscriptions;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
pub struct FakePlatform {
    nsfw_channels: HashSet<i64>,
    forbidden_channels: HashSet<i64>,
    missing_channels: HashSet<i64>,
    failing_targets: HashSet<DeliveryTarget>,
    sent: Mutex<Vec<(DeliveryTarget, String)>>,
}

impl FakePlatform {
    pub fn with_nsfw_channel(mut self, id: i64) -> Self {
        self.nsfw_channels.insert(id);
        self
    }

    pub fn with_forbidden_channel(mut self, id: i64) -> Self {
        self.forbidden_channels.insert(id);
        self
    }

    pub fn with_missing_channel(mut self, id: i64) -> Self {
        self.missing_channels.insert(id);
        self
    }

    pub fn with_failing_target(mut self, target: DeliveryTarget) -> Self {
        self.failing_targets.insert(target);
        self
    }

    pub fn sent(&self) -> Vec<(DeliveryTarget, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingPlatform for FakePlatform {
    async fn fetch_channel(&self, channel_id: i64) -> Result<Channel, PlatformError> {
        if self.forbidden_channels.contains(&channel_id) {
            return Err(PlatformError::Forbidden(format!("no access to {}", channel_id)));
        }
        if self.missing_channels.contains(&channel_id) {
            return Err(PlatformError::NotFound(format!("chat {} deleted", channel_id)));
        }
        Ok(Channel {
            id: channel_id,
            nsfw: self.nsfw_channels.contains(&channel_id),
        })
    }

    async fn fetch_user(&self, user_id: i64) -> Result<User, PlatformError> {
        Ok(User {
            id: user_id,
            username: None,
        })
    }

    async fn send(&self, target: DeliveryTarget, text: &str) -> Result<(), PlatformError> {
        if self.failing_targets.contains(&target) {
            return Err(PlatformError::Forbidden("bot was kicked".to_string()));
        }
        self.sent.lock().unwrap().push((target, text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTenants {
    pub frozen: HashSet<i64>,
    pub nsfw_allowed: HashSet<i64>,
}

#[async_trait]
impl TenantState for FakeTenants {
    async fn is_frozen(&self, guild_id: i64) -> anyhow::Result<bool> {
        Ok(self.frozen.contains(&guild_id))
    }

    async fn is_nsfw_allowed(&self, guild_id: i64) -> anyhow::Result<bool> {
        Ok(self.nsfw_allowed.contains(&guild_id))
    }
}

#[derive(Default)]
pub struct FakeAlert {
    notes: Mutex<Vec<(i64, String)>>,
}

impl FakeAlert {
    pub fn notes(&self) -> Vec<(i64, String)> {
        self.notes.lock().unwrap().clone()
    }
}

#[async_trait]
impl OperatorAlert for FakeAlert {
    async fn notify(&self, operator_id: i64, message: &str) -> Result<(), PlatformError> {
        self.notes
            .lock()
            .unwrap()
            .push((operator_id, message.to_string()));
        Ok(())
    }
}

/// Channel subscription in guild `guild_id`, never serviced
pub fn channel_subscription(
    id: i32,
    guild_id: i64,
    channel_id: i64,
    criteria: &str,
) -> subscriptions::Model {
    subscriptions::Model {
        id,
        service_type: "e621".to_string(),
        user_id: 1000 + id as i64,
        guild_id: Some(guild_id),
        channel_id,
        search_criteria: criteria.to_string(),
        filters: None,
        is_pm: false,
        last_reported_id: None,
        last_ran: None,
        subscribed_at: chrono::Local::now().naive_local(),
    }
}

/// Direct-message subscription owned by `user_id`
pub fn pm_subscription(id: i32, user_id: i64, criteria: &str) -> subscriptions::Model {
    subscriptions::Model {
        user_id,
        guild_id: None,
        channel_id: user_id,
        is_pm: true,
        ..channel_subscription(id, 0, 0, criteria)
    }
}
