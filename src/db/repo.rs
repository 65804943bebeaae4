use anyhow::{Context, Result};
use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};

use super::entities::{chats, guilds, subscriptions};
use crate::bot::platform::TenantState;

/// Scheduler-side change to one subscription row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionUpdate {
    pub id: i32,
    /// New cursor; `None` leaves the stored cursor untouched
    pub last_reported_id: Option<String>,
    pub last_ran: i64,
}

impl SubscriptionUpdate {
    /// Only mark the subscription as serviced
    pub fn checked(id: i32, now: i64) -> Self {
        Self {
            id,
            last_reported_id: None,
            last_ran: now,
        }
    }

    /// Move the cursor and mark as serviced
    pub fn advanced(id: i32, cursor: impl Into<String>, now: i64) -> Self {
        Self {
            id,
            last_reported_id: Some(cursor.into()),
            last_ran: now,
        }
    }
}

pub struct Repo {
    db: DatabaseConnection,
}

impl Repo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn ping(&self) -> Result<()> {
        self.db.ping().await.context("Database ping failed")
    }

    // ==================== Subscriptions ====================

    /// All subscriptions of one content source, oldest first
    pub async fn list_subscriptions_by_service(
        &self,
        service_type: &str,
    ) -> Result<Vec<subscriptions::Model>> {
        subscriptions::Entity::find()
            .filter(subscriptions::Column::ServiceType.eq(service_type))
            .order_by_asc(subscriptions::Column::Id)
            .all(&self.db)
            .await
            .context("Failed to list subscriptions by service")
    }

    pub async fn count_subscriptions_by_service(&self, service_type: &str) -> Result<u64> {
        subscriptions::Entity::find()
            .filter(subscriptions::Column::ServiceType.eq(service_type))
            .count(&self.db)
            .await
            .context("Failed to count subscriptions by service")
    }

    /// Apply every update of one group in a single transaction.
    /// Rows deleted in the meantime are silently skipped.
    pub async fn apply_subscription_updates(&self, updates: &[SubscriptionUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let txn = self
            .db
            .begin()
            .await
            .context("Failed to begin transaction")?;

        for update in updates {
            let mut query = subscriptions::Entity::update_many()
                .col_expr(subscriptions::Column::LastRan, Expr::value(update.last_ran));
            if let Some(ref cursor) = update.last_reported_id {
                query = query.col_expr(
                    subscriptions::Column::LastReportedId,
                    Expr::value(cursor.clone()),
                );
            }
            query
                .filter(subscriptions::Column::Id.eq(update.id))
                .exec(&txn)
                .await
                .with_context(|| format!("Failed to update subscription {}", update.id))?;
        }

        txn.commit().await.context("Failed to commit transaction")?;
        Ok(())
    }

    // ==================== Guilds & chats ====================

    pub async fn get_guild(&self, guild_id: i64) -> Result<Option<guilds::Model>> {
        guilds::Entity::find_by_id(guild_id)
            .one(&self.db)
            .await
            .context("Failed to get guild")
    }

    pub async fn get_chat(&self, chat_id: i64) -> Result<Option<chats::Model>> {
        chats::Entity::find_by_id(chat_id)
            .one(&self.db)
            .await
            .context("Failed to get chat")
    }

    /// Unknown chats are treated as not NSFW
    pub async fn is_chat_nsfw(&self, chat_id: i64) -> Result<bool> {
        Ok(self.get_chat(chat_id).await?.is_some_and(|c| c.nsfw))
    }
}

/// Unknown guilds are neither frozen nor allowed NSFW content.
#[async_trait]
impl TenantState for Repo {
    async fn is_frozen(&self, guild_id: i64) -> Result<bool> {
        Ok(self.get_guild(guild_id).await?.is_some_and(|g| g.frozen))
    }

    async fn is_nsfw_allowed(&self, guild_id: i64) -> Result<bool> {
        Ok(self.get_guild(guild_id).await?.is_some_and(|g| g.allow_nsfw))
    }
}
