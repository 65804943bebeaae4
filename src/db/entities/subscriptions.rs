use crate::bot::platform::DeliveryTarget;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Content source name, e.g. `e621`, `BixiBooru`, `FurAffinity`
    pub service_type: String,
    /// Owner; also the direct-message recipient when `is_pm` is set
    pub user_id: i64,
    /// `None` only for direct-message subscriptions
    pub guild_id: Option<i64>,
    pub channel_id: i64,
    /// Normalized (lowercase) query, shared by every subscription in a group
    pub search_criteria: String,
    /// Raw filter string, see [`crate::utils::filter::TagFilter`]
    pub filters: Option<String>,
    pub is_pm: bool,
    /// Cursor: id of the last post delivered or attempted
    pub last_reported_id: Option<String>,
    /// Epoch seconds of the last cycle that serviced this subscription
    pub last_ran: Option<i64>,
    pub subscribed_at: DateTime,
}

impl Model {
    pub fn delivery_target(&self) -> DeliveryTarget {
        if self.is_pm {
            DeliveryTarget::DirectMessage(self.user_id)
        } else {
            DeliveryTarget::Channel(self.channel_id)
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
