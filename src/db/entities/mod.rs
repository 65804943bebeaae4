pub mod chats;
pub mod guilds;
pub mod subscriptions;
