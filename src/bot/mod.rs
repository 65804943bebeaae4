pub mod notifier;
pub mod platform;
pub mod telegram;

#[cfg(test)]
pub(crate) mod testing;

pub use notifier::Notifier;
pub use telegram::{build_bot, TelegramPlatform};
