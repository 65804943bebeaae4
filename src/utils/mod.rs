pub mod filter;
pub mod markdown;
pub mod spoiler;
