//! Danbooru 兼容的 `/posts.json` API 客户端
//!
//! 同时适用于自建 booru 实例和 e621 (两者的搜索接口基本一致，
//! 只是 e621 会把结果包在 `{"posts": [...]}` 里，并把标签按分类拆开)。

mod client;
mod error;
mod models;

pub use client::{BooruClient, BooruClientConfig, BooruCredentials};
pub use error::{Error, Result};
pub use models::{BooruPost, Rating};
