//! FurAffinity 客户端，基于 [FAExport](https://faexport.spangle.org.uk) 的 JSON API。
//!
//! FurAffinity 本身没有公开 API，FAExport 把画廊和投稿页面转换成 JSON。
//! 登录 cookie (`a` / `b`) 通过 `FA_COOKIE` 请求头传递，用于访问成人内容。

mod client;
mod error;
mod models;

pub use client::{FaClient, FaClientConfig, FaCookies};
pub use error::{Error, Result};
pub use models::{GallerySubmission, Submission};
