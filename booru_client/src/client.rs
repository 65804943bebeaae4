//! Booru API 客户端实现

use crate::error::{Error, Result};
use crate::models::{BooruPost, PostsResponse};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;

const DEFAULT_USER_AGENT: &str = "feedbot/0.2 (subscription poller)";

/// 登录凭据 (`login` + `api_key` 查询参数)
#[derive(Debug, Clone)]
pub struct BooruCredentials {
    pub username: String,
    pub api_key: String,
}

/// Booru 客户端配置
#[derive(Debug, Clone)]
pub struct BooruClientConfig {
    /// 站点根地址，例如 `https://e621.net`
    pub base_url: String,
    /// 登录凭据 (可选)
    pub credentials: Option<BooruCredentials>,
    /// e621 要求带上能识别作者的 User-Agent
    pub user_agent: Option<String>,
}

impl Default for BooruClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://e621.net".to_string(),
            credentials: None,
            user_agent: None,
        }
    }
}

/// Booru API 客户端
pub struct BooruClient {
    client: reqwest::Client,
    config: BooruClientConfig,
}

impl BooruClient {
    /// 复用外部的 reqwest 客户端
    pub fn with_client(client: reqwest::Client, config: BooruClientConfig) -> Self {
        Self { client, config }
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// 作品页面地址
    pub fn post_url(&self, post_id: u64) -> String {
        format!("{}/posts/{}", self.base_url(), post_id)
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let agent = self
            .config
            .user_agent
            .as_deref()
            .unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(agent).map_err(|e| Error::Api {
                message: format!("Invalid user agent: {}", e),
                status: 0,
            })?,
        );
        Ok(headers)
    }

    /// 按标签搜索最新作品 (新的在前)
    ///
    /// 搜索没有结果时返回空列表，而不是错误。
    pub async fn search_posts(&self, tags: &str, limit: u32) -> Result<Vec<BooruPost>> {
        let url = format!("{}/posts.json", self.base_url());

        let mut params = vec![("tags", tags.to_string()), ("limit", limit.to_string())];
        if let Some(ref creds) = self.config.credentials {
            params.push(("login", creds.username.clone()));
            params.push(("api_key", creds.api_key.clone()));
        }

        tracing::debug!("Searching {} for '{}'", url, tags);

        let response = self
            .client
            .get(&url)
            .headers(self.build_headers()?)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(Error::Auth(text)),
            StatusCode::TOO_MANY_REQUESTS => return Err(Error::RateLimit(text)),
            s if !s.is_success() => {
                return Err(Error::Api {
                    message: text,
                    status: s.as_u16(),
                })
            }
            _ => {}
        }

        match serde_json::from_str::<PostsResponse>(&text)? {
            PostsResponse::List(posts) | PostsResponse::Wrapped { posts } => Ok(posts),
            PostsResponse::Failure { message, error } => Err(Error::Api {
                message: message
                    .or(error)
                    .unwrap_or_else(|| "unknown error".to_string()),
                status: status.as_u16(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_url_strips_trailing_slash() {
        let client = BooruClient::with_client(
            reqwest::Client::new(),
            BooruClientConfig {
                base_url: "https://booru.example.net/".to_string(),
                ..Default::default()
            },
        );
        assert_eq!(client.post_url(12), "https://booru.example.net/posts/12");
    }
}
