//! FAExport API 客户端实现

use crate::error::{Error, Result};
use crate::models::{GallerySubmission, Submission};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{StatusCode, Url};

const DEFAULT_API_HOST: &str = "https://faexport.spangle.org.uk";
const FA_HOST: &str = "https://www.furaffinity.net";
const XFA_HOST: &str = "https://www.xfuraffinity.net";
const USER_AGENT_VALUE: &str = "feedbot/0.2 (subscription poller)";

/// FurAffinity 登录 cookie
#[derive(Debug, Clone)]
pub struct FaCookies {
    pub a: String,
    pub b: String,
}

/// 客户端配置
#[derive(Debug, Clone)]
pub struct FaClientConfig {
    /// FAExport 实例地址
    pub api_host: String,
    pub cookies: Option<FaCookies>,
}

impl Default for FaClientConfig {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            cookies: None,
        }
    }
}

pub struct FaClient {
    client: reqwest::Client,
    config: FaClientConfig,
}

impl FaClient {
    /// 复用外部的 reqwest 客户端
    pub fn with_client(client: reqwest::Client, config: FaClientConfig) -> Self {
        Self { client, config }
    }

    /// 投稿页面地址
    pub fn view_url(submission_id: &str) -> String {
        format!("{}/view/{}/", FA_HOST, submission_id)
    }

    /// 带嵌入预览的镜像地址，用于允许成人内容的频道
    pub fn embed_url(submission_id: &str) -> String {
        format!("{}/view/{}/", XFA_HOST, submission_id)
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        if let Some(ref cookies) = self.config.cookies {
            let value = format!("b={}; a={}", cookies.b, cookies.a);
            headers.insert(
                "FA_COOKIE",
                HeaderValue::from_str(&value)
                    .map_err(|e| Error::Auth(format!("Invalid cookie value: {}", e)))?,
            );
        }

        Ok(headers)
    }

    /// API 地址，每个路径段单独转义
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let invalid = |message: String| Error::Api { message, status: 0 };

        let mut url = Url::parse(&self.config.api_host)
            .map_err(|e| invalid(format!("Invalid api_host: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("Invalid api_host: {}", self.config.api_host)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();

        let response = self
            .client
            .get(url)
            .headers(self.build_headers()?)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Auth(text)),
            StatusCode::NOT_FOUND => Err(Error::NotFound(path)),
            s if !s.is_success() => Err(Error::Api {
                message: text,
                status: s.as_u16(),
            }),
            _ => Ok(serde_json::from_str(&text)?),
        }
    }

    /// 获取用户画廊第一页 (新的在前)
    pub async fn gallery(&self, username: &str) -> Result<Vec<GallerySubmission>> {
        self.get(&["user", username, "gallery.json"], &[("full", "1".to_string())])
            .await
    }

    /// 获取投稿详情 (包含标签)
    pub async fn submission(&self, submission_id: &str) -> Result<Submission> {
        let file = format!("{}.json", submission_id);
        self.get(&["submission", &file], &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        assert_eq!(
            FaClient::view_url("123"),
            "https://www.furaffinity.net/view/123/"
        );
        assert_eq!(
            FaClient::embed_url("123"),
            "https://www.xfuraffinity.net/view/123/"
        );
    }

    fn client(api_host: &str) -> FaClient {
        FaClient::with_client(
            reqwest::Client::new(),
            FaClientConfig {
                api_host: api_host.to_string(),
                cookies: None,
            },
        )
    }

    #[test]
    fn test_endpoint_joins_api_host() {
        let url = client("https://faexport.example/")
            .endpoint(&["submission", "42.json"])
            .unwrap();
        assert_eq!(url.as_str(), "https://faexport.example/submission/42.json");

        let url = client("https://fa.example/api")
            .endpoint(&["user", "artist", "gallery.json"])
            .unwrap();
        assert_eq!(url.as_str(), "https://fa.example/api/user/artist/gallery.json");
    }

    #[test]
    fn test_username_cannot_escape_gallery_path() {
        let url = client(DEFAULT_API_HOST)
            .endpoint(&["user", "a/b?c#d", "gallery.json"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://faexport.spangle.org.uk/user/a%2Fb%3Fc%23d/gallery.json"
        );
        assert!(url.query().is_none());
    }

    #[test]
    fn test_invalid_api_host_is_an_error() {
        assert!(client("not a url").endpoint(&["user"]).is_err());
    }
}
