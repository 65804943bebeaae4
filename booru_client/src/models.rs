//! Booru API 数据模型
//!
//! 只包含项目需要的字段。Danbooru 返回 `tag_string`，e621 返回按分类拆开的 `tags`。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 作品分级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Safe,
    Questionable,
    Explicit,
    Unknown,
}

impl Rating {
    /// 解析 API 的单字母分级 (`s`/`g`, `q`, `e`)
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(|c| c.trim().to_lowercase()).as_deref() {
            Some("s") | Some("g") => Rating::Safe,
            Some("q") => Rating::Questionable,
            Some("e") => Rating::Explicit,
            _ => Rating::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Safe => "safe",
            Rating::Questionable => "questionable",
            Rating::Explicit => "explicit",
            Rating::Unknown => "unknown",
        }
    }
}

/// 单个作品
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BooruPost {
    pub id: u64,
    #[serde(default)]
    pub rating: Option<String>,
    /// Danbooru: 空格分隔的全部标签
    #[serde(default)]
    pub tag_string: Option<String>,
    /// e621: 分类 -> 标签列表
    #[serde(default)]
    pub tags: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub uploader_name: Option<String>,
    #[serde(default)]
    pub tag_string_artist: Option<String>,
}

impl BooruPost {
    /// 全部标签，小写去重，保持出现顺序
    pub fn all_tags(&self) -> Vec<String> {
        let from_string = self
            .tag_string
            .iter()
            .flat_map(|s| s.split_whitespace())
            .map(str::to_string);
        let from_groups = self.tags.values().flatten().cloned();

        let mut tags: Vec<String> = Vec::new();
        for tag in from_string.chain(from_groups) {
            let tag = tag.to_lowercase();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    pub fn rating(&self) -> Rating {
        Rating::from_code(self.rating.as_deref())
    }

    /// 作者名: Danbooru 用 `tag_string_artist`，e621 用 `artist` 分类
    pub fn author(&self) -> Option<String> {
        if let Some(artist) = self
            .tag_string_artist
            .as_deref()
            .and_then(|s| s.split_whitespace().next())
        {
            return Some(artist.to_string());
        }
        if let Some(artist) = self.tags.get("artist").and_then(|a| a.first()) {
            return Some(artist.clone());
        }
        self.uploader_name.clone()
    }
}

/// `/posts.json` 的三种返回形态
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PostsResponse {
    List(Vec<BooruPost>),
    Wrapped { posts: Vec<BooruPost> },
    Failure {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_from_code() {
        assert_eq!(Rating::from_code(Some("s")), Rating::Safe);
        assert_eq!(Rating::from_code(Some("g")), Rating::Safe);
        assert_eq!(Rating::from_code(Some("Q")), Rating::Questionable);
        assert_eq!(Rating::from_code(Some("e")), Rating::Explicit);
        assert_eq!(Rating::from_code(None), Rating::Unknown);
    }

    #[test]
    fn test_danbooru_post() {
        let json = r#"[{"id": 42, "rating": "e", "tag_string": "Fox cute fox", "tag_string_artist": "someone"}]"#;
        let response: PostsResponse = serde_json::from_str(json).unwrap();
        let PostsResponse::List(posts) = response else {
            panic!("expected a plain list");
        };
        assert_eq!(posts[0].id, 42);
        assert_eq!(posts[0].all_tags(), vec!["fox", "cute"]);
        assert_eq!(posts[0].rating(), Rating::Explicit);
        assert_eq!(posts[0].author().as_deref(), Some("someone"));
    }

    #[test]
    fn test_e621_wrapped_post() {
        let json = r#"{"posts": [{"id": 7, "rating": "s",
            "tags": {"general": ["Cute"], "artist": ["painter"], "species": ["fox"]},
            "file": {"url": "https://static1.e621.net/a.png", "ext": "png"}}]}"#;
        let response: PostsResponse = serde_json::from_str(json).unwrap();
        let PostsResponse::Wrapped { posts } = response else {
            panic!("expected a wrapped list");
        };
        let tags = posts[0].all_tags();
        assert!(tags.contains(&"cute".to_string()));
        assert!(tags.contains(&"fox".to_string()));
        assert_eq!(posts[0].author().as_deref(), Some("painter"));
    }

    #[test]
    fn test_failure_body() {
        let json = r#"{"success": false, "message": "SessionLoader::AuthenticationFailure"}"#;
        let response: PostsResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(response, PostsResponse::Failure { message: Some(_), .. }));
    }
}
