//! FAExport 数据模型

use serde::{Deserialize, Serialize};

/// 画廊列表中的投稿 (`gallery.json?full=1`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GallerySubmission {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// 投稿详情 (`submission/{id}.json`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Submission {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// `General`, `Mature` 或 `Adult`
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Submission {
    pub fn lowercase_keywords(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for keyword in &self.keywords {
            let keyword = keyword.to_lowercase();
            if !tags.contains(&keyword) {
                tags.push(keyword);
            }
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gallery() {
        let json = r#"[{"id": "501", "title": "Sketch", "link": "https://www.furaffinity.net/view/501/"},
                       {"id": "500", "title": "Older"}]"#;
        let gallery: Vec<GallerySubmission> = serde_json::from_str(json).unwrap();
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery[0].id, "501");
        assert_eq!(gallery[1].title, "Older");
        assert!(gallery[1].name.is_none());
    }

    #[test]
    fn test_submission_keywords_are_normalized() {
        let json = r#"{"title": "Sketch", "rating": "Adult", "keywords": ["Fox", "fox", "Gore"]}"#;
        let submission: Submission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.lowercase_keywords(), vec!["fox", "gore"]);
    }
}
