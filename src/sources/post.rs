//! Platform-neutral post model shared by every content source.

use std::collections::{HashMap, HashSet};

/// One post as fetched this cycle. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub title: String,
    /// `safe`, `questionable`, `explicit`, a source-specific rating or `unknown`
    pub rating: String,
    /// Lowercase tags, including a `rating:` tag
    pub tags: HashSet<String>,
    pub url: String,
    pub author: Option<String>,
    pub description: Option<String>,
    /// Alternate link preferred in NSFW channels (e.g. an embed-friendly mirror)
    pub nsfw_url: Option<String>,
}

impl Post {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            rating: "unknown".to_string(),
            tags: HashSet::new(),
            url: url.into(),
            author: None,
            description: None,
            nsfw_url: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags.into_iter().map(|t| t.as_ref().to_lowercase()).collect();
        self
    }

    /// Link to show in a destination
    pub fn display_url(&self, nsfw_destination: bool) -> &str {
        match (&self.nsfw_url, nsfw_destination) {
            (Some(alt), true) => alt,
            _ => &self.url,
        }
    }
}

/// A page of posts, newest first, with O(1) id lookup.
#[derive(Debug, Clone, Default)]
pub struct Posts {
    posts: Vec<Post>,
    index: HashMap<String, usize>,
}

impl Posts {
    /// Build a page. Duplicate ids keep their newest (first) occurrence.
    pub fn new(posts: Vec<Post>) -> Self {
        let mut unique = Vec::with_capacity(posts.len());
        let mut index = HashMap::with_capacity(posts.len());
        for post in posts {
            if index.contains_key(&post.id) {
                continue;
            }
            index.insert(post.id.clone(), unique.len());
            unique.push(post);
        }
        Self {
            posts: unique,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn newest(&self) -> Option<&Post> {
        self.posts.first()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.posts.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn as_slice(&self) -> &[Post] {
        &self.posts
    }
}
