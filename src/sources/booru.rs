use super::{ContentSource, Post, Posts};
use anyhow::{Context, Result};
use async_trait::async_trait;
use booru_client::{BooruClient, BooruPost};
use tracing::debug;

/// Danbooru-compatible search (`/posts.json`), used for the booru instance and e621.
pub struct BooruSource {
    service_type: String,
    client: BooruClient,
    page_size: u32,
}

impl BooruSource {
    pub fn new(service_type: impl Into<String>, client: BooruClient, page_size: u32) -> Self {
        Self {
            service_type: service_type.into(),
            client,
            page_size,
        }
    }

    fn to_post(&self, raw: &BooruPost) -> Post {
        let id = raw.id.to_string();
        let rating = raw.rating().as_str();
        let mut post = Post::new(id.clone(), self.client.post_url(raw.id)).with_tags(raw.all_tags());
        post.tags.insert(format!("rating:{}", rating));
        post.rating = rating.to_string();
        post.title = raw
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("{} Post #{}", self.service_type, id));
        post.author = raw.author();
        post.description = raw.description.clone().filter(|d| !d.trim().is_empty());
        post
    }
}

#[async_trait]
impl ContentSource for BooruSource {
    fn service_type(&self) -> &str {
        &self.service_type
    }

    async fn fetch_latest_posts(&self, search_criteria: &str) -> Result<Posts> {
        let raw = self
            .client
            .search_posts(search_criteria, self.page_size)
            .await
            .with_context(|| format!("{} search failed for '{}'", self.service_type, search_criteria))?;

        let posts: Vec<Post> = raw
            .iter()
            .take(self.page_size as usize)
            .map(|p| self.to_post(p))
            .collect();
        let posts = Posts::new(posts);

        debug!(
            "Latest {} post IDs for '{}': {:?}",
            self.service_type,
            search_criteria,
            posts.ids()
        );
        Ok(posts)
    }

    fn failure_notice(&self, search_criteria: &str, error: &anyhow::Error, failures: u32) -> String {
        let hint = match error.downcast_ref::<booru_client::Error>() {
            Some(booru_client::Error::Auth(_)) => "\nThe API key was rejected; check the configured credentials.",
            Some(booru_client::Error::RateLimit(_)) => "\nThe site is rate limiting us.",
            _ => "",
        };
        format!(
            "⚠️ {} poller failed {} times in a row (last query: '{}').\nLast error: {:#}{}",
            self.service_type, failures, search_criteria, error, hint
        )
    }
}
