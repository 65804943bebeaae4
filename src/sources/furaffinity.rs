use super::{ContentSource, Post, Posts};
use anyhow::{Context, Result};
use async_trait::async_trait;
use fa_client::{FaClient, GallerySubmission, Submission};
use tracing::debug;

pub const SERVICE_TYPE: &str = "FurAffinity";

/// FurAffinity user galleries. Search criteria is the artist's username.
pub struct FurAffinitySource {
    client: FaClient,
    page_size: usize,
}

impl FurAffinitySource {
    pub fn new(client: FaClient, page_size: usize) -> Self {
        Self { client, page_size }
    }
}

fn to_post(entry: &GallerySubmission, submission: &Submission) -> Post {
    let mut post = Post::new(entry.id.clone(), FaClient::view_url(&entry.id))
        .with_tags(submission.lowercase_keywords());
    let rating = submission
        .rating
        .as_deref()
        .unwrap_or("unknown")
        .to_lowercase();
    post.tags.insert(format!("rating:{}", rating));
    post.rating = rating;
    post.title = if submission.title.is_empty() {
        entry.title.clone()
    } else {
        submission.title.clone()
    };
    post.author = submission.name.clone().or_else(|| entry.name.clone());
    post.description = submission
        .description
        .clone()
        .filter(|d| !d.trim().is_empty());
    post.nsfw_url = Some(FaClient::embed_url(&entry.id));
    post
}

#[async_trait]
impl ContentSource for FurAffinitySource {
    fn service_type(&self) -> &str {
        SERVICE_TYPE
    }

    async fn fetch_latest_posts(&self, search_criteria: &str) -> Result<Posts> {
        let gallery = self
            .client
            .gallery(search_criteria)
            .await
            .with_context(|| format!("Failed to fetch FA gallery '{}'", search_criteria))?;

        // Tags are only on the submission page; a missing one fails the whole
        // page so spoiler gating never sees an untagged post.
        let mut posts = Vec::with_capacity(self.page_size);
        for entry in gallery.iter().take(self.page_size) {
            let submission = self
                .client
                .submission(&entry.id)
                .await
                .with_context(|| format!("Failed to fetch FA submission {}", entry.id))?;
            posts.push(to_post(entry, &submission));
        }

        let posts = Posts::new(posts);
        debug!(
            "Latest FA submission IDs for '{}': {:?}",
            search_criteria,
            posts.ids()
        );
        Ok(posts)
    }

    fn failure_notice(&self, search_criteria: &str, error: &anyhow::Error, failures: u32) -> String {
        format!(
            "⚠️ FurAffinity poller failed {} times in a row (last gallery: '{}').\n\
             This usually means the FA cookies (a/b) expired; refresh them in the config.\n\
             Last error: {:#}",
            failures, search_criteria, error
        )
    }
}
