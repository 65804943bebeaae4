//! Content sources: where posts come from.

mod booru;
mod furaffinity;
pub mod post;

pub use booru::BooruSource;
pub use furaffinity::FurAffinitySource;
pub use post::{Post, Posts};

use async_trait::async_trait;

/// One upstream platform polled by a [`PollScheduler`](crate::scheduler::PollScheduler).
#[async_trait]
pub trait ContentSource: Send + Sync + 'static {
    /// Value of `subscriptions.service_type` served by this source
    fn service_type(&self) -> &str;

    /// Latest posts for a query, newest first, one bounded page.
    ///
    /// Returns an error on transport or authentication failure and an empty
    /// page when the query legitimately has no results.
    async fn fetch_latest_posts(&self, search_criteria: &str) -> anyhow::Result<Posts>;

    /// Operator message sent once repeated fetches keep failing
    fn failure_notice(&self, search_criteria: &str, error: &anyhow::Error, failures: u32) -> String {
        format!(
            "⚠️ {} poller failed {} times in a row (last query: '{}').\nLast error: {:#}",
            self.service_type(),
            failures,
            search_criteria,
            error
        )
    }
}
