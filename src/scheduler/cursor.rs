use crate::db::entities::subscriptions;
use crate::sources::{Post, Posts};

/// What the scheduler should do for one subscription this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Deliver the batch in order
    Post,
    /// Cursor already at the newest post
    Skip,
    /// Cursor fell off the page; jump to the newest post
    Catchup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    NewSubscription,
    NoNewPosts,
    NewPostsAvailable,
    PostDeletedOrMissing,
}

#[derive(Debug)]
pub struct Resolution<'a> {
    /// Oldest first
    pub posts: Vec<&'a Post>,
    pub action: Action,
    pub reason: Reason,
}

impl Resolution<'_> {
    /// Cursor after this resolution has been acted upon
    pub fn next_cursor(&self) -> Option<&str> {
        match self.action {
            Action::Skip => None,
            Action::Post | Action::Catchup => self.posts.last().map(|p| p.id.as_str()),
        }
    }
}

/// Decide which posts of a newest-first page a subscription has not seen yet.
///
/// `posts` must not be empty; the scheduler handles empty pages before
/// resolving.
pub fn resolve<'a>(subscription: &subscriptions::Model, posts: &'a Posts) -> Resolution<'a> {
    let newest: Vec<&Post> = posts.newest().into_iter().collect();

    let Some(cursor) = subscription.last_reported_id.as_deref() else {
        return Resolution {
            posts: newest,
            action: Action::Post,
            reason: Reason::NewSubscription,
        };
    };

    match posts.position(cursor) {
        Some(0) => Resolution {
            posts: Vec::new(),
            action: Action::Skip,
            reason: Reason::NoNewPosts,
        },
        Some(k) => Resolution {
            posts: posts.as_slice()[..k].iter().rev().collect(),
            action: Action::Post,
            reason: Reason::NewPostsAvailable,
        },
        None => Resolution {
            posts: newest,
            action: Action::Catchup,
            reason: Reason::PostDeletedOrMissing,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::testing::channel_subscription;

    fn page(ids: &[&str]) -> Posts {
        Posts::new(
            ids.iter()
                .map(|id| Post::new(*id, format!("https://e621.net/posts/{}", id)))
                .collect(),
        )
    }

    fn with_cursor(cursor: Option<&str>) -> subscriptions::Model {
        let mut sub = channel_subscription(1, 10, -100, "fox");
        sub.last_reported_id = cursor.map(str::to_string);
        sub
    }

    fn ids<'a>(resolution: &Resolution<'a>) -> Vec<&'a str> {
        resolution.posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_new_subscription_gets_newest_only() {
        let posts = page(&["5", "4", "3"]);
        let r = resolve(&with_cursor(None), &posts);

        assert_eq!(r.action, Action::Post);
        assert_eq!(r.reason, Reason::NewSubscription);
        assert_eq!(ids(&r), vec!["5"]);
        assert_eq!(r.next_cursor(), Some("5"));
    }

    #[test]
    fn test_cursor_at_head_skips() {
        let posts = page(&["5", "4", "3"]);
        let r = resolve(&with_cursor(Some("5")), &posts);

        assert_eq!(r.action, Action::Skip);
        assert_eq!(r.reason, Reason::NoNewPosts);
        assert!(r.posts.is_empty());
        assert_eq!(r.next_cursor(), None);
    }

    #[test]
    fn test_cursor_behind_delivers_gap_oldest_first() {
        let posts = page(&["5", "4", "3", "2", "1"]);
        let r = resolve(&with_cursor(Some("2")), &posts);

        assert_eq!(r.action, Action::Post);
        assert_eq!(r.reason, Reason::NewPostsAvailable);
        assert_eq!(ids(&r), vec!["3", "4", "5"]);
        assert_eq!(r.next_cursor(), Some("5"));
    }

    #[test]
    fn test_missing_cursor_catches_up_with_one_post() {
        let posts = page(&["9", "8", "7", "6", "5"]);
        let r = resolve(&with_cursor(Some("2")), &posts);

        assert_eq!(r.action, Action::Catchup);
        assert_eq!(r.reason, Reason::PostDeletedOrMissing);
        assert_eq!(ids(&r), vec!["9"]);
        assert_eq!(r.next_cursor(), Some("9"));
    }

    #[test]
    fn test_resolving_again_after_advance_is_idempotent() {
        let posts = page(&["5", "4", "3"]);
        let first = resolve(&with_cursor(Some("3")), &posts);
        let cursor = first.next_cursor().map(str::to_string);

        let second = resolve(&with_cursor(cursor.as_deref()), &posts);
        assert_eq!(second.action, Action::Skip);
    }
}
