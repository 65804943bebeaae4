use super::cursor::{self, Action};
use super::failure::FailureTracker;
use super::group::{calculate_poll_interval, select_oldest_group, SubscriptionGroup};
use crate::bot::notifier::Notifier;
use crate::bot::platform::{OperatorAlert, TenantState};
use crate::config::SchedulerConfig;
use crate::db::entities::subscriptions;
use crate::db::repo::{Repo, SubscriptionUpdate};
use crate::sources::{ContentSource, Posts};
use anyhow::Result;
use chrono::Local;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

/// Polls one content source forever, one subscription group per cycle.
pub struct PollScheduler<S: ContentSource> {
    source: S,
    repo: Arc<Repo>,
    tenants: Arc<dyn TenantState>,
    notifier: Notifier,
    alert: Arc<dyn OperatorAlert>,
    operator_id: Option<i64>,
    default_interval_min: u64,
    failures: Mutex<FailureTracker>,
}

impl<S: ContentSource> PollScheduler<S> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: S,
        repo: Arc<Repo>,
        tenants: Arc<dyn TenantState>,
        notifier: Notifier,
        alert: Arc<dyn OperatorAlert>,
        operator_id: Option<i64>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            source,
            repo,
            tenants,
            notifier,
            alert,
            operator_id,
            default_interval_min: config.default_interval_min.max(1),
            failures: Mutex::new(FailureTracker::new(config.failure_threshold)),
        }
    }

    /// Main loop. Returns once `shutdown` flips to `true` (or its sender is
    /// dropped), aborting the cycle in flight.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let service = self.source.service_type().to_string();
        info!("🚀 {} scheduler started", service);

        let mut current: Option<JoinHandle<()>> = None;

        while !*shutdown.borrow() {
            Self::start_cycle(&self, &mut current);

            let minutes = self.poll_interval().await;
            debug!("{} next poll in {} min", service, minutes);

            tokio::select! {
                _ = sleep(Duration::from_secs(minutes.saturating_mul(60))) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        if let Some(handle) = current {
            handle.abort();
        }
        info!("🛑 {} scheduler stopped", service);
    }

    /// Spawn a cycle unless the previous one is still running.
    /// Returns whether a new cycle was started.
    fn start_cycle(this: &Arc<Self>, current: &mut Option<JoinHandle<()>>) -> bool {
        if current.as_ref().is_some_and(|h| !h.is_finished()) {
            warn!(
                "{} poll cycle still running, skipping this tick",
                this.source.service_type()
            );
            return false;
        }

        let this = Arc::clone(this);
        *current = Some(tokio::spawn(async move {
            if let Err(e) = this.poll_task_once().await {
                error!("{} poll cycle failed: {:#}", this.source.service_type(), e);
            }
        }));
        true
    }

    /// Minutes until the next cycle, derived from the current subscription count
    async fn poll_interval(&self) -> u64 {
        match self
            .repo
            .count_subscriptions_by_service(self.source.service_type())
            .await
        {
            Ok(count) => calculate_poll_interval(count, self.default_interval_min),
            Err(e) => {
                warn!(
                    "Failed to count {} subscriptions, using default interval: {:#}",
                    self.source.service_type(),
                    e
                );
                self.default_interval_min
            }
        }
    }

    /// Run one cycle: pick the longest-waiting group, fetch its query once and
    /// service every member. Only store errors are returned.
    pub async fn poll_task_once(&self) -> Result<()> {
        let service = self.source.service_type();
        let subscriptions = self.repo.list_subscriptions_by_service(service).await?;

        let Some(group) = select_oldest_group(subscriptions) else {
            debug!("No {} subscriptions to poll", service);
            return Ok(());
        };

        let now = Local::now().timestamp();
        info!(
            "🔍 Polling {} for '{}' ({} subscriptions)",
            service,
            group.search_criteria,
            group.members.len()
        );

        let posts = match self.source.fetch_latest_posts(&group.search_criteria).await {
            Ok(posts) => {
                self.lock_failures().record_success();
                posts
            }
            Err(e) => {
                error!(
                    "Failed to fetch {} posts for '{}': {:#}",
                    service, group.search_criteria, e
                );
                self.handle_fetch_failure(&group.search_criteria, &e).await;
                return self.mark_checked(&group, now).await;
            }
        };

        if posts.is_empty() {
            info!("No {} posts for '{}'", service, group.search_criteria);
            return self.mark_checked(&group, now).await;
        }
        debug!(
            "Fetched {} {} posts for '{}'",
            posts.len(),
            service,
            group.search_criteria
        );

        let mut updates = Vec::with_capacity(group.members.len());
        for subscription in &group.members {
            updates.push(self.service_subscription(subscription, &posts, now).await);
        }

        self.repo.apply_subscription_updates(&updates).await
    }

    async fn service_subscription(
        &self,
        subscription: &subscriptions::Model,
        posts: &Posts,
        now: i64,
    ) -> SubscriptionUpdate {
        let guild_id = subscription.guild_id;

        if let (false, Some(guild)) = (subscription.is_pm, guild_id) {
            match self.tenants.is_nsfw_allowed(guild).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(
                        guild_id = ?guild_id,
                        "Skipping subscription {}: guild {} does not allow NSFW content",
                        subscription.id, guild
                    );
                    return SubscriptionUpdate::checked(subscription.id, now);
                }
                Err(e) => {
                    error!(
                        guild_id = ?guild_id,
                        "Failed to read NSFW setting of guild {}: {:#}", guild, e
                    );
                    return SubscriptionUpdate::checked(subscription.id, now);
                }
            }
        }

        let resolution = cursor::resolve(subscription, posts);
        debug!(
            guild_id = ?guild_id,
            "Subscription {}: {:?} ({:?})",
            subscription.id, resolution.action, resolution.reason
        );

        match resolution.action {
            Action::Skip => {}
            Action::Catchup => warn!(
                guild_id = ?guild_id,
                "Cursor {:?} of subscription {} is no longer in the latest page, catching up",
                subscription.last_reported_id, subscription.id
            ),
            Action::Post => {
                for post in &resolution.posts {
                    self.notifier.process_single_post(subscription, post).await;
                }
            }
        }

        match resolution.next_cursor() {
            Some(cursor) => SubscriptionUpdate::advanced(subscription.id, cursor, now),
            None => SubscriptionUpdate::checked(subscription.id, now),
        }
    }

    async fn mark_checked(&self, group: &SubscriptionGroup, now: i64) -> Result<()> {
        let updates: Vec<_> = group
            .members
            .iter()
            .map(|s| SubscriptionUpdate::checked(s.id, now))
            .collect();
        self.repo.apply_subscription_updates(&updates).await
    }

    async fn handle_fetch_failure(&self, search_criteria: &str, error: &anyhow::Error) {
        let (should_alert, failures) = {
            let mut tracker = self.lock_failures();
            let should_alert = tracker.record_failure();
            (should_alert, tracker.consecutive_failures())
        };

        if !should_alert {
            return;
        }

        let Some(operator_id) = self.operator_id else {
            error!(
                "{} failed {} times in a row but no operator is configured (telegram.owner_id)",
                self.source.service_type(),
                failures
            );
            return;
        };

        let message = self.source.failure_notice(search_criteria, error, failures);
        match self.alert.notify(operator_id, &message).await {
            Ok(()) => info!("📣 Notified operator about {} failures", self.source.service_type()),
            Err(e) => error!("Failed to notify operator {}: {}", operator_id, e),
        }
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, FailureTracker> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
