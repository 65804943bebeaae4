use crate::db::entities::subscriptions;
use std::collections::BTreeMap;

/// Minutes between cycles for a source with `subscriber_count` subscriptions.
/// Never less than one minute.
pub fn calculate_poll_interval(subscriber_count: u64, default_minutes: u64) -> u64 {
    if subscriber_count == 0 {
        return default_minutes.max(1);
    }
    (60 / subscriber_count).max(1)
}

/// Subscriptions sharing one query, fetched once per cycle.
#[derive(Debug)]
pub struct SubscriptionGroup {
    pub search_criteria: String,
    pub members: Vec<subscriptions::Model>,
}

impl SubscriptionGroup {
    /// Oldest `last_ran` of the members; never-run counts as 0
    pub fn last_ran(&self) -> i64 {
        self.members
            .iter()
            .map(|s| s.last_ran.unwrap_or(0))
            .min()
            .unwrap_or(0)
    }
}

/// Pick the group that has waited the longest.
/// Ties go to the lexicographically smallest query.
pub fn select_oldest_group(subscriptions: Vec<subscriptions::Model>) -> Option<SubscriptionGroup> {
    let mut groups: BTreeMap<String, Vec<subscriptions::Model>> = BTreeMap::new();
    for sub in subscriptions {
        groups
            .entry(sub.search_criteria.clone())
            .or_default()
            .push(sub);
    }

    groups
        .into_iter()
        .map(|(search_criteria, members)| SubscriptionGroup {
            search_criteria,
            members,
        })
        // min_by_key keeps the first of equal keys, i.e. the smallest query
        .min_by_key(SubscriptionGroup::last_ran)
}
