//! Filtered Views
//!
//! Pure re-filter operations over a built [`UsageSummary`]. Both entry points
//! derive transient rows from the summary's per-user event logs and never
//! mutate it, so any number of queries can run against the same summary.
//!
//! The date predicate is calendar-day inclusive: an event is in range when
//! its timestamp falls between the start of `start_date` and the end of
//! `end_date` (23:59:59.999). When either bound is missing no date filtering
//! happens at all.
//!
//! [`filter_applications`] re-derives usage from the event logs instead of
//! reading the build-time application aggregates; those are unfiltered, and
//! the rows here must reflect the active date and application restrictions.

use crate::models::{AppBreakdown, FilteredUser, UsageSummary};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};

/// Which application a query is narrowed to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AppSelector {
    #[default]
    All,
    Named(String),
}

impl AppSelector {
    pub fn from_flag(flag: Option<String>) -> Self {
        match flag {
            Some(label) if !label.is_empty() && label != "all" => Self::Named(label),
            _ => Self::All,
        }
    }
}

/// Criteria for one query. All fields are optional; the default criteria
/// retain everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub application: AppSelector,
    pub username_contains: Option<String>,
}

impl FilterCriteria {
    /// Inclusive calendar-day range check. Filtering only applies when both
    /// bounds are set; an event without a parsed timestamp is never in a
    /// bounded range.
    fn in_range(&self, at: Option<DateTime<Utc>>) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => at.map_or(false, |t| {
                let day = t.date_naive();
                start <= day && day <= end
            }),
            _ => true,
        }
    }
}

/// Users with at least one in-range event, additionally narrowed by
/// application and by a case-insensitive username substring. Each retained
/// user gets its application set re-derived from the in-range events alone.
pub fn filter_users(summary: &UsageSummary, criteria: &FilterCriteria) -> Vec<FilteredUser> {
    let needle = criteria
        .username_contains
        .as_deref()
        .map(|n| n.to_lowercase());

    summary
        .users_by_first_sight()
        .into_iter()
        .filter_map(|user| {
            if !user.events.iter().any(|e| criteria.in_range(e.at)) {
                return None;
            }

            if let AppSelector::Named(label) = &criteria.application {
                let used = user.events.iter().any(|e| {
                    (e.app_name == *label || e.app_label == *label) && criteria.in_range(e.at)
                });
                if !used {
                    return None;
                }
            }

            if let Some(needle) = &needle {
                if !user.username.to_lowercase().contains(needle) {
                    return None;
                }
            }

            let mut seen = HashSet::new();
            let mut apps_in_range = Vec::new();
            for event in user.events.iter().filter(|e| criteria.in_range(e.at)) {
                if seen.insert(event.app_name.as_str()) {
                    apps_in_range.push(event.app_name.clone());
                }
            }

            let mut apps: Vec<String> = user.apps.iter().cloned().collect();
            apps.sort();

            Some(FilteredUser {
                user_id: user.user_id.clone(),
                username: user.username.clone(),
                last_seen: user.last_seen.clone(),
                app_count: user.app_count(),
                apps,
                app_count_in_range: apps_in_range.len(),
                apps_in_range,
            })
        })
        .collect()
}

struct AppAccumulator {
    order: usize,
    session_count: u64,
    unique_users: HashSet<String>,
}

/// Per-application usage under the active criteria, re-derived from user
/// event logs. Users are walked in first-sight order, so label first-encounter
/// order matches the input. Rows are keyed by resolved label and sorted by
/// unique users descending; ties keep first-encounter order. A named selector
/// matches on the raw application name.
pub fn filter_applications(summary: &UsageSummary, criteria: &FilterCriteria) -> Vec<AppBreakdown> {
    let mut stats: HashMap<String, AppAccumulator> = HashMap::new();

    for user in summary.users_by_first_sight() {
        for event in &user.events {
            if !criteria.in_range(event.at) {
                continue;
            }
            if let AppSelector::Named(label) = &criteria.application {
                if event.app_name != *label {
                    continue;
                }
            }

            let next_order = stats.len();
            let accumulator = stats
                .entry(event.app_label.clone())
                .or_insert_with(|| AppAccumulator {
                    order: next_order,
                    session_count: 0,
                    unique_users: HashSet::new(),
                });
            accumulator.unique_users.insert(user.user_id.clone());
            accumulator.session_count += 1;
        }
    }

    let mut rows: Vec<(usize, AppBreakdown)> = stats
        .into_iter()
        .map(|(name, accumulator)| {
            (
                accumulator.order,
                AppBreakdown {
                    name,
                    user_count: accumulator.unique_users.len(),
                    session_count: accumulator.session_count,
                },
            )
        })
        .collect();

    rows.sort_by(|(order_a, a), (order_b, b)| {
        b.user_count.cmp(&a.user_count).then(order_a.cmp(order_b))
    });

    rows.into_iter().map(|(_, row)| row).collect()
}
