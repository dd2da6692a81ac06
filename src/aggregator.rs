//! Aggregation Engine
//!
//! Builds every derived index in a single pass over the decoded records:
//!
//! - the global set of user ids with at least one qualifying event
//! - per-user activity (username, last seen, application set, event log)
//! - per-application usage counts and unique-user sets, keyed by resolved label
//! - the min/max calendar-day range of observed timestamps
//!
//! The pass is a plain fold: [`AggregateState::step`] consumes one record,
//! [`AggregateState::finish`] seals the state into an immutable
//! [`UsageSummary`]. [`Aggregator::build`] drives the fold in fixed-size
//! batches, reporting progress through a side-channel callback and yielding
//! to the runtime between batches. Batches are processed strictly in input
//! order; `last_seen` resolution and event-log ordering depend on sequential
//! accumulation, so the fold is never parallelized.
//!
//! ## Per-record rules
//!
//! Records with `sso_token_success != true` are discarded. A qualifying
//! record with an initiator id joins the global user set; it only reaches the
//! per-user and per-application indexes when it also carries a timestamp and
//! an application name, where an empty string counts as absent. Timestamps
//! feed the dataset date range whenever they parse, with or without user and
//! application info.

use crate::config::get_config;
use crate::models::{AppUsage, AuthEvent, DateRange, UsageSummary, UserActivity, UserEvent};
use crate::parser::progress_percent;
use crate::timestamp_parser::TimestampParser;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Accumulator for one aggregation pass. Build it up with [`step`], then
/// seal it with [`finish`]; the summary is read-only from that point on.
///
/// [`step`]: AggregateState::step
/// [`finish`]: AggregateState::finish
#[derive(Debug, Default)]
pub struct AggregateState {
    record_count: usize,
    user_ids: HashSet<String>,
    users: BTreeMap<String, UserActivity>,
    applications: BTreeMap<String, AppUsage>,
    earliest: Option<DateTime<Utc>>,
    latest: Option<DateTime<Utc>>,
}

impl AggregateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the state, in input order.
    pub fn step(&mut self, event: &AuthEvent) {
        self.record_count += 1;

        if !event.sso_token_success {
            return;
        }

        // Empty strings count as absent, like user ids and application names.
        let timestamp = event.timestamp.as_deref().filter(|ts| !ts.is_empty());
        let at = timestamp.and_then(|ts| TimestampParser::parse(ts).ok());

        if let Some(user_id) = event.user_id() {
            self.user_ids.insert(user_id.to_string());

            if let (Some(ts), Some(app)) = (timestamp, event.app()) {
                let first_seen = self.users.len();
                let activity = self
                    .users
                    .entry(user_id.to_string())
                    .or_insert_with(|| {
                        UserActivity::new(user_id, event.username(), ts, at, first_seen)
                    });
                activity.touch(ts, at);

                let label = app.resolved_label();
                activity.events.push(UserEvent {
                    timestamp: ts.to_string(),
                    at,
                    app_name: app.name.clone(),
                    app_label: label.to_string(),
                });
                activity.apps.insert(app.name.clone());

                let usage = self.applications.entry(label.to_string()).or_default();
                usage.usage_count += 1;
                usage.unique_users.insert(user_id.to_string());
            }
        }

        if let Some(at) = at {
            self.earliest = Some(self.earliest.map_or(at, |t| t.min(at)));
            self.latest = Some(self.latest.map_or(at, |t| t.max(at)));
        }
    }

    /// Seal the accumulated state into an immutable summary.
    pub fn finish(self) -> UsageSummary {
        let date_range = match (self.earliest, self.latest) {
            (Some(earliest), Some(latest)) => Some(DateRange {
                min: earliest.date_naive(),
                max: latest.date_naive(),
            }),
            _ => None,
        };

        UsageSummary {
            record_count: self.record_count,
            total_users: self.user_ids.len(),
            date_range,
            users: self.users,
            applications: self.applications,
        }
    }
}

pub struct Aggregator {
    batch_size: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            batch_size: get_config().processing.batch_size,
        }
    }

    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Run the fold over all records. Progress runs 0..100 across the whole
    /// pass and always ends at 100; control is yielded after every batch.
    pub async fn build<F>(&self, records: &[AuthEvent], mut on_progress: F) -> UsageSummary
    where
        F: FnMut(u8),
    {
        let mut state = AggregateState::new();
        let total = records.len();
        let mut processed = 0;

        for batch in records.chunks(self.batch_size) {
            for event in batch {
                state.step(event);
            }
            processed += batch.len();
            on_progress(progress_percent(processed, total));
            tokio::task::yield_now().await;
        }

        on_progress(100);
        let summary = state.finish();
        debug!(
            records = summary.record_count,
            users = summary.total_users,
            applications = summary.app_count(),
            "aggregation pass complete"
        );
        summary
    }
}
