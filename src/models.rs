//! Core Data Models
//!
//! Data structures for the full analysis pipeline, from raw authentication
//! events to aggregated usage summaries and filtered report rows.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: [`AuthEvent`] - Individual records decoded from the log file
//! 2. **Aggregation**: [`UserActivity`], [`AppUsage`] - Accumulators built in one pass
//! 3. **Summary**: [`UsageSummary`] - The immutable result of a build
//! 4. **Views**: [`FilteredUser`], [`AppBreakdown`] - Transient, query-scoped rows
//!
//! ## Parsing Behavior
//!
//! Every field of [`AuthEvent`] is optional or defaulted so that any JSON
//! object decodes to a record. Records missing `sso_token_success`,
//! `timestamp`, `initiated_by`, or `application` are not errors; they simply
//! contribute to fewer aggregates. An empty-string user id, application
//! name, or timestamp is treated the same as an absent one.
//!
//! Output types serialize with camelCase field names to stay compatible with
//! the export format the logs come from.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A single SSO authentication attempt as it appears in the log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthEvent {
    pub sso_token_success: bool,
    pub timestamp: Option<String>,
    pub initiated_by: Option<Initiator>,
    pub application: Option<ApplicationRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Initiator {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationRef {
    pub name: String,
    pub display_label: Option<String>,
}

impl ApplicationRef {
    /// Display label when set and non-empty, otherwise the raw name.
    pub fn resolved_label(&self) -> &str {
        match self.display_label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => &self.name,
        }
    }
}

impl AuthEvent {
    /// Decode a JSON value into a record. Values that do not fit the record
    /// shape (arrays, numbers, objects with mistyped fields) become default
    /// records, which never qualify for aggregation but keep record counts
    /// intact.
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Initiator id, if present and non-empty.
    pub fn user_id(&self) -> Option<&str> {
        self.initiated_by
            .as_ref()
            .map(|i| i.id.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn username(&self) -> &str {
        self.initiated_by
            .as_ref()
            .map(|i| i.username.as_str())
            .unwrap_or("")
    }

    /// Application reference, if present with a non-empty name.
    pub fn app(&self) -> Option<&ApplicationRef> {
        self.application.as_ref().filter(|a| !a.name.is_empty())
    }
}

/// One qualifying authentication, as remembered on the user that made it.
/// Ordered by input position, not by time.
#[derive(Debug, Clone, Serialize)]
pub struct UserEvent {
    pub timestamp: String,
    /// Parsed form of `timestamp`; `None` when unparsable.
    #[serde(skip)]
    pub at: Option<DateTime<Utc>>,
    #[serde(rename = "appName")]
    pub app_name: String,
    #[serde(rename = "appDisplayLabel")]
    pub app_label: String,
}

/// Per-user accumulator keyed by initiator id.
///
/// `apps` is always exactly the set of distinct `app_name` values across
/// `events`. `username` is fixed at first sight and never overwritten.
#[derive(Debug, Clone)]
pub struct UserActivity {
    pub user_id: String,
    pub username: String,
    /// Zero-based position in which this user was first seen during the
    /// build. Drives view ordering; map key order does not.
    pub first_seen: usize,
    /// Raw timestamp of the chronologically latest qualifying event.
    pub last_seen: String,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub apps: HashSet<String>,
    pub events: Vec<UserEvent>,
}

impl UserActivity {
    pub fn new(
        user_id: &str,
        username: &str,
        timestamp: &str,
        at: Option<DateTime<Utc>>,
        first_seen: usize,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            username: username.to_string(),
            first_seen,
            last_seen: timestamp.to_string(),
            last_seen_at: at,
            apps: HashSet::new(),
            events: Vec::new(),
        }
    }

    /// Advance `last_seen` to the maximum parsed timestamp observed.
    /// Unparsable timestamps never participate in the comparison.
    pub fn touch(&mut self, timestamp: &str, at: Option<DateTime<Utc>>) {
        if let Some(at) = at {
            if self.last_seen_at.map_or(true, |prev| at > prev) {
                self.last_seen = timestamp.to_string();
                self.last_seen_at = Some(at);
            }
        }
    }

    pub fn app_count(&self) -> usize {
        self.apps.len()
    }
}

/// Per-application accumulator keyed by resolved label.
#[derive(Debug, Clone, Default)]
pub struct AppUsage {
    /// Incremented once per qualifying event for this application.
    pub usage_count: u64,
    /// Ids of users with at least one event for this application.
    /// Always `unique_users.len() <= usage_count`.
    pub unique_users: HashSet<String>,
}

impl AppUsage {
    pub fn user_count(&self) -> usize {
        self.unique_users.len()
    }
}

/// Calendar-day bounds (UTC) of the timestamps seen during a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

/// The immutable result of one aggregation pass. Queries derive transient
/// views from it and never mutate it.
#[derive(Debug, Clone, Default)]
pub struct UsageSummary {
    /// Every record the parser yielded, qualifying or not.
    pub record_count: usize,
    /// Distinct initiator ids across qualifying records. A user counted here
    /// need not appear in `users`, which additionally requires a timestamp
    /// and an application name.
    pub total_users: usize,
    /// Absent when no qualifying record carried a parsable timestamp.
    pub date_range: Option<DateRange>,
    /// Keyed by user id for lookup; view ordering comes from
    /// [`users_by_first_sight`](Self::users_by_first_sight).
    pub users: BTreeMap<String, UserActivity>,
    pub applications: BTreeMap<String, AppUsage>,
}

impl UsageSummary {
    /// Users in the order they were first seen during the build.
    pub fn users_by_first_sight(&self) -> Vec<&UserActivity> {
        let mut users: Vec<&UserActivity> = self.users.values().collect();
        users.sort_by_key(|user| user.first_seen);
        users
    }

    /// Usage count per resolved application label.
    pub fn application_counts(&self) -> BTreeMap<&str, u64> {
        self.applications
            .iter()
            .map(|(label, usage)| (label.as_str(), usage.usage_count))
            .collect()
    }

    /// Sorted resolved labels, suitable for a selection list.
    pub fn application_labels(&self) -> Vec<&str> {
        self.applications.keys().map(String::as_str).collect()
    }

    pub fn app_count(&self) -> usize {
        self.applications.len()
    }
}

/// A user retained by a query, with the application set narrowed to the
/// active date range.
#[derive(Debug, Clone, Serialize)]
pub struct FilteredUser {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    #[serde(rename = "lastSeen")]
    pub last_seen: String,
    #[serde(rename = "appCount")]
    pub app_count: usize,
    /// All applications the user ever touched, sorted by name.
    pub apps: Vec<String>,
    /// Distinct applications among in-range events, in first-use order.
    #[serde(rename = "appsInRange")]
    pub apps_in_range: Vec<String>,
    #[serde(rename = "appCountInRange")]
    pub app_count_in_range: usize,
}

/// Per-application usage re-derived from user event logs under the active
/// query criteria.
#[derive(Debug, Clone, Serialize)]
pub struct AppBreakdown {
    pub name: String,
    #[serde(rename = "userCount")]
    pub user_count: usize,
    #[serde(rename = "sessionCount")]
    pub session_count: u64,
}
