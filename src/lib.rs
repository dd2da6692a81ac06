//! SSO Metrics Library
//!
//! Aggregation and reporting for single-sign-on authentication event logs.
//! The library ingests an exported log (a JSON array of event objects or
//! newline-delimited JSON), builds usage indexes in a single streaming pass,
//! and answers repeated filter queries against the built result without
//! re-scanning raw records.
//!
//! ## Pipeline
//!
//! 1. [`parser`] decodes the raw text into a lazy record stream, tolerating
//!    corrupt entries and reporting progress per batch
//! 2. [`aggregator`] folds the records into a [`models::UsageSummary`]:
//!    active users, per-application counts, per-user event logs, and the
//!    dataset date range
//! 3. [`query`] derives filtered per-user and per-application views from the
//!    summary, parameterized by date range, application, and username
//!    substring
//! 4. [`reports`] renders the views as colored terminal reports or JSON
//!
//! The aggregation pass is cooperative: records are processed in fixed-size
//! batches, with a progress callback and a runtime yield between batches,
//! strictly in input order. A built summary is immutable; any number of
//! queries can share it.
//!
//! ## Example
//!
//! ```rust
//! use sso_metrics::aggregator::Aggregator;
//! use sso_metrics::parser::LogParser;
//! use sso_metrics::query::{filter_users, FilterCriteria};
//!
//! # async fn example() {
//! let raw = r#"[{"sso_token_success": true,
//!                "timestamp": "2024-01-01T10:00:00Z",
//!                "initiated_by": {"id": "u1", "username": "alice"},
//!                "application": {"name": "crm"}}]"#;
//!
//! let records = LogParser::with_batch_size(10_000)
//!     .parse_with_progress(raw, |_percent| {})
//!     .await;
//! let summary = Aggregator::with_batch_size(10_000)
//!     .build(&records, |_percent| {})
//!     .await;
//!
//! let users = filter_users(&summary, &FilterCriteria::default());
//! assert_eq!(users.len(), 1);
//! # }
//! ```

pub mod aggregator;
pub mod config;
pub mod logging;
pub mod models;
pub mod parser;
pub mod query;
pub mod reports;
pub mod timestamp_parser;

pub use aggregator::Aggregator;
pub use models::*;
pub use parser::LogParser;
pub use query::{filter_applications, filter_users, AppSelector, FilterCriteria};
