//! Log Ingestion
//!
//! Turns a raw text export into a stream of [`AuthEvent`] records. Exports
//! come in two encodings: a single JSON array of event objects, or
//! newline-delimited JSON with one object per line. The dispatch between the
//! two is an explicit [`RawPayload`] outcome, not error-driven control flow.
//!
//! ## Resilience
//!
//! Real exports contain truncated and corrupt entries; decoding is
//! best-effort:
//!
//! - Array mode yields exactly one record per element, in order, with no
//!   drops. Elements that do not fit the record shape decode to default
//!   (never-qualifying) records.
//! - Line mode silently drops lines that are not valid JSON. Blank lines are
//!   ignored. Decodable non-object lines are kept as default records.
//!
//! Input that is neither a JSON array nor contains any decodable line
//! produces an empty stream rather than an error; the caller decides what an
//! empty dataset means.
//!
//! ## Batching
//!
//! [`LogParser::parse_with_progress`] drains the stream in fixed-size
//! batches, invoking the progress callback after each batch and yielding to
//! the runtime between batches. Batch size is tunable through configuration
//! and must not affect results, only latency.

use crate::config::get_config;
use crate::models::AuthEvent;
use serde_json::Value;
use tracing::debug;

/// Reference batch size for progress reporting and cooperative yields.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

fn not_blank(line: &&str) -> bool {
    !line.trim().is_empty()
}

type LineIter<'a> = std::iter::Filter<std::str::Lines<'a>, fn(&&str) -> bool>;

/// Outcome of the array-vs-lines dispatch.
pub enum RawPayload<'a> {
    /// The whole input parsed as one JSON array.
    Array(Vec<Value>),
    /// Anything else: treat the input as newline-delimited records.
    Lines(&'a str),
}

pub struct LogParser {
    batch_size: usize,
}

impl Default for LogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogParser {
    pub fn new() -> Self {
        Self {
            batch_size: get_config().processing.batch_size,
        }
    }

    /// Parser with an explicit batch size, independent of configuration.
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    /// Decide how the raw text is encoded. Only a successful parse of the
    /// whole input as a JSON array selects array mode; every other outcome
    /// (parse failure, or a non-array top-level value) falls through to
    /// line-delimited mode.
    pub fn classify(raw_text: &str) -> RawPayload<'_> {
        match serde_json::from_str::<Value>(raw_text) {
            Ok(Value::Array(items)) => RawPayload::Array(items),
            _ => RawPayload::Lines(raw_text),
        }
    }

    /// Lazily decode records. The stream is finite and not restartable; a
    /// fresh `parse` call re-scans from the start.
    pub fn parse<'a>(&self, raw_text: &'a str) -> RecordStream<'a> {
        RecordStream::new(Self::classify(raw_text))
    }

    /// Decode all records, reporting progress after every batch and yielding
    /// control between batches. Progress is monotone and always ends at 100,
    /// including for empty input.
    pub async fn parse_with_progress<F>(&self, raw_text: &str, mut on_progress: F) -> Vec<AuthEvent>
    where
        F: FnMut(u8),
    {
        let mut stream = self.parse(raw_text);
        let total = stream.expected_records();
        let mut records = Vec::with_capacity(total);

        loop {
            let batch = stream.next_batch(self.batch_size);
            if batch.is_empty() {
                break;
            }
            records.extend(batch);
            on_progress(progress_percent(stream.consumed(), total));
            tokio::task::yield_now().await;
        }

        if stream.dropped() > 0 {
            debug!(dropped = stream.dropped(), "skipped undecodable lines");
        }
        on_progress(100);
        records
    }
}

/// Lazy record sequence produced by [`LogParser::parse`].
pub struct RecordStream<'a> {
    source: RecordSource<'a>,
    total: usize,
    consumed: usize,
    dropped: usize,
}

enum RecordSource<'a> {
    Array(std::vec::IntoIter<Value>),
    Lines(LineIter<'a>),
}

impl<'a> RecordStream<'a> {
    fn new(payload: RawPayload<'a>) -> Self {
        match payload {
            RawPayload::Array(items) => {
                let total = items.len();
                Self {
                    source: RecordSource::Array(items.into_iter()),
                    total,
                    consumed: 0,
                    dropped: 0,
                }
            }
            RawPayload::Lines(raw) => {
                let total = raw.lines().filter(not_blank as fn(&&str) -> bool).count();
                Self {
                    source: RecordSource::Lines(raw.lines().filter(not_blank as fn(&&str) -> bool)),
                    total,
                    consumed: 0,
                    dropped: 0,
                }
            }
        }
    }

    /// Number of source items (array elements or non-blank lines). The
    /// yielded record count can be lower in line mode.
    pub fn expected_records(&self) -> usize {
        self.total
    }

    /// Source items inspected so far, including dropped lines.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Lines dropped because they were not valid JSON. Always 0 in array mode.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Up to `size` records; empty when the stream is exhausted.
    pub fn next_batch(&mut self, size: usize) -> Vec<AuthEvent> {
        self.by_ref().take(size.max(1)).collect()
    }
}

impl Iterator for RecordStream<'_> {
    type Item = AuthEvent;

    fn next(&mut self) -> Option<AuthEvent> {
        loop {
            match &mut self.source {
                RecordSource::Array(values) => {
                    let value = values.next()?;
                    self.consumed += 1;
                    return Some(AuthEvent::from_value(value));
                }
                RecordSource::Lines(lines) => {
                    let line = lines.next()?;
                    self.consumed += 1;
                    match serde_json::from_str::<Value>(line.trim()) {
                        Ok(value) => return Some(AuthEvent::from_value(value)),
                        Err(_) => {
                            self.dropped += 1;
                            continue;
                        }
                    }
                }
            }
        }
    }
}

pub(crate) fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (((done as f64) / (total as f64)) * 100.0).round().min(100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_array() {
        assert!(matches!(
            LogParser::classify("[{\"sso_token_success\": true}]"),
            RawPayload::Array(_)
        ));
    }

    #[test]
    fn test_classify_object_falls_through_to_lines() {
        assert!(matches!(
            LogParser::classify("{\"sso_token_success\": true}"),
            RawPayload::Lines(_)
        ));
    }

    #[test]
    fn test_progress_percent_bounds() {
        assert_eq!(progress_percent(0, 0), 100);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(3, 3), 100);
    }
}
