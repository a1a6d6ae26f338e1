use super::collection::EventCollection;
use super::{round2, DISPLAY_FORMAT, TIMESTAMP_FORMAT};
use crate::error::EventError;
use crate::search::{SearchResult, SearchResultsCollection};
use chrono::NaiveDateTime;
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeMap;

/// Capture group positions for one `<prefix>-start` / `<prefix>-end` family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResultIndices {
    pub day: usize,
    pub secs: usize,
    pub event_id: usize,
    pub metadata: Option<usize>,
    pub metadata_key: Option<String>,
}

impl Default for SearchResultIndices {
    fn default() -> Self {
        Self {
            day: 1,
            secs: 2,
            event_id: 3,
            metadata: None,
            metadata_key: None,
        }
    }
}

impl SearchResultIndices {
    pub fn with_metadata(mut self, index: usize, key: &str) -> Self {
        self.metadata = Some(index);
        self.metadata_key = Some(key.to_string());
        self
    }
}

/// One completed event as presented by [`LogEventStats::get_top_n_events_sorted`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSummary {
    pub start: String,
    pub end: String,
    pub duration: f64,
    #[serde(flatten)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventStats {
    pub min: f64,
    pub max: f64,
    pub stdev: f64,
    pub avg: f64,
    pub samples: usize,
    /// Number of event ids with at least one start that never closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incomplete: Option<usize>,
}

/// Correlates a tag family's start and end results and reports on the
/// resulting durations.
pub struct LogEventStats<'a> {
    results: &'a SearchResultsCollection,
    tag_prefix: String,
    indices: SearchResultIndices,
    data: EventCollection,
}

impl<'a> LogEventStats<'a> {
    pub fn new(
        results: &'a SearchResultsCollection,
        tag_prefix: &str,
        indices: Option<SearchResultIndices>,
    ) -> Self {
        Self {
            results,
            tag_prefix: tag_prefix.to_string(),
            indices: indices.unwrap_or_default(),
            data: EventCollection::new(),
        }
    }

    pub fn events(&self) -> &EventCollection {
        &self.data
    }

    /// Loads all ends, then all starts, then correlates. Re-running starts
    /// from an empty collection.
    pub fn run(&mut self) -> Result<(), EventError> {
        self.data = EventCollection::new();
        let results = self.results;

        let end_tag = format!("{}-end", self.tag_prefix);
        let ends = results.find_by_tag(&end_tag, None);
        for result in &ends {
            let event_id = required(result, &end_tag, self.indices.event_id, "event id")?;
            let end = self.timestamp(result, &end_tag)?;
            self.data.add_event_end(event_id, end);
        }

        let start_tag = format!("{}-start", self.tag_prefix);
        let starts = results.find_by_tag(&start_tag, None);
        for result in &starts {
            let event_id = required(result, &start_tag, self.indices.event_id, "event id")?;
            let start = self.timestamp(result, &start_tag)?;
            let metadata = self
                .indices
                .metadata
                .and_then(|i| result.get(i))
                .map(str::to_string);
            self.data.add_event_start(
                event_id,
                start,
                metadata,
                self.indices.metadata_key.as_deref(),
            );
        }

        debug!(
            "{}: loaded {} start(s) and {} end(s)",
            self.tag_prefix,
            starts.len(),
            ends.len()
        );
        self.data.calculate_event_deltas();
        info!(
            "{}: {} complete, {} incomplete event id(s)",
            self.tag_prefix,
            self.data.complete_events().len(),
            self.data.incomplete_events().len()
        );
        Ok(())
    }

    fn timestamp(&self, result: &SearchResult, tag: &str) -> Result<NaiveDateTime, EventError> {
        let day = required(result, tag, self.indices.day, "day")?;
        let secs = required(result, tag, self.indices.secs, "secs")?;
        let value = format!("{day} {secs}");
        NaiveDateTime::parse_from_str(&value, TIMESTAMP_FORMAT).map_err(|source| {
            EventError::Timestamp {
                value,
                path: result.source().to_path_buf(),
                line: result.line_number(),
                source,
            }
        })
    }

    /// Up to `max` complete events ordered by duration (slowest first unless
    /// `descending` is false), then presented newest start first.
    pub fn get_top_n_events_sorted(
        &self,
        max: usize,
        descending: bool,
    ) -> Vec<(String, EventSummary)> {
        let mut events = self.data.complete_events();
        events.sort_by(|(_, a), (_, b)| {
            let (a, b) = (a.duration.unwrap_or_default(), b.duration.unwrap_or_default());
            if descending {
                b.total_cmp(&a)
            } else {
                a.total_cmp(&b)
            }
        });
        events.truncate(max);
        events.sort_by(|(_, a), (_, b)| b.start.cmp(&a.start));

        events
            .into_iter()
            .map(|(id, head)| {
                let mut metadata = BTreeMap::new();
                if let (Some(key), Some(value)) = (&head.metadata_key, &head.metadata) {
                    metadata.insert(key.clone(), value.clone());
                }
                let summary = EventSummary {
                    start: head.start.format(DISPLAY_FORMAT).to_string(),
                    end: head
                        .end
                        .map(|e| e.format(DISPLAY_FORMAT).to_string())
                        .unwrap_or_default(),
                    duration: head.duration.unwrap_or_default(),
                    metadata,
                };
                (id.to_string(), summary)
            })
            .collect()
    }

    /// Aggregate duration statistics, or `None` when nothing completed.
    pub fn get_event_stats(&self) -> Option<EventStats> {
        let durations: Vec<f64> = self
            .data
            .complete_events()
            .iter()
            .filter_map(|(_, head)| head.duration)
            .collect();
        if durations.is_empty() {
            return None;
        }

        let n = durations.len() as f64;
        let avg = durations.iter().sum::<f64>() / n;
        let variance = durations.iter().map(|d| (d - avg).powi(2)).sum::<f64>() / n;
        let incomplete = self.data.incomplete_events().len();

        Some(EventStats {
            min: round2(durations.iter().copied().fold(f64::INFINITY, f64::min)),
            max: round2(durations.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            stdev: round2(variance.sqrt()),
            avg: round2(avg),
            samples: durations.len(),
            incomplete: (incomplete > 0).then_some(incomplete),
        })
    }
}

fn required<'r>(
    result: &'r SearchResult,
    tag: &str,
    index: usize,
    field: &'static str,
) -> Result<&'r str, EventError> {
    result.get(index).ok_or_else(|| EventError::MissingField {
        tag: tag.to_string(),
        field,
        index,
        path: result.source().to_path_buf(),
        line: result.line_number(),
    })
}
