use super::round2;
use chrono::NaiveDateTime;
use log::debug;
use std::collections::HashMap;

/// A start marker, annotated with its end once correlated.
#[derive(Debug, Clone, PartialEq)]
pub struct EventHead {
    pub start: NaiveDateTime,
    pub metadata: Option<String>,
    pub metadata_key: Option<String>,
    /// Seconds between `start` and `end`, rounded to two decimals.
    pub duration: Option<f64>,
    pub end: Option<NaiveDateTime>,
}

impl EventHead {
    pub fn is_complete(&self) -> bool {
        self.duration.is_some()
    }
}

/// Index of the head with the latest start not after `end`. Equal starts
/// resolve to the earliest registered head.
fn nearest_preceding(heads: &[EventHead], end: NaiveDateTime) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, head) in heads.iter().enumerate() {
        if head.start <= end && best.map_or(true, |b| head.start > heads[b].start) {
            best = Some(i);
        }
    }
    best
}

#[derive(Debug, Default)]
struct EventRecord {
    heads: Vec<EventHead>,
    tails: Vec<NaiveDateTime>,
}

/// Heads and tails per event id. Ids need not be unique over time; the
/// same id may open and close many times across rotated logs.
#[derive(Debug, Default)]
pub struct EventCollection {
    order: Vec<String>,
    events: HashMap<String, EventRecord>,
}

impl EventCollection {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_mut(&mut self, event_id: &str) -> &mut EventRecord {
        if !self.events.contains_key(event_id) {
            self.order.push(event_id.to_string());
        }
        self.events.entry(event_id.to_string()).or_default()
    }

    pub fn add_event_start(
        &mut self,
        event_id: &str,
        start: NaiveDateTime,
        metadata: Option<String>,
        metadata_key: Option<&str>,
    ) {
        self.record_mut(event_id).heads.push(EventHead {
            start,
            metadata,
            metadata_key: metadata_key.map(str::to_string),
            duration: None,
            end: None,
        });
    }

    pub fn add_event_end(&mut self, event_id: &str, end: NaiveDateTime) {
        self.record_mut(event_id).tails.push(end);
    }

    /// Pairs each tail with the nearest head starting at or before it.
    ///
    /// Tails are taken in the order they were added. Once a tail binds to the
    /// same start as the previous tail, the rest of that id's tails are
    /// dropped so an occurrence is never closed twice in a row.
    pub fn calculate_event_deltas(&mut self) {
        for event_id in &self.order {
            let Some(EventRecord { heads, tails }) = self.events.get_mut(event_id) else {
                continue;
            };

            let mut prev_start: Option<NaiveDateTime> = None;
            for &end in tails.iter() {
                let Some(idx) = nearest_preceding(heads, end) else {
                    debug!("{event_id}: end at {end} has no preceding start");
                    continue;
                };

                let start = heads[idx].start;
                if prev_start == Some(start) {
                    debug!("{event_id}: start {start} already closed, ignoring remaining ends");
                    break;
                }

                let delta = end - start;
                let seconds = delta
                    .num_microseconds()
                    .map(|us| us as f64 / 1_000_000.0)
                    .unwrap_or_else(|| delta.num_seconds() as f64);
                let head = &mut heads[idx];
                head.duration = Some(round2(seconds));
                head.end = Some(end);
                prev_start = Some(start);
            }
        }
    }

    /// Event ids in the order they were first seen.
    pub fn event_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn heads(&self, event_id: &str) -> &[EventHead] {
        self.events
            .get(event_id)
            .map(|r| r.heads.as_slice())
            .unwrap_or(&[])
    }

    pub fn tails(&self, event_id: &str) -> &[NaiveDateTime] {
        self.events
            .get(event_id)
            .map(|r| r.tails.as_slice())
            .unwrap_or(&[])
    }

    /// The most recently ended complete head of each id.
    pub fn complete_events(&self) -> Vec<(&str, &EventHead)> {
        self.event_ids()
            .filter_map(|id| {
                self.heads(id)
                    .iter()
                    .filter(|h| h.is_complete())
                    .max_by_key(|h| h.end)
                    .map(|h| (id, h))
            })
            .collect()
    }

    /// Every incomplete head, grouped by id.
    pub fn incomplete_events(&self) -> Vec<(&str, Vec<&EventHead>)> {
        self.event_ids()
            .filter_map(|id| {
                let heads: Vec<&EventHead> =
                    self.heads(id).iter().filter(|h| !h.is_complete()).collect();
                (!heads.is_empty()).then_some((id, heads))
            })
            .collect()
    }
}
