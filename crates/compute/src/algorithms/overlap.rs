//! Pairwise interval intersection inside a window (sort-and-scan).

use chrono::{DateTime, Utc};
use serde::Serialize;

use chronologicon_core::time::{iso_millis, round_minutes};
use chronologicon_core::{EventId, HistoricalEvent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlapEvent {
    pub event_id: EventId,
    pub event_name: String,
    #[serde(with = "iso_millis")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end_date: DateTime<Utc>,
}

impl From<&HistoricalEvent> for OverlapEvent {
    fn from(e: &HistoricalEvent) -> Self {
        Self {
            event_id: e.event_id.clone(),
            event_name: e.event_name.clone(),
            start_date: e.start_date,
            end_date: e.end_date,
        }
    }
}

/// Two intersecting events, smaller id first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlapPair {
    pub overlapping_event_pairs: [OverlapEvent; 2],
    pub overlap_duration_minutes: i64,
}

/// All intersecting pairs among events lying entirely inside `[start, end]`.
///
/// Events outside the window are ignored, so callers may pass a superset.
/// Result is ordered by overlap length, longest first; equal lengths are
/// ordered by id pair.
pub fn find_overlaps(
    events: &[HistoricalEvent],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<OverlapPair> {
    let mut inside: Vec<&HistoricalEvent> = events
        .iter()
        .filter(|e| e.within(&start, &end))
        .collect();
    inside.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.event_id.cmp(&b.event_id))
    });

    // (overlap ms, lower id, higher id)
    let mut hits: Vec<(i64, &HistoricalEvent, &HistoricalEvent)> = Vec::new();
    for (i, a) in inside.iter().enumerate() {
        for b in &inside[i + 1..] {
            // Sorted by start: nothing further can begin before `a` ends.
            if b.start_date >= a.end_date {
                break;
            }
            if a.start_date >= b.end_date || a.event_id == b.event_id {
                continue;
            }
            let overlap = a.end_date.min(b.end_date) - a.start_date.max(b.start_date);
            let (lo, hi) = if a.event_id < b.event_id { (*a, *b) } else { (*b, *a) };
            hits.push((overlap.num_milliseconds(), lo, hi));
        }
    }

    hits.sort_by(|x, y| {
        y.0.cmp(&x.0)
            .then_with(|| x.1.event_id.cmp(&y.1.event_id))
            .then_with(|| x.2.event_id.cmp(&y.2.event_id))
    });

    hits.into_iter()
        .map(|(ms, lo, hi)| OverlapPair {
            overlapping_event_pairs: [lo.into(), hi.into()],
            overlap_duration_minutes: round_minutes(ms),
        })
        .collect()
}
