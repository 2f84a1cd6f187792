//! Largest uncovered span inside a query window (sweep line).
//!
//! A frontier tracks how far coverage extends. Walking events in start order,
//! any event that begins past the frontier exposes a gap; the frontier then
//! advances to the event's end if that end is later. Nested events never move
//! the frontier, so the "preceding" event of a gap is whichever event last
//! advanced it, not simply the previous one in the scan.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use chronologicon_core::time::{iso_millis, round_minutes};
use chronologicon_core::{EventId, HistoricalEvent};

pub const NO_GAP_MESSAGE: &str =
    "No significant temporal gaps found within the specified range, or too few events.";
pub const GAP_FOUND_MESSAGE: &str = "Largest temporal gap identified.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrecedingEvent {
    pub event_id: EventId,
    pub event_name: String,
    #[serde(with = "iso_millis")]
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SucceedingEvent {
    pub event_id: EventId,
    pub event_name: String,
    #[serde(with = "iso_millis")]
    pub start_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemporalGap {
    #[serde(with = "iso_millis")]
    pub start_of_gap: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end_of_gap: DateTime<Utc>,
    pub duration_minutes: i64,
    /// `None` for a gap that opens at the start of the window.
    pub preceding_event: Option<PrecedingEvent>,
    /// `None` for a gap that runs to the end of the window.
    pub succeeding_event: Option<SucceedingEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GapReport {
    pub largest_gap: Option<TemporalGap>,
    pub message: String,
}

impl GapReport {
    fn none() -> Self {
        Self {
            largest_gap: None,
            message: NO_GAP_MESSAGE.to_string(),
        }
    }
}

/// Candidate span, compared on exact length before rounding.
struct Candidate<'a> {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    preceding: Option<&'a HistoricalEvent>,
    succeeding: Option<&'a HistoricalEvent>,
}

impl Candidate<'_> {
    fn span(&self) -> TimeDelta {
        self.end - self.start
    }

    fn into_gap(self) -> TemporalGap {
        TemporalGap {
            start_of_gap: self.start,
            end_of_gap: self.end,
            duration_minutes: round_minutes(self.span().num_milliseconds()),
            preceding_event: self.preceding.map(|e| PrecedingEvent {
                event_id: e.event_id.clone(),
                event_name: e.event_name.clone(),
                end_date: e.end_date,
            }),
            succeeding_event: self.succeeding.map(|e| SucceedingEvent {
                event_id: e.event_id.clone(),
                event_name: e.event_name.clone(),
                start_date: e.start_date,
            }),
        }
    }
}

/// Strictly longer spans replace the current best, so ties keep the earliest.
fn offer<'a>(best: &mut Option<Candidate<'a>>, candidate: Candidate<'a>) {
    if best.as_ref().map_or(true, |b| candidate.span() > b.span()) {
        *best = Some(candidate);
    }
}

/// Find the largest gap in coverage of `[query_start, query_end]` by `events`.
///
/// `events` should be those intersecting the window; order does not matter.
/// Ties keep the earliest gap. A best gap that rounds to zero minutes is
/// reported as no gap.
pub fn find_largest_gap(
    events: &[HistoricalEvent],
    query_start: DateTime<Utc>,
    query_end: DateTime<Utc>,
) -> GapReport {
    if events.is_empty() {
        return GapReport::none();
    }

    let mut ordered: Vec<&HistoricalEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.start_date);

    let mut frontier = query_start;
    let mut preceding: Option<&HistoricalEvent> = None;
    let mut best: Option<Candidate> = None;

    for event in ordered {
        if event.start_date > frontier {
            offer(
                &mut best,
                Candidate {
                    start: frontier,
                    end: event.start_date,
                    preceding,
                    succeeding: Some(event),
                },
            );
        }
        if event.end_date > frontier {
            frontier = event.end_date;
            preceding = Some(event);
        }
    }

    if query_end > frontier {
        offer(
            &mut best,
            Candidate {
                start: frontier,
                end: query_end,
                preceding,
                succeeding: None,
            },
        );
    }

    match best.map(Candidate::into_gap) {
        Some(gap) if gap.duration_minutes > 0 => GapReport {
            largest_gap: Some(gap),
            message: GAP_FOUND_MESSAGE.to_string(),
        },
        _ => GapReport::none(),
    }
}
