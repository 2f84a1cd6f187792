//! Event search: name filter, date bounds, sorting and pagination.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chronologicon_core::time::iso_millis;
use chronologicon_core::HistoricalEvent;

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    StartDate,
    EndDate,
    EventName,
    DurationMinutes,
}

impl SortKey {
    /// Whitelisted column names; anything else falls back to `start_date`.
    pub fn from_param(raw: &str) -> Self {
        match raw {
            "end_date" => Self::EndDate,
            "event_name" => Self::EventName,
            "duration_minutes" => Self::DurationMinutes,
            _ => Self::StartDate,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Only `desc` selects descending order.
    pub fn from_param(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive substring of `event_name`.
    pub name: Option<String>,
    /// Keep events starting strictly after this instant.
    #[serde(default, with = "iso_millis::option")]
    pub start_date_after: Option<DateTime<Utc>>,
    /// Keep events ending strictly before this instant.
    #[serde(default, with = "iso_millis::option")]
    pub end_date_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort_by: SortKey,
    #[serde(default)]
    pub sort_order: SortOrder,
    /// 1-based; 0 or missing means the first page.
    pub page: Option<usize>,
    /// Clamped to `1..=100`; missing means 10.
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn effective_page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn matches(&self, event: &HistoricalEvent) -> bool {
        if let Some(ref name) = self.name {
            if !event
                .event_name
                .to_lowercase()
                .contains(&name.to_lowercase())
            {
                return false;
            }
        }
        if let Some(after) = self.start_date_after {
            if event.start_date <= after {
                return false;
            }
        }
        if let Some(before) = self.end_date_before {
            if event.end_date >= before {
                return false;
            }
        }
        true
    }

    fn compare(&self, a: &HistoricalEvent, b: &HistoricalEvent) -> Ordering {
        let ord = match self.sort_by {
            SortKey::StartDate => a.start_date.cmp(&b.start_date),
            SortKey::EndDate => a.end_date.cmp(&b.end_date),
            SortKey::EventName => a.event_name.cmp(&b.event_name),
            SortKey::DurationMinutes => a.duration_minutes.cmp(&b.duration_minutes),
        };
        match self.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }

    /// Filter, sort and slice an in-memory event set.
    pub fn apply<'a, I>(&self, events: I) -> SearchPage
    where
        I: IntoIterator<Item = &'a HistoricalEvent>,
    {
        let mut matched: Vec<&HistoricalEvent> =
            events.into_iter().filter(|e| self.matches(e)).collect();
        // Stable sort: equal keys keep store order.
        matched.sort_by(|a, b| self.compare(a, b));

        let page = self.effective_page();
        let limit = self.effective_limit();
        let total_events = matched.len();
        let events = matched
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .cloned()
            .collect();

        SearchPage {
            total_events,
            page,
            limit,
            events,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub total_events: usize,
    pub page: usize,
    pub limit: usize,
    pub events: Vec<HistoricalEvent>,
}
