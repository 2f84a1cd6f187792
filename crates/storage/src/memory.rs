//! In-process [`EventStore`] backed by an insertion-ordered map.
//!
//! Writers take the lock for the whole batch, so a batch is atomic with
//! respect to readers. Hierarchy walks run over a parent → children index
//! maintained on insert.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tokio::sync::RwLock;
use tracing::debug;

use chronologicon_core::{EventId, HistoricalEvent};

use crate::error::StoreError;
use crate::search::{SearchPage, SearchQuery};
use crate::store::{EventStore, GraphRow};

#[derive(Debug, Default)]
struct Inner {
    events: IndexMap<EventId, HistoricalEvent>,
    /// parent id → child ids, including parents that are not (yet) stored.
    children: HashMap<EventId, Vec<EventId>>,
}

#[derive(Debug, Default)]
pub struct MemoryEventStore {
    inner: RwLock<Inner>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Row-level checks a relational schema would enforce with constraints.
fn check_row(event: &HistoricalEvent) -> Result<(), StoreError> {
    if event.event_name.trim().is_empty() {
        return Err(StoreError::Rejected {
            event_id: event.event_id.clone(),
            reason: "event_name must not be empty".into(),
        });
    }
    if event.end_date < event.start_date {
        return Err(StoreError::Rejected {
            event_id: event.event_id.clone(),
            reason: "end_date is before start_date".into(),
        });
    }
    Ok(())
}

fn sorted_by_start(mut events: Vec<HistoricalEvent>) -> Vec<HistoricalEvent> {
    events.sort_by(|a, b| a.start_date.cmp(&b.start_date));
    events
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert_batch(&self, events: &[HistoricalEvent]) -> Result<usize, StoreError> {
        // Validate everything before touching state so a bad row aborts the whole batch.
        for event in events {
            check_row(event)?;
        }

        let mut inner = self.inner.write().await;
        let mut inserted = 0;
        for event in events {
            if inner.events.contains_key(&event.event_id) {
                continue;
            }
            if let Some(ref parent) = event.parent_event_id {
                inner
                    .children
                    .entry(parent.clone())
                    .or_default()
                    .push(event.event_id.clone());
            }
            inner.events.insert(event.event_id.clone(), event.clone());
            inserted += 1;
        }

        debug!(
            rows = events.len(),
            inserted,
            skipped = events.len() - inserted,
            "batch inserted"
        );
        Ok(inserted)
    }

    async fn get(&self, event_id: &str) -> Result<Option<HistoricalEvent>, StoreError> {
        Ok(self.inner.read().await.events.get(event_id).cloned())
    }

    async fn subtree(&self, root: &str) -> Result<Vec<HistoricalEvent>, StoreError> {
        let inner = self.inner.read().await;
        let Some(root_event) = inner.events.get(root) else {
            return Ok(Vec::new());
        };

        let mut out = vec![root_event.clone()];
        let mut seen: HashSet<&str> = HashSet::from([root]);
        let mut queue: VecDeque<&str> = VecDeque::from([root]);

        while let Some(id) = queue.pop_front() {
            for child_id in inner.children.get(id).into_iter().flatten() {
                if !seen.insert(child_id.as_str()) {
                    continue;
                }
                if let Some(child) = inner.events.get(child_id) {
                    out.push(child.clone());
                    queue.push_back(child_id.as_str());
                }
            }
        }
        Ok(out)
    }

    async fn ancestors(&self, leaf: &str) -> Result<Vec<HistoricalEvent>, StoreError> {
        let inner = self.inner.read().await;
        let mut out = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut cursor = inner.events.get(leaf);

        while let Some(event) = cursor {
            if !seen.insert(event.event_id.as_str()) {
                break;
            }
            out.push(event.clone());
            cursor = event
                .parent_event_id
                .as_deref()
                .and_then(|p| inner.events.get(p));
        }
        Ok(out)
    }

    async fn events_intersecting(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoricalEvent>, StoreError> {
        let inner = self.inner.read().await;
        let hits = inner
            .events
            .values()
            .filter(|e| e.intersects(&start, &end))
            .cloned()
            .collect();
        Ok(sorted_by_start(hits))
    }

    async fn events_within(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoricalEvent>, StoreError> {
        let inner = self.inner.read().await;
        let hits = inner
            .events
            .values()
            .filter(|e| e.within(&start, &end))
            .cloned()
            .collect();
        Ok(sorted_by_start(hits))
    }

    async fn graph_rows(&self) -> Result<Vec<GraphRow>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.events.values().map(GraphRow::from).collect())
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, StoreError> {
        let inner = self.inner.read().await;
        Ok(query.apply(inner.events.values()))
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().await.events.len())
    }
}
