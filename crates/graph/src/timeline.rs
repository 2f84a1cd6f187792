//! Nested timeline view of an event hierarchy.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use chronologicon_core::time::iso_millis;
use chronologicon_core::{EventId, HistoricalEvent};
use chronologicon_storage::{EventStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineNode {
    pub event_id: EventId,
    pub event_name: String,
    pub description: Option<String>,
    #[serde(with = "iso_millis")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub end_date: DateTime<Utc>,
    pub duration_minutes: i64,
    pub parent_event_id: Option<EventId>,
    pub children: Vec<TimelineNode>,
}

impl TimelineNode {
    fn leaf(event: &HistoricalEvent) -> Self {
        Self {
            event_id: event.event_id.clone(),
            event_name: event.event_name.clone(),
            description: event.description.clone(),
            start_date: event.start_date,
            end_date: event.end_date,
            duration_minutes: event.duration_minutes,
            parent_event_id: event.parent_event_id.clone(),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this tree, including `self`.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TimelineNode::size).sum::<usize>()
    }
}

/// Nest `flat` under `root_id`. Children are ordered by start date, then id.
///
/// Events not reachable from the root are ignored. Returns `None` when the
/// root is not in `flat`.
pub fn build_tree(flat: &[HistoricalEvent], root_id: &str) -> Option<TimelineNode> {
    let by_id: HashMap<&str, &HistoricalEvent> =
        flat.iter().map(|e| (e.event_id.as_str(), e)).collect();
    let root = *by_id.get(root_id)?;

    let mut children: HashMap<&str, Vec<&HistoricalEvent>> = HashMap::new();
    for &event in by_id.values() {
        if let Some(parent) = event.parent_event_id.as_deref() {
            if by_id.contains_key(parent) {
                children.entry(parent).or_default().push(event);
            }
        }
    }
    for list in children.values_mut() {
        list.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then_with(|| a.event_id.cmp(&b.event_id))
        });
    }

    let mut visited = HashSet::new();
    Some(nest(root, &children, &mut visited))
}

fn nest<'a>(
    event: &'a HistoricalEvent,
    children: &HashMap<&str, Vec<&'a HistoricalEvent>>,
    visited: &mut HashSet<&'a str>,
) -> TimelineNode {
    visited.insert(event.event_id.as_str());
    let mut node = TimelineNode::leaf(event);
    for child in children.get(event.event_id.as_str()).into_iter().flatten() {
        if visited.contains(child.event_id.as_str()) {
            continue;
        }
        node.children.push(nest(*child, children, visited));
    }
    node
}

/// Full hierarchy around `event_id`: rooted at the furthest ancestor that
/// can be resolved, so siblings and cousins are included.
///
/// `Ok(None)` when the event does not exist.
pub async fn get_timeline(
    store: &dyn EventStore,
    event_id: &str,
) -> Result<Option<TimelineNode>, StoreError> {
    let subtree = store.subtree(event_id).await?;
    let Some(first) = subtree.first() else {
        return Ok(None);
    };

    if first.parent_event_id.is_none() {
        return Ok(build_tree(&subtree, event_id));
    }

    let ancestors = store.ancestors(event_id).await?;
    let top = match ancestors.last() {
        Some(top) if top.event_id != event_id => top.event_id.clone(),
        _ => return Ok(build_tree(&subtree, event_id)),
    };

    debug!(event_id, root = %top, depth = ancestors.len() - 1, "timeline rooted at ancestor");
    let full = store.subtree(&top).await?;
    Ok(build_tree(&full, &top))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event(id: &str, parent: Option<&str>, start_hour: i64) -> HistoricalEvent {
        let base = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let start = base + Duration::hours(start_hour);
        let mut e = HistoricalEvent::new(id, format!("Event {id}"), start, start + Duration::hours(1));
        if let Some(p) = parent {
            e = e.with_parent(p);
        }
        e
    }

    fn ids(nodes: &[TimelineNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.event_id.as_str()).collect()
    }

    #[test]
    fn test_single_node() {
        let tree = build_tree(&[event("root", None, 0)], "root").unwrap();
        assert_eq!(tree.event_id, "root");
        assert!(tree.children.is_empty());
        assert_eq!(tree.duration_minutes, 60);
    }

    #[test]
    fn test_children_sorted_by_start_then_id() {
        let flat = vec![
            event("root", None, 0),
            event("late", Some("root"), 5),
            event("b", Some("root"), 1),
            event("a", Some("root"), 1),
        ];
        let tree = build_tree(&flat, "root").unwrap();
        assert_eq!(ids(&tree.children), vec!["a", "b", "late"]);
    }

    #[test]
    fn test_three_levels() {
        let flat = vec![
            event("grandchild", Some("child"), 2),
            event("child", Some("root"), 1),
            event("root", None, 0),
        ];
        let tree = build_tree(&flat, "root").unwrap();
        assert_eq!(ids(&tree.children), vec!["child"]);
        assert_eq!(ids(&tree.children[0].children), vec!["grandchild"]);
        assert!(tree.children[0].children[0].children.is_empty());
        assert_eq!(tree.size(), 3);
    }

    #[test]
    fn test_missing_root() {
        assert!(build_tree(&[event("root", None, 0)], "nope").is_none());
        assert!(build_tree(&[], "root").is_none());
    }

    #[test]
    fn test_cycle_is_cut() {
        let flat = vec![event("a", Some("b"), 0), event("b", Some("a"), 1)];
        let tree = build_tree(&flat, "a").unwrap();
        assert_eq!(tree.size(), 2);
        assert!(tree.children[0].children.is_empty());
    }

    #[test]
    fn test_serializes_iso_millis_and_drops_metadata() {
        let tree = build_tree(&[event("root", None, 0)], "root").unwrap();
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["start_date"], "2023-01-01T00:00:00.000Z");
        assert!(json["parent_event_id"].is_null());
        assert!(json.get("metadata").is_none());
        assert_eq!(json["children"], serde_json::json!([]));
    }
}
