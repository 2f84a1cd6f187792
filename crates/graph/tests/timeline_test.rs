/// Timeline reconstruction against a populated store.

use chrono::{Duration, TimeZone, Utc};

use chronologicon_core::HistoricalEvent;
use chronologicon_graph::{get_timeline, EventGraph, TimelineNode};
use chronologicon_storage::{EventStore, MemoryEventStore};

// ============================================================================
// Test Helpers
// ============================================================================

fn event(id: &str, parent: Option<&str>, start_hour: i64) -> HistoricalEvent {
    let base = Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap();
    let start = base + Duration::hours(start_hour);
    let e = HistoricalEvent::new(id, format!("Event {id}"), start, start + Duration::minutes(30));
    match parent {
        Some(p) => e.with_parent(p),
        None => e,
    }
}

/// war → {battle_a → skirmish, battle_b}, plus an unrelated event.
async fn populated_store() -> MemoryEventStore {
    let store = MemoryEventStore::new();
    store
        .insert_batch(&[
            event("war", None, 0),
            event("battle_b", Some("war"), 5),
            event("battle_a", Some("war"), 2),
            event("skirmish", Some("battle_a"), 3),
            event("unrelated", None, 1),
        ])
        .await
        .unwrap();
    store
}

fn child_ids(node: &TimelineNode) -> Vec<&str> {
    node.children.iter().map(|c| c.event_id.as_str()).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_timeline_from_root() {
    let store = populated_store().await;
    let tree = get_timeline(&store, "war").await.unwrap().unwrap();

    assert_eq!(tree.event_id, "war");
    assert_eq!(child_ids(&tree), vec!["battle_a", "battle_b"]);
    assert_eq!(child_ids(&tree.children[0]), vec!["skirmish"]);
    assert_eq!(tree.size(), 4);
}

#[tokio::test]
async fn test_timeline_from_leaf_climbs_to_top_ancestor() {
    let store = populated_store().await;
    let tree = get_timeline(&store, "skirmish").await.unwrap().unwrap();

    // Rooted at the top, siblings included.
    assert_eq!(tree.event_id, "war");
    assert_eq!(child_ids(&tree), vec!["battle_a", "battle_b"]);
    assert_eq!(tree.size(), 4);
}

#[tokio::test]
async fn test_timeline_with_unresolvable_parent() {
    let store = MemoryEventStore::new();
    store
        .insert_batch(&[
            event("orphan", Some("ghost"), 0),
            event("kid", Some("orphan"), 1),
        ])
        .await
        .unwrap();

    let tree = get_timeline(&store, "orphan").await.unwrap().unwrap();
    assert_eq!(tree.event_id, "orphan");
    assert_eq!(child_ids(&tree), vec!["kid"]);
}

#[tokio::test]
async fn test_timeline_unknown_event() {
    let store = populated_store().await;
    assert!(get_timeline(&store, "nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_graph_from_store_rows() {
    let store = populated_store().await;
    let graph = EventGraph::build(&store.graph_rows().await.unwrap());

    assert_eq!(graph.node_count(), 5);
    assert_eq!(graph.edge_count(), 3);
    assert_eq!(graph.stats().isolated_count, 1);
}
