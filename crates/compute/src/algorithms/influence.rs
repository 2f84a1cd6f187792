//! Event influence: cheapest chain of parent/child links between two events.
//!
//! Cost is node-weighted: entering an event costs its `duration_minutes`, and
//! the source is charged its own duration up front. A path from an event to
//! itself therefore costs that event's duration, not zero.

use serde::Serialize;

use chronologicon_core::EventId;
use chronologicon_graph::{EventGraph, NodeIdx};

use super::min_queue::MinQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathOutcome {
    Found,
    NoEvents,
    SourceNotFound,
    TargetNotFound,
    NoPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathStep {
    pub event_id: EventId,
    pub event_name: String,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfluencePath {
    pub source_event_id: EventId,
    pub target_event_id: EventId,
    pub outcome: PathOutcome,
    /// Source first, target last. Empty unless `outcome` is `Found`.
    pub shortest_path: Vec<PathStep>,
    pub total_duration_minutes: i64,
    pub message: String,
}

impl InfluencePath {
    fn empty(source: &str, target: &str, outcome: PathOutcome, message: String) -> Self {
        Self {
            source_event_id: source.to_string(),
            target_event_id: target.to_string(),
            outcome,
            shortest_path: Vec::new(),
            total_duration_minutes: 0,
            message,
        }
    }

    pub fn is_found(&self) -> bool {
        self.outcome == PathOutcome::Found
    }
}

/// Compute the cheapest path from `source` to `target` using Dijkstra.
///
/// Edges are traversed in both directions. Among equal-cost candidates the
/// first one discovered wins, both for the queue order and for predecessor
/// links.
pub fn find_path(graph: &EventGraph, source: &str, target: &str) -> InfluencePath {
    if graph.is_empty() {
        return InfluencePath::empty(
            source,
            target,
            PathOutcome::NoEvents,
            "No events found in the database.".into(),
        );
    }
    let Some(from) = graph.index_of(source) else {
        return InfluencePath::empty(
            source,
            target,
            PathOutcome::SourceNotFound,
            format!("Source event '{source}' not found."),
        );
    };
    let Some(to) = graph.index_of(target) else {
        return InfluencePath::empty(
            source,
            target,
            PathOutcome::TargetNotFound,
            format!("Target event '{target}' not found."),
        );
    };

    let n = graph.node_count();
    let mut dist: Vec<Option<i64>> = vec![None; n];
    let mut prev: Vec<Option<NodeIdx>> = vec![None; n];
    let mut visited = vec![false; n];
    let mut queue = MinQueue::new();

    let seed = graph.node(from).duration_minutes;
    dist[from] = Some(seed);
    queue.push(seed, from);

    while let Some((cost, node)) = queue.pop() {
        // Reached the target: reconstruct and return path
        if node == to {
            return InfluencePath {
                source_event_id: source.to_string(),
                target_event_id: target.to_string(),
                outcome: PathOutcome::Found,
                shortest_path: reconstruct_path(graph, &prev, to),
                total_duration_minutes: cost,
                message: "Shortest temporal path found from source to target event.".into(),
            };
        }

        if visited[node] {
            continue;
        }
        visited[node] = true;

        for &next in graph.neighbors(node) {
            if visited[next] {
                continue;
            }
            let candidate = cost + graph.node(next).duration_minutes;
            if dist[next].map_or(true, |d| candidate < d) {
                dist[next] = Some(candidate);
                prev[next] = Some(node);
                queue.push(candidate, next);
            }
        }
    }

    InfluencePath::empty(
        source,
        target,
        PathOutcome::NoPath,
        "No temporal path found from source to target event.".into(),
    )
}

/// Follow predecessor links back from `to`; the source is the node without one.
fn reconstruct_path(graph: &EventGraph, prev: &[Option<NodeIdx>], to: NodeIdx) -> Vec<PathStep> {
    let mut path = Vec::new();
    let mut current = Some(to);

    while let Some(idx) = current {
        let node = graph.node(idx);
        path.push(PathStep {
            event_id: node.event_id.clone(),
            event_name: node.event_name.clone(),
            duration_minutes: node.duration_minutes,
        });
        current = prev[idx];
    }

    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chronologicon_storage::GraphRow;

    fn row(id: &str, parent: Option<&str>, duration: i64) -> GraphRow {
        let t = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        GraphRow {
            event_id: id.to_string(),
            event_name: id.to_uppercase(),
            parent_event_id: parent.map(str::to_string),
            duration_minutes: duration,
            start_date: t,
            end_date: t,
        }
    }

    fn ids(path: &InfluencePath) -> Vec<&str> {
        path.shortest_path.iter().map(|s| s.event_id.as_str()).collect()
    }

    /// A(10) → {B(1000), C(5)}, C → D(10)
    fn build_branching_graph() -> EventGraph {
        EventGraph::build(&[
            row("a", None, 10),
            row("b", Some("a"), 1000),
            row("c", Some("a"), 5),
            row("d", Some("c"), 10),
        ])
    }

    #[test]
    fn test_same_node_costs_own_duration() {
        let g = EventGraph::build(&[row("a", None, 60)]);
        let result = find_path(&g, "a", "a");

        assert_eq!(result.outcome, PathOutcome::Found);
        assert_eq!(ids(&result), vec!["a"]);
        assert_eq!(result.total_duration_minutes, 60);
    }

    #[test]
    fn test_picks_cheapest_branch() {
        let g = build_branching_graph();
        let result = find_path(&g, "a", "d");

        assert!(result.is_found());
        assert_eq!(ids(&result), vec!["a", "c", "d"]);
        assert_eq!(result.total_duration_minutes, 25);
        assert_eq!(result.shortest_path[1].event_name, "C");
        assert_eq!(
            result.message,
            "Shortest temporal path found from source to target event."
        );
    }

    #[test]
    fn test_path_is_symmetric() {
        let g = build_branching_graph();
        let forward = find_path(&g, "b", "d");
        let backward = find_path(&g, "d", "b");

        let mut reversed = ids(&backward);
        reversed.reverse();
        assert_eq!(ids(&forward), reversed);
        assert_eq!(ids(&forward), vec!["b", "a", "c", "d"]);
        assert_eq!(forward.total_duration_minutes, 1025);
        assert_eq!(backward.total_duration_minutes, 1025);
    }

    #[test]
    fn test_child_to_parent_traversal() {
        let g = build_branching_graph();
        let result = find_path(&g, "d", "a");
        assert_eq!(ids(&result), vec!["d", "c", "a"]);
        assert_eq!(result.total_duration_minutes, 25);
    }

    #[test]
    fn test_no_path_between_components() {
        let g = EventGraph::build(&[row("a", None, 1), row("z", None, 1)]);
        let result = find_path(&g, "a", "z");

        assert_eq!(result.outcome, PathOutcome::NoPath);
        assert!(result.shortest_path.is_empty());
        assert_eq!(result.total_duration_minutes, 0);
        assert_eq!(
            result.message,
            "No temporal path found from source to target event."
        );
    }

    #[test]
    fn test_missing_endpoints() {
        let g = build_branching_graph();

        let result = find_path(&g, "nope", "also-nope");
        assert_eq!(result.outcome, PathOutcome::SourceNotFound);
        assert_eq!(result.message, "Source event 'nope' not found.");

        let result = find_path(&g, "a", "nope");
        assert_eq!(result.outcome, PathOutcome::TargetNotFound);
        assert_eq!(result.message, "Target event 'nope' not found.");
        assert_eq!(result.total_duration_minutes, 0);
    }

    #[test]
    fn test_empty_graph() {
        let result = find_path(&EventGraph::new(), "a", "b");
        assert_eq!(result.outcome, PathOutcome::NoEvents);
        assert_eq!(result.message, "No events found in the database.");
    }

    #[test]
    fn test_equal_cost_tie_keeps_first_discovered() {
        //   s(1) - x(5) - t(1)
        //   s(1) - y(5) - t(1)
        let mut g = EventGraph::build(&[
            row("s", None, 1),
            row("x", Some("s"), 5),
            row("y", Some("s"), 5),
            row("t", Some("x"), 1),
        ]);
        let (y, t) = (g.index_of("y").unwrap(), g.index_of("t").unwrap());
        g.add_edge(y, t);

        let result = find_path(&g, "s", "t");
        assert_eq!(ids(&result), vec!["s", "x", "t"]);
        assert_eq!(result.total_duration_minutes, 7);
    }

    #[test]
    fn test_serialized_outcome() {
        let g = build_branching_graph();
        let json = serde_json::to_value(find_path(&g, "a", "zzz")).unwrap();
        assert_eq!(json["outcome"], "target_not_found");
        assert_eq!(json["shortest_path"], serde_json::json!([]));
    }
}
