//! Undirected parent/child graph over stored events.
//!
//! Nodes are addressed by a dense [`NodeIdx`]; the id → index map is only
//! consulted at the edges of an algorithm. Entering a node costs its
//! `duration_minutes`, which is why the weight lives on the node rather than
//! on the edge.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use chronologicon_core::EventId;
use chronologicon_storage::GraphRow;

pub type NodeIdx = usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub event_id: EventId,
    pub event_name: String,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    /// Nodes with no edge at all.
    pub isolated_count: usize,
}

#[derive(Debug, Default)]
pub struct EventGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<EventId, NodeIdx>,
    /// Neighbours in the order their edges were added.
    adjacency: Vec<Vec<NodeIdx>>,
    edge_dedup: HashSet<(NodeIdx, NodeIdx)>,
}

impl EventGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from store rows. All rows are indexed before any edge is wired,
    /// so a child may precede its parent. Parent references that do not
    /// resolve are ignored.
    pub fn build(rows: &[GraphRow]) -> Self {
        let mut graph = Self::new();
        for row in rows {
            graph.add_node(&row.event_id, &row.event_name, row.duration_minutes);
        }

        let mut dangling = 0usize;
        for row in rows {
            let Some(parent) = row.parent_event_id.as_deref() else {
                continue;
            };
            match (graph.index_of(parent), graph.index_of(&row.event_id)) {
                (Some(p), Some(c)) => graph.add_edge(p, c),
                _ => dangling += 1,
            }
        }

        let stats = graph.stats();
        debug!(
            nodes = stats.node_count,
            edges = stats.edge_count,
            isolated = stats.isolated_count,
            dangling,
            "event graph built"
        );
        graph
    }

    /// Insert a node, or return the existing index when the id is known.
    /// The first name and duration seen for an id are kept.
    pub fn add_node(&mut self, event_id: &str, event_name: &str, duration_minutes: i64) -> NodeIdx {
        if let Some(&existing) = self.index.get(event_id) {
            return existing;
        }
        let idx = self.nodes.len();
        self.nodes.push(GraphNode {
            event_id: event_id.to_string(),
            event_name: event_name.to_string(),
            duration_minutes,
        });
        self.adjacency.push(Vec::new());
        self.index.insert(event_id.to_string(), idx);
        idx
    }

    /// Connect `a` and `b` in both directions. Self-loops and repeated
    /// pairs are ignored.
    pub fn add_edge(&mut self, a: NodeIdx, b: NodeIdx) {
        if a == b {
            return;
        }
        let key = (a.min(b), a.max(b));
        if !self.edge_dedup.insert(key) {
            return;
        }
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
    }

    pub fn index_of(&self, event_id: &str) -> Option<NodeIdx> {
        self.index.get(event_id).copied()
    }

    pub fn node(&self, idx: NodeIdx) -> &GraphNode {
        &self.nodes[idx]
    }

    pub fn neighbors(&self, idx: NodeIdx) -> &[NodeIdx] {
        &self.adjacency[idx]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_dedup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            isolated_count: self.adjacency.iter().filter(|n| n.is_empty()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(id: &str, parent: Option<&str>, duration: i64) -> GraphRow {
        let t = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        GraphRow {
            event_id: id.to_string(),
            event_name: format!("Event {id}"),
            parent_event_id: parent.map(str::to_string),
            duration_minutes: duration,
            start_date: t,
            end_date: t,
        }
    }

    fn neighbor_ids(g: &EventGraph, id: &str) -> Vec<String> {
        let idx = g.index_of(id).unwrap();
        g.neighbors(idx)
            .iter()
            .map(|&n| g.node(n).event_id.clone())
            .collect()
    }

    #[test]
    fn test_edges_are_bidirectional() {
        let g = EventGraph::build(&[row("a", None, 10), row("b", Some("a"), 20)]);
        assert_eq!(neighbor_ids(&g, "a"), vec!["b"]);
        assert_eq!(neighbor_ids(&g, "b"), vec!["a"]);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_child_before_parent_resolves() {
        let g = EventGraph::build(&[row("kid", Some("mom"), 5), row("mom", None, 50)]);
        assert_eq!(neighbor_ids(&g, "mom"), vec!["kid"]);
    }

    #[test]
    fn test_dangling_parent_leaves_node_isolated() {
        let g = EventGraph::build(&[row("a", Some("ghost"), 10)]);
        assert_eq!(g.node_count(), 1);
        assert!(g.index_of("ghost").is_none());
        assert_eq!(
            g.stats(),
            GraphStats {
                node_count: 1,
                edge_count: 0,
                isolated_count: 1
            }
        );
    }

    #[test]
    fn test_adjacency_keeps_row_order() {
        let g = EventGraph::build(&[
            row("root", None, 1),
            row("c2", Some("root"), 1),
            row("c1", Some("root"), 1),
            row("c3", Some("root"), 1),
        ]);
        assert_eq!(neighbor_ids(&g, "root"), vec!["c2", "c1", "c3"]);
    }

    #[test]
    fn test_duplicate_ids_and_self_parent() {
        let g = EventGraph::build(&[
            row("a", None, 10),
            row("a", None, 99),
            row("b", Some("b"), 5),
        ]);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.node(g.index_of("a").unwrap()).duration_minutes, 10);
        assert!(neighbor_ids(&g, "b").is_empty());
    }

    #[test]
    fn test_empty_graph() {
        let g = EventGraph::build(&[]);
        assert!(g.is_empty());
        assert_eq!(g.edge_count(), 0);
    }
}
