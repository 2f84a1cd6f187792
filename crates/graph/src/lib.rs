//! In-memory event hierarchy: the influence graph and timeline trees.

pub mod store;
pub mod timeline;

pub use store::{EventGraph, GraphNode, GraphStats, NodeIdx};
pub use timeline::{build_tree, get_timeline, TimelineNode};
