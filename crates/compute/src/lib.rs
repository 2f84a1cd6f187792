pub mod algorithms;
pub mod insights;

pub use algorithms::gaps::{find_largest_gap, GapReport, TemporalGap};
pub use algorithms::influence::{find_path, InfluencePath, PathOutcome, PathStep};
pub use algorithms::min_queue::MinQueue;
pub use algorithms::overlap::{find_overlaps, OverlapPair};
pub use insights::{InsightError, InsightService};
