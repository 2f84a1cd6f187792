//! Storage collaborator for historical events.
//!
//! [`EventStore`] is the contract; [`MemoryEventStore`] is the process-local
//! implementation used by the CLI and the test suites.

pub mod error;
pub mod memory;
pub mod search;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryEventStore;
pub use search::{SearchPage, SearchQuery, SortKey, SortOrder};
pub use store::{EventStore, GraphRow};
