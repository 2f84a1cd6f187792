pub mod gaps;
pub mod influence;
pub mod min_queue;
pub mod overlap;
