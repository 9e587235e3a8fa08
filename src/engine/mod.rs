//! Long-running tasks around the tracker: message dispatch and timeout sweeping.

mod dispatcher;
mod sweeper;

pub use dispatcher::EnrichmentDispatcher;
pub use sweeper::{SweeperHandle, TimeoutSweeper};
