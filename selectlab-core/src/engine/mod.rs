//! Simulation engine: the date loop, fill execution, per-variant state.

pub mod execution;
pub mod loop_runner;
pub mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use loop_runner::{run_simulation, VariantRun};
pub use state::VariantState;

/// Cooperative cancellation flag, checked between simulated dates only.
///
/// Cloneable across threads; the orchestrator hands the same token to every
/// timeframe run so one cancel stops them all at their next step boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
