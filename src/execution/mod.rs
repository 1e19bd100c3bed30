// Order execution module
pub mod engine;
pub mod scheduler;
pub mod state;

pub use engine::{CycleOutcome, DataKind, TradingEngine};
pub use scheduler::Scheduler;
pub use state::LoopState;
