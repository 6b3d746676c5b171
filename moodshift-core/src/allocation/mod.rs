//! Allocation state machine.
//!
//! - `state`: the persisted two-bucket split and the monthly streak counter
//! - `strategy`: `update_strategy`, the below-average shift rule
//! - `store`: JSON state file and JSONL evaluation journal (caller-owned persistence)

pub mod state;
pub mod store;
pub mod strategy;

pub use state::{AllocationState, InvariantViolation, SUM_TOLERANCE, TOTAL_PCT};
pub use store::{EvaluationJournal, StateStore, StoreError};
pub use strategy::{update_strategy, ShiftSchedule, StrategyAction};
