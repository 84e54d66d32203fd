//! The tracking engine: task tree, time and check ledgers, timers, and the
//! persist-first facade that ties them to a repository.

pub mod check_ledger;
pub mod projector;
pub mod time_ledger;
pub mod timer;
pub mod tracker;
pub mod tree;

pub use check_ledger::CheckLedger;
pub use time_ledger::{TimeLedger, UpsertOutcome};
pub use timer::{minutes_from_ms, TimerEngine};
pub use tracker::TrackerEngine;
pub use tree::TaskTree;
