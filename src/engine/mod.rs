// src/engine/mod.rs
//
// The attempt admission & scoring engine: decides whether a quiz is
// currently attemptable, guarantees at most one scored attempt per
// (user, quiz) pair, computes scores against the answer key, and exposes
// the attempt lifecycle as plain data.

pub mod availability;
pub mod ledger;
pub mod orchestrator;
pub mod scoring;

pub use ledger::{AttemptLedger, LedgerError, NewAttempt};
pub use orchestrator::{AttemptEngine, Outcome, Rejection};
pub use scoring::ScoreSheet;
