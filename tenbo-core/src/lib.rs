//! Tenbo match runner
//!
//! Drives full riichi matches on top of `tenbo-engine`: hand-by-hand
//! orchestration with the end-of-match rule, deterministic seeding, and a
//! rayon batch simulator for throughput and invariant testing.

pub mod match_runner;
pub mod seeding;
pub mod simulator;

pub use match_runner::{MatchRunner, RoundDriver};
pub use seeding::{derive_match_seed, SessionRng};
pub use simulator::{
    run_batch_simple, simulate_match, BatchConfig, BatchSimulator, MatchResult, OutcomeWeights,
    RandomRoundDriver,
};
