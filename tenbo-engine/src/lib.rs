pub mod errors;
pub mod ledger;
pub mod progression;
pub mod rule;
pub mod score;
pub mod types;

pub use errors::{SettleError, SettleResult};
pub use ledger::RoundLedger;
pub use progression::{
    cumulative_scores, generate_next_round, generate_overall_score_deltas, is_game_end,
    is_game_end_with_rule, standings,
};
pub use rule::{MatchLength, MatchRule};
pub use types::{
    ConcludedRound, Hand, NewRound, ScoreDeltas, Seat, Transaction, TransactionKind,
    TransactionType, Wind, NP,
};
