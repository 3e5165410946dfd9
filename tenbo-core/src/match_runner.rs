//! Match loop on top of the settlement engine.
//!
//! `MatchRunner` owns a match's history and running scores. Each hand is
//! played by opening a ledger with [`MatchRunner::start_round`], filling it
//! (directly or through a [`RoundDriver`]), and handing the concluded round
//! back to [`MatchRunner::record_round`], which applies the deltas and decides
//! whether another hand follows.

use tracing::{debug, info};

use tenbo_engine::progression::{
    generate_next_round, generate_overall_score_deltas, is_game_end_with_rule, standings,
};
use tenbo_engine::{
    ConcludedRound, MatchRule, NewRound, RoundLedger, ScoreDeltas, Seat, SettleError,
    SettleResult, NP,
};

/// Fills a ledger with the events of one hand.
/// Implemented by random drivers, replay feeds, scripted tests, etc.
pub trait RoundDriver {
    fn drive_round(&mut self, ledger: &mut RoundLedger) -> SettleResult<()>;
}

impl<F> RoundDriver for F
where
    F: FnMut(&mut RoundLedger) -> SettleResult<()>,
{
    fn drive_round(&mut self, ledger: &mut RoundLedger) -> SettleResult<()> {
        self(ledger)
    }
}

#[derive(Debug, Clone)]
pub struct MatchRunner {
    rule: MatchRule,
    next_round: NewRound,
    history: Vec<ConcludedRound>,
    scores: ScoreDeltas,
    finished: bool,
}

impl Default for MatchRunner {
    fn default() -> Self {
        Self::new(MatchRule::default())
    }
}

impl MatchRunner {
    pub fn new(rule: MatchRule) -> Self {
        Self {
            rule,
            next_round: NewRound::first(),
            history: Vec::new(),
            scores: [rule.starting_score; NP],
            finished: false,
        }
    }

    pub fn rule(&self) -> &MatchRule {
        &self.rule
    }

    /// Header of the hand to be played next. Once the match has finished this
    /// is the hand that would have followed.
    pub fn next_round(&self) -> &NewRound {
        &self.next_round
    }

    pub fn history(&self) -> &[ConcludedRound] {
        &self.history
    }

    pub fn rounds_played(&self) -> usize {
        self.history.len()
    }

    pub fn scores(&self) -> &ScoreDeltas {
        &self.scores
    }

    pub fn standings(&self) -> [Seat; NP] {
        standings(&self.scores)
    }

    /// Riichi deposits currently sitting on the table.
    pub fn riichi_sticks_on_table(&self) -> u32 {
        self.next_round.start_riichi_stick_count()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Opens a ledger for the next hand.
    pub fn start_round(&self) -> SettleResult<RoundLedger> {
        if self.finished {
            return Err(SettleError::AlreadyConcluded);
        }
        Ok(RoundLedger::new(self.next_round))
    }

    /// Applies a concluded hand. Returns `true` once the match is over.
    pub fn record_round(&mut self, round: ConcludedRound) -> SettleResult<bool> {
        if self.finished {
            return Err(SettleError::AlreadyConcluded);
        }
        if *round.header() != self.next_round {
            return Err(SettleError::RoundMismatch {
                expected: self.next_round,
                actual: *round.header(),
            });
        }

        let deltas = generate_overall_score_deltas(&round);
        for (score, delta) in self.scores.iter_mut().zip(deltas) {
            *score += delta;
        }
        let next = generate_next_round(&round);
        self.history.push(round);

        self.finished = is_game_end_with_rule(&next, &self.history, &self.rule);
        self.next_round = next;
        debug!(
            rounds = self.history.len(),
            ?deltas,
            scores = ?self.scores,
            "round recorded"
        );

        if self.finished {
            info!(
                rounds = self.history.len(),
                scores = ?self.scores,
                winner = self.standings()[0],
                "match finished"
            );
        }
        Ok(self.finished)
    }

    /// Plays one hand through `driver`. Returns `true` once the match is over.
    pub fn play_round<D>(&mut self, driver: &mut D) -> SettleResult<bool>
    where
        D: RoundDriver + ?Sized,
    {
        let mut ledger = self.start_round()?;
        driver.drive_round(&mut ledger)?;
        self.record_round(ledger.conclude_round())
    }

    /// Plays hands until the match ends or `max_rounds` more hands have been
    /// played. Returns the number of hands played by this call.
    pub fn run_to_completion<D>(&mut self, driver: &mut D, max_rounds: usize) -> SettleResult<usize>
    where
        D: RoundDriver + ?Sized,
    {
        let mut played = 0;
        while !self.finished && played < max_rounds {
            self.play_round(driver)?;
            played += 1;
        }
        Ok(played)
    }
}
