//! Batch match simulation with rayon parallelism.
//!
//! Plays N complete matches in parallel, each with its own `MatchRunner` and
//! a seeded `RandomRoundDriver`, on a dedicated rayon ThreadPool.

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tenbo_engine::{Hand, MatchRule, NewRound, RoundLedger, ScoreDeltas, Seat, SettleResult, NP};

use crate::match_runner::{MatchRunner, RoundDriver};
use crate::seeding::{derive_match_seed, round_rng, SessionRng};

/// Fu values a random hand is drawn from.
const FU_CHOICES: [u32; 10] = [20, 25, 30, 30, 30, 40, 40, 50, 60, 70];

/// Han values a random hand is drawn from, weighted toward cheap hands.
const HAN_CHOICES: [u32; 16] = [1, 1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 5, 6, 8, 13];

/// Per-mille odds of each hand outcome. Whatever remains is a plain ron.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeWeights {
    pub exhaustive_draw: u32,
    pub nagashi: u32,
    pub self_draw: u32,
    pub double_ron: u32,
    pub pao: u32,
    /// Odds that a seat declared riichi, evaluated per seat.
    pub riichi: u32,
    /// Odds that a seat is tenpai at a draw, evaluated per seat.
    pub tenpai: u32,
}

impl Default for OutcomeWeights {
    fn default() -> Self {
        Self {
            exhaustive_draw: 150,
            nagashi: 5,
            self_draw: 300,
            double_ron: 20,
            pao: 5,
            riichi: 200,
            tenpai: 400,
        }
    }
}

/// Plays every hand with randomly chosen, always valid events.
///
/// Hands are not dealt; the driver only decides who wins what, which is all
/// the settlement engine needs. Each hand reseeds from the match seed and the
/// hand's header, so a hand's outcome does not depend on earlier hands.
#[derive(Debug, Clone)]
pub struct RandomRoundDriver {
    match_seed: [u8; 32],
    rng: ChaCha8Rng,
    weights: OutcomeWeights,
}

impl RandomRoundDriver {
    pub fn new(match_seed: [u8; 32]) -> Self {
        Self::with_weights(match_seed, OutcomeWeights::default())
    }

    pub fn with_weights(match_seed: [u8; 32], weights: OutcomeWeights) -> Self {
        Self {
            match_seed,
            rng: ChaCha8Rng::from_seed(match_seed),
            weights,
        }
    }

    fn roll(&mut self, per_mille: u32) -> bool {
        self.rng.random_range(0..1000) < per_mille
    }

    fn seat(&mut self) -> Seat {
        self.rng.random_range(0..NP as Seat)
    }

    fn seat_other_than(&mut self, taken: &[Seat]) -> Seat {
        loop {
            let seat = self.seat();
            if !taken.contains(&seat) {
                return seat;
            }
        }
    }

    fn seats_where(&mut self, per_mille: u32) -> Vec<Seat> {
        (0..NP as Seat).filter(|_| self.roll(per_mille)).collect()
    }

    fn hand(&mut self) -> SettleResult<Hand> {
        let fu = FU_CHOICES.choose(&mut self.rng).copied().unwrap_or(30);
        let han = HAN_CHOICES.choose(&mut self.rng).copied().unwrap_or(1);
        Hand::new(fu, han)
    }
}

impl RoundDriver for RandomRoundDriver {
    fn drive_round(&mut self, ledger: &mut RoundLedger) -> SettleResult<()> {
        self.rng = round_rng(&self.match_seed, ledger.round());
        let w = self.weights;
        let riichis = self.seats_where(w.riichi);
        ledger.set_riichis(riichis.iter().copied())?;

        let mut roll = self.rng.random_range(0..1000);
        let mut take = |weight: u32| {
            let hit = roll < weight;
            roll = roll.saturating_sub(weight);
            hit
        };

        if take(w.exhaustive_draw) {
            // riichi seats are always tenpai
            let mut tenpais = self.seats_where(w.tenpai);
            tenpais.extend(riichis);
            ledger.set_tenpais(tenpais)?;
        } else if take(w.nagashi) {
            let seat = self.seat();
            ledger.add_nagashi_mangan(seat)?;
            let tenpais = self.seats_where(w.tenpai);
            ledger.set_tenpais(tenpais)?;
        } else if take(w.self_draw) {
            let winner = self.seat();
            let hand = self.hand()?;
            ledger.add_self_draw(winner, hand)?;
        } else if take(w.double_ron) {
            let payer = self.seat();
            let first = self.seat_other_than(&[payer]);
            let second = self.seat_other_than(&[payer, first]);
            let (h1, h2) = (self.hand()?, self.hand()?);
            ledger.add_deal_in(first, payer, h1)?;
            ledger.add_deal_in(second, payer, h2)?;
        } else if take(w.pao) {
            let winner = self.seat();
            let pao_target = self.seat_other_than(&[winner]);
            let yakuman = Hand::new(40, 13)?;
            if self.rng.random_bool(0.5) {
                ledger.add_self_draw_pao(winner, pao_target, yakuman)?;
            } else {
                let payer = self.seat_other_than(&[winner, pao_target]);
                ledger.add_deal_in_pao(winner, payer, pao_target, yakuman)?;
            }
        } else {
            let winner = self.seat();
            let payer = self.seat_other_than(&[winner]);
            let hand = self.hand()?;
            ledger.add_deal_in(winner, payer, hand)?;
        }
        Ok(())
    }
}

/// Configuration for a batch simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of matches to simulate.
    pub num_matches: usize,
    /// Session seed. `None` draws a fresh one from the thread RNG.
    pub base_seed: Option<u64>,
    /// Threads in the rayon pool. `None` uses the rayon default (num CPUs).
    pub num_threads: Option<usize>,
    /// Hands after which an unfinished match is abandoned.
    pub max_rounds: usize,
    pub rule: MatchRule,
    pub weights: OutcomeWeights,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            num_matches: 100,
            base_seed: None,
            num_threads: None,
            max_rounds: 200,
            rule: MatchRule::default(),
            weights: OutcomeWeights::default(),
        }
    }
}

impl BatchConfig {
    fn session(&self) -> SessionRng {
        match self.base_seed {
            Some(seed) => SessionRng::from_u64(seed),
            None => SessionRng::new(rand::random()),
        }
    }
}

/// Result of a single simulated match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Final score of each seat.
    pub scores: ScoreDeltas,
    /// Seats from first to last place.
    pub standings: [Seat; NP],
    pub rounds_played: usize,
    /// Deposits left on the table when the match stopped.
    pub riichi_sticks_on_table: u32,
    /// The hand that would have been played next.
    pub final_round: NewRound,
    /// `false` when the match hit `max_rounds` before ending.
    pub finished: bool,
    pub seed: [u8; 32],
}

/// Plays one match to completion with a [`RandomRoundDriver`].
pub fn simulate_match(
    seed: [u8; 32],
    rule: MatchRule,
    weights: OutcomeWeights,
    max_rounds: usize,
) -> SettleResult<MatchResult> {
    let mut runner = MatchRunner::new(rule);
    let mut driver = RandomRoundDriver::with_weights(seed, weights);
    runner.run_to_completion(&mut driver, max_rounds)?;

    Ok(MatchResult {
        scores: *runner.scores(),
        standings: runner.standings(),
        rounds_played: runner.rounds_played(),
        riichi_sticks_on_table: runner.riichi_sticks_on_table(),
        final_round: *runner.next_round(),
        finished: runner.is_finished(),
        seed,
    })
}

fn run_matches(config: &BatchConfig) -> anyhow::Result<Vec<MatchResult>> {
    let session = config.session();
    let session_seed = *session.session_seed();
    let BatchConfig {
        num_matches,
        max_rounds,
        rule,
        weights,
        ..
    } = *config;

    let results = (0..num_matches)
        .into_par_iter()
        .map(|i| {
            let seed = derive_match_seed(&session_seed, i as u64);
            simulate_match(seed, rule, weights, max_rounds)
        })
        .collect::<SettleResult<Vec<_>>>()?;

    debug!(
        matches = results.len(),
        unfinished = results.iter().filter(|r| !r.finished).count(),
        "batch complete"
    );
    Ok(results)
}

/// Parallel batch simulator using a dedicated rayon ThreadPool.
pub struct BatchSimulator {
    pool: rayon::ThreadPool,
}

impl BatchSimulator {
    /// Create a new batch simulator with the given thread count.
    pub fn new(num_threads: Option<usize>) -> anyhow::Result<Self> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = num_threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build thread pool: {}", e))?;
        Ok(Self { pool })
    }

    pub fn from_config(config: &BatchConfig) -> anyhow::Result<Self> {
        Self::new(config.num_threads)
    }

    /// Run a batch of matches in parallel. Results are in match-index order.
    pub fn run_batch(&self, config: &BatchConfig) -> anyhow::Result<Vec<MatchResult>> {
        self.pool.install(|| run_matches(config))
    }
}

/// Convenience: run a batch on rayon's global thread pool.
pub fn run_batch_simple(config: &BatchConfig) -> anyhow::Result<Vec<MatchResult>> {
    run_matches(config)
}
