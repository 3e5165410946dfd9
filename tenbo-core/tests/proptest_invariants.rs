//! Property-based invariant tests for settlement and match progression.
//!
//! Uses proptest to generate random seeds and hand events, plays them through
//! the engine, and checks the invariants every hand must satisfy.

use proptest::prelude::*;
use tenbo_core::{MatchRunner, RandomRoundDriver};
use tenbo_engine::progression::RIICHI_STICK_POINTS;
use tenbo_engine::{
    generate_next_round, generate_overall_score_deltas, ConcludedRound, Hand, MatchRule, NewRound,
    RoundLedger, Seat, Wind,
};

const MAX_ROUNDS: usize = 500;

/// Play a full random match from `seed`.
fn play_full_match(seed: u64, rule: MatchRule) -> MatchRunner {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&seed.to_le_bytes());
    let mut runner = MatchRunner::new(rule);
    let mut driver = RandomRoundDriver::new(bytes);
    runner
        .run_to_completion(&mut driver, MAX_ROUNDS)
        .expect("random driver only records valid events");
    runner
}

fn wind() -> impl Strategy<Value = Wind> {
    (0u8..4).prop_map(Wind::from)
}

fn header() -> impl Strategy<Value = NewRound> {
    (wind(), 1u8..=4, 0u32..6, 0u32..4)
        .prop_map(|(w, n, honba, sticks)| NewRound::new(w, n, honba, sticks).unwrap())
}

fn hand() -> impl Strategy<Value = Hand> {
    (prop::sample::select(vec![20u32, 25, 30, 40, 50, 70, 110]), 1u32..=13)
        .prop_map(|(fu, han)| Hand::new(fu, han).unwrap())
}

/// A discard claimed by one to three seats, with riichi declarations.
#[derive(Debug, Clone)]
struct MultiRon {
    round: NewRound,
    payer: Seat,
    winners: Vec<(Seat, Hand)>,
    riichis: Vec<Seat>,
}

fn multi_ron() -> impl Strategy<Value = MultiRon> {
    (
        header(),
        0u8..4,
        prop::collection::vec(hand(), 3),
        1usize..=3,
        prop::collection::vec(any::<bool>(), 4),
    )
        .prop_map(|(round, payer, hands, count, riichi_flags)| {
            let winners = (1..=count as Seat)
                .map(|offset| (payer + offset) % 4)
                .zip(hands)
                .collect();
            let riichis = (0..4u8).filter(|&s| riichi_flags[s as usize]).collect();
            MultiRon {
                round,
                payer,
                winners,
                riichis,
            }
        })
}

fn settle(ron: &MultiRon, winners: &[(Seat, Hand)]) -> ConcludedRound {
    let mut ledger = RoundLedger::new(ron.round);
    ledger.set_riichis(ron.riichis.iter().copied()).unwrap();
    for &(winner, hand) in winners {
        ledger.add_deal_in(winner, ron.payer, hand).unwrap();
    }
    ledger.conclude_round()
}

// ---------------------------------------------------------------------------
// Settlement properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn multi_ron_is_order_independent(ron in multi_ron(), rotate in 0usize..3) {
        let recorded = settle(&ron, &ron.winners);

        let mut permuted = ron.winners.clone();
        permuted.reverse();
        let len = permuted.len();
        permuted.rotate_left(rotate % len);
        let shuffled = settle(&ron, &permuted);

        prop_assert_eq!(
            generate_overall_score_deltas(&recorded),
            generate_overall_score_deltas(&shuffled)
        );
        prop_assert_eq!(generate_next_round(&recorded), generate_next_round(&shuffled));
        prop_assert_eq!(recorded.end_riichi_stick_count(), 0);
    }

    #[test]
    fn multi_ron_is_zero_sum(ron in multi_ron()) {
        let round = settle(&ron, &ron.winners);
        for t in round.transactions() {
            prop_assert_eq!(t.score_deltas().iter().sum::<i64>(), 0);
        }
        // the pot pays out exactly what was on the table
        let overall: i64 = generate_overall_score_deltas(&round).iter().sum();
        let carried = RIICHI_STICK_POINTS * i64::from(ron.round.start_riichi_stick_count());
        prop_assert_eq!(overall, carried);
    }

    #[test]
    fn draw_payments_balance(round in header(), flags in prop::collection::vec(any::<bool>(), 4)) {
        let mut ledger = RoundLedger::new(round);
        let tenpais: Vec<Seat> = (0..4u8).filter(|&s| flags[s as usize]).collect();
        ledger.set_tenpais(tenpais.iter().copied()).unwrap();
        let concluded = ledger.conclude_round();

        let deltas = generate_overall_score_deltas(&concluded);
        prop_assert_eq!(deltas.iter().sum::<i64>(), 0);
        if !tenpais.is_empty() && tenpais.len() < 4 {
            let received: i64 = tenpais.iter().map(|&s| deltas[s as usize]).sum();
            prop_assert_eq!(received, 3000);
        } else {
            prop_assert_eq!(deltas, [0; 4]);
        }

        let next = generate_next_round(&concluded);
        prop_assert_eq!(next.honba(), round.honba() + 1);
        let repeat = NewRound::new(
            round.round_wind(),
            round.round_number(),
            round.honba() + 1,
            round.start_riichi_stick_count(),
        )
        .unwrap();
        prop_assert_eq!(next == repeat, tenpais.contains(&round.dealer()));
    }
}

// ---------------------------------------------------------------------------
// Match properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Points are conserved, every transaction is zero-sum and the match
    /// terminates, across random hanchan and tonpuusen matches.
    #[test]
    fn match_invariants_hold(seed in 0u64..1_000_000, east_only in any::<bool>()) {
        let rule = if east_only {
            MatchRule::default_tonpuusen()
        } else {
            MatchRule::default_hanchan()
        };
        let runner = play_full_match(seed, rule);

        prop_assert!(runner.is_finished(), "seed {seed}: match did not finish");

        for round in runner.history() {
            for t in round.transactions() {
                prop_assert_eq!(t.score_deltas().iter().sum::<i64>(), 0);
            }
            prop_assert!(round.round_wind() < rule.cap_wind(), "seed {seed}: hand dealt past the cap");
        }

        let sum: i64 = runner.scores().iter().sum();
        let on_table = RIICHI_STICK_POINTS * i64::from(runner.riichi_sticks_on_table());
        prop_assert_eq!(sum + on_table, 4 * rule.starting_score);
    }
}

// ---------------------------------------------------------------------------
// Standalone deterministic tests
// ---------------------------------------------------------------------------

#[test]
fn match_never_panics_100_seeds() {
    for seed in 0..100u64 {
        let runner = play_full_match(seed, MatchRule::default());
        assert!(runner.is_finished(), "seed {seed}: match did not finish");
    }
}

#[test]
fn finished_match_has_a_reason_to_end() {
    for seed in 0..50u64 {
        let runner = play_full_match(seed, MatchRule::default());
        let scores = runner.scores();
        let next = runner.next_round();
        let bust = scores.iter().any(|&s| s < 0);
        let capped = next.round_wind() == Wind::North;
        let dealer = next.dealer();
        let leader_deals = runner.standings()[0] == dealer && scores[dealer as usize] >= 30000;
        assert!(
            bust || capped || leader_deals,
            "seed {seed}: ended at {next} with {scores:?}",
        );
    }
}
