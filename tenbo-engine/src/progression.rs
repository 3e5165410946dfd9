//! What a concluded hand means for the match: net point movement, the next
//! hand's header, and whether the match is over.

use tracing::debug;

use crate::rule::MatchRule;
use crate::types::{ConcludedRound, NewRound, ScoreDeltas, Seat, Wind, NP};

/// Value of one riichi deposit.
pub const RIICHI_STICK_POINTS: i64 = 1000;

/// Net point movement of one hand, riichi deposits included.
///
/// The pot (sticks carried in plus this hand's declarations) goes to the
/// lowest-index winner; a hand without a win keeps it on the table.
pub fn generate_overall_score_deltas(round: &ConcludedRound) -> ScoreDeltas {
    let mut deltas = *round.draw_payments();
    for transaction in round.transactions() {
        for (total, delta) in deltas.iter_mut().zip(transaction.score_deltas()) {
            *total += delta;
        }
    }

    for &seat in round.riichis() {
        deltas[seat as usize] -= RIICHI_STICK_POINTS;
    }

    if let Some(&first_winner) = round.winning_seats().iter().next() {
        let pot = i64::from(round.start_riichi_stick_count()) + round.riichis().len() as i64;
        deltas[first_winner as usize] += RIICHI_STICK_POINTS * pot;
    }

    deltas
}

/// Header of the hand that follows `round`.
pub fn generate_next_round(round: &ConcludedRound) -> NewRound {
    let dealer = round.dealer();
    let has_win = round.has_win();
    let renchan = if has_win {
        round.winning_seats().contains(&dealer)
    } else {
        round.tenpais().contains(&dealer)
    };

    let honba = if renchan || !has_win {
        round.honba().saturating_add(1)
    } else {
        0
    };

    let next = round
        .header()
        .successor(renchan, honba, round.end_riichi_stick_count());
    debug!(from = %round.header(), to = %next, renchan, "next round");
    next
}

/// Running score of every seat after `history`.
pub fn cumulative_scores(history: &[ConcludedRound], rule: &MatchRule) -> ScoreDeltas {
    let mut scores = [rule.starting_score; NP];
    for round in history {
        let deltas = generate_overall_score_deltas(round);
        for (score, delta) in scores.iter_mut().zip(deltas) {
            *score += delta;
        }
    }
    scores
}

/// Seats from first to last place. Ties go to the lower seat index.
pub fn standings(scores: &ScoreDeltas) -> [Seat; NP] {
    let mut order: [Seat; NP] = [0, 1, 2, 3];
    order.sort_by_key(|&seat| (std::cmp::Reverse(scores[seat as usize]), seat));
    order
}

/// [`is_game_end_with_rule`] under the default hanchan rule.
pub fn is_game_end(next_round: &NewRound, history: &[ConcludedRound]) -> bool {
    is_game_end_with_rule(next_round, history, &MatchRule::default())
}

/// Whether the match stops instead of playing `next_round`.
///
/// `history` is every hand of the match so far, the just-concluded one last.
pub fn is_game_end_with_rule(
    next_round: &NewRound,
    history: &[ConcludedRound],
    rule: &MatchRule,
) -> bool {
    let Some(last) = history.last() else {
        return false;
    };
    let scores = cumulative_scores(history, rule);

    if rule.tobi_ends_game && scores.iter().any(|&s| s < 0) {
        debug!(?scores, "match ends: a seat is below zero");
        return true;
    }

    let cap = rule.cap_wind();
    if last.round_wind() >= cap || next_round.round_wind() == cap {
        debug!(?scores, "match ends: no more overtime winds");
        return true;
    }

    if !past_final_round(last, rule.final_wind()) {
        return false;
    }

    let dealer = next_round.dealer();
    let top = standings(&scores)[0];
    let ends = top == dealer && scores[dealer as usize] >= rule.target_score;
    if ends {
        debug!(?scores, dealer, "match ends: dealer is first at target score");
    }
    ends
}

fn past_final_round(round: &ConcludedRound, final_wind: Wind) -> bool {
    round.round_wind() > final_wind
        || (round.round_wind() == final_wind && round.round_number() == NP as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::RoundLedger;
    use crate::types::Hand;

    fn round(wind: Wind, number: u8, honba: u32, sticks: u32) -> RoundLedger {
        RoundLedger::new(NewRound::new(wind, number, honba, sticks).unwrap())
    }

    fn drawn(wind: Wind, number: u8, tenpais: &[Seat]) -> ConcludedRound {
        let mut l = round(wind, number, 0, 0);
        l.set_tenpais(tenpais.iter().copied()).unwrap();
        l.conclude_round()
    }

    #[test]
    fn test_standings_tie_break() {
        assert_eq!(standings(&[25000, 25000, 25000, 25000]), [0, 1, 2, 3]);
        assert_eq!(standings(&[20000, 37000, 6000, 37000]), [1, 3, 0, 2]);
        assert_eq!(standings(&[-300, 0, 50000, 50300]), [3, 2, 1, 0]);
    }

    #[test]
    fn test_cumulative_scores_use_rule_start() {
        let r = drawn(Wind::East, 1, &[0]);
        let rule = MatchRule {
            starting_score: 30000,
            ..MatchRule::default()
        };
        assert_eq!(
            cumulative_scores(std::slice::from_ref(&r), &rule),
            [33000, 29000, 29000, 29000]
        );
        assert_eq!(cumulative_scores(&[], &rule), [30000; NP]);
    }

    #[test]
    fn test_next_round_wraps_north_to_east() {
        let r = drawn(Wind::North, 4, &[]);
        let next = generate_next_round(&r);
        assert_eq!(next, NewRound::new(Wind::East, 1, 1, 0).unwrap());
    }

    #[test]
    fn test_riichi_pot_goes_to_lowest_winner() {
        let mut l = round(Wind::East, 1, 0, 2);
        l.set_riichis([1, 3]).unwrap();
        l.add_deal_in(3, 0, Hand::new(30, 1).unwrap()).unwrap();
        l.add_deal_in(2, 0, Hand::new(30, 1).unwrap()).unwrap();
        let r = l.conclude_round();
        assert_eq!(
            generate_overall_score_deltas(&r),
            [-2000, -1000, 1000 + 4000, 1000 - 1000]
        );
    }

    #[test]
    fn test_counters_saturate_at_u32_max() {
        let mut l = round(Wind::East, 2, u32::MAX, u32::MAX);
        l.set_riichis([0, 3]).unwrap();
        l.set_tenpais([0]).unwrap();
        let r = l.conclude_round();
        assert_eq!(r.end_riichi_stick_count(), u32::MAX);

        let next = generate_next_round(&r);
        assert_eq!(next, NewRound::new(Wind::East, 3, u32::MAX, u32::MAX).unwrap());
        assert_eq!(generate_overall_score_deltas(&r), [2000, -1000, -1000, -2000]);
    }

    #[test]
    fn test_empty_history_never_ends() {
        assert!(!is_game_end(&NewRound::first(), &[]));
    }

    #[test]
    fn test_tonpuusen_gate() {
        let rule = MatchRule::default_tonpuusen();
        let mut l = round(Wind::East, 4, 0, 0);
        l.add_deal_in(0, 1, Hand::new(30, 5).unwrap()).unwrap();
        let r = l.conclude_round();
        let next = generate_next_round(&r);
        assert_eq!(next, NewRound::new(Wind::South, 1, 0, 0).unwrap());
        // seat 0 leads with 33000 and deals South 1
        assert!(is_game_end_with_rule(&next, std::slice::from_ref(&r), &rule));
        // a hanchan carries on into the south wind
        assert!(!is_game_end(&next, std::slice::from_ref(&r)));
    }

    #[test]
    fn test_tonpuusen_caps_at_west() {
        let rule = MatchRule::default_tonpuusen();
        let r = drawn(Wind::South, 4, &[]);
        let next = generate_next_round(&r);
        assert_eq!(next.round_wind(), Wind::West);
        assert!(is_game_end_with_rule(&next, std::slice::from_ref(&r), &rule));
    }

    #[test]
    fn test_tobi_can_be_disabled() {
        let mut l = round(Wind::East, 4, 1, 0);
        l.set_riichis([1]).unwrap();
        l.add_deal_in(3, 1, Hand::new(30, 8).unwrap()).unwrap();
        let r = l.conclude_round();
        let next = generate_next_round(&r);
        let history = std::slice::from_ref(&r);
        assert!(is_game_end(&next, history));

        let rule = MatchRule {
            tobi_ends_game: false,
            ..MatchRule::default()
        };
        assert!(!is_game_end_with_rule(&next, history, &rule));
    }
}
