//! Per-hand event accumulator.
//!
//! A [`RoundLedger`] records what happened in one hand and is consumed by
//! [`RoundLedger::conclude_round`], which settles every event and freezes the
//! result into a [`ConcludedRound`]. Payments are computed at that point, not
//! while recording, because the honba bonus goes to exactly one transaction
//! and which one depends on the full set of winners.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::errors::SettleResult;
use crate::score::{base_points, calculate_score, tsumo_total, NAGASHI_BASE_POINTS};
use crate::types::{
    check_seat, ConcludedRound, Hand, NewRound, ScoreDeltas, Seat, Transaction, TransactionKind,
    NP,
};

/// Total paid out by noten seats at an exhaustive draw.
pub const TENPAI_POOL: i64 = 3000;

#[derive(Debug, Clone)]
pub struct RoundLedger {
    round: NewRound,
    events: Vec<TransactionKind>,
    riichis: BTreeSet<Seat>,
    tenpais: BTreeSet<Seat>,
}

impl RoundLedger {
    pub fn new(round: NewRound) -> Self {
        Self {
            round,
            events: Vec::new(),
            riichis: BTreeSet::new(),
            tenpais: BTreeSet::new(),
        }
    }

    pub fn round(&self) -> &NewRound {
        &self.round
    }

    pub fn riichis(&self) -> &BTreeSet<Seat> {
        &self.riichis
    }

    pub fn tenpais(&self) -> &BTreeSet<Seat> {
        &self.tenpais
    }

    /// Number of recorded win and nagashi events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn has_win(&self) -> bool {
        self.events.iter().any(TransactionKind::is_win)
    }

    /// `winner` claims a discard from `payer` (ron).
    pub fn add_deal_in(&mut self, winner: Seat, payer: Seat, hand: Hand) -> SettleResult<()> {
        self.record(TransactionKind::DealIn {
            winner,
            payer,
            hand,
        })
    }

    /// `winner` wins on their own draw (tsumo).
    pub fn add_self_draw(&mut self, winner: Seat, hand: Hand) -> SettleResult<()> {
        self.record(TransactionKind::SelfDraw { winner, hand })
    }

    /// Ron where `pao_target` is liable for half of the hand.
    pub fn add_deal_in_pao(
        &mut self,
        winner: Seat,
        payer: Seat,
        pao_target: Seat,
        hand: Hand,
    ) -> SettleResult<()> {
        self.record(TransactionKind::DealInPao {
            winner,
            payer,
            pao_target,
            hand,
        })
    }

    /// Tsumo where `pao_target` pays the whole hand alone.
    pub fn add_self_draw_pao(
        &mut self,
        winner: Seat,
        pao_target: Seat,
        hand: Hand,
    ) -> SettleResult<()> {
        self.record(TransactionKind::SelfDrawPao {
            winner,
            pao_target,
            hand,
        })
    }

    pub fn add_nagashi_mangan(&mut self, seat: Seat) -> SettleResult<()> {
        self.record(TransactionKind::NagashiMangan { seat })
    }

    /// Replaces the set of seats that declared riichi this hand.
    pub fn set_riichis<I>(&mut self, seats: I) -> SettleResult<()>
    where
        I: IntoIterator<Item = Seat>,
    {
        self.riichis = collect_seats(seats)?;
        Ok(())
    }

    /// Replaces the set of seats that were tenpai when the hand was drawn.
    pub fn set_tenpais<I>(&mut self, seats: I) -> SettleResult<()>
    where
        I: IntoIterator<Item = Seat>,
    {
        self.tenpais = collect_seats(seats)?;
        Ok(())
    }

    pub(crate) fn record(&mut self, kind: TransactionKind) -> SettleResult<()> {
        kind.validate()?;
        trace!(round = %self.round, ?kind, "recorded hand event");
        self.events.push(kind);
        Ok(())
    }

    /// Settles every recorded event and freezes the hand.
    pub fn conclude_round(self) -> ConcludedRound {
        let dealer = self.round.dealer();
        let carrier = honba_carrier(&self.events);

        let transactions: Vec<Transaction> = self
            .events
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let honba = if carrier == Some(i) {
                    self.round.honba()
                } else {
                    0
                };
                Transaction::new(*kind, settle(kind, dealer, honba))
            })
            .collect();

        // Any nagashi or win replaces the tenpai settlement.
        let draw_payments = if transactions.is_empty() {
            tenpai_payments(&self.tenpais)
        } else {
            [0; NP]
        };

        let has_win = transactions.iter().any(Transaction::is_win);
        let end_riichi_stick_count = if has_win {
            0
        } else {
            // saturates rather than wrapping at u32::MAX
            self.round
                .start_riichi_stick_count()
                .saturating_add(self.riichis.len() as u32)
        };

        debug!(
            round = %self.round,
            transactions = transactions.len(),
            riichis = self.riichis.len(),
            has_win,
            end_riichi_stick_count,
            "round concluded"
        );

        ConcludedRound::new(
            self.round,
            self.riichis,
            self.tenpais,
            end_riichi_stick_count,
            transactions,
            draw_payments,
        )
    }
}

fn collect_seats<I>(seats: I) -> SettleResult<BTreeSet<Seat>>
where
    I: IntoIterator<Item = Seat>,
{
    seats.into_iter().map(check_seat).collect()
}

/// Index of the single event that collects the honba bonus.
///
/// The bonus goes to the lowest-index winning seat, on its first ron or
/// self-draw. A self-draw pao only carries it when that seat has nothing else.
fn honba_carrier(events: &[TransactionKind]) -> Option<usize> {
    let recipient = events
        .iter()
        .filter(|k| k.is_win())
        .map(TransactionKind::winner)
        .min()?;

    let mut fallback = None;
    for (i, kind) in events.iter().enumerate() {
        if !kind.is_win() || kind.winner() != recipient {
            continue;
        }
        match kind {
            TransactionKind::SelfDrawPao { .. } => {
                fallback.get_or_insert(i);
            }
            _ => return Some(i),
        }
    }
    fallback
}

fn settle(kind: &TransactionKind, dealer: Seat, honba: u32) -> ScoreDeltas {
    let mut deltas = [0i64; NP];
    match *kind {
        TransactionKind::DealIn {
            winner,
            payer,
            hand,
        } => {
            let base = base_points(hand.fu, hand.han);
            let amount = calculate_score(base, winner == dealer, false, honba).pay_ron;
            deltas[winner as usize] += amount;
            deltas[payer as usize] -= amount;
        }
        TransactionKind::SelfDraw { winner, hand } => {
            let base = base_points(hand.fu, hand.han);
            pay_tsumo(&mut deltas, winner, dealer, base, honba);
        }
        TransactionKind::DealInPao {
            winner,
            payer,
            pao_target,
            hand,
        } => {
            let base = base_points(hand.fu, hand.han);
            let ron = calculate_score(base, winner == dealer, false, 0).pay_ron;
            // Odd hundreds of the split stay with the discarder.
            let pao_share = ron / 2 / 100 * 100;
            let payer_share = ron - pao_share + i64::from(honba) * 300;
            deltas[pao_target as usize] -= pao_share;
            deltas[payer as usize] -= payer_share;
            deltas[winner as usize] += pao_share + payer_share;
        }
        TransactionKind::SelfDrawPao {
            winner,
            pao_target,
            hand,
        } => {
            let base = base_points(hand.fu, hand.han);
            let amount = tsumo_total(base, winner == dealer) + i64::from(honba) * 300;
            deltas[pao_target as usize] -= amount;
            deltas[winner as usize] += amount;
        }
        TransactionKind::NagashiMangan { seat } => {
            pay_tsumo(&mut deltas, seat, dealer, NAGASHI_BASE_POINTS, 0);
        }
    }
    deltas
}

fn pay_tsumo(deltas: &mut ScoreDeltas, winner: Seat, dealer: Seat, base: u32, honba: u32) {
    let score = calculate_score(base, winner == dealer, true, honba);
    let mut total_win = 0i64;
    for i in 0..NP as u8 {
        if i == winner {
            continue;
        }
        let pay = if i == dealer {
            score.pay_tsumo_oya
        } else {
            score.pay_tsumo_ko
        };
        deltas[i as usize] -= pay;
        total_win += pay;
    }
    deltas[winner as usize] += total_win;
}

fn tenpai_payments(tenpais: &BTreeSet<Seat>) -> ScoreDeltas {
    let mut deltas = [0i64; NP];
    let num_tp = tenpais.len();
    if num_tp > 0 && num_tp < NP {
        let pk = TENPAI_POOL / num_tp as i64;
        let pn = TENPAI_POOL / (NP - num_tp) as i64;
        for (i, delta) in deltas.iter_mut().enumerate() {
            *delta = if tenpais.contains(&(i as Seat)) {
                pk
            } else {
                -pn
            };
        }
    }
    deltas
}
