use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{SettleError, SettleResult};
use crate::ledger::RoundLedger;

/// Number of seats at the table.
pub const NP: usize = 4;

/// Absolute seat index (0-3). Seats keep their identity for the whole match.
pub type Seat = u8;

/// Point deltas indexed by absolute seat.
pub type ScoreDeltas = [i64; NP];

pub(crate) fn check_seat(seat: Seat) -> SettleResult<Seat> {
    if (seat as usize) < NP {
        Ok(seat)
    } else {
        Err(SettleError::seat(seat, "seat must be in 0-3"))
    }
}

/// Represents wind directions in mahjong, used for the round wind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Wind {
    #[default]
    East = 0,
    South = 1,
    West = 2,
    North = 3,
}

impl Wind {
    /// The wind that follows this one; North wraps back to East.
    pub fn next(self) -> Wind {
        Wind::from(self as u8 + 1)
    }
}

impl From<u8> for Wind {
    fn from(val: u8) -> Self {
        match val % 4 {
            0 => Wind::East,
            1 => Wind::South,
            2 => Wind::West,
            3 => Wind::North,
            _ => unreachable!(),
        }
    }
}

impl fmt::Display for Wind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Wind::East => "East",
            Wind::South => "South",
            Wind::West => "West",
            Wind::North => "North",
        };
        f.write_str(name)
    }
}

/// Header of a hand that is about to be played.
///
/// The dealer is always seat `round_number - 1`: the seat/dealer mapping
/// restarts with every wind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "NewRoundFields")]
pub struct NewRound {
    round_wind: Wind,
    round_number: u8,
    honba: u32,
    start_riichi_stick_count: u32,
}

#[derive(Deserialize)]
struct NewRoundFields {
    round_wind: Wind,
    round_number: u8,
    honba: u32,
    start_riichi_stick_count: u32,
}

impl TryFrom<NewRoundFields> for NewRound {
    type Error = SettleError;

    fn try_from(f: NewRoundFields) -> SettleResult<Self> {
        NewRound::new(
            f.round_wind,
            f.round_number,
            f.honba,
            f.start_riichi_stick_count,
        )
    }
}

impl NewRound {
    pub fn new(
        round_wind: Wind,
        round_number: u8,
        honba: u32,
        start_riichi_stick_count: u32,
    ) -> SettleResult<Self> {
        if !(1..=4).contains(&round_number) {
            return Err(SettleError::InvalidRoundNumber(round_number));
        }
        Ok(Self {
            round_wind,
            round_number,
            honba,
            start_riichi_stick_count,
        })
    }

    /// East 1, no honba, no sticks on the table.
    pub fn first() -> Self {
        Self {
            round_wind: Wind::East,
            round_number: 1,
            honba: 0,
            start_riichi_stick_count: 0,
        }
    }

    pub fn round_wind(&self) -> Wind {
        self.round_wind
    }

    pub fn round_number(&self) -> u8 {
        self.round_number
    }

    pub fn honba(&self) -> u32 {
        self.honba
    }

    pub fn start_riichi_stick_count(&self) -> u32 {
        self.start_riichi_stick_count
    }

    pub fn dealer(&self) -> Seat {
        (self.round_number - 1) % NP as u8
    }

    /// The following hand. Without a renchan the deal passes on, and after
    /// the 4th hand the round wind advances.
    pub(crate) fn successor(&self, renchan: bool, honba: u32, riichi_sticks: u32) -> NewRound {
        let (round_wind, round_number) = if renchan {
            (self.round_wind, self.round_number)
        } else if self.round_number as usize == NP {
            (self.round_wind.next(), 1)
        } else {
            (self.round_wind, self.round_number + 1)
        };
        NewRound {
            round_wind,
            round_number,
            honba,
            start_riichi_stick_count: riichi_sticks,
        }
    }
}

impl Default for NewRound {
    fn default() -> Self {
        Self::first()
    }
}

impl fmt::Display for NewRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({} honba, {} sticks)",
            self.round_wind, self.round_number, self.honba, self.start_riichi_stick_count
        )
    }
}

/// An already evaluated winning hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hand {
    pub fu: u32,
    pub han: u32,
}

impl Hand {
    pub fn new(fu: u32, han: u32) -> SettleResult<Self> {
        let hand = Hand { fu, han };
        hand.validate()?;
        Ok(hand)
    }

    pub(crate) fn validate(&self) -> SettleResult<()> {
        if self.han == 0 {
            return Err(SettleError::InvalidHand {
                fu: self.fu,
                han: self.han,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    DealIn,
    SelfDraw,
    DealInPao,
    SelfDrawPao,
    NagashiMangan,
}

/// One recorded hand event with the seats it involves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionKind {
    DealIn {
        winner: Seat,
        payer: Seat,
        hand: Hand,
    },
    SelfDraw {
        winner: Seat,
        hand: Hand,
    },
    DealInPao {
        winner: Seat,
        payer: Seat,
        pao_target: Seat,
        hand: Hand,
    },
    SelfDrawPao {
        winner: Seat,
        pao_target: Seat,
        hand: Hand,
    },
    NagashiMangan {
        seat: Seat,
    },
}

impl TransactionKind {
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            TransactionKind::DealIn { .. } => TransactionType::DealIn,
            TransactionKind::SelfDraw { .. } => TransactionType::SelfDraw,
            TransactionKind::DealInPao { .. } => TransactionType::DealInPao,
            TransactionKind::SelfDrawPao { .. } => TransactionType::SelfDrawPao,
            TransactionKind::NagashiMangan { .. } => TransactionType::NagashiMangan,
        }
    }

    /// The receiving seat. For nagashi mangan this is the declaring seat.
    pub fn winner(&self) -> Seat {
        match *self {
            TransactionKind::DealIn { winner, .. }
            | TransactionKind::SelfDraw { winner, .. }
            | TransactionKind::DealInPao { winner, .. }
            | TransactionKind::SelfDrawPao { winner, .. } => winner,
            TransactionKind::NagashiMangan { seat } => seat,
        }
    }

    pub fn payer(&self) -> Option<Seat> {
        match *self {
            TransactionKind::DealIn { payer, .. } | TransactionKind::DealInPao { payer, .. } => {
                Some(payer)
            }
            _ => None,
        }
    }

    pub fn hand(&self) -> Option<Hand> {
        match *self {
            TransactionKind::DealIn { hand, .. }
            | TransactionKind::SelfDraw { hand, .. }
            | TransactionKind::DealInPao { hand, .. }
            | TransactionKind::SelfDrawPao { hand, .. } => Some(hand),
            TransactionKind::NagashiMangan { .. } => None,
        }
    }

    pub fn pao_target(&self) -> Option<Seat> {
        match *self {
            TransactionKind::DealInPao { pao_target, .. }
            | TransactionKind::SelfDrawPao { pao_target, .. } => Some(pao_target),
            _ => None,
        }
    }

    /// True for every kind except nagashi mangan.
    pub fn is_win(&self) -> bool {
        !matches!(self, TransactionKind::NagashiMangan { .. })
    }

    pub(crate) fn validate(&self) -> SettleResult<()> {
        let seats = [Some(self.winner()), self.payer(), self.pao_target()];
        let mut seen = [false; NP];
        for seat in seats.into_iter().flatten() {
            check_seat(seat)?;
            if seen[seat as usize] {
                return Err(SettleError::seat(
                    seat,
                    "seat appears twice in one transaction",
                ));
            }
            seen[seat as usize] = true;
        }
        if let Some(hand) = self.hand() {
            hand.validate()?;
        }
        Ok(())
    }
}

/// A settled hand event. `score_deltas` always sums to zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TransactionFields")]
pub struct Transaction {
    kind: TransactionKind,
    score_deltas: ScoreDeltas,
}

#[derive(Deserialize)]
struct TransactionFields {
    kind: TransactionKind,
    score_deltas: ScoreDeltas,
}

impl TryFrom<TransactionFields> for Transaction {
    type Error = SettleError;

    fn try_from(f: TransactionFields) -> SettleResult<Self> {
        f.kind.validate()?;
        if f.score_deltas.iter().sum::<i64>() != 0 {
            return Err(SettleError::InconsistentRecord(format!(
                "{:?} deltas {:?} do not sum to zero",
                f.kind.transaction_type(),
                f.score_deltas
            )));
        }
        Ok(Transaction::new(f.kind, f.score_deltas))
    }
}

impl Transaction {
    pub(crate) fn new(kind: TransactionKind, score_deltas: ScoreDeltas) -> Self {
        debug_assert_eq!(score_deltas.iter().sum::<i64>(), 0);
        Self { kind, score_deltas }
    }

    pub fn kind(&self) -> &TransactionKind {
        &self.kind
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.kind.transaction_type()
    }

    pub fn winner(&self) -> Seat {
        self.kind.winner()
    }

    pub fn hand(&self) -> Option<Hand> {
        self.kind.hand()
    }

    pub fn pao_target(&self) -> Option<Seat> {
        self.kind.pao_target()
    }

    pub fn is_win(&self) -> bool {
        self.kind.is_win()
    }

    pub fn score_deltas(&self) -> &ScoreDeltas {
        &self.score_deltas
    }
}

/// The frozen outcome of one hand, produced by
/// [`RoundLedger::conclude_round`].
///
/// A deserialized value is settled again from its header and events and
/// rejected unless every stored amount matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConcludedRoundFields")]
pub struct ConcludedRound {
    round: NewRound,
    riichis: BTreeSet<Seat>,
    tenpais: BTreeSet<Seat>,
    end_riichi_stick_count: u32,
    transactions: Vec<Transaction>,
    draw_payments: ScoreDeltas,
}

#[derive(Deserialize)]
struct ConcludedRoundFields {
    round: NewRound,
    riichis: BTreeSet<Seat>,
    tenpais: BTreeSet<Seat>,
    end_riichi_stick_count: u32,
    transactions: Vec<Transaction>,
    draw_payments: ScoreDeltas,
}

impl TryFrom<ConcludedRoundFields> for ConcludedRound {
    type Error = SettleError;

    fn try_from(f: ConcludedRoundFields) -> SettleResult<Self> {
        let mut ledger = RoundLedger::new(f.round);
        ledger.set_riichis(f.riichis.iter().copied())?;
        ledger.set_tenpais(f.tenpais.iter().copied())?;
        for transaction in &f.transactions {
            ledger.record(transaction.kind)?;
        }
        let settled = ledger.conclude_round();

        if settled.end_riichi_stick_count != f.end_riichi_stick_count {
            return Err(SettleError::InconsistentRecord(format!(
                "end riichi sticks {} should be {}",
                f.end_riichi_stick_count, settled.end_riichi_stick_count
            )));
        }
        if settled.draw_payments != f.draw_payments {
            return Err(SettleError::InconsistentRecord(format!(
                "draw payments {:?} should be {:?}",
                f.draw_payments, settled.draw_payments
            )));
        }
        let stored = f.transactions.iter().map(Transaction::score_deltas);
        for (i, (settled_deltas, stored)) in settled
            .transactions
            .iter()
            .map(Transaction::score_deltas)
            .zip(stored)
            .enumerate()
        {
            if settled_deltas != stored {
                return Err(SettleError::InconsistentRecord(format!(
                    "transaction {i} deltas {stored:?} should be {settled_deltas:?}"
                )));
            }
        }
        Ok(settled)
    }
}

impl ConcludedRound {
    pub(crate) fn new(
        round: NewRound,
        riichis: BTreeSet<Seat>,
        tenpais: BTreeSet<Seat>,
        end_riichi_stick_count: u32,
        transactions: Vec<Transaction>,
        draw_payments: ScoreDeltas,
    ) -> Self {
        Self {
            round,
            riichis,
            tenpais,
            end_riichi_stick_count,
            transactions,
            draw_payments,
        }
    }

    /// The header this hand was played under.
    pub fn header(&self) -> &NewRound {
        &self.round
    }

    pub fn round_wind(&self) -> Wind {
        self.round.round_wind()
    }

    pub fn round_number(&self) -> u8 {
        self.round.round_number()
    }

    pub fn honba(&self) -> u32 {
        self.round.honba()
    }

    pub fn start_riichi_stick_count(&self) -> u32 {
        self.round.start_riichi_stick_count()
    }

    pub fn dealer(&self) -> Seat {
        self.round.dealer()
    }

    pub fn riichis(&self) -> &BTreeSet<Seat> {
        &self.riichis
    }

    /// Only meaningful when the hand has no win transaction.
    pub fn tenpais(&self) -> &BTreeSet<Seat> {
        &self.tenpais
    }

    pub fn end_riichi_stick_count(&self) -> u32 {
        self.end_riichi_stick_count
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Tenpai/noten settlement of a drawn hand; zeros when anything was won.
    pub fn draw_payments(&self) -> &ScoreDeltas {
        &self.draw_payments
    }

    /// True if any deal-in or self-draw (pao included) was recorded.
    /// Nagashi mangan does not count as a win.
    pub fn has_win(&self) -> bool {
        self.transactions.iter().any(Transaction::is_win)
    }

    pub fn winning_seats(&self) -> BTreeSet<Seat> {
        self.transactions
            .iter()
            .filter(|t| t.is_win())
            .map(Transaction::winner)
            .collect()
    }
}
