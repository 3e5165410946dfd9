use thiserror::Error;

use crate::types::{NewRound, Seat};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettleError {
    /// 翻数が 1 未満の手
    #[error("invalid hand: {fu} fu {han} han")]
    InvalidHand { fu: u32, han: u32 },
    /// 席番号が 0-3 の範囲外、または同一取引内で重複
    #[error("invalid seat {seat}: {message}")]
    InvalidSeat { seat: Seat, message: String },
    /// 局番号が 1-4 の範囲外
    #[error("invalid round number {0}, expected 1-4")]
    InvalidRoundNumber(u8),
    /// 終了済みの対局への操作
    #[error("match has already concluded")]
    AlreadyConcluded,
    /// 記録しようとした局が次局と一致しない
    #[error("round mismatch: expected {expected}, got {actual}")]
    RoundMismatch { expected: NewRound, actual: NewRound },
    /// 読み込んだ記録が精算結果と一致しない
    #[error("inconsistent round record: {0}")]
    InconsistentRecord(String),
}

pub type SettleResult<T> = Result<T, SettleError>;

impl SettleError {
    pub(crate) fn seat(seat: Seat, message: impl Into<String>) -> Self {
        SettleError::InvalidSeat {
            seat,
            message: message.into(),
        }
    }
}
