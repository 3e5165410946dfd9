use serde::{Deserialize, Serialize};

/// Base points of a nagashi mangan (a mangan tsumo).
pub const NAGASHI_BASE_POINTS: u32 = 2000;

/// Payment breakdown for a single win.
///
/// `pay_ron` is set for a ron, `pay_tsumo_oya`/`pay_tsumo_ko` for a tsumo.
/// When the winner is the dealer every payer is a ko and `pay_tsumo_oya` is 0.
/// Amounts are `i64` so that any `u32` honba count fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    pub total: i64,
    pub pay_ron: i64,
    pub pay_tsumo_oya: i64,
    pub pay_tsumo_ko: i64,
}

/// Base points for `fu`/`han`, with the limit-hand caps applied.
///
/// Below mangan the raw value `fu * 2^(han + 2)` is clamped at 2000; 30 fu
/// 4 han stays at 1920 (no kiriage).
pub fn base_points(fu: u32, han: u32) -> u32 {
    match han {
        13.. => 8000,        // Yakuman
        11 | 12 => 6000,     // Sanbaiman
        8..=10 => 4000,      // Baiman
        6 | 7 => 3000,       // Haneman
        5 => 2000,           // Mangan
        _ => {
            let raw = u64::from(fu) << (han + 2);
            raw.min(2000) as u32
        }
    }
}

/// Rounds non-negative points up to the next multiple of 100.
pub fn round_up_100(points: i64) -> i64 {
    (points + 99).div_euclid(100) * 100
}

/// Payments for a win worth `base` points, honba included.
///
/// Every payment is rounded on its own before honba is added: 300 per honba
/// on a ron, 100 per honba from each payer on a tsumo.
pub fn calculate_score(base: u32, is_oya: bool, is_tsumo: bool, honba: u32) -> Score {
    let mut s = make_score_result(base, is_oya, is_tsumo);
    let honba = i64::from(honba);

    if is_tsumo {
        if !is_oya {
            s.pay_tsumo_oya += honba * 100;
        }
        s.pay_tsumo_ko += honba * 100;
        s.total += honba * 300;
    } else {
        s.pay_ron += honba * 300;
        s.total += honba * 300;
    }
    s
}

/// Sum of the three tsumo payments for `base`, without honba.
pub fn tsumo_total(base: u32, is_oya: bool) -> i64 {
    make_score_result(base, is_oya, true).total
}

fn make_score_result(base: u32, is_oya: bool, is_tsumo: bool) -> Score {
    let base = i64::from(base);
    if is_tsumo {
        let (pay_oya, pay_ko) = if is_oya {
            (0, round_up_100(base * 2))
        } else {
            (round_up_100(base * 2), round_up_100(base))
        };
        let total = if is_oya {
            pay_ko * 3
        } else {
            pay_oya + pay_ko * 2
        };
        Score {
            total,
            pay_ron: 0,
            pay_tsumo_oya: pay_oya,
            pay_tsumo_ko: pay_ko,
        }
    } else {
        let total = round_up_100(base * if is_oya { 6 } else { 4 });
        Score {
            total,
            pay_ron: total,
            pay_tsumo_oya: 0,
            pay_tsumo_ko: 0,
        }
    }
}
