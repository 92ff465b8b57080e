use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, AnalysisResult};
use crate::rule::Ruleset;

/// Point totals for one win. Ron wins fill `pay_ron`; tsumo wins fill the
/// per-payer fields. `total` always holds the winner's take before riichi
/// sticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub total: u32,
    pub pay_ron: u32,
    pub pay_tsumo_oya: u32,
    pub pay_tsumo_ko: u32,
}

/// Map (han, fu) to payments. Honba is folded in: 100 per payer on tsumo,
/// the full bounty on ron.
pub fn calculate_score(
    han: u8,
    fu: u8,
    is_dealer: bool,
    is_tsumo: bool,
    honba: u32,
    rule: &Ruleset,
) -> AnalysisResult<Score> {
    // Fu is irrelevant from mangan up; below it, it must be a table entry.
    if han == 0 || (han < 5 && !fu_valid(fu)) {
        return Err(AnalysisError::RulesetMissing { han, fu });
    }
    let players = rule.num_players as u32;
    let payers = players - 1;

    let base = if han >= 5 {
        match han {
            5 => 2000,
            6 | 7 => 3000,
            8..=10 => 4000,
            11 | 12 => 6000,
            _ => 8000 * (han as u32 / 13),
        }
    } else if rule.kiriage_mangan && ((han == 4 && fu == 30) || (han == 3 && fu == 60)) {
        2000
    } else {
        let bp = (fu as u32) * (1 << (2 + han as u32));
        bp.min(2000)
    };

    let mut s = split_base(base, is_dealer, is_tsumo, players);

    if is_tsumo {
        s.pay_tsumo_oya += honba * 100;
        s.pay_tsumo_ko += honba * 100;
        s.total += honba * 100 * payers;
    } else {
        s.pay_ron += honba * 100 * payers;
        s.total += honba * 100 * payers;
    }
    Ok(s)
}

fn fu_valid(fu: u8) -> bool {
    fu == 25 || (fu >= 20 && fu <= 110 && fu % 10 == 0)
}

fn split_base(base: u32, is_dealer: bool, is_tsumo: bool, players: u32) -> Score {
    let total_ron = if is_dealer {
        ceil_100(base * 6)
    } else {
        ceil_100(base * 4)
    };

    let (pay_oya, pay_ko) = if is_dealer {
        (0, ceil_100(base * 2))
    } else {
        (ceil_100(base * 2), ceil_100(base))
    };

    let total_tsumo = if is_dealer {
        pay_ko * (players - 1)
    } else {
        pay_oya + pay_ko * (players - 2)
    };

    if is_tsumo {
        Score {
            total: total_tsumo,
            pay_ron: 0,
            pay_tsumo_oya: pay_oya,
            pay_tsumo_ko: pay_ko,
        }
    } else {
        Score {
            total: total_ron,
            pay_ron: total_ron,
            pay_tsumo_oya: 0,
            pay_tsumo_ko: 0,
        }
    }
}

fn ceil_100(val: u32) -> u32 {
    val.div_ceil(100) * 100
}

/// Per-seat deltas for one win. `dealt_in` is `None` on tsumo. Riichi
/// sticks come from the table pot, so they raise the sum above zero; the
/// honba bounty inside `score` stays zero-sum.
pub fn payment_deltas(
    score: &Score,
    winner: u8,
    dealt_in: Option<u8>,
    dealer: u8,
    players: u8,
    riichi_sticks: u32,
    pao: Option<u8>,
) -> Vec<i32> {
    let mut deltas = vec![0i32; players as usize];

    match dealt_in {
        None => {
            if let Some(liable) = pao {
                // Responsibility payment: the liable seat covers the whole
                // tsumo alone.
                deltas[liable as usize] -= score.total as i32;
            } else {
                for seat in 0..players {
                    if seat == winner {
                        continue;
                    }
                    let pay = if seat == dealer {
                        score.pay_tsumo_oya
                    } else {
                        score.pay_tsumo_ko
                    };
                    deltas[seat as usize] -= pay as i32;
                }
            }
        }
        Some(payer) => {
            if let Some(liable) = pao {
                let half = ceil_100(score.pay_ron / 2);
                deltas[liable as usize] -= half as i32;
                deltas[payer as usize] -= (score.pay_ron - half) as i32;
            } else {
                deltas[payer as usize] -= score.pay_ron as i32;
            }
        }
    }

    deltas[winner as usize] = score.total as i32 + (riichi_sticks * 1000) as i32;
    deltas
}
