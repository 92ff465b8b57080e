use serde::{Deserialize, Serialize};

use crate::hand::{Call, CallKind};
use crate::tile::{index_is_suited, index_rank, TILE_KINDS};

/// A complete block in a standard-form division, named by the dense index
/// of its lowest tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Block {
    Run(u8),
    Triplet(u8),
}

/// One interpretation of a concealed 3n+2 part as blocks plus a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Division {
    pub pair: u8,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitKind {
    Ryanmen,
    Kanchan,
    Penchan,
    Shanpon,
    Tanki,
}

/// Enumerate every standard-form division of the concealed counts.
/// The array must hold a 3n+2 multiset; incomplete hands yield nothing.
pub fn divisions(counts: &[u8; TILE_KINDS]) -> Vec<Division> {
    let mut out: Vec<Division> = Vec::new();
    let mut c = *counts;
    for pair in 0..TILE_KINDS {
        if c[pair] < 2 {
            continue;
        }
        c[pair] -= 2;
        let mut blocks = Vec::new();
        extract_blocks(&mut c, &mut blocks, pair as u8, &mut out);
        c[pair] += 2;
    }
    out
}

fn extract_blocks(
    c: &mut [u8; TILE_KINDS],
    blocks: &mut Vec<Block>,
    pair: u8,
    out: &mut Vec<Division>,
) {
    // Work from the lowest remaining tile; every block containing it starts
    // there, so the search stays complete without revisiting permutations.
    let i = match c.iter().position(|&n| n > 0) {
        Some(i) => i,
        None => {
            let mut sorted = blocks.clone();
            sorted.sort_unstable();
            let division = Division {
                pair,
                blocks: sorted,
            };
            if !out.contains(&division) {
                out.push(division);
            }
            return;
        }
    };
    if c[i] >= 3 {
        c[i] -= 3;
        blocks.push(Block::Triplet(i as u8));
        extract_blocks(c, blocks, pair, out);
        blocks.pop();
        c[i] += 3;
    }
    if index_is_suited(i) && index_rank(i) <= 6 && c[i + 1] > 0 && c[i + 2] > 0 {
        c[i] -= 1;
        c[i + 1] -= 1;
        c[i + 2] -= 1;
        blocks.push(Block::Run(i as u8));
        extract_blocks(c, blocks, pair, out);
        blocks.pop();
        c[i] += 1;
        c[i + 1] += 1;
        c[i + 2] += 1;
    }
}

/// The groups a winning tile can complete within a division: `None` for the
/// pair (tanki), `Some(index)` for a block.
pub fn winning_groups(division: &Division, win: u8) -> Vec<Option<usize>> {
    let mut out = Vec::new();
    if division.pair == win {
        out.push(None);
    }
    for (idx, block) in division.blocks.iter().enumerate() {
        let hit = match *block {
            Block::Triplet(t) => t == win,
            Block::Run(t) => win >= t && win <= t + 2,
        };
        if hit {
            out.push(Some(idx));
        }
    }
    out
}

pub fn wait_kind(division: &Division, group: Option<usize>, win: u8) -> WaitKind {
    match group {
        None => WaitKind::Tanki,
        Some(idx) => match division.blocks[idx] {
            Block::Triplet(_) => WaitKind::Shanpon,
            Block::Run(t) => {
                if win == t + 1 {
                    WaitKind::Kanchan
                } else if (win == t + 2 && index_rank(t as usize) == 0)
                    || (win == t && index_rank(t as usize) == 6)
                {
                    WaitKind::Penchan
                } else {
                    WaitKind::Ryanmen
                }
            }
        },
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FuContext {
    /// Dense indices (27..=30) of the round and seat winds.
    pub round_wind: u8,
    pub seat_wind: u8,
    pub tsumo: bool,
    pub menzen: bool,
}

fn is_yaochuu_index(i: u8) -> bool {
    let i = i as usize;
    i >= 27 || i % 9 == 0 || i % 9 == 8
}

/// Fu for one interpretation, rounded up to the next 10.
///
/// Pinfu hands bypass this and score a flat 30 (ron) / 20 (tsumo);
/// seven pairs are a flat 25.
pub fn calculate_fu(
    division: &Division,
    group: Option<usize>,
    win: u8,
    calls: &[Call],
    ctx: &FuContext,
) -> u8 {
    let mut fu: u8 = 20;
    if ctx.tsumo {
        fu += 2;
    } else if ctx.menzen {
        fu += 10;
    }

    // Pair fu: round wind and seat wind stack when they coincide.
    if division.pair == ctx.round_wind {
        fu += 2;
    }
    if division.pair == ctx.seat_wind {
        fu += 2;
    }
    if division.pair >= 31 {
        fu += 2;
    }

    match wait_kind(division, group, win) {
        WaitKind::Kanchan | WaitKind::Penchan | WaitKind::Tanki => fu += 2,
        WaitKind::Ryanmen | WaitKind::Shanpon => {}
    }

    for (idx, block) in division.blocks.iter().enumerate() {
        if let Block::Triplet(t) = *block {
            // A triplet completed by ron counts as open.
            let mut f = if !ctx.tsumo && group == Some(idx) { 2 } else { 4 };
            if is_yaochuu_index(t) {
                f *= 2;
            }
            fu += f;
        }
    }
    for call in calls {
        match call.kind {
            CallKind::Pon => {
                let mut f = 2;
                if is_yaochuu_index(call.tiles[0].index() as u8) {
                    f *= 2;
                }
                fu += f;
            }
            CallKind::Minkan | CallKind::Kakan => {
                let mut f = 8;
                if is_yaochuu_index(call.tiles[0].index() as u8) {
                    f *= 2;
                }
                fu += f;
            }
            CallKind::Ankan => {
                let mut f = 16;
                if is_yaochuu_index(call.tiles[0].index() as u8) {
                    f *= 2;
                }
                fu += f;
            }
            CallKind::Chii | CallKind::Kita => {}
        }
    }

    // An open hand with nothing else still pays 30 on ron.
    if fu == 20 && !ctx.tsumo {
        fu = 30;
    }

    fu.div_ceil(10) * 10
}

/// All runs, a valueless pair, a two-sided wait, and no exposing calls.
pub fn is_pinfu(
    division: &Division,
    group: Option<usize>,
    win: u8,
    calls: &[Call],
    ctx: &FuContext,
) -> bool {
    if !ctx.menzen || calls.iter().any(|c| c.kind != CallKind::Kita) {
        return false;
    }
    if division
        .blocks
        .iter()
        .any(|b| matches!(b, Block::Triplet(_)))
    {
        return false;
    }
    if division.pair >= 31
        || division.pair == ctx.round_wind
        || division.pair == ctx.seat_wind
    {
        return false;
    }
    wait_kind(division, group, win) == WaitKind::Ryanmen
}
