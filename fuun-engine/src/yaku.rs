use serde::{Deserialize, Serialize};

use crate::decompose::{
    calculate_fu, divisions, is_pinfu, winning_groups, Block, Division, FuContext,
};
use crate::errors::{AnalysisError, AnalysisResult};
use crate::hand::{Call, CallKind, HandShape};
use crate::rule::Ruleset;
use crate::shanten::{calc_chiitoi, calc_kokushi};
use crate::tile::{to_counts, Tile, EAST, TILE_KINDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Yaku {
    // Closed-only
    Riichi,
    DoubleRiichi,
    Ippatsu,
    MenzenTsumo,
    Pinfu,
    Iipeikou,
    Ryanpeikou,
    Chiitoitsu,
    // Any hand
    Tanyao,
    Haku,
    Hatsu,
    Chun,
    RoundWind,
    SeatWind,
    Sanshoku,
    SanshokuDoukou,
    Ittsu,
    Chanta,
    Junchan,
    Toitoi,
    Sanankou,
    Sankantsu,
    Shousangen,
    Honroutou,
    Honitsu,
    Chinitsu,
    // Situational
    Rinshan,
    Chankan,
    Haitei,
    Houtei,
    // Dora categories
    Dora,
    AkaDora,
    UraDora,
    KitaDora,
    // Yakuman
    KokushiMusou,
    KokushiMusou13Wait,
    Suuankou,
    SuuankouTanki,
    Daisangen,
    Shousuushi,
    Daisuushi,
    Tsuuiisou,
    Ryuuiisou,
    Chinroutou,
    ChuurenPoutou,
    ChuurenPoutou9Wait,
    Suukantsu,
    Tenhou,
    Chiihou,
    Renhou,
}

impl Yaku {
    pub fn is_yakuman(self) -> bool {
        matches!(
            self,
            Yaku::KokushiMusou
                | Yaku::KokushiMusou13Wait
                | Yaku::Suuankou
                | Yaku::SuuankouTanki
                | Yaku::Daisangen
                | Yaku::Shousuushi
                | Yaku::Daisuushi
                | Yaku::Tsuuiisou
                | Yaku::Ryuuiisou
                | Yaku::Chinroutou
                | Yaku::ChuurenPoutou
                | Yaku::ChuurenPoutou9Wait
                | Yaku::Suukantsu
                | Yaku::Tenhou
                | Yaku::Chiihou
                | Yaku::Renhou
        )
    }

    pub fn is_dora(self) -> bool {
        matches!(self, Yaku::Dora | Yaku::AkaDora | Yaku::UraDora | Yaku::KitaDora)
    }

    pub fn name(self) -> &'static str {
        match self {
            Yaku::Riichi => "Riichi",
            Yaku::DoubleRiichi => "Double Riichi",
            Yaku::Ippatsu => "Ippatsu",
            Yaku::MenzenTsumo => "Menzen Tsumo",
            Yaku::Pinfu => "Pinfu",
            Yaku::Iipeikou => "Iipeikou",
            Yaku::Ryanpeikou => "Ryanpeikou",
            Yaku::Chiitoitsu => "Chiitoitsu",
            Yaku::Tanyao => "Tanyao",
            Yaku::Haku => "Haku",
            Yaku::Hatsu => "Hatsu",
            Yaku::Chun => "Chun",
            Yaku::RoundWind => "Round Wind",
            Yaku::SeatWind => "Seat Wind",
            Yaku::Sanshoku => "Sanshoku Doujun",
            Yaku::SanshokuDoukou => "Sanshoku Doukou",
            Yaku::Ittsu => "Ittsu",
            Yaku::Chanta => "Chanta",
            Yaku::Junchan => "Junchan",
            Yaku::Toitoi => "Toitoi",
            Yaku::Sanankou => "Sanankou",
            Yaku::Sankantsu => "Sankantsu",
            Yaku::Shousangen => "Shousangen",
            Yaku::Honroutou => "Honroutou",
            Yaku::Honitsu => "Honitsu",
            Yaku::Chinitsu => "Chinitsu",
            Yaku::Rinshan => "Rinshan Kaihou",
            Yaku::Chankan => "Chankan",
            Yaku::Haitei => "Haitei Raoyue",
            Yaku::Houtei => "Houtei Raoyui",
            Yaku::Dora => "Dora",
            Yaku::AkaDora => "Aka Dora",
            Yaku::UraDora => "Ura Dora",
            Yaku::KitaDora => "Kita Dora",
            Yaku::KokushiMusou => "Kokushi Musou",
            Yaku::KokushiMusou13Wait => "Kokushi Musou 13-wait",
            Yaku::Suuankou => "Suuankou",
            Yaku::SuuankouTanki => "Suuankou Tanki",
            Yaku::Daisangen => "Daisangen",
            Yaku::Shousuushi => "Shousuushi",
            Yaku::Daisuushi => "Daisuushi",
            Yaku::Tsuuiisou => "Tsuuiisou",
            Yaku::Ryuuiisou => "Ryuuiisou",
            Yaku::Chinroutou => "Chinroutou",
            Yaku::ChuurenPoutou => "Chuuren Poutou",
            Yaku::ChuurenPoutou9Wait => "Chuuren Poutou 9-wait",
            Yaku::Suukantsu => "Suukantsu",
            Yaku::Tenhou => "Tenhou",
            Yaku::Chiihou => "Chiihou",
            Yaku::Renhou => "Renhou",
        }
    }
}

/// Ambient state of the win being evaluated.
#[derive(Debug, Clone)]
pub struct WinContext {
    pub rule: Ruleset,
    pub round_wind: Tile,
    pub seat_wind: Tile,
    pub tsumo: bool,
    pub riichi: bool,
    pub double_riichi: bool,
    pub ippatsu: bool,
    pub haitei: bool,
    pub houtei: bool,
    pub rinshan: bool,
    pub chankan: bool,
    /// Uninterrupted first go-around (tenhou / chiihou / renhou).
    pub first_turn: bool,
    pub dora_indicators: Vec<Tile>,
    pub ura_indicators: Vec<Tile>,
}

impl Default for WinContext {
    fn default() -> Self {
        Self {
            rule: Ruleset::default(),
            round_wind: EAST,
            seat_wind: EAST,
            tsumo: false,
            riichi: false,
            double_riichi: false,
            ippatsu: false,
            haitei: false,
            houtei: false,
            rinshan: false,
            chankan: false,
            first_turn: false,
            dora_indicators: Vec::new(),
            ura_indicators: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinEvaluation {
    pub yaku: Vec<(Yaku, u8)>,
    pub han: u8,
    pub fu: u8,
    /// Stacked yakuman multiples; zero for ordinary hands.
    pub yakuman: u8,
    /// Only dora categories present: the win carries no qualifying yaku.
    pub yakuless: bool,
}

impl WinEvaluation {
    fn empty() -> Self {
        Self {
            yaku: Vec::new(),
            han: 0,
            fu: 0,
            yakuman: 0,
            yakuless: true,
        }
    }

    fn add(&mut self, yaku: Yaku, han: u8) {
        self.yaku.push((yaku, han));
        self.han += han;
    }

    fn better_than(&self, other: &WinEvaluation) -> bool {
        (self.yakuman, self.han, self.fu) > (other.yakuman, other.han, other.fu)
    }
}

/// Evaluate every wait of a tenpai hand.
pub fn evaluate_waits(
    hand: &HandShape,
    ctx: &WinContext,
) -> AnalysisResult<Vec<(Tile, WinEvaluation)>> {
    if !hand.shanten().is_tenpai() {
        return Err(AnalysisError::MalformedInput {
            context: "yaku".to_string(),
            message: "wait evaluation requires a tenpai hand".to_string(),
        });
    }
    hand.relevant_tiles()
        .iter()
        .map(|&w| evaluate_win(hand, w, ctx).map(|e| (w, e)))
        .collect()
}

/// Evaluate a completed win: a canonical 13-tile-shape hand plus the
/// winning tile. Ties between interpretations resolve toward the higher
/// han, then the higher fu (takame).
pub fn evaluate_win(
    hand: &HandShape,
    win_tile: Tile,
    ctx: &WinContext,
) -> AnalysisResult<WinEvaluation> {
    if hand.awaits_discard() {
        return Err(AnalysisError::MalformedInput {
            context: "yaku".to_string(),
            message: "win evaluation expects the winning tile separately".to_string(),
        });
    }
    let mut counts = to_counts(hand.tiles());
    if counts[win_tile.index()] >= 4 {
        return Err(AnalysisError::MalformedInput {
            context: "yaku".to_string(),
            message: format!("fifth copy of {} as the winning tile", win_tile),
        });
    }
    counts[win_tile.index()] += 1;
    let calls = hand.calls();
    let menzen = hand.is_closed();
    let win = win_tile.index() as u8;

    let divs = divisions(&counts);
    let mut best = WinEvaluation::empty();

    if divs.is_empty() {
        if calc_kokushi(&counts) == -1 {
            best = evaluate_kokushi(&counts, win, ctx);
        } else if calc_chiitoi(&counts) == -1
            && calls.iter().all(|c| c.kind == CallKind::Kita)
        {
            best = evaluate_chiitoi(&counts, ctx);
        } else {
            return Err(AnalysisError::InvariantViolation {
                hand: hand_string(hand, win_tile),
                message: "no winning decomposition".to_string(),
            });
        }
    } else {
        for div in &divs {
            for group in winning_groups(div, win) {
                let candidate = evaluate_division(&counts, div, group, win, calls, menzen, ctx);
                if candidate.better_than(&best) {
                    best = candidate;
                }
            }
        }
    }

    if best.yakuman > 0 {
        best.han = 13 * best.yakuman;
        best.fu = 0;
        best.yakuless = false;
        return Ok(best);
    }

    best.yakuless = !best.yaku.iter().any(|(y, _)| !y.is_dora());
    apply_dora(&mut best, hand, win_tile, ctx);
    Ok(best)
}

fn hand_string(hand: &HandShape, win: Tile) -> String {
    let mut s: String = hand.tiles().iter().map(|t| t.to_string()).collect();
    s.push('+');
    s.push_str(&win.to_string());
    s
}

fn evaluate_kokushi(counts: &[u8; TILE_KINDS], win: u8, ctx: &WinContext) -> WinEvaluation {
    let mut res = WinEvaluation::empty();
    if counts[win as usize] == 2 {
        res.yakuman = if ctx.rule.kokushi_13_wait_double { 2 } else { 1 };
        res.yaku.push((Yaku::KokushiMusou13Wait, 13 * res.yakuman));
    } else {
        res.yakuman = 1;
        res.yaku.push((Yaku::KokushiMusou, 13));
    }
    apply_first_turn_yakuman(&mut res, ctx);
    res
}

fn evaluate_chiitoi(counts: &[u8; TILE_KINDS], ctx: &WinContext) -> WinEvaluation {
    let mut res = WinEvaluation::empty();

    if counts.iter().take(27).all(|&n| n == 0) {
        res.yakuman = 1;
        res.yaku.push((Yaku::Tsuuiisou, 13));
        apply_first_turn_yakuman(&mut res, ctx);
        return res;
    }

    res.fu = 25;
    res.add(Yaku::Chiitoitsu, 2);
    if all_simple(counts, &[]) {
        res.add(Yaku::Tanyao, 1);
    }
    if one_suit_only(counts, &[]) {
        res.add(Yaku::Chinitsu, 6);
    } else if one_suit_plus_honors(counts, &[]) {
        res.add(Yaku::Honitsu, 3);
    }
    if all_yaochuu(counts, &[]) {
        res.add(Yaku::Honroutou, 2);
    }
    apply_situational(&mut res, true, ctx);
    apply_first_turn_yakuman(&mut res, ctx);
    res
}

#[allow(clippy::too_many_arguments)]
fn evaluate_division(
    counts: &[u8; TILE_KINDS],
    div: &Division,
    group: Option<usize>,
    win: u8,
    calls: &[Call],
    menzen: bool,
    ctx: &WinContext,
) -> WinEvaluation {
    let mut res = WinEvaluation::empty();

    apply_yakuman(&mut res, counts, div, group, win, calls, menzen, ctx);
    if res.yakuman > 0 {
        return res;
    }

    let fu_ctx = FuContext {
        round_wind: ctx.round_wind.index() as u8,
        seat_wind: ctx.seat_wind.index() as u8,
        tsumo: ctx.tsumo,
        menzen,
    };

    apply_situational(&mut res, menzen, ctx);

    if is_pinfu(div, group, win, calls, &fu_ctx) {
        res.add(Yaku::Pinfu, 1);
        res.fu = if ctx.tsumo { 20 } else { 30 };
    } else {
        res.fu = calculate_fu(div, group, win, calls, &fu_ctx);
    }

    if all_simple(counts, calls) {
        res.add(Yaku::Tanyao, 1);
    }

    // Yakuhai triplets; round and seat wind stack when they coincide.
    let round = ctx.round_wind.index() as u8;
    let seat = ctx.seat_wind.index() as u8;
    if has_triplet_of(div, calls, 31) {
        res.add(Yaku::Haku, 1);
    }
    if has_triplet_of(div, calls, 32) {
        res.add(Yaku::Hatsu, 1);
    }
    if has_triplet_of(div, calls, 33) {
        res.add(Yaku::Chun, 1);
    }
    if has_triplet_of(div, calls, round) {
        res.add(Yaku::RoundWind, 1);
    }
    if has_triplet_of(div, calls, seat) {
        res.add(Yaku::SeatWind, 1);
    }

    let dragon_triplets = (31..=33).filter(|&t| has_triplet_of(div, calls, t)).count();
    let dragon_pair = (31..=33).contains(&div.pair);
    if dragon_triplets == 2 && dragon_pair {
        res.add(Yaku::Shousangen, 2);
    }

    let triplet_total = div
        .blocks
        .iter()
        .filter(|b| matches!(b, Block::Triplet(_)))
        .count()
        + calls
            .iter()
            .filter(|c| matches!(c.kind, CallKind::Pon | CallKind::Minkan | CallKind::Ankan | CallKind::Kakan))
            .count();
    if triplet_total == 4 {
        res.add(Yaku::Toitoi, 2);
    }

    if concealed_triplets(div, group, calls, ctx.tsumo) == 3 {
        res.add(Yaku::Sanankou, 2);
    }

    let kans = calls.iter().filter(|c| c.kind.is_kan()).count();
    if kans == 3 {
        res.add(Yaku::Sankantsu, 2);
    }

    if menzen {
        match identical_run_pairs(div) {
            2 => res.add(Yaku::Ryanpeikou, 3),
            1 => res.add(Yaku::Iipeikou, 1),
            _ => {}
        }
    }

    if has_ittsu(div, calls) {
        res.add(Yaku::Ittsu, if menzen { 2 } else { 1 });
    }
    if has_sanshoku(div, calls) {
        res.add(Yaku::Sanshoku, if menzen { 2 } else { 1 });
    }
    if has_sanshoku_doukou(div, calls) {
        res.add(Yaku::SanshokuDoukou, 2);
    }

    if one_suit_only(counts, calls) {
        res.add(Yaku::Chinitsu, if menzen { 6 } else { 5 });
    } else if one_suit_plus_honors(counts, calls) {
        res.add(Yaku::Honitsu, if menzen { 3 } else { 2 });
    }

    if all_yaochuu(counts, calls) {
        res.add(Yaku::Honroutou, 2);
    } else if every_block_terminal(div, calls, false) {
        res.add(Yaku::Junchan, if menzen { 3 } else { 2 });
    } else if every_block_terminal(div, calls, true) {
        res.add(Yaku::Chanta, if menzen { 2 } else { 1 });
    }

    res
}

fn apply_situational(res: &mut WinEvaluation, menzen: bool, ctx: &WinContext) {
    if ctx.double_riichi {
        res.add(Yaku::DoubleRiichi, 2);
    } else if ctx.riichi {
        res.add(Yaku::Riichi, 1);
    }
    if ctx.ippatsu {
        res.add(Yaku::Ippatsu, 1);
    }
    if menzen && ctx.tsumo {
        res.add(Yaku::MenzenTsumo, 1);
    }
    if ctx.haitei && ctx.tsumo {
        res.add(Yaku::Haitei, 1);
    }
    if ctx.houtei && !ctx.tsumo {
        res.add(Yaku::Houtei, 1);
    }
    if ctx.rinshan && ctx.tsumo {
        res.add(Yaku::Rinshan, 1);
    }
    if ctx.chankan && !ctx.tsumo {
        res.add(Yaku::Chankan, 1);
    }
}

fn apply_first_turn_yakuman(res: &mut WinEvaluation, ctx: &WinContext) {
    if !ctx.first_turn {
        return;
    }
    if ctx.tsumo {
        if ctx.seat_wind == EAST {
            res.yakuman += 1;
            res.yaku.push((Yaku::Tenhou, 13));
        } else {
            res.yakuman += 1;
            res.yaku.push((Yaku::Chiihou, 13));
        }
    } else if ctx.rule.renhou_enabled {
        res.yakuman += 1;
        res.yaku.push((Yaku::Renhou, 13));
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_yakuman(
    res: &mut WinEvaluation,
    counts: &[u8; TILE_KINDS],
    div: &Division,
    group: Option<usize>,
    win: u8,
    calls: &[Call],
    menzen: bool,
    ctx: &WinContext,
) {
    if counts.iter().take(27).all(|&n| n == 0) && calls_all_honor(calls) {
        res.yakuman += 1;
        res.yaku.push((Yaku::Tsuuiisou, 13));
    }
    if all_number_terminals(counts, calls) {
        res.yakuman += 1;
        res.yaku.push((Yaku::Chinroutou, 13));
    }
    if all_green(counts, calls) {
        res.yakuman += 1;
        res.yaku.push((Yaku::Ryuuiisou, 13));
    }

    let kans = calls.iter().filter(|c| c.kind.is_kan()).count();
    if kans == 4 {
        res.yakuman += 1;
        res.yaku.push((Yaku::Suukantsu, 13));
    }

    if menzen && is_chuuren(counts) {
        let mut before = *counts;
        before[win as usize] -= 1;
        if is_pure_chuuren_shape(&before) {
            let double = ctx.rule.junsei_chuuren_double;
            let mult = if double { 2 } else { 1 };
            res.yakuman += mult;
            res.yaku.push((Yaku::ChuurenPoutou9Wait, 13 * mult));
        } else {
            res.yakuman += 1;
            res.yaku.push((Yaku::ChuurenPoutou, 13));
        }
    }

    if concealed_triplets(div, group, calls, ctx.tsumo) == 4 {
        if group.is_none() {
            let mult = if ctx.rule.suuankou_tanki_double { 2 } else { 1 };
            res.yakuman += mult;
            res.yaku.push((Yaku::SuuankouTanki, 13 * mult));
        } else {
            res.yakuman += 1;
            res.yaku.push((Yaku::Suuankou, 13));
        }
    }

    if (31..=33).all(|t| has_triplet_of(div, calls, t)) {
        res.yakuman += 1;
        res.yaku.push((Yaku::Daisangen, 13));
    }

    let wind_triplets = (27..=30).filter(|&t| has_triplet_of(div, calls, t)).count();
    let wind_pair = (27..=30).contains(&div.pair);
    if wind_triplets == 4 {
        res.yakuman += 2;
        res.yaku.push((Yaku::Daisuushi, 26));
    } else if wind_triplets == 3 && wind_pair {
        res.yakuman += 1;
        res.yaku.push((Yaku::Shousuushi, 13));
    }

    apply_first_turn_yakuman(res, ctx);

    if res.yakuman > 0 {
        res.han = 13 * res.yakuman;
    }
}

fn apply_dora(res: &mut WinEvaluation, hand: &HandShape, win_tile: Tile, ctx: &WinContext) {
    let sanma = ctx.rule.is_sanma();
    let mut counted: Vec<Tile> = hand.hidden_part().to_vec();
    for call in hand.calls() {
        if call.kind != CallKind::Kita {
            counted.extend(call.tiles.iter().copied());
        }
    }
    counted.push(win_tile);

    let mut dora = 0u8;
    for &indicator in &ctx.dora_indicators {
        let target = indicator.dora_from_indicator(sanma);
        dora += counted
            .iter()
            .filter(|t| t.normalize_red() == target)
            .count() as u8;
        if sanma && target.normalize_red() == crate::tile::NORTH {
            dora += hand.kita_count();
        }
    }
    if dora > 0 {
        res.add(Yaku::Dora, dora);
    }

    let aka = counted.iter().filter(|t| t.is_red()).count() as u8;
    if aka > 0 {
        res.add(Yaku::AkaDora, aka);
    }

    if ctx.riichi || ctx.double_riichi {
        let mut ura = 0u8;
        for &indicator in &ctx.ura_indicators {
            let target = indicator.dora_from_indicator(sanma);
            ura += counted
                .iter()
                .filter(|t| t.normalize_red() == target)
                .count() as u8;
            if sanma && target.normalize_red() == crate::tile::NORTH {
                ura += hand.kita_count();
            }
        }
        if ura > 0 {
            res.add(Yaku::UraDora, ura);
        }
    }

    if sanma && hand.kita_count() > 0 {
        res.add(Yaku::KitaDora, hand.kita_count());
    }
}

// ---------------------------------------------------------------------------
// Shape predicates. Each spans the concealed counts and the calls.
// ---------------------------------------------------------------------------

fn call_indices(calls: &[Call]) -> impl Iterator<Item = usize> + '_ {
    calls
        .iter()
        .filter(|c| c.kind != CallKind::Kita)
        .flat_map(|c| c.tiles.iter().map(|t| t.index()))
}

fn is_yaochuu_index(i: usize) -> bool {
    i >= 27 || i % 9 == 0 || i % 9 == 8
}

fn all_simple(counts: &[u8; TILE_KINDS], calls: &[Call]) -> bool {
    counts
        .iter()
        .enumerate()
        .all(|(i, &n)| n == 0 || !is_yaochuu_index(i))
        && call_indices(calls).all(|i| !is_yaochuu_index(i))
}

fn all_yaochuu(counts: &[u8; TILE_KINDS], calls: &[Call]) -> bool {
    counts
        .iter()
        .enumerate()
        .all(|(i, &n)| n == 0 || is_yaochuu_index(i))
        && call_indices(calls).all(is_yaochuu_index)
}

fn all_number_terminals(counts: &[u8; TILE_KINDS], calls: &[Call]) -> bool {
    let terminal = |i: usize| i < 27 && (i % 9 == 0 || i % 9 == 8);
    counts
        .iter()
        .enumerate()
        .all(|(i, &n)| n == 0 || terminal(i))
        && call_indices(calls).all(terminal)
}

fn all_green(counts: &[u8; TILE_KINDS], calls: &[Call]) -> bool {
    const GREEN: [usize; 6] = [19, 20, 21, 23, 25, 32];
    counts
        .iter()
        .enumerate()
        .all(|(i, &n)| n == 0 || GREEN.contains(&i))
        && call_indices(calls).all(|i| GREEN.contains(&i))
}

fn calls_all_honor(calls: &[Call]) -> bool {
    call_indices(calls).all(|i| i >= 27)
}

fn suits_used(counts: &[u8; TILE_KINDS], calls: &[Call]) -> ([bool; 3], bool) {
    let mut suits = [false; 3];
    let mut honors = false;
    let mut mark = |i: usize| {
        if i >= 27 {
            honors = true;
        } else {
            suits[i / 9] = true;
        }
    };
    for (i, &n) in counts.iter().enumerate() {
        if n > 0 {
            mark(i);
        }
    }
    for i in call_indices(calls) {
        mark(i);
    }
    (suits, honors)
}

fn one_suit_only(counts: &[u8; TILE_KINDS], calls: &[Call]) -> bool {
    let (suits, honors) = suits_used(counts, calls);
    !honors && suits.iter().filter(|&&s| s).count() == 1
}

fn one_suit_plus_honors(counts: &[u8; TILE_KINDS], calls: &[Call]) -> bool {
    let (suits, honors) = suits_used(counts, calls);
    honors && suits.iter().filter(|&&s| s).count() == 1
}

fn has_triplet_of(div: &Division, calls: &[Call], tile: u8) -> bool {
    div.blocks
        .iter()
        .any(|b| matches!(b, Block::Triplet(t) if *t == tile))
        || calls.iter().any(|c| {
            matches!(c.kind, CallKind::Pon | CallKind::Minkan | CallKind::Ankan | CallKind::Kakan)
                && c.tiles[0].index() as u8 == tile
        })
}

/// Triplets that stay concealed: division triplets (minus one completed by
/// ron) plus ankans.
fn concealed_triplets(div: &Division, group: Option<usize>, calls: &[Call], tsumo: bool) -> usize {
    let mut count = 0;
    for (idx, block) in div.blocks.iter().enumerate() {
        if matches!(block, Block::Triplet(_)) {
            if !tsumo && group == Some(idx) {
                continue;
            }
            count += 1;
        }
    }
    count + calls.iter().filter(|c| c.kind == CallKind::Ankan).count()
}

fn identical_run_pairs(div: &Division) -> usize {
    let mut runs: Vec<u8> = div
        .blocks
        .iter()
        .filter_map(|b| match b {
            Block::Run(t) => Some(*t),
            Block::Triplet(_) => None,
        })
        .collect();
    runs.sort_unstable();
    let mut pairs = 0;
    let mut i = 0;
    while i + 1 < runs.len() {
        if runs[i] == runs[i + 1] {
            pairs += 1;
            i += 2;
        } else {
            i += 1;
        }
    }
    pairs
}

fn run_starts(div: &Division, calls: &[Call]) -> Vec<u8> {
    let mut starts: Vec<u8> = div
        .blocks
        .iter()
        .filter_map(|b| match b {
            Block::Run(t) => Some(*t),
            Block::Triplet(_) => None,
        })
        .collect();
    for c in calls {
        if c.kind == CallKind::Chii {
            let mut idxs: Vec<u8> = c.tiles.iter().map(|t| t.index() as u8).collect();
            idxs.sort_unstable();
            starts.push(idxs[0]);
        }
    }
    starts
}

fn triplet_starts(div: &Division, calls: &[Call]) -> Vec<u8> {
    let mut starts: Vec<u8> = div
        .blocks
        .iter()
        .filter_map(|b| match b {
            Block::Triplet(t) => Some(*t),
            Block::Run(_) => None,
        })
        .collect();
    for c in calls {
        if matches!(c.kind, CallKind::Pon | CallKind::Minkan | CallKind::Ankan | CallKind::Kakan) {
            starts.push(c.tiles[0].index() as u8);
        }
    }
    starts
}

fn has_ittsu(div: &Division, calls: &[Call]) -> bool {
    let starts = run_starts(div, calls);
    [0u8, 9, 18]
        .iter()
        .any(|&s| [s, s + 3, s + 6].iter().all(|x| starts.contains(x)))
}

fn has_sanshoku(div: &Division, calls: &[Call]) -> bool {
    let starts = run_starts(div, calls);
    (0u8..7).any(|i| [i, i + 9, i + 18].iter().all(|x| starts.contains(x)))
}

fn has_sanshoku_doukou(div: &Division, calls: &[Call]) -> bool {
    let starts = triplet_starts(div, calls);
    (0u8..9).any(|i| [i, i + 9, i + 18].iter().all(|x| starts.contains(x)))
}

/// Every block and the pair touch a terminal (with honors allowed when
/// `honors_ok`); at least one honor required for chanta to stay distinct
/// from junchan.
fn every_block_terminal(div: &Division, calls: &[Call], honors_ok: bool) -> bool {
    let number_terminal = |i: u8| (i as usize) < 27 && (i % 9 == 0 || i % 9 == 8);
    let honor = |i: u8| i >= 27;
    let ok_tile = |i: u8| number_terminal(i) || (honors_ok && honor(i));

    if !ok_tile(div.pair) {
        return false;
    }
    let mut has_honor = honor(div.pair);
    for block in &div.blocks {
        match *block {
            Block::Triplet(t) => {
                if !ok_tile(t) {
                    return false;
                }
                if honor(t) {
                    has_honor = true;
                }
            }
            Block::Run(t) => {
                if !number_terminal(t) && !number_terminal(t + 2) {
                    return false;
                }
            }
        }
    }
    for c in calls {
        if c.kind == CallKind::Kita {
            continue;
        }
        let idxs: Vec<u8> = c.tiles.iter().map(|t| t.index() as u8).collect();
        if c.kind == CallKind::Chii {
            let lo = *idxs.iter().min().unwrap();
            if !number_terminal(lo) && !number_terminal(lo + 2) {
                return false;
            }
        } else {
            if !ok_tile(idxs[0]) {
                return false;
            }
            if honor(idxs[0]) {
                has_honor = true;
            }
        }
    }
    if honors_ok {
        has_honor
    } else {
        true
    }
}

fn is_chuuren(counts: &[u8; TILE_KINDS]) -> bool {
    let mut suit = None;
    for (i, &n) in counts.iter().enumerate() {
        if n == 0 {
            continue;
        }
        if i >= 27 {
            return false;
        }
        let s = i / 9;
        if suit.is_some() && suit != Some(s) {
            return false;
        }
        suit = Some(s);
    }
    let s = match suit {
        Some(s) => s,
        None => return false,
    };
    let ranks = &counts[s * 9..s * 9 + 9];
    ranks[0] >= 3 && ranks[8] >= 3 && ranks[1..8].iter().all(|&n| n >= 1)
}

fn is_pure_chuuren_shape(counts13: &[u8; TILE_KINDS]) -> bool {
    for s in 0..3 {
        let ranks = &counts13[s * 9..s * 9 + 9];
        let total: u8 = ranks.iter().sum();
        if total != 13 {
            continue;
        }
        if ranks[0] == 3 && ranks[8] == 3 && ranks[1..8].iter().all(|&n| n == 1) {
            return true;
        }
    }
    false
}
