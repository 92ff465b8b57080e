use std::fmt;
use std::mem;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, AnalysisResult};
use crate::tile::{index_is_suited, index_rank, to_counts, Tile, TILE_KINDS, YAOCHUU};

/// Upper bound on distinct hands held across the two cache generations.
pub const CACHE_CAPACITY: usize = 1 << 16;

/// The six one-away sub-kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OneAwayKind {
    /// A floating tile can be swapped for a nearby tile to reach tenpai.
    Kutsuki,
    /// All blocks are formed but no pair exists yet.
    Headless,
    /// A complex shape (e.g. 455, 446, 468) backs the incomplete block.
    Complete,
    /// Plain incomplete-block shape.
    Floating,
    SevenPairs,
    ThirteenOrphans,
}

/// Distance to tenpai, with the one-away kind attached at distance 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShantenValue {
    Tenpai,
    OneAway(OneAwayKind),
    Away(u8),
}

impl ShantenValue {
    pub fn steps(self) -> u8 {
        match self {
            ShantenValue::Tenpai => 0,
            ShantenValue::OneAway(_) => 1,
            ShantenValue::Away(n) => n,
        }
    }

    pub fn is_tenpai(self) -> bool {
        matches!(self, ShantenValue::Tenpai)
    }
}

impl fmt::Display for ShantenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShantenValue::Tenpai => write!(f, "tenpai"),
            ShantenValue::OneAway(kind) => write!(f, "1 ({:?})", kind),
            ShantenValue::Away(n) => write!(f, "{}", n),
        }
    }
}

/// Shanten plus the accepted/relevant tiles:
/// waits at tenpai, advancing tiles at one-away, empty beyond.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShantenResult {
    pub value: ShantenValue,
    pub tiles: Vec<Tile>,
}

/// Memoizing shanten calculator.
///
/// Keys are red-normalized count arrays, so two hands differing only in
/// red-five markings share a slot. The cache is segmented into a hot and a
/// cold generation; filling the hot half demotes it, evicting the previous
/// cold half wholesale.
#[derive(Debug, Default)]
pub struct ShantenEngine {
    hot: AHashMap<[u8; TILE_KINDS], ShantenResult>,
    cold: AHashMap<[u8; TILE_KINDS], ShantenResult>,
}

impl ShantenEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze a concealed hand of canonical size (1, 4, 7, 10 or 13 tiles).
    pub fn analyze(&mut self, tiles: &[Tile]) -> AnalysisResult<ShantenResult> {
        self.analyze_counts(to_counts(tiles))
    }

    pub fn analyze_counts(&mut self, counts: [u8; TILE_KINDS]) -> AnalysisResult<ShantenResult> {
        let total: u8 = counts.iter().sum();
        if total % 3 != 1 || total > 13 {
            return Err(AnalysisError::MalformedInput {
                context: "shanten".to_string(),
                message: format!("concealed hand of {} tiles has no shanten", total),
            });
        }
        if let Some(hit) = self.lookup(&counts) {
            return Ok(hit);
        }

        let result = solve(&counts, total / 3)?;
        self.insert(counts, result.clone());
        Ok(result)
    }

    fn lookup(&mut self, key: &[u8; TILE_KINDS]) -> Option<ShantenResult> {
        if let Some(hit) = self.hot.get(key) {
            return Some(hit.clone());
        }
        if let Some(hit) = self.cold.remove(key) {
            self.hot.insert(*key, hit.clone());
            return Some(hit);
        }
        None
    }

    fn insert(&mut self, key: [u8; TILE_KINDS], value: ShantenResult) {
        if self.hot.len() >= CACHE_CAPACITY / 2 {
            self.cold = mem::take(&mut self.hot);
        }
        self.hot.insert(key, value);
    }
}

/// True when a 3n+2 count array completes a hand under any of the
/// standard, seven-pairs, or thirteen-orphans forms.
pub fn is_winning_hand(counts: &[u8; TILE_KINDS]) -> bool {
    let total: u8 = counts.iter().sum();
    if total % 3 != 2 {
        return false;
    }
    calc_for(counts, total / 3) == -1
}

fn solve(counts: &[u8; TILE_KINDS], len_div3: u8) -> AnalysisResult<ShantenResult> {
    let full = len_div3 == 4;
    let std = calc_standard(counts, len_div3);
    let chiitoi = if full { calc_chiitoi(counts) } else { i8::MAX };
    let kokushi = if full { calc_kokushi(counts) } else { i8::MAX };
    let min = std.min(chiitoi).min(kokushi);

    let result = match min {
        0 => ShantenResult {
            value: ShantenValue::Tenpai,
            tiles: trial_tiles(counts, |c| calc_for(c, len_div3) == -1),
        },
        1 => {
            if std == 1 {
                let (kind, tiles) = classify_one_away(counts, len_div3);
                ShantenResult {
                    value: ShantenValue::OneAway(kind),
                    tiles,
                }
            } else if chiitoi == 1 {
                ShantenResult {
                    value: ShantenValue::OneAway(OneAwayKind::SevenPairs),
                    tiles: trial_tiles(counts, |c| calc_chiitoi(c) == 0),
                }
            } else {
                ShantenResult {
                    value: ShantenValue::OneAway(OneAwayKind::ThirteenOrphans),
                    tiles: trial_tiles(counts, |c| calc_kokushi(c) == 0),
                }
            }
        }
        2..=6 => ShantenResult {
            value: ShantenValue::Away(min as u8),
            tiles: Vec::new(),
        },
        _ => {
            return Err(AnalysisError::InvariantViolation {
                hand: format_counts(counts),
                message: format!("shanten search produced {}", min),
            })
        }
    };
    Ok(result)
}

/// Tiles whose addition satisfies `accept` on the grown hand.
fn trial_tiles(
    counts: &[u8; TILE_KINDS],
    accept: impl Fn(&[u8; TILE_KINDS]) -> bool,
) -> Vec<Tile> {
    let mut out = Vec::new();
    let mut c = *counts;
    for i in 0..TILE_KINDS {
        if c[i] >= 4 {
            continue;
        }
        c[i] += 1;
        if accept(&c) {
            out.push(Tile::from_index(i));
        }
        c[i] -= 1;
    }
    out
}

fn format_counts(counts: &[u8; TILE_KINDS]) -> String {
    let mut tiles = Vec::new();
    for (i, &n) in counts.iter().enumerate() {
        for _ in 0..n {
            tiles.push(Tile::from_index(i));
        }
    }
    tiles
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join("")
}

// ---------------------------------------------------------------------------
// Form calculators. All operate on red-normalized count arrays and return
// -1 for a complete hand, 0 for tenpai, and so on.
// ---------------------------------------------------------------------------

pub(crate) fn calc_for(counts: &[u8; TILE_KINDS], len_div3: u8) -> i8 {
    let mut s = calc_standard(counts, len_div3);
    if len_div3 >= 4 {
        s = s.min(calc_chiitoi(counts)).min(calc_kokushi(counts));
    }
    s
}

pub(crate) fn calc_chiitoi(counts: &[u8; TILE_KINDS]) -> i8 {
    let mut pairs = 0i8;
    let mut kinds = 0i8;
    for &n in counts.iter() {
        if n > 0 {
            kinds += 1;
            if n >= 2 {
                pairs += 1;
            }
        }
    }
    6 - pairs + (7 - kinds).max(0)
}

pub(crate) fn calc_kokushi(counts: &[u8; TILE_KINDS]) -> i8 {
    let mut kinds = 0i8;
    let mut has_pair = false;
    for t in YAOCHUU {
        let n = counts[t.index()];
        if n > 0 {
            kinds += 1;
            if n >= 2 {
                has_pair = true;
            }
        }
    }
    13 - kinds - has_pair as i8
}

pub(crate) fn calc_standard(counts: &[u8; TILE_KINDS], len_div3: u8) -> i8 {
    let mut c = *counts;
    let mut best = i8::MAX;
    cut_sets(&mut c, 0, 0, len_div3, &mut best);
    best
}

fn block_distance(sets: u8, partials: u8, pairs: u8, len_div3: u8) -> i8 {
    let need = len_div3 as i8;
    let m = (sets as i8).min(need);
    let head = i8::from(pairs > 0);
    let d = (partials as i8 + pairs as i8 - head).min(need - m);
    need * 2 - m * 2 - d - head
}

fn cut_sets(c: &mut [u8; TILE_KINDS], start: usize, sets: u8, len_div3: u8, best: &mut i8) {
    let mut i = start;
    while i < TILE_KINDS && c[i] == 0 {
        i += 1;
    }
    if i == TILE_KINDS {
        cut_partials(c, 0, sets, 0, 0, len_div3, best);
        return;
    }
    if c[i] >= 3 {
        c[i] -= 3;
        cut_sets(c, i, sets + 1, len_div3, best);
        c[i] += 3;
    }
    if index_is_suited(i) && index_rank(i) <= 6 && c[i + 1] > 0 && c[i + 2] > 0 {
        c[i] -= 1;
        c[i + 1] -= 1;
        c[i + 2] -= 1;
        cut_sets(c, i, sets + 1, len_div3, best);
        c[i] += 1;
        c[i + 1] += 1;
        c[i + 2] += 1;
    }
    cut_sets(c, i + 1, sets, len_div3, best);
}

fn cut_partials(
    c: &mut [u8; TILE_KINDS],
    start: usize,
    sets: u8,
    partials: u8,
    pairs: u8,
    len_div3: u8,
    best: &mut i8,
) {
    // Taking more blocks than the hand can use never improves the distance.
    if sets + partials + pairs > len_div3 + 1 {
        return;
    }
    let mut i = start;
    while i < TILE_KINDS && c[i] == 0 {
        i += 1;
    }
    if i == TILE_KINDS {
        *best = (*best).min(block_distance(sets, partials, pairs, len_div3));
        return;
    }
    if c[i] >= 2 {
        c[i] -= 2;
        cut_partials(c, i, sets, partials, pairs + 1, len_div3, best);
        c[i] += 2;
    }
    if index_is_suited(i) && index_rank(i) <= 7 && c[i + 1] > 0 {
        c[i] -= 1;
        c[i + 1] -= 1;
        cut_partials(c, i, sets, partials + 1, pairs, len_div3, best);
        c[i] += 1;
        c[i + 1] += 1;
    }
    if index_is_suited(i) && index_rank(i) <= 6 && c[i + 2] > 0 {
        c[i] -= 1;
        c[i + 2] -= 1;
        cut_partials(c, i, sets, partials + 1, pairs, len_div3, best);
        c[i] += 1;
        c[i + 2] += 1;
    }
    cut_partials(c, i + 1, sets, partials, pairs, len_div3, best);
}

// ---------------------------------------------------------------------------
// One-away classification over the standard form.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Residual {
    sets: u8,
    /// Counts remaining after removing the chosen complete sets.
    after_sets: [u8; TILE_KINDS],
    pairs: Vec<usize>,
    /// (low index, gap) with gap 1 for adjacent and 2 for gapped partials.
    taatsu: Vec<(usize, usize)>,
    /// Tiles left outside every block, with multiplicity.
    floaters: Vec<usize>,
}

fn classify_one_away(counts: &[u8; TILE_KINDS], len_div3: u8) -> (OneAwayKind, Vec<Tile>) {
    let residuals = collect_residuals(counts, len_div3);
    if residuals.is_empty() {
        let advancing = trial_tiles(counts, |c| calc_standard(c, len_div3) == 0);
        return (OneAwayKind::Floating, advancing);
    }

    // Kutsuki: all groups but one complete, pair in place, and the leftover
    // tiles floating free. Any tile sticking to a floater yields the missing
    // block's partner shape, so the hand is tenpai after swapping the other
    // floater out. The swap is verified per floater before crediting it.
    let mut kutsuki_tiles: Vec<usize> = Vec::new();
    for r in &residuals {
        if r.pairs.is_empty() || !r.taatsu.is_empty() || r.floaters.is_empty() {
            continue;
        }
        if r.sets + 1 != len_div3 {
            continue;
        }
        let mut seen: Vec<usize> = Vec::new();
        for &f in &r.floaters {
            if seen.contains(&f) {
                continue;
            }
            seen.push(f);
            if floater_reaches_tenpai(counts, f, len_div3) {
                for n in neighborhood(f) {
                    if !kutsuki_tiles.contains(&n) {
                        kutsuki_tiles.push(n);
                    }
                }
            }
        }
    }
    if !kutsuki_tiles.is_empty() {
        kutsuki_tiles.sort_unstable();
        return (
            OneAwayKind::Kutsuki,
            kutsuki_tiles.into_iter().map(Tile::from_index).collect(),
        );
    }

    // Headless: every optimal residual still needs its pair.
    if residuals.iter().all(|r| r.pairs.is_empty()) {
        let mut tiles: Vec<usize> = Vec::new();
        for r in &residuals {
            for (i, &n) in r.after_sets.iter().enumerate() {
                if n > 0 && !tiles.contains(&i) {
                    tiles.push(i);
                }
            }
            for &(low, gap) in &r.taatsu {
                for p in taatsu_completions(low, gap) {
                    if !tiles.contains(&p) {
                        tiles.push(p);
                    }
                }
            }
        }
        tiles.sort_unstable();
        return (
            OneAwayKind::Headless,
            tiles.into_iter().map(Tile::from_index).collect(),
        );
    }

    let advancing = trial_tiles(counts, |c| calc_standard(c, len_div3) == 0);
    if residuals.iter().any(|r| has_complex_shape(&r.after_sets)) {
        (OneAwayKind::Complete, advancing)
    } else {
        (OneAwayKind::Floating, advancing)
    }
}

fn floater_reaches_tenpai(counts: &[u8; TILE_KINDS], floater: usize, len_div3: u8) -> bool {
    let mut c = *counts;
    c[floater] -= 1;
    for x in 0..TILE_KINDS {
        if x == floater || c[x] >= 4 {
            continue;
        }
        c[x] += 1;
        let tenpai = calc_for(&c, len_div3) == 0;
        c[x] -= 1;
        if tenpai {
            return true;
        }
    }
    false
}

/// Five-tile neighborhood of a suited tile; honors have only themselves.
fn neighborhood(i: usize) -> Vec<usize> {
    if !index_is_suited(i) {
        return vec![i];
    }
    let rank = index_rank(i);
    let mut out = Vec::with_capacity(5);
    for d in -2i32..=2 {
        let r = rank as i32 + d;
        if (0..9).contains(&r) {
            out.push((i as i32 + d) as usize);
        }
    }
    out
}

fn taatsu_completions(low: usize, gap: usize) -> Vec<usize> {
    let rank = index_rank(low);
    if gap == 2 {
        return vec![low + 1];
    }
    let mut out = Vec::new();
    if rank >= 1 {
        out.push(low - 1);
    }
    if rank + 2 <= 8 {
        out.push(low + 2);
    }
    out
}

fn floaters_isolated(c: &[u8; TILE_KINDS]) -> bool {
    for i in 0..TILE_KINDS {
        if c[i] == 0 {
            continue;
        }
        if c[i] >= 2 {
            return false;
        }
        if index_is_suited(i) {
            let rank = index_rank(i);
            if (rank <= 7 && c[i + 1] > 0) || (rank <= 6 && c[i + 2] > 0) {
                return false;
            }
        }
    }
    true
}

fn has_complex_shape(c: &[u8; TILE_KINDS]) -> bool {
    for i in 0..TILE_KINDS {
        if !index_is_suited(i) || c[i] == 0 {
            continue;
        }
        let rank = index_rank(i);
        if rank <= 7 && ((c[i] >= 2 && c[i + 1] >= 1) || (c[i] >= 1 && c[i + 1] >= 2)) {
            return true;
        }
        if rank <= 6 && ((c[i] >= 2 && c[i + 2] >= 1) || (c[i] >= 1 && c[i + 2] >= 2)) {
            return true;
        }
        if rank <= 4 && c[i] >= 1 && c[i + 2] >= 1 && c[i + 4] >= 1 {
            return true;
        }
    }
    false
}

fn collect_residuals(counts: &[u8; TILE_KINDS], len_div3: u8) -> Vec<Residual> {
    let mut c = *counts;
    let mut out = Vec::new();
    residual_sets(&mut c, 0, 0, len_div3, &mut out);
    out
}

fn residual_sets(
    c: &mut [u8; TILE_KINDS],
    start: usize,
    sets: u8,
    len_div3: u8,
    out: &mut Vec<Residual>,
) {
    let mut i = start;
    while i < TILE_KINDS && c[i] == 0 {
        i += 1;
    }
    if i == TILE_KINDS {
        let after_sets = *c;
        residual_partials(
            c,
            0,
            sets,
            &after_sets,
            &mut Vec::new(),
            &mut Vec::new(),
            len_div3,
            out,
        );
        return;
    }
    if c[i] >= 3 {
        c[i] -= 3;
        residual_sets(c, i, sets + 1, len_div3, out);
        c[i] += 3;
    }
    if index_is_suited(i) && index_rank(i) <= 6 && c[i + 1] > 0 && c[i + 2] > 0 {
        c[i] -= 1;
        c[i + 1] -= 1;
        c[i + 2] -= 1;
        residual_sets(c, i, sets + 1, len_div3, out);
        c[i] += 1;
        c[i + 1] += 1;
        c[i + 2] += 1;
    }
    residual_sets(c, i + 1, sets, len_div3, out);
}

#[allow(clippy::too_many_arguments)]
fn residual_partials(
    c: &mut [u8; TILE_KINDS],
    start: usize,
    sets: u8,
    after_sets: &[u8; TILE_KINDS],
    pairs: &mut Vec<usize>,
    taatsu: &mut Vec<(usize, usize)>,
    len_div3: u8,
    out: &mut Vec<Residual>,
) {
    if sets as usize + taatsu.len() + pairs.len() > len_div3 as usize + 2 {
        return;
    }
    let mut i = start;
    while i < TILE_KINDS && c[i] == 0 {
        i += 1;
    }
    if i == TILE_KINDS {
        // Only maximal removals count as residuals: leftover tiles must be
        // free of pair/partial structure, or a further-removed leaf exists.
        if !floaters_isolated(c) {
            return;
        }
        let value = block_distance(sets, taatsu.len() as u8, pairs.len() as u8, len_div3);
        if value == 1 {
            let mut floaters = Vec::new();
            for (idx, &n) in c.iter().enumerate() {
                for _ in 0..n {
                    floaters.push(idx);
                }
            }
            out.push(Residual {
                sets,
                after_sets: *after_sets,
                pairs: pairs.clone(),
                taatsu: taatsu.clone(),
                floaters,
            });
        }
        return;
    }
    if c[i] >= 2 {
        c[i] -= 2;
        pairs.push(i);
        residual_partials(c, i, sets, after_sets, pairs, taatsu, len_div3, out);
        pairs.pop();
        c[i] += 2;
    }
    if index_is_suited(i) && index_rank(i) <= 7 && c[i + 1] > 0 {
        c[i] -= 1;
        c[i + 1] -= 1;
        taatsu.push((i, 1));
        residual_partials(c, i, sets, after_sets, pairs, taatsu, len_div3, out);
        taatsu.pop();
        c[i] += 1;
        c[i + 1] += 1;
    }
    if index_is_suited(i) && index_rank(i) <= 6 && c[i + 2] > 0 {
        c[i] -= 1;
        c[i + 2] -= 1;
        taatsu.push((i, 2));
        residual_partials(c, i, sets, after_sets, pairs, taatsu, len_div3, out);
        taatsu.pop();
        c[i] += 1;
        c[i + 2] += 1;
    }
    residual_partials(c, i + 1, sets, after_sets, pairs, taatsu, len_div3, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_tiles;

    fn analyze(s: &str) -> ShantenResult {
        let tiles = parse_tiles(s).unwrap();
        ShantenEngine::new().analyze(&tiles).unwrap()
    }

    fn tile_codes(tiles: &[Tile]) -> Vec<u8> {
        tiles.iter().map(|t| t.code()).collect()
    }

    #[test]
    fn complete_hand_is_minus_one() {
        // 123m 456m 789m 123p 11s
        let tiles = parse_tiles("123456789m123p11s").unwrap();
        assert!(is_winning_hand(&to_counts(&tiles)));
    }

    #[test]
    fn tanki_tenpai() {
        // Four calls leave a single concealed tile.
        let r = analyze("5p");
        assert_eq!(r.value, ShantenValue::Tenpai);
        assert_eq!(tile_codes(&r.tiles), vec![25]);
    }

    #[test]
    fn ryanmen_tenpai_waits() {
        // 234m 567m 234p 88s + 56s: waiting 4s/7s
        let r = analyze("234567m234p5688s");
        assert_eq!(r.value, ShantenValue::Tenpai);
        assert_eq!(tile_codes(&r.tiles), vec![34, 37]);
    }

    #[test]
    fn shanpon_tenpai_waits() {
        let r = analyze("123m123p123s5577z");
        assert_eq!(r.value, ShantenValue::Tenpai);
        assert_eq!(tile_codes(&r.tiles), vec![45, 47]);
    }

    #[test]
    fn kutsuki_one_away() {
        // Three runs, a pair, and two lone honors: pairing either honor
        // reaches tenpai, so the lone tiles are the sticking tiles.
        let r = analyze("123m123p123s1156z");
        assert_eq!(r.value, ShantenValue::OneAway(OneAwayKind::Kutsuki));
        assert_eq!(tile_codes(&r.tiles), vec![45, 46]);
    }

    #[test]
    fn headless_one_away() {
        // Three runs plus 45m and 78p: blocks complete, no pair anywhere.
        let r = analyze("12345m45678p678s");
        assert_eq!(r.value, ShantenValue::OneAway(OneAwayKind::Headless));
    }

    #[test]
    fn seven_pairs_one_away() {
        // Five pairs and three lone honors: pairing any lone honor reaches
        // tenpai.
        let r = analyze("1133m2255p11s567z");
        assert_eq!(r.value, ShantenValue::OneAway(OneAwayKind::SevenPairs));
        assert_eq!(tile_codes(&r.tiles), vec![45, 46, 47]);
    }

    #[test]
    fn thirteen_orphans_tenpai_thirteen_sided() {
        let r = analyze("19m19p19s1234567z");
        assert_eq!(r.value, ShantenValue::Tenpai);
        assert_eq!(r.tiles.len(), 13);
    }

    #[test]
    fn red_five_shares_cache_slot() {
        let mut engine = ShantenEngine::new();
        let plain = engine.analyze(&parse_tiles("34567m234p45688s").unwrap()).unwrap();
        let red = engine.analyze(&parse_tiles("34067m234p45688s").unwrap()).unwrap();
        assert_eq!(plain, red);
    }

    #[test]
    fn distant_hand_has_no_tiles() {
        let r = analyze("159m159p159s1234z");
        assert!(matches!(r.value, ShantenValue::Away(_)));
        assert!(r.tiles.is_empty());
    }

    #[test]
    fn rejects_off_size_hands() {
        let tiles = parse_tiles("123456m").unwrap();
        assert!(ShantenEngine::new().analyze(&tiles).is_err());
    }
}
