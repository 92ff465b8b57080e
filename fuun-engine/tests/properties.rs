//! Property-based invariants over the hand-analysis core.
//!
//! Random hands are drawn as count arrays capped at four copies per kind;
//! tenpai hands are built from four groups plus a pair with one tile
//! removed, so the tenpai properties get dense coverage instead of waiting
//! on rare random draws.

use proptest::prelude::*;

use fuun_engine::hand::HandShape;
use fuun_engine::score::{calculate_score, payment_deltas};
use fuun_engine::shanten::{is_winning_hand, ShantenEngine};
use fuun_engine::tile::{to_counts, Tile, TILE_KINDS};
use fuun_engine::ukeire::count_ukeire;
use fuun_engine::yaku::{evaluate_waits, WinContext};
use fuun_engine::rule::Ruleset;

fn hand_strategy() -> impl Strategy<Value = Vec<Tile>> {
    proptest::collection::vec(0usize..TILE_KINDS, 13).prop_filter_map(
        "more than four copies of a tile",
        |idxs| {
            let mut counts = [0u8; TILE_KINDS];
            for &i in &idxs {
                counts[i] += 1;
            }
            if counts.iter().any(|&c| c > 4) {
                return None;
            }
            let mut tiles: Vec<Tile> = idxs.into_iter().map(Tile::from_index).collect();
            tiles.sort_unstable();
            Some(tiles)
        },
    )
}

/// Four groups and a pair, minus one tile: tenpai by construction.
fn tenpai_strategy() -> impl Strategy<Value = Vec<Tile>> {
    let group = (any::<bool>(), 0usize..34);
    (
        proptest::collection::vec(group, 4),
        0usize..TILE_KINDS,
        0usize..14,
    )
        .prop_filter_map("tile overflow", |(groups, pair, removed)| {
            let mut counts = [0u8; TILE_KINDS];
            for (is_run, pick) in groups {
                if is_run {
                    // Map onto a valid run start: three suits, ranks 1-7.
                    let suit = pick % 3;
                    let rank = (pick / 3) % 7;
                    let base = suit * 9 + rank;
                    counts[base] += 1;
                    counts[base + 1] += 1;
                    counts[base + 2] += 1;
                } else {
                    counts[pick] += 3;
                }
            }
            counts[pair] += 2;
            if counts.iter().any(|&c| c > 4) {
                return None;
            }
            let mut tiles = Vec::with_capacity(14);
            for (i, &n) in counts.iter().enumerate() {
                for _ in 0..n {
                    tiles.push(Tile::from_index(i));
                }
            }
            tiles.remove(removed);
            Some(tiles)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(400))]

    /// Drawing one tile and discarding one can improve shanten by at most
    /// one step, and giving the drawn tile straight back always restores
    /// the original distance.
    #[test]
    fn shanten_moves_by_at_most_one(hand in hand_strategy(), drawn in 0usize..TILE_KINDS) {
        let mut engine = ShantenEngine::new();
        let base = engine.analyze(&hand).unwrap().value.steps() as i32;

        let mut counts = to_counts(&hand);
        prop_assume!(counts[drawn] < 4);
        counts[drawn] += 1;

        let mut best = i32::MAX;
        for out in 0..TILE_KINDS {
            if counts[out] == 0 {
                continue;
            }
            counts[out] -= 1;
            let steps = engine.analyze_counts(counts).unwrap().value.steps() as i32;
            counts[out] += 1;
            prop_assert!(steps >= base - 1,
                "discarding {} after drawing {} jumped {} -> {}", out, drawn, base, steps);
            best = best.min(steps);
        }
        prop_assert!(best <= base);
    }

    /// Tenpai exactly when some tile completes the hand, and every
    /// reported wait does complete it.
    #[test]
    fn tenpai_iff_waits_exist(hand in hand_strategy()) {
        let mut engine = ShantenEngine::new();
        let result = engine.analyze(&hand).unwrap();
        let counts = to_counts(&hand);

        let mut completions = Vec::new();
        let mut c = counts;
        for i in 0..TILE_KINDS {
            if c[i] >= 4 {
                continue;
            }
            c[i] += 1;
            if is_winning_hand(&c) {
                completions.push(i);
            }
            c[i] -= 1;
        }

        if result.value.is_tenpai() {
            prop_assert!(!result.tiles.is_empty());
            let waits: Vec<usize> = result.tiles.iter().map(|t| t.index()).collect();
            prop_assert_eq!(&waits, &completions);
        } else {
            prop_assert!(completions.is_empty());
        }
    }

    /// Ukeire stays within [0, 4 * distinct waits], hitting the top
    /// exactly when no wait tile is visible anywhere.
    #[test]
    fn ukeire_bounds(hand in hand_strategy()) {
        let mut engine = ShantenEngine::new();
        let shape = HandShape::from_deal(hand.clone(), &mut engine).unwrap();
        let waits = shape.relevant_tiles().to_vec();
        let visible = shape.tiles_with_kans();
        let ukeire = count_ukeire(&shape, &waits, &visible) as usize;

        let mut distinct: Vec<usize> = waits.iter().map(|t| t.index()).collect();
        distinct.sort_unstable();
        distinct.dedup();

        if shape.shanten().steps() > 1 {
            prop_assert_eq!(ukeire, 0);
        } else {
            prop_assert!(ukeire <= 4 * distinct.len());
            let counts = to_counts(&hand);
            let none_held = distinct.iter().all(|&w| counts[w] == 0);
            prop_assert_eq!(ukeire == 4 * distinct.len(), none_held);
        }
    }

    /// Red-five markings never change shanten or waits.
    #[test]
    fn red_five_invariance(hand in hand_strategy()) {
        let mut engine = ShantenEngine::new();
        let plain = engine.analyze(&hand).unwrap();

        let mut marked = hand.clone();
        let mut swapped = false;
        for t in marked.iter_mut() {
            if !swapped && !t.is_red() && t.rank() == 5 && t.is_suited() {
                let red = match t.code() / 10 {
                    1 => 51,
                    2 => 52,
                    _ => 53,
                };
                *t = Tile::from_code(red).unwrap();
                swapped = true;
            }
        }
        prop_assume!(swapped);
        let red = engine.analyze(&marked).unwrap();
        prop_assert_eq!(plain, red);
    }

    /// Every wait of a constructed tenpai hand admits an interpretation.
    #[test]
    fn tenpai_hands_always_evaluate(hand in tenpai_strategy()) {
        let mut engine = ShantenEngine::new();
        let shape = HandShape::from_deal(hand, &mut engine).unwrap();
        prop_assert!(shape.shanten().is_tenpai());

        let evaluations = evaluate_waits(&shape, &WinContext::default()).unwrap();
        prop_assert!(!evaluations.is_empty());
        for (_, eval) in &evaluations {
            // A yakuless closed ron still decomposes; only its han is bare.
            prop_assert!(eval.yakuman > 0 || !eval.yaku.iter().any(|(y, h)| *h == 0 && !y.is_dora()));
        }
    }

    /// Tsumo and ron deltas are zero-sum across seats; riichi sticks are
    /// the only thing that raises the sum, since they come from the pot.
    #[test]
    fn score_deltas_zero_sum(
        han in 1u8..13,
        fu_step in 0usize..10,
        dealer_wins in any::<bool>(),
        tsumo in any::<bool>(),
        honba in 0u32..4,
        sticks in 0u32..3,
    ) {
        let fu = [20u8, 25, 30, 40, 50, 60, 70, 80, 90, 100][fu_step];
        let rule = Ruleset::default_tenhou();
        let winner: u8 = if dealer_wins { 0 } else { 2 };
        let score = calculate_score(han, fu, dealer_wins, tsumo, honba, &rule).unwrap();
        let dealt_in = if tsumo { None } else { Some(1u8) };
        let deltas = payment_deltas(&score, winner, dealt_in, 0, 4, sticks, None);
        prop_assert_eq!(deltas.iter().sum::<i32>(), (sticks * 1000) as i32);
        prop_assert!(deltas[winner as usize] > 0);
    }
}
