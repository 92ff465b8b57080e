use crate::hand::HandShape;
use crate::tile::{Tile, TILE_KINDS};

/// Count unseen copies of the accepted tiles.
///
/// `visible` is everything the seat can see: its own hand with kans, every
/// pond and call across the table, and the revealed dora indicators. Red
/// fives are stripped on both sides before counting. Hands more than one
/// step from tenpai accept nothing.
pub fn count_ukeire(hand: &HandShape, waits: &[Tile], visible: &[Tile]) -> u8 {
    if hand.shanten().steps() > 1 {
        return 0;
    }

    let mut visible_counts = [0u8; TILE_KINDS];
    for t in visible {
        visible_counts[t.index()] += 1;
    }

    let mut counted = [false; TILE_KINDS];
    let mut ukeire = 0u8;
    for w in waits {
        let i = w.index();
        if counted[i] {
            continue;
        }
        counted[i] = true;
        ukeire += 4u8.saturating_sub(visible_counts[i]);
    }
    ukeire
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_tiles;
    use crate::shanten::ShantenEngine;

    fn tenpai_hand(s: &str, engine: &mut ShantenEngine) -> HandShape {
        HandShape::from_deal(parse_tiles(s).unwrap(), engine).unwrap()
    }

    #[test]
    fn counts_unseen_waits() {
        let mut engine = ShantenEngine::new();
        // Waiting 4s/7s with one 4s already in the pond.
        let hand = tenpai_hand("234567m234p5688s", &mut engine);
        let waits = hand.relevant_tiles().to_vec();
        let mut visible = hand.tiles_with_kans();
        visible.extend(parse_tiles("4s").unwrap());
        // 4s: one in hand, one in pond -> 2 left; 7s: none seen -> 4 left.
        assert_eq!(count_ukeire(&hand, &waits, &visible), 6);
    }

    #[test]
    fn red_fives_count_as_fives() {
        let mut engine = ShantenEngine::new();
        // Waiting 5p/8p.
        let hand = tenpai_hand("234567m234s67p88s", &mut engine);
        let waits = hand.relevant_tiles().to_vec();
        let mut visible = hand.tiles_with_kans();
        visible.extend(parse_tiles("0p").unwrap());
        assert_eq!(count_ukeire(&hand, &waits, &visible), 7);
    }

    #[test]
    fn distant_hands_accept_nothing() {
        let mut engine = ShantenEngine::new();
        let hand = tenpai_hand("159m159p159s1234z", &mut engine);
        let visible = hand.tiles_with_kans();
        assert_eq!(count_ukeire(&hand, hand.relevant_tiles(), &visible), 0);
    }
}
