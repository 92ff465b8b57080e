use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, AnalysisResult};

/// Number of distinct tile kinds after red-five normalization.
pub const TILE_KINDS: usize = 34;

/// Wire-encoded tile.
///
/// 11-19 man, 21-29 pin, 31-39 sou, 41-44 winds (E/S/W/N), 45-47 dragons
/// (haku/hatsu/chun), 51/52/53 red fives of man/pin/sou.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tile(u8);

pub const EAST: Tile = Tile(41);
pub const SOUTH: Tile = Tile(42);
pub const WEST: Tile = Tile(43);
pub const NORTH: Tile = Tile(44);
pub const HAKU: Tile = Tile(45);
pub const HATSU: Tile = Tile(46);
pub const CHUN: Tile = Tile(47);

/// Terminals and honors, the kokushi/nagashi tile set.
pub const YAOCHUU: [Tile; 13] = [
    Tile(11),
    Tile(19),
    Tile(21),
    Tile(29),
    Tile(31),
    Tile(39),
    EAST,
    SOUTH,
    WEST,
    NORTH,
    HAKU,
    HATSU,
    CHUN,
];

impl Tile {
    pub fn from_code(code: u8) -> AnalysisResult<Self> {
        match code {
            11..=19 | 21..=29 | 31..=39 | 41..=47 | 51..=53 => Ok(Tile(code)),
            _ => Err(AnalysisError::MalformedInput {
                context: "tile".to_string(),
                message: format!("invalid tile code {}", code),
            }),
        }
    }

    pub fn code(self) -> u8 {
        self.0
    }

    /// Map a red five to its regular five; identity otherwise.
    pub fn normalize_red(self) -> Tile {
        match self.0 {
            51 => Tile(15),
            52 => Tile(25),
            53 => Tile(35),
            _ => self,
        }
    }

    pub fn is_red(self) -> bool {
        matches!(self.0, 51..=53)
    }

    pub fn is_manzu(self) -> bool {
        matches!(self.0, 11..=19 | 51)
    }

    pub fn is_pinzu(self) -> bool {
        matches!(self.0, 21..=29 | 52)
    }

    pub fn is_souzu(self) -> bool {
        matches!(self.0, 31..=39 | 53)
    }

    pub fn is_suited(self) -> bool {
        self.0 < 41 || self.is_red()
    }

    pub fn is_honor(self) -> bool {
        matches!(self.0, 41..=47)
    }

    pub fn is_wind(self) -> bool {
        matches!(self.0, 41..=44)
    }

    pub fn is_dragon(self) -> bool {
        matches!(self.0, 45..=47)
    }

    /// 1-9 for suited tiles (red fives read as 5), 0 for honors.
    pub fn rank(self) -> u8 {
        if self.is_honor() {
            0
        } else {
            self.normalize_red().0 % 10
        }
    }

    pub fn is_terminal(self) -> bool {
        self.is_suited() && matches!(self.rank(), 1 | 9)
    }

    pub fn is_terminal_or_honor(self) -> bool {
        self.is_honor() || self.is_terminal()
    }

    /// 2s, 3s, 4s, 6s, 8s and hatsu.
    pub fn is_green(self) -> bool {
        matches!(self.0, 32 | 33 | 34 | 36 | 38) || self == HATSU
    }

    /// Next tile within the same numbered suit. Honors and 9s have none.
    pub fn succ(self) -> Option<Tile> {
        let t = self.normalize_red();
        if t.is_honor() || t.rank() == 9 {
            None
        } else {
            Some(Tile(t.0 + 1))
        }
    }

    /// Previous tile within the same numbered suit. Honors and 1s have none.
    pub fn pred(self) -> Option<Tile> {
        let t = self.normalize_red();
        if t.is_honor() || t.rank() == 1 {
            None
        } else {
            Some(Tile(t.0 - 1))
        }
    }

    /// Dora indicated by this tile as an indicator: rank-cyclic within each
    /// numbered suit (9 wraps to 1), N wraps to E, chun wraps to haku. In
    /// sanma the manzu suit holds only 1m and 9m, which indicate each other.
    pub fn dora_from_indicator(self, sanma: bool) -> Tile {
        let t = self.normalize_red();
        match t.0 {
            11 if sanma => Tile(19),
            19 if sanma => Tile(11),
            11..=18 | 21..=28 | 31..=38 => Tile(t.0 + 1),
            19 | 29 | 39 => Tile(t.0 - 8),
            41..=43 => Tile(t.0 + 1),
            44 => EAST,
            45 | 46 => Tile(t.0 + 1),
            47 => HAKU,
            _ => t,
        }
    }

    /// Dense 0..34 index used by the pattern-search internals.
    /// Red fives normalize before indexing.
    pub fn index(self) -> usize {
        let t = self.normalize_red();
        match t.0 {
            11..=19 => (t.0 - 11) as usize,
            21..=29 => (t.0 - 21) as usize + 9,
            31..=39 => (t.0 - 31) as usize + 18,
            _ => (t.0 - 41) as usize + 27,
        }
    }

    /// Inverse of [`Tile::index`]. Panics on out-of-range input; internal
    /// search code only produces indices below [`TILE_KINDS`].
    pub fn from_index(index: usize) -> Tile {
        debug_assert!(index < TILE_KINDS);
        match index {
            0..=8 => Tile(11 + index as u8),
            9..=17 => Tile(21 + (index - 9) as u8),
            18..=26 => Tile(31 + (index - 18) as u8),
            _ => Tile(41 + (index - 27) as u8),
        }
    }
}

/// Dense-index variants of the tile predicates, for count-array code.
pub(crate) fn index_is_suited(i: usize) -> bool {
    i < 27
}

pub(crate) fn index_rank(i: usize) -> usize {
    i % 9
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const HONORS: [&str; 7] = ["E", "S", "W", "N", "P", "F", "C"];
        match self.0 {
            41..=47 => write!(f, "{}", HONORS[(self.0 - 41) as usize]),
            51 => write!(f, "5mr"),
            52 => write!(f, "5pr"),
            53 => write!(f, "5sr"),
            _ => {
                let suit = match self.0 / 10 {
                    1 => 'm',
                    2 => 'p',
                    _ => 's',
                };
                write!(f, "{}{}", self.0 % 10, suit)
            }
        }
    }
}

/// Count-array view of a tile multiset, red fives normalized.
pub fn to_counts(tiles: &[Tile]) -> [u8; TILE_KINDS] {
    let mut counts = [0u8; TILE_KINDS];
    for t in tiles {
        counts[t.index()] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn red_fives_normalize() {
        assert_eq!(Tile::from_code(51).unwrap().normalize_red(), Tile::from_code(15).unwrap());
        assert_eq!(Tile::from_code(52).unwrap().normalize_red(), Tile::from_code(25).unwrap());
        assert_eq!(Tile::from_code(53).unwrap().normalize_red(), Tile::from_code(35).unwrap());
        assert_eq!(Tile::from_code(15).unwrap().normalize_red(), Tile::from_code(15).unwrap());
    }

    #[test]
    fn succ_pred_stay_in_suit() {
        let nine_man = Tile::from_code(19).unwrap();
        assert_eq!(nine_man.succ(), None);
        let one_pin = Tile::from_code(21).unwrap();
        assert_eq!(one_pin.pred(), None);
        assert_eq!(one_pin.succ(), Some(Tile::from_code(22).unwrap()));
        assert_eq!(EAST.succ(), None);
        assert_eq!(CHUN.pred(), None);
    }

    #[test]
    fn dora_wraps() {
        assert_eq!(Tile::from_code(19).unwrap().dora_from_indicator(false), Tile::from_code(11).unwrap());
        assert_eq!(NORTH.dora_from_indicator(false), EAST);
        assert_eq!(CHUN.dora_from_indicator(false), HAKU);
        assert_eq!(Tile::from_code(51).unwrap().dora_from_indicator(false), Tile::from_code(16).unwrap());
        // Sanma manzu wrap skips 2m-8m.
        assert_eq!(Tile::from_code(11).unwrap().dora_from_indicator(true), Tile::from_code(19).unwrap());
        assert_eq!(Tile::from_code(19).unwrap().dora_from_indicator(true), Tile::from_code(11).unwrap());
    }

    #[test]
    fn dense_index_round_trips() {
        for code in (11..=19).chain(21..=29).chain(31..=39).chain(41..=47) {
            let t = Tile::from_code(code).unwrap();
            assert_eq!(Tile::from_index(t.index()), t);
        }
        assert_eq!(Tile::from_code(51).unwrap().index(), Tile::from_code(15).unwrap().index());
    }
}
