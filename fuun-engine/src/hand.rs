use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, AnalysisResult};
use crate::shanten::{ShantenEngine, ShantenValue};
use crate::tile::{Tile, NORTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Chii,
    Pon,
    Minkan,
    Ankan,
    Kakan,
    Kita,
}

impl CallKind {
    pub fn is_kan(self) -> bool {
        matches!(self, CallKind::Minkan | CallKind::Ankan | CallKind::Kakan)
    }

    /// Calls that expose the hand. Ankan and kita keep it closed.
    pub fn opens_hand(self) -> bool {
        matches!(self, CallKind::Chii | CallKind::Pon | CallKind::Minkan | CallKind::Kakan)
    }

    fn tile_count(self) -> usize {
        match self {
            CallKind::Chii | CallKind::Pon => 3,
            CallKind::Minkan | CallKind::Ankan | CallKind::Kakan => 4,
            CallKind::Kita => 1,
        }
    }
}

/// Where the called tile came from, relative to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallDirection {
    SelfDraw,
    Right,
    Across,
    Left,
}

impl CallDirection {
    pub fn seat_offset(self) -> u8 {
        match self {
            CallDirection::SelfDraw => 0,
            CallDirection::Right => 1,
            CallDirection::Across => 2,
            CallDirection::Left => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub kind: CallKind,
    pub called: Tile,
    pub direction: CallDirection,
    /// All tiles set aside by the call, the called tile included.
    pub tiles: Vec<Tile>,
}

impl Call {
    pub fn new(
        kind: CallKind,
        called: Tile,
        direction: CallDirection,
        tiles: Vec<Tile>,
    ) -> AnalysisResult<Self> {
        let malformed = |message: String| AnalysisError::MalformedInput {
            context: "call".to_string(),
            message,
        };
        if tiles.len() != kind.tile_count() {
            return Err(malformed(format!(
                "{:?} with {} tiles",
                kind,
                tiles.len()
            )));
        }
        let from_self = direction == CallDirection::SelfDraw;
        let self_kind = matches!(kind, CallKind::Ankan | CallKind::Kakan | CallKind::Kita);
        if from_self != self_kind {
            return Err(malformed(format!("{:?} sourced {:?}", kind, direction)));
        }
        match kind {
            CallKind::Chii => {
                let mut ranks: Vec<u8> = tiles.iter().map(|t| t.normalize_red().code()).collect();
                ranks.sort_unstable();
                if tiles.iter().any(|t| !t.is_suited())
                    || ranks[1] != ranks[0] + 1
                    || ranks[2] != ranks[1] + 1
                {
                    return Err(malformed("chii tiles are not a run".to_string()));
                }
            }
            CallKind::Kita => {
                if tiles[0].normalize_red() != NORTH {
                    return Err(malformed("kita must set aside a north wind".to_string()));
                }
            }
            _ => {
                let base = tiles[0].normalize_red();
                if tiles.iter().any(|t| t.normalize_red() != base) {
                    return Err(malformed(format!("{:?} tiles are not identical", kind)));
                }
            }
        }
        Ok(Self {
            kind,
            called,
            direction,
            tiles,
        })
    }

    pub fn is_open(&self) -> bool {
        self.kind.opens_hand()
    }
}

/// One seat's hand at a point in time. Immutable: every update builds a new
/// value, recomputing the cached shanten whenever the concealed part lands
/// on a canonical (3n+1) size and carrying it across transient 3n+2 states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandShape {
    tiles: Vec<Tile>,
    calls: Vec<Call>,
    kita_count: u8,
    shanten: ShantenValue,
    relevant: Vec<Tile>,
    prev_shanten: ShantenValue,
}

impl HandShape {
    /// Build from a 13-tile deal.
    pub fn from_deal(mut tiles: Vec<Tile>, engine: &mut ShantenEngine) -> AnalysisResult<Self> {
        if tiles.len() != 13 {
            return Err(AnalysisError::MalformedInput {
                context: "haipai".to_string(),
                message: format!("dealt {} tiles", tiles.len()),
            });
        }
        tiles.sort_unstable();
        let analysis = engine.analyze(&tiles)?;
        Ok(Self {
            tiles,
            calls: Vec::new(),
            kita_count: 0,
            shanten: analysis.value,
            relevant: analysis.tiles,
            prev_shanten: analysis.value,
        })
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn kita_count(&self) -> u8 {
        self.kita_count
    }

    pub fn shanten(&self) -> ShantenValue {
        self.shanten
    }

    /// Waits at tenpai, advancing tiles at one-away.
    pub fn relevant_tiles(&self) -> &[Tile] {
        &self.relevant
    }

    /// Shanten of the previous canonical-size state.
    pub fn prev_shanten(&self) -> ShantenValue {
        self.prev_shanten
    }

    pub fn is_closed(&self) -> bool {
        self.calls.iter().all(|c| !c.is_open())
    }

    /// Concealed part is 3n+2: the hand owes a discard (or a win).
    pub fn awaits_discard(&self) -> bool {
        self.tiles.len() % 3 == 2
    }

    /// Tiles shown by non-kita calls.
    pub fn open_part(&self) -> Vec<Tile> {
        self.calls
            .iter()
            .filter(|c| c.kind != CallKind::Kita)
            .flat_map(|c| c.tiles.iter().copied())
            .collect()
    }

    /// Concealed tiles only.
    pub fn hidden_part(&self) -> &[Tile] {
        &self.tiles
    }

    /// Concealed tiles plus a triplet projection of each ankan.
    pub fn closed_part(&self) -> Vec<Tile> {
        let mut out = self.tiles.clone();
        for c in &self.calls {
            if c.kind == CallKind::Ankan {
                out.extend(c.tiles.iter().take(3).copied());
            }
        }
        out.sort_unstable();
        out
    }

    /// Concealed tiles plus every tile set aside by every call.
    pub fn tiles_with_kans(&self) -> Vec<Tile> {
        let mut out = self.tiles.clone();
        for c in &self.calls {
            out.extend(c.tiles.iter().copied());
        }
        out.sort_unstable();
        out
    }

    pub fn draw(&self, tile: Tile) -> AnalysisResult<Self> {
        if self.awaits_discard() {
            return Err(self.invariant("draw onto a full hand"));
        }
        let mut next = self.clone();
        insert_sorted(&mut next.tiles, tile);
        // Transient state keeps the last canonical shanten.
        next.prev_shanten = self.shanten;
        Ok(next)
    }

    pub fn discard(&self, tile: Tile, engine: &mut ShantenEngine) -> AnalysisResult<Self> {
        if !self.awaits_discard() {
            return Err(self.invariant("discard from a waiting hand"));
        }
        let mut next = self.clone();
        remove_tile(&mut next.tiles, tile)
            .ok_or_else(|| self.invariant(&format!("discard of absent tile {}", tile)))?;
        next.recompute(self.shanten, engine)?;
        Ok(next)
    }

    /// Apply a chii, pon or minkan on another seat's discard.
    pub fn declare_call(&self, call: Call, engine: &mut ShantenEngine) -> AnalysisResult<Self> {
        if !matches!(call.kind, CallKind::Chii | CallKind::Pon | CallKind::Minkan) {
            return Err(self.invariant("declare_call expects a discard-taking call"));
        }
        if self.awaits_discard() {
            return Err(self.invariant("call while a discard is owed"));
        }
        let mut next = self.clone();
        let mut called_consumed = false;
        for t in &call.tiles {
            // Exactly one copy, the called tile, comes from outside the hand.
            if !called_consumed && *t == call.called {
                called_consumed = true;
                continue;
            }
            remove_tile(&mut next.tiles, *t)
                .ok_or_else(|| self.invariant(&format!("call tile {} not in hand", t)))?;
        }
        if !called_consumed {
            return Err(self.invariant("called tile missing from call tiles"));
        }
        next.calls.push(call.clone());
        if call.kind == CallKind::Minkan {
            // A kan leaves the hand at canonical size until the rinshan draw.
            next.recompute(self.shanten, engine)?;
        } else {
            next.prev_shanten = self.shanten;
            next.shanten = self.shanten;
        }
        Ok(next)
    }

    /// Concealed kan out of a full hand.
    pub fn declare_ankan(&self, tile: Tile, engine: &mut ShantenEngine) -> AnalysisResult<Self> {
        if !self.awaits_discard() {
            return Err(self.invariant("ankan without a drawn tile"));
        }
        let mut next = self.clone();
        let mut removed = Vec::with_capacity(4);
        let norm = tile.normalize_red();
        while removed.len() < 4 {
            let pos = next
                .tiles
                .iter()
                .position(|t| t.normalize_red() == norm)
                .ok_or_else(|| self.invariant(&format!("ankan of {} without four copies", tile)))?;
            removed.push(next.tiles.remove(pos));
        }
        let call = Call::new(CallKind::Ankan, tile, CallDirection::SelfDraw, removed)?;
        next.calls.push(call);
        next.recompute(self.shanten, engine)?;
        Ok(next)
    }

    /// Promote an existing pon to kan with the drawn fourth tile.
    pub fn promote_kakan(&self, tile: Tile, engine: &mut ShantenEngine) -> AnalysisResult<Self> {
        if !self.awaits_discard() {
            return Err(self.invariant("kakan without a drawn tile"));
        }
        let mut next = self.clone();
        remove_tile(&mut next.tiles, tile)
            .ok_or_else(|| self.invariant(&format!("kakan tile {} not in hand", tile)))?;
        let norm = tile.normalize_red();
        let pon = next
            .calls
            .iter_mut()
            .find(|c| c.kind == CallKind::Pon && c.tiles[0].normalize_red() == norm)
            .ok_or_else(|| self.invariant(&format!("kakan of {} without a pon", tile)))?;
        pon.kind = CallKind::Kakan;
        pon.direction = CallDirection::SelfDraw;
        pon.tiles.push(tile);
        next.recompute(self.shanten, engine)?;
        Ok(next)
    }

    /// Set aside a north wind (sanma).
    pub fn declare_kita(&self, engine: &mut ShantenEngine) -> AnalysisResult<Self> {
        if !self.awaits_discard() {
            return Err(self.invariant("kita without a drawn tile"));
        }
        let mut next = self.clone();
        remove_tile(&mut next.tiles, NORTH)
            .ok_or_else(|| self.invariant("kita without a north wind in hand"))?;
        let call = Call::new(CallKind::Kita, NORTH, CallDirection::SelfDraw, vec![NORTH])?;
        next.calls.push(call);
        next.kita_count += 1;
        next.recompute(self.shanten, engine)?;
        Ok(next)
    }

    fn recompute(&mut self, prev: ShantenValue, engine: &mut ShantenEngine) -> AnalysisResult<()> {
        let analysis = engine.analyze(&self.tiles)?;
        self.shanten = analysis.value;
        self.relevant = analysis.tiles;
        self.prev_shanten = prev;
        Ok(())
    }

    fn invariant(&self, message: &str) -> AnalysisError {
        AnalysisError::InvariantViolation {
            hand: self
                .tiles
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(""),
            message: message.to_string(),
        }
    }
}

fn insert_sorted(tiles: &mut Vec<Tile>, tile: Tile) {
    let pos = tiles.partition_point(|&t| t < tile);
    tiles.insert(pos, tile);
}

fn remove_tile(tiles: &mut Vec<Tile>, tile: Tile) -> Option<Tile> {
    // Prefer an exact match so red fives stay tracked, but accept the
    // normalized kind either way round.
    if let Some(pos) = tiles.iter().position(|&t| t == tile) {
        return Some(tiles.remove(pos));
    }
    let norm = tile.normalize_red();
    tiles
        .iter()
        .position(|&t| t.normalize_red() == norm)
        .map(|pos| tiles.remove(pos))
}
