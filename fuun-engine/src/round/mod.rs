use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, AnalysisResult};
use crate::event::{AnnotatedEvent, RoundResult};
use crate::hand::HandShape;
use crate::rule::Ruleset;
use crate::shanten::ShantenEngine;
use crate::tile::Tile;
use crate::ukeire::count_ukeire;

pub mod event_handler;

/// A discarded tile in a seat's pond. Claimed tiles stay here for furiten
/// purposes but are excluded from visibility counting, since the claimer's
/// call already shows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PondTile {
    pub tile: Tile,
    pub claimed: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct SeatState {
    pub hand: HandShape,
    pub pond: Vec<PondTile>,
    pub riichi_declared: bool,
    pub double_riichi: bool,
    pub ippatsu: bool,
    /// Own-pond furiten: a wait tile sits in this seat's own discards.
    pub furiten: bool,
    /// Missed-ron furiten, cleared at the seat's own next discard unless
    /// the seat is locked into riichi.
    pub temporary_furiten: bool,
    pub nagashi: bool,
    pub has_discarded: bool,
    pub last_drawn: Option<Tile>,
    pub last_draw_index: Option<usize>,
    pub last_discard_index: Option<usize>,
}

impl SeatState {
    fn new(hand: HandShape) -> Self {
        Self {
            hand,
            pond: Vec::new(),
            riichi_declared: false,
            double_riichi: false,
            ippatsu: false,
            furiten: false,
            temporary_furiten: false,
            nagashi: true,
            has_discarded: false,
            last_drawn: None,
            last_draw_index: None,
            last_discard_index: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LastAction {
    None,
    Draw(u8),
    Discard(u8, Tile),
    Call(u8),
    Kakan(u8, Tile),
    Kita(u8),
}

/// Replays one round's normalized action stream, maintaining every seat's
/// hand and emitting derived events in input order.
#[derive(Debug)]
pub struct RoundReconstructor {
    pub(crate) rule: Ruleset,
    pub(crate) engine: ShantenEngine,

    pub(crate) round: u8,
    pub(crate) honba: u8,
    pub(crate) sticks: u32,
    pub(crate) scores: Vec<i32>,
    pub(crate) seats: Vec<SeatState>,

    pub(crate) dora_indicators: Vec<Tile>,
    pub(crate) ura_indicators: Vec<Tile>,
    pub(crate) visible_doras: usize,
    pub(crate) pending_doras: u8,
    pub(crate) wall: u8,

    pub(crate) events: Vec<AnnotatedEvent>,
    pub(crate) event_index: usize,
    pub(crate) first_turn: bool,
    pub(crate) rinshan: bool,
    pub(crate) pending_riichi: Option<u8>,
    pub(crate) last_action: LastAction,

    pub(crate) pao_daisangen: Option<u8>,
    pub(crate) pao_daisuushi: Option<u8>,
    pub(crate) pao_suukantsu: Option<u8>,

    pub(crate) started: bool,
    pub(crate) result: Option<RoundResult>,
}

impl RoundReconstructor {
    pub fn new(rule: Ruleset) -> Self {
        Self {
            rule,
            engine: ShantenEngine::new(),
            round: 0,
            honba: 0,
            sticks: 0,
            scores: Vec::new(),
            seats: Vec::new(),
            dora_indicators: Vec::new(),
            ura_indicators: Vec::new(),
            visible_doras: 0,
            pending_doras: 0,
            wall: 0,
            events: Vec::new(),
            event_index: 0,
            first_turn: true,
            rinshan: false,
            pending_riichi: None,
            last_action: LastAction::None,
            pao_daisangen: None,
            pao_daisuushi: None,
            pao_suukantsu: None,
            started: false,
            result: None,
        }
    }

    pub fn rule(&self) -> &Ruleset {
        &self.rule
    }

    pub fn events(&self) -> &[AnnotatedEvent] {
        &self.events
    }

    pub fn result(&self) -> Option<&RoundResult> {
        self.result.as_ref()
    }

    pub fn scores(&self) -> &[i32] {
        &self.scores
    }

    /// Seat of the current dealer.
    pub fn dealer(&self) -> u8 {
        self.round % self.rule.num_players
    }

    /// Round wind as a tile (E, S, W, N).
    pub fn round_wind(&self) -> Tile {
        let idx = (self.round / self.rule.num_players) % 4;
        Tile::from_code(41 + idx).unwrap_or(crate::tile::EAST)
    }

    /// Seat wind of `seat` as a tile.
    pub fn seat_wind(&self, seat: u8) -> Tile {
        let players = self.rule.num_players;
        let idx = (seat + players - self.dealer()) % players;
        Tile::from_code(41 + idx).unwrap_or(crate::tile::EAST)
    }

    /// Freeze the finished round into a record.
    pub fn into_record(self) -> AnalysisResult<RoundRecord> {
        let result = self.result.ok_or_else(|| AnalysisError::MalformedInput {
            context: format!("round {}", self.round),
            message: "stream ended without a result".to_string(),
        })?;
        let seats = self
            .seats
            .into_iter()
            .map(|s| SeatSummary {
                hand: s.hand,
                pond: s.pond,
                furiten: s.furiten,
                temporary_furiten: s.temporary_furiten,
                riichi: s.riichi_declared,
                nagashi: s.nagashi,
                last_draw_index: s.last_draw_index,
                last_discard_index: s.last_discard_index,
            })
            .collect();
        Ok(RoundRecord {
            rule: self.rule,
            round: self.round,
            honba: self.honba,
            sticks: self.sticks,
            scores: self.scores,
            seats,
            events: self.events,
            result,
        })
    }

    pub(crate) fn seat(&self, seat: u8) -> AnalysisResult<&SeatState> {
        self.seats
            .get(seat as usize)
            .ok_or_else(|| self.malformed(seat, "seat out of range"))
    }

    pub(crate) fn malformed(&self, seat: u8, message: &str) -> AnalysisError {
        AnalysisError::MalformedInput {
            context: format!(
                "round {} seat {} event {}",
                self.round, seat, self.event_index
            ),
            message: message.to_string(),
        }
    }

    /// Every tile `seat` can see: its own hand with kans, all ponds, all
    /// calls across the table, and the revealed dora indicators.
    pub(crate) fn visible_from(&self, seat: u8) -> Vec<Tile> {
        let mut visible = self.seats[seat as usize].hand.tiles_with_kans();
        for (i, st) in self.seats.iter().enumerate() {
            visible.extend(st.pond.iter().filter(|p| !p.claimed).map(|p| p.tile));
            if i != seat as usize {
                visible.extend(
                    st.hand
                        .calls()
                        .iter()
                        .flat_map(|c| c.tiles.iter().copied()),
                );
            }
        }
        visible.extend(self.dora_indicators.iter().take(self.visible_doras));
        visible
    }

    /// Refresh a seat's shanten-derived state after its hand settled on a
    /// canonical size, emitting `shanten_change` and `tenpai` on movement.
    pub(crate) fn note_hand_change(&mut self, seat: u8) {
        let st = &self.seats[seat as usize];
        let old = st.hand.prev_shanten();
        let new = st.hand.shanten();
        let waits: Vec<Tile> = st.hand.relevant_tiles().to_vec();

        let furiten = if new.is_tenpai() {
            let pond = &self.seats[seat as usize].pond;
            waits
                .iter()
                .any(|w| pond.iter().any(|p| p.tile.normalize_red() == w.normalize_red()))
        } else {
            false
        };

        if old != new {
            let visible = self.visible_from(seat);
            let st = &self.seats[seat as usize];
            let ukeire = count_ukeire(&st.hand, &waits, &visible);
            self.events.push(AnnotatedEvent::ShantenChange {
                seat,
                old,
                new,
                hand: st.hand.clone(),
                ukeire,
                furiten,
            });
            if new.is_tenpai() {
                self.events.push(AnnotatedEvent::Tenpai {
                    seat,
                    hand: st.hand.clone(),
                    waits: waits.clone(),
                    ukeire,
                });
            }
        }

        self.seats[seat as usize].furiten = furiten;
    }

    /// Reveal `count` more dora indicators, emitting one event per flip.
    pub(crate) fn reveal_doras(&mut self, count: u8) {
        for _ in 0..count {
            if self.visible_doras >= self.dora_indicators.len() {
                break;
            }
            let tile = self.dora_indicators[self.visible_doras];
            self.visible_doras += 1;
            self.events.push(AnnotatedEvent::DoraIndicator { tile });
        }
    }
}

/// A frozen, fully reconstructed round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    pub rule: Ruleset,
    pub round: u8,
    pub honba: u8,
    pub sticks: u32,
    pub scores: Vec<i32>,
    pub seats: Vec<SeatSummary>,
    pub events: Vec<AnnotatedEvent>,
    pub result: RoundResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatSummary {
    pub hand: HandShape,
    pub pond: Vec<PondTile>,
    /// A wait tile sits in the seat's own pond.
    pub furiten: bool,
    /// A wait passed by un-ronned since the seat's last discard.
    pub temporary_furiten: bool,
    pub riichi: bool,
    pub nagashi: bool,
    pub last_draw_index: Option<usize>,
    pub last_discard_index: Option<usize>,
}
