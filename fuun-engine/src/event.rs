use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, AnalysisResult};
use crate::hand::{CallDirection, HandShape};
use crate::score::Score;
use crate::shanten::ShantenValue;
use crate::tile::Tile;
use crate::yaku::WinEvaluation;

/// One normalized platform action. The platform decoders emit these in
/// strict table order; the reconstructor consumes them as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    StartRound {
        /// 0..15: east 1 is 0, south 1 is 4, and so on.
        round: u8,
        honba: u8,
        sticks: u32,
        scores: Vec<i32>,
        dora_indicators: Vec<Tile>,
        ura_indicators: Vec<Tile>,
        wall: u8,
    },
    Haipai {
        seat: u8,
        tiles: Vec<Tile>,
    },
    Draw {
        seat: u8,
        tile: Tile,
    },
    Discard {
        seat: u8,
        tile: Tile,
    },
    Riichi {
        seat: u8,
        tile: Tile,
    },
    Chii {
        seat: u8,
        called: Tile,
        tiles: Vec<Tile>,
        dir: CallDirection,
    },
    Pon {
        seat: u8,
        called: Tile,
        tiles: Vec<Tile>,
        dir: CallDirection,
    },
    Minkan {
        seat: u8,
        called: Tile,
        tiles: Vec<Tile>,
        dir: CallDirection,
    },
    Ankan {
        seat: u8,
        tile: Tile,
    },
    Kakan {
        seat: u8,
        tile: Tile,
    },
    Kita {
        seat: u8,
    },
    EndRound {
        result: ResultPayload,
    },
}

impl Action {
    /// Parse one action from its JSON form, mapping unrecognized kinds to
    /// the `UnknownResult` taxonomy instead of a bare serde error.
    pub fn from_json(text: &str) -> AnalysisResult<Action> {
        serde_json::from_str(text).map_err(|e| {
            let message = e.to_string();
            if message.contains("unknown variant") {
                AnalysisError::UnknownResult { kind: message }
            } else {
                AnalysisError::MalformedInput {
                    context: "action stream".to_string(),
                    message,
                }
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultPayload {
    Ron { winners: Vec<RonWinner> },
    Tsumo { seat: u8 },
    ExhaustiveDraw { draw: DrawKind, deltas: Vec<i32> },
    AbortiveDraw { draw: AbortKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RonWinner {
    pub seat: u8,
    pub from: u8,
    pub tile: Tile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawKind {
    Exhausted,
    NagashiMangan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortKind {
    FourWinds,
    FourKans,
    FourRiichis,
    NineTerminals,
    TripleRon,
}

/// Derived events the reconstructor appends to the round record, in input
/// order. Payloads snapshot the hand so later analysis never chases
/// mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnnotatedEvent {
    ShantenChange {
        seat: u8,
        old: ShantenValue,
        new: ShantenValue,
        hand: HandShape,
        ukeire: u8,
        furiten: bool,
    },
    Tenpai {
        seat: u8,
        hand: HandShape,
        waits: Vec<Tile>,
        ukeire: u8,
    },
    DoraIndicator {
        tile: Tile,
    },
    EndNagashi {
        seat: u8,
        tile: Tile,
        /// True when another seat's call broke it, false for an own discard.
        caused_by_call: bool,
    },
    Result {
        result: RoundResult,
    },
}

/// A settled win inside a frozen round result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinDeclaration {
    pub seat: u8,
    /// The seat that dealt in; `None` on tsumo.
    pub dealt_in: Option<u8>,
    pub tile: Tile,
    pub score: Score,
    pub evaluation: WinEvaluation,
    pub deltas: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundResult {
    Ron {
        winners: Vec<WinDeclaration>,
    },
    Tsumo {
        win: WinDeclaration,
    },
    ExhaustiveDraw {
        draw: DrawKind,
        deltas: Vec<i32>,
        tenpai_seats: Vec<u8>,
        nagashi_seats: Vec<u8>,
    },
    AbortiveDraw {
        draw: AbortKind,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_round_trip_through_json() {
        let action = Action::Discard {
            seat: 2,
            tile: Tile::from_code(15).unwrap(),
        };
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(Action::from_json(&json).unwrap(), action);
    }

    #[test]
    fn unknown_result_kind_is_flagged() {
        let err = Action::from_json(
            r#"{"type":"end_round","result":{"kind":"quadruple_ron"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::UnknownResult { .. }));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = Action::from_json(r#"{"type":"discard"}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedInput { .. }));
    }
}
