use crate::errors::AnalysisResult;
use crate::event::{
    Action, AnnotatedEvent, ResultPayload, RonWinner, RoundResult, WinDeclaration,
};
use crate::hand::{Call, CallDirection, CallKind, HandShape};
use crate::score::{calculate_score, payment_deltas};
use crate::tile::Tile;
use crate::yaku::{evaluate_win, WinContext, Yaku};

use super::{LastAction, PondTile, RoundReconstructor, SeatState};

impl RoundReconstructor {
    /// Apply one normalized action. Errors carry round/seat/event context
    /// and leave the reconstructor unusable for this round.
    pub fn apply(&mut self, action: &Action) -> AnalysisResult<()> {
        let result = self.handle(action);
        self.event_index += 1;
        result
    }

    fn handle(&mut self, action: &Action) -> AnalysisResult<()> {
        // A ron on the riichi tile cancels the unsettled stick; any other
        // following action banks it.
        let cancels_stick = matches!(
            action,
            Action::EndRound {
                result: ResultPayload::Ron { .. }
            }
        );
        self.settle_riichi_stick(cancels_stick);

        if self.result.is_some() {
            return Err(self.malformed(0, "action after end of round"));
        }

        match action {
            Action::StartRound {
                round,
                honba,
                sticks,
                scores,
                dora_indicators,
                ura_indicators,
                wall,
            } => self.start_round(
                *round,
                *honba,
                *sticks,
                scores,
                dora_indicators,
                ura_indicators,
                *wall,
            ),
            Action::Haipai { seat, tiles } => self.haipai(*seat, tiles),
            Action::Draw { seat, tile } => self.draw(*seat, *tile),
            Action::Discard { seat, tile } => self.discard(*seat, *tile, false),
            Action::Riichi { seat, tile } => self.discard(*seat, *tile, true),
            Action::Chii {
                seat,
                called,
                tiles,
                dir,
            } => self.call(CallKind::Chii, *seat, *called, tiles, *dir),
            Action::Pon {
                seat,
                called,
                tiles,
                dir,
            } => self.call(CallKind::Pon, *seat, *called, tiles, *dir),
            Action::Minkan {
                seat,
                called,
                tiles,
                dir,
            } => self.call(CallKind::Minkan, *seat, *called, tiles, *dir),
            Action::Ankan { seat, tile } => self.ankan(*seat, *tile),
            Action::Kakan { seat, tile } => self.kakan(*seat, *tile),
            Action::Kita { seat } => self.kita(*seat),
            Action::EndRound { result } => self.end_round(result),
        }
    }

    fn ingest(&self, tile: Tile) -> Tile {
        if self.rule.use_red_fives {
            tile
        } else {
            tile.normalize_red()
        }
    }

    fn settle_riichi_stick(&mut self, cancel: bool) {
        if let Some(seat) = self.pending_riichi.take() {
            if !cancel {
                self.scores[seat as usize] -= 1000;
                self.sticks += 1;
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn start_round(
        &mut self,
        round: u8,
        honba: u8,
        sticks: u32,
        scores: &[i32],
        dora_indicators: &[Tile],
        ura_indicators: &[Tile],
        wall: u8,
    ) -> AnalysisResult<()> {
        if self.started {
            return Err(self.malformed(0, "duplicate start_round"));
        }
        if round > 15 {
            return Err(self.malformed(0, "round index out of range"));
        }
        if scores.len() != self.rule.num_players as usize {
            return Err(self.malformed(0, "score count does not match player count"));
        }
        self.round = round;
        self.honba = honba;
        self.sticks = sticks;
        self.scores = scores.to_vec();
        self.dora_indicators = dora_indicators.iter().map(|&t| self.ingest(t)).collect();
        self.ura_indicators = ura_indicators.iter().map(|&t| self.ingest(t)).collect();
        self.wall = wall;
        self.started = true;
        self.reveal_doras(self.rule.starting_doras);
        Ok(())
    }

    fn haipai(&mut self, seat: u8, tiles: &[Tile]) -> AnalysisResult<()> {
        if !self.started {
            return Err(self.malformed(seat, "haipai before start_round"));
        }
        if seat >= self.rule.num_players {
            return Err(self.malformed(seat, "seat out of range"));
        }
        if seat as usize != self.seats.len() {
            return Err(self.malformed(seat, "haipai out of seat order"));
        }
        let tiles: Vec<Tile> = tiles.iter().map(|&t| self.ingest(t)).collect();
        let hand = HandShape::from_deal(tiles, &mut self.engine)?;
        self.seats.push(SeatState::new(hand));

        let st = &self.seats[seat as usize];
        if st.hand.shanten().is_tenpai() {
            let waits = st.hand.relevant_tiles().to_vec();
            let visible = self.visible_from(seat);
            let ukeire = crate::ukeire::count_ukeire(&st.hand, &waits, &visible);
            let hand = st.hand.clone();
            self.events.push(AnnotatedEvent::Tenpai {
                seat,
                hand,
                waits,
                ukeire,
            });
        }
        Ok(())
    }

    fn draw(&mut self, seat: u8, tile: Tile) -> AnalysisResult<()> {
        self.seat(seat)?;
        if self.wall == 0 {
            return Err(self.malformed(seat, "draw from an empty wall"));
        }
        self.wall -= 1;
        let t = self.ingest(tile);
        let idx = seat as usize;
        self.seats[idx].hand = self.seats[idx].hand.draw(t)?;
        self.seats[idx].last_drawn = Some(t);
        self.seats[idx].last_draw_index = Some(self.event_index);
        self.last_action = LastAction::Draw(seat);
        Ok(())
    }

    fn discard(&mut self, seat: u8, tile: Tile, riichi: bool) -> AnalysisResult<()> {
        self.seat(seat)?;
        let t = self.ingest(tile);
        let idx = seat as usize;
        let first_go_around = self.first_turn && !self.seats[idx].has_discarded;

        let new_hand = self.seats[idx].hand.discard(t, &mut self.engine)?;
        self.seats[idx].hand = new_hand;
        self.seats[idx].pond.push(PondTile {
            tile: t,
            claimed: false,
        });
        self.seats[idx].last_discard_index = Some(self.event_index);
        self.seats[idx].has_discarded = true;
        self.seats[idx].last_drawn = None;

        if riichi {
            if self.seats[idx].riichi_declared {
                return Err(self.malformed(seat, "duplicate riichi declaration"));
            }
            if !self.seats[idx].hand.is_closed() {
                return Err(self.malformed(seat, "riichi with an open hand"));
            }
            self.seats[idx].riichi_declared = true;
            self.seats[idx].double_riichi = first_go_around;
            self.seats[idx].ippatsu = true;
            self.pending_riichi = Some(seat);
        } else {
            self.seats[idx].ippatsu = false;
            if !self.seats[idx].riichi_declared {
                self.seats[idx].temporary_furiten = false;
            }
        }

        if self.seats[idx].nagashi && !t.is_terminal_or_honor() {
            self.seats[idx].nagashi = false;
            self.events.push(AnnotatedEvent::EndNagashi {
                seat,
                tile: t,
                caused_by_call: false,
            });
        }

        // Deferred kan dora flips on the discard after the kan.
        if self.pending_doras > 0 {
            let n = self.pending_doras;
            self.pending_doras = 0;
            self.reveal_doras(n);
        }

        self.note_hand_change(seat);

        // Passed-wait bookkeeping for the other seats.
        let norm = t.normalize_red();
        for other in 0..self.seats.len() {
            if other == idx {
                continue;
            }
            let st = &self.seats[other];
            if st.hand.shanten().is_tenpai()
                && st
                    .hand
                    .relevant_tiles()
                    .iter()
                    .any(|w| w.normalize_red() == norm)
            {
                self.seats[other].temporary_furiten = true;
            }
        }

        self.rinshan = false;
        self.last_action = LastAction::Discard(seat, t);
        Ok(())
    }

    fn call(
        &mut self,
        kind: CallKind,
        seat: u8,
        called: Tile,
        tiles: &[Tile],
        dir: CallDirection,
    ) -> AnalysisResult<()> {
        self.seat(seat)?;
        let players = self.rule.num_players;
        let t = self.ingest(called);
        let tiles: Vec<Tile> = tiles.iter().map(|&x| self.ingest(x)).collect();
        let discarder = (seat + dir.seat_offset()) % players;
        if discarder == seat {
            return Err(self.malformed(seat, "discard call sourced from self"));
        }
        self.seat(discarder)?;

        let d_idx = discarder as usize;
        let claim_matches = match self.seats[d_idx].pond.last_mut() {
            Some(last) if last.tile.normalize_red() == t.normalize_red() => {
                last.claimed = true;
                true
            }
            _ => false,
        };
        if !claim_matches {
            return Err(self.malformed(seat, "called tile does not match last discard"));
        }
        if self.seats[d_idx].nagashi {
            self.seats[d_idx].nagashi = false;
            self.events.push(AnnotatedEvent::EndNagashi {
                seat: discarder,
                tile: t,
                caused_by_call: true,
            });
        }

        let call = Call::new(kind, t, dir, tiles)?;
        let idx = seat as usize;
        let new_hand = self.seats[idx].hand.declare_call(call, &mut self.engine)?;
        self.seats[idx].hand = new_hand;

        for st in &mut self.seats {
            st.ippatsu = false;
        }
        self.first_turn = false;
        self.rinshan = kind == CallKind::Minkan;

        self.track_pao(seat, Some(discarder));
        if kind == CallKind::Minkan {
            self.flip_kan_dora();
            self.note_hand_change(seat);
        }
        self.last_action = LastAction::Call(seat);
        Ok(())
    }

    fn ankan(&mut self, seat: u8, tile: Tile) -> AnalysisResult<()> {
        self.seat(seat)?;
        let t = self.ingest(tile);
        let idx = seat as usize;
        let new_hand = self.seats[idx].hand.declare_ankan(t, &mut self.engine)?;
        self.seats[idx].hand = new_hand;
        for st in &mut self.seats {
            st.ippatsu = false;
        }
        self.first_turn = false;
        self.rinshan = true;
        self.track_pao(seat, None);
        self.flip_kan_dora();
        self.note_hand_change(seat);
        self.last_action = LastAction::Call(seat);
        Ok(())
    }

    fn kakan(&mut self, seat: u8, tile: Tile) -> AnalysisResult<()> {
        self.seat(seat)?;
        let t = self.ingest(tile);
        let idx = seat as usize;
        let new_hand = self.seats[idx].hand.promote_kakan(t, &mut self.engine)?;
        self.seats[idx].hand = new_hand;
        for st in &mut self.seats {
            st.ippatsu = false;
        }
        self.first_turn = false;
        self.rinshan = true;
        self.track_pao(seat, None);
        self.flip_kan_dora();
        self.note_hand_change(seat);
        self.last_action = LastAction::Kakan(seat, t);
        Ok(())
    }

    fn kita(&mut self, seat: u8) -> AnalysisResult<()> {
        self.seat(seat)?;
        if !self.rule.is_sanma() {
            return Err(self.malformed(seat, "kita outside sanma"));
        }
        let idx = seat as usize;
        let new_hand = self.seats[idx].hand.declare_kita(&mut self.engine)?;
        self.seats[idx].hand = new_hand;
        self.note_hand_change(seat);
        self.last_action = LastAction::Kita(seat);
        Ok(())
    }

    fn flip_kan_dora(&mut self) {
        if self.rule.immediate_kan_dora {
            self.reveal_doras(1);
        } else {
            self.pending_doras += 1;
        }
    }

    /// After a call lands, record which discard fed a pao-liable shape.
    fn track_pao(&mut self, seat: u8, fed_by: Option<u8>) {
        let (dragon_melds, wind_melds, kans) = {
            let calls = self.seats[seat as usize].hand.calls();
            let is_set_call = |c: &Call| {
                matches!(
                    c.kind,
                    CallKind::Pon | CallKind::Minkan | CallKind::Ankan | CallKind::Kakan
                )
            };
            (
                calls
                    .iter()
                    .filter(|c| is_set_call(c) && c.tiles[0].normalize_red().is_dragon())
                    .count(),
                calls
                    .iter()
                    .filter(|c| is_set_call(c) && c.tiles[0].normalize_red().is_wind())
                    .count(),
                calls.iter().filter(|c| c.kind.is_kan()).count(),
            )
        };
        if let Some(from) = fed_by {
            if dragon_melds == 3 && self.pao_daisangen.is_none() {
                self.pao_daisangen = Some(from);
            }
            if wind_melds == 4 && self.pao_daisuushi.is_none() {
                self.pao_daisuushi = Some(from);
            }
        }
        if kans == 4 && self.pao_suukantsu.is_none() {
            self.pao_suukantsu = fed_by;
        }
    }

    fn pao_for(&self, yaku: &[(Yaku, u8)]) -> Option<u8> {
        for (y, _) in yaku {
            let liable = match y {
                Yaku::Daisangen => self.pao_daisangen,
                Yaku::Daisuushi => self.pao_daisuushi,
                Yaku::Suukantsu => self.pao_suukantsu,
                _ => None,
            };
            if liable.is_some() {
                return liable;
            }
        }
        None
    }

    fn visible_dora_indicators(&self) -> Vec<Tile> {
        self.dora_indicators
            .iter()
            .take(self.visible_doras)
            .copied()
            .collect()
    }

    fn revealed_ura(&self, riichi: bool) -> Vec<Tile> {
        if !riichi {
            return Vec::new();
        }
        self.ura_indicators
            .iter()
            .take(self.visible_doras)
            .copied()
            .collect()
    }

    fn end_round(&mut self, payload: &ResultPayload) -> AnalysisResult<()> {
        if !self.started || self.seats.len() != self.rule.num_players as usize {
            return Err(self.malformed(0, "end_round before all seats were dealt"));
        }
        match payload {
            ResultPayload::Tsumo { seat } => self.end_tsumo(*seat),
            ResultPayload::Ron { winners } => self.end_ron(winners),
            ResultPayload::ExhaustiveDraw { draw, deltas } => {
                let tenpai_seats: Vec<u8> = (0..self.seats.len() as u8)
                    .filter(|&s| self.seats[s as usize].hand.shanten().is_tenpai())
                    .collect();
                let nagashi_seats: Vec<u8> = (0..self.seats.len() as u8)
                    .filter(|&s| self.seats[s as usize].nagashi)
                    .collect();
                let deltas = if deltas.is_empty() {
                    vec![0; self.seats.len()]
                } else if deltas.len() == self.seats.len() {
                    deltas.clone()
                } else {
                    return Err(self.malformed(0, "draw deltas do not match player count"));
                };
                for (score, d) in self.scores.iter_mut().zip(&deltas) {
                    *score += d;
                }
                self.finish(RoundResult::ExhaustiveDraw {
                    draw: *draw,
                    deltas,
                    tenpai_seats,
                    nagashi_seats,
                });
                Ok(())
            }
            ResultPayload::AbortiveDraw { draw } => {
                self.finish(RoundResult::AbortiveDraw { draw: *draw });
                Ok(())
            }
        }
    }

    fn end_tsumo(&mut self, seat: u8) -> AnalysisResult<()> {
        self.seat(seat)?;
        let idx = seat as usize;
        let win_tile = self.seats[idx]
            .last_drawn
            .ok_or_else(|| self.malformed(seat, "tsumo without a preceding draw"))?;
        if !self.seats[idx].hand.awaits_discard() {
            return Err(self.malformed(seat, "tsumo from a hand that owes no discard"));
        }

        // Strip the winning tile so the recorded hand and its waits line up.
        let hand13 = self.seats[idx].hand.discard(win_tile, &mut self.engine)?;
        let st = &self.seats[idx];
        let ctx = WinContext {
            rule: self.rule,
            round_wind: self.round_wind(),
            seat_wind: self.seat_wind(seat),
            tsumo: true,
            riichi: st.riichi_declared,
            double_riichi: st.double_riichi,
            ippatsu: st.ippatsu,
            haitei: self.wall == 0 && !self.rinshan,
            houtei: false,
            rinshan: self.rinshan,
            chankan: false,
            first_turn: self.first_turn && !st.has_discarded,
            dora_indicators: self.visible_dora_indicators(),
            ura_indicators: self.revealed_ura(st.riichi_declared),
        };
        let evaluation = evaluate_win(&hand13, win_tile, &ctx)?;

        let dealer = self.dealer();
        let score = calculate_score(
            evaluation.han,
            evaluation.fu,
            seat == dealer,
            true,
            self.honba as u32,
            &self.rule,
        )?;
        let pao = self.pao_for(&evaluation.yaku);
        let deltas = payment_deltas(
            &score,
            seat,
            None,
            dealer,
            self.rule.num_players,
            self.sticks,
            pao,
        );
        for (s, d) in self.scores.iter_mut().zip(&deltas) {
            *s += d;
        }
        self.sticks = 0;
        self.seats[idx].hand = hand13;

        let win = WinDeclaration {
            seat,
            dealt_in: None,
            tile: win_tile,
            score,
            evaluation,
            deltas,
        };
        self.finish(RoundResult::Tsumo { win });
        Ok(())
    }

    fn end_ron(&mut self, winners: &[RonWinner]) -> AnalysisResult<()> {
        let players = self.rule.num_players;
        if winners.is_empty() || winners.len() >= players as usize {
            return Err(self.malformed(0, "ron winner count out of range"));
        }
        let (payer, chankan) = match self.last_action {
            LastAction::Discard(s, _) => (s, false),
            LastAction::Kakan(s, _) => (s, true),
            _ => return Err(self.malformed(0, "ron without a discard or kakan")),
        };

        // Turn order from the dealt-in seat decides who collects the pot.
        let mut ordered = winners.to_vec();
        ordered.sort_by_key(|w| (w.seat + players - payer) % players);
        let multi = ordered.len() > 1;

        let dealer = self.dealer();
        let mut declarations = Vec::with_capacity(ordered.len());
        for (i, w) in ordered.iter().enumerate() {
            self.seat(w.seat)?;
            if w.from != payer {
                return Err(self.malformed(w.seat, "ron source does not match last actor"));
            }
            let st = &self.seats[w.seat as usize];
            if st.hand.awaits_discard() {
                return Err(self.malformed(w.seat, "ron from a hand that owes a discard"));
            }
            let win_tile = self.ingest(w.tile);
            let ctx = WinContext {
                rule: self.rule,
                round_wind: self.round_wind(),
                seat_wind: self.seat_wind(w.seat),
                tsumo: false,
                riichi: st.riichi_declared,
                double_riichi: st.double_riichi,
                ippatsu: st.ippatsu,
                haitei: false,
                houtei: self.wall == 0 && !chankan,
                rinshan: false,
                chankan,
                first_turn: self.first_turn && !st.has_discarded,
                dora_indicators: self.visible_dora_indicators(),
                ura_indicators: self.revealed_ura(st.riichi_declared),
            };
            let evaluation = evaluate_win(&st.hand, win_tile, &ctx)?;

            let honba = if i == 0 { self.honba as u32 } else { 0 };
            let sticks = if i == 0 { self.sticks } else { 0 };
            let score = calculate_score(
                evaluation.han,
                evaluation.fu,
                w.seat == dealer,
                false,
                honba,
                &self.rule,
            )?;
            // Responsibility payments never combine with a shared pot.
            let pao = if multi { None } else { self.pao_for(&evaluation.yaku) };
            let deltas = payment_deltas(&score, w.seat, Some(payer), dealer, players, sticks, pao);
            for (s, d) in self.scores.iter_mut().zip(&deltas) {
                *s += d;
            }
            declarations.push(WinDeclaration {
                seat: w.seat,
                dealt_in: Some(payer),
                tile: win_tile,
                score,
                evaluation,
                deltas,
            });
        }
        self.sticks = 0;
        self.finish(RoundResult::Ron {
            winners: declarations,
        });
        Ok(())
    }

    fn finish(&mut self, result: RoundResult) {
        self.events.push(AnnotatedEvent::Result {
            result: result.clone(),
        });
        self.result = Some(result);
    }
}
