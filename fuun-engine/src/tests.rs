#[cfg(test)]
mod unit_tests {
    use crate::event::{
        Action, AnnotatedEvent, DrawKind, ResultPayload, RonWinner, RoundResult,
    };
    use crate::parser::{parse_tile, parse_tiles};
    use crate::round::RoundReconstructor;
    use crate::rule::Ruleset;
    use crate::yaku::Yaku;

    fn start(recon: &mut RoundReconstructor, hands: [&str; 4]) {
        recon
            .apply(&Action::StartRound {
                round: 0,
                honba: 0,
                sticks: 0,
                scores: vec![25000; 4],
                dora_indicators: vec![parse_tile("1z").unwrap()],
                ura_indicators: vec![parse_tile("2z").unwrap()],
                wall: 70,
            })
            .unwrap();
        for (seat, hand) in hands.iter().enumerate() {
            recon
                .apply(&Action::Haipai {
                    seat: seat as u8,
                    tiles: parse_tiles(hand).unwrap(),
                })
                .unwrap();
        }
    }

    fn draw(recon: &mut RoundReconstructor, seat: u8, tile: &str) {
        recon
            .apply(&Action::Draw {
                seat,
                tile: parse_tile(tile).unwrap(),
            })
            .unwrap();
    }

    fn discard(recon: &mut RoundReconstructor, seat: u8, tile: &str) {
        recon
            .apply(&Action::Discard {
                seat,
                tile: parse_tile(tile).unwrap(),
            })
            .unwrap();
    }

    // Dealer holds 123m 456m 78m 22s 777z: tenpai on 6m/9m with a chun
    // triplet for the yaku.
    const DEALER_TENPAI: &str = "12345678m22s777z";
    const FILLER_1: &str = "147m258p369s1234z";
    const FILLER_2: &str = "1122m3344p5566s7z";
    const FILLER_3: &str = "159m268m37p48s123z";

    #[test]
    fn dealer_ron_settles_scores() {
        let mut recon = RoundReconstructor::new(Ruleset::default_tenhou());
        start(&mut recon, [DEALER_TENPAI, FILLER_1, FILLER_2, FILLER_3]);

        // Dealt tenpai emits an event before any action.
        assert!(recon
            .events()
            .iter()
            .any(|e| matches!(e, AnnotatedEvent::Tenpai { seat: 0, .. })));

        draw(&mut recon, 0, "5z");
        discard(&mut recon, 0, "5z");
        draw(&mut recon, 1, "4z");
        discard(&mut recon, 1, "4z");
        draw(&mut recon, 2, "9m");
        discard(&mut recon, 2, "9m");

        recon
            .apply(&Action::EndRound {
                result: ResultPayload::Ron {
                    winners: vec![RonWinner {
                        seat: 0,
                        from: 2,
                        tile: parse_tile("9m").unwrap(),
                    }],
                },
            })
            .unwrap();

        let record = recon.into_record().unwrap();
        match &record.result {
            RoundResult::Ron { winners } => {
                assert_eq!(winners.len(), 1);
                let w = &winners[0];
                assert_eq!(w.seat, 0);
                assert_eq!(w.dealt_in, Some(2));
                assert!(w.evaluation.yaku.iter().any(|(y, _)| *y == Yaku::Chun));
                // 20 base + 10 menzen ron + 8 closed honor triplet -> 40 fu.
                assert_eq!(w.evaluation.fu, 40);
                assert_eq!(w.evaluation.han, 1);
                assert_eq!(w.score.pay_ron, 2000);
            }
            other => panic!("expected ron, got {:?}", other),
        }
        assert_eq!(record.scores, vec![27000, 25000, 23000, 25000]);
    }

    #[test]
    fn dealer_tsumo_splits_three_ways() {
        let mut recon = RoundReconstructor::new(Ruleset::default_tenhou());
        start(&mut recon, [DEALER_TENPAI, FILLER_1, FILLER_2, FILLER_3]);

        draw(&mut recon, 0, "5z");
        discard(&mut recon, 0, "5z");
        draw(&mut recon, 1, "4z");
        discard(&mut recon, 1, "4z");
        draw(&mut recon, 0, "9m");
        recon
            .apply(&Action::EndRound {
                result: ResultPayload::Tsumo { seat: 0 },
            })
            .unwrap();

        let record = recon.into_record().unwrap();
        match &record.result {
            RoundResult::Tsumo { win } => {
                assert!(win
                    .evaluation
                    .yaku
                    .iter()
                    .any(|(y, _)| *y == Yaku::MenzenTsumo));
                assert!(win.evaluation.yaku.iter().any(|(y, _)| *y == Yaku::Chun));
                // 20 base + 2 tsumo + 8 closed honor triplet -> 30 fu, 2 han.
                assert_eq!(win.evaluation.fu, 30);
                assert_eq!(win.score.pay_tsumo_ko, 1000);
            }
            other => panic!("expected tsumo, got {:?}", other),
        }
        assert_eq!(record.scores, vec![28000, 24000, 24000, 24000]);
    }

    #[test]
    fn shanten_changes_are_reported() {
        let mut recon = RoundReconstructor::new(Ruleset::default_tenhou());
        start(&mut recon, [DEALER_TENPAI, FILLER_1, FILLER_2, FILLER_3]);

        // Dealer breaks tenpai by throwing a middle tile away.
        draw(&mut recon, 0, "5z");
        discard(&mut recon, 0, "4m");

        let change = recon.events().iter().find_map(|e| match e {
            AnnotatedEvent::ShantenChange { seat: 0, old, new, .. } => Some((*old, *new)),
            _ => None,
        });
        let (old, new) = change.expect("shanten change event");
        assert_eq!(old.steps(), 0);
        assert_eq!(new.steps(), 1);
    }

    #[test]
    fn riichi_stick_banks_on_next_action() {
        let mut recon = RoundReconstructor::new(Ruleset::default_tenhou());
        start(&mut recon, [DEALER_TENPAI, FILLER_1, FILLER_2, FILLER_3]);

        draw(&mut recon, 0, "5z");
        recon
            .apply(&Action::Riichi {
                seat: 0,
                tile: parse_tile("5z").unwrap(),
            })
            .unwrap();
        // Not banked until the declaration passes.
        assert_eq!(recon.scores()[0], 25000);
        draw(&mut recon, 1, "4z");
        assert_eq!(recon.scores()[0], 24000);
        discard(&mut recon, 1, "4z");

        // Dealer tsumo now carries riichi plus the returned stick.
        draw(&mut recon, 0, "9m");
        recon
            .apply(&Action::EndRound {
                result: ResultPayload::Tsumo { seat: 0 },
            })
            .unwrap();
        let record = recon.into_record().unwrap();
        match &record.result {
            RoundResult::Tsumo { win } => {
                // Declared on the very first discard with no calls before it.
                assert!(win
                    .evaluation
                    .yaku
                    .iter()
                    .any(|(y, _)| *y == Yaku::DoubleRiichi));
                assert!(win.evaluation.yaku.iter().any(|(y, _)| *y == Yaku::Ippatsu));
                // The banked stick comes back with the win.
                assert_eq!(win.deltas[0] - win.score.total as i32, 1000);
            }
            other => panic!("expected tsumo, got {:?}", other),
        }
    }

    #[test]
    fn nagashi_breaks_on_middle_discard_and_call() {
        let mut recon = RoundReconstructor::new(Ruleset::default_tenhou());
        start(&mut recon, [DEALER_TENPAI, FILLER_1, FILLER_2, FILLER_3]);

        draw(&mut recon, 0, "5z");
        discard(&mut recon, 0, "4m");
        assert!(recon
            .events()
            .iter()
            .any(|e| matches!(e, AnnotatedEvent::EndNagashi { seat: 0, caused_by_call: false, .. })));

        recon
            .apply(&Action::EndRound {
                result: ResultPayload::ExhaustiveDraw {
                    draw: DrawKind::Exhausted,
                    deltas: vec![],
                },
            })
            .unwrap();
        let record = recon.into_record().unwrap();
        match &record.result {
            RoundResult::ExhaustiveDraw { nagashi_seats, .. } => {
                assert!(!nagashi_seats.contains(&0));
                assert!(nagashi_seats.contains(&1));
            }
            other => panic!("expected draw, got {:?}", other),
        }
    }

    #[test]
    fn furiten_set_by_own_discard_of_wait() {
        let mut recon = RoundReconstructor::new(Ruleset::default_tenhou());
        start(&mut recon, [DEALER_TENPAI, FILLER_1, FILLER_2, FILLER_3]);

        // Dealer throws away one of its own winning tiles.
        draw(&mut recon, 0, "9m");
        discard(&mut recon, 0, "9m");

        let record_furiten = recon.events().iter().rev().find_map(|e| match e {
            AnnotatedEvent::ShantenChange { seat: 0, furiten, .. } => Some(*furiten),
            _ => None,
        });
        // Shanten did not change, so check the seat state via the record.
        assert!(record_furiten.is_none());
        recon
            .apply(&Action::EndRound {
                result: ResultPayload::ExhaustiveDraw {
                    draw: DrawKind::Exhausted,
                    deltas: vec![],
                },
            })
            .unwrap();
        let record = recon.into_record().unwrap();
        assert!(record.seats[0].furiten);
    }

    #[test]
    fn pon_marks_pond_tile_claimed() {
        use crate::hand::CallDirection;
        let mut recon = RoundReconstructor::new(Ruleset::default_tenhou());
        // Seat 1 holds two 4z to pon seat 0's discard.
        start(
            &mut recon,
            [DEALER_TENPAI, "44z147m258p369s12z", FILLER_2, FILLER_3],
        );

        draw(&mut recon, 0, "4z");
        discard(&mut recon, 0, "4z");
        recon
            .apply(&Action::Pon {
                seat: 1,
                called: parse_tile("4z").unwrap(),
                tiles: parse_tiles("444z").unwrap(),
                dir: CallDirection::Left,
            })
            .unwrap();

        recon
            .apply(&Action::EndRound {
                result: ResultPayload::ExhaustiveDraw {
                    draw: DrawKind::Exhausted,
                    deltas: vec![],
                },
            })
            .unwrap();
        let record = recon.into_record().unwrap();
        assert!(record.seats[0].pond[0].claimed);
        // The caller's nagashi is intact; the discarder's is broken.
        match &record.result {
            RoundResult::ExhaustiveDraw { nagashi_seats, .. } => {
                assert!(!nagashi_seats.contains(&0));
            }
            other => panic!("expected draw, got {:?}", other),
        }
        assert_eq!(record.seats[1].hand.calls().len(), 1);
    }

    #[test]
    fn deferred_kan_dora_flips_on_next_discard() {
        let mut recon = RoundReconstructor::new(Ruleset::default_tenhou());
        recon
            .apply(&Action::StartRound {
                round: 0,
                honba: 0,
                sticks: 0,
                scores: vec![25000; 4],
                dora_indicators: parse_tiles("1z3m").unwrap(),
                ura_indicators: parse_tiles("2z4m").unwrap(),
                wall: 70,
            })
            .unwrap();
        for (seat, hand) in [
            "5555m234p567p789s",
            FILLER_1,
            FILLER_2,
            FILLER_3,
        ]
        .iter()
        .enumerate()
        {
            recon
                .apply(&Action::Haipai {
                    seat: seat as u8,
                    tiles: parse_tiles(hand).unwrap(),
                })
                .unwrap();
        }

        draw(&mut recon, 0, "1z");
        recon
            .apply(&Action::Ankan {
                seat: 0,
                tile: parse_tile("5m").unwrap(),
            })
            .unwrap();
        // Tenhou style: the indicator waits for the next discard.
        let flips = |r: &RoundReconstructor| {
            r.events()
                .iter()
                .filter(|e| matches!(e, AnnotatedEvent::DoraIndicator { .. }))
                .count()
        };
        assert_eq!(flips(&recon), 1);
        draw(&mut recon, 0, "2z");
        discard(&mut recon, 0, "2z");
        assert_eq!(flips(&recon), 2);
    }

    #[test]
    fn kita_requires_sanma() {
        let mut recon = RoundReconstructor::new(Ruleset::default_tenhou());
        start(&mut recon, [DEALER_TENPAI, FILLER_1, FILLER_2, FILLER_3]);
        draw(&mut recon, 0, "4z");
        let err = recon.apply(&Action::Kita { seat: 0 });
        assert!(err.is_err());
    }

    #[test]
    fn sanma_kita_counts_dora() {
        let mut recon = RoundReconstructor::new(Ruleset::default_tenhou_sanma());
        recon
            .apply(&Action::StartRound {
                round: 0,
                honba: 0,
                sticks: 0,
                scores: vec![35000; 3],
                dora_indicators: vec![parse_tile("3z").unwrap()],
                ura_indicators: vec![parse_tile("2z").unwrap()],
                wall: 55,
            })
            .unwrap();
        // Sanma hands carry no 2m-8m.
        for (seat, hand) in ["11999m22s777z123p", "123456789p11s45z", "111999s45678p55z"]
            .iter()
            .enumerate()
        {
            recon
                .apply(&Action::Haipai {
                    seat: seat as u8,
                    tiles: parse_tiles(hand).unwrap(),
                })
                .unwrap();
        }
        draw(&mut recon, 0, "4z");
        recon.apply(&Action::Kita { seat: 0 }).unwrap();
        recon
            .apply(&Action::EndRound {
                result: ResultPayload::ExhaustiveDraw {
                    draw: DrawKind::Exhausted,
                    deltas: vec![],
                },
            })
            .unwrap();
        let record = recon.into_record().unwrap();
        assert_eq!(record.seats[0].hand.kita_count(), 1);
    }

    #[test]
    fn actions_after_end_are_rejected() {
        let mut recon = RoundReconstructor::new(Ruleset::default_tenhou());
        start(&mut recon, [DEALER_TENPAI, FILLER_1, FILLER_2, FILLER_3]);
        recon
            .apply(&Action::EndRound {
                result: ResultPayload::ExhaustiveDraw {
                    draw: DrawKind::Exhausted,
                    deltas: vec![],
                },
            })
            .unwrap();
        assert!(recon
            .apply(&Action::Draw {
                seat: 0,
                tile: parse_tile("1m").unwrap(),
            })
            .is_err());
    }
}
