use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fuun_engine::parser::parse_tiles;
use fuun_engine::shanten::ShantenEngine;
use fuun_engine::tile::Tile;

const HANDS: [&str; 8] = [
    "123m123p123s1156z",
    "1133m2255p11s167z",
    "19m19p19s1234567z",
    "23m234567p23466s",
    "12345678m22s777z",
    "147m258p369s1234z",
    "1122m3344p5566s7z",
    "159m268m37p48s123z",
];

fn parsed_hands() -> Vec<Vec<Tile>> {
    HANDS.iter().map(|h| parse_tiles(h).unwrap()).collect()
}

fn bench_shanten(c: &mut Criterion) {
    let hands = parsed_hands();

    c.bench_function("shanten_warm_cache", |b| {
        let mut engine = ShantenEngine::new();
        b.iter(|| {
            for hand in &hands {
                black_box(engine.analyze(hand).unwrap());
            }
        })
    });

    c.bench_function("shanten_cold_cache", |b| {
        b.iter(|| {
            let mut engine = ShantenEngine::new();
            for hand in &hands {
                black_box(engine.analyze(hand).unwrap());
            }
        })
    });
}

criterion_group!(benches, bench_shanten);
criterion_main!(benches);
