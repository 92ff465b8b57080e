use pyo3::prelude::*;

use crate::parser::parse_tiles;
use crate::rule::Ruleset;
use crate::score;
use crate::shanten::ShantenEngine;

/// Shanten of a hand string: (steps, accepted/relevant tile codes).
#[pyfunction]
fn calc_shanten(hand: &str) -> PyResult<(u8, Vec<u8>)> {
    let tiles = parse_tiles(hand)?;
    let result = ShantenEngine::new().analyze(&tiles)?;
    let codes = result.tiles.iter().map(|t| t.code()).collect();
    Ok((result.value.steps(), codes))
}

/// (total, pay_ron, pay_tsumo_oya, pay_tsumo_ko) for one win.
#[pyfunction]
#[pyo3(signature = (han, fu, is_dealer, is_tsumo, honba=0, sanma=false))]
fn calc_score(
    han: u8,
    fu: u8,
    is_dealer: bool,
    is_tsumo: bool,
    honba: u32,
    sanma: bool,
) -> PyResult<(u32, u32, u32, u32)> {
    let rule = if sanma {
        Ruleset::default_tenhou_sanma()
    } else {
        Ruleset::default_tenhou()
    };
    let s = score::calculate_score(han, fu, is_dealer, is_tsumo, honba, &rule)?;
    Ok((s.total, s.pay_ron, s.pay_tsumo_oya, s.pay_tsumo_ko))
}

#[pymodule]
fn _fuun(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(calc_shanten, m)?)?;
    m.add_function(wrap_pyfunction!(calc_score, m)?)?;
    Ok(())
}
