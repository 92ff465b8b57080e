use crate::errors::{AnalysisError, AnalysisResult};
use crate::tile::Tile;

/// Parse a hand string like "123m406p789s11z" into tiles.
/// Digit 0 denotes the red five of its suit.
pub fn parse_tiles(text: &str) -> AnalysisResult<Vec<Tile>> {
    let parse_err = |message: String| AnalysisError::MalformedInput {
        context: format!("hand string '{}'", text),
        message,
    };

    let mut tiles = Vec::new();
    let mut pending: Vec<u8> = Vec::new();
    for c in text.chars() {
        match c {
            '0'..='9' => pending.push(c as u8 - b'0'),
            'm' | 'p' | 's' | 'z' => {
                for &d in &pending {
                    let code = match (c, d) {
                        ('m', 0) => 51,
                        ('p', 0) => 52,
                        ('s', 0) => 53,
                        ('m', _) => 10 + d,
                        ('p', _) => 20 + d,
                        ('s', _) => 30 + d,
                        ('z', 1..=7) => 40 + d,
                        _ => return Err(parse_err(format!("honor digit {} out of range", d))),
                    };
                    tiles.push(Tile::from_code(code)?);
                }
                pending.clear();
            }
            c if c.is_whitespace() => {}
            other => return Err(parse_err(format!("unexpected character '{}'", other))),
        }
    }
    if !pending.is_empty() {
        return Err(parse_err("trailing digits without a suit".to_string()));
    }
    Ok(tiles)
}

/// Parse exactly one tile, e.g. "5m", "0p", "7z".
pub fn parse_tile(text: &str) -> AnalysisResult<Tile> {
    let tiles = parse_tiles(text)?;
    if tiles.len() != 1 {
        return Err(AnalysisError::MalformedInput {
            context: format!("tile string '{}'", text),
            message: format!("expected one tile, found {}", tiles.len()),
        });
    }
    Ok(tiles[0])
}
