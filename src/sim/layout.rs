/// Board sources and grid geometry.
///
/// ## Sources (priority order):
///   1. `board.file` from config, if set
///   2. Built-in 4×4 layout
///
/// ## Board file format:
///   ```text
///   # comment
///   4 2 6 3
///   7 0 1 5
///   ```
///
/// One row per line, item ids separated by whitespace. Blank lines and lines
/// starting with `#` are skipped. Validation (rectangular, paired) happens in
/// `Board::from_rows`.

use std::fs;

use crate::config::BoardConfig;
use crate::domain::board::{Board, Geometry};
use crate::domain::physics::Point;
use crate::error::BoardError;

/// Seven pairs (1..=7) and two hazards (0).
const DEFAULT_TABLE: [[u8; 4]; 4] = [
    [4, 2, 6, 3],
    [7, 0, 1, 5],
    [3, 1, 4, 6],
    [0, 5, 7, 2],
];

pub fn default_board(hazard_id: u8) -> Result<Board, BoardError> {
    let rows: Vec<Vec<u8>> = DEFAULT_TABLE.iter().map(|r| r.to_vec()).collect();
    Board::from_rows(&rows, hazard_id)
}

/// Load the configured board file, or the built-in layout.
pub fn load_board(config: &BoardConfig) -> Result<Board, BoardError> {
    let path = match &config.file {
        Some(p) => p,
        None => return default_board(config.hazard),
    };
    let text = fs::read_to_string(path).map_err(|e| BoardError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let rows = parse_board(&text)?;
    let board = Board::from_rows(&rows, config.hazard)?;
    log::info!(
        "loaded board {} ({}x{}, {} pairs)",
        path.display(), board.rows(), board.cols(), board.pairs(),
    );
    Ok(board)
}

pub fn parse_board(text: &str) -> Result<Vec<Vec<u8>>, BoardError> {
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|tok| {
                tok.parse::<u8>().map_err(|_| BoardError::Parse {
                    line: i + 1,
                    token: tok.to_string(),
                })
            })
            .collect::<Result<Vec<u8>, _>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Chest boxes are 7×3 cells on a 12×6 pitch, leaving a 5-wide column
/// corridor and a 3-high row corridor for the player.
pub fn standard_geometry() -> Geometry {
    Geometry {
        origin: Point::new(8.0, 4.0),
        pitch_x: 12.0,
        pitch_y: 6.0,
        chest_half_w: 3.0,
        chest_half_h: 1.0,
    }
}
