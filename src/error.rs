/// Error taxonomy.
///
/// `BoardError` is fatal and surfaces before play starts.
/// `SelectError` describes an illegal in-round action; the controller
/// hooks log it and carry on, nothing is raised to the host loop.

use thiserror::Error;

use crate::domain::chest::ChestId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("board has no cells")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged { row: usize, expected: usize, found: usize },
    #[error("item {item} appears {count} time(s); every non-hazard item needs a partner")]
    Unpaired { item: u8, count: usize },
    #[error("board has no pairs to match")]
    NoPairs,
    #[error("line {line}: `{token}` is not an item id")]
    Parse { line: usize, token: String },
    #[error("could not read board file {path}: {reason}")]
    Io { path: String, reason: String },
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectError {
    #[error("chest {0} is already opened")]
    AlreadyOpened(ChestId),
    #[error("player is not interactive")]
    InvalidSelection,
    #[error("no chest with id {0}")]
    UnknownChest(ChestId),
    #[error("two selections are already pending")]
    SelectionFull,
}
