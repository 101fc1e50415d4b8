use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Tile ids are not a permutation of 0..{0}")]
    InvalidTileIds(u16),
    #[error("Tile {0} does not match its slot")]
    MisplacedTile(u16),
    #[error("Invalid configuration at line {line}, column {column}")]
    InvalidConfig { line: usize, column: usize },
}

pub type Result<T> = core::result::Result<T, Error>;

/// Failure reported by an asynchronous data source.
///
/// These never escape a machine: they arrive as settlement events and are
/// routed to a fallback state.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiError {
    #[error("Data source unavailable")]
    Unavailable,
    #[error("Request rejected")]
    Rejected,
}
