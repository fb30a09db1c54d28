//! Error types for transforms, placements and board mutation.

use thiserror::Error;

use crate::geometry::Transform;
use crate::grid::CellMask;
use crate::pieces::PieceId;

/// Errors raised by the puzzle library.
///
/// An unsolvable board is not an error; the solver reports it as a plain
/// negative result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PuzzleError {
    /// A transform parameter was outside its allowed range.
    #[error("{parameter} {value} out of range (expected 0..={max})")]
    InvalidParameter {
        /// Which parameter was rejected ("rotation" or "plane").
        parameter: &'static str,
        /// The rejected value.
        value: u8,
        /// The largest accepted value.
        max: u8,
    },

    /// The placement overlaps cells that are already occupied.
    #[error("piece {piece} collides with occupied cells (overlap {overlap:#016x})")]
    Collision {
        /// The piece that could not be placed.
        piece: PieceId,
        /// The intersection of the placement and the current occupancy.
        overlap: CellMask,
    },

    /// The piece is already on the board.
    #[error("piece {0} is already on the board")]
    AlreadyPlaced(PieceId),

    /// The piece is not on the board.
    #[error("piece {0} is not on the board")]
    NotPlaced(PieceId),

    /// A piece identifier outside `A`..`L`.
    #[error("unknown piece identifier {0:?}")]
    UnknownPiece(String),

    /// The transform puts at least one atom outside the board.
    #[error("piece {piece} has no on-board placement for {transform}")]
    NoSuchPlacement {
        /// The piece being placed.
        piece: PieceId,
        /// The transform that was requested.
        transform: Transform,
    },

    /// Placement notation could not be parsed.
    #[error("invalid placement {input:?}: {reason}")]
    Notation {
        /// The text that failed to parse.
        input: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Result type for puzzle operations.
pub type Result<T> = std::result::Result<T, PuzzleError>;
