//! Pyramid Puzzle Solver Library
//!
//! Tiles a six-layer tetrahedral stack of 56 spheres with twelve flat
//! pieces. The [`Registry`] precomputes every distinct placement of every
//! piece; a [`Board`] tracks occupancy and runs the backtracking search.

pub mod board;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod notation;
pub mod pieces;
pub mod registry;
pub mod solver;

pub use board::{Board, Snapshot};
pub use error::{PuzzleError, Result};
pub use geometry::{Plane, Rotation, Transform};
pub use notation::PlacementSpec;
pub use pieces::PieceId;
pub use registry::{Placement, PositionFilter, Registry};
pub use solver::{Outcome, SolveOptions, SolveReport};
