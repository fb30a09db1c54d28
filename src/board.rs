//! Board state: occupancy, placed pieces and per-piece valid placements.
//!
//! The board borrows an immutable [`Registry`] and keeps, for every piece
//! not yet on the board, the indices of the registry placements that do
//! not overlap the occupied cells. Every successful mutation recomputes
//! those lists.

use tracing::debug;

use crate::error::{PuzzleError, Result};
use crate::geometry::Transform;
use crate::grid::{CellMask, VALID_BOARD_MASK};
use crate::pieces::{PieceId, NUM_PIECES};
use crate::registry::{Placement, Registry};

/// A board being filled, either by hand or by the solver.
pub struct Board<'r> {
    pub(crate) registry: &'r Registry,
    /// Bitmask of occupied cells.
    pub(crate) occupied: CellMask,
    /// The placement of each piece currently on the board.
    pub(crate) used: [Option<Placement>; NUM_PIECES],
    /// Registry indices of the placements still compatible with `occupied`.
    /// Only maintained for pieces that are not on the board.
    pub(crate) valid: [Vec<usize>; NUM_PIECES],
}

/// The placed pieces of a board, recorded by transform.
///
/// Restoring replays the transforms through the registry, so a snapshot
/// stays meaningful across registry rebuilds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: Vec<(PieceId, Transform)>,
}

impl Snapshot {
    /// Creates a snapshot from explicit (piece, transform) pairs.
    pub fn new(entries: Vec<(PieceId, Transform)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(PieceId, Transform)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'r> Board<'r> {
    /// Creates an empty board where every placement is available.
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            occupied: 0,
            used: [None; NUM_PIECES],
            valid: std::array::from_fn(|i| {
                (0..registry.positions(PieceId::ALL[i]).len()).collect()
            }),
        }
    }

    /// The registry this board draws placements from.
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Bitmask of occupied cells.
    #[inline]
    pub fn occupied(&self) -> CellMask {
        self.occupied
    }

    /// Bitmask of on-board cells that are still empty.
    #[inline]
    pub fn empty_cells(&self) -> CellMask {
        VALID_BOARD_MASK & !self.occupied
    }

    /// Returns true once every cell is covered.
    pub fn is_complete(&self) -> bool {
        self.occupied == VALID_BOARD_MASK
    }

    /// The placement of `piece`, if it is on the board.
    pub fn placed(&self, piece: PieceId) -> Option<&Placement> {
        self.used[piece.index()].as_ref()
    }

    pub fn is_placed(&self, piece: PieceId) -> bool {
        self.used[piece.index()].is_some()
    }

    /// Placements on the board, in piece order.
    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.used.iter().flatten()
    }

    /// Pieces not yet on the board, in piece order.
    pub fn unused(&self) -> impl Iterator<Item = PieceId> + '_ {
        PieceId::ALL
            .into_iter()
            .filter(|piece| !self.is_placed(*piece))
    }

    /// Returns true if the placement overlaps an occupied cell.
    #[inline]
    pub fn collision(&self, placement: &Placement) -> bool {
        placement.mask & self.occupied != 0
    }

    /// Registry placements of `piece` that fit the current occupancy.
    ///
    /// Only meaningful while the piece is off the board.
    pub fn valid_positions(&self, piece: PieceId) -> impl Iterator<Item = &'r Placement> + '_ {
        let positions = self.registry.positions(piece);
        self.valid[piece.index()]
            .iter()
            .map(move |&index| &positions[index])
    }

    /// Number of placements of `piece` that fit the current occupancy.
    pub fn valid_count(&self, piece: PieceId) -> usize {
        self.valid[piece.index()].len()
    }

    /// Puts a piece on the board.
    ///
    /// Fails without touching the board if the piece is already placed or
    /// the placement overlaps occupied cells.
    pub fn place(&mut self, placement: &Placement) -> Result<()> {
        let piece = placement.piece;
        if self.is_placed(piece) {
            return Err(PuzzleError::AlreadyPlaced(piece));
        }
        let overlap = placement.mask & self.occupied;
        if overlap != 0 {
            return Err(PuzzleError::Collision { piece, overlap });
        }

        self.apply(placement);
        debug!(%piece, transform = %placement.transform, "placed piece");
        Ok(())
    }

    /// Looks up the placement a transform produces and puts it on the board.
    pub fn place_transform(&mut self, piece: PieceId, transform: &Transform) -> Result<()> {
        let registry = self.registry;
        self.place(registry.find(piece, transform)?)
    }

    /// Takes a piece off the board and returns its placement.
    pub fn remove(&mut self, piece: PieceId) -> Result<Placement> {
        let placement = self.used[piece.index()].ok_or(PuzzleError::NotPlaced(piece))?;
        self.withdraw(&placement);
        debug!(%piece, "removed piece");
        Ok(placement)
    }

    /// Clears the board and makes every placement available again.
    pub fn reset(&mut self) {
        self.occupied = 0;
        self.used = [None; NUM_PIECES];
        for piece in PieceId::ALL {
            let valid = &mut self.valid[piece.index()];
            valid.clear();
            valid.extend(0..self.registry.positions(piece).len());
        }
    }

    /// Records the placed pieces by transform.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.placements()
                .map(|placement| (placement.piece, placement.transform))
                .collect(),
        )
    }

    /// Replaces the board contents with a snapshot.
    ///
    /// Every entry is resolved and checked before the board is cleared, so
    /// a snapshot that does not fit leaves the board as it was.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        let registry = self.registry;
        let mut resolved: Vec<&'r Placement> = Vec::with_capacity(snapshot.entries.len());
        let mut occupied: CellMask = 0;
        for (piece, transform) in &snapshot.entries {
            let placement = registry.find(*piece, transform)?;
            if resolved.iter().any(|p| p.piece == *piece) {
                return Err(PuzzleError::AlreadyPlaced(*piece));
            }
            let overlap = placement.mask & occupied;
            if overlap != 0 {
                return Err(PuzzleError::Collision {
                    piece: *piece,
                    overlap,
                });
            }
            occupied |= placement.mask;
            resolved.push(placement);
        }

        self.reset();
        for placement in resolved {
            self.place(placement)?;
        }
        Ok(())
    }

    /// Marks the placement's cells occupied without checking for overlap.
    pub(crate) fn apply(&mut self, placement: &Placement) {
        debug_assert!(!self.collision(placement));
        self.occupied |= placement.mask;
        self.used[placement.piece.index()] = Some(*placement);
        self.refresh_valid();
    }

    /// Undoes [`Board::apply`] for a placement that is on the board.
    pub(crate) fn withdraw(&mut self, placement: &Placement) {
        debug_assert_eq!(self.placed(placement.piece), Some(placement));
        self.used[placement.piece.index()] = None;
        self.occupied &= !placement.mask;
        self.refresh_valid();
    }

    /// Recomputes the valid lists of every piece that is off the board.
    fn refresh_valid(&mut self) {
        let occupied = self.occupied;
        for piece in PieceId::ALL {
            if self.used[piece.index()].is_some() {
                continue;
            }
            let positions = self.registry.positions(piece);
            let valid = &mut self.valid[piece.index()];
            valid.clear();
            valid.extend(
                positions
                    .iter()
                    .enumerate()
                    .filter(|(_, placement)| placement.mask & occupied == 0)
                    .map(|(index, _)| index),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;
    use crate::grid::cell_bit;

    fn registry() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::new)
    }

    fn dark_blue_at_origin() -> &'static Placement {
        let transform = Transform::new((0, 0, 0), 0, false, false, 0).unwrap();
        registry().find(PieceId::C, &transform).unwrap()
    }

    fn assert_all_available(board: &Board) {
        for piece in PieceId::ALL {
            let valid: Vec<&Placement> = board.valid_positions(piece).collect();
            let all: Vec<&Placement> = board.registry().positions(piece).iter().collect();
            assert_eq!(valid, all, "{piece} valid list differs from registry");
        }
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new(registry());
        assert_eq!(board.occupied(), 0);
        assert_eq!(board.empty_cells(), VALID_BOARD_MASK);
        assert_eq!(board.placements().count(), 0);
        assert_eq!(board.unused().count(), NUM_PIECES);
        assert_all_available(&board);
    }

    #[test]
    fn test_place_dark_blue_occupies_five_cells() {
        let mut board = Board::new(registry());
        board.place(dark_blue_at_origin()).unwrap();

        let expected = [(0, 0, 0), (1, 0, 0), (2, 0, 0), (2, 1, 0), (2, 2, 0)]
            .into_iter()
            .fold(0, |mask, cell| mask | cell_bit(cell));
        assert_eq!(board.occupied(), expected);
        assert_eq!(board.placed(PieceId::C), Some(dark_blue_at_origin()));
        assert!(!board.unused().any(|piece| piece == PieceId::C));
    }

    #[test]
    fn test_overlapping_placements_collide() {
        let mut board = Board::new(registry());
        let dark_blue = dark_blue_at_origin();
        board.place(dark_blue).unwrap();
        let occupied = board.occupied();

        for piece in PieceId::ALL.into_iter().filter(|&p| p != PieceId::C) {
            let valid_before = board.valid_count(piece);
            for placement in registry().positions(piece) {
                let overlap = placement.mask & dark_blue.mask;
                if overlap == 0 {
                    continue;
                }
                assert!(board.collision(placement));
                assert_eq!(
                    board.place(placement),
                    Err(PuzzleError::Collision { piece, overlap })
                );
                assert_eq!(board.occupied(), occupied);
                assert!(!board.is_placed(piece));
            }
            assert_eq!(board.valid_count(piece), valid_before);
        }
    }

    #[test]
    fn test_valid_lists_exclude_occupied_cells() {
        let mut board = Board::new(registry());
        board.place(dark_blue_at_origin()).unwrap();

        for piece in board.unused().collect::<Vec<_>>() {
            let expected = registry()
                .positions(piece)
                .iter()
                .filter(|p| p.mask & board.occupied() == 0)
                .count();
            assert_eq!(board.valid_count(piece), expected);
            assert!(board.valid_positions(piece).all(|p| !board.collision(p)));
            assert!(expected < registry().positions(piece).len());
        }
    }

    #[test]
    fn test_place_twice_is_rejected() {
        let mut board = Board::new(registry());
        let first = &registry().positions(PieceId::H)[0];
        board.place(first).unwrap();

        let elsewhere = registry()
            .positions(PieceId::H)
            .iter()
            .find(|p| !board.collision(p))
            .unwrap();
        assert_eq!(
            board.place(elsewhere),
            Err(PuzzleError::AlreadyPlaced(PieceId::H))
        );
        assert_eq!(board.occupied(), first.mask);
    }

    #[test]
    fn test_remove_restores_valid_lists() {
        let mut board = Board::new(registry());
        board.place(dark_blue_at_origin()).unwrap();
        let removed = board.remove(PieceId::C).unwrap();

        assert_eq!(&removed, dark_blue_at_origin());
        assert_eq!(board.occupied(), 0);
        assert_all_available(&board);
        assert_eq!(
            board.remove(PieceId::C),
            Err(PuzzleError::NotPlaced(PieceId::C))
        );
    }

    #[test]
    fn test_reset_restores_every_placement() {
        let mut board = Board::new(registry());
        board.place(dark_blue_at_origin()).unwrap();
        let square = board.valid_positions(PieceId::K).next().copied().unwrap();
        board.place(&square).unwrap();

        board.reset();
        assert_eq!(board.occupied(), 0);
        assert_eq!(board.placements().count(), 0);
        assert_all_available(&board);

        // idempotent
        board.reset();
        assert_all_available(&board);
    }

    #[test]
    fn test_place_transform_uses_registry_record() {
        let mut board = Board::new(registry());
        let transform = Transform::new((0, 0, 0), 0, false, false, 0).unwrap();
        board.place_transform(PieceId::C, &transform).unwrap();
        assert_eq!(board.placed(PieceId::C), Some(dark_blue_at_origin()));

        let off_board = Transform::new((4, 1, 0), 0, false, false, 0).unwrap();
        assert!(matches!(
            board.place_transform(PieceId::A, &off_board),
            Err(PuzzleError::NoSuchPlacement { .. })
        ));
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut board = Board::new(registry());
        board.place(dark_blue_at_origin()).unwrap();
        let square = board.valid_positions(PieceId::K).nth(10).copied().unwrap();
        board.place(&square).unwrap();
        let snapshot = board.snapshot();
        let occupied = board.occupied();
        assert_eq!(snapshot.entries().len(), 2);

        board.reset();
        board.restore(&snapshot).unwrap();
        assert_eq!(board.occupied(), occupied);
        assert_eq!(board.placed(PieceId::K), Some(&square));
        assert_eq!(board.snapshot(), snapshot);
    }

    #[test]
    fn test_restore_rejects_overlap_without_changes() {
        let mut board = Board::new(registry());
        let square = registry().positions(PieceId::K)[0];
        board.place(&square).unwrap();

        let transform = dark_blue_at_origin().transform;
        let clash = Snapshot::new(vec![(PieceId::C, transform), (PieceId::C, transform)]);
        assert_eq!(
            board.restore(&clash),
            Err(PuzzleError::AlreadyPlaced(PieceId::C))
        );

        let overlapping = registry()
            .positions(PieceId::A)
            .iter()
            .find(|p| p.mask & dark_blue_at_origin().mask != 0)
            .unwrap();
        let clash = Snapshot::new(vec![
            (PieceId::C, transform),
            (PieceId::A, overlapping.transform),
        ]);
        assert!(matches!(
            board.restore(&clash),
            Err(PuzzleError::Collision { piece: PieceId::A, .. })
        ));
        assert_eq!(board.occupied(), square.mask);
        assert_eq!(board.placements().count(), 1);
    }
}
