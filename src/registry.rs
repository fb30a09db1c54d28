//! Precomputed placement table.
//!
//! For every piece the registry holds each physically distinct way the piece
//! fits on the board. Placements are enumerated over all roots, rotations,
//! mirror and lean states, and projection planes; the first transform to
//! produce a given cell mask is kept and later ones are dropped.

use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::{PuzzleError, Result};
use crate::geometry::{Orientation, Plane, Rotation, Transform, NUM_ORIENTATIONS};
use crate::grid::{bit_index, is_valid, CellMask, Coord, VALID_COORDS};
use crate::pieces::{PieceId, MAX_ATOMS, NUM_PIECES};

/// One on-board placement of a piece.
///
/// Uses fixed-size arrays so records can be copied freely between the
/// registry and the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub piece: PieceId,
    /// Bit `i` is set if the placement covers the cell with bit index `i`.
    pub mask: CellMask,
    /// The transform that first produced this mask.
    pub transform: Transform,
    bits: [u8; MAX_ATOMS],
    cells: [Coord; MAX_ATOMS],
    atom_count: u8,
}

impl Placement {
    /// Applies `transform` to the piece's atoms.
    ///
    /// Returns `None` if any atom falls outside the board.
    pub fn from_transform(piece: PieceId, transform: Transform) -> Option<Self> {
        let cells = piece.shape().iter().map(|&atom| transform.apply(atom));
        Self::from_cells(piece, transform, cells)
    }

    /// Builds a placement from already transformed absolute cells.
    ///
    /// Returns `None` if a cell is off the board or two atoms coincide.
    fn from_cells(
        piece: PieceId,
        transform: Transform,
        cells: impl Iterator<Item = Coord>,
    ) -> Option<Self> {
        let mut placement = Self {
            piece,
            mask: 0,
            transform,
            bits: [0; MAX_ATOMS],
            cells: [(0, 0, 0); MAX_ATOMS],
            atom_count: 0,
        };

        for cell in cells {
            if !is_valid(cell) {
                return None;
            }
            let bit = bit_index(cell);
            let slot = placement.atom_count as usize;
            placement.mask |= 1 << bit;
            placement.bits[slot] = bit as u8;
            placement.cells[slot] = cell;
            placement.atom_count += 1;
        }

        // two atoms on one cell can only come from a degenerate transform
        if placement.mask.count_ones() != u32::from(placement.atom_count) {
            return None;
        }
        Some(placement)
    }

    /// Bit indices of the covered cells, in atom order.
    #[inline]
    pub fn bits(&self) -> &[u8] {
        &self.bits[..self.atom_count as usize]
    }

    /// Absolute coordinates of the covered cells, in atom order.
    #[inline]
    pub fn cells(&self) -> &[Coord] {
        &self.cells[..self.atom_count as usize]
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atom_count as usize
    }
}

/// Deduplicated placements of one piece plus a mask lookup.
#[derive(Default)]
struct PieceTable {
    positions: Vec<Placement>,
    by_mask: FxHashMap<CellMask, usize>,
}

impl PieceTable {
    /// Keeps the placement unless its mask is already present.
    fn insert(&mut self, placement: Placement) {
        if let Entry::Vacant(slot) = self.by_mask.entry(placement.mask) {
            slot.insert(self.positions.len());
            self.positions.push(placement);
        }
    }
}

/// All placements of all pieces.
///
/// Built once and never modified; boards borrow it.
pub struct Registry {
    tables: [PieceTable; NUM_PIECES],
}

impl Registry {
    /// Builds the registry from cached orientations.
    ///
    /// The 24 piece-local orientations are computed once per piece and then
    /// translated to every root and projected onto every plane, in the same
    /// order as [`Registry::exhaustive`].
    pub fn new() -> Self {
        let registry = Self {
            tables: std::array::from_fn(|i| build_cached(PieceId::ALL[i])),
        };
        registry.log_summary();
        registry
    }

    /// Builds the registry by running the full transform pipeline for every
    /// parameter combination.
    pub fn exhaustive() -> Self {
        let registry = Self {
            tables: std::array::from_fn(|i| build_exhaustive(PieceId::ALL[i])),
        };
        registry.log_summary();
        registry
    }

    fn log_summary(&self) {
        for piece in PieceId::ALL {
            trace!(%piece, count = self.positions(piece).len(), "piece placements");
        }
        debug!(total = self.total(), "built placement registry");
    }

    /// Every placement of `piece`, in enumeration order.
    #[inline]
    pub fn positions(&self, piece: PieceId) -> &[Placement] {
        &self.tables[piece.index()].positions
    }

    /// Total number of placements across all pieces.
    pub fn total(&self) -> usize {
        self.tables.iter().map(|table| table.positions.len()).sum()
    }

    /// Index of the placement of `piece` covering exactly `mask`.
    pub fn index_of(&self, piece: PieceId, mask: CellMask) -> Option<usize> {
        self.tables[piece.index()].by_mask.get(&mask).copied()
    }

    /// Recovers the stored placement a transform produces.
    ///
    /// Any transform landing on the same cells as the stored representative
    /// resolves to it, so replayed configurations do not depend on which
    /// equivalent parameters were saved.
    pub fn find(&self, piece: PieceId, transform: &Transform) -> Result<&Placement> {
        Placement::from_transform(piece, *transform)
            .and_then(|placement| self.index_of(piece, placement.mask))
            .map(|index| &self.positions(piece)[index])
            .ok_or(PuzzleError::NoSuchPlacement {
                piece,
                transform: *transform,
            })
    }

    /// Placements of `piece` accepted by `filter`.
    pub fn filtered<'a>(
        &'a self,
        piece: PieceId,
        filter: &'a PositionFilter,
    ) -> impl Iterator<Item = &'a Placement> + 'a {
        self.positions(piece).iter().filter(move |p| filter.matches(p))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn build_cached(piece: PieceId) -> PieceTable {
    let shape = piece.shape();
    let orientations: Vec<(Orientation, [Coord; MAX_ATOMS])> = Orientation::all()
        .map(|orientation| {
            let mut offsets = [(0, 0, 0); MAX_ATOMS];
            for (slot, &atom) in offsets.iter_mut().zip(shape) {
                *slot = orientation.apply(atom);
            }
            (orientation, offsets)
        })
        .collect();
    debug_assert_eq!(orientations.len(), NUM_ORIENTATIONS);

    let mut table = PieceTable::default();
    for &root in &VALID_COORDS {
        for (orientation, offsets) in &orientations {
            for plane in Plane::ALL {
                let transform = Transform::from_parts(root, *orientation, plane);
                let cells = offsets[..shape.len()]
                    .iter()
                    .map(|&offset| transform.place_oriented(offset));
                if let Some(placement) = Placement::from_cells(piece, transform, cells) {
                    table.insert(placement);
                }
            }
        }
    }
    table
}

fn build_exhaustive(piece: PieceId) -> PieceTable {
    let mut table = PieceTable::default();
    for &root in &VALID_COORDS {
        for rotation in Rotation::ALL {
            for mirror in [false, true] {
                for lean in [false, true] {
                    for plane in Plane::ALL {
                        let transform = Transform {
                            root,
                            rotation,
                            mirror,
                            lean,
                            plane,
                        };
                        if let Some(placement) = Placement::from_transform(piece, transform) {
                            table.insert(placement);
                        }
                    }
                }
            }
        }
    }
    table
}

/// Optional constraints for narrowing a piece's placements.
///
/// The cell constraint (`x`, `y`, `z`) matches a placement if any of its
/// atoms agrees with every axis that is set. The other fields compare
/// against the placement's stored transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionFilter {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub z: Option<i32>,
    pub rotation: Option<Rotation>,
    pub plane: Option<Plane>,
    pub lean: Option<bool>,
    pub mirror: Option<bool>,
    pub root_x: Option<i32>,
    pub root_y: Option<i32>,
    pub root_z: Option<i32>,
}

impl PositionFilter {
    /// Returns true if the placement satisfies every set constraint.
    pub fn matches(&self, placement: &Placement) -> bool {
        let axis = |wanted: Option<i32>, actual: i32| wanted.map_or(true, |w| w == actual);

        if self.x.is_some() || self.y.is_some() || self.z.is_some() {
            let touches = placement
                .cells()
                .iter()
                .any(|&(x, y, z)| axis(self.x, x) && axis(self.y, y) && axis(self.z, z));
            if !touches {
                return false;
            }
        }

        let transform = &placement.transform;
        let (root_x, root_y, root_z) = transform.root;
        self.rotation.map_or(true, |r| r == transform.rotation)
            && self.plane.map_or(true, |p| p == transform.plane)
            && self.lean.map_or(true, |l| l == transform.lean)
            && self.mirror.map_or(true, |m| m == transform.mirror)
            && axis(self.root_x, root_x)
            && axis(self.root_y, root_y)
            && axis(self.root_z, root_z)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use rustc_hash::FxHashSet;

    use super::*;
    use crate::grid::{coord_of_bit, VALID_BOARD_MASK};

    fn registry() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::new)
    }

    #[test]
    fn test_placement_counts() {
        let registry = registry();
        let mut output = String::new();
        for piece in PieceId::ALL {
            output.push_str(&format!(
                "{piece} {:<9} {}\n",
                piece.name(),
                registry.positions(piece).len()
            ));
        }
        output.push_str(&format!("total {}\n", registry.total()));

        insta::assert_snapshot!(output, @r"
        A Lime      720
        B Yellow    480
        C DarkBlue  96
        D LightBlue 192
        E Red       360
        F Pink      192
        G Green     96
        H White     220
        I Orange    168
        J Peach     96
        K Gray      240
        L Purple    240
        total 3100
        ");
    }

    #[test]
    fn test_records_cover_one_cell_per_atom() {
        let registry = registry();
        for piece in PieceId::ALL {
            for placement in registry.positions(piece) {
                assert_eq!(placement.piece, piece);
                assert_eq!(placement.atom_count(), piece.atom_count());
                assert_eq!(placement.mask.count_ones() as usize, piece.atom_count());
                assert_eq!(placement.mask & !VALID_BOARD_MASK, 0);
                for (&bit, &cell) in placement.bits().iter().zip(placement.cells()) {
                    assert!(is_valid(cell));
                    assert_eq!(coord_of_bit(bit as u32), cell);
                }
            }
        }
    }

    #[test]
    fn test_no_duplicate_masks() {
        let registry = registry();
        for piece in PieceId::ALL {
            let mut seen = FxHashSet::default();
            for placement in registry.positions(piece) {
                assert!(
                    seen.insert(placement.mask),
                    "{piece} has duplicate mask {:#x}",
                    placement.mask
                );
            }
        }
    }

    #[test]
    fn test_cached_build_matches_exhaustive() {
        let cached = registry();
        let exhaustive = Registry::exhaustive();
        for piece in PieceId::ALL {
            assert_eq!(
                cached.positions(piece),
                exhaustive.positions(piece),
                "{piece} differs between constructions"
            );
        }
    }

    #[test]
    fn test_find_recovers_every_record() {
        let registry = registry();
        for piece in PieceId::ALL {
            for (index, placement) in registry.positions(piece).iter().enumerate() {
                let found = registry.find(piece, &placement.transform).unwrap();
                assert_eq!(found, placement);
                assert_eq!(registry.index_of(piece, placement.mask), Some(index));
            }
        }
    }

    #[test]
    fn test_find_rejects_off_board_transform() {
        let transform = Transform::new((5, 0, 0), 0, false, false, 0).unwrap();
        assert_eq!(
            registry().find(PieceId::C, &transform),
            Err(PuzzleError::NoSuchPlacement {
                piece: PieceId::C,
                transform
            })
        );
    }

    #[test]
    fn test_dark_blue_at_origin() {
        let transform = Transform::new((0, 0, 0), 0, false, false, 0).unwrap();
        let placement = registry().find(PieceId::C, &transform).unwrap();
        assert_eq!(
            placement.cells(),
            &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (2, 1, 0), (2, 2, 0)]
        );
        assert_eq!(placement.transform, transform);
        assert_eq!(placement.mask.count_ones(), 5);
    }

    #[test]
    fn test_lean_is_independent_of_plane() {
        // fixed plane 0: flat and upright squares never share a mask
        let masks_for = |lean: bool| -> FxHashSet<CellMask> {
            let mut masks = FxHashSet::default();
            for &root in &VALID_COORDS {
                for orientation in Orientation::all().filter(|o| o.lean == lean) {
                    let transform = Transform::from_parts(root, orientation, Plane::ALL[0]);
                    if let Some(placement) = Placement::from_transform(PieceId::K, transform) {
                        masks.insert(placement.mask);
                    }
                }
            }
            masks
        };

        let flat = masks_for(false);
        let upright = masks_for(true);
        assert_eq!(flat.len(), 60);
        assert_eq!(upright.len(), 60);
        assert_eq!(flat.intersection(&upright).count(), 0);
    }

    #[test]
    fn test_filter_by_transform_fields() {
        let registry = registry();
        let filter = PositionFilter {
            rotation: Some(Rotation::new(2).unwrap()),
            plane: Some(Plane::new(1).unwrap()),
            lean: Some(true),
            ..Default::default()
        };
        let matching: Vec<&Placement> = registry.filtered(PieceId::A, &filter).collect();
        assert!(!matching.is_empty());
        for placement in &matching {
            assert_eq!(placement.transform.rotation.steps(), 2);
            assert_eq!(placement.transform.plane.index(), 1);
            assert!(placement.transform.lean);
        }
        assert!(matching.len() < registry.positions(PieceId::A).len());
    }

    #[test]
    fn test_filter_by_cell() {
        let registry = registry();
        let filter = PositionFilter {
            x: Some(0),
            y: Some(0),
            z: Some(5),
            ..Default::default()
        };
        let apex: Vec<&Placement> = registry.filtered(PieceId::H, &filter).collect();
        assert!(!apex.is_empty());
        for placement in apex {
            assert!(placement.cells().contains(&(0, 0, 5)));
        }

        // an axis-only constraint matches any atom on that layer
        let top_layers = PositionFilter {
            z: Some(4),
            ..Default::default()
        };
        for placement in registry.filtered(PieceId::H, &top_layers) {
            assert!(placement.cells().iter().any(|&(_, _, z)| z == 4));
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let registry = registry();
        let filter = PositionFilter::default();
        assert_eq!(
            registry.filtered(PieceId::L, &filter).count(),
            registry.positions(PieceId::L).len()
        );
    }
}
