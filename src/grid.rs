//! Board lattice and bitmask representation.
//!
//! The board is a tetrahedral stack of spheres addressed by three
//! non-negative integers with `x + y + z <= 5`. Layer `z` is a triangle of
//! side `6 - z`, giving 21 + 15 + 10 + 6 + 3 + 1 = 56 cells.
//!
//! Cells have two indices:
//! - the cell index `x * 36 + y * 6 + z`, sparse over `0..=180`;
//! - the bit index, the dense rank of the cell in x-major order (`0..56`),
//!   which is what a [`CellMask`] is keyed on.

use crate::pieces::PieceId;
use crate::registry::Placement;

/// A lattice coordinate `(x, y, z)`.
pub type Coord = (i32, i32, i32);

/// A set of board cells, one bit per bit index.
pub type CellMask = u64;

/// Number of cells along one edge of the board.
pub const BOARD_SIZE: usize = 6;

/// Largest allowed `x + y + z` for an on-board coordinate.
pub const MAX_COORD_SUM: i32 = BOARD_SIZE as i32 - 1;

/// Number of on-board cells.
pub const NUM_CELLS: usize = 56;

/// Multipliers for the sparse cell index.
const CELL_STRIDE_X: usize = BOARD_SIZE * BOARD_SIZE;
const CELL_STRIDE_Y: usize = BOARD_SIZE;

/// Size of the sparse cell-index space (covers every `(x, y, z)` in `0..6`).
const CELL_SPACE: usize = BOARD_SIZE * BOARD_SIZE * BOARD_SIZE;

/// Marker for cell indices that have no bit.
const NO_BIT: u8 = u8::MAX;

/// Lists the valid coordinates in bit-index order.
const fn build_valid_coords() -> [Coord; NUM_CELLS] {
    let mut coords = [(0, 0, 0); NUM_CELLS];
    let mut next = 0;
    let mut x = 0;
    while x <= MAX_COORD_SUM {
        let mut y = 0;
        while x + y <= MAX_COORD_SUM {
            let mut z = 0;
            while x + y + z <= MAX_COORD_SUM {
                coords[next] = (x, y, z);
                next += 1;
                z += 1;
            }
            y += 1;
        }
        x += 1;
    }
    assert!(next == NUM_CELLS, "board must have exactly 56 cells");
    coords
}

/// Inverts [`VALID_COORDS`] into a cell index → bit index table.
const fn build_bit_table() -> [u8; CELL_SPACE] {
    let mut table = [NO_BIT; CELL_SPACE];
    let mut bit = 0;
    while bit < NUM_CELLS {
        let coord = VALID_COORDS[bit];
        table[cell_index(coord)] = bit as u8;
        bit += 1;
    }
    table
}

/// Every on-board coordinate, indexed by bit index.
pub const VALID_COORDS: [Coord; NUM_CELLS] = build_valid_coords();

const BIT_OF_CELL: [u8; CELL_SPACE] = build_bit_table();

/// Union of every on-board cell.
pub const VALID_BOARD_MASK: CellMask = (1 << NUM_CELLS) - 1;

/// Returns true if the coordinate lies on the board.
#[inline(always)]
pub const fn is_valid(coord: Coord) -> bool {
    let (x, y, z) = coord;
    x >= 0 && y >= 0 && z >= 0 && x + y + z <= MAX_COORD_SUM
}

/// Sparse cell index: `x * 36 + y * 6 + z`.
///
/// Only meaningful for valid coordinates.
#[inline(always)]
pub const fn cell_index(coord: Coord) -> usize {
    let (x, y, z) = coord;
    (x as usize) * CELL_STRIDE_X + (y as usize) * CELL_STRIDE_Y + (z as usize)
}

/// Dense bit index of a valid coordinate.
///
/// Callers must check [`is_valid`] first.
#[inline(always)]
pub fn bit_index(coord: Coord) -> u32 {
    debug_assert!(is_valid(coord), "bit_index called on {coord:?}");
    BIT_OF_CELL[cell_index(coord)] as u32
}

/// Single-cell mask for a valid coordinate.
#[inline(always)]
pub fn cell_bit(coord: Coord) -> CellMask {
    1 << bit_index(coord)
}

/// Coordinate for a dense bit index.
#[inline(always)]
pub const fn coord_of_bit(bit: u32) -> Coord {
    VALID_COORDS[bit as usize]
}

/// Iterates the coordinates of the cells set in `mask`, in bit order.
pub fn mask_coords(mask: CellMask) -> impl Iterator<Item = Coord> {
    let mut remaining = mask & VALID_BOARD_MASK;
    std::iter::from_fn(move || {
        if remaining == 0 {
            return None;
        }
        let bit = remaining.trailing_zeros();
        remaining &= remaining - 1;
        Some(coord_of_bit(bit))
    })
}

/// Formats placed pieces as the six board layers side by side.
///
/// Layer `z` is drawn as a triangle with row `y = 5 - z` at the top and
/// row `y = 0` at the bottom. Occupied cells show the piece letter,
/// empty cells show '.'.
pub fn format_board(placements: &[Placement]) -> String {
    // width of one layer column, the widest row of layer 0
    const LAYER_WIDTH: usize = BOARD_SIZE;
    const SEPARATOR: &str = "  ";

    let mut grid: [Option<PieceId>; NUM_CELLS] = [None; NUM_CELLS];
    for placement in placements {
        for &bit in placement.bits() {
            grid[bit as usize] = Some(placement.piece);
        }
    }

    let mut output = String::new();
    let mut line = String::new();

    for z in 0..BOARD_SIZE {
        if z > 0 {
            line.push_str(SEPARATOR);
        }
        line.push_str(&format!("{:<width$}", format!("z={z}"), width = LAYER_WIDTH));
    }
    output.push_str(line.trim_end());
    output.push('\n');

    for y in (0..BOARD_SIZE as i32).rev() {
        line.clear();
        for z in 0..BOARD_SIZE as i32 {
            if z > 0 {
                line.push_str(SEPARATOR);
            }
            let mut row = String::new();
            for x in 0..=(MAX_COORD_SUM - z - y) {
                let cell = grid[bit_index((x, y, z)) as usize];
                row.push(cell.map_or('.', PieceId::letter));
            }
            line.push_str(&format!("{:<width$}", row, width = LAYER_WIDTH));
        }
        output.push_str(line.trim_end());
        output.push('\n');
    }

    output
}
