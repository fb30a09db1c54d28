//! Piece catalog.
//!
//! Each piece is a small set of sphere offsets on the flat triangular
//! lattice (`z = 0`), identified by a letter `A`..`L`. The neighbours of an
//! atom in a layer are the six offsets reached by rotating `(1, 0, 0)`.

use std::fmt;
use std::str::FromStr;

use crate::error::PuzzleError;
use crate::grid::{Coord, NUM_CELLS};

/// Maximum number of atoms in any piece.
pub const MAX_ATOMS: usize = 5;

/// Number of pieces in the set.
pub const NUM_PIECES: usize = 12;

/// Identifier of one of the twelve pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceId {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
}

impl PieceId {
    /// Every piece, in identifier order.
    pub const ALL: [PieceId; NUM_PIECES] = [
        PieceId::A,
        PieceId::B,
        PieceId::C,
        PieceId::D,
        PieceId::E,
        PieceId::F,
        PieceId::G,
        PieceId::H,
        PieceId::I,
        PieceId::J,
        PieceId::K,
        PieceId::L,
    ];

    /// Position of this piece in per-piece tables.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Single-letter identifier.
    pub const fn letter(self) -> char {
        (b'A' + self as u8) as char
    }

    /// Colour name of the physical piece.
    pub const fn name(self) -> &'static str {
        PIECES[self.index()].name
    }

    /// Local offsets of the piece's atoms.
    pub const fn shape(self) -> &'static [Coord] {
        PIECES[self.index()].atoms
    }

    /// Number of atoms in the piece.
    pub const fn atom_count(self) -> usize {
        self.shape().len()
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl TryFrom<char> for PieceId {
    type Error = PuzzleError;

    fn try_from(letter: char) -> Result<Self, Self::Error> {
        let upper = letter.to_ascii_uppercase();
        PieceId::ALL
            .into_iter()
            .find(|piece| piece.letter() == upper)
            .ok_or_else(|| PuzzleError::UnknownPiece(letter.to_string()))
    }
}

impl FromStr for PieceId {
    type Err = PuzzleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => PieceId::try_from(letter),
            _ => Err(PuzzleError::UnknownPiece(s.to_string())),
        }
    }
}

/// A piece definition: its colour name and atom offsets.
#[derive(Clone, Copy)]
pub struct PieceShape {
    pub name: &'static str,
    pub atoms: &'static [Coord],
}

/// The twelve pieces, indexed by [`PieceId::index`].
///
/// Together they hold exactly as many atoms as the board has cells.
pub const PIECES: [PieceShape; NUM_PIECES] = [
    // A: T (4 atoms)
    PieceShape {
        name: "Lime",
        atoms: &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (1, 1, 0)],
    },
    // B: U (5 atoms)
    PieceShape {
        name: "Yellow",
        atoms: &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (0, 1, 0), (2, 1, 0)],
    },
    // C: long V (5 atoms)
    PieceShape {
        name: "DarkBlue",
        atoms: &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (2, 1, 0), (2, 2, 0)],
    },
    // D: long L (5 atoms)
    PieceShape {
        name: "LightBlue",
        atoms: &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (3, 0, 0), (3, 1, 0)],
    },
    // E: P (5 atoms)
    PieceShape {
        name: "Red",
        atoms: &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (0, 1, 0), (1, 1, 0)],
    },
    // F: N (5 atoms)
    PieceShape {
        name: "Pink",
        atoms: &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (2, 1, 0), (3, 1, 0)],
    },
    // G: W (5 atoms)
    PieceShape {
        name: "Green",
        atoms: &[(0, 0, 0), (1, 0, 0), (1, 1, 0), (2, 1, 0), (2, 2, 0)],
    },
    // H: small V (3 atoms)
    PieceShape {
        name: "White",
        atoms: &[(0, 0, 0), (1, 0, 0), (0, 1, 0)],
    },
    // I: Y (5 atoms)
    PieceShape {
        name: "Orange",
        atoms: &[(0, 0, 0), (1, 0, 0), (2, 0, 0), (3, 0, 0), (1, 1, 0)],
    },
    // J: Z (5 atoms)
    PieceShape {
        name: "Peach",
        atoms: &[(0, 0, 0), (1, 0, 0), (1, 1, 0), (1, 2, 0), (2, 2, 0)],
    },
    // K: 2x2 square (4 atoms)
    PieceShape {
        name: "Gray",
        atoms: &[(0, 0, 0), (1, 0, 0), (0, 1, 0), (1, 1, 0)],
    },
    // L: F (5 atoms)
    PieceShape {
        name: "Purple",
        atoms: &[(1, 0, 0), (2, 0, 0), (0, 1, 0), (1, 1, 0), (1, 2, 0)],
    },
];

/// Compile-time check that the catalog fits the board and the placement
/// record layout.
const _: () = {
    let mut total = 0;
    let mut i = 0;
    while i < NUM_PIECES {
        let atoms = PIECES[i].atoms.len();
        assert!(atoms >= 3 && atoms <= MAX_ATOMS, "piece size out of range");
        total += atoms;
        i += 1;
    }
    assert!(total == NUM_CELLS, "pieces must cover the board exactly");
};
