//! Piece transforms on the triangular lattice.
//!
//! A placement is produced by a fixed pipeline applied to each atom of a
//! piece:
//!
//! 1. [`mirror`], [`rotate`] and [`lean`] act on the piece-local offset;
//! 2. the offset is translated by the root;
//! 3. [`plane_transpose`] reprojects the absolute coordinate onto one of the
//!    pyramid's three slanted faces.
//!
//! Different parameter tuples can land on the same cells; the registry
//! deduplicates by occupied mask.

use std::fmt;

use crate::error::{PuzzleError, Result};
use crate::grid::{Coord, MAX_COORD_SUM};

/// Number of distinct rotation steps about the z axis.
pub const NUM_ROTATIONS: usize = 6;

/// Number of board faces a placement can be projected onto.
pub const NUM_PLANES: usize = 3;

/// Number of piece-local orientations (rotations x mirror x lean).
pub const NUM_ORIENTATIONS: usize = NUM_ROTATIONS * 2 * 2;

/// A rotation of `0..=5` sixth-turns about the z axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Rotation(u8);

impl Rotation {
    /// All rotations in ascending order.
    pub const ALL: [Rotation; NUM_ROTATIONS] = [
        Rotation(0),
        Rotation(1),
        Rotation(2),
        Rotation(3),
        Rotation(4),
        Rotation(5),
    ];

    /// Validates a rotation step count.
    pub fn new(steps: u8) -> Result<Self> {
        if steps as usize >= NUM_ROTATIONS {
            return Err(PuzzleError::InvalidParameter {
                parameter: "rotation",
                value: steps,
                max: NUM_ROTATIONS as u8 - 1,
            });
        }
        Ok(Self(steps))
    }

    /// Number of sixth-turns.
    #[inline]
    pub const fn steps(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rotation {
    type Error = PuzzleError;

    fn try_from(steps: u8) -> Result<Self> {
        Self::new(steps)
    }
}

/// One of the three faces of the pyramid a placement is projected onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Plane(u8);

impl Plane {
    /// All planes in ascending order.
    pub const ALL: [Plane; NUM_PLANES] = [Plane(0), Plane(1), Plane(2)];

    /// Validates a plane number.
    pub fn new(plane: u8) -> Result<Self> {
        if plane as usize >= NUM_PLANES {
            return Err(PuzzleError::InvalidParameter {
                parameter: "plane",
                value: plane,
                max: NUM_PLANES as u8 - 1,
            });
        }
        Ok(Self(plane))
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Plane {
    type Error = PuzzleError;

    fn try_from(plane: u8) -> Result<Self> {
        Self::new(plane)
    }
}

/// Reflects a local offset across the lattice axis when `active`.
///
/// Maps `(x, y, z)` to `(x + y, -y, z)`. The result may leave the board on
/// its own; only the complete pipeline is checked against the bounds.
#[inline(always)]
pub const fn mirror(offset: Coord, active: bool) -> Coord {
    let (x, y, z) = offset;
    if active {
        (x + y, -y, z)
    } else {
        offset
    }
}

/// Rotates a local offset by sixth-turns about the z axis.
///
/// One step maps `(x, y, z)` to `(-y, x + y, z)`.
#[inline(always)]
pub const fn rotate(offset: Coord, rotation: Rotation) -> Coord {
    let (mut x, mut y, z) = offset;
    let mut step = 0;
    while step < rotation.0 {
        (x, y) = (-y, x + y);
        step += 1;
    }
    (x, y, z)
}

/// Stands a flat piece upright when `active`: `(x, y, z)` becomes `(x, 0, y)`.
#[inline(always)]
pub const fn lean(offset: Coord, active: bool) -> Coord {
    let (x, y, _) = offset;
    if active {
        (x, 0, y)
    } else {
        offset
    }
}

/// Reprojects an absolute coordinate onto one of the pyramid's faces.
///
/// Plane 0 is the identity. Planes 1 and 2 swap in the distance from the
/// slanted face `x + y + z = 5` as a new axis.
#[inline(always)]
pub const fn plane_transpose(plane: Plane, coord: Coord) -> Coord {
    let (x, y, z) = coord;
    let face_distance = MAX_COORD_SUM - (x + y + z);
    match plane.0 {
        0 => coord,
        1 => (face_distance, x, z),
        _ => (y, face_distance, z),
    }
}

/// The piece-local part of a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Orientation {
    pub rotation: Rotation,
    pub mirror: bool,
    pub lean: bool,
}

impl Orientation {
    /// All 24 orientations: rotation-major, then mirror, then lean.
    pub fn all() -> impl Iterator<Item = Orientation> {
        Rotation::ALL.into_iter().flat_map(|rotation| {
            [false, true].into_iter().flat_map(move |mirror| {
                [false, true].into_iter().map(move |lean| Orientation {
                    rotation,
                    mirror,
                    lean,
                })
            })
        })
    }

    /// Applies mirror, rotation and lean to a local offset.
    #[inline(always)]
    pub const fn apply(&self, offset: Coord) -> Coord {
        lean(rotate(mirror(offset, self.mirror), self.rotation), self.lean)
    }
}

/// Full transform parameters: root, orientation and projection plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Transform {
    pub root: Coord,
    pub rotation: Rotation,
    pub mirror: bool,
    pub lean: bool,
    pub plane: Plane,
}

impl Transform {
    /// Builds a transform from raw parameters, validating rotation and plane.
    pub fn new(root: Coord, rotation: u8, mirror: bool, lean: bool, plane: u8) -> Result<Self> {
        Ok(Self {
            root,
            rotation: Rotation::new(rotation)?,
            mirror,
            lean,
            plane: Plane::new(plane)?,
        })
    }

    /// Combines an orientation with a root and plane.
    pub const fn from_parts(root: Coord, orientation: Orientation, plane: Plane) -> Self {
        Self {
            root,
            rotation: orientation.rotation,
            mirror: orientation.mirror,
            lean: orientation.lean,
            plane,
        }
    }

    /// The piece-local part of this transform.
    pub const fn orientation(&self) -> Orientation {
        Orientation {
            rotation: self.rotation,
            mirror: self.mirror,
            lean: self.lean,
        }
    }

    /// Places an already oriented offset: translate by root, then project.
    #[inline(always)]
    pub const fn place_oriented(&self, oriented: Coord) -> Coord {
        let (rx, ry, rz) = self.root;
        let (ox, oy, oz) = oriented;
        plane_transpose(self.plane, (rx + ox, ry + oy, rz + oz))
    }

    /// Runs the whole pipeline on one piece-local atom.
    #[inline(always)]
    pub const fn apply(&self, atom: Coord) -> Coord {
        self.place_oriented(self.orientation().apply(atom))
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, z) = self.root;
        write!(
            f,
            "root ({x},{y},{z}) rotation {} plane {} mirror {} lean {}",
            self.rotation.0, self.plane.0, self.mirror, self.lean
        )
    }
}
