//! Text form of a piece placement.
//!
//! `<LETTER>:<x>,<y>,<z>:r<rotation>:p<plane>[:m][:l]`, for example
//! `C:0,0,0:r0:p0` or `H:0,4,0:r0:p1:l`. The `m` flag sets mirror and `l`
//! sets lean.

use std::fmt;
use std::str::FromStr;

use crate::error::{PuzzleError, Result};
use crate::geometry::{Plane, Rotation, Transform};
use crate::grid::Coord;
use crate::pieces::PieceId;
use crate::registry::{Placement, Registry};

/// A piece together with the transform that places it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlacementSpec {
    pub piece: PieceId,
    pub transform: Transform,
}

impl PlacementSpec {
    pub fn new(piece: PieceId, transform: Transform) -> Self {
        Self { piece, transform }
    }

    /// Looks up the registry record this placement lands on.
    pub fn resolve<'r>(&self, registry: &'r Registry) -> Result<&'r Placement> {
        registry.find(self.piece, &self.transform)
    }
}

impl From<&Placement> for PlacementSpec {
    fn from(placement: &Placement) -> Self {
        Self::new(placement.piece, placement.transform)
    }
}

impl fmt::Display for PlacementSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.transform;
        let (x, y, z) = t.root;
        write!(
            f,
            "{}:{x},{y},{z}:r{}:p{}",
            self.piece,
            t.rotation.steps(),
            t.plane.index()
        )?;
        if t.mirror {
            f.write_str(":m")?;
        }
        if t.lean {
            f.write_str(":l")?;
        }
        Ok(())
    }
}

impl FromStr for PlacementSpec {
    type Err = PuzzleError;

    fn from_str(s: &str) -> Result<Self> {
        let error = |reason: &str| PuzzleError::Notation {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let mut fields = s.trim().split(':');
        let piece: PieceId = fields
            .next()
            .filter(|field| !field.is_empty())
            .ok_or_else(|| error("missing piece"))?
            .parse()?;
        let root = parse_root(fields.next().ok_or_else(|| error("missing root"))?)
            .ok_or_else(|| error("root must be three integers x,y,z"))?;
        let rotation = parse_prefixed(fields.next(), 'r')
            .ok_or_else(|| error("expected rotation as r<0-5>"))?;
        let plane = parse_prefixed(fields.next(), 'p')
            .ok_or_else(|| error("expected plane as p<0-2>"))?;

        let mut mirror = false;
        let mut lean = false;
        for flag in fields {
            let slot = match flag {
                "m" => &mut mirror,
                "l" => &mut lean,
                _ => return Err(error(&format!("unknown flag '{flag}'"))),
            };
            if *slot {
                return Err(error(&format!("repeated flag '{flag}'")));
            }
            *slot = true;
        }

        let transform = Transform {
            root,
            rotation: Rotation::new(rotation)?,
            mirror,
            lean,
            plane: Plane::new(plane)?,
        };
        Ok(Self::new(piece, transform))
    }
}

fn parse_root(field: &str) -> Option<Coord> {
    let mut parts = field.split(',').map(|part| part.trim().parse::<i32>());
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) => Some((x, y, z)),
        _ => None,
    }
}

fn parse_prefixed(field: Option<&str>, prefix: char) -> Option<u8> {
    field?.strip_prefix(prefix)?.parse().ok()
}
