//! Hull tile selection by local pattern matching.
//!
//! Each [`TilePattern`] describes the neighbourhood a hull piece expects
//! around it: a (1|3|5)² window centred on the cell, with required kinds at
//! some offsets. Unlisted offsets are wildcards. Patterns are tried in all
//! four rotations and, if allowed, mirrored in the grid's x-axis.
//!
//! Cells without a grid entry (outside the ship, or past the grid edge) are
//! treated as open space and satisfy any requirement.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::direction::Rotation;
use crate::layout::{GridPos, SquareKind};

/// Window offset relative to the cell being matched.
pub type Offset = (i32, i32);

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern {id}: offset ({x},{y}) lies outside its {w}x{h} window")]
    OffsetOutsideWindow {
        id: String,
        x: i32,
        y: i32,
        w: u8,
        h: u8,
    },
    #[error("pattern {id}: offset ({x},{y}) is listed twice")]
    DuplicateOffset { id: String, x: i32, y: i32 },
    #[error("tile library has no patterns")]
    EmptyLibrary,
    #[error("invalid tile library JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse cell classes that hull pieces care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    Unknown,
    Space,
    Hull,
    /// Anything inside the ship: rooms, corridors, filler.
    Internal,
    AlienBreach,
}

impl From<SquareKind> for MatchKind {
    fn from(kind: SquareKind) -> Self {
        match kind {
            SquareKind::Hull => MatchKind::Hull,
            SquareKind::Space => MatchKind::Space,
            SquareKind::AlienBreach => MatchKind::AlienBreach,
            SquareKind::Corridor | SquareKind::Room | SquareKind::Ship => MatchKind::Internal,
            SquareKind::Unknown => MatchKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowSize {
    One,
    Three,
    Five,
}

impl WindowSize {
    pub fn cells(self) -> u8 {
        match self {
            WindowSize::One => 1,
            WindowSize::Three => 3,
            WindowSize::Five => 5,
        }
    }

    fn half(self) -> i32 {
        self.cells() as i32 / 2
    }
}

/// Raw, unvalidated form used for (de)serialisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTilePattern {
    id: String,
    window_width: WindowSize,
    window_height: WindowSize,
    #[serde(default)]
    mirrorable: bool,
    requirements: Vec<(Offset, MatchKind)>,
}

/// The neighbourhood a hull piece fits into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTilePattern", into = "RawTilePattern")]
pub struct TilePattern {
    id: String,
    window_width: WindowSize,
    window_height: WindowSize,
    mirrorable: bool,
    requirements: Vec<(Offset, MatchKind)>,
    mirrored_requirements: Vec<(Offset, MatchKind)>,
}

impl TryFrom<RawTilePattern> for TilePattern {
    type Error = PatternError;

    fn try_from(raw: RawTilePattern) -> Result<Self, Self::Error> {
        TilePattern::new(
            raw.id,
            raw.window_width,
            raw.window_height,
            raw.mirrorable,
            raw.requirements,
        )
    }
}

impl From<TilePattern> for RawTilePattern {
    fn from(p: TilePattern) -> Self {
        RawTilePattern {
            id: p.id,
            window_width: p.window_width,
            window_height: p.window_height,
            mirrorable: p.mirrorable,
            requirements: p.requirements,
        }
    }
}

impl TilePattern {
    pub fn new(
        id: impl Into<String>,
        window_width: WindowSize,
        window_height: WindowSize,
        mirrorable: bool,
        requirements: Vec<(Offset, MatchKind)>,
    ) -> Result<Self, PatternError> {
        let id = id.into();
        let (hw, hh) = (window_width.half(), window_height.half());
        for (i, &((x, y), _)) in requirements.iter().enumerate() {
            if x.abs() > hw || y.abs() > hh {
                return Err(PatternError::OffsetOutsideWindow {
                    id,
                    x,
                    y,
                    w: window_width.cells(),
                    h: window_height.cells(),
                });
            }
            if requirements[..i].iter().any(|&(o, _)| o == (x, y)) {
                return Err(PatternError::DuplicateOffset { id, x, y });
            }
        }
        Ok(Self::build(id, window_width, window_height, mirrorable, requirements))
    }

    fn build(
        id: String,
        window_width: WindowSize,
        window_height: WindowSize,
        mirrorable: bool,
        requirements: Vec<(Offset, MatchKind)>,
    ) -> Self {
        // Mirror in the grid x-axis: invert the relative y.
        let mirrored_requirements = requirements
            .iter()
            .map(|&((x, y), kind)| ((x, -y), kind))
            .collect();
        Self {
            id,
            window_width,
            window_height,
            mirrorable,
            requirements,
            mirrored_requirements,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mirrorable(&self) -> bool {
        self.mirrorable
    }

    pub fn requirements(&self) -> &[(Offset, MatchKind)] {
        &self.requirements
    }
}

/// The chosen tile for one boundary cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundaryMatch {
    pub tile_id: String,
    pub rotation: Rotation,
    /// Mirror in the x-axis *before* rotating.
    pub mirrored: bool,
}

/// Ordered patterns plus the tile to use when none match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLibrary {
    pub patterns: Vec<TilePattern>,
    pub fallback_tile: String,
}

impl TileLibrary {
    pub fn new(
        patterns: Vec<TilePattern>,
        fallback_tile: impl Into<String>,
    ) -> Result<Self, PatternError> {
        if patterns.is_empty() {
            return Err(PatternError::EmptyLibrary);
        }
        Ok(Self {
            patterns,
            fallback_tile: fallback_tile.into(),
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, PatternError> {
        let library: TileLibrary = serde_json::from_str(json)?;
        if library.patterns.is_empty() {
            return Err(PatternError::EmptyLibrary);
        }
        Ok(library)
    }

    /// Hull pieces for the standard ship kit.
    ///
    /// Windows are drawn with "up" facing North, the hull cell at the centre.
    pub fn standard() -> Self {
        use MatchKind::{AlienBreach, Hull, Internal, Space};
        use WindowSize::Three;

        let pattern = |id: &str, mirrorable: bool, requirements: Vec<(Offset, MatchKind)>| {
            TilePattern::build(id.to_string(), Three, Three, mirrorable, requirements)
        };
        let patterns = vec![
            // Breached wall: breach on the inside, space outside.
            pattern(
                "hull_breach",
                false,
                vec![((0, 0), Hull), ((0, -1), Space), ((0, 1), AlienBreach)],
            ),
            // Straight wall: space to the north, ship interior to the south.
            pattern(
                "hull_straight",
                false,
                vec![
                    ((0, 0), Hull),
                    ((-1, 0), Hull),
                    ((1, 0), Hull),
                    ((0, -1), Space),
                    ((0, 1), Internal),
                ],
            ),
            // Outer corner: wall turns south on the east side.
            pattern(
                "hull_corner_outer",
                true,
                vec![
                    ((0, 0), Hull),
                    ((-1, 0), Hull),
                    ((0, 1), Hull),
                    ((0, -1), Space),
                    ((1, 0), Space),
                    ((-1, 1), Internal),
                ],
            ),
            // Inner corner: interior only on the diagonal.
            pattern(
                "hull_corner_inner",
                true,
                vec![
                    ((0, 0), Hull),
                    ((-1, 0), Hull),
                    ((0, 1), Hull),
                    ((1, 1), Space),
                    ((-1, -1), Internal),
                ],
            ),
        ];

        Self {
            patterns,
            fallback_tile: "hull_block".to_string(),
        }
    }
}

/// Pick the first pattern/rotation that fits the neighbourhood of `position`.
///
/// Order: library order, then rotations 0°, 90°, 180°, 270°, all unmirrored
/// before the mirrored search of the same pattern.
pub fn match_boundary(
    position: GridPos,
    grid: &HashMap<GridPos, SquareKind>,
    library: &[TilePattern],
) -> Option<BoundaryMatch> {
    for pattern in library {
        let mut variants = vec![(false, &pattern.requirements)];
        if pattern.mirrorable {
            variants.push((true, &pattern.mirrored_requirements));
        }
        for (mirrored, requirements) in variants {
            if let Some(rotation) = Rotation::ALL
                .into_iter()
                .find(|&r| fits(position, grid, requirements, r))
            {
                return Some(BoundaryMatch {
                    tile_id: pattern.id.clone(),
                    rotation,
                    mirrored,
                });
            }
        }
    }
    None
}

/// Whether `pattern` fits at `position` with exactly this orientation.
pub fn pattern_matches(
    pattern: &TilePattern,
    position: GridPos,
    grid: &HashMap<GridPos, SquareKind>,
    rotation: Rotation,
    mirrored: bool,
) -> bool {
    let requirements = if mirrored {
        &pattern.mirrored_requirements
    } else {
        &pattern.requirements
    };
    fits(position, grid, requirements, rotation)
}

fn fits(
    (x, y): GridPos,
    grid: &HashMap<GridPos, SquareKind>,
    requirements: &[(Offset, MatchKind)],
    rotation: Rotation,
) -> bool {
    requirements.iter().all(|&(offset, required)| {
        let (dx, dy) = rotation.apply(offset);
        let target = x
            .checked_add_signed(dx)
            .zip(y.checked_add_signed(dy));
        match target.and_then(|pos| grid.get(&pos)) {
            Some(&kind) => MatchKind::from(kind) == required,
            None => true,
        }
    })
}
