//! Authored waypoint paths shared by every enemy of a stage.

use std::collections::BTreeSet;

use glam::Vec2;
use thiserror::Error;

use crate::CellCoord;

/// Errors raised while building a [`WaypointPath`] from authored input.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PathError {
    /// A token did not follow the `"x,y"` integer format.
    #[error("malformed waypoint token `{0}`; expected `x,y`")]
    MalformedToken(String),
    /// Fewer than two distinct waypoints remained after normalisation.
    #[error("a path needs at least two distinct waypoints, found {0}")]
    TooShort(usize),
    /// The cell edge length was not a positive finite number.
    #[error("grid size must be positive, got {0}")]
    InvalidGridSize(f32),
}

/// Ordered, axis-aligned sequence of grid waypoints with derived lengths.
///
/// Lengths are measured in world units between cell centers. They are computed
/// once at construction and never change.
#[derive(Clone, Debug, PartialEq)]
pub struct WaypointPath {
    waypoints: Vec<CellCoord>,
    cumulative: Vec<f32>,
    occupied: BTreeSet<CellCoord>,
    grid_size: f32,
}

impl WaypointPath {
    /// Parses authored `"x,y"` tokens into a path.
    pub fn parse<S: AsRef<str>>(tokens: &[S], grid_size: f32) -> Result<Self, PathError> {
        let cells = tokens
            .iter()
            .map(|token| parse_token(token.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_cells(&cells, grid_size)
    }

    /// Builds a path from grid cells.
    ///
    /// Diagonal steps are split into an x-first then y-first pair of segments
    /// and repeated cells are collapsed, so every stored segment is
    /// axis-aligned and non-empty.
    pub fn from_cells(cells: &[CellCoord], grid_size: f32) -> Result<Self, PathError> {
        if !grid_size.is_finite() || grid_size <= 0.0 {
            return Err(PathError::InvalidGridSize(grid_size));
        }

        let mut waypoints: Vec<CellCoord> = Vec::with_capacity(cells.len() * 2);
        for &cell in cells {
            let Some(&last) = waypoints.last() else {
                waypoints.push(cell);
                continue;
            };
            if last == cell {
                continue;
            }
            if last.column() != cell.column() && last.row() != cell.row() {
                waypoints.push(CellCoord::new(cell.column(), last.row()));
            }
            waypoints.push(cell);
        }

        if waypoints.len() < 2 {
            return Err(PathError::TooShort(waypoints.len()));
        }

        let mut cumulative = Vec::with_capacity(waypoints.len());
        let mut travelled = 0.0;
        cumulative.push(travelled);
        for pair in waypoints.windows(2) {
            travelled += pair[0].manhattan_distance(pair[1]) as f32 * grid_size;
            cumulative.push(travelled);
        }

        let occupied = occupied_cells(&waypoints);

        Ok(Self {
            waypoints,
            cumulative,
            occupied,
            grid_size,
        })
    }

    /// Waypoints in travel order.
    #[must_use]
    pub fn waypoints(&self) -> &[CellCoord] {
        &self.waypoints
    }

    /// Number of waypoints, always at least two.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false; present for API symmetry with [`Self::len`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Edge length of a grid cell in world units.
    #[must_use]
    pub fn grid_size(&self) -> f32 {
        self.grid_size
    }

    /// Sum of all segment lengths in world units.
    #[must_use]
    pub fn total_length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Distance along the path from the first waypoint to the indexed one.
    #[must_use]
    pub fn length_until(&self, waypoint_index: usize) -> f32 {
        let last = self.cumulative.len().saturating_sub(1);
        self.cumulative[waypoint_index.min(last)]
    }

    /// World-space center of the indexed waypoint, clamped to the final one.
    #[must_use]
    pub fn position_at(&self, waypoint_index: usize) -> Vec2 {
        let last = self.waypoints.len() - 1;
        self.waypoints[waypoint_index.min(last)].center(self.grid_size)
    }

    /// Every grid cell the path passes through, including cells between waypoints.
    #[must_use]
    pub fn full_occupied_cells(&self) -> &BTreeSet<CellCoord> {
        &self.occupied
    }

    /// Reports whether the path passes through the provided cell.
    #[must_use]
    pub fn occupies(&self, cell: CellCoord) -> bool {
        self.occupied.contains(&cell)
    }
}

fn parse_token(token: &str) -> Result<CellCoord, PathError> {
    let malformed = || PathError::MalformedToken(token.to_owned());
    let (x, y) = token.split_once(',').ok_or_else(malformed)?;
    let column = x.trim().parse::<i32>().map_err(|_| malformed())?;
    let row = y.trim().parse::<i32>().map_err(|_| malformed())?;
    Ok(CellCoord::new(column, row))
}

fn occupied_cells(waypoints: &[CellCoord]) -> BTreeSet<CellCoord> {
    let mut cells = BTreeSet::new();
    for pair in waypoints.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let column_step = (end.column() - start.column()).signum();
        let row_step = (end.row() - start.row()).signum();
        let mut cursor = start;
        let _ = cells.insert(cursor);
        while cursor != end {
            cursor = CellCoord::new(cursor.column() + column_step, cursor.row() + row_step);
            let _ = cells.insert(cursor);
        }
    }
    cells
}
