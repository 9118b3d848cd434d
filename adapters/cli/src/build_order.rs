//! Parsing of build orders passed on the command line.

use std::{error::Error, fmt, str::FromStr};

use path_defence_core::{CellCoord, TowerKind};

/// Separates the tower kind from the cell in a placement order.
const KIND_DELIMITER: char = '@';

/// Tower purchase requested on the command line as `kind@x,y`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PlacementOrder {
    /// Type of tower to purchase.
    pub(crate) kind: TowerKind,
    /// Cell receiving the tower.
    pub(crate) cell: CellCoord,
}

impl FromStr for PlacementOrder {
    type Err = BuildOrderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(BuildOrderError::Empty);
        }

        let (kind, cell) = trimmed
            .split_once(KIND_DELIMITER)
            .ok_or_else(|| BuildOrderError::MissingCell(trimmed.to_owned()))?;
        let kind = kind.trim();
        if kind.is_empty() {
            return Err(BuildOrderError::MissingKind(trimmed.to_owned()));
        }

        Ok(Self {
            kind: TowerKind::new(kind),
            cell: parse_cell(cell)?,
        })
    }
}

/// Parses an `x,y` cell coordinate.
pub(crate) fn parse_cell(value: &str) -> Result<CellCoord, BuildOrderError> {
    let invalid = || BuildOrderError::InvalidCell(value.trim().to_owned());
    let (column, row) = value.split_once(',').ok_or_else(invalid)?;
    let column = column.trim().parse::<i32>().map_err(|_| invalid())?;
    let row = row.trim().parse::<i32>().map_err(|_| invalid())?;
    Ok(CellCoord::new(column, row))
}

/// Errors that can occur while parsing build orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BuildOrderError {
    /// The order was empty or contained only whitespace.
    Empty,
    /// The order did not name a tower kind before the delimiter.
    MissingKind(String),
    /// The order did not contain a cell after the tower kind.
    MissingCell(String),
    /// The cell could not be parsed as `x,y`.
    InvalidCell(String),
}

impl fmt::Display for BuildOrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "build order was empty"),
            Self::MissingKind(order) => write!(f, "build order '{order}' does not name a tower"),
            Self::MissingCell(order) => {
                write!(f, "build order '{order}' is missing '@x,y'")
            }
            Self::InvalidCell(cell) => write!(f, "could not parse cell '{cell}' as x,y"),
        }
    }
}

impl Error for BuildOrderError {}
