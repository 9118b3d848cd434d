#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system responsible for emitting tower placement, upgrade and sale commands.
//!
//! Requests arrive from outside the simulation at any time and are drained at
//! a rate of one per tick, in arrival order.

use std::collections::VecDeque;

use path_defence_core::{CellCoord, Command, TowerKind};
use tracing::trace;

/// Request originating from the player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildRequest {
    /// Purchase and place a tower.
    Place {
        /// Kind of tower to purchase.
        kind: TowerKind,
        /// Cell receiving the tower.
        cell: CellCoord,
    },
    /// Advance the tower at the cell by one level.
    Upgrade {
        /// Cell hosting the tower.
        cell: CellCoord,
    },
    /// Sell the tower at the cell.
    Sell {
        /// Cell hosting the tower.
        cell: CellCoord,
    },
}

impl BuildRequest {
    fn into_command(self) -> Command {
        match self {
            Self::Place { kind, cell } => Command::PlaceTower { kind, cell },
            Self::Upgrade { cell } => Command::UpgradeTower { cell },
            Self::Sell { cell } => Command::SellTower { cell },
        }
    }
}

/// Builder system that turns queued requests into world commands.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pending: VecDeque<BuildRequest>,
}

impl Builder {
    /// Creates a new builder system instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a request for a later tick.
    pub fn submit(&mut self, request: BuildRequest) {
        self.pending.push_back(request);
    }

    /// Number of requests waiting to be processed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Emits the command for the oldest pending request, if any.
    pub fn handle(&mut self, out: &mut Vec<Command>) {
        let Some(request) = self.pending.pop_front() else {
            return;
        };
        trace!(?request, remaining = self.pending.len(), "processing build request");
        out.push(request.into_command());
    }
}
