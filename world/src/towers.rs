//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use path_defence_core::{
    AttackMode, CellCoord, PlacementError, TargetPriority, TowerDefinition, TowerId, TowerKind,
    TowerLevel, TowerSnapshot,
};

/// Tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    /// Identifier allocated by the world for the tower.
    pub(crate) id: TowerId,
    /// Kind of tower that was constructed.
    pub(crate) kind: TowerKind,
    /// Cell hosting the tower.
    pub(crate) cell: CellCoord,
    /// Current one-based level.
    pub(crate) level: u32,
    /// Statistics of the current level.
    pub(crate) stats: TowerLevel,
    /// Level-one cost paid on placement; the basis of sale refunds.
    pub(crate) purchase_cost: u64,
    pub(crate) attack_mode: AttackMode,
    pub(crate) priority: TargetPriority,
    /// Time left before the next attack cycle. Zero means ready.
    pub(crate) cooldown_remaining: Duration,
    /// World-space center of the hosting cell.
    pub(crate) position: Vec2,
}

impl TowerState {
    /// Targeting radius converted to world units.
    pub(crate) fn range_world(&self, grid_size: f32) -> f32 {
        self.stats.range * grid_size
    }

    pub(crate) fn snapshot(&self, grid_size: f32) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind.clone(),
            cell: self.cell,
            level: self.level,
            position: self.position,
            range: self.range_world(grid_size),
            attack_mode: self.attack_mode,
            priority: self.priority,
        }
    }
}

/// Static layout facts the placement validator checks against.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PlacementBounds {
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) reserved_rows: u32,
}

impl PlacementBounds {
    fn contains(&self, cell: CellCoord) -> bool {
        u32::try_from(cell.column()).is_ok_and(|column| column < self.columns)
            && u32::try_from(cell.row()).is_ok_and(|row| row < self.rows)
    }

    fn is_reserved(&self, cell: CellCoord) -> bool {
        u32::try_from(cell.row()).is_ok_and(|row| row < self.reserved_rows)
    }
}

/// Registry that stores towers keyed by cell and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<CellCoord, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Runs the static placement checks, cheapest first.
    ///
    /// Funds are checked by the caller once the definition is known.
    pub(crate) fn check_site(
        &self,
        cell: CellCoord,
        bounds: PlacementBounds,
        on_path: bool,
    ) -> Result<(), PlacementError> {
        if self.entries.contains_key(&cell) {
            return Err(PlacementError::Occupied);
        }
        if !bounds.contains(cell) {
            return Err(PlacementError::OutOfBounds);
        }
        if bounds.is_reserved(cell) {
            return Err(PlacementError::ReservedRow);
        }
        if on_path {
            return Err(PlacementError::OnPath);
        }
        Ok(())
    }

    /// Stores a new level-one tower and returns its identifier.
    ///
    /// Returns `None` when the definition declares no levels.
    pub(crate) fn insert(
        &mut self,
        kind: TowerKind,
        definition: &TowerDefinition,
        cell: CellCoord,
        grid_size: f32,
    ) -> Option<TowerId> {
        let stats = definition.level(1)?.clone();
        let id = self.allocate_id();
        let state = TowerState {
            id,
            kind,
            cell,
            level: 1,
            purchase_cost: stats.cost,
            stats,
            attack_mode: definition.attack_mode,
            priority: definition.priority,
            cooldown_remaining: Duration::ZERO,
            position: cell.center(grid_size),
        };
        let _ = self.entries.insert(cell, state);
        Some(id)
    }

    fn allocate_id(&mut self) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        id
    }

    pub(crate) fn get(&self, cell: CellCoord) -> Option<&TowerState> {
        self.entries.get(&cell)
    }

    pub(crate) fn get_mut(&mut self, cell: CellCoord) -> Option<&mut TowerState> {
        self.entries.get_mut(&cell)
    }

    pub(crate) fn find(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.values().find(|tower| tower.id == id)
    }

    pub(crate) fn find_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.values_mut().find(|tower| tower.id == id)
    }

    pub(crate) fn remove(&mut self, cell: CellCoord) -> Option<TowerState> {
        self.entries.remove(&cell)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }
}
