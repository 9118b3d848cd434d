//! Enemy simulation and the generational arena that owns active enemies.

use std::time::Duration;

use glam::Vec2;
use path_defence_core::{EnemyId, EnemyKind, EnemySnapshot, EnemyStats, WaypointPath};

use crate::status::StatusEffectSet;

/// Lifecycle of an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EnemyState {
    Spawned,
    Walking,
    Dead,
    ReachedEnd,
}

/// Terminal transition produced while advancing an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Departure {
    Killed,
    ReachedEnd,
}

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) kind: EnemyKind,
    pub(crate) max_health: u32,
    pub(crate) health: u32,
    pub(crate) speed: f32,
    pub(crate) damage: u32,
    pub(crate) reward: u64,
    pub(crate) waypoint_index: usize,
    pub(crate) position: Vec2,
    pub(crate) effects: StatusEffectSet,
    pub(crate) state: EnemyState,
    pub(crate) spawn_sequence: u64,
}

impl Enemy {
    pub(crate) fn spawn(
        kind: EnemyKind,
        stats: &EnemyStats,
        path: &WaypointPath,
        spawn_sequence: u64,
    ) -> Self {
        Self {
            kind,
            max_health: stats.health,
            health: stats.health,
            speed: stats.speed,
            damage: stats.damage,
            reward: stats.reward,
            waypoint_index: 0,
            position: path.position_at(0),
            effects: StatusEffectSet::default(),
            state: EnemyState::Spawned,
            spawn_sequence,
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        matches!(self.state, EnemyState::Spawned | EnemyState::Walking)
    }

    /// Subtracts health, clamped at zero. Returns true only for the call that killed.
    pub(crate) fn decrease_health(&mut self, amount: u32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.state = EnemyState::Dead;
            return true;
        }
        false
    }

    /// Runs one tick: effect decay, damage-over-time, then motion.
    ///
    /// Death from damage-over-time wins over reaching the end in the same tick.
    pub(crate) fn advance(&mut self, dt: Duration, path: &WaypointPath) -> Option<Departure> {
        if !self.is_alive() {
            return None;
        }
        self.state = EnemyState::Walking;

        let owed = self.effects.advance(dt);
        if owed > 0 && self.decrease_health(owed) {
            return Some(Departure::Killed);
        }

        let step = self.speed * self.effects.speed_multiplier() * dt.as_secs_f32();
        let last = path.len() - 1;
        let next_index = (self.waypoint_index + 1).min(last);
        let target = path.position_at(next_index);
        let remaining = self.position.distance(target);

        if remaining <= step {
            self.position = target;
            self.waypoint_index = next_index;
        } else if step > 0.0 {
            self.position += (target - self.position) / remaining * step;
        }

        if self.waypoint_index >= last {
            self.state = EnemyState::ReachedEnd;
            return Some(Departure::ReachedEnd);
        }
        None
    }

    /// Fraction of the path covered, used only to rank targets.
    pub(crate) fn progress(&self, path: &WaypointPath) -> f32 {
        let total = path.total_length();
        if total <= 0.0 {
            return 0.0;
        }
        let partial = self
            .position
            .distance(path.position_at(self.waypoint_index));
        ((path.length_until(self.waypoint_index) + partial) / total).clamp(0.0, 1.0)
    }

    pub(crate) fn snapshot(&self, id: EnemyId, path: &WaypointPath) -> EnemySnapshot {
        EnemySnapshot {
            id,
            kind: self.kind.clone(),
            position: self.position,
            health: self.health,
            max_health: self.max_health,
            progress: self.progress(path),
            speed_multiplier: self.effects.speed_multiplier(),
            spawn_sequence: self.spawn_sequence,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    enemy: Option<Enemy>,
}

/// Arena of enemies addressed by generation-checked handles.
#[derive(Clone, Debug, Default)]
pub(crate) struct EnemyArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    next_sequence: u64,
}

impl EnemyArena {
    pub(crate) fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        sequence
    }

    pub(crate) fn insert(&mut self, enemy: Enemy) -> EnemyId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.enemy = Some(enemy);
            return EnemyId::new(index, slot.generation);
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            enemy: Some(enemy),
        });
        EnemyId::new(index, 0)
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.enemy.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.enemy.as_mut()
    }

    pub(crate) fn remove(&mut self, id: EnemyId) -> Option<Enemy> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let enemy = slot.enemy.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        Some(enemy)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (EnemyId, &Enemy)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let enemy = slot.enemy.as_ref()?;
            let index = u32::try_from(index).ok()?;
            Some((EnemyId::new(index, slot.generation), enemy))
        })
    }

    /// Handles of living enemies ordered by spawn sequence.
    pub(crate) fn alive_in_spawn_order(&self) -> Vec<EnemyId> {
        let mut alive: Vec<(u64, EnemyId)> = self
            .iter()
            .filter(|(_, enemy)| enemy.is_alive())
            .map(|(id, enemy)| (enemy.spawn_sequence, id))
            .collect();
        alive.sort_unstable_by_key(|(sequence, _)| *sequence);
        alive.into_iter().map(|(_, id)| id).collect()
    }

    pub(crate) fn alive_count(&self) -> usize {
        self.iter().filter(|(_, enemy)| enemy.is_alive()).count()
    }

    /// Drops every enemy that died or reached the end since the last sweep.
    pub(crate) fn sweep(&mut self) {
        let departed: Vec<EnemyId> = self
            .iter()
            .filter(|(_, enemy)| !enemy.is_alive())
            .map(|(id, _)| id)
            .collect();
        for id in departed {
            let _ = self.remove(id);
        }
    }
}
