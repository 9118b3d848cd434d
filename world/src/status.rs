//! Timed status effects carried by enemies.

use std::{collections::BTreeMap, time::Duration};

use path_defence_core::{StatusKind, TowerId};

/// Interval between two damage applications of a damage-over-time effect.
pub const DAMAGE_OVER_TIME_PERIOD: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq)]
enum Potency {
    Slow(f32),
    Damage(u32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct StatusEffect {
    potency: Potency,
    remaining: Duration,
    since_last_tick: Duration,
}

/// Active effects of one enemy keyed by `(kind, source)`.
///
/// Re-applying an effect from the same source refreshes its duration and
/// potency instead of adding a second entry. Effects from different sources
/// coexist and stack.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusEffectSet {
    effects: BTreeMap<(StatusKind, TowerId), StatusEffect>,
}

impl StatusEffectSet {
    /// Applies or refreshes a slow removing `fraction` of base speed.
    pub fn apply_slow(&mut self, source: TowerId, fraction: f32, duration: Duration) {
        self.apply(StatusKind::Slow, source, Potency::Slow(fraction), duration);
    }

    /// Applies or refreshes a damage-over-time effect.
    ///
    /// `kind` must be a damage-over-time kind; a slow kind is ignored.
    pub fn apply_damage_over_time(
        &mut self,
        kind: StatusKind,
        source: TowerId,
        damage: u32,
        duration: Duration,
    ) {
        if !kind.is_damage_over_time() {
            return;
        }
        self.apply(kind, source, Potency::Damage(damage), duration);
    }

    fn apply(&mut self, kind: StatusKind, source: TowerId, potency: Potency, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let effect = self.effects.entry((kind, source)).or_insert(StatusEffect {
            potency,
            remaining: duration,
            since_last_tick: Duration::ZERO,
        });
        effect.potency = potency;
        effect.remaining = duration;
    }

    /// Decays every effect by `dt` and returns the damage-over-time owed.
    ///
    /// Expired effects are dropped before damage is accumulated. Surviving
    /// damage effects keep fractional progress towards their next period.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        self.effects.retain(|_, effect| {
            effect.remaining = effect.remaining.saturating_sub(dt);
            !effect.remaining.is_zero()
        });

        let mut damage = 0u32;
        for effect in self.effects.values_mut() {
            let Potency::Damage(per_tick) = effect.potency else {
                continue;
            };
            effect.since_last_tick = effect.since_last_tick.saturating_add(dt);
            while effect.since_last_tick >= DAMAGE_OVER_TIME_PERIOD {
                effect.since_last_tick -= DAMAGE_OVER_TIME_PERIOD;
                damage = damage.saturating_add(per_tick);
            }
        }
        damage
    }

    /// Combined slow fraction of all sources, clamped to `[0, 1]`.
    #[must_use]
    pub fn slow_fraction(&self) -> f32 {
        let total: f32 = self
            .effects
            .values()
            .filter_map(|effect| match effect.potency {
                Potency::Slow(fraction) => Some(fraction),
                Potency::Damage(_) => None,
            })
            .sum();
        total.clamp(0.0, 1.0)
    }

    /// Multiplier applied to base speed, in `[0, 1]`.
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        1.0 - self.slow_fraction()
    }

    /// Remaining duration of the effect applied by `source`, if active.
    #[must_use]
    pub fn remaining(&self, kind: StatusKind, source: TowerId) -> Option<Duration> {
        self.effects
            .get(&(kind, source))
            .map(|effect| effect.remaining)
    }

    /// Number of active effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Reports whether no effect is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn slows_from_different_sources_stack() {
        let mut effects = StatusEffectSet::default();
        effects.apply_slow(TowerId::new(1), 0.3, SECOND);
        effects.apply_slow(TowerId::new(2), 0.5, SECOND);

        assert!((effects.slow_fraction() - 0.8).abs() < 1e-6);
        assert!((effects.speed_multiplier() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn combined_slow_never_exceeds_full_stop() {
        let mut effects = StatusEffectSet::default();
        effects.apply_slow(TowerId::new(1), 0.7, SECOND);
        effects.apply_slow(TowerId::new(2), 0.7, SECOND);

        assert!((effects.slow_fraction() - 1.0).abs() < f32::EPSILON);
        assert!(effects.speed_multiplier().abs() < f32::EPSILON);
    }

    #[test]
    fn reapplying_from_same_source_refreshes_instead_of_stacking() {
        let mut effects = StatusEffectSet::default();
        let source = TowerId::new(4);
        effects.apply_slow(source, 0.25, SECOND);
        let _ = effects.advance(Duration::from_millis(600));
        effects.apply_slow(source, 0.25, SECOND);

        assert_eq!(effects.len(), 1);
        assert_eq!(effects.remaining(StatusKind::Slow, source), Some(SECOND));
        assert!((effects.slow_fraction() - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn effects_expire_on_their_own_clocks() {
        let mut effects = StatusEffectSet::default();
        effects.apply_slow(TowerId::new(1), 0.2, Duration::from_millis(300));
        effects.apply_slow(TowerId::new(2), 0.4, SECOND);

        let _ = effects.advance(Duration::from_millis(300));

        assert_eq!(effects.len(), 1);
        assert_eq!(effects.remaining(StatusKind::Slow, TowerId::new(1)), None);
        assert!((effects.slow_fraction() - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn damage_over_time_keeps_fractional_progress() {
        let mut effects = StatusEffectSet::default();
        effects.apply_damage_over_time(StatusKind::Bleeding, TowerId::new(1), 5, 10 * SECOND);

        assert_eq!(effects.advance(Duration::from_millis(300)), 0);
        assert_eq!(effects.advance(Duration::from_millis(300)), 5);
        assert_eq!(effects.advance(Duration::from_millis(400)), 5);
        assert_eq!(effects.advance(Duration::from_millis(1_100)), 10);
    }

    #[test]
    fn bleeding_and_burning_from_one_source_coexist() {
        let mut effects = StatusEffectSet::default();
        let source = TowerId::new(9);
        effects.apply_damage_over_time(StatusKind::Bleeding, source, 2, SECOND * 5);
        effects.apply_damage_over_time(StatusKind::Burning, source, 3, SECOND * 5);

        assert_eq!(effects.len(), 2);
        assert_eq!(effects.advance(Duration::from_millis(500)), 5);
        assert!((effects.slow_fraction()).abs() < f32::EPSILON);
    }

    #[test]
    fn slow_kind_is_not_accepted_as_damage_over_time() {
        let mut effects = StatusEffectSet::default();
        effects.apply_damage_over_time(StatusKind::Slow, TowerId::new(1), 4, SECOND);
        assert!(effects.is_empty());
    }
}
