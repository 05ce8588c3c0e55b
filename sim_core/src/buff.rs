//! Buffs: time-bounded stat and damage modifiers, including dynamic
//! (closure-valued) contributions evaluated at query time

use crate::actor::Actor;
use crate::battle::Battle;
use crate::stat::{aggregator, Stat, StatTable};
use crate::types::{ActorId, SkillType};
use std::fmt;
use std::sync::Arc;

/// Context handed to dynamic buff closures.
///
/// Carries the buff's owner and an immutable view of the whole battle, so
/// a closure can run recursion-guarded stat queries against the owner,
/// the original caster, or the owner's current target.
pub struct StatQuery<'a> {
    pub battle: &'a Battle,
    pub owner: &'a Actor,
}

impl<'a> StatQuery<'a> {
    /// Recursion-guarded stats of the buff's owner (pre-dynamic snapshot)
    pub fn owner_stats(&self) -> StatTable {
        aggregator::current_stats(self.battle, self.owner.id, true)
    }

    /// Recursion-guarded stats of an arbitrary actor
    pub fn stats_of(&self, id: ActorId) -> StatTable {
        aggregator::current_stats(self.battle, id, true)
    }

    /// The skill type the owner is currently resolving, if any
    pub fn last_skill_type(&self) -> Option<SkillType> {
        self.owner.last_skill_type
    }

    /// The owner's current target, if one is set
    pub fn current_target(&self) -> Option<&Actor> {
        self.owner
            .current_target
            .map(|id| self.battle.actor(id))
    }
}

/// Closure producing extra stat deltas for the owner at query time
pub type DynamicStatFn = Arc<dyn Fn(&StatQuery<'_>) -> StatTable + Send + Sync>;

/// Closure producing an extra damage bonus for the owner at query time
pub type DynamicDamageFn = Arc<dyn Fn(&StatQuery<'_>) -> f64 + Send + Sync>;

/// Turn-start hook data: a heal applied at the owner's turn start,
/// routed through the healing pipeline as `SkillType::HealOverTime`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnStartHeal {
    /// Fraction of the owner's max HP restored per turn
    pub max_hp_ratio: f64,
    /// Flat HP restored per turn
    pub flat: f64,
}

/// A time-bounded modifier held by an actor.
///
/// `duration` counts remaining rounds; `-1` means permanent. Identity for
/// refresh and stacking decisions is the `name`.
#[derive(Clone)]
pub struct Buff {
    pub name: String,
    pub duration: i32,
    pub stat_bonus: StatTable,
    pub damage_bonus: f64,
    pub element_penetration: f64,
    pub independent_damage_reduction: f64,
    pub damage_taken_increase: f64,
    pub stackable: bool,
    pub freshly_added: bool,
    pub self_buff: bool,
    pub turn_start_heal: Option<TurnStartHeal>,
    pub dynamic_stat_bonus: Option<DynamicStatFn>,
    pub dynamic_damage_bonus: Option<DynamicDamageFn>,
}

impl Buff {
    /// Create a buff lasting `duration` rounds (`-1` = permanent)
    pub fn new(name: impl Into<String>, duration: i32) -> Self {
        Buff {
            name: name.into(),
            duration,
            stat_bonus: StatTable::new(),
            damage_bonus: 0.0,
            element_penetration: 0.0,
            independent_damage_reduction: 0.0,
            damage_taken_increase: 0.0,
            stackable: false,
            freshly_added: false,
            self_buff: false,
            turn_start_heal: None,
            dynamic_stat_bonus: None,
            dynamic_damage_bonus: None,
        }
    }

    /// Create a permanent buff
    pub fn permanent(name: impl Into<String>) -> Self {
        Buff::new(name, -1)
    }

    /// Add a static stat contribution
    pub fn with_stat(mut self, stat: Stat, value: f64) -> Self {
        self.stat_bonus.add(stat, value);
        self
    }

    /// Set a static damage bonus
    pub fn with_damage_bonus(mut self, bonus: f64) -> Self {
        self.damage_bonus = bonus;
        self
    }

    /// Set a static element penetration
    pub fn with_element_penetration(mut self, penetration: f64) -> Self {
        self.element_penetration = penetration;
        self
    }

    /// Set a multiplicative independent damage reduction on the holder
    pub fn with_independent_damage_reduction(mut self, reduction: f64) -> Self {
        self.independent_damage_reduction = reduction;
        self
    }

    /// Set a multiplicative damage-taken amplifier on the holder
    pub fn with_damage_taken_increase(mut self, increase: f64) -> Self {
        self.damage_taken_increase = increase;
        self
    }

    /// Allow duplicate instances of this buff by name
    pub fn stackable(mut self) -> Self {
        self.stackable = true;
        self
    }

    /// Attach a heal applied at the owner's turn start
    pub fn with_turn_start_heal(mut self, heal: TurnStartHeal) -> Self {
        self.turn_start_heal = Some(heal);
        self
    }

    /// Attach a dynamic stat contribution
    pub fn with_dynamic_stats<F>(mut self, f: F) -> Self
    where
        F: Fn(&StatQuery<'_>) -> StatTable + Send + Sync + 'static,
    {
        self.dynamic_stat_bonus = Some(Arc::new(f));
        self
    }

    /// Attach a dynamic damage bonus
    pub fn with_dynamic_damage<F>(mut self, f: F) -> Self
    where
        F: Fn(&StatQuery<'_>) -> f64 + Send + Sync + 'static,
    {
        self.dynamic_damage_bonus = Some(Arc::new(f));
        self
    }

    pub fn is_permanent(&self) -> bool {
        self.duration < 0
    }

    /// Damage bonus contributed by this buff for the given query
    pub fn current_damage_bonus(&self, query: &StatQuery<'_>) -> f64 {
        match &self.dynamic_damage_bonus {
            Some(f) => f(query),
            None => self.damage_bonus,
        }
    }
}

impl fmt::Debug for Buff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buff")
            .field("name", &self.name)
            .field("duration", &self.duration)
            .field("stat_bonus", &self.stat_bonus)
            .field("damage_bonus", &self.damage_bonus)
            .field("element_penetration", &self.element_penetration)
            .field("stackable", &self.stackable)
            .field("freshly_added", &self.freshly_added)
            .field("self_buff", &self.self_buff)
            .field("dynamic_stats", &self.dynamic_stat_bonus.is_some())
            .field("dynamic_damage", &self.dynamic_damage_bonus.is_some())
            .finish()
    }
}

/// Result of adding a buff to a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuffApplied {
    Added,
    Refreshed,
}

/// The set of buffs active on one actor
#[derive(Debug, Clone, Default)]
pub struct BuffList {
    buffs: Vec<Buff>,
}

impl BuffList {
    pub fn new() -> Self {
        BuffList::default()
    }

    /// Add a buff.
    ///
    /// A non-stackable buff whose name matches an existing instance
    /// refreshes that instance's duration instead of adding a duplicate.
    pub fn add(&mut self, mut buff: Buff) -> BuffApplied {
        buff.freshly_added = true;
        if !buff.stackable {
            if let Some(existing) = self.buffs.iter_mut().find(|b| b.name == buff.name) {
                existing.duration = buff.duration;
                existing.freshly_added = true;
                existing.self_buff = buff.self_buff;
                return BuffApplied::Refreshed;
            }
        }
        self.buffs.push(buff);
        BuffApplied::Added
    }

    /// Remove all buffs with the given name
    pub fn remove(&mut self, name: &str) {
        self.buffs.retain(|b| b.name != name);
    }

    pub fn get(&self, name: &str) -> Option<&Buff> {
        self.buffs.iter().find(|b| b.name == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Buff> {
        self.buffs.iter()
    }

    pub fn len(&self) -> usize {
        self.buffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffs.is_empty()
    }

    /// End-of-turn duration tick, run after the owner's action resolved.
    ///
    /// Skips permanent buffs; skips exactly once buffs the owner applied
    /// to itself this turn; freezes all durations when `is_extra_turn`
    /// and the owner retains buffs through extra turns. Returns the names
    /// of buffs that expired.
    pub fn tick_end_of_turn(&mut self, is_extra_turn: bool, retains_in_extra: bool) -> Vec<String> {
        let mut expired = Vec::new();
        for buff in &mut self.buffs {
            if buff.is_permanent() {
                continue;
            }
            if buff.freshly_added {
                buff.freshly_added = false;
                if buff.self_buff {
                    continue;
                }
            }
            if is_extra_turn && retains_in_extra {
                continue;
            }
            buff.duration -= 1;
            if buff.duration == 0 {
                expired.push(buff.name.clone());
            }
        }
        self.buffs.retain(|b| b.duration != 0);
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_stackable_refreshes_duration() {
        let mut list = BuffList::new();
        assert_eq!(list.add(Buff::new("SPD Boost", 2)), BuffApplied::Added);
        assert_eq!(list.add(Buff::new("SPD Boost", 5)), BuffApplied::Refreshed);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("SPD Boost").unwrap().duration, 5);
    }

    #[test]
    fn test_stackable_duplicates() {
        let mut list = BuffList::new();
        list.add(Buff::new("Charge", 3).stackable());
        list.add(Buff::new("Charge", 3).stackable());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_permanent_never_expires() {
        let mut list = BuffList::new();
        list.add(Buff::permanent("Aura"));
        for _ in 0..10 {
            assert!(list.tick_end_of_turn(false, false).is_empty());
        }
        assert!(list.has("Aura"));
    }

    #[test]
    fn test_self_buff_skips_first_tick() {
        let mut list = BuffList::new();
        let mut buff = Buff::new("Sheathed Blade SPD Boost", 2);
        buff.self_buff = true;
        list.add(buff);

        // Turn the buff was applied: duration unchanged.
        list.tick_end_of_turn(false, false);
        assert_eq!(list.get("Sheathed Blade SPD Boost").unwrap().duration, 2);
        // Next turn: decrements normally.
        list.tick_end_of_turn(false, false);
        assert_eq!(list.get("Sheathed Blade SPD Boost").unwrap().duration, 1);
        let expired = list.tick_end_of_turn(false, false);
        assert_eq!(expired, vec!["Sheathed Blade SPD Boost".to_string()]);
        assert!(list.is_empty());
    }

    #[test]
    fn test_foreign_buff_ticks_immediately() {
        let mut list = BuffList::new();
        list.add(Buff::new("Combat Redeployment", 1));
        let expired = list.tick_end_of_turn(false, false);
        assert_eq!(expired.len(), 1);
    }

    #[test]
    fn test_extra_turn_retention() {
        let mut list = BuffList::new();
        let mut buff = Buff::new("Resurgence Enhanced State", 1);
        buff.self_buff = true;
        list.add(buff);

        // Action turn: freshly-added skip.
        list.tick_end_of_turn(true, true);
        // Extra turn: retention freezes the duration.
        list.tick_end_of_turn(true, true);
        assert_eq!(list.get("Resurgence Enhanced State").unwrap().duration, 1);
        // Regular turn afterwards: expires.
        let expired = list.tick_end_of_turn(false, true);
        assert_eq!(expired.len(), 1);
    }
}
