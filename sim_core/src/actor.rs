//! The actor model: health, energy, toughness, equipment, buffs, and
//! per-battle lifecycle flags

use crate::ai::AiPolicy;
use crate::buff::BuffList;
use crate::catalog::{self, CatalogError, MonsterData};
use crate::equipment::{LightCone, Relic, RelicSetSkill};
use crate::stat::{aggregator, StatTable};
use crate::types::{ActorId, Element, PathTag, Side, SkillType};
use std::collections::HashMap;

/// A battle participant: party member or enemy.
///
/// One struct serves both; `toughness` is `Some` only for enemies. The
/// lifecycle spans a single battle.
#[derive(Debug, Clone)]
pub struct Actor {
    /// Assigned by the battle at construction
    pub id: ActorId,
    /// Catalog identity (character or monster id)
    pub unit_id: String,
    pub name: String,
    pub side: Side,
    pub path: Option<PathTag>,
    pub level: u32,
    pub base_stats: StatTable,
    pub hp: f64,
    pub energy: f64,
    pub max_energy: f64,
    pub can_instant_ultimate: bool,
    pub toughness: Option<f64>,
    pub max_toughness: f64,
    pub toughness_broken: bool,
    pub weaknesses: Vec<Element>,
    pub resistances: HashMap<Element, f64>,
    pub light_cone: Option<LightCone>,
    pub relics: Vec<Relic>,
    /// Derived from `relics` at battle construction
    pub set_skills: Vec<(RelicSetSkill, u8)>,
    /// Flat and percent stat grants independent of equipment
    pub traces: StatTable,
    /// Catalog skill ids this actor can use
    pub skills: Vec<String>,
    pub buffs: BuffList,
    pub ai: AiPolicy,
    /// Talent skill fired when this actor kills an enemy
    pub kill_talent: Option<String>,
    /// The skill type currently resolving, read by dynamic buffs
    pub last_skill_type: Option<SkillType>,
    /// The primary target of the action in flight, read by dynamic buffs
    pub current_target: Option<ActorId>,
    pub has_extra_turn: bool,
    /// Buff durations freeze during this actor's extra turns
    pub retains_buffs_in_extra_turn: bool,
}

impl Actor {
    pub fn new(
        unit_id: impl Into<String>,
        name: impl Into<String>,
        side: Side,
        base_stats: StatTable,
    ) -> Self {
        Actor {
            id: ActorId(usize::MAX),
            unit_id: unit_id.into(),
            name: name.into(),
            side,
            path: None,
            level: 80,
            base_stats,
            hp: 0.0,
            energy: 0.0,
            max_energy: 100.0,
            can_instant_ultimate: false,
            toughness: None,
            max_toughness: 0.0,
            toughness_broken: false,
            weaknesses: Vec::new(),
            resistances: HashMap::new(),
            light_cone: None,
            relics: Vec::new(),
            set_skills: Vec::new(),
            traces: StatTable::new(),
            skills: Vec::new(),
            buffs: BuffList::new(),
            ai: AiPolicy::BasicOnly,
            kill_talent: None,
            last_skill_type: None,
            current_target: None,
            has_extra_turn: false,
            retains_buffs_in_extra_turn: false,
        }
    }

    /// Assemble an enemy from catalog monster data
    pub fn from_monster(data: &MonsterData, side: Side) -> Result<Self, CatalogError> {
        if data.skills.is_empty() {
            return Err(CatalogError::NoSkills(data.id.clone()));
        }
        let mut actor = Actor::new(&data.id, &data.name, side, catalog::parse_stat_map(&data.stats)?);
        actor.level = data.level;
        actor.weaknesses = catalog::parse_elements(&data.weaknesses)?;
        actor.resistances = catalog::parse_resistances(&data.resistances)?;
        actor.toughness = Some(data.toughness);
        actor.max_toughness = data.max_toughness;
        actor.skills = data.skills.clone();
        Ok(actor)
    }

    pub fn with_path(mut self, path: PathTag) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_max_energy(mut self, max_energy: f64) -> Self {
        self.max_energy = max_energy;
        self
    }

    pub fn with_skills(mut self, skills: Vec<String>) -> Self {
        self.skills = skills;
        self
    }

    pub fn with_ai(mut self, ai: AiPolicy) -> Self {
        self.ai = ai;
        self
    }

    /// Register a talent fired on enemy kills; such actors also retain
    /// buff durations through the extra turns the talent grants
    pub fn with_kill_talent(mut self, skill_id: impl Into<String>) -> Self {
        self.kill_talent = Some(skill_id.into());
        self.retains_buffs_in_extra_turn = true;
        self
    }

    pub fn with_light_cone(mut self, light_cone: LightCone) -> Self {
        self.light_cone = Some(light_cone);
        self
    }

    pub fn with_traces(mut self, traces: StatTable) -> Self {
        self.traces = traces;
        self
    }

    pub fn with_toughness(mut self, max_toughness: f64) -> Self {
        self.toughness = Some(max_toughness);
        self.max_toughness = max_toughness;
        self
    }

    /// Equip a relic, enforcing one piece per slot and six pieces total
    pub fn equip_relic(&mut self, relic: Relic) -> Result<(), CatalogError> {
        if self.relics.iter().any(|r| r.slot == relic.slot) {
            return Err(CatalogError::DuplicateSlot(relic.slot));
        }
        if self.relics.len() >= 6 {
            return Err(CatalogError::TooManyRelics(6));
        }
        self.relics.push(relic);
        Ok(())
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Set the current and maximum toughness directly
    pub fn set_toughness(&mut self, current: f64, max: f64) {
        self.toughness = Some(current);
        self.max_toughness = max;
    }

    /// Stats without dynamic buff contributions; usable before the actor
    /// joins a battle
    pub fn detached_stats(&self) -> StatTable {
        let layers = aggregator::equipped_layers(self);
        aggregator::finalize(&layers, &self.buffs, None)
    }

    /// Gain energy scaled by the regeneration rate, clamped to the cap.
    /// Returns the amount actually gained.
    pub fn gain_energy(&mut self, base: f64, regen_rate: f64) -> f64 {
        let before = self.energy;
        self.energy = (self.energy + base * (1.0 + regen_rate)).min(self.max_energy);
        if self.energy >= self.max_energy {
            self.can_instant_ultimate = true;
        }
        self.energy - before
    }

    /// Consume energy if available; clears the instant-ultimate flag on
    /// success
    pub fn consume_energy(&mut self, amount: f64) -> bool {
        if self.energy < amount {
            return false;
        }
        self.energy -= amount;
        self.can_instant_ultimate = false;
        true
    }
}
