//! The battle context and action-value scheduler.
//!
//! A `Battle` owns every participant, the per-actor action progress, the
//! per-side skill-point pools, the pending-boost map, the RNG, and the
//! event log. Each round draws from a global action-value pool; actors
//! advance proportionally to SPD, act when their progress fills, and
//! instant ultimates preempt between any two actions.

use crate::actor::Actor;
use crate::buff::Buff;
use crate::config::EngineConstants;
use crate::damage::{self, DefenseModifiers};
use crate::effect::{BoostTiming, Effect};
use crate::equipment::{LightConeSkill, RelicSetSkill};
use crate::event::BattleEvent;
use crate::heal;
use crate::skill::{SkillRegistry, SkillRoutine, TargetRule};
use crate::stat::{aggregator, Stat, StatTable};
use crate::types::{ActorId, Element, Side, SkillType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

const READY_EPS: f64 = 1e-6;

/// Construction-time battle errors
#[derive(Debug, Error)]
pub enum BattleError {
    #[error("actor `{name}` has non-positive max HP ({value})")]
    InvariantViolation { name: String, value: f64 },
    #[error("battle needs at least one participant")]
    NoParticipants,
}

/// Terminal state of a battle run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BattleOutcome {
    /// `None` is a draw or the max-round cutoff
    pub winner: Option<Side>,
    pub rounds: u32,
}

pub struct Battle {
    actors: Vec<Actor>,
    progress: Vec<f64>,
    pending_boosts: BTreeMap<ActorId, f64>,
    skill_points: HashMap<Side, u32>,
    max_skill_points: HashMap<Side, u32>,
    registry: SkillRegistry,
    constants: EngineConstants,
    rng: StdRng,
    events: Vec<BattleEvent>,
    round: u32,
    is_over: bool,
    winner: Option<Side>,
    started: bool,
}

impl Battle {
    /// Assemble a battle from already-equipped actors.
    ///
    /// Assigns ids, derives relic-set skills, fills every actor's HP to
    /// its computed maximum, and seeds the per-side skill-point pools.
    pub fn new(
        mut actors: Vec<Actor>,
        registry: SkillRegistry,
        seed: u64,
    ) -> Result<Self, BattleError> {
        if actors.is_empty() {
            return Err(BattleError::NoParticipants);
        }
        let constants = EngineConstants::default();
        let mut skill_points = HashMap::new();
        let mut max_skill_points = HashMap::new();
        for (index, actor) in actors.iter_mut().enumerate() {
            actor.id = ActorId(index);
            actor.set_skills = RelicSetSkill::active_sets(&actor.relics);
            let max_hp = actor.detached_stats().get(Stat::Hp);
            if max_hp <= 0.0 {
                return Err(BattleError::InvariantViolation {
                    name: actor.name.clone(),
                    value: max_hp,
                });
            }
            actor.hp = max_hp;
            skill_points
                .entry(actor.side)
                .or_insert(constants.skill_points.initial);
            max_skill_points
                .entry(actor.side)
                .or_insert(constants.skill_points.cap);
        }
        let count = actors.len();
        Ok(Battle {
            actors,
            progress: vec![0.0; count],
            pending_boosts: BTreeMap::new(),
            skill_points,
            max_skill_points,
            registry,
            constants,
            rng: StdRng::seed_from_u64(seed),
            events: Vec::new(),
            round: 0,
            is_over: false,
            winner: None,
            started: false,
        })
    }

    /// Replace the engine constants; also reseeds the skill-point pools
    pub fn with_constants(mut self, constants: EngineConstants) -> Self {
        for points in self.skill_points.values_mut() {
            *points = constants.skill_points.initial;
        }
        for cap in self.max_skill_points.values_mut() {
            *cap = constants.skill_points.cap;
        }
        self.constants = constants;
        self
    }

    pub fn actor(&self, id: ActorId) -> &Actor {
        &self.actors[id.0]
    }

    pub fn actor_mut(&mut self, id: ActorId) -> &mut Actor {
        &mut self.actors[id.0]
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    pub fn constants(&self) -> &EngineConstants {
        &self.constants
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn is_over(&self) -> bool {
        self.is_over
    }

    pub fn winner(&self) -> Option<Side> {
        self.winner
    }

    pub fn progress(&self, id: ActorId) -> f64 {
        self.progress[id.0]
    }

    /// Current stats of an actor; see
    /// [`aggregator::current_stats`] for the guard semantics
    pub fn current_stats(&self, id: ActorId, recursive_guard: bool) -> StatTable {
        aggregator::current_stats(self, id, recursive_guard)
    }

    pub fn max_hp(&self, id: ActorId) -> f64 {
        self.current_stats(id, false).get(Stat::Hp)
    }

    pub fn hp_ratio(&self, id: ActorId) -> f64 {
        let max = self.max_hp(id);
        if max > 0.0 {
            self.actors[id.0].hp / max
        } else {
            0.0
        }
    }

    /// Ids of all living actors, in participant order
    pub fn living(&self) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|a| a.is_alive())
            .map(|a| a.id)
            .collect()
    }

    /// Ids of living actors on one side, in participant order
    pub fn living_on_side(&self, side: Side) -> Vec<ActorId> {
        self.actors
            .iter()
            .filter(|a| a.is_alive() && a.side == side)
            .map(|a| a.id)
            .collect()
    }

    pub fn skill_points(&self, side: Side) -> u32 {
        self.skill_points.get(&side).copied().unwrap_or(0)
    }

    pub fn set_skill_points(&mut self, side: Side, points: u32) {
        self.skill_points.insert(side, points);
    }

    pub(crate) fn use_skill_point(&mut self, side: Side) -> bool {
        let Some(points) = self.skill_points.get_mut(&side) else {
            return false;
        };
        if *points == 0 {
            return false;
        }
        *points -= 1;
        let remaining = *points;
        self.push_event(BattleEvent::SkillPointSpent { side, remaining });
        true
    }

    pub(crate) fn gain_skill_point(&mut self, side: Side) {
        let cap = self.max_skill_points.get(&side).copied().unwrap_or(0);
        let Some(points) = self.skill_points.get_mut(&side) else {
            return;
        };
        if *points >= cap {
            return;
        }
        *points += 1;
        let remaining = *points;
        self.push_event(BattleEvent::SkillPointGained { side, remaining });
    }

    /// Apply a buff from a caster to a target, tracking self-application
    /// for the freshly-added duration skip
    pub fn apply_buff(&mut self, caster: ActorId, target: ActorId, mut buff: Buff) {
        if !self.actors[target.0].is_alive() {
            return;
        }
        buff.self_buff = caster == target;
        let name = buff.name.clone();
        let duration = buff.duration;
        let refreshed = self.actors[target.0].buffs.add(buff)
            == crate::buff::BuffApplied::Refreshed;
        let target_name = self.actors[target.0].name.clone();
        self.push_event(BattleEvent::BuffApplied {
            target,
            target_name,
            buff: name,
            duration,
            refreshed,
        });
    }

    /// Immediately add action progress, clamped to a full turn
    pub fn boost_progress(&mut self, id: ActorId, amount: f64) {
        let boosted = (self.progress[id.0] + amount).min(1.0);
        self.progress[id.0] = boosted;
        self.push_event(BattleEvent::ProgressBoosted {
            target: id,
            amount,
            progress: boosted,
            timing: BoostTiming::Immediate,
        });
    }

    /// Boost carried into the target's next turn; behaves like an
    /// immediate boost against whatever progress the target holds now
    pub fn boost_next_turn(&mut self, id: ActorId, amount: f64) {
        let boosted = (self.progress[id.0] + amount).min(1.0);
        self.progress[id.0] = boosted;
        self.push_event(BattleEvent::ProgressBoosted {
            target: id,
            amount,
            progress: boosted,
            timing: BoostTiming::NextTurn,
        });
    }

    /// Accumulate a boost applied after the next scheduler advance
    pub fn queue_delayed_boost(&mut self, id: ActorId, amount: f64) {
        *self.pending_boosts.entry(id).or_insert(0.0) += amount;
        self.push_event(BattleEvent::ProgressBoosted {
            target: id,
            amount,
            progress: self.progress[id.0],
            timing: BoostTiming::Delayed,
        });
    }

    pub(crate) fn push_event(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    /// Run the battle to a terminal state: one side victorious, or the
    /// max-round cutoff (a draw)
    pub fn run(&mut self, max_rounds: u32) -> BattleOutcome {
        if !self.started {
            self.start();
        }
        let mut round = 1;
        while !self.is_over && round <= max_rounds {
            self.round = round;
            let mut pool = if round == 1 {
                self.constants.scheduler.first_round_pool
            } else {
                self.constants.scheduler.round_pool
            };
            self.push_event(BattleEvent::RoundStarted { round, pool });

            self.check_and_cast_instant_ultimates();
            if self.is_over {
                break;
            }

            while pool > 0.0 {
                self.run_ready_actors();
                if self.is_over {
                    break;
                }

                let advance = self.compute_advance(pool);
                let scale = self.constants.scheduler.speed_scale;
                for id in self.living() {
                    let spd = self.current_stats(id, false).get(Stat::Spd);
                    if spd > 0.0 {
                        self.progress[id.0] += advance * spd / scale;
                    }
                }
                pool -= advance;

                let pending: Vec<(ActorId, f64)> =
                    std::mem::take(&mut self.pending_boosts).into_iter().collect();
                for (id, amount) in pending {
                    self.boost_progress(id, amount);
                }

                if pool <= 0.0 && self.ready_ids().is_empty() {
                    break;
                }
            }
            round += 1;
        }

        if !self.is_over {
            self.push_event(BattleEvent::BattleEnded {
                winner: None,
                rounds: self.round,
            });
        }
        BattleOutcome {
            winner: self.winner,
            rounds: self.round,
        }
    }

    /// Fire battle-start hooks on light cones and relic sets
    fn start(&mut self) {
        self.started = true;
        for index in 0..self.actors.len() {
            let id = ActorId(index);
            if !self.actors[index].is_alive() {
                continue;
            }
            if let Some(mut skill) = self.take_light_cone_skill(id) {
                skill.on_battle_start(self, id);
                self.restore_light_cone_skill(id, skill);
            }
            let sets = self.actors[index].set_skills.clone();
            for (set, pieces) in sets {
                set.on_battle_start(self, id, pieces);
            }
        }
    }

    /// Let every ready actor act, re-collecting between waves; actors
    /// act in descending current-SPD order, ties in participant order
    fn run_ready_actors(&mut self) {
        loop {
            let ready = self.ready_ids();
            if ready.is_empty() {
                return;
            }
            for id in ready {
                if self.is_over {
                    return;
                }
                if !self.actors[id.0].is_alive() || self.progress[id.0] < 1.0 - READY_EPS {
                    continue;
                }
                self.take_turn(id, false);
                self.progress[id.0] -= 1.0;
                self.check_battle_end();
                if self.is_over {
                    return;
                }

                if let Some(boost) = self.pending_boosts.remove(&id) {
                    if boost > 0.0 {
                        self.boost_progress(id, boost);
                    }
                }
                self.check_and_cast_instant_ultimates();
                if self.is_over {
                    return;
                }

                if self.actors[id.0].has_extra_turn {
                    self.take_turn(id, true);
                    self.actors[id.0].has_extra_turn = false;
                    self.check_battle_end();
                    if self.is_over {
                        return;
                    }
                }
            }
        }
    }

    fn ready_ids(&self) -> Vec<ActorId> {
        let mut ready: Vec<(ActorId, f64)> = self
            .actors
            .iter()
            .filter(|a| a.is_alive() && self.progress[a.id.0] >= 1.0 - READY_EPS)
            .map(|a| (a.id, self.current_stats(a.id, false).get(Stat::Spd)))
            .collect();
        ready.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        ready.into_iter().map(|(id, _)| id).collect()
    }

    /// Action value needed for the nearest actor to fill its progress,
    /// capped at the remaining pool
    fn compute_advance(&self, pool: f64) -> f64 {
        let scale = self.constants.scheduler.speed_scale;
        let mut min_need: Option<f64> = None;
        for id in self.living() {
            let spd = self.current_stats(id, false).get(Stat::Spd);
            if spd <= 0.0 {
                continue;
            }
            let need = (1.0 - self.progress[id.0]) * scale / spd;
            if need > 0.0 && min_need.map_or(true, |m| need < m) {
                min_need = Some(need);
            }
        }
        match min_need {
            Some(need) if need > 0.0 && need <= pool => need,
            _ => pool,
        }
    }

    /// One full turn for an actor: turn-start upkeep, skill selection
    /// with the skill-point fallback, targeting, effect execution,
    /// post-resolution grants, and the end-of-turn buff tick
    fn take_turn(&mut self, id: ActorId, is_extra: bool) {
        let name = self.actors[id.0].name.clone();
        self.push_event(BattleEvent::TurnStarted {
            actor: id,
            name: name.clone(),
            extra_turn: is_extra,
        });

        if self.actors[id.0].toughness_broken {
            let max = self.actors[id.0].max_toughness;
            self.actors[id.0].toughness = Some(max);
            self.actors[id.0].toughness_broken = false;
            self.push_event(BattleEvent::ToughnessReset {
                target: id,
                toughness: max,
            });
        }

        self.process_turn_start_buffs(id);
        self.fire_turn_start_hooks(id);

        let ai = self.actors[id.0].ai;
        let Some(mut skill_id) = ai.choose_skill(self, id) else {
            self.push_event(BattleEvent::TurnForfeited {
                actor: id,
                name,
                reason: "no usable skill".to_string(),
            });
            self.end_turn(id);
            return;
        };
        let mut skill_type = self
            .registry
            .data(&skill_id)
            .map(|d| d.skill_type)
            .unwrap_or(SkillType::Normal);
        let side = self.actors[id.0].side;

        // Deterministic fallback when the side cannot pay for a battle skill.
        if skill_type == SkillType::BPSkill && self.skill_points(side) == 0 {
            self.push_event(BattleEvent::SkillFallback {
                actor: id,
                name: name.clone(),
            });
            match self
                .registry
                .skill_of_type(&self.actors[id.0].skills, SkillType::Normal)
            {
                Some(data) => {
                    skill_id = data.id.clone();
                    skill_type = SkillType::Normal;
                }
                None => {
                    self.push_event(BattleEvent::TurnForfeited {
                        actor: id,
                        name,
                        reason: "no basic attack to fall back to".to_string(),
                    });
                    self.end_turn(id);
                    return;
                }
            }
        }

        let routine = match self.registry.routine(&skill_id) {
            Some(routine) => routine,
            None => {
                self.push_event(BattleEvent::Warning {
                    message: format!("skill `{}` has no implementation; treating as no-op", skill_id),
                });
                SkillRoutine::Noop
            }
        };

        let targets = self.select_targets(id, routine);
        if targets.is_empty() {
            self.push_event(BattleEvent::TurnForfeited {
                actor: id,
                name,
                reason: "no valid target".to_string(),
            });
            self.end_turn(id);
            return;
        }

        self.actors[id.0].current_target = Some(targets[0]);
        self.actors[id.0].last_skill_type = Some(skill_type);

        if skill_type == SkillType::BPSkill {
            self.use_skill_point(side);
        }

        let data = self.registry.data(&skill_id).cloned();
        let skill_name = data.as_ref().map(|d| d.name.clone()).unwrap_or_default();
        self.push_event(BattleEvent::SkillUsed {
            actor: id,
            name,
            skill_id: skill_id.clone(),
            skill_name,
            skill_type,
            preempted: false,
        });
        self.fire_skill_used_hooks(id, skill_type);

        let effects = match data {
            Some(data) => match routine.emit(&*self, id, &targets, 1, &data) {
                Ok(effects) => effects,
                Err(err) => {
                    self.push_event(BattleEvent::Warning {
                        message: format!("skill `{}` could not resolve: {}", skill_id, err),
                    });
                    Vec::new()
                }
            },
            None => {
                self.push_event(BattleEvent::Warning {
                    message: format!("unknown skill id `{}`", skill_id),
                });
                Vec::new()
            }
        };
        self.execute_effects(id, effects);

        if skill_type == SkillType::Normal {
            self.gain_skill_point(side);
        }
        self.grant_skill_energy(id, skill_type);

        self.end_turn(id);
    }

    /// End-of-turn: tick buff durations and clear the turn context.
    /// Runs even on forfeited turns.
    fn end_turn(&mut self, id: ActorId) {
        let in_extra = self.actors[id.0].has_extra_turn;
        let retains = self.actors[id.0].retains_buffs_in_extra_turn;
        let expired = self.actors[id.0].buffs.tick_end_of_turn(in_extra, retains);
        for buff in expired {
            self.push_event(BattleEvent::BuffExpired { target: id, buff });
        }
        self.actors[id.0].current_target = None;
        self.actors[id.0].last_skill_type = None;
    }

    /// Heal-over-time buffs fire at their owner's turn start
    fn process_turn_start_buffs(&mut self, id: ActorId) {
        let heals: Vec<crate::buff::TurnStartHeal> = self.actors[id.0]
            .buffs
            .iter()
            .filter_map(|b| b.turn_start_heal)
            .collect();
        for hot in heals {
            let base = hot.max_hp_ratio * self.max_hp(id) + hot.flat;
            let amount = heal::calculate_final_heal(self, id, id, base, SkillType::HealOverTime);
            self.apply_heal(id, id, amount);
        }
    }

    fn select_targets(&mut self, user: ActorId, routine: SkillRoutine) -> Vec<ActorId> {
        let side = self.actors[user.0].side;
        match routine.target_rule() {
            TargetRule::RandomEnemy => {
                let enemies = self.living_on_side(side.opponent());
                if enemies.is_empty() {
                    Vec::new()
                } else {
                    let pick = self.rng.gen_range(0..enemies.len());
                    vec![enemies[pick]]
                }
            }
            TargetRule::LowestHpRatioAlly => {
                let injured: Vec<ActorId> = self
                    .living_on_side(side)
                    .into_iter()
                    .filter(|&id| self.actors[id.0].hp < self.max_hp(id) - 1e-9)
                    .collect();
                match injured.into_iter().min_by(|&a, &b| {
                    self.hp_ratio(a)
                        .partial_cmp(&self.hp_ratio(b))
                        .unwrap_or(Ordering::Equal)
                }) {
                    Some(lowest) => vec![lowest],
                    None => vec![user],
                }
            }
            TargetRule::HighestAtkOtherAlly => {
                let others: Vec<ActorId> = self
                    .living_on_side(side)
                    .into_iter()
                    .filter(|&id| id != user)
                    .collect();
                match others.into_iter().max_by(|&a, &b| {
                    self.current_stats(a, false)
                        .get(Stat::Atk)
                        .partial_cmp(&self.current_stats(b, false).get(Stat::Atk))
                        .unwrap_or(Ordering::Equal)
                }) {
                    Some(strongest) => vec![strongest],
                    None => vec![user],
                }
            }
            TargetRule::AllAllies => self.living_on_side(side),
            TargetRule::SelfOnly => vec![user],
        }
    }

    /// Execute a skill's effects in emission order
    pub(crate) fn execute_effects(&mut self, user: ActorId, effects: Vec<Effect>) {
        for effect in effects {
            if self.is_over {
                break;
            }
            match effect {
                Effect::Damage {
                    targets,
                    multiplier,
                    element,
                    skill_type,
                } => {
                    for target in targets {
                        if self.actors[target.0].is_alive() {
                            self.deal_damage(user, target, multiplier, element, skill_type);
                        }
                    }
                }
                Effect::Buff { targets, buff } => {
                    for target in targets {
                        self.apply_buff(user, target, buff.clone());
                    }
                }
                Effect::Heal {
                    targets,
                    base_amount,
                } => {
                    let skill_type = self.actors[user.0]
                        .last_skill_type
                        .unwrap_or(SkillType::Normal);
                    for target in targets {
                        if self.actors[target.0].is_alive() {
                            let amount = heal::calculate_final_heal(
                                self,
                                user,
                                target,
                                base_amount,
                                skill_type,
                            );
                            self.apply_heal(user, target, amount);
                        }
                    }
                }
                Effect::ProgressBoost {
                    target,
                    amount,
                    timing,
                } => match timing {
                    BoostTiming::Immediate => self.boost_progress(target, amount),
                    BoostTiming::NextTurn => self.boost_next_turn(target, amount),
                    BoostTiming::Delayed => self.queue_delayed_boost(target, amount),
                },
                Effect::ExtraTurn { target } => {
                    self.actors[target.0].has_extra_turn = true;
                    let name = self.actors[target.0].name.clone();
                    self.push_event(BattleEvent::ExtraTurnGranted {
                        actor: target,
                        name,
                    });
                }
            }
        }
    }

    /// One damage instance: attacker side, defense side, application,
    /// hooks, toughness, and kill credit
    fn deal_damage(
        &mut self,
        attacker: ActorId,
        target: ActorId,
        multiplier: f64,
        element: Option<Element>,
        skill_type: SkillType,
    ) {
        let crit_roll: f64 = self.rng.gen();
        let crit_rate = self.current_stats(attacker, false).get(Stat::CritRate);
        let is_crit = crit_roll < crit_rate;
        let packet =
            damage::compute_packet(self, attacker, multiplier, element, skill_type, is_crit);
        let final_damage =
            damage::defense_side(self, &packet, attacker, target, &DefenseModifiers::default());
        self.apply_damage(attacker, target, final_damage, element, skill_type, is_crit);
    }

    fn apply_damage(
        &mut self,
        attacker: ActorId,
        target: ActorId,
        amount: f64,
        element: Option<Element>,
        skill_type: SkillType,
        crit: bool,
    ) {
        let was_alive = self.actors[target.0].is_alive();
        let remaining = (self.actors[target.0].hp - amount).max(0.0);
        self.actors[target.0].hp = remaining;
        let target_name = self.actors[target.0].name.clone();
        self.push_event(BattleEvent::DamageDealt {
            attacker,
            target,
            target_name: target_name.clone(),
            amount,
            element,
            skill_type,
            crit,
            target_hp: remaining,
        });

        if self.actors[target.0].is_alive() {
            if let Some(mut skill) = self.take_light_cone_skill(target) {
                skill.on_damage_received(self, target, amount);
                self.restore_light_cone_skill(target, skill);
            }
            let on_hit = self.constants.energy.on_damage_received;
            self.grant_energy(target, on_hit, "damage taken");
        } else if was_alive {
            self.push_event(BattleEvent::ActorDefeated {
                actor: target,
                name: target_name,
            });
        }

        self.fire_damage_dealt_hooks(attacker, amount, skill_type);

        if let Some(el) = element {
            self.reduce_toughness(attacker, target, el, skill_type);
        }

        if was_alive && !self.actors[target.0].is_alive() {
            self.on_enemy_killed(attacker);
        }
        self.check_battle_end();
    }

    /// Weakness-gated toughness damage; crossing zero triggers a break
    /// damage instance
    fn reduce_toughness(
        &mut self,
        attacker: ActorId,
        target: ActorId,
        element: Element,
        skill_type: SkillType,
    ) {
        let Some(current) = self.actors[target.0].toughness else {
            return;
        };
        if !self.actors[target.0].weaknesses.contains(&element) {
            return;
        }
        let amount = self.constants.toughness.damage_for(skill_type);
        if amount <= 0.0 || current <= 0.0 {
            return;
        }
        let after = (current - amount).max(0.0);
        self.actors[target.0].toughness = Some(after);
        self.push_event(BattleEvent::ToughnessReduced {
            target,
            amount: current - after,
            toughness: after,
        });

        if after == 0.0 && !self.actors[target.0].toughness_broken {
            self.actors[target.0].toughness_broken = true;
            let target_name = self.actors[target.0].name.clone();
            self.push_event(BattleEvent::ToughnessBroken {
                target,
                target_name,
                element,
            });
            let break_damage = damage::resolve_break(self, attacker, target, element);
            self.apply_damage(
                attacker,
                target,
                break_damage,
                Some(element),
                SkillType::Break,
                false,
            );
        }
    }

    /// Kill credit: energy, the guarded on-kill talent, then equipment
    /// hooks
    fn on_enemy_killed(&mut self, attacker: ActorId) {
        let on_kill = self.constants.energy.on_kill;
        self.grant_energy(attacker, on_kill, "enemy killed");

        let unit = &self.actors[attacker.0];
        let talent_id = unit.kill_talent.clone();
        let triggered_by_own_action = matches!(
            unit.last_skill_type,
            Some(SkillType::Normal) | Some(SkillType::BPSkill) | Some(SkillType::Ultra)
        );
        let guard_ok = !unit.has_extra_turn && triggered_by_own_action;
        if let (Some(talent_id), true) = (talent_id, guard_ok) {
            if let (Some(routine), Some(data)) = (
                self.registry.routine(&talent_id),
                self.registry.data(&talent_id).cloned(),
            ) {
                let name = self.actors[attacker.0].name.clone();
                self.push_event(BattleEvent::SkillUsed {
                    actor: attacker,
                    name,
                    skill_id: talent_id.clone(),
                    skill_name: data.name.clone(),
                    skill_type: SkillType::Talent,
                    preempted: false,
                });
                let targets = vec![attacker];
                match routine.emit(&*self, attacker, &targets, 1, &data) {
                    Ok(effects) => self.execute_effects(attacker, effects),
                    Err(err) => self.push_event(BattleEvent::Warning {
                        message: format!("talent `{}` could not resolve: {}", talent_id, err),
                    }),
                }
            }
        }

        if let Some(mut skill) = self.take_light_cone_skill(attacker) {
            skill.on_enemy_killed(self, attacker);
            self.restore_light_cone_skill(attacker, skill);
        }
        let sets = self.actors[attacker.0].set_skills.clone();
        for (set, pieces) in sets {
            set.on_enemy_killed(self, attacker, pieces);
        }
    }

    /// Between any two actions: full-energy actors whose AI consents
    /// cast their ultimate immediately, in participant order
    fn check_and_cast_instant_ultimates(&mut self) {
        for index in 0..self.actors.len() {
            if self.is_over {
                break;
            }
            let id = ActorId(index);
            {
                let unit = &self.actors[index];
                if !unit.can_instant_ultimate || !unit.is_alive() || unit.has_extra_turn {
                    continue;
                }
            }
            let ai = self.actors[index].ai;
            if !ai.should_cast_ultimate(self, id) {
                continue;
            }
            let Some(ult) = self
                .registry
                .skill_of_type(&self.actors[index].skills, SkillType::Ultra)
                .cloned()
            else {
                continue;
            };
            let routine = match self.registry.routine(&ult.id) {
                Some(routine) => routine,
                None => {
                    self.push_event(BattleEvent::Warning {
                        message: format!(
                            "ultimate `{}` has no implementation; treating as no-op",
                            ult.id
                        ),
                    });
                    SkillRoutine::Noop
                }
            };
            let targets = self.select_targets(id, routine);
            if targets.is_empty() {
                continue;
            }

            self.actors[index].current_target = Some(targets[0]);
            self.actors[index].last_skill_type = Some(SkillType::Ultra);
            let max_energy = self.actors[index].max_energy;
            self.consume_energy(id, max_energy);

            let name = self.actors[index].name.clone();
            self.push_event(BattleEvent::SkillUsed {
                actor: id,
                name,
                skill_id: ult.id.clone(),
                skill_name: ult.name.clone(),
                skill_type: SkillType::Ultra,
                preempted: true,
            });
            self.fire_skill_used_hooks(id, SkillType::Ultra);

            let max_level = ult.max_level();
            match routine.emit(&*self, id, &targets, max_level, &ult) {
                Ok(effects) => self.execute_effects(id, effects),
                Err(err) => self.push_event(BattleEvent::Warning {
                    message: format!("ultimate `{}` could not resolve: {}", ult.id, err),
                }),
            }
            self.grant_skill_energy(id, SkillType::Ultra);
            self.actors[index].can_instant_ultimate = false;
            self.actors[index].current_target = None;
            self.check_battle_end();
        }
    }

    fn apply_heal(&mut self, healer: ActorId, target: ActorId, amount: f64) {
        let max = self.max_hp(target);
        let unit = &mut self.actors[target.0];
        let healed = (unit.hp + amount).min(max) - unit.hp;
        unit.hp += healed;
        let target_hp = unit.hp;
        let target_name = unit.name.clone();
        self.push_event(BattleEvent::Healed {
            healer,
            target,
            target_name,
            amount: healed,
            target_hp,
        });
    }

    /// Grant energy through the regeneration-rate multiplier
    pub(crate) fn grant_energy(&mut self, id: ActorId, base: f64, source: &str) {
        if base <= 0.0 || !self.actors[id.0].is_alive() {
            return;
        }
        let regen = self.current_stats(id, false).get(Stat::EnergyRegenRate);
        let gained = self.actors[id.0].gain_energy(base, regen);
        if gained > 0.0 {
            let energy = self.actors[id.0].energy;
            self.push_event(BattleEvent::EnergyGained {
                actor: id,
                amount: gained,
                energy,
                source: source.to_string(),
            });
        }
    }

    fn grant_skill_energy(&mut self, id: ActorId, skill_type: SkillType) {
        let base = self.constants.energy.base_gain(skill_type);
        self.grant_energy(id, base, &skill_type.to_string());
    }

    fn consume_energy(&mut self, id: ActorId, amount: f64) {
        if self.actors[id.0].consume_energy(amount) {
            let energy = self.actors[id.0].energy;
            self.push_event(BattleEvent::EnergyConsumed {
                actor: id,
                amount,
                energy,
            });
        }
    }

    fn check_battle_end(&mut self) {
        if self.is_over {
            return;
        }
        let mut sides: Vec<Side> = Vec::new();
        for actor in self.actors.iter().filter(|a| a.is_alive()) {
            if !sides.contains(&actor.side) {
                sides.push(actor.side);
            }
        }
        if sides.len() <= 1 {
            self.is_over = true;
            self.winner = sides.first().copied();
            self.push_event(BattleEvent::BattleEnded {
                winner: self.winner,
                rounds: self.round.max(1),
            });
        }
    }

    fn fire_turn_start_hooks(&mut self, id: ActorId) {
        if let Some(mut skill) = self.take_light_cone_skill(id) {
            skill.on_turn_start(self, id);
            self.restore_light_cone_skill(id, skill);
        }
        let sets = self.actors[id.0].set_skills.clone();
        for (set, pieces) in sets {
            set.on_turn_start(self, id, pieces);
        }
    }

    fn fire_skill_used_hooks(&mut self, id: ActorId, skill_type: SkillType) {
        if let Some(mut skill) = self.take_light_cone_skill(id) {
            skill.on_skill_used(self, id, skill_type);
            self.restore_light_cone_skill(id, skill);
        }
        let sets = self.actors[id.0].set_skills.clone();
        for (set, pieces) in sets {
            set.on_skill_used(self, id, skill_type, pieces);
        }
    }

    fn fire_damage_dealt_hooks(&mut self, id: ActorId, amount: f64, skill_type: SkillType) {
        if let Some(mut skill) = self.take_light_cone_skill(id) {
            skill.on_damage_dealt(self, id, amount, skill_type);
            self.restore_light_cone_skill(id, skill);
        }
        let sets = self.actors[id.0].set_skills.clone();
        for (set, pieces) in sets {
            set.on_damage_dealt(self, id, amount, skill_type, pieces);
        }
    }

    /// Hook state is taken off the actor while it runs against the
    /// battle, then restored
    fn take_light_cone_skill(&mut self, id: ActorId) -> Option<LightConeSkill> {
        self.actors[id.0]
            .light_cone
            .as_mut()
            .and_then(|lc| lc.skill.take())
    }

    fn restore_light_cone_skill(&mut self, id: ActorId, skill: LightConeSkill) {
        if let Some(lc) = self.actors[id.0].light_cone.as_mut() {
            lc.skill = Some(skill);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SkillData;
    use std::collections::HashMap;

    fn stats(hp: f64, atk: f64, spd: f64) -> StatTable {
        [
            (Stat::Hp, hp),
            (Stat::Atk, atk),
            (Stat::Def, 0.0),
            (Stat::Spd, spd),
        ]
        .into_iter()
        .collect()
    }

    fn skill_data(id: &str, name: &str, skill_type: SkillType, params: Vec<Vec<f64>>) -> SkillData {
        SkillData {
            id: id.to_string(),
            name: name.to_string(),
            skill_type,
            description: String::new(),
            params,
        }
    }

    fn basic_registry() -> SkillRegistry {
        let skills: HashMap<String, SkillData> = [
            (
                "9001".to_string(),
                skill_data("9001", "Strike", SkillType::Normal, vec![vec![1.0]]),
            ),
            (
                "9002".to_string(),
                skill_data("9002", "Guarded Strike", SkillType::BPSkill, vec![vec![1.5]]),
            ),
        ]
        .into_iter()
        .collect();
        SkillRegistry::new(skills)
            .with_routine("9001", SkillRoutine::EnemyBasic(Element::Physical))
            .with_routine("9002", SkillRoutine::EnemyBasic(Element::Physical))
    }

    fn fighter(unit_id: &str, name: &str, side: Side, spd: f64) -> Actor {
        Actor::new(unit_id, name, side, stats(5000.0, 500.0, spd))
            .with_skills(vec!["9001".to_string()])
    }

    #[test]
    fn test_empty_battle_is_an_error() {
        assert!(matches!(
            Battle::new(Vec::new(), basic_registry(), 7),
            Err(BattleError::NoParticipants)
        ));
    }

    #[test]
    fn test_non_positive_max_hp_is_fatal() {
        let broken = Actor::new("x", "Husk", Side::Player, stats(0.0, 100.0, 100.0));
        assert!(matches!(
            Battle::new(vec![broken], basic_registry(), 7),
            Err(BattleError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn test_hp_fills_to_computed_max() {
        let battle = Battle::new(
            vec![fighter("a", "A", Side::Player, 100.0)],
            basic_registry(),
            7,
        )
        .unwrap();
        assert!((battle.actor(ActorId(0)).hp - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn test_progress_conservation_on_advance() {
        let mut battle = Battle::new(
            vec![
                fighter("a", "A", Side::Player, 134.0),
                fighter("b", "B", Side::Enemy, 97.0),
            ],
            basic_registry(),
            7,
        )
        .unwrap();
        let advance = 50.0;
        for id in battle.living() {
            let spd = battle.current_stats(id, false).get(Stat::Spd);
            battle.progress[id.0] += advance * spd / 10000.0;
        }
        assert!((battle.progress(ActorId(0)) - 50.0 * 134.0 / 10000.0).abs() < 1e-9);
        assert!((battle.progress(ActorId(1)) - 50.0 * 97.0 / 10000.0).abs() < 1e-9);
    }

    #[test]
    fn test_ready_order_is_descending_spd() {
        let mut battle = Battle::new(
            vec![
                fighter("slow", "Slow", Side::Player, 90.0),
                fighter("fast", "Fast", Side::Player, 160.0),
                fighter("mid", "Mid", Side::Enemy, 120.0),
            ],
            basic_registry(),
            7,
        )
        .unwrap();
        for id in [ActorId(0), ActorId(1), ActorId(2)] {
            battle.progress[id.0] = 1.0;
        }
        assert_eq!(
            battle.ready_ids(),
            vec![ActorId(1), ActorId(2), ActorId(0)]
        );
    }

    #[test]
    fn test_ready_tie_breaks_in_participant_order() {
        let mut battle = Battle::new(
            vec![
                fighter("a", "A", Side::Player, 120.0),
                fighter("b", "B", Side::Enemy, 120.0),
            ],
            basic_registry(),
            7,
        )
        .unwrap();
        battle.progress[0] = 1.0;
        battle.progress[1] = 1.0;
        assert_eq!(battle.ready_ids(), vec![ActorId(0), ActorId(1)]);
    }

    #[test]
    fn test_compute_advance_caps_at_pool() {
        let battle = Battle::new(
            vec![fighter("a", "A", Side::Player, 100.0)],
            basic_registry(),
            7,
        )
        .unwrap();
        // Full bar costs 100 action value at SPD 100; pool of 40 caps it.
        assert!((battle.compute_advance(40.0) - 40.0).abs() < 1e-9);
        assert!((battle.compute_advance(150.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_boost_progress_clamps_at_one() {
        let mut battle = Battle::new(
            vec![fighter("a", "A", Side::Player, 100.0)],
            basic_registry(),
            7,
        )
        .unwrap();
        battle.boost_progress(ActorId(0), 0.7);
        battle.boost_progress(ActorId(0), 0.7);
        assert!((battle.progress(ActorId(0)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_delayed_boost_applies_after_advance() {
        let mut battle = Battle::new(
            vec![
                fighter("a", "A", Side::Player, 100.0),
                fighter("b", "B", Side::Enemy, 100.0),
            ],
            basic_registry(),
            7,
        )
        .unwrap();
        battle.queue_delayed_boost(ActorId(0), 0.3);
        assert!((battle.progress(ActorId(0)) - 0.0).abs() < 1e-9);
        battle.run(1);
        // The pending boost drained into real progress during the round.
        assert!(battle
            .events()
            .iter()
            .any(|e| matches!(e, BattleEvent::ProgressBoosted { timing: BoostTiming::Immediate, .. })));
    }

    #[test]
    fn test_skill_point_pool_caps() {
        let mut battle = Battle::new(
            vec![
                fighter("a", "A", Side::Player, 100.0),
                fighter("b", "B", Side::Enemy, 100.0),
            ],
            basic_registry(),
            7,
        )
        .unwrap();
        assert_eq!(battle.skill_points(Side::Player), 3);
        for _ in 0..10 {
            battle.gain_skill_point(Side::Player);
        }
        assert_eq!(battle.skill_points(Side::Player), 5);
        assert!(battle.use_skill_point(Side::Player));
        assert_eq!(battle.skill_points(Side::Player), 4);
    }

    #[test]
    fn test_battle_reaches_terminal_state() {
        let mut battle = Battle::new(
            vec![
                fighter("a", "Hero", Side::Player, 130.0),
                Actor::new("w", "Weakling", Side::Enemy, stats(50.0, 10.0, 80.0))
                    .with_skills(vec!["9001".to_string()]),
            ],
            basic_registry(),
            7,
        )
        .unwrap();
        let outcome = battle.run(10);
        assert_eq!(outcome.winner, Some(Side::Player));
        assert!(battle.is_over());
        assert!(battle
            .events()
            .iter()
            .any(|e| matches!(e, BattleEvent::BattleEnded { winner: Some(Side::Player), .. })));
    }

    #[test]
    fn test_draw_at_round_cutoff() {
        let mut battle = Battle::new(
            vec![
                Actor::new("t1", "Tank A", Side::Player, stats(1e9, 1.0, 100.0))
                    .with_skills(vec!["9001".to_string()]),
                Actor::new("t2", "Tank B", Side::Enemy, stats(1e9, 1.0, 100.0))
                    .with_skills(vec!["9001".to_string()]),
            ],
            basic_registry(),
            7,
        )
        .unwrap();
        let outcome = battle.run(3);
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.rounds, 3);
    }

    #[test]
    fn test_unknown_skill_warns_and_continues() {
        let mut battle = Battle::new(
            vec![
                Actor::new("m", "Mystery", Side::Player, stats(1000.0, 100.0, 120.0))
                    .with_skills(vec!["424242".to_string()]),
                fighter("b", "B", Side::Enemy, 100.0),
            ],
            {
                let skills: HashMap<String, SkillData> = [(
                    "424242".to_string(),
                    skill_data("424242", "Unimplemented", SkillType::Normal, vec![vec![1.0]]),
                )]
                .into_iter()
                .collect();
                SkillRegistry::new(skills)
            },
            7,
        )
        .unwrap();
        let outcome = battle.run(2);
        assert_eq!(outcome.winner, None);
        assert!(battle
            .events()
            .iter()
            .any(|e| matches!(e, BattleEvent::Warning { .. })));
    }
}
