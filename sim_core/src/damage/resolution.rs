//! Defense-side damage resolution: defense curve, elemental resistance,
//! independent reductions, and break damage

use crate::battle::Battle;
use crate::damage::calculation::compute_packet;
use crate::damage::DamagePacket;
use crate::stat::Stat;
use crate::types::{ActorId, Element, SkillType};
use serde::Serialize;

/// Defense debuffs applied for one resolution; all default to zero
#[derive(Debug, Clone, Copy, Default)]
pub struct DefenseModifiers {
    /// Percentage reduction of the target's DEF
    pub reduce_def_pct: f64,
    /// Flat change to the target's DEF after the percentage reduction
    pub flat_reduce_def: f64,
}

/// Resolve a packet against a target, producing final damage.
///
/// Break damage bypasses the attacker's DEF Ignore and the toughness
/// damage reduction, per its skill type.
pub fn defense_side(
    battle: &Battle,
    packet: &DamagePacket,
    attacker: ActorId,
    target: ActorId,
    mods: &DefenseModifiers,
) -> f64 {
    let constants = &battle.constants().damage;
    let attacker_stats = battle.current_stats(attacker, false);
    let target_stats = battle.current_stats(target, false);
    let target_actor = battle.actor(target);

    // Defense curve.
    let mut def_eff = target_stats.get(Stat::Def) * (1.0 - mods.reduce_def_pct)
        + mods.flat_reduce_def;
    if packet.skill_type != SkillType::Break {
        def_eff *= 1.0 - attacker_stats.get(Stat::DefIgnore);
    }
    def_eff = def_eff.max(0.0);
    let level = battle.actor(attacker).level as f64;
    let reduction = def_eff / (def_eff + level * constants.def_level_factor + constants.def_base);
    let after_def = packet.theoretical * (1.0 - reduction);

    // Elemental resistance, floored.
    let resistance_multiplier = match packet.element {
        Some(el) => {
            let resistance = target_actor.resistances.get(&el).copied().unwrap_or(0.0);
            (1.0 - (resistance - packet.penetration)).max(constants.min_resistance_multiplier)
        }
        None => 1.0,
    };
    let after_res = after_def * resistance_multiplier;

    // Independent reductions, then incoming-damage amplifiers.
    let mut modifier = 1.0;
    for buff in target_actor.buffs.iter() {
        modifier *= 1.0 - buff.independent_damage_reduction;
    }
    if target_actor.toughness.map_or(false, |t| t > 0.0) && packet.skill_type != SkillType::Break {
        modifier *= constants.toughness_damage_multiplier;
    }
    for buff in target_actor.buffs.iter() {
        modifier *= 1.0 + buff.damage_taken_increase;
    }

    (after_res * modifier).max(constants.min_final_damage)
}

/// Resolve a toughness-break damage instance.
///
/// Only the defense side runs: no attacker amplification, no crit, no
/// penetration, and DEF Ignore does not apply.
pub fn resolve_break(battle: &Battle, attacker: ActorId, target: ActorId, element: Element) -> f64 {
    let break_effect = battle
        .current_stats(attacker, false)
        .get(Stat::BreakEffect);
    let max_toughness = battle.actor(target).max_toughness;
    let base = battle
        .constants()
        .break_damage
        .base_damage(element, max_toughness, break_effect);

    let packet = DamagePacket {
        base_damage: base,
        damage_bonus: 0.0,
        penetration: 0.0,
        is_crit: false,
        crit_multiplier: 1.0,
        theoretical: base,
        element: Some(element),
        skill_type: SkillType::Break,
    };
    defense_side(battle, &packet, attacker, target, &DefenseModifiers::default())
}

/// Expected-damage preview without mutating anything
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DamagePreview {
    pub non_crit: f64,
    pub crit: f64,
    pub expected: f64,
    pub crit_rate: f64,
}

/// Preview the damage of a hit using forced and suppressed crit rolls
pub fn preview(
    battle: &Battle,
    attacker: ActorId,
    target: ActorId,
    multiplier: f64,
    element: Option<Element>,
    skill_type: SkillType,
) -> DamagePreview {
    let mods = DefenseModifiers::default();
    let non_crit_packet = compute_packet(battle, attacker, multiplier, element, skill_type, false);
    let crit_packet = compute_packet(battle, attacker, multiplier, element, skill_type, true);
    let non_crit = defense_side(battle, &non_crit_packet, attacker, target, &mods);
    let crit = defense_side(battle, &crit_packet, attacker, target, &mods);
    let crit_rate = battle
        .current_stats(attacker, false)
        .get(Stat::CritRate)
        .clamp(0.0, 1.0);

    DamagePreview {
        non_crit,
        crit,
        expected: non_crit * (1.0 - crit_rate) + crit * crit_rate,
        crit_rate,
    }
}
