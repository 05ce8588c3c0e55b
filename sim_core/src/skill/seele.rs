//! Seele's skill set (Quantum, The Hunt).
//!
//! The talent's enhanced-state buff is built by a factory so the
//! ultimate can reuse it with its own duration.

use crate::battle::Battle;
use crate::buff::Buff;
use crate::catalog::{CatalogError, SkillData};
use crate::effect::{BoostTiming, Effect};
use crate::types::{ActorId, Element, SkillType};

const TALENT_ID: &str = "110204";
const RESURGENCE_PENETRATION: f64 = 0.20;

/// Basic attack: single-target Quantum damage, then a delayed 20%
/// progress boost for the next action
pub(crate) fn basic(
    user: ActorId,
    targets: &[ActorId],
    level: usize,
    data: &SkillData,
) -> Result<Vec<Effect>, CatalogError> {
    let params = data.params_at_least(level, 1)?;
    Ok(vec![
        Effect::Damage {
            targets: targets.to_vec(),
            multiplier: params[0],
            element: Some(Element::Quantum),
            skill_type: SkillType::Normal,
        },
        Effect::ProgressBoost {
            target: user,
            amount: 0.20,
            timing: BoostTiming::Delayed,
        },
    ])
}

/// Battle skill: self SPD% buff applied before the Quantum hit
pub(crate) fn skill(
    user: ActorId,
    targets: &[ActorId],
    level: usize,
    data: &SkillData,
) -> Result<Vec<Effect>, CatalogError> {
    let params = data.params_at_least(level, 3)?;
    let spd_buff = Buff::new("Sheathed Blade SPD Boost", params[2] as i32)
        .with_stat(crate::stat::Stat::SpdPct, params[1]);
    Ok(vec![
        Effect::Buff {
            targets: vec![user],
            buff: spd_buff,
        },
        Effect::Damage {
            targets: targets.to_vec(),
            multiplier: params[0],
            element: Some(Element::Quantum),
            skill_type: SkillType::BPSkill,
        },
    ])
}

/// Ultimate: enter the enhanced state for one round, then strike
pub(crate) fn ultimate(
    battle: &Battle,
    user: ActorId,
    targets: &[ActorId],
    level: usize,
    data: &SkillData,
) -> Result<Vec<Effect>, CatalogError> {
    let params = data.params_at_least(level, 1)?;
    let mut enhanced = match battle.registry().data(TALENT_ID) {
        Some(talent) => resurgence_buff(talent, level)?,
        None => Buff::new("Resurgence Enhanced State", 1)
            .with_damage_bonus(0.25)
            .with_element_penetration(RESURGENCE_PENETRATION),
    };
    enhanced.duration = 1;
    Ok(vec![
        Effect::Buff {
            targets: vec![user],
            buff: enhanced,
        },
        Effect::Damage {
            targets: targets.to_vec(),
            multiplier: params[0],
            element: Some(Element::Quantum),
            skill_type: SkillType::Ultra,
        },
    ])
}

/// Talent (Resurgence): on a kill, enter the enhanced state and act again
pub(crate) fn talent(
    user: ActorId,
    level: usize,
    data: &SkillData,
) -> Result<Vec<Effect>, CatalogError> {
    Ok(vec![
        Effect::Buff {
            targets: vec![user],
            buff: resurgence_buff(data, level)?,
        },
        Effect::ExtraTurn { target: user },
    ])
}

/// The enhanced-state buff: an independent damage bonus plus Quantum
/// penetration
pub(crate) fn resurgence_buff(data: &SkillData, level: usize) -> Result<Buff, CatalogError> {
    let params = data.params_at_least(level, 2)?;
    Ok(Buff::new("Resurgence Enhanced State", params[1] as i32)
        .with_damage_bonus(params[0])
        .with_element_penetration(RESURGENCE_PENETRATION))
}
