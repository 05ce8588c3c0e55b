//! Bronya's skill set (Wind, Harmony).
//!
//! The ultimate's CRIT DMG share is the canonical capture-based dynamic
//! buff: the closure holds Bronya's id and reads her recursion-guarded
//! CRIT DMG every time an ally's stats are queried.

use crate::battle::Battle;
use crate::buff::Buff;
use crate::catalog::{CatalogError, SkillData};
use crate::effect::{BoostTiming, Effect};
use crate::stat::{Stat, StatTable};
use crate::types::{ActorId, Element, SkillType};

const TALENT_ID: &str = "110104";

/// Basic attack: Wind damage; the talent then advances her next action
pub(crate) fn basic(
    battle: &Battle,
    user: ActorId,
    targets: &[ActorId],
    level: usize,
    data: &SkillData,
) -> Result<Vec<Effect>, CatalogError> {
    let params = data.params_at_least(level, 1)?;
    let mut effects = vec![Effect::Damage {
        targets: targets.to_vec(),
        multiplier: params[0],
        element: Some(Element::Wind),
        skill_type: SkillType::Normal,
    }];
    if let Some(talent) = battle.registry().data(TALENT_ID) {
        let advance = talent.params_at_least(1, 1)?[0];
        effects.push(Effect::ProgressBoost {
            target: user,
            amount: advance,
            timing: BoostTiming::Delayed,
        });
    }
    Ok(effects)
}

/// Battle skill: the targeted ally acts immediately (unless it is
/// Bronya herself) and gains a damage bonus
pub(crate) fn skill(
    user: ActorId,
    targets: &[ActorId],
    level: usize,
    data: &SkillData,
) -> Result<Vec<Effect>, CatalogError> {
    let params = data.params_at_least(level, 3)?;
    let ally = targets.first().copied().unwrap_or(user);

    let mut effects = Vec::new();
    if ally != user {
        effects.push(Effect::ProgressBoost {
            target: ally,
            amount: 1.0,
            timing: BoostTiming::Immediate,
        });
    }
    effects.push(Effect::Buff {
        targets: vec![ally],
        buff: Buff::new("Combat Redeployment", params[2] as i32).with_damage_bonus(params[0]),
    });
    Ok(effects)
}

/// Ultimate: team-wide ATK% plus CRIT DMG scaling with Bronya's own
pub(crate) fn ultimate(
    battle: &Battle,
    user: ActorId,
    level: usize,
    data: &SkillData,
) -> Result<Vec<Effect>, CatalogError> {
    let params = data.params_at_least(level, 4)?;
    let (atk_boost, crit_dmg_share, crit_dmg_flat, duration) =
        (params[0], params[1], params[2], params[3] as i32);

    let caster = user;
    let march = Buff::new("The Belobog March", duration)
        .with_stat(Stat::AtkPct, atk_boost)
        .with_dynamic_stats(move |query| {
            let caster_crit_dmg = query.stats_of(caster).get(Stat::CritDmg);
            let bonus = caster_crit_dmg * crit_dmg_share + crit_dmg_flat;
            let mut table = StatTable::new();
            table.add(Stat::CritDmg, bonus);
            table
        });

    let allies = battle.living_on_side(battle.actor(user).side);
    Ok(vec![Effect::Buff {
        targets: allies,
        buff: march,
    }])
}
