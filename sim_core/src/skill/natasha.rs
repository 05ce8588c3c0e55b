//! Natasha's skill set (Physical, Abundance)

use crate::battle::Battle;
use crate::buff::{Buff, TurnStartHeal};
use crate::catalog::{CatalogError, SkillData};
use crate::effect::Effect;
use crate::types::{ActorId, Element, SkillType};

/// Basic attack: single-target Physical damage
pub(crate) fn basic(
    _user: ActorId,
    targets: &[ActorId],
    level: usize,
    data: &SkillData,
) -> Result<Vec<Effect>, CatalogError> {
    let params = data.params_at_least(level, 1)?;
    Ok(vec![Effect::Damage {
        targets: targets.to_vec(),
        multiplier: params[0],
        element: Some(Element::Physical),
        skill_type: SkillType::Normal,
    }])
}

/// Battle skill: heal the chosen ally by a share of their max HP plus a
/// flat amount, then leave a heal-over-time on them.
///
/// Params: `[heal_ratio, hot_ratio, hot_duration, heal_flat, hot_flat]`.
pub(crate) fn skill(
    battle: &Battle,
    targets: &[ActorId],
    level: usize,
    data: &SkillData,
) -> Result<Vec<Effect>, CatalogError> {
    let params = data.params_at_least(level, 5)?;
    let mut effects = Vec::new();
    for &target in targets {
        let base = params[0] * battle.max_hp(target) + params[3];
        effects.push(Effect::Heal {
            targets: vec![target],
            base_amount: base,
        });
        effects.push(Effect::Buff {
            targets: vec![target],
            buff: Buff::new("Soothing Melody", params[2] as i32).with_turn_start_heal(
                TurnStartHeal {
                    max_hp_ratio: params[1],
                    flat: params[4],
                },
            ),
        });
    }
    Ok(effects)
}

/// Ultimate: heal every living ally.
///
/// Params: `[heal_ratio, heal_flat]`.
pub(crate) fn ultimate(
    battle: &Battle,
    user: ActorId,
    level: usize,
    data: &SkillData,
) -> Result<Vec<Effect>, CatalogError> {
    let params = data.params_at_least(level, 2)?;
    let allies = battle.living_on_side(battle.actor(user).side);
    Ok(allies
        .into_iter()
        .map(|ally| Effect::Heal {
            targets: vec![ally],
            base_amount: params[0] * battle.max_hp(ally) + params[1],
        })
        .collect())
}
