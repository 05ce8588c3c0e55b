//! Attacker-side damage calculation: base damage, bonus accumulation,
//! penetration, and the crit roll

use crate::battle::Battle;
use crate::buff::StatQuery;
use crate::damage::DamagePacket;
use crate::stat::Stat;
use crate::types::{ActorId, Element, SkillType};
use rand::Rng;

/// How the crit roll is resolved; `Force` and `Immune` exist for previews
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CritMode {
    Roll,
    Force,
    Immune,
}

/// Attacker-side computation with the crit outcome already decided.
///
/// This is the deterministic half of [`attack_side`]; the battle loop
/// rolls the crit itself and calls this directly.
pub fn compute_packet(
    battle: &Battle,
    attacker: ActorId,
    multiplier: f64,
    element: Option<Element>,
    skill_type: SkillType,
    is_crit: bool,
) -> DamagePacket {
    let stats = battle.current_stats(attacker, false);
    let base_damage = stats.get(Stat::Atk) * multiplier;

    let mut damage_bonus = 0.0;
    if let Some(el) = element {
        damage_bonus += stats.get(Stat::ElementDmg(el));
    }
    damage_bonus += match skill_type {
        SkillType::Ultra => stats.get(Stat::UltimateDmg),
        SkillType::Talent => stats.get(Stat::FollowUpDmg),
        SkillType::Break => stats.get(Stat::BreakDmg),
        _ => 0.0,
    };

    let owner = battle.actor(attacker);
    let query = StatQuery { battle, owner };
    let mut penetration = 0.0;
    for buff in owner.buffs.iter() {
        damage_bonus += buff.current_damage_bonus(&query);
        penetration += buff.element_penetration;
    }

    let crit_multiplier = if is_crit {
        1.0 + stats.get(Stat::CritDmg)
    } else {
        1.0
    };

    let theoretical = base_damage * (1.0 + damage_bonus) * crit_multiplier;

    DamagePacket {
        base_damage,
        damage_bonus,
        penetration,
        is_crit,
        crit_multiplier,
        theoretical,
        element,
        skill_type,
    }
}

/// Full attacker side: rolls the crit with `rng` (unless overridden by
/// `mode`), then computes the packet
pub fn attack_side(
    battle: &Battle,
    attacker: ActorId,
    multiplier: f64,
    element: Option<Element>,
    skill_type: SkillType,
    mode: CritMode,
    rng: &mut impl Rng,
) -> DamagePacket {
    let is_crit = match mode {
        CritMode::Force => true,
        CritMode::Immune => false,
        CritMode::Roll => {
            let crit_rate = battle.current_stats(attacker, false).get(Stat::CritRate);
            rng.gen::<f64>() < crit_rate
        }
    };
    compute_packet(battle, attacker, multiplier, element, skill_type, is_crit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Actor;
    use crate::battle::Battle;
    use crate::buff::Buff;
    use crate::skill::SkillRegistry;
    use crate::stat::StatTable;
    use crate::types::Side;
    use std::collections::HashMap;

    fn fixture() -> Battle {
        let stats: StatTable = [
            (Stat::Hp, 1000.0),
            (Stat::Atk, 1000.0),
            (Stat::Def, 400.0),
            (Stat::Spd, 100.0),
            (Stat::CritDmg, 0.5),
            (Stat::ElementDmg(Element::Quantum), 0.20),
        ]
        .into_iter()
        .collect();
        let attacker = Actor::new("1102", "Seele", Side::Player, stats);
        let target = Actor::new("8001", "Dummy", Side::Enemy, [(Stat::Hp, 5000.0)].into_iter().collect());
        Battle::new(
            vec![attacker, target],
            SkillRegistry::new(HashMap::new()),
            7,
        )
        .unwrap()
    }

    #[test]
    fn test_base_damage_scales_with_multiplier() {
        let battle = fixture();
        let packet = compute_packet(
            &battle,
            ActorId(0),
            2.0,
            None,
            SkillType::Normal,
            false,
        );
        assert!((packet.base_damage - 2000.0).abs() < 1e-9);
        assert!((packet.theoretical - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_element_bonus_applies() {
        let battle = fixture();
        let packet = compute_packet(
            &battle,
            ActorId(0),
            1.0,
            Some(Element::Quantum),
            SkillType::Normal,
            false,
        );
        assert!((packet.damage_bonus - 0.20).abs() < 1e-9);
        assert!((packet.theoretical - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_crit_multiplies_by_one_plus_crit_dmg() {
        let battle = fixture();
        let packet = compute_packet(&battle, ActorId(0), 1.0, None, SkillType::Normal, true);
        assert!(packet.is_crit);
        assert!((packet.crit_multiplier - 1.5).abs() < 1e-9);
        assert!((packet.theoretical - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_buff_damage_bonus_and_penetration() {
        let mut battle = fixture();
        battle.actor_mut(ActorId(0)).buffs.add(
            Buff::new("Resurgence Enhanced State", 1)
                .with_damage_bonus(0.40)
                .with_element_penetration(0.20),
        );
        let packet = compute_packet(&battle, ActorId(0), 1.0, None, SkillType::Normal, false);
        assert!((packet.damage_bonus - 0.40).abs() < 1e-9);
        assert!((packet.penetration - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_crit_mode_overrides() {
        let battle = fixture();
        let mut rng = rand::rngs::mock::StepRng::new(0, 0);
        let forced = attack_side(
            &battle,
            ActorId(0),
            1.0,
            None,
            SkillType::Normal,
            CritMode::Force,
            &mut rng,
        );
        assert!(forced.is_crit);
        let immune = attack_side(
            &battle,
            ActorId(0),
            1.0,
            None,
            SkillType::Normal,
            CritMode::Immune,
            &mut rng,
        );
        assert!(!immune.is_crit);
    }
}
