//! The healing pipeline.
//!
//! `final = base * (1 + outgoing boost + light-cone bonus) * (1 + incoming boost)`
//! where the light-cone bonus is queried per skill type, which is how
//! time-limited healing augments (e.g. ultimate-only boosts) are
//! expressed.

use crate::battle::Battle;
use crate::stat::Stat;
use crate::types::{ActorId, SkillType};

/// Compute the final healing one target receives from a healer
pub fn calculate_final_heal(
    battle: &Battle,
    healer: ActorId,
    target: ActorId,
    base_amount: f64,
    skill_type: SkillType,
) -> f64 {
    let healer_stats = battle.current_stats(healer, false);
    let mut outgoing = healer_stats.get(Stat::OutgoingHealingBoost);
    if let Some(skill) = battle
        .actor(healer)
        .light_cone
        .as_ref()
        .and_then(|lc| lc.skill.as_ref())
    {
        outgoing += skill.healing_bonus(skill_type);
    }

    let incoming = battle
        .current_stats(target, false)
        .get(Stat::IncomingHealingBoost);

    base_amount * (1.0 + outgoing) * (1.0 + incoming)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Actor;
    use crate::battle::Battle;
    use crate::buff::Buff;
    use crate::equipment::{LightCone, LightConeSkill};
    use crate::skill::SkillRegistry;
    use crate::stat::StatTable;
    use crate::types::Side;
    use std::collections::HashMap;

    fn basic_stats() -> StatTable {
        [(Stat::Hp, 3000.0), (Stat::Atk, 500.0), (Stat::Spd, 100.0)]
            .into_iter()
            .collect()
    }

    fn fixture() -> Battle {
        let healer = Actor::new("1105", "Natasha", Side::Player, basic_stats());
        let ally = Actor::new("1102", "Seele", Side::Player, basic_stats());
        Battle::new(vec![healer, ally], SkillRegistry::new(HashMap::new()), 7).unwrap()
    }

    #[test]
    fn test_unmodified_heal_passes_through() {
        let battle = fixture();
        let heal = calculate_final_heal(&battle, ActorId(0), ActorId(1), 400.0, SkillType::BPSkill);
        assert!((heal - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_outgoing_and_incoming_boosts_multiply() {
        let mut battle = fixture();
        battle
            .actor_mut(ActorId(0))
            .base_stats
            .add(Stat::OutgoingHealingBoost, 0.10);
        battle.actor_mut(ActorId(1)).buffs.add(
            Buff::new("Mending Chant", 2).with_stat(Stat::IncomingHealingBoost, 0.20),
        );
        let heal = calculate_final_heal(&battle, ActorId(0), ActorId(1), 100.0, SkillType::BPSkill);
        assert!((heal - 100.0 * 1.10 * 1.20).abs() < 1e-9);
    }

    #[test]
    fn test_light_cone_bonus_gates_on_skill_type() {
        let mut battle = fixture();
        battle.actor_mut(ActorId(0)).light_cone = Some(LightCone {
            id: "21000".to_string(),
            name: "Post-Op Conversation".to_string(),
            stats: StatTable::new(),
            path: None,
            skill: Some(LightConeSkill::PostOpConversation {
                energy_regen_bonus: 0.08,
                ult_healing_bonus: 0.12,
            }),
        });

        let ult = calculate_final_heal(&battle, ActorId(0), ActorId(1), 100.0, SkillType::Ultra);
        assert!((ult - 112.0).abs() < 1e-9);
        // Skill-cast and periodic healing get no bonus from this cone.
        let skill = calculate_final_heal(&battle, ActorId(0), ActorId(1), 100.0, SkillType::BPSkill);
        assert!((skill - 100.0).abs() < 1e-9);
        let hot =
            calculate_final_heal(&battle, ActorId(0), ActorId(1), 100.0, SkillType::HealOverTime);
        assert!((hot - 100.0).abs() < 1e-9);
    }
}
