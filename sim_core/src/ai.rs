//! Per-actor decision policies: which skill to use next and whether a
//! ready ultimate should fire

use crate::battle::Battle;
use crate::types::{ActorId, SkillType};
use serde::{Deserialize, Serialize};

/// Closed set of decision policies.
///
/// Policies pick an intent only; resource checks (skill points, energy)
/// and the Normal-attack fallback are the scheduler's job, so a policy
/// may freely return a battle skill its side cannot pay for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiPolicy {
    /// Always the basic attack; the default for enemies
    BasicOnly,
    /// Prefer the battle skill whenever one exists
    SkillFirst,
    /// Battle skill only while an ally is missing health
    Healer,
}

impl AiPolicy {
    /// Choose the next skill id for this actor's turn
    pub fn choose_skill(&self, battle: &Battle, actor: ActorId) -> Option<String> {
        let unit = battle.actor(actor);
        let registry = battle.registry();
        let normal = registry
            .skill_of_type(&unit.skills, SkillType::Normal)
            .map(|s| s.id.clone());
        let battle_skill = registry
            .skill_of_type(&unit.skills, SkillType::BPSkill)
            .map(|s| s.id.clone());

        match self {
            AiPolicy::BasicOnly => normal,
            AiPolicy::SkillFirst => battle_skill.or(normal),
            AiPolicy::Healer => {
                let someone_injured = battle
                    .living_on_side(unit.side)
                    .into_iter()
                    .any(|id| battle.actor(id).hp < battle.max_hp(id) - 1e-9);
                if someone_injured {
                    battle_skill.or(normal)
                } else {
                    normal
                }
            }
        }
    }

    /// Whether a full-energy actor should cast its ultimate now.
    ///
    /// The scheduler already gates on energy and extra-turn state; every
    /// current policy consents unconditionally.
    pub fn should_cast_ultimate(&self, _battle: &Battle, _actor: ActorId) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Actor;
    use crate::battle::Battle;
    use crate::catalog::SkillData;
    use crate::skill::SkillRegistry;
    use crate::stat::{Stat, StatTable};
    use crate::types::Side;
    use std::collections::HashMap;

    fn stats() -> StatTable {
        [(Stat::Hp, 1000.0), (Stat::Atk, 500.0), (Stat::Spd, 100.0)]
            .into_iter()
            .collect()
    }

    fn skill(id: &str, skill_type: SkillType) -> SkillData {
        SkillData {
            id: id.to_string(),
            name: id.to_string(),
            skill_type,
            description: String::new(),
            params: vec![vec![1.0]],
        }
    }

    fn fixture(ai: AiPolicy) -> Battle {
        let skills: HashMap<String, SkillData> = [
            ("110501".to_string(), skill("110501", SkillType::Normal)),
            ("110502".to_string(), skill("110502", SkillType::BPSkill)),
        ]
        .into_iter()
        .collect();
        let healer = Actor::new("1105", "Natasha", Side::Player, stats())
            .with_skills(vec!["110501".to_string(), "110502".to_string()])
            .with_ai(ai);
        let ally = Actor::new("1102", "Seele", Side::Player, stats());
        let enemy = Actor::new("8001", "Dummy", Side::Enemy, stats());
        Battle::new(vec![healer, ally, enemy], SkillRegistry::new(skills), 7).unwrap()
    }

    #[test]
    fn test_skill_first_prefers_battle_skill() {
        let battle = fixture(AiPolicy::SkillFirst);
        assert_eq!(
            AiPolicy::SkillFirst.choose_skill(&battle, crate::types::ActorId(0)),
            Some("110502".to_string())
        );
    }

    #[test]
    fn test_basic_only_ignores_battle_skill() {
        let battle = fixture(AiPolicy::BasicOnly);
        assert_eq!(
            AiPolicy::BasicOnly.choose_skill(&battle, crate::types::ActorId(0)),
            Some("110501".to_string())
        );
    }

    #[test]
    fn test_healer_waits_for_injuries() {
        let mut battle = fixture(AiPolicy::Healer);
        let healer = crate::types::ActorId(0);
        // Everyone at full health: basic attack.
        assert_eq!(
            AiPolicy::Healer.choose_skill(&battle, healer),
            Some("110501".to_string())
        );
        // Injure the ally: battle skill.
        battle.actor_mut(crate::types::ActorId(1)).hp -= 200.0;
        assert_eq!(
            AiPolicy::Healer.choose_skill(&battle, healer),
            Some("110502".to_string())
        );
    }
}
