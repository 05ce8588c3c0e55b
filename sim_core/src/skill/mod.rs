//! The skill registry: maps catalog skill ids to closed behavior
//! variants that emit effect lists

mod bronya;
mod natasha;
mod seele;

use crate::battle::Battle;
use crate::catalog::{CatalogError, SkillData};
use crate::effect::Effect;
use crate::types::{ActorId, Element, SkillType};
use std::collections::HashMap;

/// How the scheduler picks targets for a skill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRule {
    RandomEnemy,
    LowestHpRatioAlly,
    HighestAtkOtherAlly,
    AllAllies,
    SelfOnly,
}

/// A skill behavior. Character-specific skills are instances of this
/// closed set, parameterized by catalog data; `EnemyBasic` covers plain
/// monster attacks and `Noop` is the unknown-id fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillRoutine {
    SeeleBasic,
    SeeleSkill,
    SeeleUltimate,
    SeeleTalent,
    BronyaBasic,
    BronyaSkill,
    BronyaUltimate,
    BronyaTalent,
    NatashaBasic,
    NatashaSkill,
    NatashaUltimate,
    EnemyBasic(Element),
    Noop,
}

impl SkillRoutine {
    pub fn target_rule(&self) -> TargetRule {
        match self {
            SkillRoutine::BronyaSkill => TargetRule::HighestAtkOtherAlly,
            SkillRoutine::BronyaUltimate | SkillRoutine::NatashaUltimate => TargetRule::AllAllies,
            SkillRoutine::NatashaSkill => TargetRule::LowestHpRatioAlly,
            SkillRoutine::SeeleTalent | SkillRoutine::BronyaTalent | SkillRoutine::Noop => {
                TargetRule::SelfOnly
            }
            _ => TargetRule::RandomEnemy,
        }
    }

    /// Produce the ordered effect list for one use of this skill
    pub fn emit(
        &self,
        battle: &Battle,
        user: ActorId,
        targets: &[ActorId],
        level: usize,
        data: &SkillData,
    ) -> Result<Vec<Effect>, CatalogError> {
        match self {
            SkillRoutine::SeeleBasic => seele::basic(user, targets, level, data),
            SkillRoutine::SeeleSkill => seele::skill(user, targets, level, data),
            SkillRoutine::SeeleUltimate => seele::ultimate(battle, user, targets, level, data),
            SkillRoutine::SeeleTalent => seele::talent(user, level, data),
            SkillRoutine::BronyaBasic => bronya::basic(battle, user, targets, level, data),
            SkillRoutine::BronyaSkill => bronya::skill(user, targets, level, data),
            SkillRoutine::BronyaUltimate => bronya::ultimate(battle, user, level, data),
            SkillRoutine::BronyaTalent => Ok(Vec::new()),
            SkillRoutine::NatashaBasic => natasha::basic(user, targets, level, data),
            SkillRoutine::NatashaSkill => natasha::skill(battle, targets, level, data),
            SkillRoutine::NatashaUltimate => natasha::ultimate(battle, user, level, data),
            SkillRoutine::EnemyBasic(element) => {
                let params = data.params_at_least(level, 1)?;
                Ok(vec![Effect::Damage {
                    targets: targets.to_vec(),
                    multiplier: params[0],
                    element: Some(*element),
                    skill_type: data.skill_type,
                }])
            }
            SkillRoutine::Noop => Ok(Vec::new()),
        }
    }
}

/// Maps skill identities to behaviors and holds their catalog data.
///
/// Ids without a registered behavior resolve to nothing; the scheduler
/// treats them as no-ops and logs a warning event.
#[derive(Debug, Clone)]
pub struct SkillRegistry {
    skills: HashMap<String, SkillData>,
    routines: HashMap<String, SkillRoutine>,
}

impl SkillRegistry {
    /// Build a registry over catalog data with the built-in character
    /// routines installed
    pub fn new(skills: HashMap<String, SkillData>) -> Self {
        let routines = [
            ("110101", SkillRoutine::BronyaBasic),
            ("110102", SkillRoutine::BronyaSkill),
            ("110103", SkillRoutine::BronyaUltimate),
            ("110104", SkillRoutine::BronyaTalent),
            ("110201", SkillRoutine::SeeleBasic),
            ("110202", SkillRoutine::SeeleSkill),
            ("110203", SkillRoutine::SeeleUltimate),
            ("110204", SkillRoutine::SeeleTalent),
            ("110501", SkillRoutine::NatashaBasic),
            ("110502", SkillRoutine::NatashaSkill),
            ("110503", SkillRoutine::NatashaUltimate),
        ]
        .into_iter()
        .map(|(id, routine)| (id.to_string(), routine))
        .collect();
        SkillRegistry { skills, routines }
    }

    /// Register or override a routine for a skill id
    pub fn with_routine(mut self, id: impl Into<String>, routine: SkillRoutine) -> Self {
        self.routines.insert(id.into(), routine);
        self
    }

    pub fn routine(&self, id: &str) -> Option<SkillRoutine> {
        self.routines.get(id).copied()
    }

    pub fn data(&self, id: &str) -> Option<&SkillData> {
        self.skills.get(id)
    }

    /// First of the given skill ids whose catalog type matches
    pub fn skill_of_type(&self, ids: &[String], skill_type: SkillType) -> Option<&SkillData> {
        ids.iter()
            .filter_map(|id| self.skills.get(id))
            .find(|data| data.skill_type == skill_type)
    }
}
