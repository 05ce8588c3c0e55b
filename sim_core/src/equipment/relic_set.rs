//! Relic-set skills: 2-piece and 4-piece effects derived from the
//! multiset of equipped set identities

use crate::battle::Battle;
use crate::buff::Buff;
use crate::equipment::Relic;
use crate::stat::{Stat, StatTable};
use crate::types::{ActorId, Element, SkillType};

/// A relic-set passive. Thresholds activate independently: two pieces
/// grant the static stats, four pieces add the event-driven effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelicSetSkill {
    SpaceSealingStation,
    FleetOfTheAgeless,
    GeniusOfBrilliantStars,
    EagleOfTwilightLine,
    InertSalsotto,
    PasserbyOfWanderingCloud,
}

impl RelicSetSkill {
    /// Resolve a set identity into its skill, if one is implemented
    pub fn from_set_name(name: &str) -> Option<Self> {
        match name {
            "Space Sealing Station" => Some(RelicSetSkill::SpaceSealingStation),
            "Fleet of the Ageless" => Some(RelicSetSkill::FleetOfTheAgeless),
            "Genius of Brilliant Stars" => Some(RelicSetSkill::GeniusOfBrilliantStars),
            "Eagle of Twilight Line" => Some(RelicSetSkill::EagleOfTwilightLine),
            "Inert Salsotto" => Some(RelicSetSkill::InertSalsotto),
            "Passerby of Wandering Cloud" => Some(RelicSetSkill::PasserbyOfWanderingCloud),
            _ => None,
        }
    }

    pub fn set_name(&self) -> &'static str {
        match self {
            RelicSetSkill::SpaceSealingStation => "Space Sealing Station",
            RelicSetSkill::FleetOfTheAgeless => "Fleet of the Ageless",
            RelicSetSkill::GeniusOfBrilliantStars => "Genius of Brilliant Stars",
            RelicSetSkill::EagleOfTwilightLine => "Eagle of Twilight Line",
            RelicSetSkill::InertSalsotto => "Inert Salsotto",
            RelicSetSkill::PasserbyOfWanderingCloud => "Passerby of Wandering Cloud",
        }
    }

    /// Derive the active set skills from equipped relics, in first-seen
    /// order. Each entry carries the activated piece count (2 or 4).
    pub fn active_sets(relics: &[Relic]) -> Vec<(RelicSetSkill, u8)> {
        let mut counts: Vec<(&str, u8)> = Vec::new();
        for relic in relics {
            match counts.iter_mut().find(|(name, _)| *name == relic.set_name) {
                Some((_, count)) => *count += 1,
                None => counts.push((&relic.set_name, 1)),
            }
        }
        counts
            .into_iter()
            .filter_map(|(name, count)| {
                let skill = RelicSetSkill::from_set_name(name)?;
                match count {
                    c if c >= 4 => Some((skill, 4)),
                    c if c >= 2 => Some((skill, 2)),
                    _ => None,
                }
            })
            .collect()
    }

    /// Static stats granted at two pieces
    pub fn base_stats(&self, pieces: u8) -> StatTable {
        if pieces < 2 {
            return StatTable::new();
        }
        match self {
            RelicSetSkill::SpaceSealingStation => {
                [(Stat::AtkPct, 0.12)].into_iter().collect()
            }
            RelicSetSkill::FleetOfTheAgeless => [(Stat::HpPct, 0.12)].into_iter().collect(),
            RelicSetSkill::GeniusOfBrilliantStars => {
                [(Stat::ElementDmg(Element::Quantum), 0.10)].into_iter().collect()
            }
            RelicSetSkill::EagleOfTwilightLine => {
                [(Stat::ElementDmg(Element::Wind), 0.10)].into_iter().collect()
            }
            RelicSetSkill::InertSalsotto => [(Stat::CritRate, 0.08)].into_iter().collect(),
            RelicSetSkill::PasserbyOfWanderingCloud => {
                [(Stat::OutgoingHealingBoost, 0.10)].into_iter().collect()
            }
        }
    }

    pub(crate) fn on_battle_start(&self, battle: &mut Battle, owner: ActorId, pieces: u8) {
        match self {
            RelicSetSkill::SpaceSealingStation => {
                let buff = Buff::permanent("Space Sealing Station Bonus").with_dynamic_stats(
                    |query| {
                        if query.owner_stats().get(Stat::Spd) >= 120.0 {
                            [(Stat::AtkPct, 0.12)].into_iter().collect()
                        } else {
                            StatTable::new()
                        }
                    },
                );
                battle.apply_buff(owner, owner, buff);
            }
            RelicSetSkill::FleetOfTheAgeless => {
                let spd = battle.current_stats(owner, true).get(Stat::Spd);
                if spd >= 120.0 {
                    let side = battle.actor(owner).side;
                    for ally in battle.living_on_side(side) {
                        let buff =
                            Buff::permanent("Fleet Aura").with_stat(Stat::AtkPct, 0.08);
                        battle.apply_buff(owner, ally, buff);
                    }
                }
            }
            RelicSetSkill::GeniusOfBrilliantStars if pieces >= 4 => {
                let buff = Buff::permanent("Genius DEF Ignore").with_dynamic_stats(|query| {
                    let mut ignore = 0.10;
                    if let Some(target) = query.current_target() {
                        if target.weaknesses.contains(&Element::Quantum) {
                            ignore += 0.10;
                        }
                    }
                    [(Stat::DefIgnore, ignore)].into_iter().collect()
                });
                battle.apply_buff(owner, owner, buff);
            }
            RelicSetSkill::InertSalsotto => {
                let buff = Buff::permanent("Salsotto DMG Bonus").with_dynamic_damage(|query| {
                    let crit_rate = query.owner_stats().get(Stat::CritRate);
                    let after_ult_or_follow_up = matches!(
                        query.last_skill_type(),
                        Some(SkillType::Ultra) | Some(SkillType::Talent)
                    );
                    if crit_rate >= 0.50 && after_ult_or_follow_up {
                        0.15
                    } else {
                        0.0
                    }
                });
                battle.apply_buff(owner, owner, buff);
            }
            RelicSetSkill::PasserbyOfWanderingCloud if pieces >= 4 => {
                let side = battle.actor(owner).side;
                battle.gain_skill_point(side);
            }
            _ => {}
        }
    }

    pub(crate) fn on_turn_start(&self, _battle: &mut Battle, _owner: ActorId, _pieces: u8) {}

    pub(crate) fn on_skill_used(
        &self,
        battle: &mut Battle,
        owner: ActorId,
        skill_type: SkillType,
        pieces: u8,
    ) {
        if let RelicSetSkill::EagleOfTwilightLine = self {
            if pieces >= 4 && skill_type == SkillType::Ultra {
                battle.boost_progress(owner, 0.25);
            }
        }
    }

    pub(crate) fn on_damage_dealt(
        &self,
        _battle: &mut Battle,
        _owner: ActorId,
        _amount: f64,
        _skill_type: SkillType,
        _pieces: u8,
    ) {
    }

    pub(crate) fn on_enemy_killed(&self, _battle: &mut Battle, _owner: ActorId, _pieces: u8) {}
}
