//! Light-cone skills: closed variants that grant base stats and install
//! event hooks at battle start

use crate::battle::Battle;
use crate::buff::Buff;
use crate::catalog::CatalogError;
use crate::stat::{Stat, StatTable};
use crate::types::{ActorId, SkillType};

/// A light-cone passive.
///
/// Each variant carries its resolved parameters; `ButTheBattleIsntOver`
/// additionally owns a per-battle counter that only its own hook
/// mutates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightConeSkill {
    /// Crit rate up; basic/skill damage and ultimate CRIT DMG scale with
    /// the wearer's SPD above 100, queried at use time
    InTheNight {
        crit_rate_bonus: f64,
        spd_step: f64,
        dmg_per_stack: f64,
        ult_crit_dmg_per_stack: f64,
        max_stacks: u32,
    },
    /// Energy regen up; extra healing on ultimates only
    PostOpConversation {
        energy_regen_bonus: f64,
        ult_healing_bonus: f64,
    },
    /// Energy regen up; every second ultimate refunds a skill point;
    /// skill casts grant the targeted ally a damage bonus
    ButTheBattleIsntOver {
        energy_regen_bonus: f64,
        skill_dmg_bonus: f64,
        buff_duration: i32,
        ultimates_cast: u32,
    },
}

impl LightConeSkill {
    /// Resolve a catalog skill id into a concrete variant at the given
    /// 1-based level. Unknown ids yield `None`.
    pub fn from_catalog(
        skill_id: &str,
        params: &[Vec<f64>],
        level: usize,
    ) -> Result<Option<Self>, CatalogError> {
        let row = match params.is_empty() {
            true => return Err(CatalogError::EmptyParams(skill_id.to_string())),
            false => &params[level.clamp(1, params.len()) - 1],
        };
        let need = |expected: usize| -> Result<(), CatalogError> {
            if row.len() < expected {
                Err(CatalogError::ShortParams {
                    id: skill_id.to_string(),
                    level,
                    expected,
                    found: row.len(),
                })
            } else {
                Ok(())
            }
        };

        let skill = match skill_id {
            "23001" => {
                need(5)?;
                LightConeSkill::InTheNight {
                    crit_rate_bonus: row[0],
                    spd_step: 10.0,
                    dmg_per_stack: row[2],
                    ult_crit_dmg_per_stack: row[3],
                    max_stacks: row[4] as u32,
                }
            }
            "21000" => {
                need(2)?;
                LightConeSkill::PostOpConversation {
                    energy_regen_bonus: row[0],
                    ult_healing_bonus: row[1],
                }
            }
            "23003" => {
                need(3)?;
                LightConeSkill::ButTheBattleIsntOver {
                    energy_regen_bonus: row[0],
                    skill_dmg_bonus: row[1],
                    buff_duration: row[2] as i32,
                    ultimates_cast: 0,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(skill))
    }

    /// Static stats granted while the wearer's path matches the cone's
    pub fn base_stats(&self) -> StatTable {
        match self {
            LightConeSkill::InTheNight { crit_rate_bonus, .. } => {
                [(Stat::CritRate, *crit_rate_bonus)].into_iter().collect()
            }
            LightConeSkill::PostOpConversation {
                energy_regen_bonus, ..
            }
            | LightConeSkill::ButTheBattleIsntOver {
                energy_regen_bonus, ..
            } => [(Stat::EnergyRegenRate, *energy_regen_bonus)]
                .into_iter()
                .collect(),
        }
    }

    /// Outgoing-healing bonus for a given skill type
    pub fn healing_bonus(&self, skill_type: SkillType) -> f64 {
        match self {
            LightConeSkill::PostOpConversation {
                ult_healing_bonus, ..
            } if skill_type == SkillType::Ultra => *ult_healing_bonus,
            _ => 0.0,
        }
    }

    pub(crate) fn on_battle_start(&mut self, battle: &mut Battle, owner: ActorId) {
        if let LightConeSkill::InTheNight {
            spd_step,
            dmg_per_stack,
            ult_crit_dmg_per_stack,
            max_stacks,
            ..
        } = *self
        {
            let dmg_stacks = move |spd: f64| night_stacks(spd, spd_step, max_stacks);
            let buff = Buff::permanent("In the Night Bonus")
                .with_dynamic_damage(move |query| {
                    if !matches!(
                        query.last_skill_type(),
                        Some(SkillType::Normal) | Some(SkillType::BPSkill)
                    ) {
                        return 0.0;
                    }
                    dmg_stacks(query.owner_stats().get(Stat::Spd)) as f64 * dmg_per_stack
                })
                .with_dynamic_stats(move |query| {
                    if query.last_skill_type() != Some(SkillType::Ultra) {
                        return StatTable::new();
                    }
                    let stacks = night_stacks(query.owner_stats().get(Stat::Spd), spd_step, max_stacks);
                    [(Stat::CritDmg, stacks as f64 * ult_crit_dmg_per_stack)]
                        .into_iter()
                        .collect()
                });
            battle.apply_buff(owner, owner, buff);
        }
    }

    pub(crate) fn on_turn_start(&mut self, _battle: &mut Battle, _owner: ActorId) {}

    pub(crate) fn on_skill_used(&mut self, battle: &mut Battle, owner: ActorId, skill_type: SkillType) {
        if let LightConeSkill::ButTheBattleIsntOver {
            skill_dmg_bonus,
            buff_duration,
            ultimates_cast,
            ..
        } = self
        {
            match skill_type {
                SkillType::Ultra => {
                    *ultimates_cast += 1;
                    if *ultimates_cast >= 2 {
                        *ultimates_cast = 0;
                        let side = battle.actor(owner).side;
                        battle.gain_skill_point(side);
                    }
                }
                SkillType::BPSkill => {
                    let target = battle.actor(owner).current_target;
                    if let Some(ally) = target {
                        if ally != owner && battle.actor(ally).side == battle.actor(owner).side {
                            let buff = Buff::new("The Inheritor", *buff_duration)
                                .with_damage_bonus(*skill_dmg_bonus);
                            battle.apply_buff(owner, ally, buff);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    pub(crate) fn on_damage_dealt(
        &mut self,
        _battle: &mut Battle,
        _owner: ActorId,
        _amount: f64,
        _skill_type: SkillType,
    ) {
    }

    pub(crate) fn on_damage_received(&mut self, _battle: &mut Battle, _owner: ActorId, _amount: f64) {}

    pub(crate) fn on_enemy_killed(&mut self, _battle: &mut Battle, _owner: ActorId) {}
}

/// Stacks granted per `spd_step` SPD above 100, capped
fn night_stacks(spd: f64, spd_step: f64, max_stacks: u32) -> u32 {
    let over = (spd - 100.0).max(0.0);
    ((over / spd_step) as u32).min(max_stacks)
}
