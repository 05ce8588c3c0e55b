//! Tunable engine constants, TOML-parsable with serde defaults

use crate::types::{Element, SkillType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when constants fail to parse
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse constants: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Tunable engine constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConstants {
    #[serde(default)]
    pub scheduler: SchedulerConstants,
    #[serde(default)]
    pub skill_points: SkillPointConstants,
    #[serde(default)]
    pub energy: EnergyConstants,
    #[serde(default)]
    pub toughness: ToughnessConstants,
    #[serde(default)]
    pub break_damage: BreakConstants,
    #[serde(default)]
    pub damage: DamageConstants,
}

impl Default for EngineConstants {
    fn default() -> Self {
        EngineConstants {
            scheduler: SchedulerConstants::default(),
            skill_points: SkillPointConstants::default(),
            energy: EnergyConstants::default(),
            toughness: ToughnessConstants::default(),
            break_damage: BreakConstants::default(),
            damage: DamageConstants::default(),
        }
    }
}

/// Parse constants from a TOML string
pub fn parse_constants(content: &str) -> Result<EngineConstants, ConfigError> {
    Ok(toml::from_str(content)?)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConstants {
    /// Action-value pool for the first round
    #[serde(default = "default_first_round_pool")]
    pub first_round_pool: f64,
    /// Action-value pool for every later round
    #[serde(default = "default_round_pool")]
    pub round_pool: f64,
    /// An actor needs `speed_scale / SPD` action value for a full turn
    #[serde(default = "default_speed_scale")]
    pub speed_scale: f64,
}

impl Default for SchedulerConstants {
    fn default() -> Self {
        SchedulerConstants {
            first_round_pool: 150.0,
            round_pool: 100.0,
            speed_scale: 10000.0,
        }
    }
}

fn default_first_round_pool() -> f64 {
    150.0
}
fn default_round_pool() -> f64 {
    100.0
}
fn default_speed_scale() -> f64 {
    10000.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillPointConstants {
    #[serde(default = "default_skill_point_cap")]
    pub cap: u32,
    #[serde(default = "default_skill_point_initial")]
    pub initial: u32,
}

impl Default for SkillPointConstants {
    fn default() -> Self {
        SkillPointConstants { cap: 5, initial: 3 }
    }
}

fn default_skill_point_cap() -> u32 {
    5
}
fn default_skill_point_initial() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyConstants {
    #[serde(default = "default_energy_normal")]
    pub normal: f64,
    #[serde(default = "default_energy_bp_skill")]
    pub bp_skill: f64,
    #[serde(default = "default_energy_ultra")]
    pub ultra: f64,
    #[serde(default = "default_energy_on_kill")]
    pub on_kill: f64,
    #[serde(default = "default_energy_on_damage_received")]
    pub on_damage_received: f64,
}

impl EnergyConstants {
    /// Base energy granted for using a skill of the given type
    pub fn base_gain(&self, skill_type: SkillType) -> f64 {
        match skill_type {
            SkillType::Normal => self.normal,
            SkillType::BPSkill => self.bp_skill,
            SkillType::Ultra => self.ultra,
            _ => 0.0,
        }
    }
}

impl Default for EnergyConstants {
    fn default() -> Self {
        EnergyConstants {
            normal: 20.0,
            bp_skill: 30.0,
            ultra: 5.0,
            on_kill: 10.0,
            on_damage_received: 5.0,
        }
    }
}

fn default_energy_normal() -> f64 {
    20.0
}
fn default_energy_bp_skill() -> f64 {
    30.0
}
fn default_energy_ultra() -> f64 {
    5.0
}
fn default_energy_on_kill() -> f64 {
    10.0
}
fn default_energy_on_damage_received() -> f64 {
    5.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToughnessConstants {
    #[serde(default = "default_toughness_normal")]
    pub normal: f64,
    #[serde(default = "default_toughness_bp_skill")]
    pub bp_skill: f64,
    #[serde(default = "default_toughness_ultra")]
    pub ultra: f64,
}

impl ToughnessConstants {
    /// Toughness damage dealt by a skill of the given type
    pub fn damage_for(&self, skill_type: SkillType) -> f64 {
        match skill_type {
            SkillType::Normal => self.normal,
            SkillType::BPSkill => self.bp_skill,
            SkillType::Ultra => self.ultra,
            _ => 0.0,
        }
    }
}

impl Default for ToughnessConstants {
    fn default() -> Self {
        ToughnessConstants {
            normal: 10.0,
            bp_skill: 20.0,
            ultra: 30.0,
        }
    }
}

fn default_toughness_normal() -> f64 {
    10.0
}
fn default_toughness_bp_skill() -> f64 {
    20.0
}
fn default_toughness_ultra() -> f64 {
    30.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakConstants {
    /// Base break damage coefficient
    #[serde(default = "default_break_coefficient")]
    pub base_coefficient: f64,
}

impl BreakConstants {
    /// Fixed per-element break coefficients
    pub fn element_coefficient(&self, element: Element) -> f64 {
        match element {
            Element::Physical | Element::Fire => 2.0,
            Element::Wind => 1.5,
            Element::Lightning | Element::Ice => 1.0,
            Element::Quantum | Element::Imaginary => 0.5,
        }
    }

    /// Base break damage before defense-side modifiers:
    /// `coeff * elem * ((max_toughness + 20) / 40) * (1 + break_effect)`
    pub fn base_damage(&self, element: Element, max_toughness: f64, break_effect: f64) -> f64 {
        self.base_coefficient
            * self.element_coefficient(element)
            * ((max_toughness + 20.0) / 40.0)
            * (1.0 + break_effect)
    }
}

impl Default for BreakConstants {
    fn default() -> Self {
        BreakConstants {
            base_coefficient: 1883.8,
        }
    }
}

fn default_break_coefficient() -> f64 {
    1883.8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageConstants {
    /// Defense curve: reduction = def / (def + level * factor + base)
    #[serde(default = "default_def_level_factor")]
    pub def_level_factor: f64,
    #[serde(default = "default_def_base")]
    pub def_base: f64,
    /// Floor for the resistance multiplier
    #[serde(default = "default_min_resistance_multiplier")]
    pub min_resistance_multiplier: f64,
    /// Multiplier applied while the target's toughness is above zero
    #[serde(default = "default_toughness_damage_multiplier")]
    pub toughness_damage_multiplier: f64,
    /// Damage never drops below this
    #[serde(default = "default_min_final_damage")]
    pub min_final_damage: f64,
}

impl Default for DamageConstants {
    fn default() -> Self {
        DamageConstants {
            def_level_factor: 10.0,
            def_base: 200.0,
            min_resistance_multiplier: 0.1,
            toughness_damage_multiplier: 0.9,
            min_final_damage: 1.0,
        }
    }
}

fn default_def_level_factor() -> f64 {
    10.0
}
fn default_def_base() -> f64 {
    200.0
}
fn default_min_resistance_multiplier() -> f64 {
    0.1
}
fn default_toughness_damage_multiplier() -> f64 {
    0.9
}
fn default_min_final_damage() -> f64 {
    1.0
}
