//! Already-parsed catalog input types.
//!
//! The engine consumes collaborator output, never files: skills, light
//! cones, relics, monsters, and relic-set descriptions arrive as the
//! structures below. Helpers here normalize percent-typed values (some
//! catalogs store `12.0` for 12%) and convert string stat maps into
//! canonical [`StatTable`]s. Validation failures surface as
//! [`CatalogError`] at battle-construction time, never at turn time.

use crate::equipment::RelicSlot;
use crate::stat::{Stat, StatTable, UnknownStat};
use crate::types::Element;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Error raised while validating catalog entries
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    UnknownStat(#[from] UnknownStat),
    #[error("unrecognized relic slot `{0}`")]
    UnknownSlot(String),
    #[error("unrecognized element `{0}`")]
    UnknownElement(String),
    #[error("a relic is already equipped in slot {0:?}")]
    DuplicateSlot(RelicSlot),
    #[error("cannot equip more than {0} relics")]
    TooManyRelics(usize),
    #[error("skill `{0}` has an empty params matrix")]
    EmptyParams(String),
    #[error("skill `{id}` level {level} needs at least {expected} parameters, found {found}")]
    ShortParams {
        id: String,
        level: usize,
        expected: usize,
        found: usize,
    },
    #[error("monster `{0}` lists no skills")]
    NoSkills(String),
    #[error("failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One skill entry: `skills_by_id[id]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillData {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub skill_type: crate::types::SkillType,
    #[serde(default)]
    pub description: String,
    /// `params[level - 1][index]`
    pub params: Vec<Vec<f64>>,
}

impl SkillData {
    pub fn max_level(&self) -> usize {
        self.params.len().max(1)
    }

    /// Parameters for a 1-based level, clamped to the available rows
    pub fn params_at(&self, level: usize) -> Result<&[f64], CatalogError> {
        if self.params.is_empty() {
            return Err(CatalogError::EmptyParams(self.id.clone()));
        }
        let row = level.clamp(1, self.params.len()) - 1;
        Ok(&self.params[row])
    }

    /// Parameters for a level, also checking the row is long enough
    pub fn params_at_least(&self, level: usize, expected: usize) -> Result<&[f64], CatalogError> {
        let row = self.params_at(level)?;
        if row.len() < expected {
            return Err(CatalogError::ShortParams {
                id: self.id.clone(),
                level,
                expected,
                found: row.len(),
            });
        }
        Ok(row)
    }
}

/// One light cone entry: `light_cones_by_id[id]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightConeData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub stats: HashMap<String, f64>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub skill_id: Option<String>,
    #[serde(default)]
    pub skill_params: Vec<Vec<f64>>,
}

/// A single stat roll on a relic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelicStatData {
    pub stat: String,
    pub value: f64,
}

/// One relic entry: `relics_by_id[id]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelicData {
    pub id: String,
    pub slot: String,
    pub set_name: String,
    pub main_stat: RelicStatData,
    #[serde(default)]
    pub sub_stats: Vec<RelicStatData>,
}

/// One monster entry: `monsters_by_id[id]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterData {
    pub id: String,
    pub name: String,
    pub stats: HashMap<String, f64>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub resistances: HashMap<String, f64>,
    #[serde(default)]
    pub toughness: f64,
    #[serde(default)]
    pub max_toughness: f64,
    pub skills: Vec<String>,
    #[serde(default = "default_level")]
    pub level: u32,
}

fn default_level() -> u32 {
    80
}

/// One relic set entry: `relic_set_skills_by_name[name]`.
///
/// Descriptions only; numeric effect parameters live in the closed
/// [`crate::equipment::RelicSetSkill`] variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelicSetData {
    pub name: String,
    #[serde(default)]
    pub two_piece: String,
    #[serde(default)]
    pub four_piece: String,
}

/// Normalize a percent-typed value stored as a percentage greater than
/// one (e.g. `12.0` meaning 12%) to a fraction.
pub fn normalize_stat_value(stat: Stat, value: f64) -> f64 {
    if stat.is_percent_typed() && value > 1.0 {
        value / 100.0
    } else {
        value
    }
}

/// Parse a string-keyed stat map into a canonical table, applying the
/// percent normalizer
pub fn parse_stat_map(raw: &HashMap<String, f64>) -> Result<StatTable, CatalogError> {
    let mut table = StatTable::new();
    for (name, value) in raw {
        let stat: Stat = name.parse().map_err(CatalogError::from)?;
        table.add(stat, normalize_stat_value(stat, *value));
    }
    Ok(table)
}

/// Parse a list of element names
pub fn parse_elements(raw: &[String]) -> Result<Vec<Element>, CatalogError> {
    raw.iter()
        .map(|name| {
            name.parse::<Element>()
                .map_err(|_| CatalogError::UnknownElement(name.clone()))
        })
        .collect()
}

/// Parse an element-keyed fraction map (monster resistances)
pub fn parse_resistances(
    raw: &HashMap<String, f64>,
) -> Result<HashMap<Element, f64>, CatalogError> {
    raw.iter()
        .map(|(name, value)| {
            name.parse::<Element>()
                .map(|el| (el, *value))
                .map_err(|_| CatalogError::UnknownElement(name.clone()))
        })
        .collect()
}

/// Index a catalog slice by id
pub fn index_by_id(skills: Vec<SkillData>) -> HashMap<String, SkillData> {
    skills.into_iter().map(|s| (s.id.clone(), s)).collect()
}

/// Parse a JSON array of skills into an id-keyed map
pub fn skills_from_json(content: &str) -> Result<HashMap<String, SkillData>, CatalogError> {
    let skills: Vec<SkillData> = serde_json::from_str(content)?;
    Ok(index_by_id(skills))
}

/// Parse a JSON array of light cones into an id-keyed map
pub fn light_cones_from_json(
    content: &str,
) -> Result<HashMap<String, LightConeData>, CatalogError> {
    let cones: Vec<LightConeData> = serde_json::from_str(content)?;
    Ok(cones.into_iter().map(|c| (c.id.clone(), c)).collect())
}

/// Parse a JSON array of relics into an id-keyed map
pub fn relics_from_json(content: &str) -> Result<HashMap<String, RelicData>, CatalogError> {
    let relics: Vec<RelicData> = serde_json::from_str(content)?;
    Ok(relics.into_iter().map(|r| (r.id.clone(), r)).collect())
}

/// Parse a JSON array of monsters into an id-keyed map
pub fn monsters_from_json(content: &str) -> Result<HashMap<String, MonsterData>, CatalogError> {
    let monsters: Vec<MonsterData> = serde_json::from_str(content)?;
    Ok(monsters.into_iter().map(|m| (m.id.clone(), m)).collect())
}

/// Parse a JSON array of relic-set descriptions into a name-keyed map
pub fn relic_sets_from_json(
    content: &str,
) -> Result<HashMap<String, RelicSetData>, CatalogError> {
    let sets: Vec<RelicSetData> = serde_json::from_str(content)?;
    Ok(sets.into_iter().map(|s| (s.name.clone(), s)).collect())
}
