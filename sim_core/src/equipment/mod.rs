//! Equipment: light cones, relic pieces, and their catalog assembly

mod light_cone;
mod relic_set;

pub use light_cone::LightConeSkill;
pub use relic_set::RelicSetSkill;

use crate::catalog::{CatalogError, LightConeData, RelicData};
use crate::stat::{Stat, StatTable};
use crate::types::PathTag;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The six relic slots; at most one relic per slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelicSlot {
    Head,
    Hands,
    Body,
    Feet,
    PlanarSphere,
    LinkRope,
}

impl RelicSlot {
    /// Get all relic slots
    pub fn all() -> &'static [RelicSlot] {
        &[
            RelicSlot::Head,
            RelicSlot::Hands,
            RelicSlot::Body,
            RelicSlot::Feet,
            RelicSlot::PlanarSphere,
            RelicSlot::LinkRope,
        ]
    }
}

impl FromStr for RelicSlot {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "head" => Ok(RelicSlot::Head),
            "hands" => Ok(RelicSlot::Hands),
            "body" => Ok(RelicSlot::Body),
            "feet" => Ok(RelicSlot::Feet),
            "planar_sphere" | "planar sphere" | "sphere" => Ok(RelicSlot::PlanarSphere),
            "link_rope" | "link rope" | "rope" => Ok(RelicSlot::LinkRope),
            _ => Err(()),
        }
    }
}

/// A single relic piece: slot, set identity, one main stat, up to four
/// sub-stats
#[derive(Debug, Clone)]
pub struct Relic {
    pub id: String,
    pub slot: RelicSlot,
    pub set_name: String,
    pub main_stat: (Stat, f64),
    pub sub_stats: Vec<(Stat, f64)>,
}

impl Relic {
    /// Build a relic from catalog data, normalizing percent values
    pub fn from_data(data: &RelicData) -> Result<Self, CatalogError> {
        let slot = data
            .slot
            .parse::<RelicSlot>()
            .map_err(|_| CatalogError::UnknownSlot(data.slot.clone()))?;
        let main = parse_roll(&data.main_stat.stat, data.main_stat.value)?;
        let subs = data
            .sub_stats
            .iter()
            .map(|s| parse_roll(&s.stat, s.value))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Relic {
            id: data.id.clone(),
            slot,
            set_name: data.set_name.clone(),
            main_stat: main,
            sub_stats: subs,
        })
    }

    /// All stat rolls on this piece, main stat first
    pub fn stats(&self) -> impl Iterator<Item = (Stat, f64)> + '_ {
        std::iter::once(self.main_stat).chain(self.sub_stats.iter().copied())
    }
}

fn parse_roll(name: &str, value: f64) -> Result<(Stat, f64), CatalogError> {
    let stat: Stat = name.parse().map_err(CatalogError::from)?;
    Ok((stat, crate::catalog::normalize_stat_value(stat, value)))
}

/// A light cone: static stat grants plus an optional skill that installs
/// event hooks
#[derive(Debug, Clone)]
pub struct LightCone {
    pub id: String,
    pub name: String,
    pub stats: StatTable,
    pub path: Option<PathTag>,
    pub skill: Option<LightConeSkill>,
}

impl LightCone {
    /// Build a light cone from catalog data at a given skill level
    pub fn from_data(data: &LightConeData, level: usize) -> Result<Self, CatalogError> {
        let stats = crate::catalog::parse_stat_map(&data.stats)?;
        let path = data.path.as_deref().and_then(|p| p.parse::<PathTag>().ok());
        let skill = match &data.skill_id {
            Some(skill_id) => {
                LightConeSkill::from_catalog(skill_id, &data.skill_params, level)?
            }
            None => None,
        };
        Ok(LightCone {
            id: data.id.clone(),
            name: data.name.clone(),
            stats,
            path,
            skill,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RelicStatData;

    #[test]
    fn test_slot_parsing() {
        assert_eq!("head".parse::<RelicSlot>(), Ok(RelicSlot::Head));
        assert_eq!("Planar Sphere".parse::<RelicSlot>(), Ok(RelicSlot::PlanarSphere));
        assert_eq!("rope".parse::<RelicSlot>(), Ok(RelicSlot::LinkRope));
        assert!("weapon".parse::<RelicSlot>().is_err());
    }

    #[test]
    fn test_relic_from_data_normalizes_percents() {
        let data = RelicData {
            id: "r1".to_string(),
            slot: "body".to_string(),
            set_name: "Space Sealing Station".to_string(),
            main_stat: RelicStatData {
                stat: "CRIT Rate".to_string(),
                value: 5.8,
            },
            sub_stats: vec![RelicStatData {
                stat: "ATK".to_string(),
                value: 43.0,
            }],
        };
        let relic = Relic::from_data(&data).unwrap();
        assert_eq!(relic.slot, RelicSlot::Body);
        assert!((relic.main_stat.1 - 0.058).abs() < 1e-9);
        assert!((relic.sub_stats[0].1 - 43.0).abs() < 1e-9);
    }

    #[test]
    fn test_relic_rejects_unknown_slot() {
        let data = RelicData {
            id: "r1".to_string(),
            slot: "offhand".to_string(),
            set_name: "Fleet of the Ageless".to_string(),
            main_stat: RelicStatData {
                stat: "HP".to_string(),
                value: 705.0,
            },
            sub_stats: vec![],
        };
        assert!(matches!(
            Relic::from_data(&data),
            Err(CatalogError::UnknownSlot(_))
        ));
    }
}
