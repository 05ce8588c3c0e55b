//! Named stats: canonical keys, alias resolution, and the value table

pub mod aggregator;

use crate::types::Element;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a catalog stat name cannot be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized stat name `{0}`")]
pub struct UnknownStat(pub String);

/// Canonical stat key.
///
/// Catalog data refers to stats by name in several spellings
/// (`CRIT_RATE`, `CRIT Rate`, `Wind DMG%`, `Wind DMG Boost`); all of them
/// collapse onto one variant through [`Stat::from_str`]. [`fmt::Display`]
/// renders the canonical spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    Hp,
    Atk,
    Def,
    Spd,
    HpPct,
    AtkPct,
    DefPct,
    SpdPct,
    CritRate,
    CritDmg,
    BreakEffect,
    EffectHitRate,
    EffectRes,
    EnergyRegenRate,
    OutgoingHealingBoost,
    IncomingHealingBoost,
    DefIgnore,
    ElementDmg(Element),
    UltimateDmg,
    FollowUpDmg,
    BreakDmg,
}

impl Stat {
    /// Whether this is one of the four primary base stats (HP/ATK/DEF/SPD)
    pub fn is_primary(&self) -> bool {
        matches!(self, Stat::Hp | Stat::Atk | Stat::Def | Stat::Spd)
    }

    /// Whether this is a primary percent stat (HP%/ATK%/DEF%/SPD%)
    pub fn is_primary_percent(&self) -> bool {
        matches!(
            self,
            Stat::HpPct | Stat::AtkPct | Stat::DefPct | Stat::SpdPct
        )
    }

    /// The primary base stat a percent key multiplies, if any
    pub fn percent_target(&self) -> Option<Stat> {
        match self {
            Stat::HpPct => Some(Stat::Hp),
            Stat::AtkPct => Some(Stat::Atk),
            Stat::DefPct => Some(Stat::Def),
            Stat::SpdPct => Some(Stat::Spd),
            _ => None,
        }
    }

    /// The four (base, percent) primary pairs
    pub fn primary_pairs() -> &'static [(Stat, Stat)] {
        &[
            (Stat::Hp, Stat::HpPct),
            (Stat::Atk, Stat::AtkPct),
            (Stat::Def, Stat::DefPct),
            (Stat::Spd, Stat::SpdPct),
        ]
    }

    /// Whether catalog values for this key are fractions of one.
    ///
    /// Catalogs sometimes store these as percentages greater than one;
    /// the normalizer in [`crate::catalog`] divides those by 100.
    pub fn is_percent_typed(&self) -> bool {
        !self.is_primary()
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stat::Hp => write!(f, "HP"),
            Stat::Atk => write!(f, "ATK"),
            Stat::Def => write!(f, "DEF"),
            Stat::Spd => write!(f, "SPD"),
            Stat::HpPct => write!(f, "HP%"),
            Stat::AtkPct => write!(f, "ATK%"),
            Stat::DefPct => write!(f, "DEF%"),
            Stat::SpdPct => write!(f, "SPD%"),
            Stat::CritRate => write!(f, "CRIT Rate"),
            Stat::CritDmg => write!(f, "CRIT DMG"),
            Stat::BreakEffect => write!(f, "Break Effect"),
            Stat::EffectHitRate => write!(f, "Effect Hit Rate"),
            Stat::EffectRes => write!(f, "Effect RES"),
            Stat::EnergyRegenRate => write!(f, "Energy Regeneration Rate"),
            Stat::OutgoingHealingBoost => write!(f, "Outgoing Healing Boost"),
            Stat::IncomingHealingBoost => write!(f, "Incoming Healing Boost"),
            Stat::DefIgnore => write!(f, "DEF Ignore %"),
            Stat::ElementDmg(el) => write!(f, "{} DMG", el),
            Stat::UltimateDmg => write!(f, "Ultimate DMG"),
            Stat::FollowUpDmg => write!(f, "Follow-up Attack DMG"),
            Stat::BreakDmg => write!(f, "Break DMG"),
        }
    }
}

impl FromStr for Stat {
    type Err = UnknownStat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let stat = match name {
            "HP" => Stat::Hp,
            "ATK" => Stat::Atk,
            "DEF" => Stat::Def,
            "SPD" => Stat::Spd,
            "HP%" => Stat::HpPct,
            "ATK%" => Stat::AtkPct,
            "DEF%" => Stat::DefPct,
            "SPD%" => Stat::SpdPct,
            "CRIT Rate" | "CRIT_RATE" => Stat::CritRate,
            "CRIT DMG" | "CRIT_DMG" => Stat::CritDmg,
            "Break Effect" | "BREAK_EFFECT" => Stat::BreakEffect,
            "Effect Hit Rate" | "EFFECT_HIT_RATE" => Stat::EffectHitRate,
            "Effect RES" | "EFFECT_RES" => Stat::EffectRes,
            "Energy Regeneration Rate" | "ENERGY_REGEN_RATE" => Stat::EnergyRegenRate,
            "Outgoing Healing Boost" | "OUTGOING_HEALING" => Stat::OutgoingHealingBoost,
            "Incoming Healing Boost" | "INCOMING_HEALING" => Stat::IncomingHealingBoost,
            "DEF Ignore %" | "DEF_IGNORE" => Stat::DefIgnore,
            "Ultimate DMG" | "ULTIMATE_DMG" => Stat::UltimateDmg,
            "Follow-up Attack DMG" | "Follow-up DMG" | "FOLLOW_UP_DMG" => Stat::FollowUpDmg,
            "Break DMG" | "BREAK_DMG" => Stat::BreakDmg,
            other => return parse_element_dmg(other).ok_or_else(|| UnknownStat(s.to_string())),
        };
        Ok(stat)
    }
}

/// Resolve `<Element> DMG`, `<ELEMENT>_DMG`, `<Element> DMG%` and
/// `<Element> DMG Boost` spellings onto the canonical element-DMG key.
fn parse_element_dmg(name: &str) -> Option<Stat> {
    let trimmed = name
        .strip_suffix(" DMG Boost")
        .or_else(|| name.strip_suffix(" DMG%"))
        .or_else(|| name.strip_suffix(" DMG"))
        .or_else(|| name.strip_suffix("_DMG"))?;
    trimmed.parse::<Element>().ok().map(Stat::ElementDmg)
}

/// A named-stat mapping with zero defaults.
///
/// Missing keys read as `0.0`, matching the additive semantics of every
/// layer in the aggregator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatTable {
    values: HashMap<Stat, f64>,
}

impl StatTable {
    pub fn new() -> Self {
        StatTable::default()
    }

    /// Get the value for a stat, defaulting to zero
    pub fn get(&self, stat: Stat) -> f64 {
        self.values.get(&stat).copied().unwrap_or(0.0)
    }

    /// Overwrite the value for a stat
    pub fn set(&mut self, stat: Stat, value: f64) {
        self.values.insert(stat, value);
    }

    /// Add a delta to a stat
    pub fn add(&mut self, stat: Stat, delta: f64) {
        *self.values.entry(stat).or_insert(0.0) += delta;
    }

    /// Add every entry of another table
    pub fn merge(&mut self, other: &StatTable) {
        for (stat, value) in other.iter() {
            self.add(stat, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, f64)> + '_ {
        self.values.iter().map(|(s, v)| (*s, *v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl FromIterator<(Stat, f64)> for StatTable {
    fn from_iter<T: IntoIterator<Item = (Stat, f64)>>(iter: T) -> Self {
        let mut table = StatTable::new();
        for (stat, value) in iter {
            table.add(stat, value);
        }
        table
    }
}
