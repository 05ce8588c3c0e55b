//! Core types shared across the simulation engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Damage/weakness element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Physical,
    Fire,
    Ice,
    Lightning,
    Wind,
    Quantum,
    Imaginary,
}

impl Element {
    /// Get all elements
    pub fn all() -> &'static [Element] {
        &[
            Element::Physical,
            Element::Fire,
            Element::Ice,
            Element::Lightning,
            Element::Wind,
            Element::Quantum,
            Element::Imaginary,
        ]
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Element::Physical => "Physical",
            Element::Fire => "Fire",
            Element::Ice => "Ice",
            Element::Lightning => "Lightning",
            Element::Wind => "Wind",
            Element::Quantum => "Quantum",
            Element::Imaginary => "Imaginary",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Element {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "physical" => Ok(Element::Physical),
            "fire" => Ok(Element::Fire),
            "ice" => Ok(Element::Ice),
            "lightning" | "thunder" => Ok(Element::Lightning),
            "wind" => Ok(Element::Wind),
            "quantum" => Ok(Element::Quantum),
            "imaginary" => Ok(Element::Imaginary),
            _ => Err(()),
        }
    }
}

/// Category of a skill.
///
/// The first seven variants are the catalog-facing types; `HealOverTime`
/// and `Break` are engine-internal types used to route periodic healing
/// and toughness-break damage through the same pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillType {
    Normal,
    BPSkill,
    Ultra,
    Talent,
    Technique,
    MazeNormal,
    Maze,
    HealOverTime,
    Break,
}

impl SkillType {
    /// Whether this type occupies an actor's turn when chosen by the AI
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SkillType::Normal | SkillType::BPSkill | SkillType::Ultra
        )
    }
}

impl fmt::Display for SkillType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SkillType::Normal => "Normal",
            SkillType::BPSkill => "BPSkill",
            SkillType::Ultra => "Ultra",
            SkillType::Talent => "Talent",
            SkillType::Technique => "Technique",
            SkillType::MazeNormal => "MazeNormal",
            SkillType::Maze => "Maze",
            SkillType::HealOverTime => "HealOverTime",
            SkillType::Break => "Break",
        };
        write!(f, "{}", name)
    }
}

/// Team tag of a battle participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    /// The opposing side
    pub fn opponent(&self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player => write!(f, "player"),
            Side::Enemy => write!(f, "enemy"),
        }
    }
}

/// Index-based handle to an actor inside a [`crate::battle::Battle`].
///
/// Dynamic buff closures capture these instead of references so that a
/// closure can look an actor up through whatever `&Battle` it is handed
/// at evaluation time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ActorId(pub usize);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Character archetype tag; gates some light-cone passives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathTag {
    Destruction,
    Hunt,
    Erudition,
    Harmony,
    Nihility,
    Preservation,
    Abundance,
}

impl FromStr for PathTag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "destruction" => Ok(PathTag::Destruction),
            "hunt" | "the hunt" => Ok(PathTag::Hunt),
            "erudition" => Ok(PathTag::Erudition),
            "harmony" => Ok(PathTag::Harmony),
            "nihility" => Ok(PathTag::Nihility),
            "preservation" => Ok(PathTag::Preservation),
            "abundance" => Ok(PathTag::Abundance),
            _ => Err(()),
        }
    }
}
