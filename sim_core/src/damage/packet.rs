//! DamagePacket - the attacker-side result handed to defense resolution

use crate::types::{Element, SkillType};
use serde::Serialize;

/// Attacker-side damage computation with its breakdown.
///
/// `theoretical = base_damage * (1 + damage_bonus) * crit_multiplier`;
/// the defense side turns this into final damage.
#[derive(Debug, Clone, Serialize)]
pub struct DamagePacket {
    /// `attacker ATK * skill multiplier`
    pub base_damage: f64,
    /// Sum of element, skill-type, and buff damage bonuses
    pub damage_bonus: f64,
    /// Sum of the attacker's element penetration
    pub penetration: f64,
    pub is_crit: bool,
    pub crit_multiplier: f64,
    pub theoretical: f64,
    pub element: Option<Element>,
    pub skill_type: SkillType,
}
