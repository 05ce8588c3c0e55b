//! Typed effects emitted by skills and executed in emission order

use crate::buff::Buff;
use crate::types::{ActorId, Element, SkillType};
use serde::{Deserialize, Serialize};

/// When a progress boost lands relative to the target's turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoostTiming {
    /// Add to the current progress immediately, clamped to 1.0
    Immediate,
    /// Add to the progress the target carries into its next turn
    NextTurn,
    /// Accumulate and apply after the next scheduler advance
    Delayed,
}

/// One step of a skill's resolution.
///
/// Skills return an ordered list of these; the battle executes them in
/// emission order.
#[derive(Debug, Clone)]
pub enum Effect {
    Damage {
        targets: Vec<ActorId>,
        multiplier: f64,
        element: Option<Element>,
        skill_type: SkillType,
    },
    Buff {
        targets: Vec<ActorId>,
        buff: Buff,
    },
    Heal {
        targets: Vec<ActorId>,
        base_amount: f64,
    },
    ProgressBoost {
        target: ActorId,
        amount: f64,
        timing: BoostTiming,
    },
    ExtraTurn {
        target: ActorId,
    },
}
