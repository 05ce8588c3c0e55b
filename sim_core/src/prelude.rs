//! Prelude module for convenient imports
//!
//! ```rust
//! use sim_core::prelude::*;
//! ```

// Core types
pub use crate::actor::Actor;
pub use crate::battle::{Battle, BattleError, BattleOutcome};
pub use crate::buff::{Buff, BuffList, StatQuery, TurnStartHeal};
pub use crate::types::{ActorId, Element, PathTag, Side, SkillType};

// Stats
pub use crate::stat::{Stat, StatTable};

// Effects and skills
pub use crate::effect::{BoostTiming, Effect};
pub use crate::skill::{SkillRegistry, SkillRoutine, TargetRule};

// Damage and healing
pub use crate::damage::{attack_side, defense_side, preview, CritMode, DamagePacket};
pub use crate::heal::calculate_final_heal;

// Equipment
pub use crate::equipment::{LightCone, LightConeSkill, Relic, RelicSetSkill, RelicSlot};

// Decision policies
pub use crate::ai::AiPolicy;

// Events
pub use crate::event::{damage_by_attacker, BattleEvent, DamageSummary};

// Catalog and configuration
pub use crate::catalog::{
    CatalogError, LightConeData, MonsterData, RelicData, RelicSetData, SkillData,
};
pub use crate::config::EngineConstants;
