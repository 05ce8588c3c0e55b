//! sim_core - Deterministic turn-based combat simulation engine
//!
//! This library provides:
//! - Battle: the action-value scheduler driving speed-ordered turns,
//!   instant-ultimate preemption, and extra turns
//! - Stat aggregation: layered base/percent/flat/dynamic computation
//!   with a recursion guard for closure-valued buffs
//! - Effect resolution: skills emit typed effects (damage, buffs,
//!   healing, progress boosts, extra turns) executed in emission order
//! - Equipment: light cones and relic sets installing event hooks

pub mod actor;
pub mod ai;
pub mod battle;
pub mod buff;
pub mod catalog;
pub mod config;
pub mod damage;
pub mod effect;
pub mod equipment;
pub mod event;
pub mod heal;
pub mod prelude;
pub mod skill;
pub mod stat;
pub mod types;

// Re-export core types for convenience
pub use actor::Actor;
pub use ai::AiPolicy;
pub use battle::{Battle, BattleError, BattleOutcome};
pub use buff::{Buff, BuffList, StatQuery, TurnStartHeal};
pub use catalog::{CatalogError, LightConeData, MonsterData, RelicData, RelicSetData, SkillData};
pub use config::EngineConstants;
pub use damage::{DamagePacket, DamagePreview};
pub use effect::{BoostTiming, Effect};
pub use equipment::{LightCone, LightConeSkill, Relic, RelicSetSkill, RelicSlot};
pub use event::{BattleEvent, DamageSummary};
pub use skill::{SkillRegistry, SkillRoutine, TargetRule};
pub use stat::{Stat, StatTable};
pub use types::{ActorId, Element, PathTag, Side, SkillType};
