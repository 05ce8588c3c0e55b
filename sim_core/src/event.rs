//! The ordered battle event log.
//!
//! Every observable state change appends one event: actor, event kind,
//! numeric delta, and the resulting value. Downstream consumers (the
//! example runner, tests) format or aggregate these; the engine itself
//! never prints.

use crate::effect::BoostTiming;
use crate::types::{ActorId, Element, Side, SkillType};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BattleEvent {
    RoundStarted {
        round: u32,
        pool: f64,
    },
    TurnStarted {
        actor: ActorId,
        name: String,
        extra_turn: bool,
    },
    TurnForfeited {
        actor: ActorId,
        name: String,
        reason: String,
    },
    SkillFallback {
        actor: ActorId,
        name: String,
    },
    SkillUsed {
        actor: ActorId,
        name: String,
        skill_id: String,
        skill_name: String,
        skill_type: SkillType,
        preempted: bool,
    },
    DamageDealt {
        attacker: ActorId,
        target: ActorId,
        target_name: String,
        amount: f64,
        element: Option<Element>,
        skill_type: SkillType,
        crit: bool,
        target_hp: f64,
    },
    ToughnessReduced {
        target: ActorId,
        amount: f64,
        toughness: f64,
    },
    ToughnessBroken {
        target: ActorId,
        target_name: String,
        element: Element,
    },
    ToughnessReset {
        target: ActorId,
        toughness: f64,
    },
    Healed {
        healer: ActorId,
        target: ActorId,
        target_name: String,
        amount: f64,
        target_hp: f64,
    },
    BuffApplied {
        target: ActorId,
        target_name: String,
        buff: String,
        duration: i32,
        refreshed: bool,
    },
    BuffExpired {
        target: ActorId,
        buff: String,
    },
    EnergyGained {
        actor: ActorId,
        amount: f64,
        energy: f64,
        source: String,
    },
    EnergyConsumed {
        actor: ActorId,
        amount: f64,
        energy: f64,
    },
    SkillPointSpent {
        side: Side,
        remaining: u32,
    },
    SkillPointGained {
        side: Side,
        remaining: u32,
    },
    ProgressBoosted {
        target: ActorId,
        amount: f64,
        progress: f64,
        timing: BoostTiming,
    },
    ExtraTurnGranted {
        actor: ActorId,
        name: String,
    },
    ActorDefeated {
        actor: ActorId,
        name: String,
    },
    BattleEnded {
        winner: Option<Side>,
        rounds: u32,
    },
    Warning {
        message: String,
    },
}

/// Per-attacker damage aggregation computed from the event log
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DamageSummary {
    pub total: f64,
    pub hits: usize,
    pub crits: usize,
    pub max: f64,
}

impl DamageSummary {
    pub fn average(&self) -> f64 {
        if self.hits == 0 {
            0.0
        } else {
            self.total / self.hits as f64
        }
    }

    pub fn crit_rate(&self) -> f64 {
        if self.hits == 0 {
            0.0
        } else {
            self.crits as f64 / self.hits as f64
        }
    }
}

/// Aggregate damage dealt per attacker from an event log
pub fn damage_by_attacker(events: &[BattleEvent]) -> HashMap<ActorId, DamageSummary> {
    let mut out: HashMap<ActorId, DamageSummary> = HashMap::new();
    for event in events {
        if let BattleEvent::DamageDealt {
            attacker,
            amount,
            crit,
            ..
        } = event
        {
            let entry = out.entry(*attacker).or_default();
            entry.total += amount;
            entry.hits += 1;
            if *crit {
                entry.crits += 1;
            }
            if *amount > entry.max {
                entry.max = *amount;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(attacker: usize, amount: f64, crit: bool) -> BattleEvent {
        BattleEvent::DamageDealt {
            attacker: ActorId(attacker),
            target: ActorId(9),
            target_name: "Dummy".to_string(),
            amount,
            element: Some(Element::Quantum),
            skill_type: SkillType::Normal,
            crit,
            target_hp: 0.0,
        }
    }

    #[test]
    fn test_damage_summary() {
        let events = vec![hit(0, 100.0, false), hit(0, 300.0, true), hit(1, 50.0, false)];
        let summary = damage_by_attacker(&events);

        let seele = summary[&ActorId(0)];
        assert!((seele.total - 400.0).abs() < 1e-9);
        assert_eq!(seele.hits, 2);
        assert_eq!(seele.crits, 1);
        assert!((seele.max - 300.0).abs() < 1e-9);
        assert!((seele.average() - 200.0).abs() < 1e-9);
        assert!((seele.crit_rate() - 0.5).abs() < 1e-9);

        assert_eq!(summary[&ActorId(1)].hits, 1);
    }
}
