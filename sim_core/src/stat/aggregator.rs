//! Layered stat aggregation: base -> percent -> flat -> dynamic buffs.
//!
//! The final value of each primary stat is
//! `base * (1 + percent) + flat`; every other key is additive. Dynamic
//! buff closures are evaluated last and may themselves query stats; a
//! reentrant query runs with `recursive_guard = true` and returns the
//! pre-dynamic snapshot, which keeps evaluation finite.

use crate::actor::Actor;
use crate::battle::Battle;
use crate::buff::{BuffList, StatQuery};
use crate::stat::{Stat, StatTable};
use crate::types::ActorId;

/// The three equipment-derived layers feeding stat finalization
#[derive(Debug, Clone, Default)]
pub struct Layers {
    /// Primary base values plus all additive secondary contributions
    pub base: StatTable,
    /// Primary percent contributions (HP%/ATK%/DEF%/SPD%)
    pub percent: StatTable,
    /// Flat primary contributions from relics and traces; bypass percents
    pub flat: StatTable,
}

/// Collect the equipment layers for an actor: character base stats, light
/// cone (static and, on a path match, skill base stats), relic main and
/// sub stats, traces, and relic-set base stats.
pub fn equipped_layers(actor: &Actor) -> Layers {
    let mut layers = Layers {
        base: actor.base_stats.clone(),
        ..Layers::default()
    };

    if let Some(lc) = &actor.light_cone {
        for (stat, value) in lc.stats.iter() {
            route_additive(&mut layers, stat, value);
        }
        let path_matches = actor.path.is_some() && actor.path == lc.path;
        if path_matches {
            if let Some(skill) = &lc.skill {
                for (stat, value) in skill.base_stats().iter() {
                    route_additive(&mut layers, stat, value);
                }
            }
        }
    }

    for relic in &actor.relics {
        for (stat, value) in relic.stats() {
            route_gear(&mut layers, stat, value);
        }
    }

    for (stat, value) in actor.traces.iter() {
        route_gear(&mut layers, stat, value);
    }

    for (set_skill, pieces) in &actor.set_skills {
        for (stat, value) in set_skill.base_stats(*pieces).iter() {
            route_additive(&mut layers, stat, value);
        }
    }

    layers
}

/// Light-cone/set contribution: percent primaries scale the base layer,
/// everything else (including flat primaries) joins the base layer.
fn route_additive(layers: &mut Layers, stat: Stat, value: f64) {
    if stat.is_primary_percent() {
        layers.percent.add(stat, value);
    } else {
        layers.base.add(stat, value);
    }
}

/// Relic/trace contribution: flat primaries bypass the percent layer.
fn route_gear(layers: &mut Layers, stat: Stat, value: f64) {
    if stat.is_primary() {
        layers.flat.add(stat, value);
    } else if stat.is_primary_percent() {
        layers.percent.add(stat, value);
    } else {
        layers.base.add(stat, value);
    }
}

/// Finalize a stat table from equipment layers and active buffs.
///
/// Buffs' static contributions always apply. Dynamic closures run only
/// when `query` is present; a `None` query is the recursion-guarded
/// (pre-dynamic) evaluation.
pub fn finalize(layers: &Layers, buffs: &BuffList, query: Option<&StatQuery<'_>>) -> StatTable {
    let mut bonus = layers.percent.clone();

    for buff in buffs.iter() {
        bonus.merge(&buff.stat_bonus);
        if let (Some(q), Some(dynamic)) = (query, buff.dynamic_stat_bonus.as_ref()) {
            bonus.merge(&dynamic(q));
        }
    }

    let mut final_stats = layers.base.clone();
    for &(base_key, percent_key) in Stat::primary_pairs() {
        let value = layers.base.get(base_key) * (1.0 + bonus.get(percent_key))
            + layers.flat.get(base_key);
        final_stats.set(base_key, value);
    }

    for (stat, value) in bonus.iter() {
        if !stat.is_primary_percent() {
            final_stats.add(stat, value);
        }
    }

    final_stats
}

/// Compute the current stats of an actor inside a battle.
///
/// With `recursive_guard` set, dynamic buff closures are skipped and the
/// pre-dynamic snapshot is returned; this is what reentrant queries from
/// inside a dynamic closure receive.
pub fn current_stats(battle: &Battle, actor_id: ActorId, recursive_guard: bool) -> StatTable {
    let actor = battle.actor(actor_id);
    let layers = equipped_layers(actor);
    if recursive_guard {
        finalize(&layers, &actor.buffs, None)
    } else {
        let query = StatQuery {
            battle,
            owner: actor,
        };
        finalize(&layers, &actor.buffs, Some(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buff::Buff;
    use crate::stat::Stat;
    use crate::types::Element;

    fn base_table() -> StatTable {
        [
            (Stat::Hp, 1000.0),
            (Stat::Atk, 500.0),
            (Stat::Def, 400.0),
            (Stat::Spd, 100.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_primary_composition() {
        let layers = Layers {
            base: base_table(),
            percent: [(Stat::HpPct, 0.20), (Stat::AtkPct, 0.10)].into_iter().collect(),
            flat: [(Stat::Hp, 50.0)].into_iter().collect(),
        };
        let stats = finalize(&layers, &BuffList::new(), None);

        // HP = 1000 * (1 + 0.20) + 50
        assert!((stats.get(Stat::Hp) - 1250.0).abs() < 1e-9);
        assert!((stats.get(Stat::Atk) - 550.0).abs() < 1e-9);
        assert!((stats.get(Stat::Def) - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_secondary_stats_are_additive() {
        let layers = Layers {
            base: {
                let mut t = base_table();
                t.add(Stat::CritRate, 0.05);
                t
            },
            ..Layers::default()
        };
        let mut buffs = BuffList::new();
        buffs.add(Buff::new("Focus", 2).with_stat(Stat::CritRate, 0.12));

        let stats = finalize(&layers, &buffs, None);
        assert!((stats.get(Stat::CritRate) - 0.17).abs() < 1e-9);
    }

    #[test]
    fn test_static_buff_applies_under_guard() {
        let layers = Layers {
            base: base_table(),
            ..Layers::default()
        };
        let mut buffs = BuffList::new();
        buffs.add(Buff::new("SPD Boost", 2).with_stat(Stat::SpdPct, 0.10));

        // Guarded evaluation still sees the static +10% SPD.
        let stats = finalize(&layers, &buffs, None);
        assert!((stats.get(Stat::Spd) - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_element_dmg_contributions_share_a_key() {
        let layers = Layers {
            base: {
                let mut t = base_table();
                // One source spelled "Wind DMG%", another "Wind DMG Boost";
                // both parse to the same canonical key upstream.
                t.add("Wind DMG%".parse().unwrap(), 0.10);
                t.add("Wind DMG Boost".parse().unwrap(), 0.15);
                t
            },
            ..Layers::default()
        };
        let stats = finalize(&layers, &BuffList::new(), None);
        assert!((stats.get(Stat::ElementDmg(Element::Wind)) - 0.25).abs() < 1e-9);
    }
}
