//! Example battle: a three-character party against two monsters.
//!
//! Assembles actors from an embedded catalog, runs the battle to a
//! terminal state, and prints the event log plus a damage report.

use sim_core::catalog;
use sim_core::prelude::*;
use std::collections::HashMap;
use std::error::Error;

const SEED: u64 = 0x5EED;
const MAX_ROUNDS: u32 = 10;

const SKILLS_JSON: &str = r#"[
    {"id": "110101", "name": "Windrider Bullet", "type": "Normal", "params": [[1.0]]},
    {"id": "110102", "name": "Combat Redeployment", "type": "BPSkill", "params": [[0.66, 0.0, 1.0, 0.0]]},
    {"id": "110103", "name": "The Belobog March", "type": "Ultra", "params": [[0.55, 0.16, 0.20, 2.0]]},
    {"id": "110104", "name": "Leading the Way", "type": "Talent", "params": [[0.30]]},
    {"id": "110201", "name": "Thwack", "type": "Normal", "params": [[1.0], [1.1]]},
    {"id": "110202", "name": "Sheathed Blade", "type": "BPSkill", "params": [[2.2, 0.25, 2.0]]},
    {"id": "110203", "name": "Butterfly Flurry", "type": "Ultra", "params": [[4.25]]},
    {"id": "110204", "name": "Resurgence", "type": "Talent", "params": [[0.40, 1.0]]},
    {"id": "110501", "name": "Behind the Kindness", "type": "Normal", "params": [[1.0]]},
    {"id": "110502", "name": "Love, Heal, and Choose", "type": "BPSkill", "params": [[0.105, 0.072, 2.0, 140.0, 56.0]]},
    {"id": "110503", "name": "Gift of Rebirth", "type": "Ultra", "params": [[0.138, 184.0]]},
    {"id": "8001001", "name": "Void Slash", "type": "Normal", "params": [[1.2]]},
    {"id": "8002001", "name": "Frost Spike", "type": "Normal", "params": [[1.1]]}
]"#;

const LIGHT_CONES_JSON: &str = r#"[
    {
        "id": "23001", "name": "In the Night",
        "stats": {"HP": 1058.0, "ATK": 582.0, "DEF": 463.0},
        "path": "hunt", "skill_id": "23001",
        "skill_params": [[0.18, 0.0, 0.06, 0.12, 6.0]]
    },
    {
        "id": "23003", "name": "But the Battle Isn't Over",
        "stats": {"HP": 1164.0, "ATK": 529.0, "DEF": 463.0},
        "path": "harmony", "skill_id": "23003",
        "skill_params": [[0.10, 0.30, 1.0]]
    },
    {
        "id": "21000", "name": "Post-Op Conversation",
        "stats": {"HP": 1058.0, "ATK": 423.0, "DEF": 330.0},
        "path": "abundance", "skill_id": "21000",
        "skill_params": [[0.08, 0.12]]
    }
]"#;

const RELICS_JSON: &str = r#"[
    {"id": "genius_head", "slot": "head", "set_name": "Genius of Brilliant Stars",
     "main_stat": {"stat": "HP", "value": 705.0},
     "sub_stats": [{"stat": "CRIT Rate", "value": 2.9}, {"stat": "SPD", "value": 4.0}]},
    {"id": "genius_hands", "slot": "hands", "set_name": "Genius of Brilliant Stars",
     "main_stat": {"stat": "ATK", "value": 352.0},
     "sub_stats": [{"stat": "CRIT DMG", "value": 11.6}]},
    {"id": "genius_body", "slot": "body", "set_name": "Genius of Brilliant Stars",
     "main_stat": {"stat": "CRIT Rate", "value": 5.8},
     "sub_stats": [{"stat": "ATK%", "value": 7.7}]},
    {"id": "genius_feet", "slot": "feet", "set_name": "Genius of Brilliant Stars",
     "main_stat": {"stat": "SPD", "value": 25.0},
     "sub_stats": [{"stat": "ATK%", "value": 4.3}]},
    {"id": "station_sphere", "slot": "planar_sphere", "set_name": "Space Sealing Station",
     "main_stat": {"stat": "Quantum DMG", "value": 38.8},
     "sub_stats": [{"stat": "ATK", "value": 43.0}]},
    {"id": "station_rope", "slot": "link_rope", "set_name": "Space Sealing Station",
     "main_stat": {"stat": "ATK%", "value": 43.2},
     "sub_stats": [{"stat": "Energy Regeneration Rate", "value": 5.0}]},

    {"id": "eagle_head", "slot": "head", "set_name": "Eagle of Twilight Line",
     "main_stat": {"stat": "HP", "value": 705.0},
     "sub_stats": [{"stat": "SPD", "value": 6.0}]},
    {"id": "eagle_hands", "slot": "hands", "set_name": "Eagle of Twilight Line",
     "main_stat": {"stat": "ATK", "value": 352.0},
     "sub_stats": [{"stat": "HP%", "value": 7.7}]},
    {"id": "eagle_body", "slot": "body", "set_name": "Eagle of Twilight Line",
     "main_stat": {"stat": "HP%", "value": 43.2},
     "sub_stats": [{"stat": "DEF%", "value": 10.8}]},
    {"id": "eagle_feet", "slot": "feet", "set_name": "Eagle of Twilight Line",
     "main_stat": {"stat": "SPD", "value": 25.0},
     "sub_stats": [{"stat": "Effect RES", "value": 7.7}]},
    {"id": "fleet_sphere_b", "slot": "planar_sphere", "set_name": "Fleet of the Ageless",
     "main_stat": {"stat": "Wind DMG", "value": 38.8},
     "sub_stats": [{"stat": "HP", "value": 112.0}]},
    {"id": "fleet_rope_b", "slot": "link_rope", "set_name": "Fleet of the Ageless",
     "main_stat": {"stat": "Energy Regeneration Rate", "value": 19.4},
     "sub_stats": [{"stat": "SPD", "value": 4.0}]},

    {"id": "passerby_head", "slot": "head", "set_name": "Passerby of Wandering Cloud",
     "main_stat": {"stat": "HP", "value": 705.0},
     "sub_stats": [{"stat": "DEF%", "value": 10.8}]},
    {"id": "passerby_hands", "slot": "hands", "set_name": "Passerby of Wandering Cloud",
     "main_stat": {"stat": "ATK", "value": 352.0},
     "sub_stats": [{"stat": "HP%", "value": 7.7}]},
    {"id": "passerby_body", "slot": "body", "set_name": "Passerby of Wandering Cloud",
     "main_stat": {"stat": "Outgoing Healing Boost", "value": 34.6},
     "sub_stats": [{"stat": "HP%", "value": 7.7}]},
    {"id": "passerby_feet", "slot": "feet", "set_name": "Passerby of Wandering Cloud",
     "main_stat": {"stat": "SPD", "value": 25.0},
     "sub_stats": [{"stat": "Effect RES", "value": 7.7}]},
    {"id": "fleet_sphere_n", "slot": "planar_sphere", "set_name": "Fleet of the Ageless",
     "main_stat": {"stat": "HP%", "value": 34.6},
     "sub_stats": [{"stat": "DEF", "value": 57.0}]},
    {"id": "fleet_rope_n", "slot": "link_rope", "set_name": "Fleet of the Ageless",
     "main_stat": {"stat": "Energy Regeneration Rate", "value": 19.4},
     "sub_stats": [{"stat": "HP", "value": 112.0}]}
]"#;

const MONSTERS_JSON: &str = r#"[
    {
        "id": "8001", "name": "Voidranger Trampler",
        "stats": {"HP": 42000.0, "ATK": 650.0, "DEF": 1000.0, "SPD": 110.0},
        "weaknesses": ["Quantum", "Wind"],
        "resistances": {"Physical": 0.2},
        "toughness": 100.0, "max_toughness": 100.0,
        "skills": ["8001001"]
    },
    {
        "id": "8002", "name": "Frostspawn",
        "stats": {"HP": 34000.0, "ATK": 560.0, "DEF": 900.0, "SPD": 95.0},
        "weaknesses": ["Physical", "Quantum"],
        "resistances": {"Ice": 0.4, "Wind": 0.2},
        "toughness": 100.0, "max_toughness": 100.0,
        "skills": ["8002001"]
    }
]"#;

const RELIC_SETS_JSON: &str = r#"[
    {"name": "Genius of Brilliant Stars",
     "two_piece": "Increases Quantum DMG by 10%.",
     "four_piece": "The wearer ignores 10% of the enemy's DEF, plus another 10% against Quantum-weak enemies."},
    {"name": "Space Sealing Station",
     "two_piece": "Increases the wearer's ATK by 12%. While SPD is 120 or higher, ATK increases by a further 12%."},
    {"name": "Eagle of Twilight Line",
     "two_piece": "Increases Wind DMG by 10%.",
     "four_piece": "After the wearer uses their Ultimate, their action is Advanced Forward by 25%."},
    {"name": "Fleet of the Ageless",
     "two_piece": "Increases the wearer's Max HP by 12%. While SPD is 120 or higher, all allies' ATK increases by 8%."},
    {"name": "Passerby of Wandering Cloud",
     "two_piece": "Increases Outgoing Healing by 10%.",
     "four_piece": "At the start of the battle, immediately regenerates 1 Skill Point."}
]"#;

fn main() -> Result<(), Box<dyn Error>> {
    let skills = catalog::skills_from_json(SKILLS_JSON)?;
    let light_cones = catalog::light_cones_from_json(LIGHT_CONES_JSON)?;
    let relics = catalog::relics_from_json(RELICS_JSON)?;
    let monsters = catalog::monsters_from_json(MONSTERS_JSON)?;
    let relic_sets = catalog::relic_sets_from_json(RELIC_SETS_JSON)?;

    let registry = SkillRegistry::new(skills)
        .with_routine("8001001", SkillRoutine::EnemyBasic(Element::Physical))
        .with_routine("8002001", SkillRoutine::EnemyBasic(Element::Ice));

    let mut seele = Actor::new("1102", "Seele", Side::Player, character_stats(1229.0, 640.0, 364.0, 115.0))
        .with_path(PathTag::Hunt)
        .with_max_energy(120.0)
        .with_skills(ids(&["110201", "110202", "110203", "110204"]))
        .with_ai(AiPolicy::SkillFirst)
        .with_kill_talent("110204")
        .with_light_cone(LightCone::from_data(&light_cones["23001"], 1)?)
        .with_traces(
            [(Stat::AtkPct, 0.28), (Stat::CritDmg, 0.24), (Stat::DefPct, 0.125)]
                .into_iter()
                .collect(),
        );
    equip(&mut seele, &relics, &[
        "genius_head", "genius_hands", "genius_body",
        "genius_feet", "station_sphere", "station_rope",
    ])?;

    let mut bronya = Actor::new("1101", "Bronya", Side::Player, character_stats(1241.0, 582.0, 533.0, 99.0))
        .with_path(PathTag::Harmony)
        .with_max_energy(120.0)
        .with_skills(ids(&["110101", "110102", "110103", "110104"]))
        .with_ai(AiPolicy::SkillFirst)
        .with_light_cone(LightCone::from_data(&light_cones["23003"], 1)?)
        .with_traces(
            [(Stat::ElementDmg(Element::Wind), 0.224), (Stat::CritDmg, 0.24)]
                .into_iter()
                .collect(),
        );
    equip(&mut bronya, &relics, &[
        "eagle_head", "eagle_hands", "eagle_body",
        "eagle_feet", "fleet_sphere_b", "fleet_rope_b",
    ])?;

    let mut natasha = Actor::new("1105", "Natasha", Side::Player, character_stats(1270.0, 476.0, 465.0, 98.0))
        .with_path(PathTag::Abundance)
        .with_max_energy(90.0)
        .with_skills(ids(&["110501", "110502", "110503"]))
        .with_ai(AiPolicy::Healer)
        .with_light_cone(LightCone::from_data(&light_cones["21000"], 1)?)
        .with_traces(
            [(Stat::HpPct, 0.28), (Stat::OutgoingHealingBoost, 0.10), (Stat::DefPct, 0.225)]
                .into_iter()
                .collect(),
        );
    equip(&mut natasha, &relics, &[
        "passerby_head", "passerby_hands", "passerby_body",
        "passerby_feet", "fleet_sphere_n", "fleet_rope_n",
    ])?;

    let trampler = Actor::from_monster(&monsters["8001"], Side::Enemy)?;
    let frostspawn = Actor::from_monster(&monsters["8002"], Side::Enemy)?;

    let mut battle = Battle::new(
        vec![seele, bronya, natasha, trampler, frostspawn],
        registry,
        SEED,
    )?;

    print_lineup(&battle, &relic_sets);
    let outcome = battle.run(MAX_ROUNDS);
    print_events(&battle);
    print_report(&battle, outcome);
    Ok(())
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn character_stats(hp: f64, atk: f64, def: f64, spd: f64) -> StatTable {
    [
        (Stat::Hp, hp),
        (Stat::Atk, atk),
        (Stat::Def, def),
        (Stat::Spd, spd),
        (Stat::CritRate, 0.05),
        (Stat::CritDmg, 0.50),
    ]
    .into_iter()
    .collect()
}

fn equip(
    actor: &mut Actor,
    relics: &HashMap<String, RelicData>,
    piece_ids: &[&str],
) -> Result<(), CatalogError> {
    for id in piece_ids {
        actor.equip_relic(Relic::from_data(&relics[*id])?)?;
    }
    Ok(())
}

fn print_lineup(battle: &Battle, relic_sets: &HashMap<String, RelicSetData>) {
    println!("{}", "=".repeat(64));
    println!("  Lineup");
    println!("{}", "=".repeat(64));
    for actor in battle.actors() {
        let stats = battle.current_stats(actor.id, false);
        println!(
            "  [{}] {:<12} HP {:>6.0}  ATK {:>6.1}  SPD {:>5.1}  CRIT {:.1}%/{:.1}%",
            actor.side,
            actor.name,
            actor.hp,
            stats.get(Stat::Atk),
            stats.get(Stat::Spd),
            stats.get(Stat::CritRate) * 100.0,
            stats.get(Stat::CritDmg) * 100.0,
        );
        if let Some(lc) = &actor.light_cone {
            println!("       cone: {}", lc.name);
        }
        for (set, pieces) in &actor.set_skills {
            let description = relic_sets
                .get(set.set_name())
                .map(|data| {
                    if *pieces >= 4 && !data.four_piece.is_empty() {
                        data.four_piece.as_str()
                    } else {
                        data.two_piece.as_str()
                    }
                })
                .unwrap_or("");
            println!("       set {}pc: {} - {}", pieces, set.set_name(), description);
        }
    }
    println!();
}

fn print_events(battle: &Battle) {
    for event in battle.events() {
        match event {
            BattleEvent::RoundStarted { round, pool } => {
                println!("\n==== Round {} (action value {:.0}) ====", round, pool);
            }
            BattleEvent::TurnStarted { name, extra_turn, .. } => {
                if *extra_turn {
                    println!("-- {} acts again (extra turn)", name);
                } else {
                    println!("-- {} acts", name);
                }
            }
            BattleEvent::TurnForfeited { name, reason, .. } => {
                println!("   {} forfeits the turn ({})", name, reason);
            }
            BattleEvent::SkillFallback { name, .. } => {
                println!("   {} is out of skill points and falls back to a basic attack", name);
            }
            BattleEvent::SkillUsed {
                name,
                skill_name,
                skill_type,
                preempted,
                ..
            } => {
                let lead = if *preempted { "!! instant" } else { "   uses" };
                println!("{} {} [{}] ({})", lead, name, skill_name, skill_type);
            }
            BattleEvent::DamageDealt {
                target_name,
                amount,
                crit,
                skill_type,
                target_hp,
                ..
            } => {
                let tag = if *crit { " CRIT" } else { "" };
                println!(
                    "     > {:.1}{} {} damage to {} (HP {:.0})",
                    amount, tag, skill_type, target_name, target_hp
                );
            }
            BattleEvent::Healed {
                target_name,
                amount,
                target_hp,
                ..
            } => {
                println!("     + {} healed for {:.1} (HP {:.0})", target_name, amount, target_hp);
            }
            BattleEvent::BuffApplied {
                target_name,
                buff,
                duration,
                refreshed,
                ..
            } => {
                let span = if *duration < 0 {
                    "permanent".to_string()
                } else {
                    format!("{} rounds", duration)
                };
                let verb = if *refreshed { "refreshed" } else { "gains" };
                println!("     * {} {} '{}' ({})", target_name, verb, buff, span);
            }
            BattleEvent::BuffExpired { buff, .. } => {
                println!("     * '{}' wore off", buff);
            }
            BattleEvent::ToughnessBroken { target_name, element, .. } => {
                println!("     ! {} is broken by {}", target_name, element);
            }
            BattleEvent::ActorDefeated { name, .. } => {
                println!("     x {} is defeated", name);
            }
            BattleEvent::BattleEnded { winner, rounds } => match winner {
                Some(side) => println!("\n==== {} side wins after {} rounds ====", side, rounds),
                None => println!("\n==== draw after {} rounds ====", rounds),
            },
            BattleEvent::Warning { message } => {
                println!("     warning: {}", message);
            }
            _ => {}
        }
    }
}

fn print_report(battle: &Battle, outcome: BattleOutcome) {
    println!("\n{}", "=".repeat(64));
    println!("  Damage report (winner: {:?})", outcome.winner);
    println!("{}", "=".repeat(64));
    let summary = damage_by_attacker(battle.events());
    let mut rows: Vec<_> = summary.into_iter().collect();
    rows.sort_by(|a, b| b.1.total.partial_cmp(&a.1.total).unwrap_or(std::cmp::Ordering::Equal));
    for (id, stats) in rows {
        println!(
            "  {:<12} total {:>9.1}  hits {:>3}  avg {:>8.1}  max {:>8.1}  crit {:>5.1}%",
            battle.actor(id).name,
            stats.total,
            stats.hits,
            stats.average(),
            stats.max,
            stats.crit_rate() * 100.0,
        );
    }
}
