//! End-to-end battle scenarios: scheduling, resource flow, toughness
//! break, dynamic equipment buffs, and extra-turn guards.

use sim_core::prelude::*;
use std::collections::HashMap;

fn stats(hp: f64, atk: f64, def: f64, spd: f64) -> StatTable {
    [
        (Stat::Hp, hp),
        (Stat::Atk, atk),
        (Stat::Def, def),
        (Stat::Spd, spd),
    ]
    .into_iter()
    .collect()
}

fn skill_data(id: &str, name: &str, skill_type: SkillType, params: Vec<Vec<f64>>) -> SkillData {
    SkillData {
        id: id.to_string(),
        name: name.to_string(),
        skill_type,
        description: String::new(),
        params,
    }
}

/// A registry of plain damage skills for scripted scenarios
fn scripted_registry(entries: &[(&str, SkillType, Element, f64)]) -> SkillRegistry {
    let mut skills: HashMap<String, SkillData> = HashMap::new();
    for (id, skill_type, _, multiplier) in entries {
        skills.insert(
            id.to_string(),
            skill_data(id, id, *skill_type, vec![vec![*multiplier]]),
        );
    }
    let mut registry = SkillRegistry::new(skills);
    for (id, _, element, _) in entries {
        registry = registry.with_routine(*id, SkillRoutine::EnemyBasic(*element));
    }
    registry
}

fn damage_events(battle: &Battle, attacker: ActorId) -> Vec<(f64, SkillType)> {
    battle
        .events()
        .iter()
        .filter_map(|e| match e {
            BattleEvent::DamageDealt {
                attacker: a,
                amount,
                skill_type,
                ..
            } if *a == attacker => Some((*amount, *skill_type)),
            _ => None,
        })
        .collect()
}

#[test]
fn solo_basic_attack_deals_flat_attack_damage() {
    // ATK 1000, multiplier 1.0, DEF 0, level 80, no resistance, no crit:
    // the hit lands for exactly 1000.
    let registry = scripted_registry(&[("basic", SkillType::Normal, Element::Physical, 1.0)]);
    let attacker = Actor::new("a", "Attacker", Side::Player, stats(4000.0, 1000.0, 0.0, 100.0))
        .with_skills(vec!["basic".to_string()]);
    let dummy = Actor::new("d", "Dummy", Side::Enemy, stats(100000.0, 10.0, 0.0, 10.0))
        .with_skills(vec!["basic".to_string()]);
    let mut battle = Battle::new(vec![attacker, dummy], registry, 42).unwrap();

    battle.run(1);

    let hits = damage_events(&battle, ActorId(0));
    assert!(!hits.is_empty());
    assert!((hits[0].0 - 1000.0).abs() < 1e-6);
}

#[test]
fn battle_skill_falls_back_to_basic_when_points_run_out() {
    let registry = scripted_registry(&[
        ("basic", SkillType::Normal, Element::Physical, 1.0),
        ("bp", SkillType::BPSkill, Element::Physical, 1.5),
    ]);
    let first = Actor::new("p1", "First", Side::Player, stats(4000.0, 200.0, 0.0, 100.0))
        .with_skills(vec!["basic".to_string(), "bp".to_string()])
        .with_ai(AiPolicy::SkillFirst);
    let second = Actor::new("p2", "Second", Side::Player, stats(4000.0, 200.0, 0.0, 95.0))
        .with_skills(vec!["basic".to_string(), "bp".to_string()])
        .with_ai(AiPolicy::SkillFirst);
    let wall = Actor::new("w", "Wall", Side::Enemy, stats(1e9, 1.0, 0.0, 10.0))
        .with_skills(vec!["basic".to_string()]);
    let mut battle = Battle::new(vec![first, second, wall], registry, 42).unwrap();
    battle.set_skill_points(Side::Player, 1);

    battle.run(1);

    // The faster teammate spent the only point; the slower one fell back
    // to a basic attack and earned one back.
    assert!(battle
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::SkillFallback { actor: ActorId(1), .. })));
    assert_eq!(battle.skill_points(Side::Player), 1);
}

#[test]
fn full_energy_ultimate_preempts_the_round() {
    let registry = scripted_registry(&[
        ("basic", SkillType::Normal, Element::Physical, 1.0),
        ("ult", SkillType::Ultra, Element::Physical, 3.0),
    ]);
    let champion = Actor::new("c", "Champion", Side::Player, stats(4000.0, 500.0, 0.0, 120.0))
        .with_skills(vec!["basic".to_string(), "ult".to_string()]);
    let wall = Actor::new("w", "Wall", Side::Enemy, stats(1e9, 1.0, 0.0, 10.0))
        .with_skills(vec!["basic".to_string()]);
    let mut battle = Battle::new(vec![champion, wall], registry, 42).unwrap();
    battle.actor_mut(ActorId(0)).energy = 100.0;
    battle.actor_mut(ActorId(0)).can_instant_ultimate = true;

    battle.run(1);

    // The ultimate resolves before any scheduled turn.
    let first_skill = battle
        .events()
        .iter()
        .find_map(|e| match e {
            BattleEvent::SkillUsed {
                skill_type,
                preempted,
                ..
            } => Some((*skill_type, *preempted)),
            _ => None,
        })
        .unwrap();
    assert_eq!(first_skill, (SkillType::Ultra, true));

    let first_turn_index = battle
        .events()
        .iter()
        .position(|e| matches!(e, BattleEvent::TurnStarted { .. }))
        .unwrap();
    let ult_index = battle
        .events()
        .iter()
        .position(|e| matches!(e, BattleEvent::SkillUsed { preempted: true, .. }))
        .unwrap();
    assert!(ult_index < first_turn_index);

    // Full energy was consumed, then the cast granted its 5 back.
    let consumed_at = battle
        .events()
        .iter()
        .position(|e| matches!(
            e,
            BattleEvent::EnergyConsumed { actor: ActorId(0), amount, .. } if (*amount - 100.0).abs() < 1e-9
        ))
        .unwrap();
    let regained = battle.events()[consumed_at..]
        .iter()
        .find_map(|e| match e {
            BattleEvent::EnergyGained {
                actor: ActorId(0),
                amount,
                ..
            } => Some(*amount),
            _ => None,
        })
        .unwrap();
    assert!((regained - 5.0).abs() < 1e-9);
}

#[test]
fn toughness_break_fires_on_weakness_matching_element() {
    let registry = scripted_registry(&[
        ("basic", SkillType::Normal, Element::Fire, 0.1),
        ("bp", SkillType::BPSkill, Element::Fire, 0.2),
    ]);
    let pyro = Actor::new("p", "Pyro", Side::Player, stats(50000.0, 100.0, 0.0, 100.0))
        .with_skills(vec!["basic".to_string(), "bp".to_string()])
        .with_ai(AiPolicy::SkillFirst);
    let mut brute = Actor::new("b", "Brute", Side::Enemy, stats(50000.0, 10.0, 0.0, 60.0))
        .with_skills(vec!["basic".to_string()])
        .with_toughness(100.0);
    brute.weaknesses = vec![Element::Fire];
    let mut battle = Battle::new(vec![pyro, brute], registry, 42).unwrap();
    battle.actor_mut(ActorId(1)).set_toughness(50.0, 100.0);

    battle.run(4);

    // Three battle-skill hits at 20 toughness each cross 50 -> 0.
    let reductions: Vec<f64> = battle
        .events()
        .iter()
        .filter_map(|e| match e {
            BattleEvent::ToughnessReduced { toughness, .. } => Some(*toughness),
            _ => None,
        })
        .collect();
    assert_eq!(&reductions[..3], &[30.0, 10.0, 0.0]);
    assert!(battle
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::ToughnessBroken { element: Element::Fire, .. })));

    // The break instance uses the fixed formula:
    // 1883.8 * 2.0 * ((100 + 20) / 40) with DEF 0 and no resistance.
    let break_hits = damage_events(&battle, ActorId(0))
        .into_iter()
        .filter(|(_, st)| *st == SkillType::Break)
        .collect::<Vec<_>>();
    assert_eq!(break_hits.len(), 1);
    assert!((break_hits[0].0 - 1883.8 * 2.0 * 3.0).abs() < 1e-6);

    // Toughness recovers to max at the enemy's next turn start.
    let broken_at = battle
        .events()
        .iter()
        .position(|e| matches!(e, BattleEvent::ToughnessBroken { .. }))
        .unwrap();
    let reset = battle.events()[broken_at..]
        .iter()
        .find_map(|e| match e {
            BattleEvent::ToughnessReset { toughness, .. } => Some(*toughness),
            _ => None,
        })
        .unwrap();
    assert!((reset - 100.0).abs() < 1e-9);
}

#[test]
fn speed_conditional_set_bonus_tracks_live_stats() {
    let registry = scripted_registry(&[("basic", SkillType::Normal, Element::Physical, 1.0)]);
    let mut wearer = Actor::new("s", "Wearer", Side::Player, stats(4000.0, 1000.0, 0.0, 115.0))
        .with_skills(vec!["basic".to_string()]);
    for (id, slot) in [("sphere", RelicSlot::PlanarSphere), ("rope", RelicSlot::LinkRope)] {
        wearer
            .equip_relic(Relic {
                id: id.to_string(),
                slot,
                set_name: "Space Sealing Station".to_string(),
                main_stat: (Stat::Hp, 50.0),
                sub_stats: vec![],
            })
            .unwrap();
    }
    let wall = Actor::new("w", "Wall", Side::Enemy, stats(1e9, 1.0, 0.0, 10.0))
        .with_skills(vec!["basic".to_string()]);
    let mut battle = Battle::new(vec![wearer, wall], registry, 42).unwrap();

    // Fire battle-start hooks without running any round.
    battle.run(0);

    // Base SPD 115 is under the 120 threshold: only the static 12%.
    let atk = battle.current_stats(ActorId(0), false).get(Stat::Atk);
    assert!((atk - 1120.0).abs() < 1e-6);

    // A +10% SPD buff lifts the closure's view to 126.5, arming the
    // conditional second 12%.
    battle
        .actor_mut(ActorId(0))
        .buffs
        .add(Buff::new("March of Swiftness", 2).with_stat(Stat::SpdPct, 0.10));
    let stats_with_buff = battle.current_stats(ActorId(0), false);
    assert!((stats_with_buff.get(Stat::Spd) - 126.5).abs() < 1e-6);
    assert!((stats_with_buff.get(Stat::Atk) - 1240.0).abs() < 1e-6);

    // Removing the buff disarms it again.
    battle.actor_mut(ActorId(0)).buffs.remove("March of Swiftness");
    let atk = battle.current_stats(ActorId(0), false).get(Stat::Atk);
    assert!((atk - 1120.0).abs() < 1e-6);
}

#[test]
fn kill_talent_cannot_chain_extra_turns() {
    let mut skills: HashMap<String, SkillData> = HashMap::new();
    skills.insert(
        "basic".to_string(),
        skill_data("basic", "Strike", SkillType::Normal, vec![vec![10.0]]),
    );
    skills.insert(
        "110204".to_string(),
        skill_data("110204", "Resurgence", SkillType::Talent, vec![vec![0.40, 1.0]]),
    );
    let registry = SkillRegistry::new(skills)
        .with_routine("basic", SkillRoutine::EnemyBasic(Element::Quantum));

    let reaper = Actor::new("1102", "Reaper", Side::Player, stats(4000.0, 1000.0, 0.0, 120.0))
        .with_skills(vec!["basic".to_string()])
        .with_kill_talent("110204");
    let prey_a = Actor::new("e1", "Prey A", Side::Enemy, stats(100.0, 10.0, 0.0, 50.0))
        .with_skills(vec!["basic".to_string()]);
    let prey_b = Actor::new("e2", "Prey B", Side::Enemy, stats(100.0, 10.0, 0.0, 50.0))
        .with_skills(vec!["basic".to_string()]);
    let mut battle = Battle::new(vec![reaper, prey_a, prey_b], registry, 42).unwrap();

    let outcome = battle.run(3);

    // Both kills happened, but only the first granted an extra turn.
    assert_eq!(outcome.winner, Some(Side::Player));
    let extra_turns = battle
        .events()
        .iter()
        .filter(|e| matches!(e, BattleEvent::ExtraTurnGranted { .. }))
        .count();
    assert_eq!(extra_turns, 1);
}

#[test]
fn bronya_ultimate_shares_scaled_crit_damage() {
    let mut skills: HashMap<String, SkillData> = HashMap::new();
    skills.insert(
        "110103".to_string(),
        skill_data(
            "110103",
            "The Belobog March",
            SkillType::Ultra,
            vec![vec![0.55, 0.16, 0.20, 2.0]],
        ),
    );
    skills.insert(
        "basic".to_string(),
        skill_data("basic", "Strike", SkillType::Normal, vec![vec![1.0]]),
    );
    let registry = SkillRegistry::new(skills)
        .with_routine("basic", SkillRoutine::EnemyBasic(Element::Physical));

    let mut bronya_stats = stats(4000.0, 400.0, 0.0, 100.0);
    bronya_stats.add(Stat::CritDmg, 1.0);
    let bronya = Actor::new("1101", "Bronya", Side::Player, bronya_stats)
        .with_skills(vec!["basic".to_string(), "110103".to_string()]);
    let ally = Actor::new("1102", "Seele", Side::Player, stats(3000.0, 800.0, 0.0, 115.0))
        .with_skills(vec!["basic".to_string()]);
    let wall = Actor::new("w", "Wall", Side::Enemy, stats(1e9, 1.0, 0.0, 10.0))
        .with_skills(vec!["basic".to_string()]);
    let mut battle = Battle::new(vec![bronya, ally, wall], registry, 42).unwrap();
    battle.actor_mut(ActorId(0)).energy = 100.0;
    battle.actor_mut(ActorId(0)).can_instant_ultimate = true;

    battle.run(1);

    // Ally CRIT DMG = Bronya's 1.0 * 0.16 + 0.20.
    let ally_crit_dmg = battle.current_stats(ActorId(1), false).get(Stat::CritDmg);
    assert!((ally_crit_dmg - 0.36).abs() < 1e-6);
}
