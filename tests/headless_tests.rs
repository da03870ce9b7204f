//! Integration tests for headless scenario execution
//!
//! These tests verify that:
//! - Scripted player input turns into action triggers aimed within range
//! - AI combatants think on their cadence and heal before attacking
//! - Cooldowns only ever count down, one frame at a time
//! - Seeded RNG produces deterministic results
//! - Defeated combatants are cleared off the battlefield

use std::path::Path;
use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use fieldcombat::combat::battler::{BattlerId, BattlerState, CooldownKey, Defeated, SkillSlot};
use fieldcombat::combat::dispatch::{ActionDispatcher, Dispatcher};
use fieldcombat::combat::events::{ActionTrigger, TriggerOrigin};
use fieldcombat::combat::log::{CombatLog, CombatLogEventType};
use fieldcombat::headless::{build_headless_app, run_scenario, HeadlessScenario, MatchResult};
use fieldcombat::settings::CoreSettings;
use fieldcombat::skills::SkillDatabase;

const ATTACK: i32 = 1;
const HEAL: i32 = 2;
const FIRE_BOLT: i32 = 4;
const CLEAVE: i32 = 7;

fn shipped_skills() -> SkillDatabase {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/skills.ron");
    SkillDatabase::load(&path).expect("assets/skills.ron should load")
}

fn scenario(json: &str) -> HeadlessScenario {
    serde_json::from_str(json).expect("test scenario should parse")
}

fn run(json: &str) -> MatchResult {
    run_scenario(scenario(json), CoreSettings::default(), shipped_skills()).expect("scenario should run")
}

fn state_of(app: &mut App, id: u32) -> BattlerState {
    let world = app.world_mut();
    let mut query = world.query::<&BattlerState>();
    query
        .iter(world)
        .find(|state| state.id == BattlerId(id))
        .cloned()
        .expect("battler should exist")
}

/// A player at the origin next to an enemy that only knows its basic attack.
const DUEL: &str = r#"{
    "frames": 20,
    "random_seed": 11,
    "combatants": [
        { "id": 1, "team": 1, "max_hp": 100, "player": true, "skills": [7],
          "loadout": { "Mainhand": 1, "Offhand": 7 } },
        { "id": 2, "team": 2, "max_hp": 50, "position": [1, 0] }
    ],
    "input_script": [
        { "frame": 3, "button": "Mainhand", "action": "Press" },
        { "frame": 5, "button": "Mainhand", "action": "Release" },
        { "frame": 10, "button": "Offhand", "action": "Press" },
        { "frame": 11, "button": "Offhand", "action": "Release" },
        { "frame": 12, "button": "Offhand", "action": "Press" },
        { "frame": 13, "button": "Offhand", "action": "Release" }
    ]
}"#;

// =============================================================================
// Player input
// =============================================================================

#[test]
fn test_scripted_presses_become_triggers() {
    let result = run(DUEL);
    let player: Vec<&ActionTrigger> = result.actions_by(BattlerId(1)).collect();

    // The second Offhand press lands while Cleave is still cooling down.
    assert_eq!(player.len(), 2, "player actions: {:?}", player);
    assert_eq!(player[0].skill_id, ATTACK);
    assert_eq!(player[0].timestamp, 3);
    assert_eq!(
        player[0].origin,
        TriggerOrigin::InputTrigger {
            slot: SkillSlot::Mainhand
        }
    );
    assert_eq!(player[1].skill_id, CLEAVE);
    assert_eq!(player[1].timestamp, 10);
    assert_eq!((player[1].target_x, player[1].target_y), (1, 0));
    assert_eq!(
        result.battler(BattlerId(1)).and_then(|b| b.current_target),
        Some(BattlerId(2))
    );
}

#[test]
fn test_player_skills_respect_range() {
    let result = run(
        r#"{
        "frames": 10,
        "random_seed": 4,
        "combatants": [
            { "id": 1, "team": 1, "max_hp": 100, "max_mp": 10, "player": true, "skills": [4],
              "loadout": { "Mainhand": 1, "Offhand": 4 } },
            { "id": 2, "team": 2, "max_hp": 100, "position": [3, 0] }
        ],
        "input_script": [
            { "frame": 2, "button": "Mainhand", "action": "Press" },
            { "frame": 3, "button": "Mainhand", "action": "Release" },
            { "frame": 4, "button": "Offhand", "action": "Press" },
            { "frame": 5, "button": "Offhand", "action": "Release" }
        ]
    }"#,
    );

    // Attack reaches one tile and the enemy stands three away; Fire Bolt reaches five.
    let player: Vec<(i32, u64, (i32, i32))> = result
        .actions_by(BattlerId(1))
        .map(|a| (a.skill_id, a.timestamp, (a.target_x, a.target_y)))
        .collect();
    assert_eq!(player, vec![(FIRE_BOLT, 4, (3, 0))]);
}

#[test]
fn test_long_hold_releases_a_charged_trigger() {
    let result = run(
        r#"{
        "frames": 40,
        "random_seed": 1,
        "combatants": [
            { "id": 1, "team": 1, "max_hp": 100, "player": true,
              "loadout": { "Mainhand": 1 } },
            { "id": 2, "team": 2, "max_hp": 100, "position": [0, 1] }
        ],
        "input_script": [
            { "frame": 1, "button": "Mainhand", "action": "Press" },
            { "frame": 31, "button": "Mainhand", "action": "Release" }
        ]
    }"#,
    );

    let origins: Vec<(u64, TriggerOrigin)> = result
        .actions_by(BattlerId(1))
        .map(|a| (a.timestamp, a.origin))
        .collect();
    assert_eq!(
        origins,
        vec![
            (
                1,
                TriggerOrigin::InputTrigger {
                    slot: SkillSlot::Mainhand
                }
            ),
            (
                31,
                TriggerOrigin::ChargeRelease {
                    slot: SkillSlot::Mainhand,
                    held_frames: 30
                }
            ),
        ]
    );
}

#[test]
fn test_cooldowns_count_down_one_frame_at_a_time() {
    let mut app = build_headless_app(scenario(DUEL), CoreSettings::default(), shipped_skills())
        .expect("app should build");
    let key = CooldownKey::Slot(SkillSlot::Offhand);

    for _ in 0..10 {
        app.update();
    }
    let mut previous = state_of(&mut app, 1).cooldown_remaining(key);
    assert_eq!(previous, 30, "Cleave starts its cooldown on frame 10");

    for _ in 0..35 {
        app.update();
        let remaining = state_of(&mut app, 1).cooldown_remaining(key);
        assert_eq!(remaining, previous.saturating_sub(1));
        previous = remaining;
    }
    assert_eq!(previous, 0);
}

// =============================================================================
// AI
// =============================================================================

#[test]
fn test_ai_thinks_on_its_interval() {
    let result = run(
        r#"{
        "frames": 60,
        "random_seed": 3,
        "combatants": [
            { "id": 1, "team": 1, "max_hp": 100, "position": [0, 0] },
            { "id": 2, "team": 2, "max_hp": 100, "position": [1, 0] }
        ]
    }"#,
    );

    let interval = u64::from(CoreSettings::default().ai_think_interval);
    let stamps: Vec<u64> = result.actions_by(BattlerId(1)).map(|a| a.timestamp).collect();
    assert_eq!(stamps, vec![1, 1 + interval, 1 + 2 * interval]);
    assert!(result.actions_by(BattlerId(1)).all(|a| a.skill_id == ATTACK && a.origin == TriggerOrigin::Ai));

    let summary = result.battler(BattlerId(1)).expect("summary");
    assert_eq!(summary.current_target, Some(BattlerId(2)));
    assert!(summary.aggro > 0);
}

#[test]
fn test_ai_healer_heals_then_attacks_while_on_cooldown() {
    let result = run(
        r#"{
        "frames": 25,
        "random_seed": 5,
        "combatants": [
            { "id": 1, "team": 1, "max_hp": 100, "max_mp": 30, "skills": [2],
              "traits": { "healer": true }, "position": [0, 0] },
            { "id": 2, "team": 1, "max_hp": 100, "hp": 30, "position": [2, 0] },
            { "id": 3, "team": 2, "max_hp": 100, "position": [1, 1] }
        ]
    }"#,
    );

    let healer: Vec<&ActionTrigger> = result.actions_by(BattlerId(1)).collect();
    assert_eq!(healer.len(), 2);
    assert_eq!(healer[0].skill_id, HEAL);
    assert_eq!((healer[0].target_x, healer[0].target_y), (2, 0));
    assert_eq!(healer[1].skill_id, ATTACK);
    assert_eq!(
        result.battler(BattlerId(1)).and_then(|b| b.ally_target),
        Some(BattlerId(2))
    );
}

#[test]
fn test_custom_dispatcher_receives_every_trigger() {
    struct Shared(Arc<Mutex<Vec<ActionTrigger>>>);
    impl ActionDispatcher for Shared {
        fn dispatch(&mut self, trigger: &ActionTrigger) {
            if let Ok(mut received) = self.0.lock() {
                received.push(trigger.clone());
            }
        }
    }

    let received = Arc::new(Mutex::new(Vec::new()));
    let mut app = build_headless_app(scenario(DUEL), CoreSettings::default(), shipped_skills())
        .expect("app should build");
    app.insert_resource(Dispatcher::new(Shared(received.clone())));
    for _ in 0..20 {
        app.update();
    }

    let logged = app.world().resource::<CombatLog>().actions.clone();
    let received = received.lock().expect("lock").clone();
    assert!(!received.is_empty());
    assert_eq!(received, logged);
}

// =============================================================================
// Determinism & cleanup
// =============================================================================

#[test]
fn test_same_seed_same_actions() {
    let json = r#"{
        "frames": 120,
        "random_seed": 99,
        "combatants": [
            { "id": 1, "team": 1, "max_hp": 100, "max_mp": 40, "skills": [4, 5] },
            { "id": 2, "team": 1, "max_hp": 100, "max_mp": 40, "skills": [4, 5] },
            { "id": 3, "team": 2, "max_hp": 100, "position": [2, 0] },
            { "id": 4, "team": 2, "max_hp": 100, "position": [0, 2] }
        ]
    }"#;
    let first = run(json);
    let second = run(json);
    assert!(!first.actions.is_empty());
    assert_eq!(first.actions, second.actions);
}

#[test]
fn test_defeated_battler_is_cleared() {
    let mut app = build_headless_app(
        scenario(
            r#"{
            "frames": 10,
            "random_seed": 2,
            "combatants": [
                { "id": 1, "team": 1, "max_hp": 100 },
                { "id": 2, "team": 2, "max_hp": 100, "hp": 0, "position": [1, 0] }
            ]
        }"#,
        ),
        CoreSettings::default(),
        shipped_skills(),
    )
    .expect("app should build");

    for _ in 0..10 {
        app.update();
    }

    let fallen = state_of(&mut app, 2);
    assert_eq!(fallen.aggro, 0);
    assert_eq!(fallen.active_cooldowns(), 0);
    assert_eq!(fallen.current_target, None);

    let world = app.world_mut();
    let defeated = world.query_filtered::<&BattlerState, With<Defeated>>().iter(world).count();
    assert_eq!(defeated, 1);
    let log = world.resource::<CombatLog>();
    assert_eq!(log.filter_by_type(CombatLogEventType::BattlerDefeated).len(), 1);
    assert!(log.actions.iter().all(|a| a.actor_id != BattlerId(2)));
}

#[test]
fn test_shipped_scenario_runs() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/scenarios/healer_party.json");
    let scenario = HeadlessScenario::load_from_file(&path).expect("shipped scenario should load");
    let result = run_scenario(scenario, CoreSettings::default(), shipped_skills()).expect("run");

    let cleric_first = result.actions_by(BattlerId(1)).next().expect("cleric acts");
    assert_eq!(cleric_first.skill_id, HEAL);
    assert_eq!((cleric_first.target_x, cleric_first.target_y), (1, 0));

    assert!(result
        .actions_by(BattlerId(3))
        .any(|a| matches!(a.origin, TriggerOrigin::InputTrigger { .. })));
    assert_eq!(result.battlers.len(), 5);
}
