//! Headless scenario execution
//!
//! Runs the combat core for a fixed number of frames without any window or
//! renderer, replaying the scenario's input script for player-controlled
//! combatants.

use bevy::log::LogPlugin;
use bevy::prelude::*;
use serde::Serialize;
use std::path::Path;

use crate::ai::{Effectiveness, ElementRateTable};
use crate::combat::battler::*;
use crate::combat::events::ActionTrigger;
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::combat::rng::GameRng;
use crate::combat::systems::CoreSystemPhase;
use crate::combat::{CombatClock, CombatCorePlugin};
use crate::error::{ConfigError, ConfigResult};
use crate::settings::CoreSettings;
use crate::skills::SkillDatabase;

use super::config::{HeadlessScenario, InputAction};

/// Result of a completed headless run
///
/// This struct provides programmatic access to run results for testing and analysis.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub frames_run: u64,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
    /// Every dispatched action trigger, in order
    pub actions: Vec<ActionTrigger>,
    pub battlers: Vec<BattlerSummary>,
}

/// State of one combatant when the run ended
#[derive(Debug, Clone, Serialize)]
pub struct BattlerSummary {
    pub id: BattlerId,
    pub name: String,
    pub team: u8,
    pub traits: String,
    pub aggro: i32,
    pub alive: bool,
    pub current_target: Option<BattlerId>,
    pub ally_target: Option<BattlerId>,
    pub active_cooldowns: usize,
}

impl MatchResult {
    pub fn actions_by(&self, actor: BattlerId) -> impl Iterator<Item = &ActionTrigger> {
        self.actions.iter().filter(move |a| a.actor_id == actor)
    }

    pub fn battler(&self, id: BattlerId) -> Option<&BattlerSummary> {
        self.battlers.iter().find(|b| b.id == id)
    }
}

/// Display name carried next to `BattlerState`.
#[derive(Component, Debug, Clone)]
pub struct BattlerName(pub String);

/// Plugin for headless scenario execution
pub struct HeadlessPlugin {
    pub scenario: HeadlessScenario,
    pub settings: CoreSettings,
    pub skills: SkillDatabase,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        let mut skills = self.skills.clone();
        for def in &self.scenario.skills {
            skills.insert(def.clone());
        }

        let game_rng = match self.scenario.random_seed {
            Some(seed) => {
                info!("Using deterministic RNG with seed: {}", seed);
                GameRng::from_seed(seed)
            }
            None => {
                info!("Using non-deterministic RNG (no seed provided)");
                GameRng::from_entropy()
            }
        };

        app.insert_resource(self.scenario.clone())
            .insert_resource(self.settings.clone())
            .insert_resource(skills)
            .insert_resource(game_rng)
            .insert_resource(element_rates(&self.scenario))
            .add_plugins(CombatCorePlugin)
            .add_systems(Startup, headless_setup_scenario)
            .add_systems(
                Update,
                apply_input_script.before(CoreSystemPhase::InputSampling),
            );
    }
}

fn element_rates(scenario: &HeadlessScenario) -> Effectiveness {
    let mut table = ElementRateTable::default();
    for combatant in &scenario.combatants {
        for (&element, &rate) in &combatant.element_rates {
            table.set(BattlerId(combatant.id), element, rate);
        }
    }
    if table.is_empty() {
        Effectiveness(None)
    } else {
        Effectiveness(Some(Box::new(table)))
    }
}

/// Spawn every combatant in the scenario
fn headless_setup_scenario(
    mut commands: Commands,
    scenario: Res<HeadlessScenario>,
    settings: Res<CoreSettings>,
    mut combat_log: ResMut<CombatLog>,
) {
    combat_log.clear();
    combat_log.log(
        CombatLogEventType::MatchEvent,
        "Scenario started (headless mode)".to_string(),
    );

    for config in &scenario.combatants {
        let id = BattlerId(config.id);
        let basic_attack = config.basic_attack.unwrap_or(settings.default_basic_attack);
        let sight_range = config.sight_range.unwrap_or(settings.default_sight_range);

        let mut state = BattlerState::new(id, config.team, basic_attack, sight_range)
            .with_skills(config.skills.iter().copied())
            .with_traits(config.traits);
        state.learn(basic_attack);
        state.leader = config.leader.map(BattlerId);

        let vitals = Vitals {
            hp: config.hp.unwrap_or(config.max_hp),
            max_hp: config.max_hp,
            mp: config.mp.unwrap_or(config.max_mp),
            max_mp: config.max_mp,
            tp: config.tp,
        };
        let name = if config.name.is_empty() {
            format!("Battler {}", config.id)
        } else {
            config.name.clone()
        };

        let mut entity = commands.spawn((
            state,
            vitals,
            TilePosition(IVec2::new(config.position[0], config.position[1])),
            BattlerName(name),
        ));
        if config.player {
            entity.insert((
                PlayerControlled,
                SkillLoadout {
                    slots: config.loadout.clone(),
                },
            ));
        } else {
            entity.insert(AiController::new(settings.ai_think_interval));
        }
    }

    info!(
        "Headless scenario setup complete: {} combatants, {} frames",
        scenario.combatants.len(),
        scenario.frames
    );
}

/// Apply the input script for the frame about to run.
fn apply_input_script(
    clock: Res<CombatClock>,
    scenario: Res<HeadlessScenario>,
    settings: Res<CoreSettings>,
    mut keyboard: ResMut<ButtonInput<KeyCode>>,
) {
    keyboard.clear();
    let frame = clock.frame + 1;
    for input in scenario.inputs_at(frame) {
        let Some(key) = settings.keybindings.primary_key(input.button) else {
            warn!("Scripted button {:?} is unbound", input.button);
            continue;
        };
        match input.action {
            InputAction::Press => keyboard.press(key),
            InputAction::Release => keyboard.release(key),
        }
    }
}

/// Build the app for a scenario without running it.
pub fn build_headless_app(
    scenario: HeadlessScenario,
    settings: CoreSettings,
    skills: SkillDatabase,
) -> ConfigResult<App> {
    assemble_app(scenario, settings, skills, false)
}

fn assemble_app(
    scenario: HeadlessScenario,
    settings: CoreSettings,
    skills: SkillDatabase,
    logging: bool,
) -> ConfigResult<App> {
    scenario.validate()?;
    settings.validate()?;

    let mut app = App::new();
    // Minimal plugins - no window, no rendering. Frames are stepped manually.
    app.add_plugins(MinimalPlugins);
    if logging {
        app.add_plugins(LogPlugin::default());
    }
    app.add_plugins(HeadlessPlugin {
        scenario,
        settings,
        skills,
    });
    app.finish();
    app.cleanup();
    Ok(app)
}

/// Run a scenario to completion and collect the result.
pub fn run_scenario(
    scenario: HeadlessScenario,
    settings: CoreSettings,
    skills: SkillDatabase,
) -> ConfigResult<MatchResult> {
    let frames = scenario.frames;
    let random_seed = scenario.random_seed;
    let mut app = build_headless_app(scenario, settings, skills)?;
    Ok(step_frames(&mut app, frames, random_seed))
}

fn step_frames(app: &mut App, frames: u64, random_seed: Option<u64>) -> MatchResult {
    for _ in 0..frames {
        app.update();
    }
    collect_result(app, frames, random_seed)
}

/// Read the result out of a stepped app.
pub fn collect_result(app: &mut App, frames_run: u64, random_seed: Option<u64>) -> MatchResult {
    let world = app.world_mut();
    let actions = world.resource::<CombatLog>().actions.clone();

    let mut query = world.query::<(&BattlerState, &Vitals, Option<&BattlerName>)>();
    let mut battlers: Vec<BattlerSummary> = query
        .iter(world)
        .map(|(state, vitals, name)| BattlerSummary {
            id: state.id,
            name: name.map(|n| n.0.clone()).unwrap_or_default(),
            team: state.team,
            traits: state.traits.to_string(),
            aggro: state.aggro,
            alive: vitals.is_alive(),
            current_target: state.current_target,
            ally_target: state.ally_target,
            active_cooldowns: state.active_cooldowns(),
        })
        .collect();
    battlers.sort_by_key(|b| b.id);

    MatchResult {
        frames_run,
        random_seed,
        actions,
        battlers,
    }
}

/// Run a scenario from the CLI and write the action and combat logs.
pub fn run_headless(
    scenario: HeadlessScenario,
    settings: CoreSettings,
    skills: SkillDatabase,
    output: Option<&Path>,
    combat_log: Option<&Path>,
) -> ConfigResult<MatchResult> {
    println!("Starting headless scenario...");
    println!("  Combatants: {}", scenario.combatants.len());
    println!("  Frames: {}", scenario.frames);

    let output_path = output
        .map(Path::to_path_buf)
        .or_else(|| scenario.output_path.as_ref().map(Into::into));

    let frames = scenario.frames;
    let random_seed = scenario.random_seed;
    let mut app = assemble_app(scenario, settings, skills, true)?;
    let result = step_frames(&mut app, frames, random_seed);
    println!(
        "Scenario complete: {} actions over {} frames",
        result.actions.len(),
        result.frames_run
    );

    if let Some(path) = output_path {
        let json = serde_json::to_string_pretty(&result).map_err(|e| ConfigError::json(&path, e))?;
        std::fs::write(&path, json).map_err(|e| ConfigError::io(&path, e))?;
        println!("Action log saved to: {}", path.display());
    }
    if let Some(path) = combat_log {
        app.world().resource::<CombatLog>().save_to_file(path)?;
        println!("Combat log saved to: {}", path.display());
    }

    Ok(result)
}
