//! JSON configuration parsing for headless mode
//!
//! A scenario lists the combatants on the field, optional extra skill
//! definitions and a frame-by-frame input script for player-controlled
//! combatants.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::combat::battler::SkillSlot;
use crate::combat::traits::AITraitSet;
use crate::error::{ConfigError, ConfigResult};
use crate::keybindings::LogicalButton;
use crate::skills::{SkillDefinition, SkillId};

/// Headless scenario loaded from JSON
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessScenario {
    /// Frames to simulate (default: 600)
    #[serde(default = "default_frames")]
    pub frames: u64,
    /// Random seed for deterministic reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Custom output path for the action log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// Skill definitions added on top of the skill database
    #[serde(default)]
    pub skills: Vec<SkillDefinition>,
    pub combatants: Vec<CombatantConfig>,
    #[serde(default)]
    pub input_script: Vec<ScriptedInput>,
}

fn default_frames() -> u64 {
    600
}

/// One combatant on the field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantConfig {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub team: u8,
    #[serde(default)]
    pub position: [i32; 2],
    pub max_hp: i32,
    /// Starting HP (default: max_hp)
    #[serde(default)]
    pub hp: Option<i32>,
    #[serde(default)]
    pub max_mp: i32,
    /// Starting MP (default: max_mp)
    #[serde(default)]
    pub mp: Option<i32>,
    #[serde(default)]
    pub tp: i32,
    #[serde(default)]
    pub skills: Vec<SkillId>,
    /// Basic attack skill (default: from settings)
    #[serde(default)]
    pub basic_attack: Option<SkillId>,
    #[serde(default)]
    pub traits: AITraitSet,
    /// Driven by the input script instead of the AI
    #[serde(default)]
    pub player: bool,
    #[serde(default)]
    pub loadout: HashMap<SkillSlot, SkillId>,
    /// Leader id, for followers
    #[serde(default)]
    pub leader: Option<u32>,
    /// Sight radius in tiles (default: from settings)
    #[serde(default)]
    pub sight_range: Option<i32>,
    /// Damage rate per element id taken by this combatant
    #[serde(default)]
    pub element_rates: HashMap<i32, f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputAction {
    Press,
    Release,
}

/// Button change applied at the start of `frame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedInput {
    pub frame: u64,
    pub button: LogicalButton,
    pub action: InputAction,
}

impl HeadlessScenario {
    /// Load a scenario from a JSON file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let scenario: HeadlessScenario =
            serde_json::from_str(&contents).map_err(|e| ConfigError::json(path, e))?;

        scenario.validate()?;
        Ok(scenario)
    }

    /// Validate the scenario
    pub fn validate(&self) -> ConfigResult<()> {
        if self.frames == 0 {
            return Err(ConfigError::Invalid("frames must be positive".to_string()));
        }
        if self.combatants.is_empty() {
            return Err(ConfigError::Invalid("scenario has no combatants".to_string()));
        }

        let mut ids = HashSet::new();
        for combatant in &self.combatants {
            if !ids.insert(combatant.id) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate combatant id {}",
                    combatant.id
                )));
            }
            if combatant.max_hp <= 0 {
                return Err(ConfigError::Invalid(format!(
                    "combatant {} must have positive max_hp",
                    combatant.id
                )));
            }
            if combatant.hp.is_some_and(|hp| hp > combatant.max_hp) {
                return Err(ConfigError::Invalid(format!(
                    "combatant {} starts above max_hp",
                    combatant.id
                )));
            }
        }

        for combatant in &self.combatants {
            if let Some(leader) = combatant.leader {
                if leader == combatant.id || !ids.contains(&leader) {
                    return Err(ConfigError::Invalid(format!(
                        "combatant {} has unknown leader {}",
                        combatant.id, leader
                    )));
                }
            }
        }

        if !self.input_script.is_empty() && !self.combatants.iter().any(|c| c.player) {
            return Err(ConfigError::Invalid(
                "input_script given but no combatant has player: true".to_string(),
            ));
        }

        Ok(())
    }

    /// Inputs scheduled for `frame`, in script order.
    pub fn inputs_at(&self, frame: u64) -> impl Iterator<Item = &ScriptedInput> {
        self.input_script.iter().filter(move |input| input.frame == frame)
    }
}
