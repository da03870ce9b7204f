//! Engine-wide combat settings
//!
//! One immutable `CoreSettings` value is built at startup (from a RON file or
//! defaults) and handed to the tag resolver, the AI and the input layer by
//! reference. Nothing mutates it after the app starts.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::error::{ConfigError, ConfigResult};
use crate::keybindings::Keybindings;
use crate::skills::SkillId;

/// Tunables shared by every combatant.
#[derive(Resource, Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoreSettings {
    /// Frames an input must be held before charging starts.
    pub input_delay: u32,
    /// Frames between AI think ticks.
    pub ai_think_interval: u32,
    /// HP ratio at or below which an ally is critically wounded.
    pub critical_hp_ratio: f32,
    /// Wounded allies needed before careful healers prefer party heals.
    pub wounded_ally_threshold: usize,
    /// Aggro generated by every skill use before tag modifiers.
    pub base_aggro: i32,
    /// Sight radius for combatants that don't set one.
    pub default_sight_range: i32,
    /// Basic attack for combatants that don't set one.
    pub default_basic_attack: SkillId,
    pub keybindings: Keybindings,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            input_delay: DEFAULT_INPUT_DELAY,
            ai_think_interval: DEFAULT_AI_THINK_INTERVAL,
            critical_hp_ratio: CRITICAL_HP_RATIO,
            wounded_ally_threshold: WOUNDED_ALLY_THRESHOLD,
            base_aggro: BASE_AGGRO_PER_USE,
            default_sight_range: DEFAULT_SIGHT_RANGE,
            default_basic_attack: DEFAULT_BASIC_ATTACK_SKILL,
            keybindings: Keybindings::default(),
        }
    }
}

impl CoreSettings {
    /// Default location next to the executable.
    pub fn default_path() -> PathBuf {
        PathBuf::from("combat_settings.ron")
    }

    /// Load settings from a RON file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let settings: CoreSettings = ron::from_str(&contents).map_err(|e| ConfigError::ron(path, e))?;
        settings.validate()?;
        info!("Loaded combat settings from {:?}", path);
        Ok(settings)
    }

    /// Load settings, falling back to defaults if the file is missing or bad.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    /// Save settings to a RON file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, contents).map_err(|e| ConfigError::io(path, e))?;
        info!("Saved combat settings to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.critical_hp_ratio) {
            return Err(ConfigError::Invalid(format!(
                "critical_hp_ratio must be within 0..=1, got {}",
                self.critical_hp_ratio
            )));
        }
        if self.ai_think_interval == 0 {
            return Err(ConfigError::Invalid("ai_think_interval must be at least 1".to_string()));
        }
        if self.default_sight_range < 0 {
            return Err(ConfigError::Invalid("default_sight_range must not be negative".to_string()));
        }
        Ok(())
    }
}
