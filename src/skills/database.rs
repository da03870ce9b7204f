//! Data-Driven Skill Definitions
//!
//! Skill definitions are loaded from a RON file instead of being hardcoded.
//! Each definition carries the costs and effect data the AI needs for
//! feasibility and healing math, plus the free-text `note` that the profile
//! resolver reads tags from.
//!
//! ```ignore
//! fn my_system(skills: Res<SkillDatabase>, profiles: Res<SkillProfiles>) {
//!     let profile = profiles.resolve(12, &*skills);
//!     println!("cooldown: {}", profile.cooldown);
//! }
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use super::{SkillId, SkillSource};
use crate::error::{ConfigError, ConfigResult};

/// Who a skill can be aimed at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillScope {
    #[default]
    None,
    Enemy,
    AllEnemies,
    Ally,
    AllAllies,
    DeadAlly,
    AllDeadAllies,
    User,
}

/// What a skill does to its targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillEffect {
    #[default]
    None,
    HpDamage,
    MpDamage,
    HpRecover,
    MpRecover,
    HpDrain,
    MpDrain,
}

/// A single skill definition as written in the skill database file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: String,
    #[serde(default)]
    pub mp_cost: i32,
    #[serde(default)]
    pub tp_cost: i32,
    #[serde(default)]
    pub scope: SkillScope,
    #[serde(default)]
    pub effect: SkillEffect,
    /// Base amount of damage or recovery.
    #[serde(default)]
    pub power: i32,
    /// Element used for effectiveness lookups (0 = none).
    #[serde(default)]
    pub element_id: i32,
    /// Annotation text holding combat tags.
    #[serde(default)]
    pub note: String,
}

impl SkillDefinition {
    pub fn new(id: SkillId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            mp_cost: 0,
            tp_cost: 0,
            scope: SkillScope::None,
            effect: SkillEffect::None,
            power: 0,
            element_id: 0,
            note: String::new(),
        }
    }

    pub fn targets_living_ally(&self) -> bool {
        matches!(self.scope, SkillScope::Ally | SkillScope::AllAllies)
    }

    pub fn targets_enemy(&self) -> bool {
        matches!(self.scope, SkillScope::Enemy | SkillScope::AllEnemies)
    }

    /// Whether the skill hits every member of its side instead of one target.
    pub fn is_all_scope(&self) -> bool {
        matches!(
            self.scope,
            SkillScope::AllAllies | SkillScope::AllEnemies | SkillScope::AllDeadAllies
        )
    }

    pub fn is_recovery(&self) -> bool {
        matches!(self.effect, SkillEffect::HpRecover | SkillEffect::MpRecover)
    }

    /// Damage or drain against HP or MP.
    pub fn deals_damage(&self) -> bool {
        matches!(
            self.effect,
            SkillEffect::HpDamage
                | SkillEffect::MpDamage
                | SkillEffect::HpDrain
                | SkillEffect::MpDrain
        )
    }

    /// Offensive skill aimed at the other side.
    pub fn is_attack(&self) -> bool {
        self.targets_enemy() && self.deals_damage()
    }

    pub fn affects_hp(&self) -> bool {
        matches!(
            self.effect,
            SkillEffect::HpDamage | SkillEffect::HpRecover | SkillEffect::HpDrain
        )
    }

    /// Living-ally HP recovery: the only kind of skill a healer considers.
    pub fn is_heal(&self) -> bool {
        self.targets_living_ally() && self.is_recovery() && self.affects_hp()
    }
}

/// Root structure of the skill database file.
#[derive(Debug, Serialize, Deserialize)]
pub struct SkillsConfig {
    pub skills: Vec<SkillDefinition>,
}

/// Resource containing every skill definition, keyed by id.
#[derive(Resource, Debug, Default, Clone)]
pub struct SkillDatabase {
    definitions: BTreeMap<SkillId, SkillDefinition>,
}

impl SkillDatabase {
    /// Build from definitions; later duplicates of an id replace earlier ones.
    pub fn from_definitions(definitions: impl IntoIterator<Item = SkillDefinition>) -> Self {
        Self {
            definitions: definitions.into_iter().map(|def| (def.id, def)).collect(),
        }
    }

    /// Load and validate a RON skill database.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let config: SkillsConfig = ron::from_str(&contents).map_err(|e| ConfigError::ron(path, e))?;

        Self::validate(&config.skills)?;
        let database = Self::from_definitions(config.skills);

        info!("Loaded {} skill definitions from {:?}", database.len(), path);
        Ok(database)
    }

    /// Check ids are unique and costs make sense.
    pub fn validate(definitions: &[SkillDefinition]) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for def in definitions {
            if !seen.insert(def.id) {
                return Err(ConfigError::Invalid(format!("duplicate skill id {}", def.id)));
            }
            if def.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("skill {} has no name", def.id)));
            }
            if def.mp_cost < 0 || def.tp_cost < 0 {
                return Err(ConfigError::Invalid(format!(
                    "skill {} ({}) has a negative cost",
                    def.id, def.name
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: SkillId) -> Option<&SkillDefinition> {
        self.definitions.get(&id)
    }

    pub fn insert(&mut self, definition: SkillDefinition) {
        self.definitions.insert(definition.id, definition);
    }

    pub fn name(&self, id: SkillId) -> &str {
        self.get(id).map(|def| def.name.as_str()).unwrap_or("Unknown Skill")
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl SkillSource for SkillDatabase {
    fn annotation_text(&self, skill_id: SkillId) -> Option<&str> {
        self.get(skill_id).map(|def| def.note.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heal(id: SkillId, scope: SkillScope) -> SkillDefinition {
        SkillDefinition {
            scope,
            effect: SkillEffect::HpRecover,
            power: 50,
            ..SkillDefinition::new(id, "Heal")
        }
    }

    #[test]
    fn test_is_heal_requires_ally_scope_and_hp_recovery() {
        assert!(heal(1, SkillScope::Ally).is_heal());
        assert!(heal(2, SkillScope::AllAllies).is_heal());
        assert!(!heal(3, SkillScope::Enemy).is_heal());
        assert!(!heal(4, SkillScope::DeadAlly).is_heal());

        let mana = SkillDefinition {
            effect: SkillEffect::MpRecover,
            ..heal(5, SkillScope::Ally)
        };
        assert!(!mana.is_heal());
    }

    #[test]
    fn test_is_attack_requires_enemy_scope_and_damage() {
        let bolt = SkillDefinition {
            scope: SkillScope::Enemy,
            effect: SkillEffect::MpDrain,
            ..SkillDefinition::new(1, "Siphon")
        };
        assert!(bolt.is_attack());

        assert!(!heal(2, SkillScope::DeadAlly).is_attack());

        let meditate = SkillDefinition {
            effect: SkillEffect::MpRecover,
            ..heal(3, SkillScope::User)
        };
        assert!(!meditate.is_attack());

        let taunt = SkillDefinition {
            scope: SkillScope::AllEnemies,
            ..SkillDefinition::new(4, "Taunt")
        };
        assert!(!taunt.is_attack());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let defs = vec![SkillDefinition::new(1, "Attack"), SkillDefinition::new(1, "Again")];
        assert!(SkillDatabase::validate(&defs).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_cost() {
        let def = SkillDefinition {
            mp_cost: -3,
            ..SkillDefinition::new(2, "Cheap")
        };
        assert!(SkillDatabase::validate(&[def]).is_err());
    }

    #[test]
    fn test_parse_ron_database() {
        let text = r#"(
            skills: [
                (id: 1, name: "Attack", scope: Enemy, effect: HpDamage, power: 10),
                (id: 2, name: "Heal", mp_cost: 5, scope: Ally, effect: HpRecover, power: 50,
                 note: "<cooldown: 120>\n<castTime: 10>"),
            ],
        )"#;
        let config: SkillsConfig = ron::from_str(text).unwrap();
        let db = SkillDatabase::from_definitions(config.skills);
        assert_eq!(db.len(), 2);
        assert_eq!(db.name(2), "Heal");
        assert!(db.get(2).unwrap().is_heal());
        assert_eq!(db.annotation_text(2), Some("<cooldown: 120>\n<castTime: 10>"));
        assert_eq!(db.annotation_text(99), None);
    }
}
