//! fieldcombat - decision and control core of a real-time field combat engine
//!
//! Three parts do the heavy lifting:
//! - `skills`: annotation tags resolved into cached per-skill combat profiles
//! - `ai`: the trait-driven decision engine for autonomous combatants
//! - `input`: hold-to-charge input handling for player-controlled combatants
//!
//! `combat` wires them into a Bevy plugin; `headless` runs scripted scenarios.

pub mod ai;
pub mod cli;
pub mod combat;
pub mod constants;
pub mod error;
pub mod headless;
pub mod input;
pub mod keybindings;
pub mod settings;
pub mod skills;

// Re-export commonly used types
pub use ai::{AiDecisionEngine, Decision};
pub use combat::battler::{BattlerId, BattlerState, CooldownKey, SkillSlot};
pub use combat::log::{CombatLog, CombatLogEventType};
pub use combat::traits::AITraitSet;
pub use combat::CombatCorePlugin;
pub use headless::HeadlessScenario;
pub use input::InputChargeController;
pub use settings::CoreSettings;
pub use skills::{SkillId, SkillProfile, SkillProfiles};
