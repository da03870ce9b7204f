//! Combat core
//!
//! Per-combatant state and the systems that drive it:
//! - Combatant components (`BattlerState`, vitals, loadout, think timers)
//! - AI behavior traits
//! - Action triggers and the dispatch seam
//! - Combat logging

use bevy::prelude::*;

pub mod battler;
pub mod dispatch;
pub mod events;
pub mod log;
pub mod rng;
pub mod systems;
pub mod traits;

use crate::ai::Effectiveness;
use crate::settings::CoreSettings;
use crate::skills::{SkillDatabase, SkillProfiles};
use events::*;

/// Plugin for the combat core
///
/// Resources already inserted by the host (settings, skill database,
/// dispatcher, RNG) are kept; missing ones get defaults.
pub struct CombatCorePlugin;

impl Plugin for CombatCorePlugin {
    fn build(&self, app: &mut App) {
        app
            // Core events
            .add_event::<SlotInputEvent>()
            .add_event::<ActionTrigger>()
            .add_event::<BattlerDefeatedEvent>()
            // Resources
            .init_resource::<CoreSettings>()
            .init_resource::<SkillDatabase>()
            .init_resource::<SkillProfiles>()
            .init_resource::<Effectiveness>()
            .init_resource::<dispatch::Dispatcher>()
            .init_resource::<rng::GameRng>()
            .init_resource::<log::CombatLog>()
            .init_resource::<CombatClock>()
            .init_resource::<ButtonInput<KeyCode>>();

        systems::configure_core_system_ordering(app);
        systems::add_core_systems(app, || true);
    }
}

/// Logical frame counter; every timer in the core counts these.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CombatClock {
    pub frame: u64,
}
