//! Combat events
//!
//! Events flowing between the input layer, the decision systems and the
//! dispatcher.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::battler::{BattlerId, SkillSlot};
use crate::skills::SkillId;

/// Where an action trigger came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerOrigin {
    /// Autonomous decision engine.
    Ai,
    /// Short press on a player slot.
    InputTrigger { slot: SkillSlot },
    /// Release of a charged player slot.
    ChargeRelease { slot: SkillSlot, held_frames: u32 },
}

/// Request to execute a skill. Execution itself happens outside the core.
#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTrigger {
    /// Combatant using the skill
    pub actor_id: BattlerId,
    pub skill_id: SkillId,
    /// Tile the skill is aimed at
    pub target_x: i32,
    pub target_y: i32,
    /// Frame the trigger was produced on
    pub timestamp: u64,
    pub origin: TriggerOrigin,
}

/// Per-slot outcome of one input sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotInputKind {
    /// Pressed and released before charging began.
    Triggered,
    /// The hold outlasted the input delay.
    ChargeStarted,
    /// Charging input let go after `held_frames` frames.
    ChargeReleased { held_frames: u32 },
    /// Charging broken off by the modifier key.
    ChargeCancelled,
}

/// Raised by the input layer for a player-controlled combatant.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotInputEvent {
    pub actor: Entity,
    pub slot: SkillSlot,
    pub kind: SlotInputKind,
}

/// Raised when a combatant is cleared off the battlefield.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattlerDefeatedEvent {
    pub battler: BattlerId,
}
