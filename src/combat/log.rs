//! Combat logging
//!
//! Records every action trigger and notable core event for post-match
//! analysis and headless runs.

use bevy::prelude::*;
use serde::Serialize;
use std::path::Path;

use super::events::ActionTrigger;
use crate::error::{ConfigError, ConfigResult};

/// A single entry in the combat log
#[derive(Debug, Clone, Serialize)]
pub struct CombatLogEntry {
    /// Frame the entry was recorded on
    pub frame: u64,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CombatLogEventType {
    /// Non-basic skill triggered
    SkillUsed,
    /// Basic attack triggered
    BasicAttack,
    ChargeStarted,
    ChargeReleased,
    ChargeCancelled,
    /// Combatant cleared off the field
    BattlerDefeated,
    /// Match event (start, end, etc.)
    MatchEvent,
}

/// The combat log resource storing all events
#[derive(Resource, Default, Debug, Serialize)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Every action trigger that reached the dispatcher
    pub actions: Vec<ActionTrigger>,
    /// Current frame
    pub frame: u64,
}

impl CombatLog {
    /// Clear the log for a new match
    pub fn clear(&mut self) {
        self.entries.clear();
        self.actions.clear();
        self.frame = 0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.entries.push(CombatLogEntry {
            frame: self.frame,
            event_type,
            message,
        });
    }

    pub fn record_action(&mut self, trigger: &ActionTrigger) {
        self.actions.push(trigger.clone());
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get only charge lifecycle events
    pub fn charge_events_only(&self) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    CombatLogEventType::ChargeStarted
                        | CombatLogEventType::ChargeReleased
                        | CombatLogEventType::ChargeCancelled
                )
            })
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Write the whole log as pretty JSON.
    pub fn save_to_file(&self, path: &Path) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::json(path, e))?;
        std::fs::write(path, json).map_err(|e| ConfigError::io(path, e))?;
        Ok(())
    }
}
