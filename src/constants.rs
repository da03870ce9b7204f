//! Combat Constants
//!
//! Centralized location for the default values used when neither a tag nor
//! the settings file says otherwise. All timing values are in frames.

// ============================================================================
// Input
// ============================================================================

/// Frames an input must be held before its slot starts charging.
pub const DEFAULT_INPUT_DELAY: u32 = 24;

// ============================================================================
// AI
// ============================================================================

/// Frames between two AI "think" ticks for the same combatant.
pub const DEFAULT_AI_THINK_INTERVAL: u32 = 20;

/// HP ratio at or below which an ally counts as critically wounded.
pub const CRITICAL_HP_RATIO: f32 = 0.4;

/// Number of wounded allies at which careful healers switch to party heals.
pub const WOUNDED_ALLY_THRESHOLD: usize = 2;

/// Sight radius (in tiles) used when a combatant doesn't set its own.
pub const DEFAULT_SIGHT_RANGE: i32 = 8;

/// Skill id every combatant falls back to when nothing else is usable.
pub const DEFAULT_BASIC_ATTACK_SKILL: i32 = 1;

// ============================================================================
// Aggro
// ============================================================================

/// Aggro generated by any skill use before tag bonuses and multipliers.
pub const BASE_AGGRO_PER_USE: i32 = 10;

// ============================================================================
// Skill profile defaults
// ============================================================================

/// Frames a skill's hitbox lives on the field when untagged.
pub const DEFAULT_DURATION_ON_FIELD: i32 = 8;

/// Minimum cast time; casting is never instantaneous at the frame level.
pub const MIN_CAST_TIME: i32 = 1;

/// Number of hits a projectile gets before it is consumed.
pub const DEFAULT_PIERCE_COUNT: i32 = 1;

/// Proximity, in tiles, at which a skill's hitbox triggers.
pub const DEFAULT_PROXIMITY: i32 = 1;

/// `ignoreParry` value meaning "always ignores parry".
pub const IGNORE_PARRY_ALWAYS: i32 = -1;

/// `aiCooldown` value meaning "use the regular cooldown".
pub const AI_COOLDOWN_UNSET: i32 = -1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hp_thresholds_are_valid() {
        assert!(CRITICAL_HP_RATIO > 0.0 && CRITICAL_HP_RATIO < 1.0);
    }

    #[test]
    fn test_input_delay_is_standard_value() {
        assert_eq!(DEFAULT_INPUT_DELAY, 24);
    }

    #[test]
    fn test_frame_defaults_are_positive() {
        assert!(DEFAULT_AI_THINK_INTERVAL > 0);
        assert!(DEFAULT_SIGHT_RANGE > 0);
        assert!(MIN_CAST_TIME >= 1);
    }
}
