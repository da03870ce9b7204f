//! Keybinding system for remappable combat controls
//!
//! Maps the fixed set of logical combat buttons to physical keys. The input
//! layer only ever asks about logical buttons, so remapping never touches
//! the charge state machine.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Every logical button the combat core reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogicalButton {
    Mainhand,
    Offhand,
    Tool,
    Dodge,
    /// Dedicated keys for the combat-skill slots.
    CombatSkill1,
    CombatSkill2,
    CombatSkill3,
    CombatSkill4,
    Guard,
    Strafe,
    Rotate,
    /// Held together with Mainhand/Offhand/Tool/Dodge to use combat skills 1-4.
    SkillModifier,
}

impl LogicalButton {
    pub fn description(&self) -> &'static str {
        match self {
            LogicalButton::Mainhand => "Mainhand Attack",
            LogicalButton::Offhand => "Offhand Attack",
            LogicalButton::Tool => "Use Tool",
            LogicalButton::Dodge => "Dodge",
            LogicalButton::CombatSkill1 => "Combat Skill 1",
            LogicalButton::CombatSkill2 => "Combat Skill 2",
            LogicalButton::CombatSkill3 => "Combat Skill 3",
            LogicalButton::CombatSkill4 => "Combat Skill 4",
            LogicalButton::Guard => "Guard",
            LogicalButton::Strafe => "Strafe",
            LogicalButton::Rotate => "Rotate",
            LogicalButton::SkillModifier => "Combat Skill Modifier",
        }
    }

    pub fn all() -> [LogicalButton; 12] {
        [
            LogicalButton::Mainhand,
            LogicalButton::Offhand,
            LogicalButton::Tool,
            LogicalButton::Dodge,
            LogicalButton::CombatSkill1,
            LogicalButton::CombatSkill2,
            LogicalButton::CombatSkill3,
            LogicalButton::CombatSkill4,
            LogicalButton::Guard,
            LogicalButton::Strafe,
            LogicalButton::Rotate,
            LogicalButton::SkillModifier,
        ]
    }
}

/// Serializable wrapper for KeyCode (stores the variant name)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SerializableKeyCode(String);

impl From<KeyCode> for SerializableKeyCode {
    fn from(key: KeyCode) -> Self {
        Self(format!("{:?}", key))
    }
}

impl SerializableKeyCode {
    /// Parse the stored name back into a KeyCode.
    pub fn to_key_code(&self) -> Option<KeyCode> {
        let key = match self.0.as_str() {
            "Escape" => KeyCode::Escape,
            "Enter" => KeyCode::Enter,
            "Space" => KeyCode::Space,
            "Tab" => KeyCode::Tab,
            "ShiftLeft" => KeyCode::ShiftLeft,
            "ShiftRight" => KeyCode::ShiftRight,
            "ControlLeft" => KeyCode::ControlLeft,
            "AltLeft" => KeyCode::AltLeft,
            "KeyA" => KeyCode::KeyA,
            "KeyC" => KeyCode::KeyC,
            "KeyD" => KeyCode::KeyD,
            "KeyE" => KeyCode::KeyE,
            "KeyF" => KeyCode::KeyF,
            "KeyQ" => KeyCode::KeyQ,
            "KeyR" => KeyCode::KeyR,
            "KeyS" => KeyCode::KeyS,
            "KeyV" => KeyCode::KeyV,
            "KeyW" => KeyCode::KeyW,
            "KeyX" => KeyCode::KeyX,
            "KeyZ" => KeyCode::KeyZ,
            "Digit1" => KeyCode::Digit1,
            "Digit2" => KeyCode::Digit2,
            "Digit3" => KeyCode::Digit3,
            "Digit4" => KeyCode::Digit4,
            "ArrowUp" => KeyCode::ArrowUp,
            "ArrowDown" => KeyCode::ArrowDown,
            "ArrowLeft" => KeyCode::ArrowLeft,
            "ArrowRight" => KeyCode::ArrowRight,
            _ => return None,
        };
        Some(key)
    }
}

/// Key binding with primary and optional secondary key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyBinding {
    #[serde(with = "keycode_serde")]
    pub primary: KeyCode,
    #[serde(default, with = "option_keycode_serde")]
    pub secondary: Option<KeyCode>,
}

mod keycode_serde {
    use super::*;
    use serde::de::Error;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(key: &KeyCode, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sk: SerializableKeyCode = (*key).into();
        sk.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<KeyCode, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sk = SerializableKeyCode::deserialize(deserializer)?;
        sk.to_key_code()
            .ok_or_else(|| D::Error::custom(format!("unsupported key {:?}", sk.0)))
    }
}

mod option_keycode_serde {
    use super::*;
    use serde::de::Error;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(key: &Option<KeyCode>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match key {
            Some(k) => {
                let sk: SerializableKeyCode = (*k).into();
                serializer.serialize_some(&sk)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<KeyCode>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt_sk: Option<SerializableKeyCode> = Option::deserialize(deserializer)?;
        opt_sk
            .map(|sk| {
                sk.to_key_code()
                    .ok_or_else(|| D::Error::custom(format!("unsupported key {:?}", sk.0)))
            })
            .transpose()
    }
}

impl KeyBinding {
    pub fn new(primary: KeyCode) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    pub fn with_secondary(primary: KeyCode, secondary: KeyCode) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    pub fn matches(&self, key: KeyCode) -> bool {
        self.primary == key || self.secondary == Some(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = KeyCode> {
        std::iter::once(self.primary).chain(self.secondary)
    }
}

/// Complete keybindings configuration
#[derive(Debug, Clone, Resource, Serialize, Deserialize, PartialEq)]
pub struct Keybindings {
    bindings: HashMap<LogicalButton, KeyBinding>,
}

impl Default for Keybindings {
    fn default() -> Self {
        Self::create_defaults()
    }
}

impl Keybindings {
    /// Create default keybindings
    pub fn create_defaults() -> Self {
        let mut bindings = HashMap::new();

        // Actions
        bindings.insert(LogicalButton::Mainhand, KeyBinding::new(KeyCode::KeyZ));
        bindings.insert(LogicalButton::Offhand, KeyBinding::new(KeyCode::KeyX));
        bindings.insert(LogicalButton::Tool, KeyBinding::new(KeyCode::KeyC));
        bindings.insert(LogicalButton::Dodge, KeyBinding::with_secondary(KeyCode::Space, KeyCode::KeyV));

        // Combat skills (dedicated keys)
        bindings.insert(LogicalButton::CombatSkill1, KeyBinding::new(KeyCode::Digit1));
        bindings.insert(LogicalButton::CombatSkill2, KeyBinding::new(KeyCode::Digit2));
        bindings.insert(LogicalButton::CombatSkill3, KeyBinding::new(KeyCode::Digit3));
        bindings.insert(LogicalButton::CombatSkill4, KeyBinding::new(KeyCode::Digit4));

        // Modifiers
        bindings.insert(LogicalButton::Guard, KeyBinding::new(KeyCode::KeyE));
        bindings.insert(LogicalButton::Strafe, KeyBinding::new(KeyCode::ShiftLeft));
        bindings.insert(LogicalButton::Rotate, KeyBinding::new(KeyCode::KeyR));
        bindings.insert(
            LogicalButton::SkillModifier,
            KeyBinding::with_secondary(KeyCode::KeyQ, KeyCode::ControlLeft),
        );

        Self { bindings }
    }

    /// Get the binding for a button
    pub fn get(&self, button: LogicalButton) -> Option<&KeyBinding> {
        self.bindings.get(&button)
    }

    /// Set a new binding for a button
    pub fn set(&mut self, button: LogicalButton, binding: KeyBinding) {
        self.bindings.insert(button, binding);
    }

    /// Check if a button is currently held
    pub fn button_pressed(&self, button: LogicalButton, keyboard: &ButtonInput<KeyCode>) -> bool {
        self.get(button)
            .is_some_and(|binding| binding.keys().any(|key| keyboard.pressed(key)))
    }

    /// Check if a button went down this frame
    pub fn button_just_pressed(&self, button: LogicalButton, keyboard: &ButtonInput<KeyCode>) -> bool {
        self.get(button)
            .is_some_and(|binding| binding.keys().any(|key| keyboard.just_pressed(key)))
    }

    /// Check if a key is already bound to any button (for conflict detection)
    pub fn is_key_bound(&self, key: KeyCode, exclude: Option<LogicalButton>) -> Option<LogicalButton> {
        self.bindings
            .iter()
            .filter(|(button, _)| Some(**button) != exclude)
            .find(|(_, binding)| binding.matches(key))
            .map(|(button, _)| *button)
    }

    /// First key bound to a button, for scripted input.
    pub fn primary_key(&self, button: LogicalButton) -> Option<KeyCode> {
        self.get(button).map(|binding| binding.primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_button_has_a_default_binding() {
        let bindings = Keybindings::default();
        for button in LogicalButton::all() {
            assert!(bindings.get(button).is_some(), "{:?} is unbound", button);
        }
    }

    #[test]
    fn test_secondary_key_counts_as_pressed() {
        let bindings = Keybindings::default();
        let mut keyboard = ButtonInput::<KeyCode>::default();
        keyboard.press(KeyCode::ControlLeft);
        assert!(bindings.button_pressed(LogicalButton::SkillModifier, &keyboard));
        assert!(bindings.button_just_pressed(LogicalButton::SkillModifier, &keyboard));
        keyboard.clear();
        assert!(bindings.button_pressed(LogicalButton::SkillModifier, &keyboard));
        assert!(!bindings.button_just_pressed(LogicalButton::SkillModifier, &keyboard));
    }

    #[test]
    fn test_conflict_detection_skips_excluded_button() {
        let bindings = Keybindings::default();
        assert_eq!(bindings.is_key_bound(KeyCode::KeyZ, None), Some(LogicalButton::Mainhand));
        assert_eq!(bindings.is_key_bound(KeyCode::KeyZ, Some(LogicalButton::Mainhand)), None);
    }

    #[test]
    fn test_keybindings_round_trip_through_ron() {
        let bindings = Keybindings::default();
        let text = ron::to_string(&bindings).unwrap();
        let parsed: Keybindings = ron::from_str(&text).unwrap();
        assert_eq!(parsed, bindings);
    }
}
