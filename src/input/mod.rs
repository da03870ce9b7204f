//! Raw input sampling
//!
//! The charge controller reads logical buttons through `InputSource`, so it
//! can be driven by the keyboard in the app and by plain structs in tests.

pub mod charge;

use bevy::prelude::*;
use std::collections::HashSet;

use crate::keybindings::{Keybindings, LogicalButton};

pub use charge::{InputChargeController, SlotInput};

/// Per-frame view of the logical buttons.
pub trait InputSource {
    /// Button is held this frame.
    fn is_pressed(&self, button: LogicalButton) -> bool;
    /// Button went down this frame.
    fn is_triggered(&self, button: LogicalButton) -> bool;
}

/// Keyboard state seen through the configured bindings.
pub struct KeyboardInput<'a> {
    pub bindings: &'a Keybindings,
    pub keyboard: &'a ButtonInput<KeyCode>,
}

impl InputSource for KeyboardInput<'_> {
    fn is_pressed(&self, button: LogicalButton) -> bool {
        self.bindings.button_pressed(button, self.keyboard)
    }

    fn is_triggered(&self, button: LogicalButton) -> bool {
        self.bindings.button_just_pressed(button, self.keyboard)
    }
}

/// Button state written by hand, one frame at a time.
#[derive(Debug, Clone, Default)]
pub struct ButtonSnapshot {
    pressed: HashSet<LogicalButton>,
    triggered: HashSet<LogicalButton>,
}

impl ButtonSnapshot {
    /// Advance to the next frame: triggers last one frame only.
    pub fn next_frame(&mut self) {
        self.triggered.clear();
    }

    pub fn press(&mut self, button: LogicalButton) {
        if self.pressed.insert(button) {
            self.triggered.insert(button);
        }
    }

    pub fn release(&mut self, button: LogicalButton) {
        self.pressed.remove(&button);
        self.triggered.remove(&button);
    }
}

impl InputSource for ButtonSnapshot {
    fn is_pressed(&self, button: LogicalButton) -> bool {
        self.pressed.contains(&button)
    }

    fn is_triggered(&self, button: LogicalButton) -> bool {
        self.triggered.contains(&button)
    }
}
