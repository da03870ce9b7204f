//! Action dispatch seam
//!
//! The core never executes skills. Every `ActionTrigger` it produces is
//! handed to whatever `ActionDispatcher` the host installed.

use bevy::prelude::*;

use super::events::ActionTrigger;

/// Receives action triggers in production order.
pub trait ActionDispatcher: Send + Sync {
    fn dispatch(&mut self, trigger: &ActionTrigger);
}

/// Keeps every trigger it receives. Used when no host dispatcher is installed.
#[derive(Debug, Default, Clone)]
pub struct RecordingDispatcher {
    pub received: Vec<ActionTrigger>,
}

impl ActionDispatcher for RecordingDispatcher {
    fn dispatch(&mut self, trigger: &ActionTrigger) {
        self.received.push(trigger.clone());
    }
}

/// The installed dispatcher.
#[derive(Resource)]
pub struct Dispatcher(pub Box<dyn ActionDispatcher>);

impl Dispatcher {
    pub fn new(dispatcher: impl ActionDispatcher + 'static) -> Self {
        Self(Box::new(dispatcher))
    }

    pub fn dispatch(&mut self, trigger: &ActionTrigger) {
        self.0.dispatch(trigger);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(RecordingDispatcher::default())
    }
}
