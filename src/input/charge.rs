//! Hold-to-charge input state machine
//!
//! Every chargeable slot is either Idle (counting down the input delay while
//! held) or Charging (delay expired, counting held frames until release).
//! Slots are evaluated independently each frame, so several can charge at
//! once.
//!
//! Mainhand and Offhand are disqualified while the combat-skill modifier is
//! held: the same buttons then select combat skills 1 and 2 instead.

use smallvec::SmallVec;

use super::InputSource;
use crate::combat::battler::{BattlerState, ChargeProgress, SkillSlot};
use crate::combat::events::SlotInputKind;
use crate::keybindings::LogicalButton;

/// One slot's output for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotInput {
    pub slot: SkillSlot,
    pub kind: SlotInputKind,
}

/// What the state machine sees of one slot in one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotSample {
    pub held: bool,
    pub triggered: bool,
    pub disqualified: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct InputChargeController {
    input_delay: u32,
}

impl InputChargeController {
    /// A zero delay is treated as one frame.
    pub fn new(input_delay: u32) -> Self {
        Self {
            input_delay: input_delay.max(1),
        }
    }

    pub fn input_delay(&self) -> u32 {
        self.input_delay
    }

    /// Sample every slot for one frame and advance its charge state.
    pub fn update(&self, state: &mut BattlerState, input: &impl InputSource) -> SmallVec<[SlotInput; 4]> {
        let mut out = SmallVec::new();

        for slot in SkillSlot::CHARGEABLE {
            let sample = sample_slot(slot, input);
            let progress = state.charge_mut(slot, self.input_delay);
            if let Some(kind) = self.step(progress, sample) {
                out.push(SlotInput { slot, kind });
            }
        }

        let modifier = input.is_pressed(LogicalButton::SkillModifier);
        for slot in SkillSlot::TRIGGER_ONLY {
            if input.is_triggered(base_button(slot)) && !modifier {
                out.push(SlotInput {
                    slot,
                    kind: SlotInputKind::Triggered,
                });
            }
        }

        out
    }

    /// Advance one slot by one frame.
    pub fn step(&self, progress: &mut ChargeProgress, sample: SlotSample) -> Option<SlotInputKind> {
        if progress.is_charging() {
            if sample.disqualified {
                progress.reset(self.input_delay);
                return Some(SlotInputKind::ChargeCancelled);
            }
            if !sample.held {
                let held_frames = progress.held_frames;
                progress.reset(self.input_delay);
                return Some(SlotInputKind::ChargeReleased { held_frames });
            }
            progress.held_frames += 1;
            return None;
        }

        if sample.triggered && !sample.disqualified {
            progress.reset(self.input_delay);
            progress.held_frames = u32::from(sample.held);
            return Some(SlotInputKind::Triggered);
        }

        if sample.disqualified || !sample.held {
            progress.reset(self.input_delay);
            return None;
        }

        progress.held_frames += 1;
        progress.delay_remaining = progress.delay_remaining.saturating_sub(1);
        progress.is_charging().then_some(SlotInputKind::ChargeStarted)
    }
}

/// Button that a slot is fired with, or combined with the modifier for.
fn base_button(slot: SkillSlot) -> LogicalButton {
    match slot {
        SkillSlot::Mainhand | SkillSlot::CombatSkill1 => LogicalButton::Mainhand,
        SkillSlot::Offhand | SkillSlot::CombatSkill2 => LogicalButton::Offhand,
        SkillSlot::Tool | SkillSlot::CombatSkill3 => LogicalButton::Tool,
        SkillSlot::Dodge | SkillSlot::CombatSkill4 => LogicalButton::Dodge,
    }
}

fn dedicated_button(slot: SkillSlot) -> Option<LogicalButton> {
    match slot {
        SkillSlot::CombatSkill1 => Some(LogicalButton::CombatSkill1),
        SkillSlot::CombatSkill2 => Some(LogicalButton::CombatSkill2),
        SkillSlot::CombatSkill3 => Some(LogicalButton::CombatSkill3),
        SkillSlot::CombatSkill4 => Some(LogicalButton::CombatSkill4),
        _ => None,
    }
}

pub fn sample_slot(slot: SkillSlot, input: &impl InputSource) -> SlotSample {
    let modifier = input.is_pressed(LogicalButton::SkillModifier);
    let base = base_button(slot);

    match dedicated_button(slot) {
        Some(dedicated) => SlotSample {
            held: (modifier && input.is_pressed(base)) || input.is_pressed(dedicated),
            triggered: (modifier && input.is_triggered(base)) || input.is_triggered(dedicated),
            disqualified: false,
        },
        None => SlotSample {
            held: input.is_pressed(base),
            triggered: input.is_triggered(base) && !modifier,
            disqualified: modifier,
        },
    }
}
