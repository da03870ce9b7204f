//! Combatant Components
//!
//! `BattlerState` is the per-combatant runtime state the core reads and
//! writes: cooldowns, aggro, known skills, charge progress and targets. It is
//! attached to a combatant entity next to its `Vitals` and `TilePosition`;
//! the core is consulted from systems rather than by extending the entity.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::traits::AITraitSet;
use crate::skills::{SkillDefinition, SkillId, SkillProfile};

/// Stable identifier of a combatant, used instead of entity references so a
/// removed combatant can't be dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BattlerId(pub u32);

impl fmt::Display for BattlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Slots & keys
// ============================================================================

/// Equipment slots a player-controlled combatant can fire skills from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillSlot {
    Mainhand,
    Offhand,
    Tool,
    Dodge,
    CombatSkill1,
    CombatSkill2,
    CombatSkill3,
    CombatSkill4,
}

impl SkillSlot {
    /// Slots whose input can be held to charge.
    pub const CHARGEABLE: [SkillSlot; 6] = [
        SkillSlot::Mainhand,
        SkillSlot::Offhand,
        SkillSlot::CombatSkill1,
        SkillSlot::CombatSkill2,
        SkillSlot::CombatSkill3,
        SkillSlot::CombatSkill4,
    ];

    /// Slots that only ever fire on a press edge.
    pub const TRIGGER_ONLY: [SkillSlot; 2] = [SkillSlot::Tool, SkillSlot::Dodge];

    pub fn name(&self) -> &'static str {
        match self {
            SkillSlot::Mainhand => "mainhand",
            SkillSlot::Offhand => "offhand",
            SkillSlot::Tool => "tool",
            SkillSlot::Dodge => "dodge",
            SkillSlot::CombatSkill1 => "combat skill 1",
            SkillSlot::CombatSkill2 => "combat skill 2",
            SkillSlot::CombatSkill3 => "combat skill 3",
            SkillSlot::CombatSkill4 => "combat skill 4",
        }
    }
}

/// What a cooldown timer is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CooldownKey {
    /// Shared by whatever skill is equipped in the slot.
    Slot(SkillSlot),
    /// Private to one skill (AI skills and `<unique>` skills).
    Skill(SkillId),
}

impl CooldownKey {
    /// Key a player skill cools down under.
    pub fn for_player(slot: SkillSlot, profile: &SkillProfile) -> Self {
        if profile.unique_cooldown_slot {
            CooldownKey::Skill(profile.skill_id)
        } else {
            CooldownKey::Slot(slot)
        }
    }
}

/// Hold progress of one chargeable input slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeProgress {
    /// Frames the input has been held in the current press cycle.
    pub held_frames: u32,
    /// Frames left before charging starts; 0 while charging.
    pub delay_remaining: u32,
}

impl ChargeProgress {
    pub fn new(input_delay: u32) -> Self {
        Self {
            held_frames: 0,
            delay_remaining: input_delay,
        }
    }

    pub fn is_charging(&self) -> bool {
        self.delay_remaining == 0
    }

    pub fn reset(&mut self, input_delay: u32) {
        *self = Self::new(input_delay);
    }
}

// ============================================================================
// BattlerState
// ============================================================================

/// Runtime combat state owned by one combatant.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct BattlerState {
    pub id: BattlerId,
    pub team: u8,
    pub aggro: i32,
    pub known_skill_ids: BTreeSet<SkillId>,
    cooldowns: HashMap<CooldownKey, u32>,
    charge_progress: HashMap<SkillSlot, ChargeProgress>,
    pub traits: AITraitSet,
    /// Ally this combatant is currently supporting (heal target).
    pub ally_target: Option<BattlerId>,
    /// Enemy this combatant is currently fighting.
    pub current_target: Option<BattlerId>,
    /// Leader that decides for this combatant when it is a follower.
    pub leader: Option<BattlerId>,
    pub basic_attack_skill_id: SkillId,
    pub sight_range: i32,
}

impl BattlerState {
    pub fn new(id: BattlerId, team: u8, basic_attack_skill_id: SkillId, sight_range: i32) -> Self {
        Self {
            id,
            team,
            aggro: 0,
            known_skill_ids: BTreeSet::new(),
            cooldowns: HashMap::new(),
            charge_progress: HashMap::new(),
            traits: AITraitSet::default(),
            ally_target: None,
            current_target: None,
            leader: None,
            basic_attack_skill_id,
            sight_range,
        }
    }

    pub fn with_skills(mut self, skills: impl IntoIterator<Item = SkillId>) -> Self {
        self.known_skill_ids.extend(skills);
        self
    }

    pub fn with_traits(mut self, traits: AITraitSet) -> Self {
        self.traits = traits;
        self
    }

    pub fn with_leader(mut self, leader: BattlerId) -> Self {
        self.leader = Some(leader);
        self
    }

    pub fn knows(&self, skill_id: SkillId) -> bool {
        self.known_skill_ids.contains(&skill_id)
    }

    pub fn learn(&mut self, skill_id: SkillId) {
        self.known_skill_ids.insert(skill_id);
    }

    // === Cooldowns ===

    pub fn cooldown_remaining(&self, key: CooldownKey) -> u32 {
        self.cooldowns.get(&key).copied().unwrap_or(0)
    }

    pub fn is_on_cooldown(&self, key: CooldownKey) -> bool {
        self.cooldown_remaining(key) > 0
    }

    /// Start (or restart) a cooldown. Non-positive durations clear it.
    pub fn start_cooldown(&mut self, key: CooldownKey, frames: i32) {
        if frames > 0 {
            self.cooldowns.insert(key, frames as u32);
        } else {
            self.cooldowns.remove(&key);
        }
    }

    /// Advance every cooldown by one frame; finished entries are removed.
    pub fn tick_cooldowns(&mut self) {
        self.cooldowns.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(1);
            *remaining > 0
        });
    }

    pub fn active_cooldowns(&self) -> usize {
        self.cooldowns.len()
    }

    // === Charge ===

    pub fn charge(&self, slot: SkillSlot) -> Option<&ChargeProgress> {
        self.charge_progress.get(&slot)
    }

    /// Charge progress for a slot, created at the full delay on first use.
    pub fn charge_mut(&mut self, slot: SkillSlot, input_delay: u32) -> &mut ChargeProgress {
        self.charge_progress
            .entry(slot)
            .or_insert_with(|| ChargeProgress::new(input_delay))
    }

    pub fn is_charging(&self, slot: SkillSlot) -> bool {
        self.charge(slot).is_some_and(ChargeProgress::is_charging)
    }

    // === Aggro ===

    pub fn add_aggro(&mut self, amount: i32) {
        self.aggro = self.aggro.saturating_add(amount).max(0);
    }

    /// Book-keeping after this combatant used a skill: cooldown and aggro.
    pub fn record_skill_use(
        &mut self,
        profile: &SkillProfile,
        key: CooldownKey,
        cooldown: i32,
        base_aggro: i32,
    ) {
        self.start_cooldown(key, cooldown);
        self.add_aggro(profile.aggro_for_use(base_aggro));
    }

    /// Drop everything tied to being on the battlefield.
    pub fn clear(&mut self) {
        self.aggro = 0;
        self.cooldowns.clear();
        self.charge_progress.clear();
        self.ally_target = None;
        self.current_target = None;
    }
}

// ============================================================================
// Companion components
// ============================================================================

/// HP/MP/TP pools of a combatant.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub tp: i32,
}

impl Vitals {
    pub fn new(max_hp: i32, max_mp: i32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            mp: max_mp,
            max_mp,
            tp: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// HP as a ratio (0.0 to 1.0)
    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp > 0 {
            self.hp as f32 / self.max_hp as f32
        } else {
            0.0
        }
    }

    pub fn can_pay(&self, skill: &SkillDefinition) -> bool {
        self.mp >= skill.mp_cost && self.tp >= skill.tp_cost
    }
}

/// Tile the combatant stands on.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TilePosition(pub IVec2);

/// Skills equipped per slot on a player-controlled combatant.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillLoadout {
    pub slots: HashMap<SkillSlot, SkillId>,
}

impl SkillLoadout {
    pub fn equip(&mut self, slot: SkillSlot, skill_id: SkillId) {
        self.slots.insert(slot, skill_id);
    }

    pub fn get(&self, slot: SkillSlot) -> Option<SkillId> {
        self.slots.get(&slot).copied()
    }
}

/// Marks the combatant driven by raw input.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PlayerControlled;

/// Think cadence for an autonomous combatant.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiController {
    pub think_interval: u32,
    /// Frames until the next think tick; 0 means "think this frame".
    pub think_remaining: u32,
}

impl AiController {
    pub fn new(think_interval: u32) -> Self {
        Self {
            think_interval: think_interval.max(1),
            think_remaining: 0,
        }
    }

    pub fn ready(&self) -> bool {
        self.think_remaining == 0
    }

    pub fn tick(&mut self) {
        self.think_remaining = self.think_remaining.saturating_sub(1);
    }

    pub fn restart(&mut self) {
        self.think_remaining = self.think_interval;
    }
}

/// Added once a combatant has been cleared off the battlefield.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Defeated;

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> BattlerState {
        BattlerState::new(BattlerId(1), 1, 1, 8)
    }

    #[test]
    fn test_cooldown_counts_down_and_disappears() {
        let mut s = state();
        let key = CooldownKey::Skill(5);
        s.start_cooldown(key, 3);
        assert_eq!(s.cooldown_remaining(key), 3);

        s.tick_cooldowns();
        s.tick_cooldowns();
        assert_eq!(s.cooldown_remaining(key), 1);
        assert!(s.is_on_cooldown(key));

        s.tick_cooldowns();
        assert!(!s.is_on_cooldown(key));
        assert_eq!(s.active_cooldowns(), 0);

        s.tick_cooldowns();
        assert_eq!(s.cooldown_remaining(key), 0);
    }

    #[test]
    fn test_non_positive_cooldown_clears_entry() {
        let mut s = state();
        let key = CooldownKey::Slot(SkillSlot::Mainhand);
        s.start_cooldown(key, 10);
        s.start_cooldown(key, 0);
        assert!(!s.is_on_cooldown(key));
        s.start_cooldown(key, -4);
        assert_eq!(s.active_cooldowns(), 0);
    }

    #[test]
    fn test_unique_skills_use_their_own_cooldown_key() {
        let mut profile = SkillProfile::untagged(9);
        assert_eq!(
            CooldownKey::for_player(SkillSlot::Offhand, &profile),
            CooldownKey::Slot(SkillSlot::Offhand)
        );
        profile.unique_cooldown_slot = true;
        assert_eq!(CooldownKey::for_player(SkillSlot::Offhand, &profile), CooldownKey::Skill(9));
    }

    #[test]
    fn test_record_skill_use_sets_cooldown_and_aggro() {
        let mut s = state();
        let mut profile = SkillProfile::untagged(4);
        profile.bonus_aggro = 5;
        s.record_skill_use(&profile, CooldownKey::Skill(4), 30, 10);
        assert_eq!(s.cooldown_remaining(CooldownKey::Skill(4)), 30);
        assert_eq!(s.aggro, 15);
    }

    #[test]
    fn test_clear_resets_field_state_but_keeps_skills() {
        let mut s = state().with_skills([2, 3]);
        s.add_aggro(40);
        s.start_cooldown(CooldownKey::Skill(2), 60);
        s.charge_mut(SkillSlot::Mainhand, 24).held_frames = 12;
        s.current_target = Some(BattlerId(7));

        s.clear();

        assert_eq!(s.aggro, 0);
        assert_eq!(s.active_cooldowns(), 0);
        assert!(s.charge(SkillSlot::Mainhand).is_none());
        assert_eq!(s.current_target, None);
        assert!(s.knows(2) && s.knows(3));
    }

    #[test]
    fn test_loadout_lookup() {
        let mut loadout = SkillLoadout::default();
        loadout.equip(SkillSlot::Offhand, 7);
        loadout.equip(SkillSlot::Offhand, 8);
        assert_eq!(loadout.get(SkillSlot::Offhand), Some(8));
        assert_eq!(loadout.get(SkillSlot::Mainhand), None);
    }

    #[test]
    fn test_vitals_hp_ratio() {
        let mut v = Vitals::new(200, 50);
        v.hp = 50;
        assert_eq!(v.hp_ratio(), 0.25);
        v.max_hp = 0;
        assert_eq!(v.hp_ratio(), 0.0);
    }
}
