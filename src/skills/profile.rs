//! Skill Combat Profiles
//!
//! A `SkillProfile` is the structured view of everything the combat core needs
//! to know about a skill: timing, reach, hitbox, piercing, combo links and
//! aggro. Profiles are resolved from annotation tags once and cached.

use bevy::log::warn;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::tags::{TagResolver, TagValue};
use super::{SkillId, SkillSource};
use crate::constants::{
    AI_COOLDOWN_UNSET, DEFAULT_DURATION_ON_FIELD, DEFAULT_PIERCE_COUNT, DEFAULT_PROXIMITY,
    MIN_CAST_TIME,
};

// ============================================================================
// Tag names
// ============================================================================

const TAG_DELAY: &str = "delay";
const TAG_BONUS_AGGRO: &str = "bonusAggro";
const TAG_AGGRO_MULTIPLIER: &str = "aggroMultiplier";
const TAG_DIRECT: &str = "direct";
const TAG_BONUS_HITS: &str = "bonusHits";
const TAG_IGNORE_PARRY: &str = "ignoreParry";
const TAG_GUARD: &str = "guard";
const TAG_PARRY: &str = "parry";
const TAG_COUNTER_PARRY: &str = "counterParry";
const TAG_COUNTER_GUARD: &str = "counterGuard";
const TAG_CAST_ANIMATION: &str = "castAnimation";
const TAG_CAST_TIME: &str = "castTime";
const TAG_COOLDOWN: &str = "cooldown";
const TAG_AI_COOLDOWN: &str = "aiCooldown";
const TAG_RANGE: &str = "range";
const TAG_ACTION_ID: &str = "actionId";
const TAG_DURATION: &str = "duration";
const TAG_SHAPE: &str = "shape";
const TAG_PROJECTILE: &str = "projectile";
const TAG_PIERCE: &str = "pierce";
const TAG_COMBO: &str = "combo";
const TAG_FREE_COMBO: &str = "freeCombo";
const TAG_PROXIMITY: &str = "proximity";
const TAG_KNOCKBACK: &str = "knockback";
const TAG_INVINCIBLE: &str = "invincible";
const TAG_UNIQUE: &str = "unique";
const TAG_MOVE_TYPE: &str = "moveType";

const VALUE_TAGS: &[&str] = &[
    TAG_DELAY,
    TAG_BONUS_AGGRO,
    TAG_AGGRO_MULTIPLIER,
    TAG_BONUS_HITS,
    TAG_IGNORE_PARRY,
    TAG_GUARD,
    TAG_PARRY,
    TAG_COUNTER_PARRY,
    TAG_COUNTER_GUARD,
    TAG_CAST_ANIMATION,
    TAG_CAST_TIME,
    TAG_COOLDOWN,
    TAG_AI_COOLDOWN,
    TAG_RANGE,
    TAG_ACTION_ID,
    TAG_DURATION,
    TAG_SHAPE,
    TAG_PROJECTILE,
    TAG_PIERCE,
    TAG_COMBO,
    TAG_PROXIMITY,
    TAG_KNOCKBACK,
    TAG_MOVE_TYPE,
];

const FLAG_TAGS: &[&str] = &[TAG_DIRECT, TAG_FREE_COMBO, TAG_INVINCIBLE, TAG_UNIQUE];

// ============================================================================
// Attribute types
// ============================================================================

/// Delay before a placed skill goes off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillDelay {
    /// Frames before the skill triggers on its own.
    pub duration: i32,
    /// Whether touching the hitbox triggers it early.
    pub touch_to_trigger: bool,
}

/// Damage reduction granted while guarding with this skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GuardData {
    pub reduction: i32,
    pub is_percent: bool,
}

/// How many targets a hitbox can pass through and how often it re-hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiercingData {
    pub count: i32,
    pub interval: i32,
}

impl Default for PiercingData {
    fn default() -> Self {
        Self {
            count: DEFAULT_PIERCE_COUNT,
            interval: 0,
        }
    }
}

/// Link to the follow-up skill of a combo chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboData {
    pub next_skill_id: SkillId,
    /// Frames during which the follow-up input is accepted.
    pub input_window: i32,
}

/// Hitbox geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HitboxShape {
    #[default]
    Rhombus,
    Square,
    FrontSquare,
    Line,
    Arc,
    Wall,
    Cross,
}

impl HitboxShape {
    pub fn from_tag(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rhombus" => Some(HitboxShape::Rhombus),
            "square" => Some(HitboxShape::Square),
            "frontsquare" => Some(HitboxShape::FrontSquare),
            "line" => Some(HitboxShape::Line),
            "arc" => Some(HitboxShape::Arc),
            "wall" => Some(HitboxShape::Wall),
            "cross" => Some(HitboxShape::Cross),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HitboxShape::Rhombus => "rhombus",
            HitboxShape::Square => "square",
            HitboxShape::FrontSquare => "frontsquare",
            HitboxShape::Line => "line",
            HitboxShape::Arc => "arc",
            HitboxShape::Wall => "wall",
            HitboxShape::Cross => "cross",
        }
    }
}

/// Number of projectiles a skill spawns. Only a handful of fan-outs exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProjectileCount {
    #[default]
    One,
    Two,
    Three,
    Four,
    Eight,
}

impl ProjectileCount {
    pub fn from_count(count: i32) -> Option<Self> {
        match count {
            1 => Some(ProjectileCount::One),
            2 => Some(ProjectileCount::Two),
            3 => Some(ProjectileCount::Three),
            4 => Some(ProjectileCount::Four),
            8 => Some(ProjectileCount::Eight),
            _ => None,
        }
    }

    pub fn count(&self) -> i32 {
        match self {
            ProjectileCount::One => 1,
            ProjectileCount::Two => 2,
            ProjectileCount::Three => 3,
            ProjectileCount::Four => 4,
            ProjectileCount::Eight => 8,
        }
    }
}

/// Which way the caster moves while the skill executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MoveType {
    #[default]
    Forward,
    Backward,
    Directional,
}

impl MoveType {
    pub fn from_tag(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "forward" => Some(MoveType::Forward),
            "backward" => Some(MoveType::Backward),
            "directional" => Some(MoveType::Directional),
            _ => None,
        }
    }
}

// ============================================================================
// SkillProfile
// ============================================================================

/// Resolved combat attributes of a single skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    pub skill_id: SkillId,
    pub delay: SkillDelay,
    pub bonus_aggro: i32,
    pub aggro_multiplier: f32,
    /// Direct skills hit the target without spawning a field hitbox.
    pub is_direct: bool,
    pub bonus_hits: i32,
    /// Chance-like parry penetration; -1 always ignores parry.
    pub ignore_parry: i32,
    pub guard: GuardData,
    pub parry_window: i32,
    pub counter_parry_skill_id: SkillId,
    pub counter_guard_skill_id: SkillId,
    pub caster_animation_id: i32,
    pub cast_time: i32,
    pub cooldown: i32,
    /// -1 means "use `cooldown`".
    pub ai_cooldown: i32,
    pub range: i32,
    pub action_id: i32,
    pub duration_on_field: i32,
    pub hitbox_shape: HitboxShape,
    pub projectile_count: ProjectileCount,
    pub piercing: PiercingData,
    pub combo: Option<ComboData>,
    pub free_combo: bool,
    pub proximity: i32,
    /// `None` is "no knockback"; `Some(0)` is an explicit zero-tile shove.
    pub knockback: Option<i32>,
    pub invincible_on_use: bool,
    /// Cools down under its own key instead of the slot it is equipped in.
    pub unique_cooldown_slot: bool,
    pub move_type: MoveType,
}

impl SkillProfile {
    /// Profile of a skill with no tags at all.
    pub fn untagged(skill_id: SkillId) -> Self {
        Self {
            skill_id,
            delay: SkillDelay::default(),
            bonus_aggro: 0,
            aggro_multiplier: 1.0,
            is_direct: false,
            bonus_hits: 0,
            ignore_parry: 0,
            guard: GuardData::default(),
            parry_window: 0,
            counter_parry_skill_id: 0,
            counter_guard_skill_id: 0,
            caster_animation_id: 0,
            cast_time: MIN_CAST_TIME,
            cooldown: 0,
            ai_cooldown: AI_COOLDOWN_UNSET,
            range: 0,
            action_id: 0,
            duration_on_field: DEFAULT_DURATION_ON_FIELD,
            hitbox_shape: HitboxShape::default(),
            projectile_count: ProjectileCount::default(),
            piercing: PiercingData::default(),
            combo: None,
            free_combo: false,
            proximity: DEFAULT_PROXIMITY,
            knockback: None,
            invincible_on_use: false,
            unique_cooldown_slot: false,
            move_type: MoveType::default(),
        }
    }

    /// Cooldown applied when an AI-controlled combatant uses this skill.
    pub fn effective_ai_cooldown(&self) -> i32 {
        if self.ai_cooldown == AI_COOLDOWN_UNSET || self.ai_cooldown < 0 {
            self.cooldown
        } else {
            self.ai_cooldown
        }
    }

    /// Aggro generated by one use of this skill.
    pub fn aggro_for_use(&self, base_aggro: i32) -> i32 {
        let base = base_aggro.saturating_add(self.bonus_aggro);
        let scaled = f64::from(base) * f64::from(self.aggro_multiplier);
        scaled.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
    }

    pub fn always_ignores_parry(&self) -> bool {
        self.ignore_parry == crate::constants::IGNORE_PARRY_ALWAYS
    }
}

/// Builds profiles from annotation text.
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    tags: TagResolver,
}

impl Default for ProfileBuilder {
    fn default() -> Self {
        Self {
            tags: TagResolver::with_tags(VALUE_TAGS, FLAG_TAGS),
        }
    }
}

impl ProfileBuilder {
    /// Resolve a profile from a skill's annotation text.
    pub fn build(&self, skill_id: SkillId, text: &str) -> SkillProfile {
        let defaults = SkillProfile::untagged(skill_id);
        let tags = &self.tags;

        SkillProfile {
            skill_id,
            delay: self.delay(text).unwrap_or(defaults.delay),
            bonus_aggro: tags.int(text, TAG_BONUS_AGGRO, defaults.bonus_aggro),
            aggro_multiplier: tags.float(text, TAG_AGGRO_MULTIPLIER, defaults.aggro_multiplier),
            is_direct: tags.flag(text, TAG_DIRECT),
            bonus_hits: tags.int(text, TAG_BONUS_HITS, defaults.bonus_hits),
            ignore_parry: tags.int(text, TAG_IGNORE_PARRY, defaults.ignore_parry),
            guard: self.guard(text).unwrap_or(defaults.guard),
            parry_window: tags.int(text, TAG_PARRY, defaults.parry_window),
            counter_parry_skill_id: tags.int(text, TAG_COUNTER_PARRY, defaults.counter_parry_skill_id),
            counter_guard_skill_id: tags.int(text, TAG_COUNTER_GUARD, defaults.counter_guard_skill_id),
            caster_animation_id: tags.int(text, TAG_CAST_ANIMATION, defaults.caster_animation_id),
            cast_time: tags.int(text, TAG_CAST_TIME, defaults.cast_time).max(MIN_CAST_TIME),
            cooldown: tags.int(text, TAG_COOLDOWN, defaults.cooldown),
            ai_cooldown: tags.int(text, TAG_AI_COOLDOWN, defaults.ai_cooldown),
            range: tags.int(text, TAG_RANGE, defaults.range),
            action_id: tags.int(text, TAG_ACTION_ID, defaults.action_id),
            duration_on_field: tags.int(text, TAG_DURATION, defaults.duration_on_field),
            hitbox_shape: self.shape(text).unwrap_or(defaults.hitbox_shape),
            projectile_count: self.projectile(text).unwrap_or(defaults.projectile_count),
            piercing: self.piercing(text).unwrap_or(defaults.piercing),
            combo: self.combo(text),
            free_combo: tags.flag(text, TAG_FREE_COMBO),
            proximity: tags.int(text, TAG_PROXIMITY, defaults.proximity),
            knockback: tags.int_opt(text, TAG_KNOCKBACK),
            invincible_on_use: tags.flag(text, TAG_INVINCIBLE),
            unique_cooldown_slot: tags.flag(text, TAG_UNIQUE),
            move_type: self.move_type(text).unwrap_or(defaults.move_type),
        }
    }

    fn delay(&self, text: &str) -> Option<SkillDelay> {
        let items = self.tags.tuple(text, TAG_DELAY, 2)?;
        let parsed = int_and_bool(&items);
        if parsed.is_none() {
            warn!("Tag <{}> expects [frames, bool], using default", TAG_DELAY);
        }
        let (duration, touch_to_trigger) = parsed?;
        Some(SkillDelay {
            duration,
            touch_to_trigger,
        })
    }

    fn guard(&self, text: &str) -> Option<GuardData> {
        let items = self.tags.tuple(text, TAG_GUARD, 2)?;
        let parsed = int_and_bool(&items);
        if parsed.is_none() {
            warn!("Tag <{}> expects [reduction, bool], using default", TAG_GUARD);
        }
        let (reduction, is_percent) = parsed?;
        Some(GuardData {
            reduction,
            is_percent,
        })
    }

    fn piercing(&self, text: &str) -> Option<PiercingData> {
        let items = self.tags.tuple(text, TAG_PIERCE, 2)?;
        let parsed = two_ints(&items);
        if parsed.is_none() {
            warn!("Tag <{}> expects [count, interval], using default", TAG_PIERCE);
        }
        let (count, interval) = parsed?;
        Some(PiercingData { count, interval })
    }

    fn combo(&self, text: &str) -> Option<ComboData> {
        let items = self.tags.tuple(text, TAG_COMBO, 2)?;
        let parsed = two_ints(&items);
        if parsed.is_none() {
            warn!("Tag <{}> expects [skillId, window], ignoring", TAG_COMBO);
        }
        let (next_skill_id, input_window) = parsed?;
        Some(ComboData {
            next_skill_id,
            input_window,
        })
    }

    fn shape(&self, text: &str) -> Option<HitboxShape> {
        let raw = self.tags.string(text, TAG_SHAPE)?;
        let shape = HitboxShape::from_tag(&raw);
        if shape.is_none() {
            warn!("Unknown hitbox shape {:?}, using default", raw);
        }
        shape
    }

    fn projectile(&self, text: &str) -> Option<ProjectileCount> {
        let raw = self.tags.string(text, TAG_PROJECTILE)?;
        let count = raw.parse::<i32>().ok().and_then(ProjectileCount::from_count);
        if count.is_none() {
            warn!("Unsupported projectile count {:?}, using default", raw);
        }
        count
    }

    fn move_type(&self, text: &str) -> Option<MoveType> {
        let raw = self.tags.string(text, TAG_MOVE_TYPE)?;
        let move_type = MoveType::from_tag(&raw);
        if move_type.is_none() {
            warn!("Unknown move type {:?}, using default", raw);
        }
        move_type
    }
}

fn int_and_bool(items: &[TagValue]) -> Option<(i32, bool)> {
    Some((items.first()?.as_i32()?, items.get(1)?.as_bool()?))
}

fn two_ints(items: &[TagValue]) -> Option<(i32, i32)> {
    Some((items.first()?.as_i32()?, items.get(1)?.as_i32()?))
}

// ============================================================================
// Cache
// ============================================================================

/// Lazily-populated profile cache shared by every combatant.
///
/// Resolution is idempotent, so concurrent readers may race to fill the same
/// entry; the second insert is identical to the first.
#[derive(Resource, Default)]
pub struct SkillProfiles {
    builder: ProfileBuilder,
    cache: RwLock<HashMap<SkillId, Arc<SkillProfile>>>,
}

impl SkillProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve (and cache) the profile for `skill_id`.
    ///
    /// Skills the source doesn't know resolve to the untagged profile.
    pub fn resolve(&self, skill_id: SkillId, source: &dyn SkillSource) -> Arc<SkillProfile> {
        if let Some(profile) = self.cached(skill_id) {
            return profile;
        }

        let profile = match source.annotation_text(skill_id) {
            Some(text) => self.builder.build(skill_id, text),
            None => {
                warn!("Skill {} has no definition, using untagged profile", skill_id);
                SkillProfile::untagged(skill_id)
            }
        };
        let profile = Arc::new(profile);

        match self.cache.write() {
            Ok(mut cache) => cache.entry(skill_id).or_insert(profile).clone(),
            Err(_) => profile,
        }
    }

    /// Profile if it has already been resolved.
    pub fn cached(&self, skill_id: SkillId) -> Option<Arc<SkillProfile>> {
        self.cache
            .read()
            .ok()
            .and_then(|cache| cache.get(&skill_id).cloned())
    }

    pub fn len(&self) -> usize {
        self.cache.read().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
