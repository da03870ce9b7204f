//! Skills
//!
//! - `tags`: generic annotation tag extraction and coercion
//! - `profile`: resolved, cached combat profile per skill
//! - `database`: skill definitions loaded from RON, the annotation source

pub mod database;
pub mod profile;
pub mod tags;

pub use database::{SkillDatabase, SkillDefinition, SkillEffect, SkillScope};
pub use profile::{
    ComboData, GuardData, HitboxShape, MoveType, PiercingData, ProfileBuilder, ProjectileCount,
    SkillDelay, SkillProfile, SkillProfiles,
};
pub use tags::{TagPattern, TagResolver, TagValue};

/// Identifier of a skill definition.
pub type SkillId = i32;

/// Anything that can hand out the annotation text of a skill.
pub trait SkillSource {
    fn annotation_text(&self, skill_id: SkillId) -> Option<&str>;
}

impl SkillSource for std::collections::HashMap<SkillId, String> {
    fn annotation_text(&self, skill_id: SkillId) -> Option<&str> {
        self.get(&skill_id).map(String::as_str)
    }
}
