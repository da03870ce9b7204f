//! Integration tests for skill profiles
//!
//! These tests verify that:
//! - Untagged skills resolve to the documented defaults
//! - The first occurrence of a tag wins
//! - The shipped skill database loads and resolves cleanly
//! - Resolution is cached per skill id

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use fieldcombat::skills::{
    HitboxShape, MoveType, PiercingData, ProfileBuilder, SkillDatabase, SkillProfile, SkillProfiles,
    SkillSource,
};
use pretty_assertions::assert_eq;

fn notes(entries: &[(i32, &str)]) -> HashMap<i32, String> {
    entries.iter().map(|(id, text)| (*id, text.to_string())).collect()
}

fn load_shipped_skills() -> SkillDatabase {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/skills.ron");
    SkillDatabase::load(&path).expect("assets/skills.ron should load")
}

// =============================================================================
// Defaults & precedence
// =============================================================================

#[test]
fn test_every_attribute_defaults_without_tags() {
    let profile = ProfileBuilder::default().build(3, "A plain sword swing.\nNo tags here.");
    assert_eq!(profile, SkillProfile::untagged(3));
}

#[test]
fn test_cooldown_tag_scenario() {
    let builder = ProfileBuilder::default();
    assert_eq!(builder.build(1, "<cooldown: 120>").cooldown, 120);
    assert_eq!(builder.build(1, "Flavor text only").cooldown, 0);
}

#[test]
fn test_first_conflicting_tag_wins() {
    let builder = ProfileBuilder::default();
    let text = "<cooldown: 30>\n<range: 2>\n<cooldown: 90>\n<shape: cross>\n<shape: wall>";
    let profile = builder.build(4, text);
    assert_eq!(profile.cooldown, 30);
    assert_eq!(profile.range, 2);
    assert_eq!(profile.hitbox_shape, HitboxShape::Cross);
}

#[test]
fn test_tags_are_case_and_space_insensitive() {
    let profile = ProfileBuilder::default().build(5, "< COOLDOWN : 45 >\n<Pierce: [ 3 , 6 ]>\n<MOVETYPE: Directional>");
    assert_eq!(profile.cooldown, 45);
    assert_eq!(profile.piercing, PiercingData { count: 3, interval: 6 });
    assert_eq!(profile.move_type, MoveType::Directional);
}

#[test]
fn test_knockback_zero_is_not_absent() {
    let builder = ProfileBuilder::default();
    assert_eq!(builder.build(1, "<knockback: 0>").knockback, Some(0));
    assert_eq!(builder.build(1, "").knockback, None);
}

// =============================================================================
// Cache
// =============================================================================

#[test]
fn test_profiles_are_cached_per_skill() {
    let source = notes(&[(10, "<cooldown: 60>"), (11, "<range: 3>")]);
    let profiles = SkillProfiles::new();
    assert!(profiles.is_empty());

    let first = profiles.resolve(10, &source);
    let again = profiles.resolve(10, &source);
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(first.cooldown, 60);

    profiles.resolve(11, &source);
    assert_eq!(profiles.len(), 2);
    assert!(profiles.cached(12).is_none());
}

#[test]
fn test_unknown_skill_resolves_untagged() {
    let profiles = SkillProfiles::new();
    let profile = profiles.resolve(404, &notes(&[]));
    assert_eq!(*profile, SkillProfile::untagged(404));
}

// =============================================================================
// Shipped database
// =============================================================================

#[test]
fn test_shipped_database_loads() {
    let skills = load_shipped_skills();
    assert!(!skills.is_empty());
    assert!(skills.get(1).is_some(), "basic attack should exist");
    for id in 1..=8 {
        assert!(
            skills.annotation_text(id).is_some(),
            "skill {} should expose its note",
            id
        );
    }
}

#[test]
fn test_shipped_database_profiles() {
    let skills = load_shipped_skills();
    let profiles = SkillProfiles::new();

    let mending = profiles.resolve(3, &skills);
    assert_eq!(mending.cooldown, 120);
    assert_eq!(mending.effective_ai_cooldown(), 180);
    assert_eq!(mending.hitbox_shape, HitboxShape::Square);

    let bash = profiles.resolve(6, &skills);
    assert!(bash.is_direct);
    assert!(bash.unique_cooldown_slot);
    assert_eq!(bash.aggro_for_use(10), 20);

    let cleave = profiles.resolve(7, &skills);
    assert_eq!(cleave.combo.map(|c| c.next_skill_id), Some(8));
}
