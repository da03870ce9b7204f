//! Attack selection filters.

use bevy::prelude::*;

use super::snapshot::{tile_distance, BattlefieldView, CombatantInfo};
use crate::combat::traits::AITraitSet;
use crate::skills::{SkillId, SkillScope};

/// Narrow feasible skills down to the attacks worth using against `target`.
///
/// Returns the survivors in candidate order; the caller collapses them.
pub fn select_attacks(
    traits: &AITraitSet,
    candidates: &[SkillId],
    origin: IVec2,
    target: Option<&CombatantInfo>,
    field: &dyn BattlefieldView,
) -> Vec<SkillId> {
    let castable: Vec<SkillId> = candidates
        .iter()
        .copied()
        .filter(|&id| is_castable(id, origin, target, field))
        .collect();

    let Some(target) = target else {
        return castable;
    };

    let rated: Vec<(SkillId, f32)> = castable
        .into_iter()
        .map(|id| (id, field.elemental_effectiveness(id, target.id)))
        .filter(|&(_, rate)| !traits.careful || rate >= 1.0)
        .collect();

    if traits.executor {
        return highest_rate(&rated).into_iter().collect();
    }
    rated.into_iter().map(|(id, _)| id).collect()
}

fn is_castable(
    skill_id: SkillId,
    origin: IVec2,
    target: Option<&CombatantInfo>,
    field: &dyn BattlefieldView,
) -> bool {
    let Some(skill) = field.skill(skill_id) else {
        return false;
    };
    if !skill.is_attack() {
        return false;
    }
    match target {
        Some(target) => {
            let range = field.profile(skill_id).range;
            range <= 0 || tile_distance(origin, target.position) <= range
        }
        // Single-target attacks need someone to aim at.
        None => skill.scope != SkillScope::Enemy,
    }
}

/// First skill with the highest rate.
fn highest_rate(rated: &[(SkillId, f32)]) -> Option<SkillId> {
    let mut best: Option<(SkillId, f32)> = None;
    for &(id, rate) in rated {
        if best.map_or(true, |(_, b)| rate > b) {
            best = Some((id, rate));
        }
    }
    best.map(|(id, _)| id)
}
