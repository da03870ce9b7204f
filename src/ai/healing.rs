//! Priority healing
//!
//! Picks a heal for a healer combatant given the wounded allies in sight.
//! Four variants are computed from the castable heals (biggest single,
//! biggest all, closest-fit single, closest-fit all) and the actor's traits
//! decide between them.

use bevy::prelude::*;

use super::snapshot::{BattlefieldView, CombatantInfo};
use crate::combat::battler::BattlerId;
use crate::combat::rng::GameRng;
use crate::combat::traits::AITraitSet;
use crate::skills::SkillId;

/// Heal the engine settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealChoice {
    pub skill_id: SkillId,
    /// Most wounded ally in sight; the ally the heal is meant for.
    pub target: Option<BattlerId>,
    pub tile: IVec2,
}

/// Thresholds that shape the careful policy.
#[derive(Debug, Clone, Copy)]
pub struct HealThresholds {
    pub critical_hp_ratio: f32,
    pub wounded_ally_threshold: usize,
}

#[derive(Debug, Clone, Copy)]
struct HealOption {
    skill_id: SkillId,
    power: i32,
    all_scope: bool,
}

/// Choose a heal, or `None` to fall through to attack selection.
///
/// `candidates` must already be feasible (known, affordable, off cooldown).
/// `allies` are the living allies in sight, the actor included.
pub fn choose_heal(
    traits: &AITraitSet,
    candidates: &[SkillId],
    allies: &[&CombatantInfo],
    origin: IVec2,
    thresholds: HealThresholds,
    field: &dyn BattlefieldView,
    rng: &mut GameRng,
) -> Option<HealChoice> {
    let wounded: Vec<&CombatantInfo> = allies.iter().copied().filter(|a| a.is_wounded()).collect();
    if wounded.is_empty() && !traits.reckless {
        return None;
    }

    let heals: Vec<HealOption> = candidates
        .iter()
        .filter_map(|&id| {
            let skill = field.skill(id)?;
            skill.is_heal().then_some(HealOption {
                skill_id: id,
                power: skill.power,
                all_scope: skill.is_all_scope(),
            })
        })
        .collect();

    let most_wounded = most_wounded(allies);
    let option = match heals.len() {
        0 => None,
        1 => Some(heals[0]),
        _ => select(traits, &heals, &wounded, most_wounded, thresholds, rng),
    }?;

    let tile = match (option.all_scope, most_wounded) {
        (false, Some(ally)) => ally.position,
        _ => origin,
    };
    debug!(
        "Heal {} chosen for {:?} ({} wounded in sight)",
        option.skill_id,
        most_wounded.map(|a| a.id),
        wounded.len()
    );
    Some(HealChoice {
        skill_id: option.skill_id,
        target: most_wounded.map(|a| a.id),
        tile,
    })
}

fn select(
    traits: &AITraitSet,
    heals: &[HealOption],
    wounded: &[&CombatantInfo],
    most_wounded: Option<&CombatantInfo>,
    thresholds: HealThresholds,
    rng: &mut GameRng,
) -> Option<HealOption> {
    let singles: Vec<HealOption> = heals.iter().copied().filter(|h| !h.all_scope).collect();
    let alls: Vec<HealOption> = heals.iter().copied().filter(|h| h.all_scope).collect();

    if traits.reckless {
        return biggest(heals).first().copied();
    }

    if traits.careful {
        let single_deficit = most_wounded.map_or(0, CombatantInfo::deficit);
        let closest_single = closest_fit(&singles, single_deficit);
        let closest_all = closest_fit(&alls, mean_deficit(wounded));

        let critical = wounded
            .iter()
            .filter(|a| a.hp_ratio() <= thresholds.critical_hp_ratio)
            .count();
        let prefer_all = critical != 1
            && wounded.len() != 1
            && wounded.len() >= thresholds.wounded_ally_threshold;

        return if prefer_all {
            closest_all.or(closest_single)
        } else {
            closest_single.or(closest_all)
        };
    }

    let (preferred, other) = match wounded.len() {
        0 => return None,
        1 => (&singles, &alls),
        _ => (&alls, &singles),
    };
    let tied = if preferred.is_empty() {
        biggest(other)
    } else {
        biggest(preferred)
    };
    rng.choose(&tied).copied()
}

/// Every option sharing the highest power, in candidate order.
fn biggest(options: &[HealOption]) -> Vec<HealOption> {
    let Some(max) = options.iter().map(|h| h.power).max() else {
        return Vec::new();
    };
    options.iter().copied().filter(|h| h.power == max).collect()
}

/// Option whose power is nearest to `deficit`; first wins on ties.
fn closest_fit(options: &[HealOption], deficit: i32) -> Option<HealOption> {
    let mut best: Option<HealOption> = None;
    for option in options {
        let gap = option.power.saturating_sub(deficit).saturating_abs();
        if best.map_or(true, |b| gap < b.power.saturating_sub(deficit).saturating_abs()) {
            best = Some(*option);
        }
    }
    best
}

fn mean_deficit(wounded: &[&CombatantInfo]) -> i32 {
    if wounded.is_empty() {
        return 0;
    }
    let total = wounded.iter().fold(0i32, |sum, a| sum.saturating_add(a.deficit()));
    (total as f32 / wounded.len() as f32).round() as i32
}

/// Lowest HP ratio, lowest id on ties.
fn most_wounded<'a>(allies: &[&'a CombatantInfo]) -> Option<&'a CombatantInfo> {
    allies.iter().copied().fold(None, |best: Option<&CombatantInfo>, ally| match best {
        Some(b) if b.hp_ratio() <= ally.hp_ratio() => Some(b),
        _ => Some(ally),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heal(id: SkillId, power: i32, all_scope: bool) -> HealOption {
        HealOption {
            skill_id: id,
            power,
            all_scope,
        }
    }

    #[test]
    fn test_closest_fit_prefers_nearest_power() {
        let options = [heal(1, 20, false), heal(2, 60, false), heal(3, 100, false)];
        assert_eq!(closest_fit(&options, 70).map(|h| h.skill_id), Some(2));
        assert_eq!(closest_fit(&options, 0).map(|h| h.skill_id), Some(1));
        assert_eq!(closest_fit(&[], 30).map(|h| h.skill_id), None);
    }

    #[test]
    fn test_closest_fit_keeps_first_on_tie() {
        let options = [heal(4, 40, false), heal(5, 60, false)];
        assert_eq!(closest_fit(&options, 50).map(|h| h.skill_id), Some(4));
    }

    #[test]
    fn test_biggest_returns_every_tied_option() {
        let options = [heal(1, 80, false), heal(2, 30, true), heal(3, 80, true)];
        let ids: Vec<SkillId> = biggest(&options).iter().map(|h| h.skill_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_mean_deficit_saturates_on_huge_pools() {
        let ally = |id: u32| CombatantInfo {
            id: BattlerId(id),
            team: 1,
            hp: 1,
            max_hp: i32::MAX,
            mp: 0,
            tp: 0,
            position: IVec2::ZERO,
            aggro: 0,
            target: None,
            sight_range: 0,
        };
        let (a, b) = (ally(1), ally(2));
        assert_eq!(mean_deficit(&[&a, &b]), (i32::MAX as f32 / 2.0).round() as i32);
        assert_eq!(closest_fit(&[heal(1, i32::MIN, false)], i32::MAX).map(|h| h.skill_id), Some(1));
    }
}
