//! Autonomous decision engine
//!
//! `AiDecisionEngine::decide` is a pure function of the actor's state, its
//! traits and a battlefield snapshot (plus the seeded RNG for uniform picks).
//! It runs once per think tick:
//!
//! 1. Feasibility: known, affordable, not on the skill's own cooldown.
//! 2. Healer priority (healer trait only).
//! 3. Attack selection with the careful/executor filters.
//! 4. Collapse to one skill, or the basic attack when nothing is left.
//!
//! The basic attack needs a living target and its own cooldown to be clear;
//! otherwise the tick ends with no action (`None`). Whatever comes out is
//! re-checked for known + affordable right before it is returned.
//!
//! Follower delegation reuses the same pipeline with the leader's traits and
//! the pair's combined sight radius.

pub mod attack;
pub mod healing;
pub mod snapshot;

use bevy::prelude::*;

use crate::combat::battler::{BattlerId, BattlerState, CooldownKey};
use crate::combat::rng::GameRng;
use crate::combat::traits::AITraitSet;
use crate::settings::CoreSettings;
use crate::skills::SkillId;

pub use healing::{HealChoice, HealThresholds};
pub use snapshot::{
    tile_distance, Battlefield, BattlefieldView, CombatantInfo, Effectiveness,
    EffectivenessProvider, ElementRateTable,
};

/// Where a decided action is aimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetPoint {
    pub battler: Option<BattlerId>,
    pub tile: IVec2,
}

/// Outcome of one think tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Skill { skill_id: SkillId, target: TargetPoint },
    BasicAttack { skill_id: SkillId, target: TargetPoint },
}

impl Decision {
    pub fn skill_id(&self) -> SkillId {
        match self {
            Decision::Skill { skill_id, .. } | Decision::BasicAttack { skill_id, .. } => *skill_id,
        }
    }

    pub fn target(&self) -> TargetPoint {
        match self {
            Decision::Skill { target, .. } | Decision::BasicAttack { target, .. } => *target,
        }
    }

    pub fn is_basic_attack(&self) -> bool {
        matches!(self, Decision::BasicAttack { .. })
    }
}

/// Everything one decision pass reads, whoever is deciding.
struct DecisionContext<'a> {
    /// Combatant that will perform the skill and pay for it.
    performer: &'a BattlerState,
    traits: AITraitSet,
    sight_radius: i32,
    origin: IVec2,
    target: Option<BattlerId>,
}

pub struct AiDecisionEngine<'s> {
    settings: &'s CoreSettings,
}

impl<'s> AiDecisionEngine<'s> {
    pub fn new(settings: &'s CoreSettings) -> Self {
        Self { settings }
    }

    /// Decide what `actor` does next using `traits`, or `None` to idle.
    pub fn decide(
        &self,
        actor: &BattlerState,
        traits: &AITraitSet,
        field: &dyn BattlefieldView,
        rng: &mut GameRng,
    ) -> Option<Decision> {
        let origin = position_of(actor.id, field);
        let ctx = DecisionContext {
            performer: actor,
            traits: *traits,
            sight_radius: actor.sight_range,
            origin,
            target: actor.current_target,
        };
        self.decide_with(&ctx, field, rng)
    }

    /// Decide on behalf of `follower` with `leader`'s traits.
    ///
    /// The leader's target is used when it has one, so the pair focuses the
    /// same enemy; skills and costs are still the follower's.
    pub fn decide_for_follower(
        &self,
        leader: &BattlerState,
        follower: &BattlerState,
        field: &dyn BattlefieldView,
        rng: &mut GameRng,
    ) -> Option<Decision> {
        let ctx = DecisionContext {
            performer: follower,
            traits: leader.traits,
            sight_radius: leader.sight_range.saturating_add(follower.sight_range),
            origin: position_of(follower.id, field),
            target: leader.current_target.or(follower.current_target),
        };
        self.decide_with(&ctx, field, rng)
    }

    fn decide_with(
        &self,
        ctx: &DecisionContext,
        field: &dyn BattlefieldView,
        rng: &mut GameRng,
    ) -> Option<Decision> {
        let actor = ctx.performer;
        let feasible = self.feasible_skills(actor, field);
        if feasible.is_empty() {
            return self.basic_attack(ctx, field);
        }

        if ctx.traits.healer {
            let allies = field.allies_within_range(actor.team, ctx.origin, ctx.sight_radius);
            let thresholds = HealThresholds {
                critical_hp_ratio: self.settings.critical_hp_ratio,
                wounded_ally_threshold: self.settings.wounded_ally_threshold,
            };
            if let Some(heal) =
                healing::choose_heal(&ctx.traits, &feasible, &allies, ctx.origin, thresholds, field, rng)
            {
                let decision = Decision::Skill {
                    skill_id: heal.skill_id,
                    target: TargetPoint {
                        battler: heal.target,
                        tile: heal.tile,
                    },
                };
                return self.verified(decision, ctx, field);
            }
        }

        let target = ctx.target.and_then(|id| field.combatant(id)).filter(|t| t.is_alive());
        let attacks = attack::select_attacks(&ctx.traits, &feasible, ctx.origin, target, field);

        let chosen = match attacks.len() {
            0 => None,
            1 => Some(attacks[0]),
            _ => rng.choose(&attacks).copied(),
        };
        let Some(skill_id) = chosen else {
            return self.basic_attack(ctx, field);
        };

        let decision = Decision::Skill {
            skill_id,
            target: TargetPoint {
                battler: target.map(|t| t.id),
                tile: target.map_or(ctx.origin, |t| t.position),
            },
        };
        self.verified(decision, ctx, field)
    }

    /// Known skills other than the basic attack that can be used right now.
    pub fn feasible_skills(&self, actor: &BattlerState, field: &dyn BattlefieldView) -> Vec<SkillId> {
        actor
            .known_skill_ids
            .iter()
            .copied()
            .filter(|&id| id != actor.basic_attack_skill_id)
            .filter(|&id| field.is_affordable(actor.id, id))
            .filter(|&id| !actor.is_on_cooldown(CooldownKey::Skill(id)))
            .collect()
    }

    /// Basic attack on the current target, if there is one and it is off cooldown.
    fn basic_attack(&self, ctx: &DecisionContext, field: &dyn BattlefieldView) -> Option<Decision> {
        let actor = ctx.performer;
        let skill_id = actor.basic_attack_skill_id;
        if actor.is_on_cooldown(CooldownKey::Skill(skill_id)) {
            debug!("{} basic attack on cooldown, idling", actor.id);
            return None;
        }
        let target = ctx.target.and_then(|id| field.combatant(id)).filter(|t| t.is_alive());
        let Some(target) = target else {
            debug!("{} has nothing to attack, idling", actor.id);
            return None;
        };
        Some(Decision::BasicAttack {
            skill_id,
            target: TargetPoint {
                battler: Some(target.id),
                tile: target.position,
            },
        })
    }

    /// Final known + affordable check on a chosen skill.
    fn verified(
        &self,
        decision: Decision,
        ctx: &DecisionContext,
        field: &dyn BattlefieldView,
    ) -> Option<Decision> {
        let actor = ctx.performer;
        let skill_id = decision.skill_id();
        if actor.knows(skill_id) && field.is_affordable(actor.id, skill_id) {
            debug!("{} decided on skill {} ({})", actor.id, skill_id, ctx.traits);
            return Some(decision);
        }
        warn!(
            "{} selected skill {} it cannot use; falling back to basic attack",
            actor.id, skill_id
        );
        self.basic_attack(ctx, field)
    }
}

fn position_of(id: BattlerId, field: &dyn BattlefieldView) -> IVec2 {
    field.combatant(id).map_or(IVec2::ZERO, |c| c.position)
}

/// Highest-aggro living enemy within sight; nearest, then lowest id, on ties.
pub fn acquire_target(
    actor: &CombatantInfo,
    sight_radius: i32,
    field: &dyn BattlefieldView,
) -> Option<BattlerId> {
    field
        .enemies_within_range(actor.team, actor.position, sight_radius)
        .into_iter()
        .min_by_key(|enemy| {
            (
                std::cmp::Reverse(enemy.aggro),
                tile_distance(actor.position, enemy.position),
                enemy.id,
            )
        })
        .map(|enemy| enemy.id)
}
