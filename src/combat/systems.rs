//! Combat systems
//!
//! The per-frame update of the core, split into four chained phases:
//!
//! 1. `InputSampling`: advance the frame clock, sample player input and
//!    advance charge timers.
//! 2. `Timers`: decrement cooldowns and AI think timers.
//! 3. `Decisions`: aim players at an enemy, turn slot input into triggers,
//!    run AI think ticks.
//! 4. `Dispatch`: hand triggers to the dispatcher, clear defeated combatants.
//!
//! Timers always run before anything that reads them, so a cooldown that
//! finishes this frame can be used this frame.

use bevy::prelude::*;
use std::collections::HashMap;

use super::battler::*;
use super::dispatch::Dispatcher;
use super::events::*;
use super::log::{CombatLog, CombatLogEventType};
use super::rng::GameRng;
use super::CombatClock;
use crate::ai::{
    acquire_target, tile_distance, AiDecisionEngine, Battlefield, BattlefieldView, CombatantInfo,
    Effectiveness,
};
use crate::input::{InputChargeController, KeyboardInput};
use crate::settings::CoreSettings;
use crate::skills::{SkillDatabase, SkillProfiles};

/// Combat core system execution phases.
///
/// Use these to order custom systems relative to the core.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CoreSystemPhase {
    /// Phase 1: Frame clock, input sampling, charge timers
    InputSampling,
    /// Phase 2: Cooldowns and think timers
    Timers,
    /// Phase 3: Player action resolution and AI decisions
    Decisions,
    /// Phase 4: Dispatch and combatant cleanup
    Dispatch,
}

/// Configures the ordering between core system phases.
///
/// Call this once during app setup before adding core systems.
pub fn configure_core_system_ordering(app: &mut App) {
    app.configure_sets(
        Update,
        (
            CoreSystemPhase::InputSampling,
            CoreSystemPhase::Timers,
            CoreSystemPhase::Decisions,
            CoreSystemPhase::Dispatch,
        )
            .chain(),
    );
}

/// Adds the core systems to the app.
///
/// # Example
/// ```ignore
/// // Always run (headless)
/// add_core_systems(&mut app, || true);
/// ```
pub fn add_core_systems<M>(app: &mut App, run_condition: impl Condition<M> + Clone)
where
    M: 'static,
{
    app.add_systems(
        Update,
        (advance_clock, sample_player_input)
            .chain()
            .in_set(CoreSystemPhase::InputSampling)
            .run_if(run_condition.clone()),
    );

    app.add_systems(
        Update,
        (tick_cooldowns, tick_ai_think_timers)
            .chain()
            .in_set(CoreSystemPhase::Timers)
            .run_if(run_condition.clone()),
    );

    app.add_systems(
        Update,
        (update_player_targets, resolve_player_actions, decide_ai_actions)
            .chain()
            .in_set(CoreSystemPhase::Decisions)
            .run_if(run_condition.clone()),
    );

    app.add_systems(
        Update,
        (dispatch_action_triggers, clear_defeated_battlers)
            .chain()
            .in_set(CoreSystemPhase::Dispatch)
            .run_if(run_condition),
    );
}

/// Advance the frame counter shared by triggers and the log.
pub fn advance_clock(mut clock: ResMut<CombatClock>, mut combat_log: ResMut<CombatLog>) {
    clock.frame += 1;
    combat_log.frame = clock.frame;
}

/// Run the charge controller for every player-controlled combatant.
pub fn sample_player_input(
    settings: Res<CoreSettings>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut players: Query<(Entity, &mut BattlerState), (With<PlayerControlled>, Without<Defeated>)>,
    mut slot_events: EventWriter<SlotInputEvent>,
) {
    let controller = InputChargeController::new(settings.input_delay);
    let input = KeyboardInput {
        bindings: &settings.keybindings,
        keyboard: &keyboard,
    };

    for (entity, mut state) in players.iter_mut() {
        for slot_input in controller.update(&mut state, &input) {
            slot_events.send(SlotInputEvent {
                actor: entity,
                slot: slot_input.slot,
                kind: slot_input.kind,
            });
        }
    }
}

pub fn tick_cooldowns(mut battlers: Query<&mut BattlerState, Without<Defeated>>) {
    for mut state in battlers.iter_mut() {
        state.tick_cooldowns();
    }
}

pub fn tick_ai_think_timers(mut controllers: Query<&mut AiController, Without<Defeated>>) {
    for mut controller in controllers.iter_mut() {
        controller.tick();
    }
}

/// Point every player at the enemy it would auto-target this frame.
///
/// Same rule as the AI: highest aggro in sight, then nearest, then lowest id.
pub fn update_player_targets(
    skills: Res<SkillDatabase>,
    profiles: Res<SkillProfiles>,
    mut battlers: Query<
        (&mut BattlerState, &Vitals, &TilePosition, Has<PlayerControlled>),
        Without<Defeated>,
    >,
) {
    let mut field = Battlefield::new(&skills, &profiles);
    for (state, vitals, position, _) in battlers.iter() {
        field.insert(CombatantInfo::from_components(state, vitals, position));
    }

    for (mut state, _, _, is_player) in battlers.iter_mut() {
        if !is_player {
            continue;
        }
        let target = field
            .combatant(state.id)
            .and_then(|me| acquire_target(me, state.sight_range, &field));
        if state.current_target != target {
            state.current_target = target;
        }
    }
}

/// Turn slot triggers and charge releases into action triggers.
#[allow(clippy::too_many_arguments)]
pub fn resolve_player_actions(
    mut slot_events: EventReader<SlotInputEvent>,
    clock: Res<CombatClock>,
    settings: Res<CoreSettings>,
    skills: Res<SkillDatabase>,
    profiles: Res<SkillProfiles>,
    mut combat_log: ResMut<CombatLog>,
    mut battlers: Query<(&mut BattlerState, &Vitals, &TilePosition, Option<&SkillLoadout>), Without<Defeated>>,
    mut triggers: EventWriter<ActionTrigger>,
) {
    let living: HashMap<BattlerId, IVec2> = battlers
        .iter()
        .filter(|(_, vitals, _, _)| vitals.is_alive())
        .map(|(state, _, position, _)| (state.id, position.0))
        .collect();

    for event in slot_events.read() {
        let Ok((mut state, vitals, position, loadout)) = battlers.get_mut(event.actor) else {
            continue;
        };

        let origin = match event.kind {
            SlotInputKind::Triggered => TriggerOrigin::InputTrigger { slot: event.slot },
            SlotInputKind::ChargeReleased { held_frames } => TriggerOrigin::ChargeRelease {
                slot: event.slot,
                held_frames,
            },
            SlotInputKind::ChargeStarted => {
                combat_log.log(
                    CombatLogEventType::ChargeStarted,
                    format!("{} started charging {}", state.id, event.slot.name()),
                );
                continue;
            }
            SlotInputKind::ChargeCancelled => {
                combat_log.log(
                    CombatLogEventType::ChargeCancelled,
                    format!("{} cancelled charging {}", state.id, event.slot.name()),
                );
                continue;
            }
        };
        if let TriggerOrigin::ChargeRelease { held_frames, .. } = origin {
            combat_log.log(
                CombatLogEventType::ChargeReleased,
                format!(
                    "{} released {} after {} frames",
                    state.id,
                    event.slot.name(),
                    held_frames
                ),
            );
        }

        let Some(skill_id) = loadout.and_then(|l| l.get(event.slot)) else {
            debug!("{} has nothing equipped in {}", state.id, event.slot.name());
            continue;
        };
        let Some(skill) = skills.get(skill_id) else {
            warn!("{} has unknown skill {} equipped", state.id, skill_id);
            continue;
        };
        if !state.knows(skill_id) || !vitals.can_pay(skill) {
            debug!("{} cannot use {} right now", state.id, skill.name);
            continue;
        }

        let profile = profiles.resolve(skill_id, &*skills);
        let key = CooldownKey::for_player(event.slot, &profile);
        if state.is_on_cooldown(key) {
            debug!(
                "{} {} on cooldown ({} frames)",
                state.id,
                skill.name,
                state.cooldown_remaining(key)
            );
            continue;
        }

        // Offensive skills aim at the current target; anything else at the user.
        let aim = if skill.targets_enemy() {
            state.current_target.and_then(|target| living.get(&target).copied())
        } else {
            None
        };
        if skill.targets_enemy()
            && profile.range > 0
            && aim.map_or(true, |tile| tile_distance(position.0, tile) > profile.range)
        {
            debug!("{} {} has no target within {} tiles", state.id, skill.name, profile.range);
            continue;
        }
        let tile = aim.unwrap_or(position.0);

        state.record_skill_use(&profile, key, profile.cooldown, settings.base_aggro);
        triggers.send(ActionTrigger {
            actor_id: state.id,
            skill_id,
            target_x: tile.x,
            target_y: tile.y,
            timestamp: clock.frame,
            origin,
        });
    }
}

/// Think tick for every autonomous combatant whose timer has run out.
///
/// Leaders and independent combatants decide first so that followers see
/// their leader's fresh target.
#[allow(clippy::too_many_arguments)]
pub fn decide_ai_actions(
    clock: Res<CombatClock>,
    settings: Res<CoreSettings>,
    skills: Res<SkillDatabase>,
    profiles: Res<SkillProfiles>,
    effectiveness: Res<Effectiveness>,
    mut rng: ResMut<GameRng>,
    mut battlers: Query<
        (Entity, &mut BattlerState, &Vitals, &TilePosition, Option<&mut AiController>),
        Without<Defeated>,
    >,
    mut triggers: EventWriter<ActionTrigger>,
) {
    let mut field = Battlefield::new(&skills, &profiles).with_effectiveness(effectiveness.provider());
    let mut entities = HashMap::new();
    let mut ready = Vec::new();

    for (entity, state, vitals, position, controller) in battlers.iter() {
        field.insert(CombatantInfo::from_components(state, vitals, position));
        entities.insert(state.id, entity);
        if vitals.is_alive() && controller.is_some_and(|c| c.ready()) {
            ready.push((state.id, state.traits.follower && state.leader.is_some()));
        }
    }
    if ready.is_empty() {
        return;
    }
    // Followers after everyone else, id order within each group.
    ready.sort_by_key(|&(id, is_follower)| (is_follower, id));

    let engine = AiDecisionEngine::new(&settings);

    for (id, is_follower) in ready {
        let Some(&entity) = entities.get(&id) else {
            continue;
        };

        let leader = if is_follower {
            leader_state(&battlers, &entities, &field, id)
        } else {
            None
        };

        let Ok((_, mut state, _, _, controller)) = battlers.get_mut(entity) else {
            continue;
        };

        let target = leader
            .as_ref()
            .and_then(|leader| leader.current_target)
            .or_else(|| {
                field
                    .combatant(id)
                    .and_then(|me| acquire_target(me, state.sight_range, &field))
            });
        state.current_target = target;
        field.set_target(id, target);

        let decision = match &leader {
            Some(leader) => engine.decide_for_follower(leader, &state, &field, &mut rng),
            None => {
                let traits = state.traits;
                engine.decide(&state, &traits, &field, &mut rng)
            }
        };
        if let Some(mut controller) = controller {
            controller.restart();
        }
        let Some(decision) = decision else {
            continue;
        };

        let skill_id = decision.skill_id();
        let chosen = decision.target();
        if skills.get(skill_id).is_some_and(|s| s.is_heal()) {
            state.ally_target = chosen.battler;
        } else if chosen.battler.is_some() {
            state.current_target = chosen.battler;
        }

        let profile = profiles.resolve(skill_id, &*skills);
        state.record_skill_use(
            &profile,
            CooldownKey::Skill(skill_id),
            profile.effective_ai_cooldown(),
            settings.base_aggro,
        );
        if decision.is_basic_attack() {
            debug!("{} falls back to basic attack", state.id);
        }

        triggers.send(ActionTrigger {
            actor_id: id,
            skill_id,
            target_x: chosen.tile.x,
            target_y: chosen.tile.y,
            timestamp: clock.frame,
            origin: TriggerOrigin::Ai,
        });
    }
}

/// Leader state for a follower, when the leader is present, alive and leading.
fn leader_state(
    battlers: &Query<
        (Entity, &mut BattlerState, &Vitals, &TilePosition, Option<&mut AiController>),
        Without<Defeated>,
    >,
    entities: &HashMap<BattlerId, Entity>,
    field: &Battlefield,
    follower: BattlerId,
) -> Option<BattlerState> {
    let follower_entity = entities.get(&follower)?;
    let (_, follower_state, ..) = battlers.get(*follower_entity).ok()?;
    let leader_id = follower_state.leader?;
    if !field.combatant(leader_id).is_some_and(|c| c.is_alive()) {
        return None;
    }
    let (_, leader, ..) = battlers.get(*entities.get(&leader_id)?).ok()?;
    leader.traits.leader.then(|| leader.clone())
}

/// Forward every trigger to the installed dispatcher and the combat log.
pub fn dispatch_action_triggers(
    mut triggers: EventReader<ActionTrigger>,
    mut dispatcher: ResMut<Dispatcher>,
    mut combat_log: ResMut<CombatLog>,
    skills: Res<SkillDatabase>,
    battlers: Query<&BattlerState>,
) {
    for trigger in triggers.read() {
        let is_basic = battlers
            .iter()
            .find(|state| state.id == trigger.actor_id)
            .is_some_and(|state| state.basic_attack_skill_id == trigger.skill_id);
        let event_type = if is_basic {
            CombatLogEventType::BasicAttack
        } else {
            CombatLogEventType::SkillUsed
        };

        combat_log.log(
            event_type,
            format!(
                "{} uses {} at ({}, {})",
                trigger.actor_id,
                skills.name(trigger.skill_id),
                trigger.target_x,
                trigger.target_y
            ),
        );
        combat_log.record_action(trigger);
        dispatcher.dispatch(trigger);
    }
}

/// Take combatants at 0 HP off the battlefield.
pub fn clear_defeated_battlers(
    mut commands: Commands,
    mut battlers: Query<(Entity, &mut BattlerState, &Vitals), Without<Defeated>>,
    mut combat_log: ResMut<CombatLog>,
    mut defeated_events: EventWriter<BattlerDefeatedEvent>,
) {
    for (entity, mut state, vitals) in battlers.iter_mut() {
        if vitals.is_alive() {
            continue;
        }
        state.clear();
        commands.entity(entity).insert(Defeated);
        combat_log.log(
            CombatLogEventType::BattlerDefeated,
            format!("{} has been defeated", state.id),
        );
        defeated_events.send(BattlerDefeatedEvent { battler: state.id });
    }
}
