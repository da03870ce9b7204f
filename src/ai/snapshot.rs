//! Battlefield snapshot
//!
//! The decision engine never touches ECS queries directly. Each think tick the
//! decision system copies what it needs into a `Battlefield`, and the engine
//! reads it through the `BattlefieldView` trait.

use bevy::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::combat::battler::{BattlerId, BattlerState, TilePosition, Vitals};
use crate::skills::{SkillDatabase, SkillDefinition, SkillId, SkillProfile, SkillProfiles};

/// Read-only copy of one combatant's public state.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatantInfo {
    pub id: BattlerId,
    pub team: u8,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub tp: i32,
    pub position: IVec2,
    pub aggro: i32,
    pub target: Option<BattlerId>,
    pub sight_range: i32,
}

impl CombatantInfo {
    pub fn from_components(state: &BattlerState, vitals: &Vitals, position: &TilePosition) -> Self {
        Self {
            id: state.id,
            team: state.team,
            hp: vitals.hp,
            max_hp: vitals.max_hp,
            mp: vitals.mp,
            tp: vitals.tp,
            position: position.0,
            aggro: state.aggro,
            target: state.current_target,
            sight_range: state.sight_range,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp > 0 {
            self.hp as f32 / self.max_hp as f32
        } else {
            0.0
        }
    }

    /// HP missing from full.
    pub fn deficit(&self) -> i32 {
        self.max_hp.saturating_sub(self.hp).max(0)
    }

    pub fn is_wounded(&self) -> bool {
        self.is_alive() && self.hp < self.max_hp
    }
}

/// Tile distance used for sight and range checks.
pub fn tile_distance(a: IVec2, b: IVec2) -> i32 {
    let d = (a - b).abs();
    d.x + d.y
}

/// Elemental effectiveness lookup, installed only when the host provides one.
pub trait EffectivenessProvider: Send + Sync {
    /// Damage rate of `element_id` against `target`; 1.0 is neutral.
    fn rate(&self, element_id: i32, target: &CombatantInfo) -> f32;
}

/// Per-combatant element rate table.
#[derive(Debug, Clone, Default)]
pub struct ElementRateTable {
    rates: HashMap<BattlerId, HashMap<i32, f32>>,
}

impl ElementRateTable {
    pub fn set(&mut self, battler: BattlerId, element_id: i32, rate: f32) {
        self.rates.entry(battler).or_default().insert(element_id, rate);
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl EffectivenessProvider for ElementRateTable {
    fn rate(&self, element_id: i32, target: &CombatantInfo) -> f32 {
        self.rates
            .get(&target.id)
            .and_then(|rates| rates.get(&element_id))
            .copied()
            .unwrap_or(1.0)
    }
}

/// Optional effectiveness capability.
#[derive(Resource, Default)]
pub struct Effectiveness(pub Option<Box<dyn EffectivenessProvider>>);

impl Effectiveness {
    pub fn provider(&self) -> Option<&dyn EffectivenessProvider> {
        self.0.as_deref()
    }
}

/// What the decision engine is allowed to know about the battlefield.
pub trait BattlefieldView {
    fn combatant(&self, id: BattlerId) -> Option<&CombatantInfo>;

    /// Living combatants of `team` within `radius` tiles of `origin`, in id order.
    fn allies_within_range(&self, team: u8, origin: IVec2, radius: i32) -> Vec<&CombatantInfo>;

    /// Living combatants not on `team` within `radius` tiles of `origin`, in id order.
    fn enemies_within_range(&self, team: u8, origin: IVec2, radius: i32) -> Vec<&CombatantInfo>;

    /// Whether `combatant` can pay for `skill_id` right now.
    fn is_affordable(&self, combatant: BattlerId, skill_id: SkillId) -> bool;

    /// Effectiveness of `skill_id` against `target`; 1.0 when unknown.
    fn elemental_effectiveness(&self, skill_id: SkillId, target: BattlerId) -> f32;

    fn skill(&self, skill_id: SkillId) -> Option<&SkillDefinition>;

    fn profile(&self, skill_id: SkillId) -> Arc<SkillProfile>;
}

/// Snapshot built once per frame by the decision system.
pub struct Battlefield<'a> {
    combatants: BTreeMap<BattlerId, CombatantInfo>,
    skills: &'a SkillDatabase,
    profiles: &'a SkillProfiles,
    effectiveness: Option<&'a dyn EffectivenessProvider>,
}

impl<'a> Battlefield<'a> {
    pub fn new(skills: &'a SkillDatabase, profiles: &'a SkillProfiles) -> Self {
        Self {
            combatants: BTreeMap::new(),
            skills,
            profiles,
            effectiveness: None,
        }
    }

    pub fn with_effectiveness(mut self, provider: Option<&'a dyn EffectivenessProvider>) -> Self {
        self.effectiveness = provider;
        self
    }

    pub fn insert(&mut self, info: CombatantInfo) {
        self.combatants.insert(info.id, info);
    }

    /// Update the stored target after a decision so followers see it.
    pub fn set_target(&mut self, id: BattlerId, target: Option<BattlerId>) {
        if let Some(info) = self.combatants.get_mut(&id) {
            info.target = target;
        }
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }

    fn within_range(
        &self,
        origin: IVec2,
        radius: i32,
        same_team: impl Fn(&CombatantInfo) -> bool,
    ) -> Vec<&CombatantInfo> {
        self.combatants
            .values()
            .filter(|c| c.is_alive() && same_team(c))
            .filter(|c| tile_distance(c.position, origin) <= radius)
            .collect()
    }
}

impl BattlefieldView for Battlefield<'_> {
    fn combatant(&self, id: BattlerId) -> Option<&CombatantInfo> {
        self.combatants.get(&id)
    }

    fn allies_within_range(&self, team: u8, origin: IVec2, radius: i32) -> Vec<&CombatantInfo> {
        self.within_range(origin, radius, |c| c.team == team)
    }

    fn enemies_within_range(&self, team: u8, origin: IVec2, radius: i32) -> Vec<&CombatantInfo> {
        self.within_range(origin, radius, |c| c.team != team)
    }

    fn is_affordable(&self, combatant: BattlerId, skill_id: SkillId) -> bool {
        let (Some(info), Some(skill)) = (self.combatant(combatant), self.skills.get(skill_id)) else {
            return false;
        };
        info.is_alive() && info.mp >= skill.mp_cost && info.tp >= skill.tp_cost
    }

    fn elemental_effectiveness(&self, skill_id: SkillId, target: BattlerId) -> f32 {
        let (Some(provider), Some(skill), Some(info)) = (
            self.effectiveness,
            self.skills.get(skill_id),
            self.combatant(target),
        ) else {
            return 1.0;
        };
        if skill.element_id == 0 {
            return 1.0;
        }
        provider.rate(skill.element_id, info)
    }

    fn skill(&self, skill_id: SkillId) -> Option<&SkillDefinition> {
        self.skills.get(skill_id)
    }

    fn profile(&self, skill_id: SkillId) -> Arc<SkillProfile> {
        self.profiles.resolve(skill_id, self.skills)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::SkillDefinition;

    fn info(id: u32, team: u8, hp: i32, pos: (i32, i32)) -> CombatantInfo {
        CombatantInfo {
            id: BattlerId(id),
            team,
            hp,
            max_hp: 100,
            mp: 10,
            tp: 0,
            position: IVec2::new(pos.0, pos.1),
            aggro: 0,
            target: None,
            sight_range: 8,
        }
    }

    #[test]
    fn test_allies_within_range_skips_dead_and_far() {
        let db = SkillDatabase::default();
        let profiles = SkillProfiles::new();
        let mut field = Battlefield::new(&db, &profiles);
        field.insert(info(1, 1, 100, (0, 0)));
        field.insert(info(2, 1, 50, (2, 1)));
        field.insert(info(3, 1, 0, (1, 0)));
        field.insert(info(4, 1, 80, (9, 0)));
        field.insert(info(5, 2, 80, (1, 1)));

        let ids: Vec<u32> = field
            .allies_within_range(1, IVec2::ZERO, 3)
            .iter()
            .map(|c| c.id.0)
            .collect();
        assert_eq!(ids, vec![1, 2]);

        let enemies = field.enemies_within_range(1, IVec2::ZERO, 3);
        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies[0].id, BattlerId(5));
    }

    #[test]
    fn test_affordability_checks_costs() {
        let db = SkillDatabase::from_definitions([
            SkillDefinition {
                mp_cost: 10,
                ..SkillDefinition::new(1, "Fire")
            },
            SkillDefinition {
                mp_cost: 11,
                ..SkillDefinition::new(2, "Fira")
            },
        ]);
        let profiles = SkillProfiles::new();
        let mut field = Battlefield::new(&db, &profiles);
        field.insert(info(1, 1, 100, (0, 0)));

        assert!(field.is_affordable(BattlerId(1), 1));
        assert!(!field.is_affordable(BattlerId(1), 2));
        assert!(!field.is_affordable(BattlerId(1), 3));
        assert!(!field.is_affordable(BattlerId(9), 1));
    }

    #[test]
    fn test_effectiveness_defaults_to_neutral() {
        let db = SkillDatabase::from_definitions([SkillDefinition {
            element_id: 2,
            ..SkillDefinition::new(1, "Fire")
        }]);
        let profiles = SkillProfiles::new();
        let mut table = ElementRateTable::default();
        table.set(BattlerId(2), 2, 0.5);

        let mut field = Battlefield::new(&db, &profiles);
        field.insert(info(2, 2, 100, (0, 0)));
        assert_eq!(field.elemental_effectiveness(1, BattlerId(2)), 1.0);

        let field = {
            let mut f = Battlefield::new(&db, &profiles).with_effectiveness(Some(&table));
            f.insert(info(2, 2, 100, (0, 0)));
            f
        };
        assert_eq!(field.elemental_effectiveness(1, BattlerId(2)), 0.5);
    }
}
