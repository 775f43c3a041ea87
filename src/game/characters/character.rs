// Character entity and management

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec3;

use crate::engine::clock::{Clock, SimulationClock};
use crate::engine::events::SubscriptionId;
use crate::engine::input::CharacterIntent;
use crate::game::combat::{
    CombatConfig, CombatController, Combatant, PositionProvider, TargetLookup,
};
use crate::game::config::SimulationConfig;
use crate::game::progression::ProgressionTable;

use super::events::CharacterEvent;
use super::movement::{MovementConfig, MovementController};
use super::snapshot::CharacterSnapshot;
use super::state::{CharacterState, StateMachine};
use super::stats::{DamageOutcome, StatsLedger, StatsRecord};

/// Unique identifier for a character
pub type CharacterId = u32;

/// Health fraction a revive restores when the caller has no preference
pub const DEFAULT_REVIVE_PERCENT: f32 = 0.5;

/// A simulated character: position plus its combat and movement collaborators
#[derive(Debug)]
pub struct Character {
    /// Unique identifier
    pub id: CharacterId,
    /// Character name (for display and logs)
    pub name: String,
    /// World position; y is height above the ground plane
    pub position: Vec3,

    combat: CombatController,
    movement: MovementController,
}

impl Character {
    pub fn new(
        id: CharacterId,
        name: &str,
        position: Vec3,
        combat: CombatController,
        movement: MovementController,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            position,
            combat,
            movement,
        }
    }

    pub fn combat(&self) -> &CombatController {
        &self.combat
    }

    pub fn combat_mut(&mut self) -> &mut CombatController {
        &mut self.combat
    }

    pub fn movement(&self) -> &MovementController {
        &self.movement
    }

    /// Get the current state
    pub fn state(&self) -> CharacterState {
        self.combat.state()
    }

    pub fn stats(&self) -> &StatsLedger {
        self.combat.stats()
    }

    /// Check if character is alive
    pub fn is_alive(&self) -> bool {
        self.combat.stats().is_initialized() && !self.combat.stats().is_dead()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&CharacterEvent) + 'static,
    {
        self.combat.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.combat.unsubscribe(id)
    }

    pub fn set_target(&mut self, target: Option<CharacterId>) {
        self.combat.set_target(target);
    }

    pub fn target(&self) -> Option<CharacterId> {
        self.combat.target()
    }

    pub fn change_state(&mut self, state: CharacterState) -> bool {
        self.combat.change_state(state)
    }

    /// Whether an attack could start at time `now`
    pub fn can_attack<W>(&self, now: f64, world: &W) -> bool
    where
        W: PositionProvider + TargetLookup + ?Sized,
    {
        self.combat.can_attack(now, self.position, world)
    }

    /// Attack the current target. The character must not be inside `world`.
    pub fn attack<W>(&mut self, now: f64, world: &mut W) -> bool
    where
        W: PositionProvider + TargetLookup + ?Sized,
    {
        self.combat.attack(now, self.position, world)
    }

    pub fn receive_damage(
        &mut self,
        amount: f32,
        attacker: Option<CharacterId>,
    ) -> Option<DamageOutcome> {
        self.combat.receive_damage(amount, attacker)
    }

    pub fn heal(&mut self, amount: f32) -> bool {
        self.combat.heal(amount)
    }

    pub fn restore_mana(&mut self, amount: f32) -> bool {
        self.combat.restore_mana(amount)
    }

    pub fn consume_mana(&mut self, amount: f32) -> bool {
        self.combat.consume_mana(amount)
    }

    /// Grant experience; returns levels gained
    pub fn gain_experience(&mut self, exp: f64) -> u32 {
        self.combat.gain_experience(exp)
    }

    /// Revive with `health_percent` of max health
    pub fn revive(&mut self, health_percent: f32) -> bool {
        let revived = self.combat.revive(health_percent);
        if revived {
            self.movement.reset();
            log::info!("{} (id {}) is back on their feet", self.name, self.id);
        }
        revived
    }

    // Movement

    pub fn walk(&mut self, direction: Vec3) -> bool {
        self.movement.walk(&mut self.combat, direction)
    }

    pub fn run(&mut self, direction: Vec3) -> bool {
        self.movement.run(&mut self.combat, direction)
    }

    pub fn jump(&mut self) -> bool {
        self.movement.jump(&mut self.combat)
    }

    pub fn roll(&mut self) -> bool {
        self.movement.roll(&mut self.combat)
    }

    pub fn fly(&mut self) -> bool {
        self.movement.fly(&mut self.combat)
    }

    pub fn climb(&mut self) -> bool {
        self.movement.climb(&mut self.combat)
    }

    pub fn stop(&mut self) -> bool {
        self.movement.stop(&mut self.combat)
    }

    /// Capture stats and state for saving. None if no stats are bound.
    pub fn snapshot(&self) -> Option<CharacterSnapshot> {
        self.combat
            .stats()
            .record()
            .map(|record| CharacterSnapshot::new(record.clone(), self.state()))
    }

    /// Re-bind stats and state from a snapshot, keeping the progression table
    pub fn restore(&mut self, snapshot: &CharacterSnapshot) {
        let progression = self.combat.stats().progression().cloned();
        let ledger = StatsLedger::with_record(snapshot.stats.clone(), progression);
        self.combat.restore(ledger, snapshot.state);
        self.movement.reset();
    }

    /// Advance movement, timers and target bookkeeping by one step.
    /// The character must not be inside `world`.
    pub fn tick<W>(&mut self, dt: f32, world: &W)
    where
        W: PositionProvider + TargetLookup + ?Sized,
    {
        self.movement.step(dt, &mut self.position, &mut self.combat);
        self.combat.tick(dt, self.position, world);
    }
}

impl Combatant for Character {
    fn take_damage(&mut self, amount: f32, attacker: Option<CharacterId>) {
        self.combat.receive_damage(amount, attacker);
    }

    fn is_dead(&self) -> bool {
        self.combat.is_dead()
    }

    fn current_target(&self) -> Option<CharacterId> {
        self.combat.current_target()
    }

    fn is_in_combat(&self) -> bool {
        self.combat.is_in_combat()
    }
}

/// Owns every character, the simulation clock and the shared progression table
#[derive(Debug)]
pub struct CharacterManager {
    characters: BTreeMap<CharacterId, Character>,
    next_id: CharacterId,
    clock: SimulationClock,
    progression: Arc<ProgressionTable>,
    stats: StatsRecord,
    combat: CombatConfig,
    movement: MovementConfig,
    seed: u64,
}

impl CharacterManager {
    pub fn new(
        progression: Arc<ProgressionTable>,
        combat: CombatConfig,
        movement: MovementConfig,
        seed: u64,
    ) -> Self {
        Self {
            characters: BTreeMap::new(),
            next_id: 0,
            clock: SimulationClock::new(),
            progression,
            stats: StatsRecord::default(),
            combat,
            movement,
            seed,
        }
    }

    /// Build a world from a validated config
    pub fn from_config(config: &SimulationConfig, progression: Arc<ProgressionTable>) -> Self {
        let mut manager = Self::new(
            progression,
            config.combat.clone(),
            config.movement.clone(),
            config.seed,
        );
        manager.stats = config.stats.clone();
        manager
    }

    /// Per-character RNG seed, stable for a given world seed and id
    fn character_seed(&self, id: CharacterId) -> u64 {
        self.seed ^ (u64::from(id) + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    /// Spawn a character with the world's default stats
    pub fn spawn(&mut self, name: &str, position: Vec3) -> CharacterId {
        let stats = self.stats.clone();
        self.spawn_with_stats(name, position, stats)
    }

    /// Spawn a new character with its own starting stats
    pub fn spawn_with_stats(
        &mut self,
        name: &str,
        position: Vec3,
        stats: StatsRecord,
    ) -> CharacterId {
        let id = self.next_id;
        self.next_id += 1;

        let ledger = StatsLedger::with_record(stats, Some(Arc::clone(&self.progression)));
        let combat = CombatController::new(
            id,
            self.combat.clone(),
            Some(StateMachine::new()),
            Some(ledger),
            self.character_seed(id),
        );
        let movement = MovementController::new(self.movement.clone());
        self.characters
            .insert(id, Character::new(id, name, position, combat, movement));

        log::debug!("Spawned {} (id {}) at {}", name, id, position);
        id
    }

    /// Get a character by ID
    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(&id)
    }

    /// Get a mutable character by ID
    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.get_mut(&id)
    }

    /// All characters in id order
    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    /// Remove a character by ID. Anyone targeting it drops it on their next tick.
    pub fn remove(&mut self, id: CharacterId) -> Option<Character> {
        let removed = self.characters.remove(&id);
        if let Some(character) = &removed {
            log::debug!("Removed {} (id {})", character.name, id);
        }
        removed
    }

    pub fn set_target(&mut self, id: CharacterId, target: Option<CharacterId>) -> bool {
        match self.characters.get_mut(&id) {
            Some(character) => {
                character.set_target(target);
                true
            }
            None => false,
        }
    }

    /// Have `id` attack its current target at the current time
    pub fn attack(&mut self, id: CharacterId) -> bool {
        let now = self.clock.now();
        self.with_detached(id, |attacker, world| attacker.attack(now, world))
            .unwrap_or(false)
    }

    /// Whether `id` could attack right now
    pub fn can_attack(&self, id: CharacterId) -> bool {
        let now = self.clock.now();
        self.characters
            .get(&id)
            .is_some_and(|c| c.can_attack(now, self))
    }

    /// Feed one frame of intent to a character: move, attack, then jump
    pub fn apply_intent(&mut self, id: CharacterId, intent: &CharacterIntent) -> bool {
        let now = self.clock.now();
        self.with_detached(id, |character, world| {
            if intent.has_movement() {
                if intent.run_pressed {
                    character.run(intent.direction());
                } else {
                    character.walk(intent.direction());
                }
            } else if matches!(
                character.state(),
                CharacterState::Walking | CharacterState::Running
            ) {
                character.stop();
            }

            if intent.attack_pressed {
                character.attack(now, world);
            }
            if intent.jump_pressed {
                character.jump();
            }
        })
        .is_some()
    }

    /// Grant experience to a character; returns levels gained
    pub fn award_experience(&mut self, id: CharacterId, exp: f64) -> u32 {
        self.characters
            .get_mut(&id)
            .map_or(0, |c| c.gain_experience(exp))
    }

    /// Advance the clock and every character by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        self.clock.advance(dt);
        // An invalid step leaves the clock alone and moves nothing
        let dt = self.clock.delta_time();
        let ids: Vec<CharacterId> = self.characters.keys().copied().collect();
        for id in ids {
            self.with_detached(id, |character, world| character.tick(dt, &*world));
        }
    }

    /// Take a character out of the map while it acts on the rest of the world
    fn with_detached<R>(
        &mut self,
        id: CharacterId,
        f: impl FnOnce(&mut Character, &mut Self) -> R,
    ) -> Option<R> {
        let mut character = self.characters.remove(&id)?;
        let result = f(&mut character, self);
        self.characters.insert(id, character);
        Some(result)
    }

    /// Current simulation time
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn progression(&self) -> &Arc<ProgressionTable> {
        &self.progression
    }

    /// Get the number of characters
    pub fn count(&self) -> usize {
        self.characters.len()
    }

    /// Get the number of alive characters
    pub fn alive_count(&self) -> usize {
        self.characters.values().filter(|c| c.is_alive()).count()
    }
}

impl PositionProvider for CharacterManager {
    fn position_of(&self, id: CharacterId) -> Option<Vec3> {
        self.characters.get(&id).map(|c| c.position)
    }
}

impl TargetLookup for CharacterManager {
    fn combatant(&self, id: CharacterId) -> Option<&dyn Combatant> {
        self.characters.get(&id).map(|c| c as &dyn Combatant)
    }

    fn combatant_mut(&mut self, id: CharacterId) -> Option<&mut dyn Combatant> {
        self.characters
            .get_mut(&id)
            .map(|c| c as &mut dyn Combatant)
    }
}
