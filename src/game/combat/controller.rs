// Combat controller - targeting, attack gating, damage dispatch and stun

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::common::math::{clamp01, within_range};
use crate::engine::events::{EventSink, SubscriptionId};
use crate::engine::timer::{Scheduler, TimerId};
use crate::game::characters::events::{CharacterEvent, CharacterEvents};
use crate::game::characters::state::{CharacterState, StateMachine};
use crate::game::characters::stats::{DamageOutcome, StatsLedger};
use crate::game::characters::CharacterId;

use super::capability::{Combatant, PositionProvider, TargetLookup};

/// Slack for comparing simulation times, well under one 60 Hz step
const TIME_EPSILON: f64 = 1e-4;

/// Tunables for one character's combat behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Maximum distance to the target for an attack to start
    pub attack_range: f32,
    /// Seconds between attacks at attack speed 1.0
    pub attack_cooldown: f32,
    /// Probability that a surviving hit stuns (0..=1)
    pub stun_chance: f32,
    /// Seconds a stun lasts before recovering to Idle
    pub stun_duration: f32,
    /// Seconds the Attacking state lasts before recovering to Idle
    pub attack_duration: f32,
    /// Targets farther than this are dropped
    pub leash_range: f32,
}

/// Default melee combat tuning
pub const BASE_COMBAT: CombatConfig = CombatConfig {
    attack_range: 2.0,
    attack_cooldown: 1.0,
    stun_chance: 0.1,
    stun_duration: 1.0,
    attack_duration: 0.4,
    leash_range: 15.0,
};

impl Default for CombatConfig {
    fn default() -> Self {
        BASE_COMBAT
    }
}

/// Combat-relevant view of a character, derived from target and state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatStatus {
    NotInCombat,
    InCombat,
    Attacking,
    Stunned,
    Dead,
}

/// Target bookkeeping held by the controller
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CombatSession {
    /// Current target (never owned, may vanish at any time)
    pub target: Option<CharacterId>,
    /// Simulation time of the last attack started
    pub last_attack_time: Option<f64>,
    pub in_combat: bool,
}

/// Deferred state recoveries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    /// Stunned -> Idle
    Stun,
    /// Attacking -> Idle
    Attack,
}

/// Drives one character's combat on top of its state machine and stats.
///
/// Composes the `StateMachine` and `StatsLedger` of its character and owns the
/// character's event bus. If either collaborator is missing at construction
/// the controller is inert: every operation is a no-op for its whole life.
#[derive(Debug)]
pub struct CombatController {
    owner: CharacterId,
    config: CombatConfig,
    state: StateMachine,
    stats: StatsLedger,
    events: CharacterEvents,
    session: CombatSession,
    timers: Scheduler<Recovery>,
    pending_stun: Option<TimerId>,
    pending_attack: Option<TimerId>,
    rng: ChaCha8Rng,
    death_handled: bool,
    inert: bool,
}

impl CombatController {
    /// Build a controller from its collaborators.
    ///
    /// Missing collaborators are logged as configuration errors and leave the
    /// controller permanently inert.
    pub fn new(
        owner: CharacterId,
        config: CombatConfig,
        state: Option<StateMachine>,
        stats: Option<StatsLedger>,
        seed: u64,
    ) -> Self {
        let mut inert = false;
        if state.is_none() {
            log::error!("Character {} has no state machine, combat disabled", owner);
            inert = true;
        }
        if stats.is_none() {
            log::error!("Character {} has no stats ledger, combat disabled", owner);
            inert = true;
        }

        let mut controller = Self {
            owner,
            config,
            state: state.unwrap_or_default(),
            stats: stats.unwrap_or_default(),
            events: CharacterEvents::new(),
            session: CombatSession::default(),
            timers: Scheduler::new(),
            pending_stun: None,
            pending_attack: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
            death_handled: false,
            inert,
        };
        // A record bound with no health starts out dead
        if controller.stats.is_dead() {
            controller.handle_death();
        }
        controller
    }

    /// Controller with a fresh state machine around an existing ledger
    pub fn with_stats(
        owner: CharacterId,
        config: CombatConfig,
        stats: StatsLedger,
        seed: u64,
    ) -> Self {
        Self::new(owner, config, Some(StateMachine::new()), Some(stats), seed)
    }

    pub fn owner(&self) -> CharacterId {
        self.owner
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn is_inert(&self) -> bool {
        self.inert
    }

    pub fn state_machine(&self) -> &StateMachine {
        &self.state
    }

    pub fn state(&self) -> CharacterState {
        self.state.state()
    }

    pub fn stats(&self) -> &StatsLedger {
        &self.stats
    }

    pub fn session(&self) -> &CombatSession {
        &self.session
    }

    /// Register a listener for this character's notifications
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&CharacterEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Derived combat status
    pub fn status(&self) -> CombatStatus {
        if self.stats.is_dead() || self.state.state() == CharacterState::Dead {
            return CombatStatus::Dead;
        }
        match self.state.state() {
            CharacterState::Stunned => CombatStatus::Stunned,
            CharacterState::Attacking => CombatStatus::Attacking,
            _ if self.session.in_combat => CombatStatus::InCombat,
            _ => CombatStatus::NotInCombat,
        }
    }

    /// Apply a state transition requested from outside.
    ///
    /// Only revive may leave Dead, so a dead character refuses every other
    /// state. An outside transition ends the current attack, so its pending
    /// recovery is dropped. Returns whether the transition was applied.
    pub fn change_state(&mut self, new_state: CharacterState) -> bool {
        if self.inert {
            return false;
        }
        if self.stats.is_dead() && new_state != CharacterState::Dead {
            log::debug!(
                "Character {} is dead, refusing transition to {}",
                self.owner,
                new_state.name()
            );
            return false;
        }
        if let Some(id) = self.pending_attack.take() {
            self.timers.cancel(id);
        }
        self.state.change_state(new_state, &mut self.events);
        true
    }

    /// Set or clear the target. Ignored when dead, inert or self-targeting.
    pub fn set_target(&mut self, target: Option<CharacterId>) {
        if self.inert || self.stats.is_dead() {
            return;
        }
        if target == Some(self.owner) {
            return;
        }
        if self.session.target != target {
            log::debug!("Character {} target -> {:?}", self.owner, target);
        }
        self.session.target = target;
        self.session.in_combat = target.is_some();
    }

    pub fn target(&self) -> Option<CharacterId> {
        self.session.target
    }

    /// Cooldown between attacks, shortened by attack speed
    pub fn attack_cooldown(&self) -> f32 {
        self.config.attack_cooldown / self.stats.attack_speed()
    }

    fn cooldown_ready(&self, now: f64) -> bool {
        match self.session.last_attack_time {
            Some(last) => now - last + TIME_EPSILON >= f64::from(self.attack_cooldown()),
            None => true,
        }
    }

    /// Whether an attack may start right now
    pub fn can_attack<W>(&self, now: f64, position: Vec3, world: &W) -> bool
    where
        W: PositionProvider + TargetLookup + ?Sized,
    {
        if self.inert || !self.stats.is_initialized() || self.stats.is_dead() {
            return false;
        }
        let Some(target) = self.session.target else {
            return false;
        };
        if !self.state.state().can_attack() || !self.cooldown_ready(now) {
            return false;
        }
        if world.combatant(target).is_some_and(|c| c.is_dead()) {
            return false;
        }
        world
            .position_of(target)
            .is_some_and(|target_pos| within_range(position, target_pos, self.config.attack_range))
    }

    /// Start an attack on the current target and deliver the damage roll.
    ///
    /// Re-checks `can_attack` first. The attacker is expected to be detached
    /// from `world` while this runs, so the hit can never re-enter it.
    /// Returns whether an attack started.
    pub fn attack<W>(&mut self, now: f64, position: Vec3, world: &mut W) -> bool
    where
        W: PositionProvider + TargetLookup + ?Sized,
    {
        if !self.can_attack(now, position, world) {
            return false;
        }
        let Some(target) = self.session.target else {
            return false;
        };

        self.session.last_attack_time = Some(now);
        self.state.change_state(CharacterState::Attacking, &mut self.events);
        if let Some(previous) = self.pending_attack.take() {
            self.timers.cancel(previous);
        }
        self.pending_attack = Some(
            self.timers
                .schedule(self.config.attack_duration, Recovery::Attack),
        );
        self.events.emit(CharacterEvent::AttackStarted);

        match world.combatant_mut(target) {
            Some(victim) => {
                let damage = self.stats.get_attack_damage(&mut self.rng);
                log::debug!(
                    "Character {} attacks {} for {:.1}",
                    self.owner,
                    target,
                    damage
                );
                victim.take_damage(damage, Some(self.owner));
            }
            None => log::debug!(
                "Character {} swung at missing target {}",
                self.owner,
                target
            ),
        }
        true
    }

    /// Receive a hit: apply it, maybe stun, and pick the attacker as target
    /// if there is none yet. Returns what the ledger did with the hit.
    pub fn receive_damage(
        &mut self,
        amount: f32,
        attacker: Option<CharacterId>,
    ) -> Option<DamageOutcome> {
        if self.inert {
            return None;
        }
        let outcome = self.stats.take_damage(amount, &mut self.events)?;

        if outcome.died {
            self.handle_death();
            return Some(outcome);
        }

        if self.rng.gen_bool(clamp01(self.config.stun_chance) as f64) {
            self.enter_stun();
        }

        if self.session.target.is_none() {
            if let Some(attacker) = attacker {
                self.set_target(Some(attacker));
            }
        }
        Some(outcome)
    }

    fn enter_stun(&mut self) {
        self.cancel_pending_stun();
        self.state.change_state(CharacterState::Stunned, &mut self.events);
        self.pending_stun = Some(
            self.timers
                .schedule(self.config.stun_duration, Recovery::Stun),
        );
        log::debug!(
            "Character {} stunned for {:.2}s",
            self.owner,
            self.config.stun_duration
        );
    }

    /// Drop a scheduled stun recovery. Returns whether one was pending.
    pub fn cancel_pending_stun(&mut self) -> bool {
        match self.pending_stun.take() {
            Some(id) => self.timers.cancel(id).is_some(),
            None => false,
        }
    }

    /// Whether a stun recovery is scheduled
    pub fn has_pending_stun(&self) -> bool {
        self.pending_stun.is_some_and(|id| self.timers.is_pending(id))
    }

    /// React to the ledger reporting death. Safe to call repeatedly.
    pub fn handle_death(&mut self) {
        if self.inert || self.death_handled {
            return;
        }
        self.death_handled = true;
        self.timers.clear();
        self.pending_stun = None;
        self.pending_attack = None;
        self.state.change_state(CharacterState::Dead, &mut self.events);
        self.session.target = None;
        self.session.in_combat = false;
        log::info!("Character {} is out of the fight", self.owner);
    }

    /// Bring a dead character back to Idle with a fraction of max health
    pub fn revive(&mut self, health_percent: f32) -> bool {
        if self.inert || !self.stats.revive(health_percent) {
            return false;
        }
        self.death_handled = false;
        self.timers.clear();
        self.pending_stun = None;
        self.pending_attack = None;
        self.state.change_state(CharacterState::Idle, &mut self.events);
        true
    }

    pub fn heal(&mut self, amount: f32) -> bool {
        !self.inert && self.stats.heal(amount)
    }

    pub fn restore_mana(&mut self, amount: f32) -> bool {
        !self.inert && self.stats.restore_mana(amount)
    }

    pub fn consume_mana(&mut self, amount: f32) -> bool {
        !self.inert && self.stats.consume_mana(amount)
    }

    /// Grant experience; returns levels gained
    pub fn gain_experience(&mut self, exp: f64) -> u32 {
        if self.inert {
            return 0;
        }
        self.stats.gain_experience(exp, &mut self.events)
    }

    /// Re-bind stats and state from a saved snapshot
    pub fn restore(&mut self, stats: StatsLedger, state: CharacterState) {
        if self.inert {
            return;
        }
        self.stats = stats;
        self.timers.clear();
        self.pending_stun = None;
        self.pending_attack = None;
        self.session = CombatSession::default();
        self.death_handled = self.stats.is_dead();
        let state = if self.death_handled {
            CharacterState::Dead
        } else {
            state
        };
        self.state.change_state(state, &mut self.events);

        // Timed states resume with a full recovery window
        match state {
            CharacterState::Stunned => {
                self.pending_stun = Some(
                    self.timers
                        .schedule(self.config.stun_duration, Recovery::Stun),
                );
            }
            CharacterState::Attacking => {
                self.pending_attack = Some(
                    self.timers
                        .schedule(self.config.attack_duration, Recovery::Attack),
                );
            }
            _ => {}
        }
    }

    /// Advance timers and reconcile the target (called every tick)
    pub fn tick<W>(&mut self, dt: f32, position: Vec3, world: &W)
    where
        W: PositionProvider + TargetLookup + ?Sized,
    {
        if self.inert {
            return;
        }
        self.state.update(dt);

        for recovery in self.timers.advance(dt) {
            let (from, slot) = match recovery {
                Recovery::Stun => (CharacterState::Stunned, &mut self.pending_stun),
                Recovery::Attack => (CharacterState::Attacking, &mut self.pending_attack),
            };
            *slot = None;
            // Anything that replaced the state in the meantime wins
            if self.state.state() == from {
                log::debug!("Character {} recovers from {}", self.owner, from.name());
                self.state.change_state(CharacterState::Idle, &mut self.events);
            }
        }

        self.update_combat_state(position, world);
    }

    /// Drop the target if it is gone, dead or out of leash range
    pub fn update_combat_state<W>(&mut self, position: Vec3, world: &W)
    where
        W: PositionProvider + TargetLookup + ?Sized,
    {
        let Some(target) = self.session.target else {
            self.session.in_combat = false;
            return;
        };

        let alive = world.combatant(target).is_some_and(|c| !c.is_dead());
        let in_leash = world
            .position_of(target)
            .is_some_and(|p| within_range(position, p, self.config.leash_range));

        if !alive || !in_leash {
            log::debug!(
                "Character {} drops target {} (alive: {}, in range: {})",
                self.owner,
                target,
                alive,
                in_leash
            );
            self.session.target = None;
            self.session.in_combat = false;
        }
    }
}

impl Combatant for CombatController {
    fn take_damage(&mut self, amount: f32, attacker: Option<CharacterId>) {
        self.receive_damage(amount, attacker);
    }

    fn is_dead(&self) -> bool {
        self.stats.is_dead()
    }

    fn current_target(&self) -> Option<CharacterId> {
        self.session.target
    }

    fn is_in_combat(&self) -> bool {
        self.session.in_combat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::characters::stats::StatsRecord;
    use crate::game::progression::ProgressionTable;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use std::sync::Arc;

    const ME: CharacterId = 1;
    const FOE: CharacterId = 2;

    #[derive(Default)]
    struct TestWorld {
        positions: HashMap<CharacterId, Vec3>,
        fighters: HashMap<CharacterId, CombatController>,
    }

    impl PositionProvider for TestWorld {
        fn position_of(&self, id: CharacterId) -> Option<Vec3> {
            self.positions.get(&id).copied()
        }
    }

    impl TargetLookup for TestWorld {
        fn combatant(&self, id: CharacterId) -> Option<&dyn Combatant> {
            self.fighters.get(&id).map(|c| c as &dyn Combatant)
        }

        fn combatant_mut(&mut self, id: CharacterId) -> Option<&mut dyn Combatant> {
            self.fighters.get_mut(&id).map(|c| c as &mut dyn Combatant)
        }
    }

    fn config() -> CombatConfig {
        CombatConfig {
            stun_chance: 0.0,
            ..CombatConfig::default()
        }
    }

    fn fighter(id: CharacterId, config: CombatConfig) -> CombatController {
        let stats = StatsLedger::with_record(
            StatsRecord {
                defense: 0.0,
                ..StatsRecord::default()
            },
            Some(Arc::new(ProgressionTable::new(vec![100.0, 250.0]).unwrap())),
        );
        CombatController::with_stats(id, config, stats, id as u64)
    }

    fn world_with_foe(distance: f32) -> TestWorld {
        let mut world = TestWorld::default();
        world.positions.insert(FOE, Vec3::new(distance, 0.0, 0.0));
        world.fighters.insert(FOE, fighter(FOE, config()));
        world
    }

    fn record_events(controller: &mut CombatController) -> Rc<RefCell<Vec<CharacterEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        controller.subscribe(move |e| sink.borrow_mut().push(*e));
        log
    }

    #[test]
    fn test_missing_collaborators_make_inert() {
        let mut controller = CombatController::new(ME, config(), None, Some(StatsLedger::new()), 0);
        assert!(controller.is_inert());

        controller.set_target(Some(FOE));
        assert_eq!(controller.target(), None);
        assert!(!controller.change_state(CharacterState::Running));
        assert!(controller.receive_damage(10.0, Some(FOE)).is_none());
        assert_eq!(controller.gain_experience(500.0), 0);

        let mut world = world_with_foe(1.0);
        assert!(!controller.attack(0.0, Vec3::ZERO, &mut world));

        let stateless = CombatController::new(ME, config(), Some(StateMachine::new()), None, 0);
        assert!(stateless.is_inert());
    }

    #[test]
    fn test_set_target() {
        let mut controller = fighter(ME, config());
        controller.set_target(Some(FOE));
        assert_eq!(controller.target(), Some(FOE));
        assert!(controller.session().in_combat);
        assert_eq!(controller.status(), CombatStatus::InCombat);

        controller.set_target(None);
        assert!(!controller.session().in_combat);
        assert_eq!(controller.status(), CombatStatus::NotInCombat);
    }

    #[test]
    fn test_cannot_target_self() {
        let mut controller = fighter(ME, config());
        controller.set_target(Some(ME));
        assert_eq!(controller.target(), None);
    }

    #[test]
    fn test_can_attack_requires_target_and_range() {
        let mut controller = fighter(ME, config());
        let world = world_with_foe(1.5);
        assert!(!controller.can_attack(0.0, Vec3::ZERO, &world));

        controller.set_target(Some(FOE));
        assert!(controller.can_attack(0.0, Vec3::ZERO, &world));

        let far = world_with_foe(5.0);
        assert!(!controller.can_attack(0.0, Vec3::ZERO, &far));
    }

    #[test]
    fn test_attack_damages_target() {
        let mut controller = fighter(ME, config());
        let events = record_events(&mut controller);
        let mut world = world_with_foe(1.0);
        controller.set_target(Some(FOE));

        assert!(controller.attack(0.0, Vec3::ZERO, &mut world));

        assert_eq!(controller.state(), CharacterState::Attacking);
        assert_eq!(
            *events.borrow(),
            vec![
                CharacterEvent::StateChanged(CharacterState::Attacking),
                CharacterEvent::AttackStarted,
            ]
        );
        let foe = &world.fighters[&FOE];
        assert!(foe.stats().health() <= 91.0 && foe.stats().health() >= 89.0);
        // Reactive aggro
        assert_eq!(foe.target(), Some(ME));
    }

    #[test]
    fn test_attack_cooldown() {
        let mut controller = fighter(ME, config());
        let mut world = world_with_foe(1.0);
        controller.set_target(Some(FOE));

        assert!(controller.attack(0.0, Vec3::ZERO, &mut world));
        assert!(!controller.can_attack(0.5, Vec3::ZERO, &world));
        assert!(!controller.attack(0.5, Vec3::ZERO, &mut world));
        controller.tick(0.5, Vec3::ZERO, &world);
        assert!(controller.can_attack(1.0, Vec3::ZERO, &world));
    }

    #[test]
    fn test_attack_speed_shortens_cooldown() {
        let stats = StatsLedger::with_record(
            StatsRecord {
                attack_speed: 2.0,
                ..StatsRecord::default()
            },
            None,
        );
        let controller = CombatController::with_stats(ME, config(), stats, 0);
        assert_relative_eq!(controller.attack_cooldown(), 0.5);
    }

    #[test]
    fn test_attack_recovers_to_idle() {
        let mut controller = fighter(ME, config());
        let mut world = world_with_foe(1.0);
        controller.set_target(Some(FOE));
        controller.attack(0.0, Vec3::ZERO, &mut world);

        controller.tick(0.2, Vec3::ZERO, &world);
        assert_eq!(controller.state(), CharacterState::Attacking);
        controller.tick(0.2, Vec3::ZERO, &world);
        assert_eq!(controller.state(), CharacterState::Idle);
    }

    #[test]
    fn test_cooldown_tolerates_step_rounding() {
        let mut controller = fighter(ME, config());
        let mut world = world_with_foe(1.0);
        controller.set_target(Some(FOE));
        assert!(controller.attack(10.0, Vec3::ZERO, &mut world));

        assert!(!controller.can_attack(10.999, Vec3::ZERO, &world));
        assert!(controller.can_attack(10.99995, Vec3::ZERO, &world));
    }

    #[test]
    fn test_outside_transition_drops_attack_recovery() {
        let mut controller = fighter(ME, config());
        let mut world = world_with_foe(1.0);
        controller.set_target(Some(FOE));
        assert!(controller.attack(0.0, Vec3::ZERO, &mut world));

        controller.change_state(CharacterState::Walking);
        controller.change_state(CharacterState::Attacking);
        controller.tick(0.5, Vec3::ZERO, &world);
        assert_eq!(controller.state(), CharacterState::Attacking);
    }

    #[test]
    fn test_cannot_attack_dead_target() {
        let mut controller = fighter(ME, config());
        let events = record_events(&mut controller);
        let mut world = world_with_foe(1.0);
        controller.set_target(Some(FOE));
        world
            .fighters
            .get_mut(&FOE)
            .unwrap()
            .receive_damage(1000.0, None);

        assert!(!controller.can_attack(0.0, Vec3::ZERO, &world));
        assert!(!controller.attack(0.0, Vec3::ZERO, &mut world));
        assert_eq!(controller.session().last_attack_time, None);
        assert!(!events.borrow().contains(&CharacterEvent::AttackStarted));
    }

    #[test]
    fn test_attack_against_missing_target_still_swings() {
        let mut controller = fighter(ME, config());
        let mut world = TestWorld::default();
        world.positions.insert(FOE, Vec3::X);
        controller.set_target(Some(FOE));
        assert!(controller.attack(0.0, Vec3::ZERO, &mut world));
    }

    #[test]
    fn test_stun_and_recovery() {
        let mut controller = fighter(
            ME,
            CombatConfig {
                stun_chance: 1.0,
                stun_duration: 1.0,
                ..CombatConfig::default()
            },
        );
        let world = TestWorld::default();

        controller.receive_damage(5.0, None);
        assert_eq!(controller.state(), CharacterState::Stunned);
        assert_eq!(controller.status(), CombatStatus::Stunned);
        assert!(controller.has_pending_stun());

        controller.tick(0.5, Vec3::ZERO, &world);
        assert_eq!(controller.state(), CharacterState::Stunned);
        controller.tick(0.5, Vec3::ZERO, &world);
        assert_eq!(controller.state(), CharacterState::Idle);
        assert!(!controller.has_pending_stun());
    }

    #[test]
    fn test_stun_recovery_does_not_clobber_later_state() {
        let mut controller = fighter(
            ME,
            CombatConfig {
                stun_chance: 1.0,
                ..CombatConfig::default()
            },
        );
        let world = TestWorld::default();

        controller.receive_damage(5.0, None);
        assert_eq!(controller.state(), CharacterState::Stunned);
        controller.change_state(CharacterState::Attacking);

        controller.tick(2.0, Vec3::ZERO, &world);
        assert_eq!(controller.state(), CharacterState::Attacking);
    }

    #[test]
    fn test_stunned_cannot_attack() {
        let mut controller = fighter(
            ME,
            CombatConfig {
                stun_chance: 1.0,
                ..CombatConfig::default()
            },
        );
        let world = world_with_foe(1.0);
        controller.set_target(Some(FOE));
        controller.receive_damage(5.0, None);
        assert!(!controller.can_attack(10.0, Vec3::ZERO, &world));
    }

    #[test]
    fn test_restun_replaces_pending_recovery() {
        let mut controller = fighter(
            ME,
            CombatConfig {
                stun_chance: 1.0,
                stun_duration: 1.0,
                ..CombatConfig::default()
            },
        );
        let world = TestWorld::default();

        controller.receive_damage(5.0, None);
        controller.tick(0.8, Vec3::ZERO, &world);
        controller.receive_damage(5.0, None);
        controller.tick(0.5, Vec3::ZERO, &world);
        assert_eq!(controller.state(), CharacterState::Stunned);
        controller.tick(0.5, Vec3::ZERO, &world);
        assert_eq!(controller.state(), CharacterState::Idle);
    }

    #[test]
    fn test_zero_stun_chance_never_stuns() {
        let mut controller = fighter(ME, config());
        for _ in 0..20 {
            controller.receive_damage(1.0, None);
        }
        assert_eq!(controller.state(), CharacterState::Idle);
    }

    #[test]
    fn test_death_is_handled_once() {
        let mut controller = fighter(ME, config());
        let events = record_events(&mut controller);
        controller.set_target(Some(FOE));

        let outcome = controller.receive_damage(150.0, Some(FOE)).unwrap();
        assert!(outcome.died);
        controller.handle_death();
        controller.receive_damage(10.0, Some(FOE));

        assert_eq!(controller.state(), CharacterState::Dead);
        assert_eq!(controller.status(), CombatStatus::Dead);
        assert_eq!(controller.target(), None);
        assert!(!controller.session().in_combat);
        assert_eq!(
            *events.borrow(),
            vec![
                CharacterEvent::DamageTaken(150.0),
                CharacterEvent::Death,
                CharacterEvent::StateChanged(CharacterState::Dead),
            ]
        );
    }

    #[test]
    fn test_dead_refuses_actions() {
        let mut controller = fighter(ME, config());
        let mut world = world_with_foe(1.0);
        controller.receive_damage(500.0, None);

        controller.set_target(Some(FOE));
        assert_eq!(controller.target(), None);
        assert!(!controller.change_state(CharacterState::Walking));
        assert!(!controller.attack(5.0, Vec3::ZERO, &mut world));
        assert_eq!(controller.state(), CharacterState::Dead);
    }

    #[test]
    fn test_death_cancels_pending_stun() {
        let mut controller = fighter(
            ME,
            CombatConfig {
                stun_chance: 1.0,
                ..CombatConfig::default()
            },
        );
        let world = TestWorld::default();
        controller.receive_damage(5.0, None);
        assert!(controller.has_pending_stun());

        controller.receive_damage(500.0, None);
        assert!(!controller.has_pending_stun());
        controller.tick(5.0, Vec3::ZERO, &world);
        assert_eq!(controller.state(), CharacterState::Dead);
    }

    #[test]
    fn test_revive() {
        let mut controller = fighter(ME, config());
        assert!(!controller.revive(0.5));

        controller.receive_damage(500.0, None);
        assert!(controller.revive(0.5));
        assert_eq!(controller.state(), CharacterState::Idle);
        assert_relative_eq!(controller.stats().health(), 50.0);

        // A second death is announced again
        let events = record_events(&mut controller);
        controller.receive_damage(500.0, None);
        assert_eq!(controller.state(), CharacterState::Dead);
        assert!(events.borrow().contains(&CharacterEvent::Death));
    }

    #[test]
    fn test_reconcile_drops_dead_or_missing_target() {
        let mut controller = fighter(ME, config());
        let mut world = world_with_foe(1.0);
        controller.set_target(Some(FOE));

        controller.tick(0.1, Vec3::ZERO, &world);
        assert_eq!(controller.target(), Some(FOE));

        world
            .fighters
            .get_mut(&FOE)
            .unwrap()
            .receive_damage(1000.0, None);
        controller.tick(0.1, Vec3::ZERO, &world);
        assert_eq!(controller.target(), None);

        controller.set_target(Some(FOE));
        world.fighters.remove(&FOE);
        controller.tick(0.1, Vec3::ZERO, &world);
        assert_eq!(controller.target(), None);
    }

    #[test]
    fn test_reconcile_drops_target_beyond_leash() {
        let mut controller = fighter(ME, config());
        let world = world_with_foe(20.0);
        controller.set_target(Some(FOE));
        controller.tick(0.1, Vec3::ZERO, &world);
        assert_eq!(controller.target(), None);
        assert!(!controller.session().in_combat);
    }

    #[test]
    fn test_reactive_aggro_keeps_existing_target() {
        let mut controller = fighter(ME, config());
        controller.set_target(Some(3));
        controller.receive_damage(5.0, Some(FOE));
        assert_eq!(controller.target(), Some(3));
    }

    #[test]
    fn test_restore_stunned_recovers() {
        let mut controller = fighter(ME, config());
        let world = TestWorld::default();
        let stats = StatsLedger::with_record(StatsRecord::default(), None);
        controller.restore(stats, CharacterState::Stunned);
        assert_eq!(controller.state(), CharacterState::Stunned);
        assert!(controller.has_pending_stun());

        controller.tick(1.0, Vec3::ZERO, &world);
        assert_eq!(controller.state(), CharacterState::Idle);
    }

    #[test]
    fn test_gain_experience_through_controller() {
        let mut controller = fighter(ME, config());
        let events = record_events(&mut controller);
        assert_eq!(controller.gain_experience(100.0), 1);
        assert_eq!(controller.stats().level(), 2);
        assert_eq!(
            *events.borrow(),
            vec![
                CharacterEvent::LeveledUp(2),
                CharacterEvent::ExperienceGained(100.0),
            ]
        );
    }
}
