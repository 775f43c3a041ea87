// Character movement - locomotion states, gravity and jumping

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::game::combat::CombatController;

use super::state::CharacterState;

/// Downward speed below which a grounded character is pinned to the floor
const GROUND_EPSILON: f32 = 1e-4;

/// Movement tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Walk speed (units/second) at movement speed 1.0
    pub walk_speed: f32,
    /// Run speed (units/second) at movement speed 1.0
    pub run_speed: f32,
    /// Apex height of a jump
    pub jump_height: f32,
    /// Vertical acceleration (negative is down)
    pub gravity: f32,
    /// Grace window after leaving the ground during which a jump is still accepted
    pub coyote_time: f32,
}

pub const BASE_MOVEMENT: MovementConfig = MovementConfig {
    walk_speed: 3.0,
    run_speed: 6.0,
    jump_height: 2.0,
    gravity: -9.81,
    coyote_time: 0.15,
};

impl Default for MovementConfig {
    fn default() -> Self {
        BASE_MOVEMENT
    }
}

/// Moves a character on a flat ground plane at y = 0.
///
/// State changes go through the character's `CombatController`, so a dead
/// character can never be walked out of `Dead`. Locomotion is refused while
/// stunned or dead.
#[derive(Debug, Clone)]
pub struct MovementController {
    config: MovementConfig,
    direction: Vec3,
    current_speed: f32,
    velocity_y: f32,
    grounded: bool,
    time_since_grounded: f32,
    coyote_available: bool,
}

impl MovementController {
    pub fn new(config: MovementConfig) -> Self {
        Self {
            config,
            direction: Vec3::ZERO,
            current_speed: 0.0,
            velocity_y: 0.0,
            grounded: true,
            time_since_grounded: 0.0,
            coyote_available: true,
        }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Current velocity (horizontal intent plus vertical motion)
    pub fn velocity(&self) -> Vec3 {
        self.direction * self.current_speed + Vec3::Y * self.velocity_y
    }

    fn can_change_movement_state(combat: &CombatController) -> bool {
        !combat.is_inert() && combat.state().can_change_movement()
    }

    /// Enter a locomotion state without interrupting an attack in progress
    fn enter(combat: &mut CombatController, state: CharacterState) {
        let current = combat.state();
        if current != state && current != CharacterState::Attacking && !current.is_airborne() {
            combat.change_state(state);
        }
    }

    fn set_direction(&mut self, direction: Vec3) {
        let planar = Vec3::new(direction.x, 0.0, direction.z);
        self.direction = planar.normalize_or_zero();
    }

    /// Move at walk speed
    pub fn walk(&mut self, combat: &mut CombatController, direction: Vec3) -> bool {
        if !Self::can_change_movement_state(combat) {
            return false;
        }
        Self::enter(combat, CharacterState::Walking);
        self.current_speed = self.config.walk_speed * combat.stats().movement_speed();
        self.set_direction(direction);
        true
    }

    /// Move at run speed
    pub fn run(&mut self, combat: &mut CombatController, direction: Vec3) -> bool {
        if !Self::can_change_movement_state(combat) {
            return false;
        }
        Self::enter(combat, CharacterState::Running);
        self.current_speed = self.config.run_speed * combat.stats().movement_speed();
        self.set_direction(direction);
        true
    }

    pub fn roll(&mut self, combat: &mut CombatController) -> bool {
        self.special(combat, CharacterState::Rolling)
    }

    pub fn fly(&mut self, combat: &mut CombatController) -> bool {
        self.special(combat, CharacterState::Flying)
    }

    pub fn climb(&mut self, combat: &mut CombatController) -> bool {
        self.special(combat, CharacterState::Climbing)
    }

    fn special(&mut self, combat: &mut CombatController, state: CharacterState) -> bool {
        if !Self::can_change_movement_state(combat) {
            return false;
        }
        combat.change_state(state)
    }

    /// Jump if grounded or still within coyote time
    pub fn jump(&mut self, combat: &mut CombatController) -> bool {
        if !Self::can_change_movement_state(combat) {
            return false;
        }
        let in_coyote = self.coyote_available && self.time_since_grounded <= self.config.coyote_time;
        if !self.grounded && !in_coyote {
            return false;
        }

        self.velocity_y = (self.config.jump_height * -2.0 * self.config.gravity).max(0.0).sqrt();
        self.grounded = false;
        self.coyote_available = false;
        combat.change_state(CharacterState::Jumping)
    }

    /// Stop moving and return to Idle
    pub fn stop(&mut self, combat: &mut CombatController) -> bool {
        self.current_speed = 0.0;
        self.direction = Vec3::ZERO;
        if !Self::can_change_movement_state(combat) {
            return false;
        }
        if combat.state().is_moving() {
            combat.change_state(CharacterState::Idle);
        }
        true
    }

    /// Integrate one step of motion into `position`
    pub fn step(&mut self, dt: f32, position: &mut Vec3, combat: &mut CombatController) {
        if !(dt > 0.0) {
            return;
        }

        let state = combat.state();
        if state.can_change_movement() && !combat.is_inert() {
            *position += self.direction * self.current_speed * dt;
        }

        // Gravity
        if self.grounded && self.velocity_y <= 0.0 {
            self.velocity_y = 0.0;
        } else if state != CharacterState::Flying {
            self.velocity_y += self.config.gravity * dt;
        }
        position.y += self.velocity_y * dt;

        if position.y <= GROUND_EPSILON && self.velocity_y <= 0.0 {
            position.y = 0.0;
            self.velocity_y = 0.0;
            self.time_since_grounded = 0.0;
            self.coyote_available = true;
            if !self.grounded {
                self.grounded = true;
                self.on_land(combat);
            }
        } else {
            self.grounded = false;
            self.time_since_grounded += dt;
        }
    }

    /// Landing from a jump returns to a ground state
    fn on_land(&mut self, combat: &mut CombatController) {
        if combat.state() == CharacterState::Jumping {
            let next = if self.current_speed > 0.0 && self.direction != Vec3::ZERO {
                CharacterState::Walking
            } else {
                CharacterState::Idle
            };
            combat.change_state(next);
        }
    }

    /// Put the character back on the ground with no motion (respawn/restore)
    pub fn reset(&mut self) {
        self.direction = Vec3::ZERO;
        self.current_speed = 0.0;
        self.velocity_y = 0.0;
        self.grounded = true;
        self.time_since_grounded = 0.0;
        self.coyote_available = true;
    }
}

impl Default for MovementController {
    fn default() -> Self {
        Self::new(MovementConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::characters::stats::{StatsLedger, StatsRecord};
    use crate::game::combat::CombatConfig;
    use approx::assert_relative_eq;

    fn combat() -> CombatController {
        CombatController::with_stats(
            0,
            CombatConfig::default(),
            StatsLedger::with_record(StatsRecord::default(), None),
            0,
        )
    }

    #[test]
    fn test_walk_moves_and_changes_state() {
        let mut combat = combat();
        let mut movement = MovementController::default();
        let mut position = Vec3::ZERO;

        assert!(movement.walk(&mut combat, Vec3::X));
        assert_eq!(combat.state(), CharacterState::Walking);
        movement.step(1.0, &mut position, &mut combat);
        assert_relative_eq!(position.x, 3.0);
        assert_eq!(position.y, 0.0);
    }

    #[test]
    fn test_run_uses_movement_speed_stat() {
        let mut combat = CombatController::with_stats(
            0,
            CombatConfig::default(),
            StatsLedger::with_record(
                StatsRecord {
                    movement_speed: 0.5,
                    ..StatsRecord::default()
                },
                None,
            ),
            0,
        );
        let mut movement = MovementController::default();
        movement.run(&mut combat, Vec3::Z);
        assert_eq!(combat.state(), CharacterState::Running);
        assert_relative_eq!(movement.current_speed(), 3.0);
    }

    #[test]
    fn test_stop_returns_to_idle() {
        let mut combat = combat();
        let mut movement = MovementController::default();
        movement.walk(&mut combat, Vec3::X);
        movement.stop(&mut combat);
        assert_eq!(combat.state(), CharacterState::Idle);
        assert_eq!(movement.velocity(), Vec3::ZERO);
    }

    #[test]
    fn test_stunned_cannot_move() {
        let mut combat = combat();
        combat.change_state(CharacterState::Stunned);
        let mut movement = MovementController::default();
        assert!(!movement.walk(&mut combat, Vec3::X));
        assert!(!movement.jump(&mut combat));
        assert_eq!(combat.state(), CharacterState::Stunned);
    }

    #[test]
    fn test_dead_cannot_move() {
        let mut combat = combat();
        combat.receive_damage(1000.0, None);
        let mut movement = MovementController::default();
        assert!(!movement.run(&mut combat, Vec3::X));
        assert!(!movement.roll(&mut combat));
        assert!(!movement.stop(&mut combat));
        assert_eq!(combat.state(), CharacterState::Dead);
    }

    #[test]
    fn test_jump_and_land() {
        let mut combat = combat();
        let mut movement = MovementController::default();
        let mut position = Vec3::ZERO;

        assert!(movement.jump(&mut combat));
        assert_eq!(combat.state(), CharacterState::Jumping);
        assert!(!movement.jump(&mut combat), "no double jump");

        movement.step(0.1, &mut position, &mut combat);
        assert!(position.y > 0.0);
        assert!(!movement.is_grounded());

        for _ in 0..100 {
            movement.step(0.1, &mut position, &mut combat);
        }
        assert!(movement.is_grounded());
        assert_eq!(position.y, 0.0);
        assert_eq!(combat.state(), CharacterState::Idle);
    }

    #[test]
    fn test_coyote_time() {
        let mut combat = combat();
        let mut movement = MovementController::default();
        let mut position = Vec3::new(0.0, 5.0, 0.0);

        // Walked off a ledge: airborne, but still inside the grace window
        movement.step(0.1, &mut position, &mut combat);
        assert!(!movement.is_grounded());
        assert!(movement.jump(&mut combat));

        let mut late = MovementController::default();
        let mut position = Vec3::new(0.0, 5.0, 0.0);
        late.step(0.1, &mut position, &mut combat);
        late.step(0.1, &mut position, &mut combat);
        assert!(!late.jump(&mut combat));
    }

    #[test]
    fn test_walk_does_not_interrupt_attack() {
        let mut combat = combat();
        combat.change_state(CharacterState::Attacking);
        let mut movement = MovementController::default();
        assert!(movement.walk(&mut combat, Vec3::X));
        assert_eq!(combat.state(), CharacterState::Attacking);
    }
}
