// Per-frame input intent produced by an external input driver

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Minimum stick/key magnitude that counts as movement
const MOVE_DEADZONE: f32 = 0.1;

/// What a controlling player (or AI) wants a character to do this frame.
///
/// Platform input polling lives outside this crate; whatever polls devices
/// fills one of these per character per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterIntent {
    /// Desired movement direction on the ground plane (y is ignored)
    pub move_direction: Vec3,
    /// Jump was pressed this frame
    pub jump_pressed: bool,
    /// Attack is held
    pub attack_pressed: bool,
    /// Run modifier is held
    pub run_pressed: bool,
}

impl CharacterIntent {
    /// Intent that does nothing
    pub fn idle() -> Self {
        Self::default()
    }

    /// Intent to move along a direction
    pub fn moving(direction: Vec3) -> Self {
        Self {
            move_direction: direction,
            ..Self::default()
        }
    }

    pub fn with_run(mut self, run: bool) -> Self {
        self.run_pressed = run;
        self
    }

    pub fn with_jump(mut self, jump: bool) -> Self {
        self.jump_pressed = jump;
        self
    }

    pub fn with_attack(mut self, attack: bool) -> Self {
        self.attack_pressed = attack;
        self
    }

    /// Check if the intent asks for horizontal movement
    pub fn has_movement(&self) -> bool {
        self.planar().length() > MOVE_DEADZONE
    }

    /// Normalized movement direction on the ground plane, zero inside the deadzone
    pub fn direction(&self) -> Vec3 {
        if self.has_movement() {
            self.planar().normalize()
        } else {
            Vec3::ZERO
        }
    }

    /// Clear one-frame presses (called at end of frame)
    pub fn clear_presses(&mut self) {
        self.jump_pressed = false;
        // Note: movement, attack and run are continuous, not cleared
    }

    fn planar(&self) -> Vec3 {
        Vec3::new(self.move_direction.x, 0.0, self.move_direction.z)
    }
}
