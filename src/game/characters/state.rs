// Character state machine

use serde::{Deserialize, Serialize};

use crate::engine::events::EventSink;

use super::events::CharacterEvent;

/// The single discrete activity a character is currently performing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CharacterState {
    /// Standing still
    #[default]
    Idle,
    /// Moving at walk speed
    Walking,
    /// Moving at run speed
    Running,
    /// Dodge roll
    Rolling,
    /// Airborne after a jump
    Jumping,
    /// Flying
    Flying,
    /// Climbing a surface
    Climbing,
    /// Performing an attack
    Attacking,
    /// Stunned by a hit, recovers on a timer
    Stunned,
    /// Character is dead; only a revive leaves this state
    Dead,
}

impl CharacterState {
    /// Every state, in declaration order
    pub const ALL: [CharacterState; 10] = [
        Self::Idle,
        Self::Walking,
        Self::Running,
        Self::Rolling,
        Self::Jumping,
        Self::Flying,
        Self::Climbing,
        Self::Attacking,
        Self::Stunned,
        Self::Dead,
    ];

    /// Check if the character may start a movement state from here
    pub fn can_change_movement(&self) -> bool {
        !matches!(self, Self::Stunned | Self::Dead)
    }

    /// Check if the state itself allows starting an attack
    pub fn can_attack(&self) -> bool {
        !matches!(self, Self::Stunned | Self::Dead)
    }

    /// Check if the state is one of the locomotion states
    pub fn is_moving(&self) -> bool {
        matches!(
            self,
            Self::Walking | Self::Running | Self::Rolling | Self::Flying | Self::Climbing
        )
    }

    /// Check if the character is in the air
    pub fn is_airborne(&self) -> bool {
        matches!(self, Self::Jumping | Self::Flying)
    }

    /// Stable lowercase name, handy for logs and save files
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Walking => "walking",
            Self::Running => "running",
            Self::Rolling => "rolling",
            Self::Jumping => "jumping",
            Self::Flying => "flying",
            Self::Climbing => "climbing",
            Self::Attacking => "attacking",
            Self::Stunned => "stunned",
            Self::Dead => "dead",
        }
    }
}

/// Holds the current state and announces every change.
///
/// No transition table lives here: `change_state` always applies and always
/// notifies, even when the new state equals the old one. Deciding whether a
/// transition is legal is the caller's job.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    current_state: CharacterState,
    previous_state: CharacterState,
    state_time: f32,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state
    pub fn state(&self) -> CharacterState {
        self.current_state
    }

    /// Get the previous state
    pub fn previous_state(&self) -> CharacterState {
        self.previous_state
    }

    /// Get time spent in current state
    pub fn state_time(&self) -> f32 {
        self.state_time
    }

    /// Overwrite the current state and emit `StateChanged` before returning
    pub fn change_state(
        &mut self,
        new_state: CharacterState,
        events: &mut dyn EventSink<CharacterEvent>,
    ) {
        self.previous_state = self.current_state;
        self.current_state = new_state;
        self.state_time = 0.0;
        events.emit(CharacterEvent::StateChanged(new_state));
    }

    /// Advance time spent in the current state (called every tick)
    pub fn update(&mut self, dt: f32) {
        if dt > 0.0 {
            self.state_time += dt;
        }
    }
}
