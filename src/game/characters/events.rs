// Notifications a character publishes to its subscribers

use serde::{Deserialize, Serialize};

use crate::engine::events::EventBus;

use super::state::CharacterState;

/// Something observable happened to a character
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CharacterEvent {
    /// The state machine applied a transition
    StateChanged(CharacterState),
    /// Health was reduced by this (post-mitigation) amount
    DamageTaken(f32),
    /// Health reached zero; emitted once per death
    Death,
    /// A level was gained; carries the new level
    LeveledUp(u32),
    /// Experience was granted; carries the granted amount
    ExperienceGained(f64),
    /// An attack was started
    AttackStarted,
}

/// Subscriber registry for one character
pub type CharacterEvents = EventBus<CharacterEvent>;
