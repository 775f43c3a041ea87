// Character system
//
// This module contains everything related to simulated characters:
// - Character data structure and management
// - Stats ledger and its persisted record
// - State machine for character behavior
// - Movement on the ground plane
// - Notifications and save snapshots

pub mod character;
pub mod events;
pub mod movement;
pub mod snapshot;
pub mod state;
pub mod stats;

// Re-export commonly used types
pub use character::{Character, CharacterId, CharacterManager, DEFAULT_REVIVE_PERCENT};
pub use events::{CharacterEvent, CharacterEvents};
pub use movement::{MovementConfig, MovementController, BASE_MOVEMENT};
pub use snapshot::CharacterSnapshot;
pub use state::{CharacterState, StateMachine};
pub use stats::{DamageOutcome, StatsLedger, StatsRecord, BASE_STATS};
