// Combat system
//
// - `capability`: the traits combat talks to the world through
// - `controller`: per-character targeting, attacks, damage intake and stun

pub mod capability;
pub mod controller;

pub use capability::{Combatant, PositionProvider, TargetLookup};
pub use controller::{CombatConfig, CombatController, CombatSession, CombatStatus, BASE_COMBAT};
