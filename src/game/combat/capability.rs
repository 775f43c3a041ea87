// Seams between a character's combat logic and the world around it

use glam::Vec3;

use crate::game::characters::CharacterId;

/// The narrow interface a character exposes to be hit by others.
///
/// This is the only cross-character coupling in combat: attackers never see
/// a concrete character type, only this capability.
pub trait Combatant {
    /// Receive a hit of `amount` raw damage, optionally from a known attacker
    fn take_damage(&mut self, amount: f32, attacker: Option<CharacterId>);

    /// Whether this combatant is dead
    fn is_dead(&self) -> bool;

    /// Who this combatant is currently targeting
    fn current_target(&self) -> Option<CharacterId>;

    fn has_target(&self) -> bool {
        self.current_target().is_some()
    }

    /// Whether this combatant is engaged with a target
    fn is_in_combat(&self) -> bool;
}

/// Resolves where characters are, for range checks
pub trait PositionProvider {
    fn position_of(&self, id: CharacterId) -> Option<Vec3>;
}

/// Resolves a character id to its combat capability.
/// None means the character no longer exists.
pub trait TargetLookup {
    fn combatant(&self, id: CharacterId) -> Option<&dyn Combatant>;

    fn combatant_mut(&mut self, id: CharacterId) -> Option<&mut dyn Combatant>;
}
