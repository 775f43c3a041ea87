// Character stats - vitals, combat attributes and progression

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::common::math::{clamp01, is_positive};
use crate::engine::events::EventSink;
use crate::game::progression::ProgressionTable;

use super::events::CharacterEvent;

/// Share of incoming damage that always gets through defense
pub const MIN_DAMAGE_FRACTION: f32 = 0.1;

/// Spread applied to attack rolls (plus or minus this fraction)
pub const ATTACK_VARIATION: f32 = 0.1;

/// Growth of max health and max mana per level gained
pub const LEVEL_UP_GROWTH: f32 = 0.1;

/// Lowest allowed attack/movement speed
pub const MIN_SPEED: f32 = 0.1;

/// The numeric attribute set of one character.
///
/// This is also the persisted layout used by save files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsRecord {
    pub health: f32,
    pub max_health: f32,
    pub mana: f32,
    pub max_mana: f32,
    pub level: u32,
    /// Experience earned towards the next level
    pub experience: f64,
    pub attack_damage: f32,
    pub defense: f32,
    pub attack_speed: f32,
    pub movement_speed: f32,
}

/// Starting stats for a fresh level 1 character
pub const BASE_STATS: StatsRecord = StatsRecord {
    health: 100.0,
    max_health: 100.0,
    mana: 50.0,
    max_mana: 50.0,
    level: 1,
    experience: 0.0,
    attack_damage: 10.0,
    defense: 2.0,
    attack_speed: 1.0,
    movement_speed: 1.0,
};

impl Default for StatsRecord {
    fn default() -> Self {
        BASE_STATS
    }
}

impl StatsRecord {
    /// Force every field back into its legal range
    pub fn validate(&mut self) {
        if !(self.max_health > 0.0) || !self.max_health.is_finite() {
            log::warn!("max_health {} is invalid, using 1", self.max_health);
            self.max_health = 1.0;
        }
        if !(self.max_mana >= 0.0) || !self.max_mana.is_finite() {
            self.max_mana = 0.0;
        }
        self.health = clamp_or_zero(self.health, self.max_health);
        self.mana = clamp_or_zero(self.mana, self.max_mana);
        self.level = self.level.max(1);
        if !(self.experience >= 0.0) || !self.experience.is_finite() {
            self.experience = 0.0;
        }
        self.attack_damage = non_negative(self.attack_damage);
        self.defense = non_negative(self.defense);
        self.attack_speed = at_least(self.attack_speed, MIN_SPEED);
        self.movement_speed = at_least(self.movement_speed, MIN_SPEED);
    }
}

fn clamp_or_zero(value: f32, max: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

fn non_negative(value: f32) -> f32 {
    if value >= 0.0 && value.is_finite() {
        value
    } else {
        0.0
    }
}

fn at_least(value: f32, floor: f32) -> f32 {
    if value >= floor && value.is_finite() {
        value
    } else {
        floor
    }
}

/// What a damage application did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    /// Health actually removed (after defense)
    pub dealt: f32,
    /// This hit killed the character
    pub died: bool,
}

/// Owns a character's stats record and enforces its invariants.
///
/// Until a record is bound every operation is a no-op and every query reports
/// a neutral value. Health and mana are clamped after every mutation.
#[derive(Debug, Clone, Default)]
pub struct StatsLedger {
    record: Option<StatsRecord>,
    progression: Option<Arc<ProgressionTable>>,
    is_dead: bool,
}

impl StatsLedger {
    /// Create an unbound ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger already bound to a record and a progression table
    pub fn with_record(record: StatsRecord, progression: Option<Arc<ProgressionTable>>) -> Self {
        let mut ledger = Self::new();
        ledger.initialize(Some(record));
        ledger.set_progression(progression);
        ledger
    }

    /// Bind the ledger to a record. An absent record is logged and ignored.
    pub fn initialize(&mut self, data: Option<StatsRecord>) -> bool {
        let Some(mut record) = data else {
            log::error!("Stats record is missing, ledger stays uninitialized");
            return false;
        };
        record.validate();
        self.is_dead = record.health <= 0.0;
        self.record = Some(record);
        true
    }

    /// Bind the shared progression table. An absent table disables leveling.
    pub fn set_progression(&mut self, table: Option<Arc<ProgressionTable>>) {
        if table.is_none() {
            log::error!("Progression table is missing, experience gain is disabled");
        }
        self.progression = table;
    }

    pub fn is_initialized(&self) -> bool {
        self.record.is_some()
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub fn has_progression(&self) -> bool {
        self.progression.is_some()
    }

    pub fn progression(&self) -> Option<&Arc<ProgressionTable>> {
        self.progression.as_ref()
    }

    /// Borrow the bound record
    pub fn record(&self) -> Option<&StatsRecord> {
        self.record.as_ref()
    }

    pub fn health(&self) -> f32 {
        self.record.as_ref().map_or(0.0, |r| r.health)
    }

    pub fn max_health(&self) -> f32 {
        self.record.as_ref().map_or(0.0, |r| r.max_health)
    }

    pub fn mana(&self) -> f32 {
        self.record.as_ref().map_or(0.0, |r| r.mana)
    }

    pub fn max_mana(&self) -> f32 {
        self.record.as_ref().map_or(0.0, |r| r.max_mana)
    }

    pub fn level(&self) -> u32 {
        self.record.as_ref().map_or(1, |r| r.level)
    }

    pub fn experience(&self) -> f64 {
        self.record.as_ref().map_or(0.0, |r| r.experience)
    }

    pub fn attack_damage(&self) -> f32 {
        self.record.as_ref().map_or(0.0, |r| r.attack_damage)
    }

    pub fn defense(&self) -> f32 {
        self.record.as_ref().map_or(0.0, |r| r.defense)
    }

    pub fn attack_speed(&self) -> f32 {
        self.record.as_ref().map_or(1.0, |r| r.attack_speed)
    }

    pub fn movement_speed(&self) -> f32 {
        self.record.as_ref().map_or(1.0, |r| r.movement_speed)
    }

    /// Live record, or None when unbound or dead
    fn living_record(&mut self) -> Option<&mut StatsRecord> {
        if self.is_dead {
            return None;
        }
        self.record.as_mut()
    }

    /// Apply incoming damage after defense.
    ///
    /// At least `MIN_DAMAGE_FRACTION` of the raw amount always lands. Returns
    /// None when nothing happened (dead, unbound or non-positive amount).
    pub fn take_damage(
        &mut self,
        amount: f32,
        events: &mut dyn EventSink<CharacterEvent>,
    ) -> Option<DamageOutcome> {
        if !is_positive(amount) {
            return None;
        }
        let record = self.living_record()?;

        let dealt = (amount - record.defense).max(amount * MIN_DAMAGE_FRACTION);
        record.health = (record.health - dealt).clamp(0.0, record.max_health);
        let depleted = record.health <= 0.0;

        events.emit(CharacterEvent::DamageTaken(dealt));

        let died = depleted && self.die(events);
        Some(DamageOutcome { dealt, died })
    }

    /// Mark the character dead. Returns false if it already was.
    fn die(&mut self, events: &mut dyn EventSink<CharacterEvent>) -> bool {
        if self.is_dead {
            return false;
        }
        self.is_dead = true;
        if let Some(record) = self.record.as_mut() {
            record.health = 0.0;
        }
        log::info!("Character has died");
        events.emit(CharacterEvent::Death);
        true
    }

    /// Restore health, capped at max
    pub fn heal(&mut self, amount: f32) -> bool {
        if !is_positive(amount) {
            return false;
        }
        let Some(record) = self.living_record() else {
            return false;
        };
        record.health = (record.health + amount).min(record.max_health);
        true
    }

    /// Restore mana, capped at max
    pub fn restore_mana(&mut self, amount: f32) -> bool {
        if !is_positive(amount) {
            return false;
        }
        let Some(record) = self.living_record() else {
            return false;
        };
        record.mana = (record.mana + amount).min(record.max_mana);
        true
    }

    /// Spend mana. Fails without touching anything when there is not enough.
    pub fn consume_mana(&mut self, amount: f32) -> bool {
        if !is_positive(amount) {
            return false;
        }
        let Some(record) = self.living_record() else {
            return false;
        };
        if record.mana < amount {
            return false;
        }
        record.mana = (record.mana - amount).max(0.0);
        true
    }

    /// Grant experience, leveling up as many times as it pays for.
    ///
    /// Leveling stops when the experience runs out or the table has no
    /// threshold for the current level; in the latter case the rest is
    /// discarded. `ExperienceGained` is emitted once, after any `LeveledUp`.
    /// Returns the number of levels gained.
    pub fn gain_experience(
        &mut self,
        exp: f64,
        events: &mut dyn EventSink<CharacterEvent>,
    ) -> u32 {
        if !(exp > 0.0) || self.is_dead {
            return 0;
        }
        let Some(table) = self.progression.clone() else {
            return 0;
        };
        let Some(record) = self.record.as_mut() else {
            return 0;
        };

        let start_level = record.level;
        let mut remaining = exp;

        while remaining > 0.0 {
            let Ok(cost) = table.experience_for_level(record.level) else {
                log::debug!(
                    "Level {} is the top of the table, discarding {} experience",
                    record.level,
                    remaining
                );
                break;
            };

            let needed = (cost - record.experience).max(0.0);
            if remaining >= needed {
                remaining -= needed;
                record.level += 1;
                record.experience = 0.0;
                Self::level_up(record, events);
            } else {
                record.experience += remaining;
                remaining = 0.0;
            }
        }

        events.emit(CharacterEvent::ExperienceGained(exp));
        record.level - start_level
    }

    fn level_up(record: &mut StatsRecord, events: &mut dyn EventSink<CharacterEvent>) {
        record.max_health += record.max_health * LEVEL_UP_GROWTH;
        record.max_mana += record.max_mana * LEVEL_UP_GROWTH;
        record.health = record.max_health;
        record.mana = record.max_mana;

        log::info!("Character leveled up to {}", record.level);
        events.emit(CharacterEvent::LeveledUp(record.level));
    }

    /// Roll outgoing damage: base attack plus or minus `ATTACK_VARIATION`.
    /// Zero when dead or unbound.
    pub fn get_attack_damage<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.is_dead {
            return 0.0;
        }
        let Some(record) = self.record.as_ref() else {
            return 0.0;
        };

        let base = record.attack_damage;
        let variation = base * ATTACK_VARIATION;
        if variation <= 0.0 {
            return base;
        }
        rng.gen_range((base - variation)..=(base + variation))
    }

    /// Bring a dead character back with a fraction of max health.
    /// Does nothing for the living.
    pub fn revive(&mut self, health_percent: f32) -> bool {
        if !self.is_dead {
            return false;
        }
        let Some(record) = self.record.as_mut() else {
            return false;
        };
        self.is_dead = false;
        record.health = record.max_health * clamp01(health_percent);

        log::info!("Character has been revived with {} health", record.health);
        true
    }
}
