//! Character simulation core.
//!
//! A tick-driven model of game characters: a state machine, a stats ledger
//! with experience and leveling, and a combat controller handling targeting,
//! attack cooldowns, damage and stun. Rendering, physics and device input are
//! left to the embedding application.

pub mod common;
pub mod engine;
pub mod game;
