// Game modules: characters, combat, progression and configuration

pub mod characters;
pub mod combat;
pub mod config;
pub mod progression;
