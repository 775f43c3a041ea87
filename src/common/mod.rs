// Shared helpers used across engine and game code

pub mod math;
