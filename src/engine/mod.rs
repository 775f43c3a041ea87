// Engine modules: time, events, timers, fixed-step loop, input intent

pub mod clock;
pub mod events;
pub mod game_loop;
pub mod input;
pub mod timer;
