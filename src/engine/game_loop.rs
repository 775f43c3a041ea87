/// Fixed timestep simulation loop
///
/// Character simulation advances in fixed steps so cooldowns, stun timers and
/// gravity behave the same regardless of how irregular the embedding
/// application's frames are. Frames feed elapsed time in; the loop answers how
/// many fixed steps to run.
use std::time::Duration;

/// Target simulation rate (60 steps per second)
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;
const FIXED_TIMESTEP_DURATION: Duration = Duration::from_micros(16_667); // ~1/60 second

/// Maximum number of simulation steps per frame to prevent spiral of death
const MAX_STEPS_PER_FRAME: u32 = 5;

/// Game loop timing state
#[derive(Debug)]
pub struct GameLoop {
    /// Accumulated time not yet consumed by fixed steps
    accumulator: Duration,

    /// Current frame number
    frame_count: u64,
}

impl GameLoop {
    /// Create a new game loop
    pub fn new() -> Self {
        Self {
            accumulator: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Feed one frame's duration, returns the number of fixed steps to run
    pub fn advance(&mut self, frame_time: Duration) -> u32 {
        self.frame_count += 1;
        self.accumulator += frame_time;

        let mut steps = 0;
        while self.accumulator >= FIXED_TIMESTEP_DURATION && steps < MAX_STEPS_PER_FRAME {
            self.accumulator -= FIXED_TIMESTEP_DURATION;
            steps += 1;
        }

        // Drop the backlog we refused to simulate
        if steps == MAX_STEPS_PER_FRAME && self.accumulator >= FIXED_TIMESTEP_DURATION {
            log::debug!(
                "Simulation falling behind, dropping {:?} of backlog",
                self.accumulator
            );
            self.accumulator = Duration::ZERO;
        }

        steps
    }

    /// Get the fixed timestep (in seconds)
    pub fn fixed_timestep(&self) -> f32 {
        FIXED_TIMESTEP
    }

    /// Duration of a single fixed step
    pub fn fixed_step_duration(&self) -> Duration {
        FIXED_TIMESTEP_DURATION
    }

    /// Get total number of frames seen
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}
