// Simulation time source

/// Source of simulation time consumed by cooldowns and timers
pub trait Clock {
    /// Seconds since the simulation started
    fn now(&self) -> f64;

    /// Length of the most recent step in seconds
    fn delta_time(&self) -> f32;
}

/// Clock driven explicitly by the embedding loop.
///
/// Elapsed time accumulates in f64 so a long run of small fixed steps does
/// not lose whole ticks to rounding.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimulationClock {
    elapsed: f64,
    delta: f32,
    steps: u64,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `dt` seconds. Negative or NaN steps count as an
    /// empty step.
    pub fn advance(&mut self, dt: f32) {
        if !(dt >= 0.0) {
            log::warn!("Ignoring invalid clock step {}", dt);
            self.delta = 0.0;
            return;
        }
        self.elapsed += f64::from(dt);
        self.delta = dt;
        self.steps += 1;
    }

    /// Number of steps taken so far
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl Clock for SimulationClock {
    fn now(&self) -> f64 {
        self.elapsed
    }

    fn delta_time(&self) -> f32 {
        self.delta
    }
}
