// Deferred callbacks driven by simulation time

/// Identifies a scheduled timer so it can be cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// A single pending timer
#[derive(Debug, Clone)]
struct PendingTimer<T> {
    id: TimerId,
    remaining: f32,
    payload: T,
}

/// Countdown timers carrying a payload that is handed back on expiry.
///
/// Nothing runs on its own: the owner calls `advance(dt)` once per tick and
/// acts on whatever became due. Due payloads come back ordered by how early
/// they expired, ties broken by scheduling order.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    timers: Vec<PendingTimer<T>>,
    next_id: u64,
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 0,
        }
    }

    /// Schedule `payload` to fire after `delay` seconds.
    /// A non-positive delay fires on the next `advance`.
    pub fn schedule(&mut self, delay: f32, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(PendingTimer {
            id,
            remaining: if delay > 0.0 { delay } else { 0.0 },
            payload,
        });
        id
    }

    /// Cancel a timer. Returns the payload if it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let pos = self.timers.iter().position(|t| t.id == id)?;
        Some(self.timers.remove(pos).payload)
    }

    /// Whether a timer is still pending
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    /// Count down all timers and return the payloads that expired
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        let step = if dt > 0.0 { dt } else { 0.0 };
        for timer in &mut self.timers {
            timer.remaining -= step;
        }

        let mut due = Vec::new();
        let mut i = 0;
        while i < self.timers.len() {
            if self.timers[i].remaining <= 0.0 {
                due.push(self.timers.remove(i));
            } else {
                i += 1;
            }
        }

        // Earliest expiry first; stable sort keeps scheduling order on ties
        due.sort_by(|a, b| a.remaining.total_cmp(&b.remaining));
        due.into_iter().map(|t| t.payload).collect()
    }

    /// Number of pending timers
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Drop all pending timers
    pub fn clear(&mut self) {
        self.timers.clear();
    }
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
