/// Fixed-step simulated clock. Time only moves when `advance` is called.
#[derive(Debug, Clone)]
pub struct SimClock {
    tick_ms: u64,
    now_ms: u64,
}

impl SimClock {
    pub fn new(tick_ms: u64) -> Self {
        Self { tick_ms, now_ms: 0 }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Advance by one tick and return the new time.
    pub fn advance(&mut self) -> u64 {
        self.now_ms += self.tick_ms;
        self.now_ms
    }
}
