use super::TriggerGate;
use std::time::Duration;

/// Fires once and stays closed for the rest of the process.
#[derive(Debug, Clone, Default)]
pub struct Latch {
    fired: bool,
}

impl Latch {
    pub fn new() -> Latch {
        Latch { fired: false }
    }
}

impl TriggerGate for Latch {
    fn advance(&mut self, _elapsed: Duration) {}

    fn is_armed(&self) -> bool {
        !self.fired
    }

    fn fire(&mut self) {
        self.fired = true;
    }
}
