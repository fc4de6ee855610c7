use super::TriggerGate;
use std::time::Duration;

/// Re-arms once `delay` of simulated time has passed since the last firing.
///
/// The countdown runs on [`Duration`] so that tick lengths add up exactly;
/// twenty 50 ms ticks are one second, not one second minus rounding.
#[derive(Debug, Clone)]
pub struct Cooldown {
    delay: Duration,
    remaining: Option<Duration>,
}

impl Cooldown {
    pub fn new(delay: Duration) -> Cooldown {
        Cooldown {
            delay,
            remaining: None,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining.unwrap_or_default()
    }
}

impl TriggerGate for Cooldown {
    fn advance(&mut self, elapsed: Duration) {
        if let Some(remaining) = self.remaining {
            let left = remaining.saturating_sub(elapsed);
            self.remaining = if left.is_zero() { None } else { Some(left) };
        }
    }

    fn is_armed(&self) -> bool {
        self.remaining.is_none()
    }

    fn fire(&mut self) {
        self.remaining = Some(self.delay);
    }
}
