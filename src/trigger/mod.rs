//! Proximity triggers.
//!
//! A [`TriggerEvaluator`] compares a scalar proximity measure against a
//! threshold and lets a [`TriggerGate`] decide whether an in-range reading
//! actually fires. Gates see every tick, in range or not, so time-based
//! gates can count down independently of what the vehicle is doing.

use std::time::Duration;

pub mod cooldown;
pub mod latch;

pub use cooldown::Cooldown;
pub use latch::Latch;

pub trait TriggerGate {
    /// Advances the gate by one tick of length `elapsed`.
    fn advance(&mut self, elapsed: Duration);

    fn is_armed(&self) -> bool;

    /// Called once the evaluator has fired through an armed gate.
    fn fire(&mut self);
}

/// How the measure is compared to the threshold.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Bound {
    /// Fires when `measure <= threshold`.
    Inclusive,
    /// Fires when `measure < threshold`.
    Exclusive,
}

impl Bound {
    fn admits(self, measure: f64, threshold: f64) -> bool {
        match self {
            Bound::Inclusive => measure <= threshold,
            Bound::Exclusive => measure < threshold,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriggerEvaluator<G> {
    threshold: f64,
    bound: Bound,
    gate: G,
}

impl<G: TriggerGate> TriggerEvaluator<G> {
    pub fn new(threshold: f64, bound: Bound, gate: G) -> TriggerEvaluator<G> {
        TriggerEvaluator {
            threshold,
            bound,
            gate,
        }
    }

    /// Feeds one tick worth of measurement and reports whether it fired.
    ///
    /// NaN measures never fire.
    pub fn evaluate(&mut self, measure: f64, elapsed: Duration) -> bool {
        self.gate.advance(elapsed);

        if !self.gate.is_armed() || !self.bound.admits(measure, self.threshold) {
            return false;
        }

        self.gate.fire();
        true
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }
}
