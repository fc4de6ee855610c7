//! Toll sign controllers for the driving simulator.
//!
//! `tollbot drive` steers the vehicle from the keyboard and posts a toll
//! payload the first time it passes the sign. `tollbot supervise` watches
//! the vehicle and sign nodes from the outside and logs a payload whenever
//! they come close.

pub mod config;
pub mod controller;
pub mod drive;
pub mod error;
pub mod logging;
pub mod math;
pub mod node;
pub mod report;
pub mod trigger;
pub mod world;
