//! The simulator as seen by the controllers.
//!
//! Controllers only talk to these traits. Two backends implement them: an
//! in-process [`kinematic`] world and a [`bridge`] to a simulator that
//! exposes its controller API over HTTP.

use crate::drive::DriveCommand;
use crate::error::Result;
use crate::math::Vec3;
use async_trait::async_trait;

pub mod bridge;
pub mod kinematic;

pub use bridge::BridgeWorld;
pub use kinematic::KinematicWorld;

/// What the kinematic world's [`Robot::step`] returns once it stops. Other
/// simulators may use any negative value; controllers stop on all of them.
pub const STEP_TERMINATED: i32 = -1;

#[async_trait]
pub trait Robot: Send {
    /// Advances the simulation by `time_step_ms`. Negative means shut down.
    async fn step(&mut self, time_step_ms: u32) -> Result<i32>;

    async fn basic_time_step(&mut self) -> Result<u32>;
}

#[async_trait]
pub trait Keyboard: Send {
    /// Next pending key code, [`crate::drive::NO_KEY`] once drained for this tick.
    async fn get_key(&mut self) -> Result<i32>;
}

#[async_trait]
pub trait Driver: Robot {
    /// Target speed in km/h, negative drives backwards.
    async fn set_cruising_speed(&mut self, speed: f64) -> Result<()>;

    /// Front wheel angle in radians, positive turns right.
    async fn set_steering_angle(&mut self, angle: f64) -> Result<()>;

    /// Sets both actuator targets for the coming step.
    async fn apply(&mut self, command: DriveCommand) -> Result<()> {
        self.set_cruising_speed(command.speed).await?;
        self.set_steering_angle(command.steering).await
    }

    async fn self_position(&mut self) -> Result<Vec3>;
}

/// Handle to a DEF node resolved by a [`Supervisor`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct NodeRef {
    def: String,
}

impl NodeRef {
    pub fn new(def: impl Into<String>) -> NodeRef {
        NodeRef { def: def.into() }
    }

    pub fn def(&self) -> &str {
        &self.def
    }
}

#[async_trait]
pub trait Supervisor: Robot {
    /// Looks a node up by DEF name, `None` when the scene has no such node.
    async fn node_from_def(&mut self, def: &str) -> Result<Option<NodeRef>>;

    async fn translation(&mut self, node: &NodeRef) -> Result<Vec3>;
}
