use super::{Driver, Keyboard, NodeRef, Robot, Supervisor, STEP_TERMINATED};
use crate::config::Scene;
use crate::drive::{Key, NO_KEY};
use crate::error::{ControllerError, Result};
use crate::math::Vec3;
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

const WHEELBASE_M: f64 = 2.8;

#[derive(Debug, Clone)]
struct VehicleBody {
    position: Vec3,
    heading: f64,
    speed_kmh: f64,
    steering: f64,
}

impl VehicleBody {
    /// Kinematic bicycle model in the horizontal XZ plane.
    fn integrate(&mut self, dt: f64) {
        let v = self.speed_kmh / 3.6;
        self.position.x += v * self.heading.cos() * dt;
        self.position.z += v * self.heading.sin() * dt;
        self.heading += v / WHEELBASE_M * self.steering.tan() * dt;
    }
}

/// Self-contained world: one vehicle driven by a bicycle model plus static
/// named nodes. Keys come from a per-tick script or a key held down forever.
#[derive(Debug, Clone)]
pub struct KinematicWorld {
    basic_time_step_ms: u32,
    elapsed: Duration,
    steps: u64,
    max_steps: Option<u64>,
    vehicle_def: String,
    vehicle: VehicleBody,
    nodes: BTreeMap<String, Vec3>,
    held_key: Option<Key>,
    key_script: VecDeque<Vec<i32>>,
    pending_keys: VecDeque<i32>,
}

impl KinematicWorld {
    pub fn from_scene(scene: &Scene, max_steps: Option<u64>) -> KinematicWorld {
        KinematicWorld {
            basic_time_step_ms: scene.basic_time_step_ms,
            elapsed: Duration::ZERO,
            steps: 0,
            max_steps,
            vehicle_def: scene.vehicle_def.clone(),
            vehicle: VehicleBody {
                position: scene.vehicle_start,
                heading: scene.vehicle_heading,
                speed_kmh: scene.initial_speed_kmh,
                steering: 0.0,
            },
            nodes: scene.nodes.clone(),
            held_key: scene.held_key,
            key_script: VecDeque::new(),
            pending_keys: VecDeque::new(),
        }
    }

    /// Queues the key codes delivered after each of the next steps, one
    /// entry per step. Scripted ticks take precedence over the held key.
    pub fn with_key_script(mut self, script: Vec<Vec<i32>>) -> KinematicWorld {
        self.key_script = script.into();
        self
    }

    pub fn vehicle_position(&self) -> Vec3 {
        self.vehicle.position
    }

    pub fn cruising_speed(&self) -> f64 {
        self.vehicle.speed_kmh
    }

    pub fn steering_angle(&self) -> f64 {
        self.vehicle.steering
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn position_of(&self, def: &str) -> Option<Vec3> {
        if def == self.vehicle_def {
            Some(self.vehicle.position)
        } else {
            self.nodes.get(def).copied()
        }
    }
}

#[async_trait]
impl Robot for KinematicWorld {
    async fn step(&mut self, time_step_ms: u32) -> Result<i32> {
        if self.max_steps.map_or(false, |max| self.steps >= max) {
            return Ok(STEP_TERMINATED);
        }

        let dt = Duration::from_millis(u64::from(time_step_ms));
        self.vehicle.integrate(dt.as_secs_f64());
        self.elapsed += dt;
        self.steps += 1;

        self.pending_keys.clear();
        match self.key_script.pop_front() {
            Some(codes) => self.pending_keys.extend(codes),
            None => self.pending_keys.extend(self.held_key.map(Key::code)),
        }

        Ok(0)
    }

    async fn basic_time_step(&mut self) -> Result<u32> {
        Ok(self.basic_time_step_ms)
    }
}

#[async_trait]
impl Keyboard for KinematicWorld {
    async fn get_key(&mut self) -> Result<i32> {
        Ok(self.pending_keys.pop_front().unwrap_or(NO_KEY))
    }
}

#[async_trait]
impl Driver for KinematicWorld {
    async fn set_cruising_speed(&mut self, speed: f64) -> Result<()> {
        self.vehicle.speed_kmh = speed;
        Ok(())
    }

    async fn set_steering_angle(&mut self, angle: f64) -> Result<()> {
        self.vehicle.steering = angle;
        Ok(())
    }

    async fn self_position(&mut self) -> Result<Vec3> {
        Ok(self.vehicle.position)
    }
}

#[async_trait]
impl Supervisor for KinematicWorld {
    async fn node_from_def(&mut self, def: &str) -> Result<Option<NodeRef>> {
        Ok(self.position_of(def).map(|_| NodeRef::new(def)))
    }

    async fn translation(&mut self, node: &NodeRef) -> Result<Vec3> {
        self.position_of(node.def())
            .ok_or_else(|| ControllerError::MissingNode(node.def().to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        Scene {
            vehicle_start: Vec3::new(0.0, 0.0, 0.0),
            ..Scene::default()
        }
    }

    #[tokio::test]
    async fn drives_straight_along_x() {
        let mut world = KinematicWorld::from_scene(&scene(), None);
        world.set_cruising_speed(36.0).await.unwrap();
        for _ in 0..20 {
            world.step(50).await.unwrap();
        }
        let pos = world.self_position().await.unwrap();
        assert!((pos.x - 10.0).abs() < 1e-9);
        assert!(pos.z.abs() < 1e-9);
        assert_eq!(world.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn steering_bends_the_path() {
        let mut world = KinematicWorld::from_scene(&scene(), None);
        world.set_cruising_speed(36.0).await.unwrap();
        world.set_steering_angle(0.3).await.unwrap();
        for _ in 0..40 {
            world.step(50).await.unwrap();
        }
        assert!(world.vehicle_position().z > 0.5);
    }

    #[tokio::test]
    async fn stops_after_max_steps() {
        let mut world = KinematicWorld::from_scene(&scene(), Some(3));
        for _ in 0..3 {
            assert_eq!(world.step(50).await.unwrap(), 0);
        }
        assert_eq!(world.step(50).await.unwrap(), STEP_TERMINATED);
        assert_eq!(world.steps(), 3);
    }

    #[tokio::test]
    async fn scripted_keys_drain_per_tick() {
        let mut world = KinematicWorld::from_scene(&scene(), None)
            .with_key_script(vec![vec![Key::Up.code(), 65], vec![]]);

        world.step(50).await.unwrap();
        assert_eq!(world.get_key().await.unwrap(), Key::Up.code());
        assert_eq!(world.get_key().await.unwrap(), 65);
        assert_eq!(world.get_key().await.unwrap(), NO_KEY);

        world.step(50).await.unwrap();
        assert_eq!(world.get_key().await.unwrap(), NO_KEY);
    }

    #[tokio::test]
    async fn held_key_repeats_every_tick() {
        let scene = Scene {
            held_key: Some(Key::Left),
            ..scene()
        };
        let mut world = KinematicWorld::from_scene(&scene, None);
        for _ in 0..3 {
            world.step(50).await.unwrap();
            assert_eq!(world.get_key().await.unwrap(), Key::Left.code());
            assert_eq!(world.get_key().await.unwrap(), NO_KEY);
        }
    }

    #[tokio::test]
    async fn resolves_vehicle_and_static_nodes() {
        let mut world = KinematicWorld::from_scene(&scene(), None);
        let car = world.node_from_def("WEBOTS_VEHICLE0").await.unwrap().unwrap();
        let sign = world.node_from_def("SIGNS").await.unwrap().unwrap();
        assert!(world.node_from_def("CAR").await.unwrap().is_none());

        assert_eq!(world.translation(&car).await.unwrap(), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(
            world.translation(&sign).await.unwrap(),
            Vec3::new(115.92, 0.0, 1.5)
        );
    }
}
