use crate::config::{Config, Device, Vehicle};
use crate::drive::{command_from_codes, DriveCommand, NO_KEY};
use crate::error::Result;
use crate::math::{axis_distance, Vec3};
use crate::node::{drop_requested, Node};
use crate::report::reporter::Delivery;
use crate::report::{Reporter, StartFix, TollPayload};
use crate::trigger::{Bound, Latch, TriggerEvaluator, TriggerGate};
use crate::world::{Driver, Keyboard};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Keyboard-driven vehicle that reports the toll crossing once.
pub struct VehicleController<W> {
    world: W,
    vehicle: Vehicle,
    device: Device,
    fix: StartFix,
    trigger: TriggerEvaluator<Latch>,
    reporter: Reporter,
    drop_rx: Receiver<()>,
    command: DriveCommand,
    last_position: Option<Vec3>,
    odometer_m: f64,
    ticks: u64,
    in_flight: Option<JoinHandle<Delivery>>,
}

impl<W: Driver + Keyboard> VehicleController<W> {
    pub fn create(
        config: &Config,
        world: W,
        fix: StartFix,
        drop_rx: Receiver<()>,
    ) -> Result<VehicleController<W>> {
        Ok(VehicleController {
            world,
            vehicle: config.vehicle.clone(),
            device: config.device.clone(),
            fix,
            trigger: TriggerEvaluator::new(
                config.vehicle.trigger_threshold,
                Bound::Inclusive,
                Latch::new(),
            ),
            reporter: Reporter::new(&config.report)?,
            drop_rx,
            command: DriveCommand::NEUTRAL,
            last_position: None,
            odometer_m: 0.0,
            ticks: 0,
            in_flight: None,
        })
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn command(&self) -> DriveCommand {
        self.command
    }

    /// Distance actually driven in the simulation, in metres.
    pub fn odometer_m(&self) -> f64 {
        self.odometer_m
    }

    pub fn has_reported(&self) -> bool {
        !self.trigger.gate().is_armed()
    }

    /// Hands out the background toll request, if one was started.
    pub fn take_dispatch(&mut self) -> Option<JoinHandle<Delivery>> {
        self.in_flight.take()
    }

    /// Everything the loop does after a successful step.
    pub async fn tick(&mut self) -> Result<Option<TollPayload>> {
        self.ticks += 1;

        let mut codes = Vec::new();
        loop {
            let code = self.world.get_key().await?;
            if code == NO_KEY {
                break;
            }
            codes.push(code);
        }

        self.command = command_from_codes(codes, &self.vehicle);
        self.world.apply(self.command).await?;

        let position = self.world.self_position().await?;
        if let Some(last) = self.last_position {
            self.odometer_m += last.planar_distance(&position);
        }
        self.last_position = Some(position);

        let offset = axis_distance(position.x, self.vehicle.sign_x);
        let elapsed = Duration::from_millis(u64::from(self.vehicle.time_step_ms));
        if !self.trigger.evaluate(offset, elapsed) {
            return Ok(None);
        }

        debug!(x = position.x, offset, "Vehicle reached the toll sign");

        let payload = TollPayload::new(&self.device, &self.fix, chrono::Local::now());
        Reporter::log(&payload);
        self.in_flight = Some(self.reporter.dispatch(payload.clone()));

        Ok(Some(payload))
    }
}

#[async_trait]
impl<W: Driver + Keyboard> Node for VehicleController<W> {
    fn name(&self) -> &str {
        "Vehicle Controller"
    }

    async fn init(&mut self) -> Result<()> {
        info!("Manual Car Control (Low Speed)");
        info!("Up: forward | Down: backward | Left: turn left | Right: turn right");
        info!(
            device = %self.device.id,
            start_lat = self.fix.lat,
            start_lon = self.fix.lon,
            total_distance_km = self.fix.total_distance_km,
            sign_x = self.vehicle.sign_x,
            api_url = self.reporter.url(),
            "Vehicle ready"
        );
        Ok(())
    }

    async fn run(&mut self) -> Result<()> {
        loop {
            if drop_requested(&mut self.drop_rx) {
                info!("Vehicle controller received drop signal");
                break;
            }

            if self.world.step(self.vehicle.time_step_ms).await? < 0 {
                break;
            }

            self.tick().await?;
        }

        info!(
            ticks = self.ticks,
            odometer_m = self.odometer_m,
            reported = self.has_reported(),
            "Vehicle controller finished"
        );
        Ok(())
    }
}
