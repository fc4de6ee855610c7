use crate::config::{Config, Device};
use crate::error::{ControllerError, Result};
use crate::node::{drop_requested, Node};
use crate::report::{Reporter, SignTriggerPayload, StartFix};
use crate::trigger::{Bound, Cooldown, TriggerEvaluator};
use crate::world::{NodeRef, Supervisor};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use tracing::{debug, error, info};

/// Watches the vehicle and sign nodes and logs a payload whenever they get
/// close, at most once per lock delay.
pub struct SignSupervisor<W> {
    world: W,
    device: Device,
    fix: StartFix,
    time_step_ms: u32,
    car: NodeRef,
    sign: NodeRef,
    trigger: TriggerEvaluator<Cooldown>,
    drop_rx: Receiver<()>,
    triggers: u64,
}

async fn resolve<W: Supervisor>(world: &mut W, def: &str) -> Result<NodeRef> {
    match world.node_from_def(def).await? {
        Some(node) => Ok(node),
        None => {
            error!(def, "Cannot find DEF node in the scene");
            Err(ControllerError::MissingNode(def.to_owned()))
        }
    }
}

impl<W: Supervisor> SignSupervisor<W> {
    /// Resolves both DEF nodes up front; a scene without them is an error.
    pub async fn create(
        config: &Config,
        mut world: W,
        fix: StartFix,
        drop_rx: Receiver<()>,
    ) -> Result<SignSupervisor<W>> {
        let settings = &config.supervisor;
        let lock_delay = settings.lock_delay()?;

        let time_step_ms = match settings.time_step_ms {
            Some(ms) => ms,
            None => world.basic_time_step().await?,
        };

        let car = resolve(&mut world, &settings.car_def).await?;
        let sign = resolve(&mut world, &settings.sign_def).await?;

        Ok(SignSupervisor {
            world,
            device: config.device.clone(),
            fix,
            time_step_ms,
            car,
            sign,
            trigger: TriggerEvaluator::new(
                settings.trigger_distance,
                Bound::Exclusive,
                Cooldown::new(lock_delay),
            ),
            drop_rx,
            triggers: 0,
        })
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn time_step_ms(&self) -> u32 {
        self.time_step_ms
    }

    pub fn triggers(&self) -> u64 {
        self.triggers
    }

    pub async fn tick(&mut self) -> Result<Option<SignTriggerPayload>> {
        let car_pos = self.world.translation(&self.car).await?;
        let sign_pos = self.world.translation(&self.sign).await?;
        let distance = car_pos.planar_distance(&sign_pos);

        let elapsed = Duration::from_millis(u64::from(self.time_step_ms));
        if !self.trigger.evaluate(distance, elapsed) {
            return Ok(None);
        }

        debug!(distance, "Vehicle within trigger distance of the sign");
        self.triggers += 1;

        let payload = SignTriggerPayload::new(&self.device, &self.fix, car_pos, sign_pos);
        Reporter::log(&payload);
        Ok(Some(payload))
    }
}

#[async_trait]
impl<W: Supervisor> Node for SignSupervisor<W> {
    fn name(&self) -> &str {
        "Sign Supervisor"
    }

    async fn init(&mut self) -> Result<()> {
        info!(
            car = self.car.def(),
            sign = self.sign.def(),
            time_step_ms = self.time_step_ms,
            trigger_distance = self.trigger.threshold(),
            "Supervisor tracking nodes"
        );
        Ok(())
    }

    async fn run(&mut self) -> Result<()> {
        loop {
            if drop_requested(&mut self.drop_rx) {
                info!("Supervisor received drop signal");
                break;
            }

            if self.world.step(self.time_step_ms).await? < 0 {
                break;
            }

            self.tick().await?;
        }

        info!(triggers = self.triggers, "Supervisor finished");
        Ok(())
    }
}
