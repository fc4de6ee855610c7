use tokio::sync::broadcast;
use tollbot::config::{self, Backend, Config, Mode};
use tollbot::controller::{SignSupervisor, VehicleController};
use tollbot::error::Result;
use tollbot::logging;
use tollbot::node::execute_node;
use tollbot::report::StartFix;
use tollbot::world::{BridgeWorld, Driver, Keyboard, KinematicWorld, Supervisor};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

fn custom_ctrlc_handler(ctrlc_tx: broadcast::Sender<()>) -> Result<()> {
    let mut ctrlc_sent = false;
    ctrlc::set_handler(move || {
        if !ctrlc_sent {
            eprintln!(
                "CTRL-C received... stopping after this tick, press again to terminate forcefully"
            );
            // No receivers left means the controller already finished.
            let _ = ctrlc_tx.send(());
            ctrlc_sent = true;
        } else {
            eprintln!("CTRL-C received again... terminating forcefully");
            std::process::exit(1);
        }
    })?;
    Ok(())
}

async fn drive<W: Driver + Keyboard>(
    config: &Config,
    world: W,
    fix: StartFix,
    drop_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let mut vehicle = VehicleController::create(config, world, fix, drop_rx)?;
    execute_node(&mut vehicle).await
}

async fn supervise<W: Supervisor>(
    config: &Config,
    world: W,
    fix: StartFix,
    drop_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let mut supervisor = SignSupervisor::create(config, world, fix, drop_rx).await?;
    execute_node(&mut supervisor).await
}

async fn launch(config: Config) -> Result<()> {
    let (ctrlc_tx, drop_rx) = broadcast::channel(1);
    custom_ctrlc_handler(ctrlc_tx)?;

    let fix = StartFix::jittered(&config.device, &config.jitter, &mut rand::thread_rng());
    let simulation = &config.simulation;

    match (config.mode, simulation.backend) {
        (Mode::Drive, Backend::Kinematic) => {
            let world = KinematicWorld::from_scene(&simulation.scene, simulation.max_steps);
            drive(&config, world, fix, drop_rx).await
        }
        (Mode::Drive, Backend::Bridge) => {
            let world = BridgeWorld::new(&simulation.endpoint())?;
            drive(&config, world, fix, drop_rx).await
        }
        (Mode::Supervise, Backend::Kinematic) => {
            let world = KinematicWorld::from_scene(&simulation.scene, simulation.max_steps);
            supervise(&config, world, fix, drop_rx).await
        }
        (Mode::Supervise, Backend::Bridge) => {
            let world = BridgeWorld::new(&simulation.endpoint())?;
            supervise(&config, world, fix, drop_rx).await
        }
    }
}

#[tokio::main]
async fn main() {
    logging::init();

    let result = match config::read_from_disk() {
        Ok(config) => {
            let span = info_span!("tollbot", run_id = %Uuid::new_v4(), mode = ?config.mode);
            info!(parent: &span, backend = ?config.simulation.backend, "Starting controller");
            launch(config).instrument(span).await
        }
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
