use crate::drive::Key;
use crate::error::{ControllerError, Result};
use crate::math::Vec3;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Identity and base fix of the reporting device.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    pub id: String,
    pub base_lat: f64,
    pub base_lon: f64,
    pub base_distance_km: f64,
}

impl Default for Device {
    fn default() -> Self {
        Device {
            id: "ESP32_4A:7F:2C:9D:1B:6E".to_owned(),
            base_lat: 12.9715987,
            base_lon: 77.594566,
            base_distance_km: 28.0,
        }
    }
}

/// Half-widths of the uniform offsets drawn once at startup.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Jitter {
    pub lat_lon_deg: f64,
    pub distance_km: f64,
}

impl Default for Jitter {
    fn default() -> Self {
        Jitter {
            lat_lon_deg: 0.0005,
            distance_km: 0.5,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Vehicle {
    pub time_step_ms: u32,
    pub forward_speed: f64,
    pub turn_speed: f64,
    pub turn_angle: f64,
    /// World X coordinate of the toll sign.
    pub sign_x: f64,
    pub trigger_threshold: f64,
}

impl Default for Vehicle {
    fn default() -> Self {
        Vehicle {
            time_step_ms: 50,
            forward_speed: 70.0,
            turn_speed: 0.0,
            turn_angle: 0.3,
            sign_x: 115.92,
            trigger_threshold: 0.1,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Supervisor {
    /// Falls back to the world's basic time step when unset.
    pub time_step_ms: Option<u32>,
    pub car_def: String,
    pub sign_def: String,
    pub trigger_distance: f64,
    pub lock_delay_s: f64,
}

impl Default for Supervisor {
    fn default() -> Self {
        Supervisor {
            time_step_ms: None,
            car_def: "WEBOTS_VEHICLE0".to_owned(),
            sign_def: "SIGNS".to_owned(),
            trigger_distance: 2.0,
            lock_delay_s: 1.0,
        }
    }
}

impl Supervisor {
    /// Rejects negative, NaN and unrepresentably long delays.
    pub fn lock_delay(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.lock_delay_s).map_err(|err| {
            ControllerError::InvalidSetting {
                key: "supervisor.lock_delay_s",
                reason: err.to_string(),
            }
        })
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Report {
    pub api_url: String,
    pub timeout_s: u64,
}

impl Default for Report {
    fn default() -> Self {
        Report {
            api_url: "https://smart-toll-api.vercel.app/api/esp32-toll/process".to_owned(),
            timeout_s: 5,
        }
    }
}

impl Report {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_s)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process kinematic world
    Kinematic,
    /// Remote simulator reached over HTTP
    Bridge,
}

/// Scene used by the kinematic backend.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub basic_time_step_ms: u32,
    pub vehicle_def: String,
    pub vehicle_start: Vec3,
    /// Heading in radians, 0 drives along +X.
    pub vehicle_heading: f64,
    pub initial_speed_kmh: f64,
    /// Key reported as pressed on every tick.
    pub held_key: Option<Key>,
    pub nodes: BTreeMap<String, Vec3>,
}

impl Default for Scene {
    fn default() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("SIGNS".to_owned(), Vec3::new(115.92, 0.0, 1.5));

        Scene {
            basic_time_step_ms: 50,
            vehicle_def: "WEBOTS_VEHICLE0".to_owned(),
            vehicle_start: Vec3::new(100.36, 0.31, 0.0),
            vehicle_heading: 0.0,
            initial_speed_kmh: 0.0,
            held_key: None,
            nodes,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Simulation {
    pub backend: Backend,
    pub url: String,
    pub port: u32,
    /// Stop after this many ticks; unlimited when unset.
    pub max_steps: Option<u64>,
    pub scene: Scene,
}

impl Default for Simulation {
    fn default() -> Self {
        Simulation {
            backend: Backend::Kinematic,
            url: "http://localhost".to_owned(),
            port: 8080,
            max_steps: None,
            scene: Scene::default(),
        }
    }
}

impl Simulation {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.url.trim_end_matches('/'), self.port)
    }
}

/// Which controller this process runs.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Drive,
    Supervise,
}

#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub device: Device,
    pub jitter: Jitter,
    pub vehicle: Vehicle,
    pub supervisor: Supervisor,
    pub report: Report,
    pub simulation: Simulation,

    #[serde(skip)]
    pub mode: Mode,
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Config> {
        let config: Config = serde_yaml::from_str(text)?;
        config.supervisor.lock_delay()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path).map_err(|source| ControllerError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Config::from_yaml(&text)
    }

    fn apply(&mut self, args: &Args) {
        if let Some(backend) = args.backend {
            self.simulation.backend = backend;
        }

        if let Some(port) = args.simport {
            self.simulation.port = port;
        }

        if let Some(steps) = args.max_steps {
            self.simulation.max_steps = Some(steps);
        }

        if let Some(url) = &args.api_url {
            self.report.api_url = url.clone();
        }

        self.mode = match args.command {
            Commands::Drive => Mode::Drive,
            Commands::Supervise => Mode::Supervise,
        };
    }
}

#[derive(Parser, Debug)]
#[command(name = "tollbot", version, about = "Toll sign controllers for the driving simulator")]
struct Args {
    /// Path to the YAML configuration
    #[arg(long)]
    config: Option<String>,

    /// World backend to drive
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Port of the simulator bridge
    #[arg(long)]
    simport: Option<u32>,

    /// Toll API endpoint receiving the vehicle payload
    #[arg(long)]
    api_url: Option<String>,

    /// Stop after this many ticks
    #[arg(long)]
    max_steps: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive the vehicle from the keyboard and report the toll crossing
    Drive,
    /// Watch vehicle and sign nodes and log proximity triggers
    Supervise,
}

/// Builds the process configuration from the command line and the YAML file.
///
/// A missing `config.yaml` in the working directory falls back to built-in
/// defaults; a path given with `--config` must exist.
pub fn read_from_disk() -> Result<Config> {
    from_args(Args::parse())
}

fn from_args(args: Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(Path::new(path))?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::load(Path::new(DEFAULT_CONFIG_PATH))?
        }
        None => Config::default(),
    };

    config.apply(&args);
    Ok(config)
}
