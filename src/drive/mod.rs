use crate::config::Vehicle;
use serde::{Deserialize, Serialize};

/// Sentinel returned by the keyboard once the pending keys are drained.
pub const NO_KEY: i32 = -1;

/// Arrow keys the vehicle controller reacts to, with the simulator's key codes.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Left,
    Up,
    Right,
    Down,
}

impl Key {
    pub fn code(self) -> i32 {
        match self {
            Key::Left => 314,
            Key::Up => 315,
            Key::Right => 316,
            Key::Down => 317,
        }
    }

    pub fn from_code(code: i32) -> Option<Key> {
        match code {
            314 => Some(Key::Left),
            315 => Some(Key::Up),
            316 => Some(Key::Right),
            317 => Some(Key::Down),
            _ => None,
        }
    }
}

/// Actuator targets for one tick.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub struct DriveCommand {
    pub speed: f64,
    pub steering: f64,
}

impl DriveCommand {
    pub const NEUTRAL: DriveCommand = DriveCommand {
        speed: 0.0,
        steering: 0.0,
    };

    pub fn for_key(key: Key, vehicle: &Vehicle) -> DriveCommand {
        match key {
            Key::Up => DriveCommand {
                speed: vehicle.forward_speed,
                steering: 0.0,
            },
            Key::Down => DriveCommand {
                speed: -vehicle.forward_speed,
                steering: 0.0,
            },
            Key::Left => DriveCommand {
                speed: vehicle.turn_speed,
                steering: -vehicle.turn_angle,
            },
            Key::Right => DriveCommand {
                speed: vehicle.turn_speed,
                steering: vehicle.turn_angle,
            },
        }
    }
}

/// Folds the key codes received since the last tick into a command.
///
/// The last arrow key wins. Unknown codes are skipped and no arrow key at
/// all means a stopped, straight vehicle.
pub fn command_from_codes<I>(codes: I, vehicle: &Vehicle) -> DriveCommand
where
    I: IntoIterator<Item = i32>,
{
    codes
        .into_iter()
        .filter_map(Key::from_code)
        .last()
        .map(|key| DriveCommand::for_key(key, vehicle))
        .unwrap_or(DriveCommand::NEUTRAL)
}
