//! Trigger payloads and their delivery.

use crate::config::{Device, Jitter};
use crate::math::Vec3;
use rand::Rng;
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};

pub mod reporter;

pub use reporter::Reporter;

/// Layout of the device timestamp expected by the toll backend.
pub const TIMESTAMP_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Start coordinates and trip length, jittered once per process.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct StartFix {
    pub lat: f64,
    pub lon: f64,
    pub total_distance_km: f64,
}

impl StartFix {
    pub fn jittered<R: Rng + ?Sized>(device: &Device, jitter: &Jitter, rng: &mut R) -> StartFix {
        StartFix {
            lat: device.base_lat + spread(rng, jitter.lat_lon_deg),
            lon: device.base_lon + spread(rng, jitter.lat_lon_deg),
            total_distance_km: device.base_distance_km + spread(rng, jitter.distance_km),
        }
    }
}

fn spread<R: Rng + ?Sized>(rng: &mut R, half_width: f64) -> f64 {
    if half_width <= 0.0 {
        return 0.0;
    }
    rng.sample(Uniform::new_inclusive(-half_width, half_width))
}

/// A record printed to the audit log when a trigger fires.
pub trait Payload: Serialize {
    /// Prefix of the stdout line carrying the record.
    const LABEL: &'static str;

    fn audit_line(&self) -> String {
        // Flat records of strings and floats always serialize.
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("{}: {}", Self::LABEL, json)
    }
}

/// Body of the toll request sent when the vehicle passes the sign.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TollPayload {
    pub device_id: String,
    pub start_lat: f64,
    pub start_lon: f64,
    pub total_distance_km: f64,
    pub timestamp: String,
}

impl TollPayload {
    pub fn new(
        device: &Device,
        fix: &StartFix,
        at: chrono::DateTime<chrono::Local>,
    ) -> TollPayload {
        TollPayload {
            device_id: device.id.clone(),
            start_lat: fix.lat,
            start_lon: fix.lon,
            total_distance_km: fix.total_distance_km,
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

impl Payload for TollPayload {
    const LABEL: &'static str = "SIGN PAYLOAD";
}

/// Record logged by the supervisor with raw node positions.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SignTriggerPayload {
    pub device_id: String,
    pub current_lat: f64,
    pub current_lon: f64,
    pub total_distance_km: f64,
    pub car_pos: Vec3,
    pub sign_pos: Vec3,
}

impl SignTriggerPayload {
    pub fn new(
        device: &Device,
        fix: &StartFix,
        car_pos: Vec3,
        sign_pos: Vec3,
    ) -> SignTriggerPayload {
        SignTriggerPayload {
            device_id: device.id.clone(),
            current_lat: fix.lat,
            current_lon: fix.lon,
            total_distance_km: fix.total_distance_km,
            car_pos,
            sign_pos,
        }
    }
}

impl Payload for SignTriggerPayload {
    const LABEL: &'static str = "SIGN TRIGGER PAYLOAD";
}
