pub mod vec3;

pub use vec3::Vec3;

/// Absolute offset of `value` from `target` along a single axis.
pub fn axis_distance(value: f64, target: f64) -> f64 {
    (value - target).abs()
}
