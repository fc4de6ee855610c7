pub mod supervisor;
pub mod vehicle;

pub use supervisor::SignSupervisor;
pub use vehicle::VehicleController;
