pub mod reresolution;

pub use reresolution::{DriverState, ReResolutionDriver, ReResolutionHandle};
