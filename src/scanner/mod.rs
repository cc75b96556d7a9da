//! Camera scan session: acquisition with fallback, engine selection, the
//! throttled decode loop and the hand-off to navigation.

pub mod commands;
pub mod controller;
pub mod crop;
mod error;
pub mod loop_worker;
pub mod state;

pub use commands::ScanIntent;
pub use controller::ScanController;
pub use crop::{map_crop_region, CropRegion};
pub use error::ScanError;
pub use state::ScanState;
