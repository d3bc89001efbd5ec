pub mod config;
pub mod control; // Block-boundary parameter queue
pub mod dsp;
pub mod error;
pub mod onset; // Band units, hold gate and the detector itself

pub use config::DetectorConfig;
pub use control::{DetectorMessage, MessageReceiver};
pub use error::ConfigError;
pub use onset::{OnsetCore, OnsetDetector, OnsetStrongHold};

/// Largest block the detector processes in one pass. Longer host buffers are
/// split into sub-blocks of this size.
pub const MAX_BLOCK_SIZE: usize = 2048;
/// Capacity of the band bank.
pub const MAX_BANDS: usize = 32;
