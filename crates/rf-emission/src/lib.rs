//! RF Emission Library
//!
//! Reusable RF pulse records exchanged between antennas and target players:
//! - `Emission` value record (power, gain, polarization, geometry, references)
//! - Polarization match table
//! - `EmissionPool`: bounded free queue + in-use queue with `Arc` lifetime tracking
//!
//! A record handed out by the pool is an `Arc<Emission>`. Consumers extend its
//! lifetime by cloning the `Arc`; only the pool decides when a record is reused,
//! and only once it holds the sole reference.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod emission;
pub mod polarization;
pub mod pool;

pub use emission::Emission;
pub use polarization::Polarization;
pub use pool::{EmissionPool, MaintainReport, PoolStats};

/// Speed of light (m/s)
pub const LIGHTSPEED: f64 = 299_792_458.0;

#[derive(Error, Debug)]
pub enum EmissionError {
    #[error("Unknown polarization: {0}")]
    UnknownPolarization(String),
    #[error("Frequency must be positive: {0} Hz")]
    InvalidFrequency(f64),
    #[error("Wavelength must be positive: {0} m")]
    InvalidWavelength(f64),
    #[error("Pool {collection} capacity must be at least 1")]
    InvalidCapacity { collection: &'static str },
}

pub type Result<T> = std::result::Result<T, EmissionError>;

/// Simulation player (platform) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

/// Antenna gimbal identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GimbalId(pub u32);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl std::fmt::Display for GimbalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "G{}", self.0)
    }
}
