//! RF Antenna Library
//!
//! Steerable antenna attached to a sensing platform:
//! - Transmit: per-target gain / ERP, threshold filter, pooled emission dispatch
//! - Receive: boresight transform, gain pattern lookup, polarization match,
//!   effective aperture area forwarded to the owning RF system
//! - Echo: returns of the antenna's own emissions
//!
//! The platform, target players and RF system are external collaborators,
//! reached through the traits in [`player`].

use thiserror::Error;

pub mod antenna;
pub mod config;
pub mod gimbal;
pub mod pattern;
pub mod player;
pub mod tdb;

pub use antenna::{Antenna, TransmitReport};
pub use config::{AngleSpec, AntennaConfig, PowerSpec, PowerUnit};
pub use gimbal::{BoresightAngles, Gimbal};
pub use pattern::{GainPattern, Table1, Table2};
pub use player::{Platform, Player, RfSystem};
pub use tdb::TargetDataBlock;

pub use rf_emission::{
    Emission, EmissionPool, GimbalId, MaintainReport, PlayerId, Polarization, PoolStats,
};

#[derive(Error, Debug)]
pub enum AntennaError {
    #[error("Gain must be a non-negative number: {0}")]
    InvalidGain(f64),
    #[error("Threshold must be a non-negative power: {0} W")]
    InvalidThreshold(f64),
    #[error("Beam width must be a positive angle: {0} rad")]
    InvalidBeamWidth(f64),
    #[error("Invalid gain table: {0}")]
    InvalidTable(String),
    #[error("Emission error: {0}")]
    Emission(#[from] rf_emission::EmissionError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AntennaError>;

/// dB to linear power ratio
pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

/// Linear power ratio to dB
pub fn linear_to_db(ratio: f64) -> f64 {
    10.0 * ratio.log10()
}
