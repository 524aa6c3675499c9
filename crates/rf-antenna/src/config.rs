//! Antenna configuration
//!
//! JSON shape (every field optional):
//!
//! ```json
//! {
//!   "polarization": "vertical",
//!   "threshold": { "value": 3.0, "unit": "kW" },
//!   "gain": 2.0,
//!   "gain_pattern": { "one_d": { "x": [0.0, 5.0], "data": [30.0, 0.0] } },
//!   "gain_pattern_deg": true,
//!   "recycle": true,
//!   "beam_width": { "degrees": 3.5 },
//!   "free_capacity": 10000,
//!   "in_use_capacity": 10000
//! }
//! ```

use crate::{AntennaError, GainPattern, Result};
use rf_emission::{EmissionPool, Polarization};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Power unit accepted for the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUnit {
    #[serde(rename = "W")]
    Watts,
    #[serde(rename = "mW")]
    MilliWatts,
    #[serde(rename = "kW")]
    KiloWatts,
    #[serde(rename = "MW")]
    MegaWatts,
    #[serde(rename = "dBW")]
    DecibelWatts,
    #[serde(rename = "dBm")]
    DecibelMilliWatts,
}

/// Power as a bare number of watts, or a value with a unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PowerSpec {
    Watts(f64),
    WithUnit { value: f64, unit: PowerUnit },
}

impl PowerSpec {
    pub fn to_watts(&self) -> f64 {
        match *self {
            PowerSpec::Watts(w) => w,
            PowerSpec::WithUnit { value, unit } => match unit {
                PowerUnit::Watts => value,
                PowerUnit::MilliWatts => value * 1e-3,
                PowerUnit::KiloWatts => value * 1e3,
                PowerUnit::MegaWatts => value * 1e6,
                PowerUnit::DecibelWatts => crate::db_to_linear(value),
                PowerUnit::DecibelMilliWatts => crate::db_to_linear(value) * 1e-3,
            },
        }
    }
}

impl Default for PowerSpec {
    fn default() -> Self {
        PowerSpec::Watts(0.0)
    }
}

/// Angle as a bare number of radians, or tagged with its unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AngleSpec {
    Radians(f64),
    Degrees { degrees: f64 },
    TaggedRadians { radians: f64 },
}

impl AngleSpec {
    pub fn to_radians(&self) -> f64 {
        match *self {
            AngleSpec::Radians(r) | AngleSpec::TaggedRadians { radians: r } => r,
            AngleSpec::Degrees { degrees } => degrees.to_radians(),
        }
    }
}

impl Default for AngleSpec {
    fn default() -> Self {
        AngleSpec::Degrees {
            degrees: AntennaConfig::DEFAULT_BEAM_WIDTH_DEG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntennaConfig {
    pub polarization: Polarization,
    /// Minimum effective radiated power for a target to be illuminated
    pub threshold: PowerSpec,
    /// Scalar gain (linear, non-negative)
    pub gain: f64,
    pub gain_pattern: Option<GainPattern>,
    /// Pattern tables are indexed in degrees (radians otherwise)
    pub gain_pattern_deg: bool,
    /// Recycle emissions through the pool
    pub recycle: bool,
    pub beam_width: AngleSpec,
    pub free_capacity: usize,
    pub in_use_capacity: usize,
}

impl AntennaConfig {
    pub const DEFAULT_BEAM_WIDTH_DEG: f64 = 3.5;

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading antenna config from {:?}", path);

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: AntennaConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.gain >= 0.0 && self.gain.is_finite()) {
            return Err(AntennaError::InvalidGain(self.gain));
        }
        let threshold = self.threshold.to_watts();
        if !(threshold >= 0.0 && threshold.is_finite()) {
            return Err(AntennaError::InvalidThreshold(threshold));
        }
        let beam_width = self.beam_width.to_radians();
        if !(beam_width > 0.0 && beam_width.is_finite()) {
            return Err(AntennaError::InvalidBeamWidth(beam_width));
        }
        if self.free_capacity == 0 {
            return Err(rf_emission::EmissionError::InvalidCapacity { collection: "free" }.into());
        }
        if self.in_use_capacity == 0 {
            return Err(rf_emission::EmissionError::InvalidCapacity { collection: "in-use" }.into());
        }
        Ok(())
    }
}

impl Default for AntennaConfig {
    fn default() -> Self {
        Self {
            polarization: Polarization::None,
            threshold: PowerSpec::default(),
            gain: 1.0,
            gain_pattern: None,
            gain_pattern_deg: true,
            recycle: true,
            beam_width: AngleSpec::default(),
            free_capacity: EmissionPool::DEFAULT_CAPACITY,
            in_use_capacity: EmissionPool::DEFAULT_CAPACITY,
        }
    }
}
