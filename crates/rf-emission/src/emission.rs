//! Emission Record
//!
//! One modeled RF pulse instance. Records are reused by the pool, so
//! `clear()` must return every field to its default.

use crate::{EmissionError, GimbalId, PlayerId, Polarization, Result, LIGHTSPEED};
use nalgebra::Vector3;

/// RF pulse sent from a transmitting antenna toward one target
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    frequency_hz: f64,
    wavelength_m: f64,
    /// Pulse width (s)
    pub pulse_width_s: f64,
    /// Bandwidth (Hz)
    pub bandwidth_hz: f64,
    /// Pulse repetition frequency (Hz)
    pub prf_hz: f64,
    /// Transmit power (W); effective radiated power once dispatched
    pub power_w: f64,
    /// Effective antenna gain toward the target (linear)
    pub gain: f64,
    pub polarization: Polarization,
    /// Range to target (m)
    pub range_m: f64,
    /// Range rate (m/s), positive when opening
    pub range_rate_mps: f64,
    /// Unit LOS, transmitter to target (world)
    pub los_to_target: Vector3<f64>,
    /// Unit LOS, target to transmitter (world)
    pub los_from_target: Vector3<f64>,
    /// Gimbal azimuth at transmit (rad)
    pub gimbal_azimuth: f64,
    /// Gimbal elevation at transmit (rad)
    pub gimbal_elevation: f64,
    /// Azimuth of the transmitter in the target's body frame (rad)
    pub azimuth_aoi: f64,
    /// Elevation of the transmitter in the target's body frame (rad)
    pub elevation_aoi: f64,
    /// Originating gimbal
    pub gimbal: Option<GimbalId>,
    /// Transmitting platform
    pub ownship: Option<PlayerId>,
    /// Target platform
    pub target: Option<PlayerId>,
    pub local_players_only: bool,
    /// Jamming signal
    pub ecm: bool,
}

impl Default for Emission {
    fn default() -> Self {
        Self {
            frequency_hz: 0.0,
            wavelength_m: 0.0,
            pulse_width_s: 0.0,
            bandwidth_hz: 0.0,
            prf_hz: 0.0,
            power_w: 0.0,
            gain: 0.0,
            polarization: Polarization::None,
            range_m: 0.0,
            range_rate_mps: 0.0,
            los_to_target: Vector3::zeros(),
            los_from_target: Vector3::zeros(),
            gimbal_azimuth: 0.0,
            gimbal_elevation: 0.0,
            azimuth_aoi: 0.0,
            elevation_aoi: 0.0,
            gimbal: None,
            ownship: None,
            target: None,
            local_players_only: false,
            ecm: false,
        }
    }
}

impl Emission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Template for a transmitter: frequency, power and polarization preset
    pub fn with_carrier(frequency_hz: f64, power_w: f64, polarization: Polarization) -> Result<Self> {
        let mut em = Self::default();
        em.set_frequency(frequency_hz)?;
        em.power_w = power_w;
        em.polarization = polarization;
        Ok(em)
    }

    pub fn frequency(&self) -> f64 {
        self.frequency_hz
    }

    pub fn wavelength(&self) -> f64 {
        self.wavelength_m
    }

    /// Sets the carrier frequency and the matching wavelength.
    /// Rejected values leave the record unchanged.
    pub fn set_frequency(&mut self, frequency_hz: f64) -> Result<()> {
        if !(frequency_hz > 0.0 && frequency_hz.is_finite()) {
            return Err(EmissionError::InvalidFrequency(frequency_hz));
        }
        self.frequency_hz = frequency_hz;
        self.wavelength_m = LIGHTSPEED / frequency_hz;
        Ok(())
    }

    /// Sets the wavelength and the matching carrier frequency.
    pub fn set_wavelength(&mut self, wavelength_m: f64) -> Result<()> {
        if !(wavelength_m > 0.0 && wavelength_m.is_finite()) {
            return Err(EmissionError::InvalidWavelength(wavelength_m));
        }
        self.wavelength_m = wavelength_m;
        self.frequency_hz = LIGHTSPEED / wavelength_m;
        Ok(())
    }

    /// Reset every field for reuse
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_cleared(&self) -> bool {
        *self == Self::default()
    }
}
