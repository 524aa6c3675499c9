//! Antenna
//!
//! Owns the emission pool, gain pattern and polarization, and implements:
//! - `rf_transmit`: template emission -> one pooled emission per qualifying target
//! - `on_rf_emission`: direct illumination from another platform
//! - `on_rf_emission_return`: echo of one of this antenna's own emissions
//!
//! The owning platform and RF system are held weakly; they own the antenna.

use crate::{
    db_to_linear, AntennaConfig, AntennaError, BoresightAngles, GainPattern, Gimbal, Platform,
    Result, RfSystem, TargetDataBlock,
};
use parking_lot::RwLock;
use rf_emission::{Emission, EmissionPool, GimbalId, MaintainReport, Polarization};
use serde::Serialize;
use std::f64::consts::PI;
use std::sync::{Arc, Weak};
use tracing::{debug, error};

/// Outcome of one transmit call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransmitReport {
    pub considered: usize,
    pub below_threshold: usize,
    pub skipped_non_local: usize,
    pub dispatched: usize,
    /// Dispatched emissions queued for recycling
    pub tracked: usize,
    pub failed: usize,
}

pub struct Antenna {
    id: GimbalId,
    gimbal: RwLock<Gimbal>,
    ownship: Option<Weak<dyn Platform>>,
    system: Option<Weak<dyn RfSystem>>,
    polarization: Polarization,
    /// Watts
    threshold: f64,
    gain: f64,
    gain_pattern: Option<GainPattern>,
    pattern_in_degrees: bool,
    recycle: bool,
    /// Radians
    beam_width: f64,
    pool: EmissionPool,
}

impl Antenna {
    pub fn new(id: GimbalId) -> Self {
        let defaults = AntennaConfig::default();
        Self {
            id,
            gimbal: RwLock::new(Gimbal::default()),
            ownship: None,
            system: None,
            polarization: defaults.polarization,
            threshold: defaults.threshold.to_watts(),
            gain: defaults.gain,
            gain_pattern: None,
            pattern_in_degrees: defaults.gain_pattern_deg,
            recycle: defaults.recycle,
            beam_width: defaults.beam_width.to_radians(),
            pool: EmissionPool::default(),
        }
    }

    pub fn from_config(id: GimbalId, config: &AntennaConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            id,
            gimbal: RwLock::new(Gimbal::default()),
            ownship: None,
            system: None,
            polarization: config.polarization,
            threshold: config.threshold.to_watts(),
            gain: config.gain,
            gain_pattern: config.gain_pattern.clone(),
            pattern_in_degrees: config.gain_pattern_deg,
            recycle: config.recycle,
            beam_width: config.beam_width.to_radians(),
            pool: EmissionPool::new(config.free_capacity, config.in_use_capacity)?,
        })
    }

    // ------------------------------------------------------------------
    // Wiring
    // ------------------------------------------------------------------

    pub fn set_ownship(&mut self, ownship: &Arc<dyn Platform>) {
        self.ownship = Some(Arc::downgrade(ownship));
    }

    pub fn set_system(&mut self, system: &Arc<dyn RfSystem>) {
        self.system = Some(Arc::downgrade(system));
    }

    pub fn ownship(&self) -> Option<Arc<dyn Platform>> {
        self.ownship.as_ref().and_then(Weak::upgrade)
    }

    pub fn system(&self) -> Option<Arc<dyn RfSystem>> {
        self.system.as_ref().and_then(Weak::upgrade)
    }

    // ------------------------------------------------------------------
    // Parameters
    // ------------------------------------------------------------------

    pub fn id(&self) -> GimbalId {
        self.id
    }

    pub fn gimbal(&self) -> Gimbal {
        *self.gimbal.read()
    }

    /// Point the gimbal (radians, relative to the platform body)
    pub fn point(&self, azimuth: f64, elevation: f64) {
        let mut g = self.gimbal.write();
        g.azimuth = azimuth;
        g.elevation = elevation;
    }

    pub fn polarization(&self) -> Polarization {
        self.polarization
    }

    pub fn set_polarization(&mut self, polarization: Polarization) {
        self.polarization = polarization;
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Rejects negative or non-finite values, keeping the previous gain.
    pub fn set_gain(&mut self, gain: f64) -> Result<()> {
        if !(gain >= 0.0 && gain.is_finite()) {
            return Err(AntennaError::InvalidGain(gain));
        }
        self.gain = gain;
        Ok(())
    }

    /// Transmit power threshold (W)
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_threshold(&mut self, watts: f64) -> Result<()> {
        if !(watts >= 0.0 && watts.is_finite()) {
            return Err(AntennaError::InvalidThreshold(watts));
        }
        self.threshold = watts;
        Ok(())
    }

    pub fn beam_width(&self) -> f64 {
        self.beam_width
    }

    pub fn set_beam_width(&mut self, radians: f64) -> Result<()> {
        if !(radians > 0.0 && radians.is_finite()) {
            return Err(AntennaError::InvalidBeamWidth(radians));
        }
        self.beam_width = radians;
        Ok(())
    }

    pub fn gain_pattern(&self) -> Option<&GainPattern> {
        self.gain_pattern.as_ref()
    }

    pub fn set_gain_pattern(&mut self, pattern: Option<GainPattern>) {
        self.gain_pattern = pattern;
    }

    pub fn is_pattern_in_degrees(&self) -> bool {
        self.pattern_in_degrees
    }

    pub fn set_pattern_in_degrees(&mut self, degrees: bool) {
        self.pattern_in_degrees = degrees;
    }

    pub fn is_recycling(&self) -> bool {
        self.recycle
    }

    pub fn set_recycle(&mut self, recycle: bool) {
        self.recycle = recycle;
    }

    // ------------------------------------------------------------------
    // Pool
    // ------------------------------------------------------------------

    pub fn pool(&self) -> &EmissionPool {
        &self.pool
    }

    /// Once per frame, before transmitting
    pub fn maintain(&self) -> MaintainReport {
        self.pool.maintain()
    }

    pub fn clear_emissions(&self) {
        self.pool.clear_all();
    }

    // ------------------------------------------------------------------
    // Gain
    // ------------------------------------------------------------------

    /// Pattern gain (linear) for the given boresight offsets (radians);
    /// unity without a pattern.
    pub fn pattern_gain(&self, angles: &BoresightAngles) -> f64 {
        match &self.gain_pattern {
            Some(pattern) => {
                let angles = if self.pattern_in_degrees {
                    angles.to_degrees()
                } else {
                    *angles
                };
                db_to_linear(pattern.gain_db(&angles))
            }
            None => 1.0,
        }
    }

    /// Match factor between this antenna and a received polarization
    pub fn polarization_gain(&self, received: Polarization) -> f64 {
        self.polarization.gain(received)
    }

    /// Effective aperture area (m^2): `G * lambda^2 / 4pi`
    pub fn effective_area(gain: f64, wavelength: f64) -> f64 {
        gain * wavelength * wavelength / (4.0 * PI)
    }

    // ------------------------------------------------------------------
    // Transmit
    // ------------------------------------------------------------------

    /// Send one emission per qualifying target.
    ///
    /// `template` carries the carrier (frequency, power, polarization, pulse
    /// parameters). Target geometry is recomputed from the current ownship
    /// state and gimbal pointing on every call. Without an ownship, with a
    /// target data block built for another gimbal or platform, or with an
    /// unusable template, nothing is sent.
    pub fn rf_transmit(&self, template: &Emission, tdb: &mut TargetDataBlock) -> TransmitReport {
        let mut report = TransmitReport::default();

        let Some(ownship) = self.ownship() else {
            return report;
        };
        if tdb.gimbal_id() != self.id || tdb.ownship_id() != ownship.id() {
            return report;
        }
        if !(template.wavelength() > 0.0 && template.power_w >= 0.0 && template.power_w.is_finite()) {
            return report;
        }

        // One pointing for both the geometry and the recorded gimbal angles
        let gimbal = self.gimbal();
        tdb.compute_boresight_data(&gimbal);
        let polarization = match self.polarization {
            Polarization::None => template.polarization,
            p => p,
        };

        for i in 0..tdb.num_targets() {
            report.considered += 1;
            let target = &tdb.targets()[i];

            if template.local_players_only && !target.is_local() {
                report.skipped_non_local += 1;
                continue;
            }

            let angles = BoresightAngles {
                azimuth: tdb.boresight_azimuth_errors()[i],
                elevation: tdb.boresight_elevation_errors()[i],
                off_boresight: tdb.boresight_error_angles()[i],
            };
            let gain = self.pattern_gain(&angles) * self.gain;
            let erp = gain * template.power_w;
            if !(erp > self.threshold) {
                report.below_threshold += 1;
                continue;
            }

            let mut em = if self.recycle {
                self.pool.acquire()
            } else {
                Arc::new(Emission::default())
            };
            let Some(record) = Arc::get_mut(&mut em) else {
                error!(gimbal = %self.id, player = %target.id(), "acquired emission is shared, target skipped");
                report.failed += 1;
                continue;
            };

            record.clone_from(template);
            record.power_w = erp;
            record.gain = gain;
            record.polarization = polarization;
            record.range_m = tdb.target_ranges()[i];
            record.range_rate_mps = tdb.target_range_rates()[i];
            record.los_to_target = tdb.los_vectors()[i];
            record.los_from_target = tdb.target_los_vectors()[i];
            record.gimbal_azimuth = gimbal.azimuth;
            record.gimbal_elevation = gimbal.elevation;
            if let Some(aoi) =
                BoresightAngles::from_vector(&(target.attitude().inverse() * record.los_from_target))
            {
                record.azimuth_aoi = aoi.azimuth;
                record.elevation_aoi = aoi.elevation;
            }
            record.gimbal = Some(self.id);
            record.ownship = Some(ownship.id());
            record.target = Some(target.id());
            record.local_players_only = template.local_players_only;

            target.on_rf_emission(Arc::clone(&em));
            report.dispatched += 1;

            if self.recycle && self.pool.track(em) {
                report.tracked += 1;
            }
        }

        debug!(
            gimbal = %self.id,
            considered = report.considered,
            dispatched = report.dispatched,
            below_threshold = report.below_threshold,
            "rf transmit"
        );

        report
    }

    // ------------------------------------------------------------------
    // Receive
    // ------------------------------------------------------------------

    /// Direct illumination from another platform. Returns `true` when a
    /// receiving gain was forwarded to the RF system.
    pub fn on_rf_emission(&self, em: &Arc<Emission>) -> bool {
        let (Some(system), Some(ownship)) = (self.system(), self.ownship()) else {
            return false;
        };
        if !system.is_interested(em, ownship.id()) {
            return false;
        }

        let to_antenna = self.gimbal().world_to_antenna(&ownship.attitude());
        let los = to_antenna * em.los_from_target;
        let Some(angles) = BoresightAngles::from_vector(&los) else {
            debug!(gimbal = %self.id, "emission without line of sight ignored");
            return false;
        };

        let gain = self.pattern_gain(&angles) * self.gain;
        let area = Self::effective_area(gain, em.wavelength());
        let receiving_gain = area * self.polarization_gain(em.polarization);

        system.rf_received_emission(em, self, receiving_gain);
        true
    }

    /// Echo of an emission this antenna transmitted; polarization is matched
    /// by construction.
    pub fn on_rf_emission_return(&self, em: &Arc<Emission>) -> bool {
        let Some(system) = self.system() else {
            return false;
        };
        if em.gimbal != Some(self.id) {
            return false;
        }

        let receiving_gain = Self::effective_area(em.gain, em.wavelength());
        system.rf_received_emission(em, self, receiving_gain);
        true
    }
}

impl Drop for Antenna {
    fn drop(&mut self) {
        self.pool.clear_all();
    }
}

impl std::fmt::Debug for Antenna {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Antenna")
            .field("id", &self.id)
            .field("gimbal", &self.gimbal())
            .field("polarization", &self.polarization)
            .field("threshold", &self.threshold)
            .field("gain", &self.gain)
            .field("recycle", &self.recycle)
            .field("pool", &self.pool)
            .finish()
    }
}
