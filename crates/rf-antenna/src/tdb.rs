//! Target Data Block
//!
//! Per-frame snapshot of the targets visible to one gimbal: ranges, range
//! rates, line-of-sight vectors and boresight offsets. The block keeps the
//! ownship and a set of candidate players; every compute samples the current
//! ownship state and gimbal pointing.

use crate::{BoresightAngles, Gimbal, Platform, Player};
use nalgebra::Vector3;
use rf_emission::{GimbalId, PlayerId};
use std::sync::Arc;

pub struct TargetDataBlock {
    gimbal_id: GimbalId,
    ownship: Arc<dyn Platform>,
    max_targets: usize,
    field_of_view: Option<f64>,
    candidates: Vec<Arc<dyn Player>>,

    targets: Vec<Arc<dyn Player>>,
    ranges: Vec<f64>,
    range_rates: Vec<f64>,
    los: Vec<Vector3<f64>>,
    target_los: Vec<Vector3<f64>>,
    gimbal_los: Vec<Vector3<f64>>,
    azimuth_errors: Vec<f64>,
    elevation_errors: Vec<f64>,
    error_angles: Vec<f64>,
}

impl TargetDataBlock {
    /// Default cap on targets per frame
    pub const MAX_TARGETS: usize = 256;

    pub fn new(gimbal_id: GimbalId, ownship: Arc<dyn Platform>, max_targets: usize) -> Self {
        Self {
            gimbal_id,
            ownship,
            max_targets,
            field_of_view: None,
            candidates: Vec::new(),
            targets: Vec::with_capacity(max_targets),
            ranges: Vec::with_capacity(max_targets),
            range_rates: Vec::with_capacity(max_targets),
            los: Vec::with_capacity(max_targets),
            target_los: Vec::with_capacity(max_targets),
            gimbal_los: Vec::with_capacity(max_targets),
            azimuth_errors: Vec::with_capacity(max_targets),
            elevation_errors: Vec::with_capacity(max_targets),
            error_angles: Vec::with_capacity(max_targets),
        }
    }

    /// Only keep targets within this angle (rad) of boresight
    pub fn with_field_of_view(mut self, max_off_boresight: f64) -> Self {
        self.field_of_view = Some(max_off_boresight);
        self
    }

    /// Add a candidate. The ownship itself is never a target.
    pub fn add_target(&mut self, player: Arc<dyn Player>) -> bool {
        if player.id() == self.ownship.id() {
            return false;
        }
        self.candidates.push(player);
        true
    }

    pub fn with_targets<I>(mut self, players: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Player>>,
    {
        for p in players {
            self.add_target(p);
        }
        self
    }

    /// Compute boresight data for the candidates, in order, up to the cap,
    /// from the ownship's current state and the given gimbal pointing.
    /// Returns the number of targets.
    pub fn compute_boresight_data(&mut self, gimbal: &Gimbal) -> usize {
        self.clear_results();

        let ownship_position = self.ownship.position();
        let ownship_velocity = self.ownship.velocity();
        let world_to_antenna = gimbal.world_to_antenna(&self.ownship.attitude());

        for player in &self.candidates {
            if self.targets.len() >= self.max_targets {
                break;
            }

            let rel_pos = player.position() - ownship_position;
            let range = rel_pos.norm();
            if !(range > f64::EPSILON && range.is_finite()) {
                continue;
            }
            let los = rel_pos / range;
            let gimbal_los = world_to_antenna * los;
            let Some(angles) = BoresightAngles::from_vector(&gimbal_los) else {
                continue;
            };
            if let Some(fov) = self.field_of_view {
                if angles.off_boresight > fov {
                    continue;
                }
            }

            let rel_vel = player.velocity() - ownship_velocity;

            self.targets.push(Arc::clone(player));
            self.ranges.push(range);
            self.range_rates.push(rel_vel.dot(&los));
            self.los.push(los);
            self.target_los.push(-los);
            self.gimbal_los.push(gimbal_los);
            self.azimuth_errors.push(angles.azimuth);
            self.elevation_errors.push(angles.elevation);
            self.error_angles.push(angles.off_boresight);
        }

        self.targets.len()
    }

    fn clear_results(&mut self) {
        self.targets.clear();
        self.ranges.clear();
        self.range_rates.clear();
        self.los.clear();
        self.target_los.clear();
        self.gimbal_los.clear();
        self.azimuth_errors.clear();
        self.elevation_errors.clear();
        self.error_angles.clear();
    }

    pub fn gimbal_id(&self) -> GimbalId {
        self.gimbal_id
    }

    pub fn ownship_id(&self) -> PlayerId {
        self.ownship.id()
    }

    pub fn max_targets(&self) -> usize {
        self.max_targets
    }

    pub fn num_targets(&self) -> usize {
        self.targets.len()
    }

    pub fn targets(&self) -> &[Arc<dyn Player>] {
        &self.targets
    }

    /// Ranges to targets (m)
    pub fn target_ranges(&self) -> &[f64] {
        &self.ranges
    }

    /// Range rates (m/s), positive when opening
    pub fn target_range_rates(&self) -> &[f64] {
        &self.range_rates
    }

    /// Unit LOS ownship to target (world)
    pub fn los_vectors(&self) -> &[Vector3<f64>] {
        &self.los
    }

    /// Unit LOS target to ownship (world)
    pub fn target_los_vectors(&self) -> &[Vector3<f64>] {
        &self.target_los
    }

    /// Unit LOS ownship to target (antenna)
    pub fn gimbal_los_vectors(&self) -> &[Vector3<f64>] {
        &self.gimbal_los
    }

    pub fn boresight_azimuth_errors(&self) -> &[f64] {
        &self.azimuth_errors
    }

    pub fn boresight_elevation_errors(&self) -> &[f64] {
        &self.elevation_errors
    }

    /// Total angle off boresight (rad)
    pub fn boresight_error_angles(&self) -> &[f64] {
        &self.error_angles
    }
}

impl std::fmt::Debug for TargetDataBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetDataBlock")
            .field("gimbal_id", &self.gimbal_id)
            .field("ownship_id", &self.ownship.id())
            .field("candidates", &self.candidates.len())
            .field("targets", &self.targets.len())
            .finish()
    }
}
