//! Gimbal Orientation
//!
//! Frames (all right-handed, z down):
//! - world: north, east, down
//! - body: platform nose, right wing, down
//! - antenna: boresight, right, down
//!
//! The mechanical scan controller that drives the gimbal is external; this
//! module only holds the current pointing and the frame transforms.

use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Gimbal pointing relative to the platform body (radians)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Gimbal {
    /// Positive toward the right wing
    pub azimuth: f64,
    /// Positive up
    pub elevation: f64,
    pub roll: f64,
}

impl Gimbal {
    pub fn new(azimuth: f64, elevation: f64) -> Self {
        Self {
            azimuth,
            elevation,
            roll: 0.0,
        }
    }

    /// Antenna-to-body rotation
    pub fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_euler_angles(self.roll, self.elevation, self.azimuth)
    }

    /// World-to-antenna rotation for a platform with the given body-to-world
    /// attitude.
    pub fn world_to_antenna(&self, attitude: &Rotation3<f64>) -> Rotation3<f64> {
        (attitude * self.rotation()).inverse()
    }
}

/// Angular offsets of a direction from boresight
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoresightAngles {
    pub azimuth: f64,
    pub elevation: f64,
    /// Total angle off boresight
    pub off_boresight: f64,
}

impl BoresightAngles {
    /// Offsets of `v` (antenna coordinates). `None` for a zero or non-finite vector.
    pub fn from_vector(v: &Vector3<f64>) -> Option<Self> {
        let norm = v.norm();
        if !(norm > f64::EPSILON && norm.is_finite()) {
            return None;
        }
        let u = v / norm;
        Some(Self {
            azimuth: v.y.atan2(v.x),
            elevation: (-v.z).atan2((v.x * v.x + v.y * v.y).sqrt()),
            off_boresight: u.x.clamp(-1.0, 1.0).acos(),
        })
    }

    pub fn to_degrees(self) -> Self {
        Self {
            azimuth: self.azimuth.to_degrees(),
            elevation: self.elevation.to_degrees(),
            off_boresight: self.off_boresight.to_degrees(),
        }
    }
}
