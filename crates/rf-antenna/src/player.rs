//! External collaborators
//!
//! The entity framework, target players and the owning RF system live
//! outside this crate; the antenna only sees them through these traits.

use crate::Antenna;
use nalgebra::{Rotation3, Vector3};
use rf_emission::{Emission, PlayerId};
use std::sync::Arc;

/// Platform state in the world frame (north-east-down, meters)
pub trait Platform: Send + Sync {
    fn id(&self) -> PlayerId;

    fn position(&self) -> Vector3<f64>;

    fn velocity(&self) -> Vector3<f64>;

    /// Body-to-world rotation
    fn attitude(&self) -> Rotation3<f64>;
}

/// A target entity that can be illuminated
pub trait Player: Platform {
    /// Simulated on this node (as opposed to a networked remote player)
    fn is_local(&self) -> bool {
        true
    }

    /// `RF_EMISSION` event. The player may keep the `Arc` as long as it
    /// needs; the record stays untouched while it is held.
    fn on_rf_emission(&self, emission: Arc<Emission>);
}

/// RF system that owns the antenna and performs detection
pub trait RfSystem: Send + Sync {
    /// Interest policy for inbound emissions. By default emissions sent from
    /// the receiver's own platform are ignored.
    fn is_interested(&self, emission: &Emission, receiver: PlayerId) -> bool {
        emission.ownship != Some(receiver)
    }

    fn rf_received_emission(&self, emission: &Arc<Emission>, antenna: &Antenna, receiving_gain: f64);
}
