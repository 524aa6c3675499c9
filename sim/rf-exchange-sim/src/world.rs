//! Simulated players, radars and the per-frame exchange

use crate::scenario::{PlayerSpec, RadarSpec, Scenario};
use anyhow::{Context, Result};
use nalgebra::{Rotation3, Vector3};
use parking_lot::{Mutex, RwLock};
use rf_antenna::{
    Antenna, Emission, GimbalId, MaintainReport, Platform, Player, PlayerId, PoolStats, RfSystem,
    TargetDataBlock, TransmitReport,
};
use serde::Serialize;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

struct Kinematics {
    position: Vector3<f64>,
    velocity: Vector3<f64>,
    heading: f64,
}

pub struct SimPlayer {
    id: PlayerId,
    name: String,
    local: bool,
    reflective: bool,
    state: RwLock<Kinematics>,
    inbox: Mutex<Vec<Arc<Emission>>>,
}

impl SimPlayer {
    fn from_spec(spec: &PlayerSpec) -> Self {
        Self {
            id: PlayerId(spec.id),
            name: spec.name.clone(),
            local: spec.local,
            reflective: spec.reflective,
            state: RwLock::new(Kinematics {
                position: Vector3::from(spec.position),
                velocity: Vector3::from(spec.velocity),
                heading: spec.heading_deg.to_radians(),
            }),
            inbox: Mutex::new(Vec::new()),
        }
    }

    fn advance(&self, dt: f64) {
        let mut s = self.state.write();
        let v = s.velocity;
        s.position += v * dt;
    }

    fn drain(&self) -> Vec<Arc<Emission>> {
        std::mem::take(&mut *self.inbox.lock())
    }
}

impl Platform for SimPlayer {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn position(&self) -> Vector3<f64> {
        self.state.read().position
    }

    fn velocity(&self) -> Vector3<f64> {
        self.state.read().velocity
    }

    fn attitude(&self) -> Rotation3<f64> {
        Rotation3::from_euler_angles(0.0, 0.0, self.state.read().heading)
    }
}

impl Player for SimPlayer {
    fn is_local(&self) -> bool {
        self.local
    }

    fn on_rf_emission(&self, emission: Arc<Emission>) {
        self.inbox.lock().push(emission);
    }
}

/// Receive side of a radar: counts what its antenna hears
pub struct SimRfSystem {
    player: PlayerId,
    direct: AtomicU64,
    echoes: AtomicU64,
    strongest_dbw: Mutex<Option<f64>>,
}

impl SimRfSystem {
    fn new(player: PlayerId) -> Self {
        Self {
            player,
            direct: AtomicU64::new(0),
            echoes: AtomicU64::new(0),
            strongest_dbw: Mutex::new(None),
        }
    }
}

impl RfSystem for SimRfSystem {
    fn rf_received_emission(&self, em: &Arc<Emission>, antenna: &Antenna, receiving_gain: f64) {
        let r2 = em.range_m * em.range_m;
        if r2 <= 0.0 {
            return;
        }
        // One-way spreading; echoes also take the return leg with a unit cross section
        let echo = em.gimbal == Some(antenna.id());
        let density = if echo {
            self.echoes.fetch_add(1, Ordering::Relaxed);
            em.power_w / (4.0 * PI * r2) / (4.0 * PI * r2)
        } else {
            self.direct.fetch_add(1, Ordering::Relaxed);
            em.power_w / (4.0 * PI * r2)
        };
        let received = density * receiving_gain;
        if received > 0.0 {
            let dbw = rf_antenna::linear_to_db(received);
            let mut strongest = self.strongest_dbw.lock();
            if strongest.map_or(true, |s| dbw > s) {
                *strongest = Some(dbw);
            }
        }
        trace!(
            player = %self.player,
            from = ?em.ownship,
            echo,
            received_w = received,
            "rf received"
        );
    }
}

struct Scan {
    limit: f64,
    rate: f64,
    direction: f64,
}

pub struct Radar {
    player: Arc<SimPlayer>,
    system: Arc<SimRfSystem>,
    antenna: Antenna,
    template: Emission,
    field_of_view: Option<f64>,
    max_targets: usize,
    scan: Mutex<Scan>,
    transmitted: Mutex<TransmitReport>,
}

impl Radar {
    fn build(player: &Arc<SimPlayer>, spec: &RadarSpec, gimbal: GimbalId, recycle: bool) -> Result<Self> {
        let system = Arc::new(SimRfSystem::new(player.id));

        let mut antenna = Antenna::from_config(gimbal, &spec.antenna)?;
        if !recycle {
            antenna.set_recycle(false);
        }
        let platform: Arc<dyn Platform> = player.clone();
        let rf_system: Arc<dyn RfSystem> = system.clone();
        antenna.set_ownship(&platform);
        antenna.set_system(&rf_system);

        let mut template =
            Emission::with_carrier(spec.frequency_hz, spec.power.to_watts(), spec.polarization)?;
        template.pulse_width_s = spec.pulse_width_s;
        template.prf_hz = spec.prf_hz;
        template.bandwidth_hz = spec.bandwidth_hz;
        template.local_players_only = spec.local_players_only;

        Ok(Self {
            player: Arc::clone(player),
            system,
            antenna,
            template,
            field_of_view: spec.field_of_view.map(|a| a.to_radians()),
            max_targets: spec.max_targets,
            scan: Mutex::new(Scan {
                limit: spec.scan_limit.to_radians(),
                rate: spec.scan_rate.to_radians(),
                direction: 1.0,
            }),
            transmitted: Mutex::new(TransmitReport::default()),
        })
    }

    /// Recycle, then illuminate `targets`. Radars transmit concurrently.
    pub fn transmit(&self, targets: &[Arc<dyn Player>]) -> (MaintainReport, TransmitReport) {
        let maintained = self.antenna.maintain();

        let mut tdb = TargetDataBlock::new(
            self.antenna.id(),
            Arc::clone(&self.player) as Arc<dyn Platform>,
            self.max_targets,
        );
        if let Some(fov) = self.field_of_view {
            tdb = tdb.with_field_of_view(fov);
        }
        let mut tdb = tdb.with_targets(targets.iter().cloned());

        let report = self.antenna.rf_transmit(&self.template, &mut tdb);

        let mut total = self.transmitted.lock();
        total.considered += report.considered;
        total.below_threshold += report.below_threshold;
        total.skipped_non_local += report.skipped_non_local;
        total.dispatched += report.dispatched;
        total.tracked += report.tracked;
        total.failed += report.failed;

        (maintained, report)
    }

    /// Bar scan in azimuth between +/- limit
    fn scan(&self, dt: f64) {
        let mut scan = self.scan.lock();
        let gimbal = self.antenna.gimbal();
        let mut azimuth = gimbal.azimuth + scan.direction * scan.rate * dt;
        if azimuth > scan.limit {
            azimuth = scan.limit;
            scan.direction = -1.0;
        } else if azimuth < -scan.limit {
            azimuth = -scan.limit;
            scan.direction = 1.0;
        }
        self.antenna.point(azimuth, gimbal.elevation);
    }
}

/// Per-frame totals
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FrameReport {
    pub dispatched: usize,
    pub below_threshold: usize,
    pub reclaimed: usize,
    pub retained: usize,
    pub direct: usize,
    pub echoes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RadarSummary {
    pub player: u32,
    pub name: String,
    pub gimbal: u32,
    pub transmitted: TransmitReport,
    pub pool: PoolStats,
    pub direct_received: u64,
    pub echoes_received: u64,
    pub strongest_received_dbw: Option<f64>,
}

pub struct World {
    players: Vec<Arc<SimPlayer>>,
    radars: Vec<Arc<Radar>>,
    /// Echo routing by transmitting gimbal
    by_gimbal: HashMap<GimbalId, Arc<Radar>>,
    /// Receivers carried by each player
    by_player: HashMap<PlayerId, Vec<Arc<Radar>>>,
    /// Emissions players keep until the next frame
    held: Mutex<Vec<Arc<Emission>>>,
}

impl World {
    pub fn build(scenario: &Scenario, recycle: bool) -> Result<Self> {
        let mut players = Vec::with_capacity(scenario.players.len());
        let mut radars = Vec::new();
        let mut by_gimbal = HashMap::new();
        let mut by_player: HashMap<PlayerId, Vec<Arc<Radar>>> = HashMap::new();

        for spec in &scenario.players {
            let player = Arc::new(SimPlayer::from_spec(spec));
            if let Some(radar_spec) = &spec.radar {
                let gimbal = GimbalId(spec.id);
                let radar = Arc::new(
                    Radar::build(&player, radar_spec, gimbal, recycle)
                        .with_context(|| format!("building radar for {}", spec.name))?,
                );
                by_gimbal.insert(gimbal, Arc::clone(&radar));
                by_player.entry(player.id).or_default().push(Arc::clone(&radar));
                radars.push(radar);
            }
            players.push(player);
        }

        info!(
            "World built: {} players, {} radars",
            players.len(),
            radars.len()
        );

        Ok(Self {
            players,
            radars,
            by_gimbal,
            by_player,
            held: Mutex::new(Vec::new()),
        })
    }

    pub fn radars(&self) -> &[Arc<Radar>] {
        &self.radars
    }

    pub fn targets(&self) -> Vec<Arc<dyn Player>> {
        self.players
            .iter()
            .map(|p| Arc::clone(p) as Arc<dyn Player>)
            .collect()
    }

    /// Receive phase: deliver every inbox to the player's receivers and route
    /// echoes back to the transmitting antenna.
    ///
    /// With `hold` set, the last emission each player received is kept until
    /// the next frame, so maintenance sees records still in use.
    pub fn deliver(&self, hold: bool, report: &mut FrameReport) {
        let mut held = self.held.lock();
        held.clear();

        for player in &self.players {
            let inbox = player.drain();
            let receivers = self.by_player.get(&player.id);

            for em in &inbox {
                if let Some(receivers) = receivers {
                    for radar in receivers {
                        if radar.antenna.on_rf_emission(em) {
                            report.direct += 1;
                        }
                    }
                }
                if player.reflective {
                    let echo_to = em.gimbal.and_then(|g| self.by_gimbal.get(&g));
                    if let Some(radar) = echo_to {
                        if radar.antenna.on_rf_emission_return(em) {
                            report.echoes += 1;
                        }
                    }
                }
            }

            if hold {
                if let Some(last) = inbox.last() {
                    held.push(Arc::clone(last));
                }
            }
            if !inbox.is_empty() {
                debug!(player = %player.id, callsign = %player.name, emissions = inbox.len(), "inbox drained");
            }
        }
    }

    pub fn advance(&self, dt: f64) {
        for p in &self.players {
            p.advance(dt);
        }
        for r in &self.radars {
            r.scan(dt);
        }
    }

    /// Release anything still held and empty every pool
    pub fn shutdown(&self) {
        self.held.lock().clear();
        for p in &self.players {
            p.drain();
        }
        for r in &self.radars {
            r.antenna.clear_emissions();
        }
    }

    pub fn summary(&self) -> Vec<RadarSummary> {
        self.radars
            .iter()
            .map(|r| RadarSummary {
                player: r.player.id.0,
                name: r.player.name.clone(),
                gimbal: r.antenna.id().0,
                transmitted: *r.transmitted.lock(),
                pool: r.antenna.pool().stats(),
                direct_received: r.system.direct.load(Ordering::Relaxed),
                echoes_received: r.system.echoes.load(Ordering::Relaxed),
                strongest_received_dbw: *r.system.strongest_dbw.lock(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_frames(world: &World, frames: usize, hold: bool) -> FrameReport {
        let targets = world.targets();
        let mut total = FrameReport::default();
        for _ in 0..frames {
            for radar in world.radars() {
                let (m, t) = radar.transmit(&targets);
                total.dispatched += t.dispatched;
                total.below_threshold += t.below_threshold;
                total.reclaimed += m.reclaimed;
                total.retained += m.retained;
            }
            world.deliver(hold, &mut total);
            world.advance(0.05);
        }
        total
    }

    #[test]
    fn test_builtin_exchange() {
        let world = World::build(&Scenario::builtin().unwrap(), true).unwrap();
        let report = run_frames(&world, 20, false);

        assert!(report.dispatched > 0);
        assert!(report.echoes > 0);
        // Fighter and ground radar illuminate each other
        assert!(report.direct > 0);
        assert!(report.reclaimed > 0);

        let summary = world.summary();
        let fighter = summary.iter().find(|s| s.player == 1).unwrap();
        // Remote player is never illuminated by the fighter
        assert!(fighter.transmitted.skipped_non_local > 0);
        assert!(fighter.pool.reused > 0);
        world.shutdown();
    }

    #[test]
    fn test_held_records_retained() {
        let world = World::build(&Scenario::builtin().unwrap(), true).unwrap();
        let report = run_frames(&world, 5, true);
        assert!(report.retained > 0);
    }

    #[test]
    fn test_no_recycle() {
        let world = World::build(&Scenario::builtin().unwrap(), false).unwrap();
        run_frames(&world, 5, false);
        for s in world.summary() {
            assert_eq!(s.pool.allocated, 0);
            assert_eq!(s.transmitted.tracked, 0);
        }
    }
}
