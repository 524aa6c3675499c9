//! Transmit / receive / recycle across several platforms

use nalgebra::{Rotation3, Vector3};
use parking_lot::{Mutex, RwLock};
use proptest::prelude::*;
use rf_antenna::{
    Antenna, Emission, Gimbal, GimbalId, Platform, Player, PlayerId, Polarization, RfSystem,
    TargetDataBlock,
};
use std::sync::Arc;
use std::thread;

struct Jet {
    id: u32,
    pos: RwLock<Vector3<f64>>,
    inbox: Mutex<Vec<Arc<Emission>>>,
}

impl Jet {
    fn new(id: u32, pos: [f64; 3]) -> Arc<Self> {
        Arc::new(Self {
            id,
            pos: RwLock::new(Vector3::from(pos)),
            inbox: Mutex::new(Vec::new()),
        })
    }

    fn move_to(&self, pos: [f64; 3]) {
        *self.pos.write() = Vector3::from(pos);
    }

    fn take_inbox(&self) -> Vec<Arc<Emission>> {
        std::mem::take(&mut *self.inbox.lock())
    }
}

impl Platform for Jet {
    fn id(&self) -> PlayerId {
        PlayerId(self.id)
    }
    fn position(&self) -> Vector3<f64> {
        *self.pos.read()
    }
    fn velocity(&self) -> Vector3<f64> {
        Vector3::zeros()
    }
    fn attitude(&self) -> Rotation3<f64> {
        Rotation3::identity()
    }
}

impl Player for Jet {
    fn on_rf_emission(&self, emission: Arc<Emission>) {
        self.inbox.lock().push(emission);
    }
}

#[derive(Default)]
struct Sensor {
    received: Mutex<Vec<(GimbalId, PlayerId, f64)>>,
}

impl RfSystem for Sensor {
    fn rf_received_emission(&self, em: &Arc<Emission>, antenna: &Antenna, receiving_gain: f64) {
        let from = em.ownship.unwrap_or(PlayerId(0));
        self.received.lock().push((antenna.id(), from, receiving_gain));
    }
}

struct Station {
    jet: Arc<Jet>,
    sensor: Arc<Sensor>,
    antenna: Antenna,
}

impl Station {
    fn new(id: u32, pos: [f64; 3], polarization: Polarization) -> Self {
        let jet = Jet::new(id, pos);
        let sensor = Arc::new(Sensor::default());
        let mut antenna = Antenna::new(GimbalId(id * 10));
        antenna.set_polarization(polarization);
        let platform: Arc<dyn Platform> = jet.clone();
        let system: Arc<dyn RfSystem> = sensor.clone();
        antenna.set_ownship(&platform);
        antenna.set_system(&system);
        Self { jet, sensor, antenna }
    }

    fn tdb(&self, targets: &[&Station]) -> TargetDataBlock {
        TargetDataBlock::new(self.antenna.id(), Arc::clone(&self.jet) as Arc<dyn Platform>, 64)
            .with_targets(targets.iter().map(|s| Arc::clone(&s.jet) as Arc<dyn Player>))
    }
}

fn carrier(power_w: f64, polarization: Polarization) -> Emission {
    Emission::with_carrier(9.4e9, power_w, polarization).unwrap()
}

#[test]
fn direct_and_echo_reach_the_right_systems() {
    let radar = Station::new(1, [0.0, 0.0, -1_000.0], Polarization::Vertical);
    let target = Station::new(2, [20_000.0, 0.0, -1_000.0], Polarization::Horizontal);
    // Target's receiver faces the radar
    target.antenna.point(std::f64::consts::PI, 0.0);

    let mut tdb = radar.tdb(&[&target]);
    let report = radar.antenna.rf_transmit(&carrier(1_000.0, Polarization::Vertical), &mut tdb);
    assert_eq!(report.dispatched, 1);

    let inbox = target.jet.take_inbox();
    assert_eq!(inbox.len(), 1);
    let em = &inbox[0];

    // Direct: vertical into horizontal is cross-polarized
    assert!(target.antenna.on_rf_emission(em));
    let (gimbal, from, gain) = target.sensor.received.lock()[0];
    assert_eq!(gimbal, target.antenna.id());
    assert_eq!(from, PlayerId(1));
    assert_eq!(gain, 0.0);

    // Echo: no polarization loss, routed by gimbal
    assert!(radar.antenna.on_rf_emission_return(em));
    assert!(!target.antenna.on_rf_emission_return(em));
    let (gimbal, _, gain) = radar.sensor.received.lock()[0];
    assert_eq!(gimbal, radar.antenna.id());
    let expected = Antenna::effective_area(em.gain, em.wavelength());
    assert!((gain - expected).abs() < 1e-15);

    // Radar does not hear itself
    assert!(!radar.antenna.on_rf_emission(em));
}

#[test]
fn released_records_are_reused_next_frame() {
    let radar = Station::new(1, [0.0; 3], Polarization::Slant);
    let targets: Vec<Station> = (2..6)
        .map(|id| Station::new(id, [5_000.0 * id as f64, 100.0, 0.0], Polarization::Slant))
        .collect();
    let refs: Vec<&Station> = targets.iter().collect();
    let mut tdb = radar.tdb(&refs);

    for frame in 0..5 {
        radar.antenna.maintain();
        let report = radar.antenna.rf_transmit(&carrier(100.0, Polarization::Slant), &mut tdb);
        assert_eq!(report.dispatched, 4, "frame {}", frame);
        for t in &targets {
            t.jet.take_inbox();
        }
    }

    let stats = radar.antenna.pool().stats();
    assert_eq!(stats.allocated, 4);
    assert_eq!(stats.reused, 16);
}

#[test]
fn concurrent_transmitters_share_targets() {
    let target = Station::new(100, [0.0, 0.0, 0.0], Polarization::None);
    let radars: Vec<Station> = (1..=4)
        .map(|id| Station::new(id, [-10_000.0 * id as f64, 0.0, 0.0], Polarization::Vertical))
        .collect();

    thread::scope(|s| {
        for radar in &radars {
            let target = &target;
            s.spawn(move || {
                let mut tdb = radar.tdb(&[target]);
                for _ in 0..10 {
                    radar.antenna.maintain();
                    radar.antenna.rf_transmit(&carrier(50.0, Polarization::Vertical), &mut tdb);
                }
            });
        }
    });

    let inbox = target.jet.take_inbox();
    assert_eq!(inbox.len(), 40);
    for radar in &radars {
        let from_radar = inbox
            .iter()
            .filter(|em| em.gimbal == Some(radar.antenna.id()))
            .count();
        assert_eq!(from_radar, 10);
    }
    drop(inbox);

    for radar in &radars {
        assert_eq!(radar.antenna.maintain().reclaimed, 10);
        assert_eq!(radar.antenna.pool().free_len(), 10);
    }
}

#[test]
fn gimbal_slew_moves_gain_off_target() {
    use rf_antenna::{GainPattern, Table1};

    let mut radar = Station::new(1, [0.0; 3], Polarization::Vertical);
    radar.antenna.set_gain_pattern(Some(GainPattern::OneD(
        Table1::new(vec![0.0, 3.0, 90.0], vec![30.0, 0.0, -30.0]).unwrap(),
    )));
    let target = Station::new(2, [10_000.0, 0.0, 0.0], Polarization::Vertical);

    let mut on = radar.tdb(&[&target]);
    radar.antenna.rf_transmit(&carrier(1.0, Polarization::Vertical), &mut on);

    radar.antenna.point(std::f64::consts::FRAC_PI_2, 0.0);
    assert_eq!(radar.antenna.gimbal(), Gimbal::new(std::f64::consts::FRAC_PI_2, 0.0));
    let mut off = radar.tdb(&[&target]);
    radar.antenna.rf_transmit(&carrier(1.0, Polarization::Vertical), &mut off);

    let inbox = target.jet.take_inbox();
    assert!((inbox[0].power_w - 1_000.0).abs() < 1e-6);
    assert!((inbox[1].power_w - 0.001).abs() < 1e-9);
}

#[test]
fn reused_block_tracks_slew_and_ownship_motion() {
    use rf_antenna::{GainPattern, Table1};
    use std::f64::consts::FRAC_PI_2;

    let mut radar = Station::new(1, [0.0; 3], Polarization::Vertical);
    radar.antenna.set_gain_pattern(Some(GainPattern::OneD(
        Table1::new(vec![0.0, 3.0, 90.0], vec![30.0, 0.0, -30.0]).unwrap(),
    )));
    let target = Station::new(2, [10_000.0, 0.0, 0.0], Polarization::Vertical);
    let mut tdb = radar.tdb(&[&target]);

    radar.antenna.rf_transmit(&carrier(1.0, Polarization::Vertical), &mut tdb);

    radar.antenna.point(FRAC_PI_2, 0.0);
    radar.jet.move_to([5_000.0, 0.0, 0.0]);
    radar.antenna.rf_transmit(&carrier(1.0, Polarization::Vertical), &mut tdb);

    let inbox = target.jet.take_inbox();
    assert_eq!(inbox.len(), 2);

    let (first, second) = (&inbox[0], &inbox[1]);
    assert!((first.power_w - 1_000.0).abs() < 1e-6);
    assert!((first.range_m - 10_000.0).abs() < 1e-9);
    assert_eq!(first.gimbal_azimuth, 0.0);

    // Target now 90 degrees off boresight: -30 dB
    assert!((second.power_w - 0.001).abs() < 1e-9);
    assert!((second.range_m - 5_000.0).abs() < 1e-9);
    assert_eq!(second.gimbal_azimuth, FRAC_PI_2);
    assert!((tdb.boresight_azimuth_errors()[0] + FRAC_PI_2).abs() < 1e-12);
}

proptest! {
    #[test]
    fn held_records_are_never_recycled(holds in prop::collection::vec(any::<bool>(), 1..12)) {
        let radar = Station::new(1, [0.0; 3], Polarization::Vertical);
        let targets: Vec<Station> = (0..holds.len())
            .map(|i| Station::new(i as u32 + 2, [1_000.0 * (i + 1) as f64, 0.0, 0.0], Polarization::Vertical))
            .collect();
        let refs: Vec<&Station> = targets.iter().collect();
        let mut tdb = radar.tdb(&refs);

        radar.antenna.rf_transmit(&carrier(10.0, Polarization::Vertical), &mut tdb);

        let mut kept = Vec::new();
        for (t, &hold) in targets.iter().zip(&holds) {
            let mut inbox = t.jet.take_inbox();
            if hold {
                kept.append(&mut inbox);
            }
        }

        let report = radar.antenna.maintain();
        let held = holds.iter().filter(|&&h| h).count();
        prop_assert_eq!(report.retained, held);
        prop_assert_eq!(report.reclaimed, holds.len() - held);

        // Next frame must not hand out a held record
        radar.antenna.rf_transmit(&carrier(20.0, Polarization::Vertical), &mut tdb);
        for em in &kept {
            prop_assert_eq!(em.power_w, 10.0);
            prop_assert!(!em.is_cleared());
        }
    }
}
