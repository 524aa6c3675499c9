//! Scenario description
//!
//! A scenario lists the players and, for those carrying a radar, the antenna
//! configuration and transmitted carrier. Loaded from JSON or taken from the
//! built-in two-ship intercept.

use anyhow::{bail, Context, Result};
use rf_antenna::{AngleSpec, AntennaConfig, GainPattern, PowerSpec, Table1};
use rf_emission::Polarization;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub players: Vec<PlayerSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSpec {
    pub id: u32,
    pub name: String,
    /// NED position (m)
    pub position: [f64; 3],
    /// NED velocity (m/s)
    #[serde(default)]
    pub velocity: [f64; 3],
    #[serde(default)]
    pub heading_deg: f64,
    /// Simulated on this node
    #[serde(default = "default_true")]
    pub local: bool,
    /// Returns echoes of emissions that reach it
    #[serde(default = "default_true")]
    pub reflective: bool,
    #[serde(default)]
    pub radar: Option<RadarSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarSpec {
    #[serde(default)]
    pub antenna: AntennaConfig,
    pub frequency_hz: f64,
    pub power: PowerSpec,
    #[serde(default)]
    pub polarization: Polarization,
    #[serde(default)]
    pub pulse_width_s: f64,
    #[serde(default)]
    pub prf_hz: f64,
    #[serde(default)]
    pub bandwidth_hz: f64,
    /// Only illuminate players simulated on this node
    #[serde(default)]
    pub local_players_only: bool,
    /// Azimuth scan half-width, about the nose
    #[serde(default = "default_scan_limit")]
    pub scan_limit: AngleSpec,
    /// Azimuth scan rate, per second
    #[serde(default = "default_scan_rate")]
    pub scan_rate: AngleSpec,
    /// Targets outside this angle from boresight are not illuminated
    #[serde(default)]
    pub field_of_view: Option<AngleSpec>,
    #[serde(default = "default_max_targets")]
    pub max_targets: usize,
}

fn default_true() -> bool {
    true
}

fn default_scan_limit() -> AngleSpec {
    AngleSpec::Degrees { degrees: 60.0 }
}

fn default_scan_rate() -> AngleSpec {
    AngleSpec::Degrees { degrees: 60.0 }
}

fn default_max_targets() -> usize {
    rf_antenna::TargetDataBlock::MAX_TARGETS
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading scenario from {:?}", path);
        let file = File::open(path).with_context(|| format!("opening {:?}", path))?;
        let reader = BufReader::new(file);
        let scenario: Scenario =
            serde_json::from_reader(reader).with_context(|| format!("parsing {:?}", path))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for p in &self.players {
            if !ids.insert(p.id) {
                bail!("duplicate player id {}", p.id);
            }
            if let Some(radar) = &p.radar {
                radar
                    .antenna
                    .validate()
                    .with_context(|| format!("player {} antenna", p.id))?;
                if !(radar.frequency_hz > 0.0 && radar.frequency_hz.is_finite()) {
                    bail!("player {}: invalid frequency {}", p.id, radar.frequency_hz);
                }
                let power = radar.power.to_watts();
                if !(power >= 0.0 && power.is_finite()) {
                    bail!("player {}: invalid power {} W", p.id, power);
                }
                if radar.max_targets == 0 {
                    bail!("player {}: max_targets must be positive", p.id);
                }
            }
        }
        Ok(())
    }

    /// Fighter radar against an inbound pair, a networked player and a
    /// ground surveillance radar on the flank.
    pub fn builtin() -> Result<Self> {
        let pattern = Some(GainPattern::OneD(Table1::new(
            vec![0.0, 1.5, 3.0, 6.0, 20.0, 180.0],
            vec![33.0, 30.0, 20.0, 0.0, -15.0, -30.0],
        )?));

        let fighter_radar = RadarSpec {
            antenna: AntennaConfig {
                polarization: Polarization::Vertical,
                threshold: PowerSpec::Watts(1.0),
                gain_pattern: pattern.clone(),
                ..AntennaConfig::default()
            },
            frequency_hz: 9.4e9,
            power: PowerSpec::Watts(5_000.0),
            polarization: Polarization::Vertical,
            pulse_width_s: 1.0e-6,
            prf_hz: 2_000.0,
            bandwidth_hz: 1.0e6,
            local_players_only: true,
            scan_limit: default_scan_limit(),
            scan_rate: default_scan_rate(),
            field_of_view: None,
            max_targets: 64,
        };

        let ground_radar = RadarSpec {
            antenna: AntennaConfig {
                polarization: Polarization::Horizontal,
                gain: 2.0,
                gain_pattern: pattern,
                ..AntennaConfig::default()
            },
            frequency_hz: 3.0e9,
            power: PowerSpec::Watts(50_000.0),
            polarization: Polarization::Horizontal,
            pulse_width_s: 10.0e-6,
            prf_hz: 500.0,
            bandwidth_hz: 0.5e6,
            local_players_only: false,
            scan_limit: AngleSpec::Degrees { degrees: 180.0 },
            scan_rate: AngleSpec::Degrees { degrees: 36.0 },
            field_of_view: Some(AngleSpec::Degrees { degrees: 45.0 }),
            max_targets: 128,
        };

        Ok(Scenario {
            name: "two-ship intercept".to_string(),
            players: vec![
                PlayerSpec {
                    id: 1,
                    name: "Viper 1".to_string(),
                    position: [0.0, 0.0, -6_000.0],
                    velocity: [250.0, 0.0, 0.0],
                    heading_deg: 0.0,
                    local: true,
                    reflective: true,
                    radar: Some(fighter_radar),
                },
                PlayerSpec {
                    id: 2,
                    name: "Bandit 1".to_string(),
                    position: [40_000.0, -2_000.0, -7_000.0],
                    velocity: [-240.0, 0.0, 0.0],
                    heading_deg: 180.0,
                    local: true,
                    reflective: true,
                    radar: None,
                },
                PlayerSpec {
                    id: 3,
                    name: "Bandit 2".to_string(),
                    position: [42_000.0, 2_000.0, -7_000.0],
                    velocity: [-240.0, 0.0, 0.0],
                    heading_deg: 180.0,
                    local: true,
                    reflective: true,
                    radar: None,
                },
                PlayerSpec {
                    id: 4,
                    name: "Remote 1".to_string(),
                    position: [30_000.0, 10_000.0, -5_000.0],
                    velocity: [0.0, -200.0, 0.0],
                    heading_deg: 270.0,
                    local: false,
                    reflective: true,
                    radar: None,
                },
                PlayerSpec {
                    id: 5,
                    name: "Ground Radar".to_string(),
                    position: [20_000.0, 30_000.0, 0.0],
                    velocity: [0.0, 0.0, 0.0],
                    heading_deg: 270.0,
                    local: true,
                    reflective: false,
                    radar: Some(ground_radar),
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_is_valid() {
        let s = Scenario::builtin().unwrap();
        assert!(s.validate().is_ok());
        assert_eq!(s.players.iter().filter(|p| p.radar.is_some()).count(), 2);
    }

    #[test]
    fn test_builtin_radars_carry_pattern() {
        let s = Scenario::builtin().unwrap();
        for radar in s.players.iter().filter_map(|p| p.radar.as_ref()) {
            match &radar.antenna.gain_pattern {
                Some(GainPattern::OneD(table)) => assert_eq!(table.peak(), 33.0),
                other => panic!("expected a 1-D pattern, found {:?}", other),
            }
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut s = Scenario::builtin().unwrap();
        s.players[1].id = 1;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_load_minimal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "name": "pair",
                "players": [
                    {{ "id": 1, "name": "a", "position": [0, 0, 0],
                       "radar": {{ "frequency_hz": 1e10, "power": {{ "value": 1, "unit": "kW" }} }} }},
                    {{ "id": 2, "name": "b", "position": [1000, 0, 0], "local": false }}
                ]
            }}"#
        )
        .unwrap();

        let s = Scenario::load(file.path()).unwrap();
        let radar = s.players[0].radar.as_ref().unwrap();
        assert_eq!(radar.power.to_watts(), 1000.0);
        assert_eq!(radar.max_targets, rf_antenna::TargetDataBlock::MAX_TARGETS);
        assert!(!s.players[1].local);
        assert!(s.players[1].reflective);
    }

    #[test]
    fn test_bundled_scenario() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/intercept.json");
        let s = Scenario::load(&path).unwrap();
        assert_eq!(s.players.len(), 3);
        let bandit = s.players[2].radar.as_ref().unwrap();
        assert!(matches!(bandit.antenna.gain_pattern, Some(GainPattern::TwoD(_))));
        assert_eq!(bandit.antenna.threshold.to_watts(), 10.0);
    }

    #[test]
    fn test_bad_frequency_rejected() {
        let mut s = Scenario::builtin().unwrap();
        if let Some(radar) = s.players[0].radar.as_mut() {
            radar.frequency_hz = 0.0;
        }
        assert!(s.validate().is_err());
    }
}
