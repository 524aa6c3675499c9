//! Antenna polarization and the transmit/receive match table.

use crate::{EmissionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Antenna polarization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Polarization {
    #[default]
    None = 0,
    Vertical = 1,
    Horizontal = 2,
    Slant = 3,
    /// Right-hand circular
    Rhc = 4,
    /// Left-hand circular
    Lhc = 5,
}

/// Match factor indexed by (transmit, receive) discriminant.
/// Symmetric; the `None` row and column match everything.
const POLARIZATION_GAIN: [[f64; 6]; 6] = [
    //  None  Vert  Horz  Slant RHC   LHC
    [1.0, 1.0, 1.0, 1.0, 1.0, 1.0], // None
    [1.0, 1.0, 0.0, 0.5, 0.5, 0.5], // Vertical
    [1.0, 0.0, 1.0, 0.5, 0.5, 0.5], // Horizontal
    [1.0, 0.5, 0.5, 1.0, 0.5, 0.5], // Slant
    [1.0, 0.5, 0.5, 0.5, 1.0, 0.0], // RHC
    [1.0, 0.5, 0.5, 0.5, 0.0, 1.0], // LHC
];

impl Polarization {
    pub const ALL: [Polarization; 6] = [
        Polarization::None,
        Polarization::Vertical,
        Polarization::Horizontal,
        Polarization::Slant,
        Polarization::Rhc,
        Polarization::Lhc,
    ];

    /// Match factor (0-1) between a transmitted and a received polarization
    pub fn gain(self, other: Polarization) -> f64 {
        POLARIZATION_GAIN[self as usize][other as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Polarization::None => "none",
            Polarization::Vertical => "vertical",
            Polarization::Horizontal => "horizontal",
            Polarization::Slant => "slant",
            Polarization::Rhc => "rhc",
            Polarization::Lhc => "lhc",
        }
    }
}

impl fmt::Display for Polarization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Polarization {
    type Err = EmissionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Polarization::None),
            "vertical" | "v" => Ok(Polarization::Vertical),
            "horizontal" | "h" => Ok(Polarization::Horizontal),
            "slant" => Ok(Polarization::Slant),
            "rhc" | "right-circular" | "right_circular" => Ok(Polarization::Rhc),
            "lhc" | "left-circular" | "left_circular" => Ok(Polarization::Lhc),
            _ => Err(EmissionError::UnknownPolarization(s.to_string())),
        }
    }
}

impl TryFrom<String> for Polarization {
    type Error = EmissionError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Polarization> for String {
    fn from(p: Polarization) -> Self {
        p.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_match_scenarios() {
        use Polarization::*;
        assert_eq!(Vertical.gain(Vertical), 1.0);
        assert_eq!(Vertical.gain(Horizontal), 0.0);
        assert_eq!(Vertical.gain(Slant), 0.5);
        assert_eq!(Rhc.gain(Lhc), 0.0);
        assert_eq!(Horizontal.gain(Lhc), 0.5);
        assert_eq!(Slant.gain(Rhc), 0.5);
    }

    #[test]
    fn test_none_matches_everything() {
        for p in Polarization::ALL {
            assert_eq!(Polarization::None.gain(p), 1.0);
            assert_eq!(p.gain(Polarization::None), 1.0);
        }
    }

    #[test]
    fn test_diagonal_is_matched() {
        for p in Polarization::ALL {
            assert_eq!(p.gain(p), 1.0, "{} should match itself", p);
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("Vertical".parse::<Polarization>().unwrap(), Polarization::Vertical);
        assert_eq!(" RHC ".parse::<Polarization>().unwrap(), Polarization::Rhc);
        assert_eq!("left-circular".parse::<Polarization>().unwrap(), Polarization::Lhc);
        assert!("diagonal".parse::<Polarization>().is_err());
    }

    #[test]
    fn test_string_conversion() {
        let s = String::from(Polarization::Slant);
        assert_eq!(s, "slant");
        assert_eq!(Polarization::try_from(s).unwrap(), Polarization::Slant);
    }

    fn any_polarization() -> impl Strategy<Value = Polarization> {
        (0usize..6).prop_map(|i| Polarization::ALL[i])
    }

    proptest! {
        #[test]
        fn prop_table_is_symmetric(p in any_polarization(), q in any_polarization()) {
            prop_assert_eq!(p.gain(q), q.gain(p));
        }

        #[test]
        fn prop_gain_is_a_fraction(p in any_polarization(), q in any_polarization()) {
            let g = p.gain(q);
            prop_assert!((0.0..=1.0).contains(&g));
        }
    }
}
