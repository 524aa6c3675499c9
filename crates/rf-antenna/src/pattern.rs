//! Antenna Gain Patterns
//!
//! Breakpoint tables of gain (dB) versus angle off boresight:
//! - `Table1`: one independent variable, linear interpolation
//! - `Table2`: azimuth x elevation, bilinear interpolation
//!
//! Lookups outside the breakpoints clamp to the edge values.

use crate::{AntennaError, BoresightAngles, Result};
use serde::{Deserialize, Serialize};

/// Gain pattern, fixed at configuration time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GainPattern {
    /// Gain (dB) by total angle off boresight
    OneD(Table1),
    /// Gain (dB) by azimuth and elevation off boresight
    TwoD(Table2),
}

impl GainPattern {
    /// Gain (dB) for the given offsets; angles in the table's unit
    pub fn gain_db(&self, angles: &BoresightAngles) -> f64 {
        match self {
            GainPattern::OneD(table) => table.lookup(angles.off_boresight),
            GainPattern::TwoD(table) => table.lookup(angles.azimuth, angles.elevation),
        }
    }
}

/// One-dimensional breakpoint table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Table1Data")]
pub struct Table1 {
    x: Vec<f64>,
    data: Vec<f64>,
}

#[derive(Deserialize)]
struct Table1Data {
    x: Vec<f64>,
    data: Vec<f64>,
}

impl TryFrom<Table1Data> for Table1 {
    type Error = AntennaError;

    fn try_from(raw: Table1Data) -> Result<Self> {
        Table1::new(raw.x, raw.data)
    }
}

impl Table1 {
    pub fn new(x: Vec<f64>, data: Vec<f64>) -> Result<Self> {
        check_breakpoints("x", &x)?;
        if data.len() != x.len() {
            return Err(AntennaError::InvalidTable(format!(
                "expected {} values, found {}",
                x.len(),
                data.len()
            )));
        }
        check_finite(&data)?;
        Ok(Self { x, data })
    }

    pub fn lookup(&self, x: f64) -> f64 {
        let (i, t) = locate(&self.x, x);
        lerp(&self.data, i, t)
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.x
    }

    /// Largest tabulated value
    pub fn peak(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Two-dimensional breakpoint table, `data[j][i]` at (`x[i]`, `y[j]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Table2Data")]
pub struct Table2 {
    x: Vec<f64>,
    y: Vec<f64>,
    data: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
struct Table2Data {
    x: Vec<f64>,
    y: Vec<f64>,
    data: Vec<Vec<f64>>,
}

impl TryFrom<Table2Data> for Table2 {
    type Error = AntennaError;

    fn try_from(raw: Table2Data) -> Result<Self> {
        Table2::new(raw.x, raw.y, raw.data)
    }
}

impl Table2 {
    pub fn new(x: Vec<f64>, y: Vec<f64>, data: Vec<Vec<f64>>) -> Result<Self> {
        check_breakpoints("x", &x)?;
        check_breakpoints("y", &y)?;
        if data.len() != y.len() {
            return Err(AntennaError::InvalidTable(format!(
                "expected {} rows, found {}",
                y.len(),
                data.len()
            )));
        }
        for (j, row) in data.iter().enumerate() {
            if row.len() != x.len() {
                return Err(AntennaError::InvalidTable(format!(
                    "row {} has {} values, expected {}",
                    j,
                    row.len(),
                    x.len()
                )));
            }
            check_finite(row)?;
        }
        Ok(Self { x, y, data })
    }

    pub fn lookup(&self, x: f64, y: f64) -> f64 {
        let (i, tx) = locate(&self.x, x);
        let (j, ty) = locate(&self.y, y);
        let lower = lerp(&self.data[j], i, tx);
        if ty == 0.0 {
            return lower;
        }
        let upper = lerp(&self.data[j + 1], i, tx);
        lower + ty * (upper - lower)
    }
}

fn check_breakpoints(name: &str, bp: &[f64]) -> Result<()> {
    if bp.is_empty() {
        return Err(AntennaError::InvalidTable(format!("{} breakpoints are empty", name)));
    }
    check_finite(bp)?;
    if bp.windows(2).any(|w| w[1] <= w[0]) {
        return Err(AntennaError::InvalidTable(format!(
            "{} breakpoints must be strictly increasing",
            name
        )));
    }
    Ok(())
}

fn check_finite(values: &[f64]) -> Result<()> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(v) => Err(AntennaError::InvalidTable(format!("non-finite value {}", v))),
        None => Ok(()),
    }
}

/// Segment index and fraction for `v`; fraction 0 means exactly `bp[i]`.
fn locate(bp: &[f64], v: f64) -> (usize, f64) {
    let n = bp.len();
    // NaN falls through to the first breakpoint
    if n == 1 || !(v > bp[0]) {
        return (0, 0.0);
    }
    if v >= bp[n - 1] {
        return (n - 1, 0.0);
    }
    let i = bp.partition_point(|&b| b <= v) - 1;
    (i, (v - bp[i]) / (bp[i + 1] - bp[i]))
}

fn lerp(data: &[f64], i: usize, t: f64) -> f64 {
    if t == 0.0 {
        data[i]
    } else {
        data[i] + t * (data[i + 1] - data[i])
    }
}
