use std::{fmt, fs::File, path::Path, str::FromStr};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Linear unit accepted for the stream buffer distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearUnit {
    Meters,
    Kilometers,
    Feet,
}

impl LinearUnit {
    /// Conversion factor into meters, the unit used internally.
    pub fn to_meters(self) -> f64 {
        match self {
            LinearUnit::Meters => 1.0,
            LinearUnit::Kilometers => 1000.0,
            LinearUnit::Feet => 0.3048,
        }
    }
}

impl FromStr for LinearUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" => Ok(LinearUnit::Meters),
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => Ok(LinearUnit::Kilometers),
            "ft" | "foot" | "feet" => Ok(LinearUnit::Feet),
            other => Err(format!("unknown linear unit {other:?}")),
        }
    }
}

impl fmt::Display for LinearUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinearUnit::Meters => "meters",
            LinearUnit::Kilometers => "kilometers",
            LinearUnit::Feet => "feet",
        })
    }
}

/// Stream buffer distance as the caller states it, e.g. "100 meters".
/// A bare number is taken as meters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct BufferDistance {
    pub value: f64,
    pub unit: LinearUnit,
}

impl BufferDistance {
    pub fn new(value: f64, unit: LinearUnit) -> Self {
        Self { value, unit }
    }

    /// The distance in meters, the unit all geometry math runs in.
    pub fn meters(&self) -> f64 {
        self.value * self.unit.to_meters()
    }
}

impl Default for BufferDistance {
    fn default() -> Self {
        Self { value: 100.0, unit: LinearUnit::Meters }
    }
}

impl FromStr for BufferDistance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (value_part, unit_part) = match s.split_once(char::is_whitespace) {
            Some((value, unit)) => (value, unit.trim()),
            None => (s, ""),
        };
        let value: f64 = value_part
            .parse()
            .map_err(|_| format!("invalid distance value {value_part:?}"))?;
        if !value.is_finite() || value < 0.0 {
            return Err(format!("distance must be finite and non-negative, got {value}"));
        }
        let unit = if unit_part.is_empty() { LinearUnit::Meters } else { unit_part.parse()? };
        Ok(Self { value, unit })
    }
}

impl TryFrom<String> for BufferDistance {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for BufferDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Run settings beyond the input/output paths. Loadable from a JSON file so
/// site-specific thresholds can be kept next to the data.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Buffer distance around stream centerlines.
    pub distance: BufferDistance,
    /// Watersheds below this area are skipped as degenerate slivers.
    pub min_watershed_area_m2: f64,
    /// Vertices per semicircular end cap when buffering streams.
    pub cap_segments: usize,
    /// Rows in the change-in-density report.
    pub report_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            distance: BufferDistance::default(),
            min_watershed_area_m2: 1.0,
            cap_segments: 16,
            report_rows: 20,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}
