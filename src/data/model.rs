use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Table layout
// ---------------------------------------------------------------------------

/// Number of columns in an emission table.
pub const COLUMN_COUNT: usize = 10;

/// Canonical column names, in the fixed order the table is read.
pub const COLUMN_NAMES: [&str; COLUMN_COUNT] = [
    "Time (s)",
    "Lambda",
    "Catalyst temperature (°C)",
    "CO upstream",
    "CO downstream",
    "THC upstream",
    "THC downstream",
    "NOx upstream",
    "NOx downstream",
    "Flow (m³/h)",
];

// ---------------------------------------------------------------------------
// Pollutant
// ---------------------------------------------------------------------------

/// The three pollutants tracked across the catalyst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    Co,
    Thc,
    Nox,
}

impl Pollutant {
    pub const ALL: [Pollutant; 3] = [Pollutant::Co, Pollutant::Thc, Pollutant::Nox];

    /// Short display label ("CO", "THC", "NOx").
    pub fn label(self) -> &'static str {
        match self {
            Pollutant::Co => "CO",
            Pollutant::Thc => "THC",
            Pollutant::Nox => "NOx",
        }
    }

    /// Table column index of the pre-catalyst reading.
    pub fn upstream_column(self) -> usize {
        match self {
            Pollutant::Co => 3,
            Pollutant::Thc => 5,
            Pollutant::Nox => 7,
        }
    }

    /// Table column index of the post-catalyst reading.
    pub fn downstream_column(self) -> usize {
        self.upstream_column() + 1
    }

    /// Header used for this pollutant's efficiency column on export.
    pub fn efficiency_header(self) -> String {
        format!("{} efficiency (%)", self.label())
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Sample – one row of the emission table
// ---------------------------------------------------------------------------

/// Pre- and post-catalyst concentration of one pollutant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Concentration {
    pub upstream: f64,
    pub downstream: f64,
}

/// A single sensor reading.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    /// Seconds since acquisition start.
    pub time: f64,
    pub lambda: f64,
    /// Catalyst temperature in °C.
    pub catalyst_temp: f64,
    /// Exhaust flow in m³/h.
    pub flow: f64,
    pub co: Concentration,
    pub thc: Concentration,
    pub nox: Concentration,
}

impl Sample {
    /// Build a sample from a row laid out as [`COLUMN_NAMES`].
    pub fn from_row(row: &[f64; COLUMN_COUNT]) -> Self {
        Sample {
            time: row[0],
            lambda: row[1],
            catalyst_temp: row[2],
            co: Concentration {
                upstream: row[3],
                downstream: row[4],
            },
            thc: Concentration {
                upstream: row[5],
                downstream: row[6],
            },
            nox: Concentration {
                upstream: row[7],
                downstream: row[8],
            },
            flow: row[9],
        }
    }

    /// The row back in [`COLUMN_NAMES`] order.
    pub fn to_row(&self) -> [f64; COLUMN_COUNT] {
        [
            self.time,
            self.lambda,
            self.catalyst_temp,
            self.co.upstream,
            self.co.downstream,
            self.thc.upstream,
            self.thc.downstream,
            self.nox.upstream,
            self.nox.downstream,
            self.flow,
        ]
    }

    pub fn concentration(&self, pollutant: Pollutant) -> Concentration {
        match pollutant {
            Pollutant::Co => self.co,
            Pollutant::Thc => self.thc,
            Pollutant::Nox => self.nox,
        }
    }
}

// ---------------------------------------------------------------------------
// SampleSeries – the complete loaded table
// ---------------------------------------------------------------------------

/// Samples in acquisition order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    pub samples: Vec<Sample>,
}

impl SampleSeries {
    pub fn new(samples: Vec<Sample>) -> Self {
        SampleSeries { samples }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn flow(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.flow).collect()
    }

    pub fn catalyst_temp(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.catalyst_temp).collect()
    }

    pub fn upstream(&self, pollutant: Pollutant) -> Vec<f64> {
        self.samples
            .iter()
            .map(|s| s.concentration(pollutant).upstream)
            .collect()
    }

    pub fn downstream(&self, pollutant: Pollutant) -> Vec<f64> {
        self.samples
            .iter()
            .map(|s| s.concentration(pollutant).downstream)
            .collect()
    }

    /// Acquisition duration in seconds (last minus first timestamp).
    pub fn duration(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0.0,
        }
    }
}

impl From<Vec<Sample>> for SampleSeries {
    fn from(samples: Vec<Sample>) -> Self {
        SampleSeries::new(samples)
    }
}
