//! Delimited-text export of the augmented emission table.
//!
//! The table written is the ten input columns followed by one efficiency
//! column per pollutant, rows in sample order.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use super::model::{Pollutant, SampleSeries, COLUMN_NAMES};

/// Errors that can occur while exporting.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An efficiency column shorter or longer than the series.
    #[error("{pollutant} efficiency has {found} values, series has {expected} samples")]
    LengthMismatch {
        pollutant: Pollutant,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Efficiency columns in export order, one per pollutant.
pub type EfficiencyColumns<'a> = [(Pollutant, &'a [f64])];

/// Write the augmented table to any writer.
pub fn write_augmented_csv<W: Write>(
    writer: W,
    series: &SampleSeries,
    efficiencies: &EfficiencyColumns<'_>,
) -> Result<()> {
    for (pollutant, values) in efficiencies {
        if values.len() != series.len() {
            return Err(ExportError::LengthMismatch {
                pollutant: *pollutant,
                expected: series.len(),
                found: values.len(),
            });
        }
    }

    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = COLUMN_NAMES.iter().map(|s| s.to_string()).collect();
    header.extend(efficiencies.iter().map(|(p, _)| p.efficiency_header()));
    csv_writer.write_record(&header)?;

    for (i, sample) in series.iter().enumerate() {
        let mut record: Vec<String> = sample.to_row().iter().map(|v| v.to_string()).collect();
        record.extend(efficiencies.iter().map(|(_, values)| format!("{:.3}", values[i])));
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the augmented table to a file, creating it if needed.
pub fn write_augmented_csv_file(
    path: &Path,
    series: &SampleSeries,
    efficiencies: &EfficiencyColumns<'_>,
) -> Result<()> {
    let file = File::create(path).map_err(|source| ExportError::CreateFile {
        path: path.display().to_string(),
        source,
    })?;
    write_augmented_csv(file, series, efficiencies)?;
    log::info!("Exported {} rows to {}", series.len(), path.display());
    Ok(())
}
