//! Writes a synthetic 10 Hz catalyst test run as `sample_data.csv` and
//! `sample_data.parquet` in the current directory (or under the directory
//! given as first argument).

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use emission_surface::data::{Pollutant, Sample, COLUMN_COUNT, COLUMN_NAMES};
use emission_surface::data::model::Concentration;

const RATE_HZ: f64 = 10.0;
const DURATION_S: f64 = 900.0;

/// Light-off temperature (50 % conversion) per pollutant.
fn light_off(pollutant: Pollutant) -> f64 {
    match pollutant {
        Pollutant::Co => 230.0,
        Pollutant::Thc => 260.0,
        Pollutant::Nox => 290.0,
    }
}

fn gauss(rng: &mut StdRng, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Fractional conversion for the operating point.
fn conversion(pollutant: Pollutant, temp: f64, flow: f64, lambda: f64) -> f64 {
    let warm = 1.0 / (1.0 + (-(temp - light_off(pollutant)) / 25.0).exp());
    let space_velocity = 1.0 - 0.25 * (flow / 500.0).min(1.0);
    let mixture = match pollutant {
        // Rich mixtures starve CO and HC oxidation; lean ones stop NOx reduction.
        Pollutant::Co | Pollutant::Thc => 1.0 - 4.0 * (1.0 - lambda).max(0.0),
        Pollutant::Nox => 1.0 - 6.0 * (lambda - 1.0).max(0.0),
    };
    (0.98 * warm * space_velocity * mixture).clamp(0.0, 1.0)
}

fn concentration(
    rng: &mut StdRng,
    pollutant: Pollutant,
    base: f64,
    temp: f64,
    flow: f64,
    lambda: f64,
) -> Concentration {
    let upstream = (base * (1.0 + gauss(rng, 0.05))).max(0.0);
    let downstream =
        (upstream * (1.0 - conversion(pollutant, temp, flow, lambda)) + gauss(rng, base * 0.005))
            .max(0.0);
    Concentration {
        upstream,
        downstream,
    }
}

fn generate(rng: &mut StdRng) -> Vec<Sample> {
    let n = (DURATION_S * RATE_HZ) as usize;
    (0..n)
        .map(|i| {
            let time = i as f64 / RATE_HZ;
            // Warm-up from ambient towards 550 °C.
            let catalyst_temp = 550.0 - 525.0 * (-time / 240.0).exp() + gauss(rng, 2.0);
            // Drive cycle: slow accelerations with a faster ripple.
            let flow = (220.0
                + 150.0 * (time / 60.0).sin()
                + 40.0 * (time / 7.0).sin()
                + gauss(rng, 5.0))
            .max(20.0);
            let lambda = 1.0 + 0.02 * (time / 3.0).sin() + gauss(rng, 0.005);

            Sample {
                time,
                lambda,
                catalyst_temp,
                flow,
                co: concentration(rng, Pollutant::Co, 6000.0, catalyst_temp, flow, lambda),
                thc: concentration(rng, Pollutant::Thc, 800.0, catalyst_temp, flow, lambda),
                nox: concentration(rng, Pollutant::Nox, 1500.0, catalyst_temp, flow, lambda),
            }
        })
        .collect()
}

fn write_csv(path: &PathBuf, samples: &[Sample]) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    // Acquisition exports start with a blank line before the header.
    writeln!(file)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(COLUMN_NAMES)?;
    for sample in samples {
        writer.write_record(sample.to_row().iter().map(|v| format!("{v:.4}")))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &PathBuf, samples: &[Sample]) -> Result<()> {
    let schema = Arc::new(Schema::new(
        COLUMN_NAMES
            .iter()
            .map(|name| Field::new(*name, DataType::Float64, false))
            .collect::<Vec<_>>(),
    ));

    let rows: Vec<[f64; COLUMN_COUNT]> = samples.iter().map(Sample::to_row).collect();
    let columns: Vec<ArrayRef> = (0..COLUMN_COUNT)
        .map(|c| Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r[c]))) as ArrayRef)
        .collect();

    let batch = RecordBatch::try_new(schema.clone(), columns)
        .context("failed to create RecordBatch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut rng = StdRng::seed_from_u64(42);
    let samples = generate(&mut rng);

    let csv_path = dir.join("sample_data.csv");
    let parquet_path = dir.join("sample_data.parquet");
    write_csv(&csv_path, &samples)?;
    write_parquet(&parquet_path, &samples)?;

    log::info!("generated {} samples at {RATE_HZ} Hz", samples.len());
    println!(
        "Wrote {} samples to {} and {}",
        samples.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
