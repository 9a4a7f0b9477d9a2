//! Loader and export tests against real files.

use std::io::Write;
use std::sync::Arc;

use approx::assert_relative_eq;
use arrow::array::{ArrayRef, Float32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use emission_surface::analysis::compute_efficiency;
use emission_surface::data::export::write_augmented_csv_file;
use emission_surface::data::{load_file, LoadError, MissingValuePolicy, Pollutant, COLUMN_NAMES};

fn write_parquet(path: &std::path::Path, columns: Vec<(&str, ArrayRef)>) {
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, a)| a).collect(),
    )
    .unwrap();
    let file = std::fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn f64_column(values: Vec<Option<f64>>) -> ArrayRef {
    Arc::new(Float64Array::from(values))
}

// ============================================================================
// Parquet
// ============================================================================

#[test]
fn test_parquet_mixed_numeric_types() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.parquet");

    let mut columns: Vec<(&str, ArrayRef)> = Vec::new();
    columns.push((COLUMN_NAMES[0], Arc::new(Int64Array::from(vec![0i64, 1, 2])) as ArrayRef));
    columns.push((COLUMN_NAMES[1], Arc::new(Float32Array::from(vec![1.0f32, 0.5, 1.5])) as ArrayRef));
    for name in &COLUMN_NAMES[2..] {
        columns.push((*name, f64_column(vec![Some(100.0), None, Some(300.0)])));
    }
    // Extra trailing columns are ignored.
    columns.push(("comment", Arc::new(StringArray::from(vec!["a", "b", "c"])) as ArrayRef));
    write_parquet(&path, columns);

    let series = load_file(&path, MissingValuePolicy::ForwardFill).unwrap();
    assert_eq!(series.len(), 3);
    assert_relative_eq!(series.samples[2].time, 2.0);
    assert_relative_eq!(series.samples[1].lambda, 0.5);
    // Null forward-filled from the row above.
    assert_relative_eq!(series.samples[1].flow, 100.0);
    assert_relative_eq!(series.samples[2].catalyst_temp, 300.0);
}

#[test]
fn test_parquet_too_few_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.parquet");
    write_parquet(
        &path,
        vec![("a", f64_column(vec![Some(1.0)])), ("b", f64_column(vec![Some(2.0)]))],
    );

    let err = load_file(&path, MissingValuePolicy::Zero).unwrap_err();
    assert!(matches!(
        err,
        LoadError::SchemaColumnCount { expected: 10, found: 2 }
    ));
}

#[test]
fn test_parquet_text_column_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("text.parquet");
    let mut columns: Vec<(&str, ArrayRef)> = COLUMN_NAMES
        .iter()
        .map(|name| (*name, f64_column(vec![Some(1.0)])))
        .collect();
    columns[3].1 = Arc::new(StringArray::from(vec!["high"])) as ArrayRef;
    write_parquet(&path, columns);

    let err = load_file(&path, MissingValuePolicy::Zero).unwrap_err();
    assert!(matches!(
        err,
        LoadError::UnsupportedColumnType { column: "CO upstream", .. }
    ));
}

// ============================================================================
// CSV → export
// ============================================================================

#[test]
fn test_csv_load_and_export_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.csv");
    let output = dir.path().join("out.csv");

    let mut file = std::fs::File::create(&input).unwrap();
    writeln!(file, ",,,,,,,,,").unwrap();
    writeln!(file, "{}", COLUMN_NAMES.join(",")).unwrap();
    writeln!(file, "0.0, 1.0, 250, 100, 25, 50, , 10, 12, 80").unwrap();
    writeln!(file, "0.1, 1.0, 260, 100, 10, 50, 5, 10, 2, 90").unwrap();
    drop(file);

    let series = load_file(&input, MissingValuePolicy::Zero).unwrap();
    assert_eq!(series.len(), 2);

    let co = compute_efficiency(&series.upstream(Pollutant::Co), &series.downstream(Pollutant::Co));
    let thc =
        compute_efficiency(&series.upstream(Pollutant::Thc), &series.downstream(Pollutant::Thc));
    let nox =
        compute_efficiency(&series.upstream(Pollutant::Nox), &series.downstream(Pollutant::Nox));
    assert_relative_eq!(co[0], 75.0);
    assert_relative_eq!(co[1], 90.0);
    // Empty downstream cell became 0: full conversion.
    assert_relative_eq!(thc[0], 100.0);
    assert_relative_eq!(thc[1], 90.0);
    // Downstream above upstream clamps to 0.
    assert_eq!(nox[0], 0.0);
    assert_relative_eq!(nox[1], 80.0);

    write_augmented_csv_file(
        &output,
        &series,
        &[(Pollutant::Co, &co[..]), (Pollutant::Thc, &thc[..]), (Pollutant::Nox, &nox[..])],
    )
    .unwrap();

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), 13);
    assert_eq!(&headers[12], "NOx efficiency (%)");

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][10], "75.000");
    assert_eq!(&rows[1][12], "80.000");
    let flow: f64 = rows[1][9].parse().unwrap();
    assert_relative_eq!(flow, 90.0);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_file(&dir.path().join("absent.csv"), MissingValuePolicy::Zero).unwrap_err();
    assert!(matches!(err, LoadError::Open { .. }));
}
