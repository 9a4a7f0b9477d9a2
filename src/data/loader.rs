use std::io::Read;
use std::path::Path;

use arrow::array::{Array, ArrayRef, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use calamine::{open_workbook_auto, Data, Range, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{Sample, SampleSeries, COLUMN_COUNT, COLUMN_NAMES};

/// A table row before missing values are resolved.
type RawRow = [Option<f64>; COLUMN_COUNT];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while decoding an emission table. Any of these aborts the
/// load of that file.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Failed to open the file.
    #[error("failed to open '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("spreadsheet error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no worksheet")]
    NoWorksheet,

    /// The file contains only blank rows.
    #[error("no header row found")]
    MissingHeader,

    /// A CSV row (header or data) with the wrong number of cells.
    #[error("line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// A Parquet schema with too few columns.
    #[error("schema has {found} columns, expected at least {expected}")]
    SchemaColumnCount { expected: usize, found: usize },

    #[error("line {line}, column '{column}': '{value}' is not a number")]
    InvalidNumber {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedColumnType {
        column: &'static str,
        data_type: String,
    },
}

pub type Result<T> = std::result::Result<T, LoadError>;

// ---------------------------------------------------------------------------
// Missing values
// ---------------------------------------------------------------------------

/// How empty cells are resolved before samples reach the analysis core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingValuePolicy {
    /// Replace every missing cell with `0`.
    #[default]
    Zero,
    /// Carry the previous value forward; leading gaps take the first
    /// present value, an all-missing column becomes `0`.
    ForwardFill,
}

fn resolve_missing(rows: Vec<RawRow>, policy: MissingValuePolicy) -> Vec<Sample> {
    let mut filled: Vec<[f64; COLUMN_COUNT]> = vec![[0.0; COLUMN_COUNT]; rows.len()];

    for col in 0..COLUMN_COUNT {
        match policy {
            MissingValuePolicy::Zero => {
                for (out, row) in filled.iter_mut().zip(&rows) {
                    out[col] = row[col].unwrap_or(0.0);
                }
            }
            MissingValuePolicy::ForwardFill => {
                let first_present = rows.iter().find_map(|r| r[col]).unwrap_or(0.0);
                let mut last = first_present;
                for (out, row) in filled.iter_mut().zip(&rows) {
                    if let Some(v) = row[col] {
                        last = v;
                    }
                    out[col] = last;
                }
            }
        }
    }

    filled.iter().map(Sample::from_row).collect()
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an emission table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – optional blank leading rows, one header row, then data
/// * `.parquet`      – the first ten columns are read by position
/// * `.xlsx` / `.xls` / `.ods` – first worksheet, laid out like the CSV
///
/// All layouts carry the ten columns of [`COLUMN_NAMES`] in that order.
pub fn load_file(path: &Path, policy: MissingValuePolicy) -> Result<SampleSeries> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let series = match ext.as_str() {
        "csv" | "txt" => {
            let file = open(path)?;
            read_csv(file, policy)?
        }
        "parquet" | "pq" => load_parquet(path, policy)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path, policy)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "Loaded {} samples ({:.1} s) from {}",
        series.len(),
        series.duration(),
        path.display()
    );
    Ok(series)
}

fn open(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|source| LoadError::Open {
        path: path.display().to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Decode a delimited emission table.
///
/// Spreadsheet exports often start with a blank row above the header; all
/// blank rows before the header are skipped. The header's names are not
/// interpreted, only its width is checked. Blank rows inside the data are
/// dropped.
pub fn read_csv<R: Read>(reader: R, policy: MissingValuePolicy) -> Result<SampleSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut header_seen = false;
    let mut rows: Vec<RawRow> = Vec::new();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.iter().all(str::is_empty) {
            log::debug!("skipping blank line {line}");
            continue;
        }

        if record.len() != COLUMN_COUNT {
            return Err(LoadError::ColumnCount {
                line,
                expected: COLUMN_COUNT,
                found: record.len(),
            });
        }

        if !header_seen {
            header_seen = true;
            continue;
        }

        let mut row: RawRow = [None; COLUMN_COUNT];
        for (col, cell) in record.iter().enumerate() {
            row[col] = parse_cell(cell, line, col)?;
        }
        rows.push(row);
    }

    if !header_seen {
        return Err(LoadError::MissingHeader);
    }

    Ok(SampleSeries::new(resolve_missing(rows, policy)))
}

fn parse_cell(cell: &str, line: u64, col: usize) -> Result<Option<f64>> {
    if cell.is_empty() {
        return Ok(None);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_nan() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(LoadError::InvalidNumber {
            line,
            column: COLUMN_NAMES[col],
            value: cell.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn load_workbook(path: &Path, policy: MissingValuePolicy) -> Result<SampleSeries> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook.worksheet_range_at(0).ok_or(LoadError::NoWorksheet)??;
    read_sheet(&range, policy)
}

/// Decode a worksheet with the same layout rules as [`read_csv`].
///
/// Columns are taken by position within the sheet's used range. Empty
/// trailing cells of a data row are missing values; numeric text is
/// accepted.
pub fn read_sheet(range: &Range<Data>, policy: MissingValuePolicy) -> Result<SampleSeries> {
    let first_row = range.start().map_or(0, |(row, _)| u64::from(row));
    let mut header_seen = false;
    let mut rows: Vec<RawRow> = Vec::new();

    for (i, cells) in range.rows().enumerate() {
        let line = first_row + i as u64 + 1;
        let width = cells
            .iter()
            .rposition(|c| !matches!(c, Data::Empty))
            .map_or(0, |last| last + 1);

        if width == 0 {
            log::debug!("skipping blank sheet row {line}");
            continue;
        }

        let bad_width = if header_seen {
            width > COLUMN_COUNT
        } else {
            width != COLUMN_COUNT
        };
        if bad_width {
            return Err(LoadError::ColumnCount {
                line,
                expected: COLUMN_COUNT,
                found: width,
            });
        }

        if !header_seen {
            header_seen = true;
            continue;
        }

        let mut row: RawRow = [None; COLUMN_COUNT];
        for (col, cell) in cells.iter().take(COLUMN_COUNT).enumerate() {
            row[col] = sheet_cell(cell, line, col)?;
        }
        rows.push(row);
    }

    if !header_seen {
        return Err(LoadError::MissingHeader);
    }

    Ok(SampleSeries::new(resolve_missing(rows, policy)))
}

fn sheet_cell(cell: &Data, line: u64, col: usize) -> Result<Option<f64>> {
    match cell {
        Data::Empty => Ok(None),
        Data::Float(v) => Ok(Some(*v).filter(|v| !v.is_nan())),
        Data::Int(v) => Ok(Some(*v as f64)),
        Data::String(text) => parse_cell(text.trim(), line, col),
        other => Err(LoadError::InvalidNumber {
            line,
            column: COLUMN_NAMES[col],
            value: other.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding the emission table.
///
/// Column names are ignored; the first ten columns are taken in order and
/// must be Float64, Float32, Int64 or Int32. Nulls are missing values.
fn load_parquet(path: &Path, policy: MissingValuePolicy) -> Result<SampleSeries> {
    let file = open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;

    let mut rows: Vec<RawRow> = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        if batch.num_columns() < COLUMN_COUNT {
            return Err(LoadError::SchemaColumnCount {
                expected: COLUMN_COUNT,
                found: batch.num_columns(),
            });
        }

        let columns: Vec<Vec<Option<f64>>> = (0..COLUMN_COUNT)
            .map(|i| extract_f64_column(batch.column(i), i))
            .collect::<Result<_>>()?;

        for row_idx in 0..batch.num_rows() {
            let mut row: RawRow = [None; COLUMN_COUNT];
            for (col, values) in columns.iter().enumerate() {
                row[col] = values[row_idx].filter(|v| !v.is_nan());
            }
            rows.push(row);
        }
    }

    Ok(SampleSeries::new(resolve_missing(rows, policy)))
}

// -- Arrow helpers --

/// Widen a numeric Arrow column to `f64`, keeping nulls as `None`.
fn extract_f64_column(col: &ArrayRef, index: usize) -> Result<Vec<Option<f64>>> {
    let unsupported = || LoadError::UnsupportedColumnType {
        column: COLUMN_NAMES[index],
        data_type: format!("{:?}", col.data_type()),
    };

    let values: Vec<Option<f64>> = match col.data_type() {
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(unsupported)?
            .iter()
            .collect(),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(unsupported)?
            .iter()
            .map(|v| v.map(f64::from))
            .collect(),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(unsupported)?
            .iter()
            .map(|v| v.map(|i| i as f64))
            .collect(),
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .ok_or_else(unsupported)?
            .iter()
            .map(|v| v.map(f64::from))
            .collect(),
        _ => return Err(unsupported()),
    };
    Ok(values)
}
