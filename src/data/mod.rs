/// Data layer: core types, loading, and export.
///
/// Architecture:
/// ```text
///  .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SampleSeries (10 fixed columns)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ SampleSeries  │  Vec<Sample>, acquisition order
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  series + efficiency columns → delimited text
///   └──────────┘
/// ```

pub mod export;
pub mod loader;
pub mod model;

pub use loader::{load_file, LoadError, MissingValuePolicy};
pub use model::{Pollutant, Sample, SampleSeries, COLUMN_COUNT, COLUMN_NAMES};
