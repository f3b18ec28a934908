/// Data layer: cell and table types, loading, writing, and row-level helpers.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (column-wise type inference)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  ordered columns, Vec<Vec<Value>> rows
///   └──────────┘
///        │
///        ├──► audit   missing-value counts per column
///        ├──► filter  drop rows with missing cells
///        ▼
///   ┌──────────┐
///   │  writer   │  Table → .csv
///   └──────────┘
/// ```

pub mod audit;
pub mod filter;
pub mod loader;
pub mod model;
pub mod writer;
