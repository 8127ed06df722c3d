/// Data layer: core types, reconstruction, and selection.
///
/// Architecture:
/// ```text
///  MassHunter .csv export
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  rows → spans → outer join → ChromatogramTable
///   └──────────┘      (+ "<stem> parsed.csv" side effect)
///        │
///        ▼
///   ┌──────────────┐
///   │ Chromatograms │  time column, sample columns, display names
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  time window + column reorder/subset
///   └──────────┘
/// ```

pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
