/// Data layer: core types, loading, filtering and statistics.
///
/// Architecture:
/// ```text
///  final_housing_data.csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → HousingTable (memoized per path)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ HousingTable  │  Vec<HousingRecord>, distinct years
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  inclusive year range → filtered indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats    │  correlation, monthly means, box summaries
///   └──────────┘
/// ```

pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod stats;
