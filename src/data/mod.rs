/// Data layer: core types, loading, clustering, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .tsv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<RawPlant>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ prepare   │  adjusted_capacity = max(capacity, floor)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ cluster   │  k-means on (lat, lon) → PlantTable
///   └──────────┘
///        │            (once, at start-up)
///  ──────┼──────────────────────────────
///        ▼            (per query)
///   ┌──────────┐
///   │  filter   │  cluster / treatment predicates → &PlantRecord subset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ aggregate │  capacity by type, correlation matrix
///   └──────────┘
/// ```

pub mod aggregate;
pub mod cluster;
pub mod filter;
pub mod loader;
pub mod model;
pub mod prepare;
