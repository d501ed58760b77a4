/// Data layer: catalog types, loading, joining and filtering.
///
/// Architecture:
/// ```text
///  .parquet / .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → CatalogTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐       ┌────────┐
///   │ CatalogTable  │ ────▶ │  join   │  LSS ⋈ FastSpecFit on TARGETID
///   └──────────────┘       └────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply column predicates → reduced CatalogTable
///   └──────────┘
/// ```

pub mod filter;
pub mod join;
pub mod loader;
pub mod model;
