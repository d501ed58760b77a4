/// Analysis layer: pure transforms over loaded catalogs.
///
/// ```text
///  CatalogTable(s)
///     │
///     ├──▶ combine ──▶ projection ──▶ wedge points
///     │
///     └──▶ emission (quality cut, log pairs) ──▶ stats (Pearson r)
///                                            └──▶ density (2-D counts)
/// ```

pub mod combine;
pub mod density;
pub mod emission;
pub mod projection;
pub mod stats;
