use thiserror::Error;

/// Malformed or insufficient input handed to one of the catalog operations.
///
/// Every variant is surfaced straight to the caller. Nothing in this crate
/// retries, truncates, or substitutes data when one of these is raised.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("column '{column}' is not present in the table")]
    MissingColumn { column: String },

    #[error("columns have different lengths ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },

    #[error("need at least {required} valid values, found {found}")]
    InsufficientSamples { required: usize, found: usize },

    #[error("tracer {tracer} has {available} rows, {requested} were requested")]
    Shortfall {
        tracer: String,
        requested: usize,
        available: usize,
    },

    #[error("no catalog tables were supplied")]
    NoTables,

    #[error("TARGETID {target_id} appears more than once")]
    DuplicateTargetId { target_id: i64 },

    #[error("row with TARGETID {target_id} has non-finite redshift {z}")]
    NonFiniteRedshift { target_id: i64, z: f64 },

    #[error("column '{column}' has zero variance")]
    DegenerateColumn { column: String },

    #[error("density grid needs 1 to {max} bins per axis, got {bins}")]
    InvalidBins { bins: usize, max: usize },
}
