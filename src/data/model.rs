use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::InputError;

/// Standard column names shared by every loaded catalog.
pub mod columns {
    pub const TARGETID: &str = "TARGETID";
    pub const RA: &str = "RA";
    pub const DEC: &str = "DEC";
    pub const Z: &str = "Z";
    pub const SPECTYPE: &str = "SPECTYPE";
    pub const ZWARN: &str = "ZWARN";
    pub const WEIGHT: &str = "WEIGHT";

    /// Columns stored as typed fields on every row.
    pub const BUILTIN: [&str; 4] = [TARGETID, RA, DEC, Z];
}

// ---------------------------------------------------------------------------
// CellValue – a single cell in a catalog column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the column types found in
/// DESI catalog tables.
/// Used as a `BTreeMap` / `BTreeSet` key downstream so it must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64`. Strings, booleans and nulls are not numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Tracer / region labels
// ---------------------------------------------------------------------------

/// Which survey sub-sample a catalog belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TracerType {
    ElgLopNotQso,
    Lrg,
    BgsBright,
    Qso,
    Other(String),
}

impl TracerType {
    /// The tracers offered in the viewer, in DESI release order.
    pub const KNOWN: [TracerType; 4] = [
        TracerType::ElgLopNotQso,
        TracerType::Lrg,
        TracerType::BgsBright,
        TracerType::Qso,
    ];

    /// Catalog label as it appears in DESI file names.
    pub fn label(&self) -> &str {
        match self {
            TracerType::ElgLopNotQso => "ELG_LOPnotqso",
            TracerType::Lrg => "LRG",
            TracerType::BgsBright => "BGS_BRIGHT",
            TracerType::Qso => "QSO",
            TracerType::Other(s) => s,
        }
    }
}

impl fmt::Display for TracerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TracerType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ELG_LOPnotqso" => TracerType::ElgLopNotQso,
            "LRG" => TracerType::Lrg,
            "BGS_BRIGHT" => TracerType::BgsBright,
            "QSO" => TracerType::Qso,
            other => TracerType::Other(other.to_string()),
        })
    }
}

/// Sky region of a catalog file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Region {
    Ngc,
    Sgc,
    Other(String),
}

impl Region {
    pub fn label(&self) -> &str {
        match self {
            Region::Ngc => "NGC",
            Region::Sgc => "SGC",
            Region::Other(s) => s,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Region {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "NGC" => Region::Ngc,
            "SGC" => Region::Sgc,
            _ => Region::Other(s.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// CatalogRow – one astronomical source
// ---------------------------------------------------------------------------

/// A single source (one row of a catalog file).
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    pub target_id: i64,
    /// Right ascension, degrees.
    pub ra: f64,
    /// Declination, degrees.
    pub dec: f64,
    /// Redshift (dimensionless).
    pub z: f64,
    /// Every non-builtin column: column_name → value.
    pub extra: BTreeMap<String, CellValue>,
}

impl CatalogRow {
    pub fn new(target_id: i64, ra: f64, dec: f64, z: f64) -> Self {
        Self {
            target_id,
            ra,
            dec,
            z,
            extra: BTreeMap::new(),
        }
    }

    /// Builder-style helper for attaching an extra column.
    pub fn with(mut self, column: &str, value: CellValue) -> Self {
        self.extra.insert(column.to_string(), value);
        self
    }

    /// Look up any column, builtin or extra. `None` if the row has no such column.
    pub fn value(&self, column: &str) -> Option<CellValue> {
        match column {
            columns::TARGETID => Some(CellValue::Integer(self.target_id)),
            columns::RA => Some(CellValue::Float(self.ra)),
            columns::DEC => Some(CellValue::Float(self.dec)),
            columns::Z => Some(CellValue::Float(self.z)),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Numeric view of a column; nulls and non-numeric cells are `None`.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            columns::TARGETID => Some(self.target_id as f64),
            columns::RA => Some(self.ra),
            columns::DEC => Some(self.dec),
            columns::Z => Some(self.z),
            other => self.extra.get(other).and_then(CellValue::as_f64),
        }
    }
}

// ---------------------------------------------------------------------------
// CatalogTable – one loaded catalog
// ---------------------------------------------------------------------------

/// An immutable catalog: rows sharing one schema, tagged with tracer and region.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTable {
    tracer: TracerType,
    region: Region,
    /// Ordered column names, builtins first.
    column_names: Vec<String>,
    rows: Vec<CatalogRow>,
}

impl CatalogTable {
    /// Validate rows and build the schema.
    ///
    /// The schema is the builtin columns followed by the sorted union of extra
    /// columns. Rows lacking one of those columns get a `Null` cell.
    pub fn new(
        tracer: TracerType,
        region: Region,
        rows: Vec<CatalogRow>,
    ) -> Result<Self, InputError> {
        Self::with_schema(tracer, region, std::iter::empty::<String>(), rows)
    }

    /// Like [`CatalogTable::new`], but `columns` are part of the schema even
    /// when no row carries them (e.g. an empty join result).
    pub fn with_schema(
        tracer: TracerType,
        region: Region,
        columns: impl IntoIterator<Item = String>,
        mut rows: Vec<CatalogRow>,
    ) -> Result<Self, InputError> {
        let mut seen = HashSet::with_capacity(rows.len());
        let mut extra_columns: BTreeSet<String> = columns.into_iter().collect();

        for row in &rows {
            if !seen.insert(row.target_id) {
                return Err(InputError::DuplicateTargetId {
                    target_id: row.target_id,
                });
            }
            if !row.z.is_finite() {
                return Err(InputError::NonFiniteRedshift {
                    target_id: row.target_id,
                    z: row.z,
                });
            }
            extra_columns.extend(row.extra.keys().cloned());
        }

        // Builtin names can never live in `extra`.
        for builtin in columns::BUILTIN {
            extra_columns.remove(builtin);
        }
        for row in &mut rows {
            for builtin in columns::BUILTIN {
                row.extra.remove(builtin);
            }
            for col in &extra_columns {
                row.extra.entry(col.clone()).or_insert(CellValue::Null);
            }
        }

        let column_names = columns::BUILTIN
            .iter()
            .map(|c| c.to_string())
            .chain(extra_columns)
            .collect();

        Ok(Self {
            tracer,
            region,
            column_names,
            rows,
        })
    }

    /// Build a table from rows that already satisfy this table's invariants
    /// (a subset of a validated table, in order).
    pub(crate) fn with_rows(&self, rows: Vec<CatalogRow>) -> Self {
        Self {
            tracer: self.tracer.clone(),
            region: self.region.clone(),
            column_names: self.column_names.clone(),
            rows,
        }
    }

    pub fn tracer(&self) -> &TracerType {
        &self.tracer
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Error unless the table carries `column`.
    pub fn require_column(&self, column: &str) -> Result<(), InputError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(InputError::MissingColumn {
                column: column.to_string(),
            })
        }
    }

    /// Numeric values of one column, `None` where the cell is null or non-numeric.
    pub fn numeric_column(&self, column: &str) -> Result<Vec<Option<f64>>, InputError> {
        self.require_column(column)?;
        Ok(self.rows.iter().map(|r| r.numeric(column)).collect())
    }

    pub fn redshifts(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.z).collect()
    }

    /// The first `n` rows (all of them if the table is shorter).
    pub fn head(&self, n: usize) -> CatalogTable {
        self.with_rows(self.rows.iter().take(n).cloned().collect())
    }

    /// Stack tables in order into one, with the union of their schemas.
    ///
    /// The result carries the first table's tracer. Its region is the shared
    /// region, or the labels joined with `+` when they differ. A TARGETID
    /// present in two tables is an error.
    pub fn concat(tables: &[CatalogTable]) -> Result<CatalogTable, InputError> {
        let first = tables.first().ok_or(InputError::NoTables)?;

        let mut regions: Vec<&Region> = Vec::new();
        for t in tables {
            if !regions.contains(&t.region()) {
                regions.push(t.region());
            }
        }
        let region = match regions.as_slice() {
            [single] => (*single).clone(),
            many => Region::Other(
                many.iter()
                    .map(|r| r.label())
                    .collect::<Vec<_>>()
                    .join("+"),
            ),
        };

        let columns = tables
            .iter()
            .flat_map(|t| t.column_names().iter().cloned())
            .collect::<Vec<_>>();
        let rows = tables.iter().flat_map(|t| t.rows().iter().cloned()).collect();
        Self::with_schema(first.tracer().clone(), region, columns, rows)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
