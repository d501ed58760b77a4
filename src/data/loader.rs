use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt8Type,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{columns, CatalogRow, CatalogTable, CellValue, Region, TracerType};

/// One parsed record before column aliases are resolved.
type Record = BTreeMap<String, CellValue>;

/// Accepted spellings for each standard column, in order of preference.
const TARGETID_ALIASES: &[&str] = &["TARGETID", "TARGET_ID"];
const RA_ALIASES: &[&str] = &["RA"];
const DEC_ALIASES: &[&str] = &["DEC"];
const Z_ALIASES: &[&str] = &["Z", "Z_not4clus", "REDSHIFT"];
const WEIGHT_ALIASES: &[&str] = &["WEIGHT_SYSTOT", "WEIGHT", "WEIGHT_ZFAIL"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a catalog from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one scalar column per catalog column (recommended; the
///   usual target when converting DESI FITS tables)
/// * `.json`    – `[{ "TARGETID": 1, "RA": ..., "DEC": ..., "Z": ... }, ...]`
/// * `.csv`     – header row with column names
///
/// TARGETID, RA, DEC and Z (or one of their aliases) are required. A
/// missing SPECTYPE column is filled with the tracer label.
pub fn load_catalog(path: &Path, tracer: TracerType, region: Region) -> Result<CatalogTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (headers, records) = match ext.as_str() {
        "parquet" | "pq" => read_parquet(path)?,
        "json" => read_json(path)?,
        "csv" => read_csv(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let table = records_to_table(&headers, records, tracer, region)
        .with_context(|| format!("building catalog from {}", path.display()))?;

    log::info!(
        "Loaded {} {} {} rows from {} with columns {:?}",
        table.len(),
        table.tracer(),
        table.region(),
        path.display(),
        table.column_names()
    );
    Ok(table)
}

/// Guess tracer and region from a DESI LSS file name such as
/// `ELG_LOPnotqso_NGC_clustering.dat.parquet`.
pub fn infer_labels(path: &Path) -> Option<(TracerType, Region)> {
    let name = path.file_name()?.to_str()?;
    let stem = name.split("_clustering").next()?;
    if stem.len() == name.len() {
        return None;
    }
    let (tracer, region) = stem.rsplit_once('_')?;
    if tracer.is_empty() {
        return None;
    }
    let tracer: TracerType = tracer.parse().ok()?;
    let region: Region = region.parse().ok()?;
    Some((tracer, region))
}

// ---------------------------------------------------------------------------
// Alias resolution
// ---------------------------------------------------------------------------

fn resolve_alias(headers: &BTreeSet<String>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find(|a| headers.contains(**a))
        .map(|a| a.to_string())
}

fn require_alias(headers: &BTreeSet<String>, aliases: &[&str]) -> Result<String> {
    resolve_alias(headers, aliases)
        .with_context(|| format!("missing required column (one of {aliases:?})"))
}

fn take_f64(rec: &mut Record, col: &str, row: usize) -> Result<f64> {
    match rec.remove(col) {
        Some(v) => v
            .as_f64()
            .with_context(|| format!("Row {row}: '{col}' is not numeric ({v})")),
        None => bail!("Row {row}: missing '{col}'"),
    }
}

fn take_target_id(rec: &mut Record, col: &str, row: usize) -> Result<i64> {
    match rec.remove(col) {
        Some(CellValue::Integer(i)) => Ok(i),
        Some(CellValue::Float(f)) if f.fract() == 0.0 && f.is_finite() => Ok(f as i64),
        Some(other) => bail!("Row {row}: '{col}' is not an integer ({other})"),
        None => bail!("Row {row}: missing '{col}'"),
    }
}

fn records_to_table(
    headers: &[String],
    records: Vec<Record>,
    tracer: TracerType,
    region: Region,
) -> Result<CatalogTable> {
    let header_set: BTreeSet<String> = headers.iter().cloned().collect();

    let id_col = require_alias(&header_set, TARGETID_ALIASES)?;
    let ra_col = require_alias(&header_set, RA_ALIASES)?;
    let dec_col = require_alias(&header_set, DEC_ALIASES)?;
    let z_col = require_alias(&header_set, Z_ALIASES)?;
    let weight_col = resolve_alias(&header_set, WEIGHT_ALIASES);
    let fill_spectype = !header_set.contains(columns::SPECTYPE);

    let mut rows = Vec::with_capacity(records.len());
    for (i, mut rec) in records.into_iter().enumerate() {
        let target_id = take_target_id(&mut rec, &id_col, i)?;
        let ra = take_f64(&mut rec, &ra_col, i)?;
        let dec = take_f64(&mut rec, &dec_col, i)?;
        let z = take_f64(&mut rec, &z_col, i)?;

        // Unused redshift aliases would shadow nothing useful; drop them.
        for alias in Z_ALIASES {
            rec.remove(*alias);
        }
        if let Some(w) = &weight_col {
            if let Some(value) = rec.remove(w) {
                rec.insert(columns::WEIGHT.to_string(), value);
            }
        }
        if fill_spectype {
            rec.insert(
                columns::SPECTYPE.to_string(),
                CellValue::String(tracer.label().to_string()),
            );
        }

        rows.push(CatalogRow {
            target_id,
            ra,
            dec,
            z,
            extra: rec,
        });
    }

    Ok(CatalogTable::new(tracer, region, rows)?)
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "TARGETID": 39627..., "RA": 150.1, "DEC": 2.2, "Z": 0.81, "ZWARN": 0 },
///   ...
/// ]
/// ```
fn read_json(path: &Path) -> Result<(Vec<String>, Vec<Record>)> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: BTreeSet<String> = BTreeSet::new();
    let mut out = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut record = Record::new();
        for (key, val) in obj {
            headers.insert(key.clone());
            record.insert(key.clone(), json_to_cell(val));
        }
        out.push(record);
    }

    Ok((headers.into_iter().collect(), out))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one source per line.
/// Empty cells are nulls; `nan`/`inf` parse as floats.
fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Record>)> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut out = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut rec = Record::new();
        for (col_idx, value) in record.iter().enumerate() {
            let Some(col_name) = headers.get(col_idx) else {
                bail!("CSV row {row_no}: more fields than headers");
            };
            rec.insert(col_name.clone(), guess_cell_type(value.trim()));
        }
        out.push(rec);
    }

    Ok((headers, out))
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Read a Parquet catalog: every column becomes one cell per row.
///
/// Works with files written by **Pandas** (`df.to_parquet()`),
/// **Polars** (`df.write_parquet()`) and astropy-to-pandas conversions of
/// the DESI FITS catalogs.
fn read_parquet(path: &Path) -> Result<(Vec<String>, Vec<Record>)> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut out = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let mut rec = Record::new();
            for (col_idx, field) in schema.fields().iter().enumerate() {
                let value = extract_cell(batch.column(col_idx), row);
                rec.insert(field.name().clone(), value);
            }
            out.push(rec);
        }
    }

    Ok((headers, out))
}

// -- Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row) as i64),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row) as i64),
        DataType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row) as i64),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row) as i64),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        other => CellValue::String(format!("{other:?}")),
    }
}
