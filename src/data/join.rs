use std::collections::HashMap;

use super::model::{CatalogRow, CatalogTable};
use crate::error::InputError;

/// Inner join of two catalogs on TARGETID.
///
/// Rows keep the left table's order and builtin values; the right table's
/// extra columns are appended, except where the left already has a column of
/// the same name. Left rows without a partner are dropped. The result keeps
/// the left table's tracer and region, and both schemas even when nothing
/// matched.
pub fn inner_join_on_target_id(
    left: &CatalogTable,
    right: &CatalogTable,
) -> Result<CatalogTable, InputError> {
    let by_id: HashMap<i64, &CatalogRow> = right.rows().iter().map(|r| (r.target_id, r)).collect();

    let rows: Vec<CatalogRow> = left
        .rows()
        .iter()
        .filter_map(|l| {
            let r = by_id.get(&l.target_id)?;
            let mut merged = l.clone();
            for (col, val) in &r.extra {
                merged
                    .extra
                    .entry(col.clone())
                    .or_insert_with(|| val.clone());
            }
            Some(merged)
        })
        .collect();

    log::info!(
        "joined {} {} ({} rows) with {} rows on TARGETID: {} matches",
        left.tracer(),
        left.region(),
        left.len(),
        right.len(),
        rows.len()
    );

    let columns = left
        .column_names()
        .iter()
        .chain(right.column_names())
        .cloned()
        .collect::<Vec<_>>();
    CatalogTable::with_schema(left.tracer().clone(), left.region().clone(), columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Region, TracerType};

    #[test]
    fn test_join_keeps_left_order_and_drops_unmatched() {
        let left = CatalogTable::new(
            TracerType::ElgLopNotQso,
            Region::Ngc,
            vec![
                CatalogRow::new(3, 10.0, 1.0, 0.9)
                    .with("SPECTYPE", CellValue::String("GALAXY".into())),
                CatalogRow::new(1, 20.0, 2.0, 0.8)
                    .with("SPECTYPE", CellValue::String("GALAXY".into())),
                CatalogRow::new(2, 30.0, 3.0, 0.7)
                    .with("SPECTYPE", CellValue::String("GALAXY".into())),
            ],
        )
        .unwrap();
        // Right-hand redshift and SPECTYPE must not override the left values.
        let right = CatalogTable::new(
            TracerType::Other("fastspec".into()),
            Region::Other("hp00".into()),
            vec![
                CatalogRow::new(1, 0.0, 0.0, 5.0)
                    .with("HALPHA_FLUX", CellValue::Float(12.0))
                    .with("SPECTYPE", CellValue::String("QSO".into())),
                CatalogRow::new(3, 0.0, 0.0, 5.0)
                    .with("HALPHA_FLUX", CellValue::Float(4.0))
                    .with("SPECTYPE", CellValue::String("QSO".into())),
                CatalogRow::new(99, 0.0, 0.0, 5.0)
                    .with("HALPHA_FLUX", CellValue::Float(1.0))
                    .with("SPECTYPE", CellValue::String("QSO".into())),
            ],
        )
        .unwrap();

        let joined = inner_join_on_target_id(&left, &right).unwrap();
        let ids: Vec<i64> = joined.rows().iter().map(|r| r.target_id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(joined.tracer(), &TracerType::ElgLopNotQso);
        assert!(joined.has_column("HALPHA_FLUX"));
        assert_eq!(joined.rows()[0].z, 0.9);
        assert_eq!(joined.rows()[0].numeric("HALPHA_FLUX"), Some(4.0));
        assert_eq!(
            joined.rows()[1].value("SPECTYPE"),
            Some(CellValue::String("GALAXY".into()))
        );
    }

    #[test]
    fn test_join_without_matches_keeps_both_schemas() {
        let left = CatalogTable::new(
            TracerType::Lrg,
            Region::Sgc,
            vec![CatalogRow::new(1, 10.0, 1.0, 0.5).with("ZWARN", CellValue::Integer(0))],
        )
        .unwrap();
        let right = CatalogTable::new(
            TracerType::Other("fastspec".into()),
            Region::Other("all".into()),
            vec![CatalogRow::new(2, 0.0, 0.0, 0.5).with("HALPHA_FLUX", CellValue::Float(3.0))],
        )
        .unwrap();

        let joined = inner_join_on_target_id(&left, &right).unwrap();
        assert!(joined.is_empty());
        assert!(joined.has_column("ZWARN"));
        assert!(joined.has_column("HALPHA_FLUX"));
        assert_eq!(joined.numeric_column("HALPHA_FLUX").unwrap(), Vec::<Option<f64>>::new());
    }
}
