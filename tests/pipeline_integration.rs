use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use desi_viewer::analysis::combine::combine_tracers;
use desi_viewer::analysis::emission::{EmissionAnalysis, EmissionLine, DEFAULT_MIN_SNR};
use desi_viewer::analysis::projection::{project_rows, ProjectionKind};
use desi_viewer::analysis::stats::correlate_columns;
use desi_viewer::data::filter::{apply_filters, redshift_range, zwarn_ok, FilterSpec, Predicate};
use desi_viewer::data::join::inner_join_on_target_id;
use desi_viewer::data::loader::load_catalog;
use desi_viewer::data::model::{CatalogRow, CatalogTable, CellValue, Region, TracerType};

fn tracer_table(tracer: TracerType, n: usize, id_base: i64, rng: &mut StdRng) -> CatalogTable {
    let rows = (0..n)
        .map(|i| CatalogRow::new(id_base + i as i64, rng.gen_range(0.0..360.0), rng.gen_range(-10.0..70.0), 0.5))
        .collect();
    CatalogTable::new(tracer, Region::Ngc, rows).unwrap()
}

#[test]
fn test_three_tracers_combined_onto_one_circle() {
    let mut rng = StdRng::seed_from_u64(7);
    let tables = vec![
        tracer_table(TracerType::ElgLopNotQso, 20_000, 0, &mut rng),
        tracer_table(TracerType::Lrg, 20_000, 1_000_000, &mut rng),
        tracer_table(TracerType::BgsBright, 20_000, 2_000_000, &mut rng),
    ];

    let sample = combine_tracers(&tables, 48_000).unwrap();
    assert_eq!(sample.len(), 48_000);
    for count in sample.counts().values() {
        assert_eq!(*count, 16_000);
    }

    let points = project_rows(sample.rows(), ProjectionKind::Polar);
    assert_eq!(points.len(), 48_000);
    for p in &points {
        let r = (p.x * p.x + p.y * p.y).sqrt();
        assert!((r - 0.5).abs() < 1e-12, "radius {r}");
        assert_eq!(p.z, 0.5);
    }
}

#[test]
fn test_sfr_tracks_oii_flux() {
    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let rows: Vec<CatalogRow> = (0..2_000)
        .map(|i| {
            let flux: f64 = rng.gen_range(1.0..50.0);
            let sfr = 2.0 * flux + noise.sample(&mut rng);
            CatalogRow::new(i, 180.0, 30.0, 0.9)
                .with("OII_3727_FLUX", CellValue::Float(flux))
                .with("SFR_OII", CellValue::Float(sfr))
        })
        .collect();
    let table = CatalogTable::new(TracerType::ElgLopNotQso, Region::Ngc, rows).unwrap();

    let summary = correlate_columns(&table, "OII_3727_FLUX", "SFR_OII").unwrap();
    assert_eq!(summary.n, 2_000);
    assert!(summary.coefficient > 0.9, "r = {}", summary.coefficient);
}

#[test]
fn test_filtered_rows_satisfy_every_predicate() {
    let mut rng = StdRng::seed_from_u64(3);
    for trial in 0..20 {
        let rows: Vec<CatalogRow> = (0..500)
            .map(|i| {
                CatalogRow::new(i, rng.gen_range(0.0..360.0), 0.0, rng.gen_range(0.0..2.0))
                    .with("ZWARN", CellValue::Integer(if rng.gen_bool(0.2) { 4 } else { 0 }))
                    .with("HALPHA_FLUX", CellValue::Float(rng.gen_range(-5.0..5.0)))
            })
            .collect();
        let table = CatalogTable::new(TracerType::Lrg, Region::Sgc, rows).unwrap();

        let z_max = 0.5 + trial as f64 * 0.05;
        let mut spec: FilterSpec = [redshift_range(0.1, z_max), zwarn_ok()].into_iter().collect();
        spec.insert("HALPHA_FLUX".into(), Predicate::Positive);

        let out = apply_filters(&table, &spec).unwrap();
        for row in out.rows() {
            for (col, p) in &spec {
                assert!(p.matches(row.value(col).as_ref()), "{col} failed on {row:?}");
            }
        }
        // Kept rows appear in their original order and nothing passing was lost.
        let kept: Vec<i64> = out.rows().iter().map(|r| r.target_id).collect();
        let expected: Vec<i64> = table
            .rows()
            .iter()
            .filter(|r| spec.iter().all(|(c, p)| p.matches(r.value(c).as_ref())))
            .map(|r| r.target_id)
            .collect();
        assert_eq!(kept, expected);
    }
}

fn write_parquet(path: &std::path::Path, fields: Vec<Field>, columns: Vec<ArrayRef>) {
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    let file = std::fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

#[test]
fn test_parquet_catalogs_through_emission_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let lss_path = dir.path().join("ELG_LOPnotqso_NGC_clustering.dat.parquet");
    let fs_path = dir.path().join("fastspec.parquet");

    let n = 1_500;
    let ids: Vec<i64> = (0..n).map(|i| 39_000_000 + i).collect();
    let mut rng = StdRng::seed_from_u64(11);
    let z: Vec<f64> = (0..n).map(|_| rng.gen_range(0.6..1.6)).collect();

    write_parquet(
        &lss_path,
        vec![
            Field::new("TARGETID", DataType::Int64, false),
            Field::new("RA", DataType::Float64, false),
            Field::new("DEC", DataType::Float64, false),
            Field::new("Z", DataType::Float64, false),
            Field::new("SPECTYPE", DataType::Utf8, false),
        ],
        vec![
            Arc::new(Int64Array::from(ids.clone())),
            Arc::new(Float64Array::from(vec![150.0; n as usize])),
            Arc::new(Float64Array::from(vec![2.0; n as usize])),
            Arc::new(Float64Array::from(z)),
            Arc::new(StringArray::from(vec!["GALAXY"; n as usize])),
        ],
    );

    // Emission rows exist for every other galaxy only.
    let scatter = Normal::new(0.0, 0.1).unwrap();
    let fs_ids: Vec<i64> = ids.iter().copied().step_by(2).collect();
    let m = fs_ids.len();
    let log_sfr: Vec<f64> = (0..m).map(|_| rng.gen_range(-1.5..1.5)).collect();
    let flux: Vec<f64> = log_sfr
        .iter()
        .map(|l| 10f64.powf(l + 1.0 + scatter.sample(&mut rng)))
        .collect();
    write_parquet(
        &fs_path,
        vec![
            Field::new("TARGETID", DataType::Int64, false),
            Field::new("RA", DataType::Float64, false),
            Field::new("DEC", DataType::Float64, false),
            Field::new("Z", DataType::Float64, false),
            Field::new("OII_3727_FLUX", DataType::Float64, false),
            Field::new("OII_3727_FLUX_IVAR", DataType::Float64, false),
            Field::new("SFR_OII", DataType::Float64, false),
        ],
        vec![
            Arc::new(Int64Array::from(fs_ids)),
            Arc::new(Float64Array::from(vec![150.0; m])),
            Arc::new(Float64Array::from(vec![2.0; m])),
            Arc::new(Float64Array::from(vec![1.0; m])),
            Arc::new(Float64Array::from(flux)),
            Arc::new(Float64Array::from(vec![100.0; m])),
            Arc::new(Float64Array::from(log_sfr.iter().map(|l| 10f64.powf(*l)).collect::<Vec<_>>())),
        ],
    );

    let galaxies = load_catalog(&lss_path, TracerType::ElgLopNotQso, Region::Ngc).unwrap();
    let fastspec = load_catalog(&fs_path, TracerType::Other("fastspec".into()), Region::Other("all".into())).unwrap();
    assert_eq!(galaxies.len(), n as usize);

    let joined = inner_join_on_target_id(&galaxies, &fastspec).unwrap();
    assert_eq!(joined.len(), m);

    let spec: FilterSpec = [redshift_range(0.0, 1.5)].into_iter().collect();
    let filtered = apply_filters(&joined, &spec).unwrap();
    assert!(filtered.rows().iter().all(|r| r.z <= 1.5));
    assert!(filtered.len() > 1_000 / 2);

    let analysis = EmissionAnalysis::run(&filtered, EmissionLine::Oii3727, DEFAULT_MIN_SNR).unwrap();
    assert!(analysis.summary.coefficient > 0.95, "r = {}", analysis.summary.coefficient);
    assert_eq!(analysis.log_sfr.len(), analysis.summary.n);

    // No Hα columns anywhere: the other pipeline fails instead of inventing data.
    assert!(EmissionAnalysis::run(&filtered, EmissionLine::Halpha, DEFAULT_MIN_SNR).is_err());
}
