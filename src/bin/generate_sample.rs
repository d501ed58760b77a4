//! Writes demo catalogs for trying the viewer without the DESI download.
//!
//! Every value is drawn from a seeded generator. The files go to
//! `demo_data/` and must never be mistaken for survey data.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Redshift distribution per tracer: (label, mean z, spread).
const TRACERS: [(&str, f64, f64); 3] = [
    ("ELG_LOPnotqso", 1.1, 0.2),
    ("LRG", 0.7, 0.15),
    ("BGS_BRIGHT", 0.25, 0.1),
];
const ROWS_PER_TRACER: usize = 20_000;

struct Galaxy {
    target_id: i64,
    ra: f64,
    dec: f64,
    z: f64,
}

fn write_parquet(path: &Path, fields: Vec<Field>, columns: Vec<ArrayRef>) -> Result<()> {
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Normal distribution with a fixed, valid spread.
fn normal(mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    Normal::new(mean, std_dev).with_context(|| format!("normal({mean}, {std_dev})"))
}

fn write_lss(dir: &Path, tracer: &str, galaxies: &[Galaxy], rng: &mut StdRng) -> Result<()> {
    let path = dir.join(format!("{tracer}_NGC_clustering.dat.parquet"));
    let n = galaxies.len();
    let zwarn: Vec<i32> = (0..n)
        .map(|_| if rng.gen_bool(0.05) { 4 } else { 0 })
        .collect();
    let weights = normal(1.0, 0.05)?;
    let weight: Vec<f64> = (0..n).map(|_| weights.sample(rng)).collect();

    write_parquet(
        &path,
        vec![
            Field::new("TARGETID", DataType::Int64, false),
            Field::new("RA", DataType::Float64, false),
            Field::new("DEC", DataType::Float64, false),
            Field::new("Z", DataType::Float64, false),
            Field::new("ZWARN", DataType::Int32, false),
            Field::new("WEIGHT_SYSTOT", DataType::Float64, false),
        ],
        vec![
            Arc::new(Int64Array::from_iter_values(galaxies.iter().map(|g| g.target_id))),
            Arc::new(Float64Array::from_iter_values(galaxies.iter().map(|g| g.ra))),
            Arc::new(Float64Array::from_iter_values(galaxies.iter().map(|g| g.dec))),
            Arc::new(Float64Array::from_iter_values(galaxies.iter().map(|g| g.z))),
            Arc::new(Int32Array::from(zwarn)),
            Arc::new(Float64Array::from(weight)),
        ],
    )?;
    println!("Wrote {n} demo {tracer} galaxies to {}", path.display());
    Ok(())
}

/// Emission-line table for `galaxies`: log flux follows log SFR with scatter,
/// dimmed by `2 log10(1 + z)`. Fluxes are in 1e-17 erg s⁻¹ cm⁻².
fn write_fastspec(dir: &Path, galaxies: &[Galaxy], rng: &mut StdRng) -> Result<()> {
    let path = dir.join("demo_fastspec.parquet");
    let mut cols: Vec<Vec<f64>> = vec![Vec::with_capacity(galaxies.len()); 6];
    let log_sfrs = normal(0.5, 0.8)?;
    // (log flux offset, scatter, first column) for Hα then [OII].
    let lines = [(1.2, normal(0.0, 0.3)?, 0usize), (0.8, normal(0.0, 0.4)?, 3)];

    for g in galaxies {
        let log_sfr = log_sfrs.sample(rng);
        let dimming = 2.0 * (1.0 + g.z).log10();
        for &(offset, scatter, base) in &lines {
            let log_flux = log_sfr + offset - dimming + scatter.sample(rng);
            let flux = 10f64.powf(log_flux);
            let ivar = 10f64.powf(rng.gen_range(-2.0f64..2.0) - 0.5 * log_flux);
            cols[base].push(flux);
            cols[base + 1].push(ivar);
            cols[base + 2].push(10f64.powf(log_sfr));
        }
    }

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(galaxies.iter().map(|g| g.target_id))),
        Arc::new(Float64Array::from_iter_values(galaxies.iter().map(|g| g.ra))),
        Arc::new(Float64Array::from_iter_values(galaxies.iter().map(|g| g.dec))),
        Arc::new(Float64Array::from_iter_values(galaxies.iter().map(|g| g.z))),
    ];
    columns.extend(cols.into_iter().map(|c| Arc::new(Float64Array::from(c)) as ArrayRef));

    write_parquet(
        &path,
        vec![
            Field::new("TARGETID", DataType::Int64, false),
            Field::new("RA", DataType::Float64, false),
            Field::new("DEC", DataType::Float64, false),
            Field::new("Z", DataType::Float64, false),
            Field::new("HALPHA_FLUX", DataType::Float64, false),
            Field::new("HALPHA_FLUX_IVAR", DataType::Float64, false),
            Field::new("SFR_HALPHA", DataType::Float64, false),
            Field::new("OII_3727_FLUX", DataType::Float64, false),
            Field::new("OII_3727_FLUX_IVAR", DataType::Float64, false),
            Field::new("SFR_OII", DataType::Float64, false),
        ],
        columns,
    )?;
    println!("Wrote {} demo FastSpecFit rows to {}", galaxies.len(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    let dir = Path::new("demo_data");
    std::fs::create_dir_all(dir).context("creating demo_data/")?;
    let mut rng = StdRng::seed_from_u64(42);

    let mut next_id: i64 = 39_627_000_000_000_000;
    for (i, &(tracer, z_mean, z_std)) in TRACERS.iter().enumerate() {
        let redshifts = normal(z_mean, z_std)?;
        let galaxies: Vec<Galaxy> = (0..ROWS_PER_TRACER)
            .map(|_| {
                next_id += 1;
                Galaxy {
                    target_id: next_id,
                    ra: rng.gen_range(130.0..230.0),
                    dec: rng.gen_range(-5.0..60.0),
                    z: redshifts.sample(&mut rng).clamp(0.001, 1.5),
                }
            })
            .collect();

        write_lss(dir, tracer, &galaxies, &mut rng)?;
        if i == 0 {
            write_fastspec(dir, &galaxies[..galaxies.len() / 2], &mut rng)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use desi_viewer::data::loader::load_catalog;
    use desi_viewer::data::model::{Region, TracerType};

    fn galaxies(seed: u64) -> Vec<Galaxy> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..200)
            .map(|i| Galaxy {
                target_id: i,
                ra: rng.gen_range(130.0..230.0),
                dec: rng.gen_range(-5.0..60.0),
                z: rng.gen_range(0.1..1.4),
            })
            .collect()
    }

    #[test]
    fn test_demo_files_load_and_repeat_per_seed() {
        let dir = tempfile::tempdir().unwrap();
        let sample = galaxies(7);
        assert_eq!(
            sample.iter().map(|g| g.z).collect::<Vec<_>>(),
            galaxies(7).iter().map(|g| g.z).collect::<Vec<_>>()
        );

        let mut rng = StdRng::seed_from_u64(42);
        write_lss(dir.path(), "LRG", &sample, &mut rng).unwrap();
        write_fastspec(dir.path(), &sample[..100], &mut rng).unwrap();

        let lss = load_catalog(
            &dir.path().join("LRG_NGC_clustering.dat.parquet"),
            TracerType::Lrg,
            Region::Ngc,
        )
        .unwrap();
        assert_eq!(lss.len(), 200);
        assert!(lss.has_column("ZWARN") && lss.has_column("WEIGHT"));

        let fastspec = load_catalog(
            &dir.path().join("demo_fastspec.parquet"),
            TracerType::Other("fastspec".into()),
            Region::Other("all".into()),
        )
        .unwrap();
        assert_eq!(fastspec.len(), 100);
        let flux = fastspec.numeric_column("OII_3727_FLUX").unwrap();
        assert!(flux.iter().all(|f| f.is_some_and(|v| v > 0.0)));
    }
}
