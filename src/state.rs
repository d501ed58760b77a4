use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use desi_viewer::analysis::combine::combine_tracers;
use desi_viewer::analysis::density::DensityGrid;
use desi_viewer::analysis::emission::{EmissionAnalysis, EmissionLine};
use desi_viewer::analysis::projection::{project_rows, ProjectedPoint, ProjectionKind};
use desi_viewer::analysis::stats::RedshiftStats;
use desi_viewer::color::{Gradient, TracerColors};
use desi_viewer::config::ViewerConfig;
use desi_viewer::data::filter::{apply_filters, redshift_range, zwarn_ok, FilterSpec};
use desi_viewer::data::join::inner_join_on_target_id;
use desi_viewer::data::loader::{infer_labels, load_catalog};
use desi_viewer::data::model::{CatalogTable, Region, TracerType};

/// Tracer label given to FastSpecFit tables.
const FASTSPEC_LABEL: &str = "fastspec";
use desi_viewer::render;

/// Which figure the central panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Wedge,
    Emission(EmissionLine),
    Summary,
}

/// How wedge points are coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WedgeColoring {
    Redshift,
    Tracer,
}

/// A loaded LSS catalog (every row of the file) and whether it takes part in
/// the figures.
pub struct LoadedCatalog {
    pub table: CatalogTable,
    pub path: PathBuf,
    pub enabled: bool,
}

/// Cached wedge figure.
pub struct WedgeView {
    pub points: Vec<ProjectedPoint>,
    /// Tracer of each point, parallel to `points`.
    pub tracers: Vec<TracerType>,
    pub stats: RedshiftStats,
    pub counts: BTreeMap<TracerType, usize>,
}

/// Cached emission-line figure.
pub struct EmissionView {
    pub analysis: EmissionAnalysis,
    pub grid: DensityGrid,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,

    /// LSS clustering catalogs as read from disk.
    pub catalogs: Vec<LoadedCatalog>,

    /// FastSpecFit emission-line rows, merged over every file of the last
    /// load (None until the user loads some).
    pub fastspec: Option<CatalogTable>,

    pub projection: ProjectionKind,
    pub coloring: WedgeColoring,
    pub view: View,

    pub wedge: Option<WedgeView>,
    pub wedge_error: Option<String>,
    pub emission: BTreeMap<EmissionLine, std::result::Result<EmissionView, String>>,

    pub tracer_colors: TracerColors,
    pub redshift_gradient: Gradient,
    pub density_gradient: Gradient,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            catalogs: Vec::new(),
            fastspec: None,
            projection: ProjectionKind::default(),
            coloring: WedgeColoring::Redshift,
            view: View::Wedge,
            wedge: None,
            wedge_error: None,
            emission: BTreeMap::new(),
            tracer_colors: TracerColors::new(std::iter::empty()),
            redshift_gradient: Gradient::redshift(),
            density_gradient: Gradient::density(),
            status_message: None,
        }
    }

    /// Load one LSS catalog, labelled from its file name when possible.
    pub fn add_catalog(&mut self, path: &Path) -> Result<()> {
        let (tracer, region) = infer_labels(path).unwrap_or_else(|| {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("catalog")
                .to_string();
            log::warn!("Could not infer tracer/region from {}", path.display());
            (TracerType::Other(stem), Region::Other("unknown".into()))
        });
        let table = load_catalog(path, tracer, region)?;
        self.push_catalog(table, path.to_path_buf());
        Ok(())
    }

    /// Register an already loaded catalog.
    pub fn push_catalog(&mut self, table: CatalogTable, path: PathBuf) {
        log::info!(
            "Loaded {} {} ({} rows) from {}",
            table.tracer(),
            table.region(),
            table.len(),
            path.display()
        );
        self.catalogs.push(LoadedCatalog {
            table,
            path,
            enabled: true,
        });
        self.tracer_colors = TracerColors::new(self.loaded_tracers());
    }

    /// Distinct tracers of the loaded catalogs, in load order.
    fn loaded_tracers(&self) -> Vec<&TracerType> {
        let mut tracers: Vec<&TracerType> = Vec::new();
        for cat in &self.catalogs {
            if !tracers.contains(&cat.table.tracer()) {
                tracers.push(cat.table.tracer());
            }
        }
        tracers
    }

    /// Load FastSpecFit files (e.g. one per healpix) and merge them,
    /// replacing any previously loaded set.
    pub fn set_fastspec(&mut self, paths: &[PathBuf]) -> Result<()> {
        let tables = paths
            .iter()
            .map(|path| {
                load_catalog(
                    path,
                    TracerType::Other(FASTSPEC_LABEL.into()),
                    Region::Other("all".into()),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        self.set_fastspec_tables(tables)
    }

    /// Merge already loaded FastSpecFit tables. A TARGETID present in two
    /// of them is rejected.
    pub fn set_fastspec_tables(&mut self, tables: Vec<CatalogTable>) -> Result<()> {
        let merged = CatalogTable::concat(&tables).context("merging FastSpecFit tables")?;
        log::info!(
            "FastSpecFit: {} rows from {} table(s)",
            merged.len(),
            tables.len()
        );
        self.fastspec = Some(merged);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.catalogs.clear();
        self.fastspec = None;
        self.wedge = None;
        self.wedge_error = None;
        self.emission.clear();
        self.status_message = None;
    }

    fn filter_spec(&self) -> FilterSpec {
        let mut spec: FilterSpec = [redshift_range(self.config.z_min, self.config.z_max)]
            .into_iter()
            .collect();
        if self.config.require_zwarn_ok {
            let (col, p) = zwarn_ok();
            spec.insert(col, p);
        }
        spec
    }

    /// Recompute every cached figure from the loaded tables.
    pub fn recompute(&mut self) {
        match self.build_wedge() {
            Ok(view) => {
                self.wedge = view;
                self.wedge_error = None;
            }
            Err(e) => {
                log::error!("Wedge pipeline failed: {e:#}");
                self.wedge = None;
                self.wedge_error = Some(format!("{e:#}"));
            }
        }

        self.emission.clear();
        if self.fastspec.is_some() {
            for line in EmissionLine::ALL {
                let result = self.build_emission(line).map_err(|e| {
                    log::error!("{line} pipeline failed: {e:#}");
                    format!("{e:#}")
                });
                self.emission.insert(line, result);
            }
        }
    }

    /// Enabled catalogs merged per tracer, regions in load order, tracers in
    /// order of first appearance.
    fn merged_by_tracer(&self) -> Result<Vec<CatalogTable>> {
        let mut groups: Vec<Vec<CatalogTable>> = Vec::new();
        for cat in self.catalogs.iter().filter(|c| c.enabled) {
            match groups
                .iter()
                .position(|g| g[0].tracer() == cat.table.tracer())
            {
                Some(i) => groups[i].push(cat.table.clone()),
                None => groups.push(vec![cat.table.clone()]),
            }
        }
        groups
            .iter()
            .map(|group| {
                CatalogTable::concat(group)
                    .with_context(|| format!("merging {} catalogs", group[0].tracer()))
            })
            .collect()
    }

    /// Quality filter first, then keep at most `config.max_galaxies` rows.
    fn quality_sample(&self, table: &CatalogTable) -> Result<CatalogTable> {
        let filtered = apply_filters(table, &self.filter_spec()).with_context(|| {
            format!("applying quality filter to {} {}", table.tracer(), table.region())
        })?;
        let capped = filtered.head(self.config.max_galaxies);
        if capped.len() < filtered.len() {
            log::info!(
                "Keeping first {} of {} {} rows passing the quality filter",
                capped.len(),
                filtered.len(),
                table.tracer()
            );
        }
        Ok(capped)
    }

    fn build_wedge(&self) -> Result<Option<WedgeView>> {
        let merged = self.merged_by_tracer()?;
        if merged.is_empty() {
            return Ok(None);
        }
        let samples = merged
            .iter()
            .map(|t| self.quality_sample(t))
            .collect::<Result<Vec<_>>>()?;

        let sample = combine_tracers(&samples, self.config.combined_total)
            .context("combining tracer samples")?;
        let points = project_rows(sample.rows(), self.projection);
        let stats = RedshiftStats::from_values(&sample.redshifts())
            .context("summarising redshifts")?;
        let tracers = sample.entries().iter().map(|e| e.tracer.clone()).collect();

        log::info!(
            "Wedge: {} galaxies, z = {:.3} ± {:.3} ({:.3} – {:.3})",
            stats.count,
            stats.mean,
            stats.std_dev,
            stats.min,
            stats.max
        );

        Ok(Some(WedgeView {
            points,
            tracers,
            stats,
            counts: sample.counts(),
        }))
    }

    fn build_emission(&self, line: EmissionLine) -> Result<EmissionView> {
        let fastspec = self
            .fastspec
            .as_ref()
            .context("no FastSpecFit table loaded")?;

        // Galaxies of the first enabled tracer (all its regions), when there is one.
        let source = match self.merged_by_tracer()?.into_iter().next() {
            Some(galaxies) => inner_join_on_target_id(&galaxies, fastspec)
                .context("joining galaxies with FastSpecFit")?,
            None => fastspec.clone(),
        };
        let sample = self.quality_sample(&source)?;
        let analysis = EmissionAnalysis::run(&sample, line, self.config.min_snr)
            .with_context(|| format!("{line} vs SFR"))?;
        let grid = DensityGrid::build(
            &analysis.log_sfr,
            &analysis.log_flux,
            self.config.density_bins,
            None,
        )
        .context("binning density grid")?;
        Ok(EmissionView { analysis, grid })
    }

    /// Colour of each wedge point under the current colouring.
    pub fn wedge_point_colors(&self, wedge: &WedgeView) -> Vec<eframe::egui::Color32> {
        match self.coloring {
            WedgeColoring::Redshift => wedge
                .points
                .iter()
                .map(|p| {
                    self.redshift_gradient
                        .sample_range(p.z, wedge.stats.min, wedge.stats.max)
                })
                .collect(),
            WedgeColoring::Tracer => wedge
                .tracers
                .iter()
                .map(|t| self.tracer_colors.color_for(t))
                .collect(),
        }
    }

    /// Write the figure currently on screen to a PNG file.
    pub fn export_current(&self, path: &Path) -> Result<()> {
        let size = self.config.export_size_px;
        match self.view {
            View::Wedge => {
                let wedge = self.wedge.as_ref().context("no wedge figure to export")?;
                let colors = self.wedge_point_colors(wedge);
                let points: Vec<_> = wedge
                    .points
                    .iter()
                    .zip(colors)
                    .map(|(p, c)| (p.x, p.y, c))
                    .collect();
                render::export_points_png(path, &points, size, true)
            }
            View::Emission(line) => {
                let view = match self.emission.get(&line) {
                    Some(Ok(view)) => view,
                    _ => anyhow::bail!("no {line} figure to export"),
                };
                render::export_density_png(path, &view.grid, &self.density_gradient, size)
            }
            View::Summary => anyhow::bail!("the summary table cannot be exported as an image"),
        }
    }

    /// Default file name for exporting the current view.
    pub fn export_file_name(&self) -> &'static str {
        match self.view {
            View::Wedge => "galaxy_wedge.png",
            View::Emission(EmissionLine::Halpha) => "halpha_sfr.png",
            View::Emission(EmissionLine::Oii3727) => "oii_sfr.png",
            View::Summary => "summary.png",
        }
    }
}
