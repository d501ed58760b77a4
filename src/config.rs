use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "DESI_VIEWER_CONFIG";
/// Config file picked up from the working directory when the variable is unset.
pub const DEFAULT_CONFIG_FILE: &str = "desi-viewer.json";

/// Viewer settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Rows kept per tracer once the quality filter has run (first N in file order).
    pub max_galaxies: usize,
    pub z_min: f64,
    pub z_max: f64,
    /// Only keep rows with `ZWARN == 0` (needs a ZWARN column).
    pub require_zwarn_ok: bool,
    /// Requested size of the combined multi-tracer wedge sample.
    pub combined_total: usize,
    pub min_snr: f64,
    pub density_bins: usize,
    /// Edge length of exported PNG figures, pixels.
    pub export_size_px: u32,
    /// Starting directory of the file dialogs.
    pub data_dir: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_galaxies: 50_000,
            z_min: 0.0,
            z_max: 1.5,
            require_zwarn_ok: false,
            combined_total: 48_000,
            min_snr: crate::analysis::emission::DEFAULT_MIN_SNR,
            density_bins: 50,
            export_size_px: 1200,
            data_dir: None,
        }
    }
}

impl ViewerConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// `$DESI_VIEWER_CONFIG`, else `./desi-viewer.json` if present, else defaults.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            log::info!("Using config from ${CONFIG_ENV} = {path}");
            return Self::from_path(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            log::info!("Using config {DEFAULT_CONFIG_FILE}");
            return Self::from_path(local);
        }
        log::debug!("No config file, using defaults");
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "z_max": 1.1, "combined_total": 9000 }}"#).unwrap();
        let cfg = ViewerConfig::from_path(file.path()).unwrap();
        assert_eq!(cfg.z_max, 1.1);
        assert_eq!(cfg.combined_total, 9000);
        assert_eq!(cfg.max_galaxies, 50_000);
        assert_eq!(cfg.min_snr, 3.0);
        assert_eq!(cfg.data_dir, None);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(ViewerConfig::from_path(file.path()).is_err());
    }
}
