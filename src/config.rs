use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::{DistrictId, LayerKind};

/// Distance and count thresholds of the 3-30-300 rule legs implemented here:
/// at least `min_tree_count` crowns within `tree_dist`, and green space
/// within `green_space_dist`, of a residential building.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Maximum distance from a residential building to green space (CRS units).
    pub green_space_dist: f64,
    /// Maximum distance from a residential building to a tree crown (CRS units).
    pub tree_dist: f64,
    /// Minimum number of nearby crowns for a building to count as "near trees".
    pub min_tree_count: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            green_space_dist: 300.0,
            tree_dist: 15.0,
            min_tree_count: 3,
        }
    }
}

/// Immutable configuration for one pipeline run, passed by reference to
/// every component. Deserialized from a JSON file named on the command line.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Municipality name used as the file-name prefix, e.g. "oslo".
    pub municipality: String,

    /// Target spatial reference system (EPSG code); sources that differ are
    /// reprojected during conversion.
    pub epsg: u32,

    /// Districts to process. When absent, the sorted distinct identifiers
    /// of the district layer are used.
    #[serde(default)]
    pub districts: Option<Vec<DistrictId>>,

    #[serde(default)]
    pub thresholds: Thresholds,

    /// Raw municipality-wide GeoJSON layers.
    pub raw_dir: PathBuf,
    /// Interim parquet layers and per-district extracts.
    pub interim_dir: PathBuf,
    /// Final per-district and municipality-wide reports.
    pub reporting_dir: PathBuf,
}

impl RunConfig {
    /// Read and validate a run configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: RunConfig = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.municipality.is_empty() {
            anyhow::bail!("config: municipality must not be empty");
        }
        crate::common::proj4_for_epsg(self.epsg)
            .with_context(|| format!("config: unsupported target EPSG:{}", self.epsg))?;
        Ok(())
    }

    /// Raw municipality-wide layer, as delivered: `{raw}/{muni}_{layer}.geojson`.
    pub fn raw_layer_path(&self, kind: LayerKind) -> PathBuf {
        self.raw_dir
            .join(format!("{}_{}.geojson", self.municipality, kind.to_str()))
    }

    /// Interim municipality-wide layer: `{interim}/{muni}_{layer}.parquet`.
    pub fn interim_layer_path(&self, kind: LayerKind) -> PathBuf {
        self.interim_dir
            .join(format!("{}_{}.parquet", self.municipality, kind.to_str()))
    }

    /// Per-district extract: `{interim}/per_district/{layer}_{id}.parquet`.
    pub fn extract_path(&self, kind: LayerKind, id: DistrictId) -> PathBuf {
        self.interim_dir
            .join("per_district")
            .join(format!("{}_{}.parquet", kind.to_str(), id))
    }

    /// Per-district report path without extension:
    /// `{reporting}/by_district/districts_{id}`.
    pub fn district_report_base(&self, id: DistrictId) -> PathBuf {
        self.reporting_dir
            .join("by_district")
            .join(format!("districts_{id}"))
    }

    /// Municipality-wide report path without extension:
    /// `{reporting}/{muni}_canopy_stat`.
    pub fn municipality_report_base(&self) -> PathBuf {
        self.reporting_dir
            .join(format!("{}_canopy_stat", self.municipality))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_thresholds_follow_the_rule() {
        let t = Thresholds::default();
        assert_eq!(t.green_space_dist, 300.0);
        assert_eq!(t.tree_dist, 15.0);
        assert_eq!(t.min_tree_count, 3);
    }

    #[test]
    fn parses_minimal_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "municipality": "oslo",
                "epsg": 25832,
                "raw_dir": "{0}/raw",
                "interim_dir": "{0}/interim",
                "reporting_dir": "{0}/reporting"
            }}"#,
            dir.path().display()
        )
        .unwrap();

        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.municipality, "oslo");
        assert!(config.districts.is_none());
        assert_eq!(config.thresholds.min_tree_count, 3);
        assert!(config
            .extract_path(LayerKind::TreeCrowns, DistrictId::new(30101))
            .ends_with("per_district/tree_crowns_30101.parquet"));
    }

    #[test]
    fn rejects_unknown_epsg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{"municipality":"oslo","epsg":99999,"raw_dir":"a","interim_dir":"b","reporting_dir":"c"}"#,
        )
        .unwrap();
        assert!(RunConfig::from_file(&path).is_err());
    }
}
