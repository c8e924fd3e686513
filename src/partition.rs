use anyhow::{Context, Result};
use log::{info, warn};

use crate::common;
use crate::config::RunConfig;
use crate::store::GeomTable;
use crate::types::{DistrictId, LayerKind};

/// What a partition run did, so callers can tell work done from work
/// skipped as already present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionSummary {
    /// Files written this run (interim layers and extracts).
    pub written: usize,
    /// Files already on disk and left untouched.
    pub skipped_existing: usize,
    /// Layers skipped entirely (missing source or identifier column).
    pub skipped_layers: usize,
}

/// The districts to process: the configured list, or the sorted distinct
/// identifiers of the interim district layer when none is configured.
pub fn district_list(cfg: &RunConfig) -> Result<Vec<DistrictId>> {
    if let Some(ids) = &cfg.districts {
        return Ok(ids.clone());
    }
    let path = cfg.interim_layer_path(LayerKind::Districts);
    let mut table = GeomTable::read_parquet(&path, Some(cfg.epsg))
        .with_context(|| format!("failed to read district layer: {}", path.display()))?;
    table.canonicalize_district_ids()?;
    table.distinct_districts()
}

/// Splits municipality-wide layers into per-district parquet extracts,
/// converting raw GeoJSON to interim parquet along the way. Both steps
/// skip outputs that already exist, so a rerun is a no-op.
pub struct Partitioner<'a> {
    cfg: &'a RunConfig,
}

impl<'a> Partitioner<'a> {
    pub fn new(cfg: &'a RunConfig) -> Self {
        Self { cfg }
    }

    pub fn run(&self) -> Result<PartitionSummary> {
        common::require_dir_exists(&self.cfg.raw_dir)?;
        let mut summary = PartitionSummary::default();
        self.convert_layers(&mut summary)?;
        let districts = district_list(self.cfg)?;
        info!("partitioning {} layers across {} districts",
            LayerKind::partitioned().len(), districts.len());
        self.extract_layers(&districts, &mut summary)?;
        Ok(summary)
    }

    /// Convert each raw GeoJSON layer to an interim parquet file in the
    /// target CRS. A GeoJSON source without a crs member is taken as WGS84.
    fn convert_layers(&self, summary: &mut PartitionSummary) -> Result<()> {
        common::ensure_dir_exists(&self.cfg.interim_dir)?;
        for kind in LayerKind::all() {
            let raw = self.cfg.raw_layer_path(kind);
            let interim = self.cfg.interim_layer_path(kind);
            if interim.exists() {
                summary.skipped_existing += 1;
                continue;
            }
            if !raw.exists() {
                warn!("raw layer '{}' not found at {}; skipping",
                    kind.to_str(), raw.display());
                summary.skipped_layers += 1;
                continue;
            }
            let mut table = GeomTable::read_geojson(&raw)
                .with_context(|| format!("failed to read raw layer: {}", raw.display()))?;
            if table.epsg().is_none() {
                table.set_epsg(4326);
            }
            table.reproject(self.cfg.epsg)?;
            table.write_parquet(&interim)?;
            summary.written += 1;
        }
        Ok(())
    }

    /// Write one extract per (layer, district) by attribute equality on the
    /// canonical district identifier.
    fn extract_layers(
        &self,
        districts: &[DistrictId],
        summary: &mut PartitionSummary,
    ) -> Result<()> {
        common::ensure_dir_exists(&self.cfg.interim_dir.join("per_district"))?;
        for kind in LayerKind::partitioned() {
            let interim = self.cfg.interim_layer_path(kind);
            if !interim.exists() {
                warn!("interim layer '{}' not found at {}; skipping",
                    kind.to_str(), interim.display());
                summary.skipped_layers += 1;
                continue;
            }
            let mut table = GeomTable::read_parquet(&interim, Some(self.cfg.epsg))?;
            if !table.canonicalize_district_ids()? {
                summary.skipped_layers += 1;
                continue;
            }
            for &id in districts {
                let path = self.cfg.extract_path(kind, id);
                if path.exists() {
                    summary.skipped_existing += 1;
                    continue;
                }
                table.filter_by_district(id)?.write_parquet(&path)?;
                summary.written += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, Geometry};
    use polars::prelude::*;
    use std::path::Path;

    use crate::types::DISTRICT_ID;

    fn write_raw_layer(cfg: &RunConfig, kind: LayerKind, codes: &[&str]) {
        let df = DataFrame::new(vec![Column::new(
            DISTRICT_ID.into(),
            codes.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        )])
        .unwrap();
        let mut table = GeomTable::new(df, Some(25832));
        let geoms: Vec<Option<Geometry<f64>>> = (0..codes.len())
            .map(|i| Some(Geometry::Point(point!(x: i as f64, y: 0.0))))
            .collect();
        table.set_geometries(&geoms).unwrap();
        table.write_geojson(&cfg.raw_layer_path(kind)).unwrap();
    }

    fn test_config(root: &Path) -> RunConfig {
        let cfg = RunConfig {
            municipality: "oslo".to_string(),
            epsg: 25832,
            districts: None,
            thresholds: Default::default(),
            raw_dir: root.join("raw"),
            interim_dir: root.join("interim"),
            reporting_dir: root.join("reporting"),
        };
        common::ensure_dir_exists(&cfg.raw_dir).unwrap();
        cfg
    }

    #[test]
    fn partition_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());
        for kind in LayerKind::partitioned() {
            write_raw_layer(&cfg, kind, &["00302421", "302422"]);
        }

        let first = Partitioner::new(&cfg).run().unwrap();
        // 4 interim layers + 4 layers x 2 districts.
        assert_eq!(first.written, 12);
        assert_eq!(first.skipped_existing, 0);

        let extract = cfg.extract_path(LayerKind::Districts, DistrictId::new(302421));
        let bytes_before = std::fs::read(&extract).unwrap();

        let second = Partitioner::new(&cfg).run().unwrap();
        assert_eq!(second.written, 0);
        assert_eq!(second.skipped_existing, 12);
        assert_eq!(std::fs::read(&extract).unwrap(), bytes_before);
    }

    #[test]
    fn extracts_filter_rows_by_district() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = test_config(dir.path());
        for kind in LayerKind::partitioned() {
            write_raw_layer(&cfg, kind, &["00302421", "302422", "00302421"]);
        }
        Partitioner::new(&cfg).run().unwrap();

        let extract = cfg.extract_path(LayerKind::ResBuildings, DistrictId::new(302421));
        let table = GeomTable::read_parquet(&extract, Some(cfg.epsg)).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(
            table.district_ids().unwrap(),
            vec![Some(302421), Some(302421)]
        );
    }

    #[test]
    fn configured_district_list_wins_over_derivation() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config(dir.path());
        cfg.districts = Some(vec![DistrictId::new(1), DistrictId::new(2)]);
        assert_eq!(
            district_list(&cfg).unwrap(),
            vec![DistrictId::new(1), DistrictId::new(2)]
        );
    }
}
