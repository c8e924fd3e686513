pub mod aggregate;
pub mod export;
pub mod loader;
pub mod merge;
pub mod normalize;

use anyhow::Result;
use log::{info, warn};

use crate::config::RunConfig;
use crate::partition::district_list;
use crate::store::{GeomStore, GeomTable, SpatialIndex};
use crate::types::{DistrictId, LayerKind};

/// Compute, normalize and export the per-district reports, then merge them
/// into the municipality-wide one. Districts are processed sequentially,
/// each in its own store session; the municipality-wide green-space layer
/// is indexed once and shared read-only.
pub fn run(cfg: &RunConfig) -> Result<()> {
    let districts = district_list(cfg)?;
    let green_space = green_space_index(cfg)?;
    info!("computing statistics for {} districts", districts.len());

    for &id in &districts {
        process_district(cfg, id, &green_space)?;
    }
    merge::run(cfg, &districts)
}

/// One district: load extracts, aggregate, normalize, export.
pub fn process_district(
    cfg: &RunConfig,
    id: DistrictId,
    green_space: &SpatialIndex,
) -> Result<()> {
    let mut store = GeomStore::new();
    loader::load_district(&mut store, cfg, id)?;

    let stats = aggregate::aggregate_district(&store, &cfg.thresholds, green_space)?;
    let districts = store.get_mut(LayerKind::Districts.to_str())?;
    if districts.epsg().is_none() {
        // A placeholder stands in for a missing extract; give it the run's
        // CRS so the (empty) GeoJSON export still carries one.
        districts.set_epsg(cfg.epsg);
    }
    aggregate::write_stats(districts, id, &stats)?;
    normalize::normalize(districts)?;
    export::export_report(districts, &cfg.district_report_base(id))
}

/// Index the municipality-wide green-space layer, or an empty index when
/// the layer is absent (every "near green space" count then comes out zero).
pub fn green_space_index(cfg: &RunConfig) -> Result<SpatialIndex> {
    let path = cfg.interim_layer_path(LayerKind::GreenSpace);
    if !path.exists() {
        warn!("green-space layer {} is missing; proximity counts will be zero", path.display());
        return Ok(SpatialIndex::build(&[]));
    }
    let table = GeomTable::read_parquet(&path, Some(cfg.epsg))?;
    Ok(SpatialIndex::build(&table.geometries()?))
}
