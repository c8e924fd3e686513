use anyhow::Result;
use geo::Area;
use log::debug;
use polars::prelude::*;

use crate::config::Thresholds;
use crate::store::{GeomStore, GeomTable, SpatialIndex};
use crate::types::{DistrictId, LayerKind};

/// Raw count aggregates, in report order.
pub const COUNT_COLUMNS: [&str; 5] = [
    "n_trees",
    "n_bldg",
    "n_res_bldg",
    "n_res_bldg_near_gs",
    "n_bldg_near_trees",
];

/// Summed crown area, in squared CRS units.
pub const CROWN_AREA: &str = "a_crown";

/// The aggregates of one district, before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistrictStats {
    pub n_trees: i64,
    pub n_bldg: i64,
    pub n_res_bldg: i64,
    pub n_res_bldg_near_gs: i64,
    pub n_bldg_near_trees: i64,
    pub a_crown: f64,
}

/// Compute the six aggregates from the district's loaded layers.
///
/// The two proximity counts flag each residential building against an
/// R-tree first and count the flags, so a building near several green
/// spaces still counts once.
pub fn aggregate_district(
    store: &GeomStore,
    thresholds: &Thresholds,
    green_space: &SpatialIndex,
) -> Result<DistrictStats> {
    let bldg = store.get(LayerKind::Buildings.to_str())?;
    let res_bldg = store.get(LayerKind::ResBuildings.to_str())?;
    let crowns = store.get(LayerKind::TreeCrowns.to_str())?;

    let crown_geoms = crowns.geometries()?;
    let crown_index = SpatialIndex::build(&crown_geoms);
    let a_crown: f64 = crown_geoms.iter().flatten().map(Area::unsigned_area).sum();

    let mut n_res_bldg_near_gs = 0i64;
    let mut n_bldg_near_trees = 0i64;
    for geom in res_bldg.geometries()?.iter().flatten() {
        if green_space.at_least(geom, thresholds.green_space_dist, 1) {
            n_res_bldg_near_gs += 1;
        }
        if crown_index.at_least(geom, thresholds.tree_dist, thresholds.min_tree_count as usize) {
            n_bldg_near_trees += 1;
        }
    }
    debug!(
        "aggregated {} crowns, {} buildings, {} residential",
        crowns.height(),
        bldg.height(),
        res_bldg.height()
    );

    Ok(DistrictStats {
        n_trees: crowns.height() as i64,
        n_bldg: bldg.height() as i64,
        n_res_bldg: res_bldg.height() as i64,
        n_res_bldg_near_gs,
        n_bldg_near_trees,
        a_crown,
    })
}

/// Add any missing stat columns as all-null; existing columns are left
/// alone, so the call is idempotent.
pub fn ensure_stat_columns(table: &mut GeomTable) -> Result<()> {
    let height = table.height();
    for name in COUNT_COLUMNS {
        if !table.has_column(name) {
            table
                .df_mut()
                .with_column(Series::full_null(name.into(), height, &DataType::Int64))?;
        }
    }
    if !table.has_column(CROWN_AREA) {
        table
            .df_mut()
            .with_column(Series::full_null(CROWN_AREA.into(), height, &DataType::Float64))?;
    }
    Ok(())
}

/// Write `stats` into every row of `table` whose identifier equals `id`.
pub fn write_stats(table: &mut GeomTable, id: DistrictId, stats: &DistrictStats) -> Result<()> {
    ensure_stat_columns(table)?;
    let ids = table.district_ids()?;
    let counts = [
        ("n_trees", stats.n_trees),
        ("n_bldg", stats.n_bldg),
        ("n_res_bldg", stats.n_res_bldg),
        ("n_res_bldg_near_gs", stats.n_res_bldg_near_gs),
        ("n_bldg_near_trees", stats.n_bldg_near_trees),
    ];
    for (name, value) in counts {
        set_i64(table.df_mut(), &ids, name, id.value(), value)?;
    }
    set_f64(table.df_mut(), &ids, CROWN_AREA, id.value(), stats.a_crown)?;
    Ok(())
}

fn set_i64(df: &mut DataFrame, ids: &[Option<i64>], name: &str, id: i64, value: i64) -> Result<()> {
    let mut values: Vec<Option<i64>> = df.column(name)?.i64()?.into_iter().collect();
    for (slot, row_id) in values.iter_mut().zip(ids) {
        if *row_id == Some(id) {
            *slot = Some(value);
        }
    }
    let ca: Int64Chunked = values.into_iter().collect();
    df.with_column(ca.with_name(name.into()).into_series())?;
    Ok(())
}

fn set_f64(df: &mut DataFrame, ids: &[Option<i64>], name: &str, id: i64, value: f64) -> Result<()> {
    let mut values: Vec<Option<f64>> = df.column(name)?.f64()?.into_iter().collect();
    for (slot, row_id) in values.iter_mut().zip(ids) {
        if *row_id == Some(id) {
            *slot = Some(value);
        }
    }
    let ca: Float64Chunked = values.into_iter().collect();
    df.with_column(ca.with_name(name.into()).into_series())?;
    Ok(())
}
