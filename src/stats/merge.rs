use std::collections::HashMap;

use anyhow::{anyhow, bail, Result};
use geo::Geometry;
use log::{info, warn};
use polars::prelude::*;

use super::{export, normalize};
use crate::common;
use crate::config::RunConfig;
use crate::store::GeomTable;
use crate::types::{DistrictId, LayerKind, GEOMETRY};

/// Concatenate the per-district reports into one municipality-wide report.
///
/// Per-district CSVs carry geometry only as hex text, so the merged table
/// gets its geometry re-attached from the municipality-wide district layer
/// before re-normalizing and exporting.
pub fn run(cfg: &RunConfig, districts: &[DistrictId]) -> Result<()> {
    let mut frames: Vec<DataFrame> = Vec::new();
    for &id in districts {
        let path = cfg.district_report_base(id).with_extension("csv");
        if !path.exists() {
            warn!("district report {} is missing; skipping", path.display());
            continue;
        }
        let mut df = common::read_csv(&path)?;
        if df.column(GEOMETRY).is_ok() {
            df = df.drop(GEOMETRY)?;
        }
        // A district whose extracts were all absent reports zero rows;
        // a header-only CSV carries no usable dtypes either.
        if df.height() == 0 {
            info!("district report {} has no rows; skipping", path.display());
            continue;
        }
        frames.push(df);
    }
    if frames.is_empty() {
        bail!("no district report rows found to merge");
    }
    info!("merging {} of {} district reports", frames.len(), districts.len());
    let df = concat_reports(frames)?;

    let mut table = GeomTable::new(df, Some(cfg.epsg));
    table.canonicalize_district_ids()?;
    attach_geometry(&mut table, cfg)?;
    normalize::normalize(&mut table)?;
    export::export_report(&table, &cfg.municipality_report_base())
}

/// Stack report frames that may disagree on columns: a district backed by
/// placeholder extracts reports fewer of them. Frames are aligned to the
/// union of their columns, null-filling the gaps; normalization coalesces
/// the nulls afterwards.
fn concat_reports(frames: Vec<DataFrame>) -> Result<DataFrame> {
    let mut schema: Vec<(PlSmallStr, DataType)> = Vec::new();
    for df in &frames {
        for col in df.get_columns() {
            if !schema.iter().any(|(name, _)| name == col.name()) {
                schema.push((col.name().clone(), col.dtype().clone()));
            }
        }
    }

    let mut merged: Option<DataFrame> = None;
    for mut df in frames {
        for (name, dtype) in &schema {
            if df.column(name).is_err() {
                df.with_column(Series::full_null(name.clone(), df.height(), dtype))?;
            }
        }
        let df = df.select(schema.iter().map(|(name, _)| name.clone()))?;
        merged = Some(match merged {
            Some(acc) => acc.vstack(&df)?,
            None => df,
        });
    }
    merged.ok_or_else(|| anyhow!("no district reports found to merge"))
}

/// Look each row's geometry up in the district layer by canonical id.
fn attach_geometry(table: &mut GeomTable, cfg: &RunConfig) -> Result<()> {
    let path = cfg.interim_layer_path(LayerKind::Districts);
    if !path.exists() {
        warn!("district layer {} is missing; merged report keeps no geometry", path.display());
        return Ok(());
    }
    let mut layer = GeomTable::read_parquet(&path, Some(cfg.epsg))?;
    layer.canonicalize_district_ids()?;

    let mut by_id: HashMap<i64, Geometry<f64>> = HashMap::new();
    for (id, geom) in layer.district_ids()?.into_iter().zip(layer.geometries()?) {
        if let (Some(id), Some(geom)) = (id, geom) {
            by_id.entry(id).or_insert(geom);
        }
    }
    let geoms: Vec<Option<Geometry<f64>>> = table
        .district_ids()?
        .into_iter()
        .map(|opt| opt.and_then(|id| by_id.get(&id).cloned()))
        .collect();
    table.set_geometries(&geoms)
}
