use std::path::Path;

use anyhow::{bail, Context, Result};
use geo::Geometry;
use log::warn;
use polars::prelude::*;

use crate::common::{self, FeatureCollection};
use crate::types::{DistrictId, DISTRICT_CODE, DISTRICT_ID, GEOMETRY, SUBDISTRICT_ID};

/// A typed table with a binary WKB geometry column.
///
/// Attributes and geometry live together in one DataFrame so row filters
/// can never desynchronize them; geometries are decoded on demand for
/// spatial predicates.
#[derive(Debug, Clone)]
pub struct GeomTable {
    df: DataFrame,
    epsg: Option<u32>,
}

impl GeomTable {
    pub fn new(df: DataFrame, epsg: Option<u32>) -> Self {
        Self { df, epsg }
    }

    /// Assemble a table from a parsed FeatureCollection, appending the
    /// geometry column last.
    pub fn from_features(fc: FeatureCollection) -> Result<Self> {
        let geom_series = encode_geometry_column(&fc.geoms)?;
        let df = if fc.df.width() == 0 {
            DataFrame::new(vec![geom_series.into_column()])?
        } else {
            let mut df = fc.df;
            df.with_column(geom_series)?;
            df
        };
        Ok(Self { df, epsg: fc.epsg })
    }

    /// Empty placeholder with the minimum columns downstream joins need,
    /// so aggregates over a missing input degrade to zero instead of failing.
    pub fn placeholder() -> Result<Self> {
        let df = DataFrame::new(vec![
            Series::new_empty(DISTRICT_ID.into(), &DataType::Int64).into_column(),
            Series::new_empty(SUBDISTRICT_ID.into(), &DataType::Int64).into_column(),
            Series::new_empty(GEOMETRY.into(), &DataType::Binary).into_column(),
        ])?;
        Ok(Self { df, epsg: None })
    }

    pub fn read_geojson(path: &Path) -> Result<Self> {
        Self::from_features(common::read_geojson(path)?)
    }

    /// Read a parquet table. Parquet files written by this pipeline carry
    /// no CRS metadata; the caller supplies the code they were written in.
    pub fn read_parquet(path: &Path, epsg: Option<u32>) -> Result<Self> {
        Ok(Self::new(common::read_parquet(path)?, epsg))
    }

    pub fn write_parquet(&self, path: &Path) -> Result<()> {
        common::write_parquet(&self.df, path)
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        common::write_csv(&self.df, path)
    }

    pub fn write_geojson(&self, path: &Path) -> Result<()> {
        let epsg = self
            .epsg
            .context("cannot write GeoJSON for a table without a CRS")?;
        common::write_geojson(&self.df, &self.geometries()?, epsg, path)
    }

    #[inline]
    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    #[inline]
    pub fn df_mut(&mut self) -> &mut DataFrame {
        &mut self.df
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.df.height()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    #[inline]
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    pub fn set_epsg(&mut self, epsg: u32) {
        self.epsg = Some(epsg);
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    /// Decode the geometry column. Tables without one (e.g. re-read CSV
    /// reports) yield all-null geometries rather than an error.
    pub fn geometries(&self) -> Result<Vec<Option<Geometry<f64>>>> {
        let Ok(col) = self.df.column(GEOMETRY) else {
            return Ok(vec![None; self.df.height()]);
        };
        col.binary()
            .context("geometry column is not binary")?
            .into_iter()
            .map(|opt| opt.map(common::geometry_from_wkb).transpose())
            .collect()
    }

    /// Replace the geometry column with freshly encoded WKB.
    pub fn set_geometries(&mut self, geoms: &[Option<Geometry<f64>>]) -> Result<()> {
        if geoms.len() != self.df.height() {
            bail!(
                "geometry count {} does not match table height {}",
                geoms.len(),
                self.df.height()
            );
        }
        self.df.with_column(encode_geometry_column(geoms)?)?;
        Ok(())
    }

    /// Reproject every geometry to `to_epsg`, in place.
    pub fn reproject(&mut self, to_epsg: u32) -> Result<()> {
        let from_epsg = self
            .epsg
            .context("cannot reproject a table without a source CRS")?;
        if from_epsg == to_epsg {
            return Ok(());
        }
        let geoms = self
            .geometries()?
            .iter()
            .map(|opt| {
                opt.as_ref()
                    .map(|g| common::reproject_geometry(g, from_epsg, to_epsg))
                    .transpose()
            })
            .collect::<Result<Vec<_>>>()?;
        self.set_geometries(&geoms)?;
        self.epsg = Some(to_epsg);
        Ok(())
    }

    /// Normalize the district identifier column to canonical integer form:
    /// strip leading zeros from zero-padded codes and rename the alternate
    /// `district_code` column when the canonical one is absent.
    ///
    /// Returns `false` (after a diagnostic) when the table has neither
    /// column; downstream joins over it will then match nothing.
    pub fn canonicalize_district_ids(&mut self) -> Result<bool> {
        if !self.has_column(DISTRICT_ID) && self.has_column(DISTRICT_CODE) {
            self.df.rename(DISTRICT_CODE, DISTRICT_ID.into())?;
        }
        if !self.has_column(DISTRICT_ID) {
            warn!("table has neither '{DISTRICT_ID}' nor '{DISTRICT_CODE}' column; skipping identifier normalization");
            return Ok(false);
        }

        let col = self.df.column(DISTRICT_ID)?;
        let canonical = match col.dtype() {
            DataType::String => {
                let ca: Int64Chunked = col
                    .str()?
                    .into_iter()
                    .map(|opt| {
                        opt.and_then(|code| {
                            DistrictId::strip_leading_zeros(code.trim()).parse::<i64>().ok()
                        })
                    })
                    .collect();
                ca.with_name(DISTRICT_ID.into()).into_series()
            }
            dtype if dtype.is_integer() => col.cast(&DataType::Int64)?.as_materialized_series().clone(),
            dtype => bail!("district identifier column has unsupported dtype {dtype}"),
        };
        self.df.with_column(canonical)?;
        Ok(true)
    }

    /// The canonical district identifier of each row.
    pub fn district_ids(&self) -> Result<Vec<Option<i64>>> {
        let col = self
            .df
            .column(DISTRICT_ID)
            .context("table has no canonical district identifier column")?;
        Ok(col.i64()?.into_iter().collect())
    }

    /// Sorted distinct district identifiers present in this table. Values
    /// that don't fit a district identifier are skipped with a diagnostic.
    pub fn distinct_districts(&self) -> Result<Vec<DistrictId>> {
        let mut ids: Vec<i64> = self.district_ids()?.into_iter().flatten().collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids
            .into_iter()
            .filter_map(|id| match u32::try_from(id) {
                Ok(id) => Some(DistrictId::new(id)),
                Err(_) => {
                    warn!("district identifier {id} is out of range; skipping");
                    None
                }
            })
            .collect())
    }

    /// Rows whose district identifier equals `id`.
    pub fn filter_by_district(&self, id: DistrictId) -> Result<GeomTable> {
        let mask = self.df.column(DISTRICT_ID)?.i64()?.equal(id.value());
        Ok(Self::new(self.df.filter(&mask)?, self.epsg))
    }
}

fn encode_geometry_column(geoms: &[Option<Geometry<f64>>]) -> Result<Series> {
    let encoded = geoms
        .iter()
        .map(|opt| opt.as_ref().map(common::geometry_to_wkb).transpose())
        .collect::<Result<Vec<_>>>()?;
    let ca: BinaryChunked = encoded.into_iter().collect();
    Ok(ca.with_name(GEOMETRY.into()).into_series())
}
