use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::common;
use crate::store::GeomTable;

/// Write a normalized report table as CSV, GeoJSON and parquet, all
/// sharing the extension-less `base` path.
pub fn export_report(table: &GeomTable, base: &Path) -> Result<()> {
    let parent = base
        .parent()
        .with_context(|| format!("report path has no parent directory: {}", base.display()))?;
    common::ensure_dir_exists(parent)?;

    table.write_csv(&base.with_extension("csv"))?;
    table.write_parquet(&base.with_extension("parquet"))?;
    table.write_geojson(&base.with_extension("geojson"))?;
    info!("exported report {}.{{csv,geojson,parquet}}", base.display());
    Ok(())
}
