use std::path::Path;

use anyhow::Result;
use log::warn;

use crate::config::RunConfig;
use crate::store::{GeomStore, GeomTable};
use crate::types::{DistrictId, LayerKind};

/// What loading one extract into the store did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The table was read from disk and registered, with this many rows.
    Loaded(usize),
    /// A table of that name was already registered; nothing was read.
    SkippedExisting,
    /// The extract file is absent; an empty placeholder was registered so
    /// aggregates over it come out zero instead of failing.
    Placeholder,
}

/// Load one parquet extract into the store under `name`.
pub fn load_extract(
    store: &mut GeomStore,
    name: &str,
    path: &Path,
    epsg: u32,
) -> Result<LoadOutcome> {
    if store.contains(name) {
        return Ok(LoadOutcome::SkippedExisting);
    }
    if !path.exists() {
        warn!("extract {} is missing; registering an empty placeholder", path.display());
        store.register(name, GeomTable::placeholder()?);
        return Ok(LoadOutcome::Placeholder);
    }
    let mut table = GeomTable::read_parquet(path, Some(epsg))?;
    table.canonicalize_district_ids()?;
    let rows = table.height();
    store.register(name, table);
    Ok(LoadOutcome::Loaded(rows))
}

/// Load every partitioned layer of one district into the store.
pub fn load_district(
    store: &mut GeomStore,
    cfg: &RunConfig,
    id: DistrictId,
) -> Result<Vec<(LayerKind, LoadOutcome)>> {
    LayerKind::partitioned()
        .into_iter()
        .map(|kind| {
            let path = cfg.extract_path(kind, id);
            let outcome = load_extract(store, kind.to_str(), &path, cfg.epsg)?;
            Ok((kind, outcome))
        })
        .collect()
}
