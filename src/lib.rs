#![doc = "Urban tree canopy statistics pipeline"]
mod common;
mod config;
mod partition;
pub mod stats;
mod store;
pub mod types;

#[doc(inline)]
pub use config::{RunConfig, Thresholds};

#[doc(inline)]
pub use partition::{district_list, PartitionSummary, Partitioner};

#[doc(inline)]
pub use store::{GeomStore, GeomTable, SpatialIndex};

#[doc(inline)]
pub use types::{DistrictId, LayerKind};
