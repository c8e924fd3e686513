mod csv;
mod geojson;
mod parquet;
mod wkb;

pub use csv::*;
pub use geojson::*;
pub use parquet::*;
pub use wkb::*;
