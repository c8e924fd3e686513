mod index;
mod store;
mod table;

pub use index::SpatialIndex;
pub use store::GeomStore;
pub use table::GeomTable;
