mod district_id;
mod layer_kind;

pub use district_id::DistrictId;
pub use layer_kind::LayerKind;

/// Canonical district identifier column, shared by every layer.
pub const DISTRICT_ID: &str = "district_id";
/// Alternate identifier column found in some source layers; renamed on load.
pub const DISTRICT_CODE: &str = "district_code";
/// Secondary identifier carried through when present.
pub const SUBDISTRICT_ID: &str = "subdistrict_id";
/// WKB-encoded geometry column, always the last column of a table.
pub const GEOMETRY: &str = "geometry";

/// Canonical column order for the final report. Columns missing from the
/// input are omitted; geometry is appended last on export.
pub const REPORT_COLUMNS: [&str; 23] = [
    DISTRICT_ID,
    "district_name",
    SUBDISTRICT_ID,
    "municipality_id",
    "municipality_name",
    "pop_year",
    "pop_total",
    "pop_elderly",
    "a_district",
    "a_unit",
    "a_clipped",
    "n_trees",
    "n_bldg",
    "n_res_bldg",
    "n_res_bldg_near_gs",
    "perc_near_gs",
    "labels_near_gs",
    "n_bldg_near_trees",
    "perc_near_trees",
    "labels_near_trees",
    "a_crown",
    "perc_crown",
    "labels_crown",
];
