use std::fs;
use std::path::Path;

use geo::{polygon, Geometry};
use polars::prelude::*;
use treevis::{DistrictId, GeomTable, LayerKind, Partitioner, RunConfig};

/// A single-district municipality with the distances arranged around the
/// thresholds:
///
/// - one residential building at the origin,
/// - four tree crowns of 62.5 m² each, all within 15 m of it,
/// - green space starting 320 m away (beyond the 300 m threshold),
/// - a district of 1000 m² clipped area.
fn write_fixture(raw_dir: &Path) {
    fs::create_dir_all(raw_dir).unwrap();

    let district = feature(
        r#"{"type": "Polygon", "coordinates": [[[-400.0,-400.0],[400.0,-400.0],[400.0,400.0],[-400.0,400.0],[-400.0,-400.0]]]}"#,
        r#"{"district_id": "00302421", "district_name": "Sentrum", "a_clipped": 1000.0}"#,
    );
    fs::write(raw_dir.join("oslo_districts.geojson"), collection(&[district])).unwrap();

    let building = feature(
        r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#,
        r#"{"district_id": "00302421"}"#,
    );
    fs::write(raw_dir.join("oslo_bldg.geojson"), collection(&[building.clone()])).unwrap();
    fs::write(raw_dir.join("oslo_res_bldg.geojson"), collection(&[building])).unwrap();

    // 12.5 x 5 rectangles, each 2 m from the building.
    let crowns: Vec<String> = [
        "[[[2.0,0.0],[14.5,0.0],[14.5,5.0],[2.0,5.0],[2.0,0.0]]]",
        "[[[-14.5,0.0],[-2.0,0.0],[-2.0,5.0],[-14.5,5.0],[-14.5,0.0]]]",
        "[[[0.0,2.0],[5.0,2.0],[5.0,14.5],[0.0,14.5],[0.0,2.0]]]",
        "[[[0.0,-14.5],[5.0,-14.5],[5.0,-2.0],[0.0,-2.0],[0.0,-14.5]]]",
    ]
    .iter()
    .map(|coords| {
        feature(
            &format!(r#"{{"type": "Polygon", "coordinates": {coords}}}"#),
            r#"{"district_id": "00302421"}"#,
        )
    })
    .collect();
    fs::write(raw_dir.join("oslo_tree_crowns.geojson"), collection(&crowns)).unwrap();

    let park = feature(
        r#"{"type": "Polygon", "coordinates": [[[320.0,-5.0],[330.0,-5.0],[330.0,5.0],[320.0,5.0],[320.0,-5.0]]]}"#,
        r#"{"name": "far park"}"#,
    );
    fs::write(raw_dir.join("oslo_green_space.geojson"), collection(&[park])).unwrap();
}

fn feature(geometry: &str, properties: &str) -> String {
    format!(r#"{{"type": "Feature", "geometry": {geometry}, "properties": {properties}}}"#)
}

fn collection(features: &[String]) -> String {
    format!(
        r#"{{"type": "FeatureCollection",
            "crs": {{"type": "name", "properties": {{"name": "urn:ogc:def:crs:EPSG::25832"}}}},
            "features": [{}]}}"#,
        features.join(",")
    )
}

fn write_config(root: &Path) -> RunConfig {
    write_config_with(root, "")
}

fn write_config_with(root: &Path, extra: &str) -> RunConfig {
    let path = root.join("run.json");
    fs::write(
        &path,
        format!(
            r#"{{
                "municipality": "oslo",
                "epsg": 25832,
                {extra}
                "raw_dir": "{0}/raw",
                "interim_dir": "{0}/interim",
                "reporting_dir": "{0}/reporting"
            }}"#,
            root.display()
        ),
    )
    .unwrap();
    RunConfig::from_file(&path).unwrap()
}

fn i64_at(df: &DataFrame, name: &str, idx: usize) -> Option<i64> {
    df.column(name).unwrap().i64().unwrap().get(idx)
}

fn f64_at(df: &DataFrame, name: &str, idx: usize) -> Option<f64> {
    df.column(name).unwrap().f64().unwrap().get(idx)
}

fn str_at<'a>(df: &'a DataFrame, name: &str, idx: usize) -> Option<&'a str> {
    df.column(name).unwrap().str().unwrap().get(idx)
}

#[test]
fn full_pipeline_produces_the_expected_report() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(dir.path());
    write_fixture(&cfg.raw_dir);

    let summary = Partitioner::new(&cfg).run().unwrap();
    assert!(summary.written > 0);
    treevis::stats::run(&cfg).unwrap();

    let report_base = cfg.district_report_base(DistrictId::new(302421));
    let report = GeomTable::read_parquet(&report_base.with_extension("parquet"), Some(25832))
        .unwrap();
    assert_eq!(report.height(), 1);
    let df = report.df();

    assert_eq!(i64_at(df, "district_id", 0), Some(302421));
    assert_eq!(str_at(df, "district_name", 0), Some("Sentrum"));
    assert_eq!(i64_at(df, "n_trees", 0), Some(4));
    assert_eq!(i64_at(df, "n_bldg", 0), Some(1));
    assert_eq!(i64_at(df, "n_res_bldg", 0), Some(1));

    // The park lies 320 m out, past the 300 m threshold.
    assert_eq!(i64_at(df, "n_res_bldg_near_gs", 0), Some(0));
    assert_eq!(f64_at(df, "perc_near_gs", 0), Some(0.0));
    assert_eq!(str_at(df, "labels_near_gs", 0), Some("0-25%"));

    // Four crowns within 15 m clears the three-crown minimum.
    assert_eq!(i64_at(df, "n_bldg_near_trees", 0), Some(1));
    assert_eq!(f64_at(df, "perc_near_trees", 0), Some(100.0));
    assert_eq!(str_at(df, "labels_near_trees", 0), Some("75-100%"));

    // 4 x 62.5 m² of crown over 1000 m² of district.
    assert_eq!(f64_at(df, "a_crown", 0), Some(250.0));
    assert_eq!(f64_at(df, "perc_crown", 0), Some(25.0));
    assert_eq!(str_at(df, "labels_crown", 0), Some("25-50%"));

    assert!(report_base.with_extension("csv").exists());
    assert!(report_base.with_extension("geojson").exists());
}

#[test]
fn merged_report_carries_district_geometry() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(dir.path());
    write_fixture(&cfg.raw_dir);

    Partitioner::new(&cfg).run().unwrap();
    treevis::stats::run(&cfg).unwrap();

    let base = cfg.municipality_report_base();
    let merged = GeomTable::read_parquet(&base.with_extension("parquet"), Some(25832)).unwrap();
    assert_eq!(merged.height(), 1);
    assert_eq!(merged.district_ids().unwrap(), vec![Some(302421)]);

    let expected: Geometry<f64> = Geometry::Polygon(polygon![
        (x: -400.0, y: -400.0),
        (x: 400.0, y: -400.0),
        (x: 400.0, y: 400.0),
        (x: -400.0, y: 400.0),
        (x: -400.0, y: -400.0),
    ]);
    assert_eq!(merged.geometries().unwrap(), vec![Some(expected)]);

    // The merged percentages match the per-district ones.
    let df = merged.df();
    assert_eq!(f64_at(df, "perc_crown", 0), Some(25.0));
    assert_eq!(str_at(df, "labels_crown", 0), Some("25-50%"));
    assert!(base.with_extension("csv").exists());
    assert!(base.with_extension("geojson").exists());
}

#[test]
fn district_without_extracts_degrades_to_an_empty_report() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config_with(dir.path(), r#""districts": [302421, 99],"#);
    write_fixture(&cfg.raw_dir);
    Partitioner::new(&cfg).run().unwrap();

    // Leave district 99 configured but with nothing on disk, as after a
    // partial delivery.
    for kind in LayerKind::partitioned() {
        fs::remove_file(cfg.extract_path(kind, DistrictId::new(99))).unwrap();
    }

    treevis::stats::run(&cfg).unwrap();

    // Its per-district report exists (header-only) and the merge still
    // produces the municipality report from the remaining district.
    let empty_base = cfg.district_report_base(DistrictId::new(99));
    assert!(empty_base.with_extension("csv").exists());

    let base = cfg.municipality_report_base();
    let merged = GeomTable::read_parquet(&base.with_extension("parquet"), Some(25832)).unwrap();
    assert_eq!(merged.district_ids().unwrap(), vec![Some(302421)]);
    assert_eq!(f64_at(merged.df(), "perc_crown", 0), Some(25.0));
}

#[test]
fn rerunning_the_partitioner_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write_config(dir.path());
    write_fixture(&cfg.raw_dir);

    let first = Partitioner::new(&cfg).run().unwrap();
    let extract = cfg.extract_path(LayerKind::TreeCrowns, DistrictId::new(302421));
    let bytes = fs::read(&extract).unwrap();

    let second = Partitioner::new(&cfg).run().unwrap();
    assert_eq!(second.written, 0);
    assert_eq!(second.skipped_existing, first.written);
    assert_eq!(fs::read(&extract).unwrap(), bytes);
}
