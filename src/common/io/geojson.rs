//! GeoJSON FeatureCollection read/write.
//!
//! Attribute properties travel as DataFrame columns; geometries come and go
//! as `geo` types. The non-standard but widely used named-CRS member is
//! honored on read and written for the configured EPSG.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use polars::prelude::*;
use serde_json::{json, Map, Value};

/// A parsed FeatureCollection: attribute table, row-aligned geometries,
/// and the EPSG code of the named CRS member, when present.
pub struct FeatureCollection {
    pub df: DataFrame,
    pub geoms: Vec<Option<Geometry<f64>>>,
    pub epsg: Option<u32>,
}

/// Read a GeoJSON FeatureCollection from `path`.
pub fn read_geojson(path: &Path) -> Result<FeatureCollection> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read GeoJSON file: {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse GeoJSON file: {}", path.display()))?;

    if value["type"].as_str() != Some("FeatureCollection") {
        bail!("{} is not a GeoJSON FeatureCollection", path.display());
    }

    let epsg = parse_crs(&value);
    let features = value["features"].as_array().cloned().unwrap_or_default();

    let mut geoms = Vec::with_capacity(features.len());
    let mut keys: Vec<String> = Vec::new();
    let mut rows: Vec<Map<String, Value>> = Vec::with_capacity(features.len());

    for feature in &features {
        geoms.push(match &feature["geometry"] {
            Value::Null => None,
            geometry => Some(json_to_geometry(geometry)?),
        });

        let props = feature["properties"].as_object().cloned().unwrap_or_default();
        for key in props.keys() {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.clone());
            }
        }
        rows.push(props);
    }

    let columns = keys
        .iter()
        .map(|key| build_column(key, &rows))
        .collect::<Result<Vec<_>>>()?;

    // An attribute-less collection yields a zero-width frame; the caller
    // re-aligns on the geometry vector.
    let df = if columns.is_empty() {
        DataFrame::empty()
    } else {
        DataFrame::new(columns)?
    };

    Ok(FeatureCollection { df, geoms, epsg })
}

/// Write a FeatureCollection to `path`, with a named CRS member for `epsg`.
pub fn write_geojson(
    df: &DataFrame,
    geoms: &[Option<Geometry<f64>>],
    epsg: u32,
    path: &Path,
) -> Result<()> {
    if geoms.len() != df.height() {
        bail!(
            "geometry count {} does not match table height {}",
            geoms.len(),
            df.height()
        );
    }

    let columns = df.get_columns();
    let mut features = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let mut props = Map::new();
        for col in columns {
            if col.name().as_str() == crate::types::GEOMETRY {
                continue;
            }
            props.insert(col.name().to_string(), any_value_to_json(&col.get(i)?));
        }

        let geometry = match &geoms[i] {
            Some(geom) => geometry_to_json(geom)?,
            None => Value::Null,
        };
        features.push(json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": props,
        }));
    }

    let collection = json!({
        "type": "FeatureCollection",
        "crs": {
            "type": "name",
            "properties": { "name": format!("urn:ogc:def:crs:EPSG::{epsg}") },
        },
        "features": features,
    });

    let text = serde_json::to_string(&collection).context("failed to serialize GeoJSON")?;
    fs::write(path, text)
        .with_context(|| format!("failed to write GeoJSON file: {}", path.display()))?;
    Ok(())
}

/// Parse the EPSG code out of a named CRS member, e.g.
/// `"urn:ogc:def:crs:EPSG::25832"` or `"EPSG:25832"`.
fn parse_crs(value: &Value) -> Option<u32> {
    let name = value["crs"]["properties"]["name"].as_str()?;
    let code = name.rsplit(':').next()?;
    code.parse().ok()
}

/// Choose a column type from the observed property values: bool when all
/// booleans, Int64 when all integers, Float64 when all numbers, and a
/// string rendering otherwise.
fn build_column(key: &str, rows: &[Map<String, Value>]) -> Result<Column> {
    let values: Vec<Option<&Value>> = rows
        .iter()
        .map(|row| row.get(key).filter(|v| !v.is_null()))
        .collect();
    let present = values.iter().flatten();

    let all_bool = values.iter().flatten().all(|v| v.is_boolean());
    let all_int = values.iter().flatten().all(|v| v.as_i64().is_some());
    let all_num = values.iter().flatten().all(|v| v.is_number());
    let any = present.count() > 0;

    let series = if any && all_bool {
        let ca: BooleanChunked = values.iter().map(|v| v.and_then(|v| v.as_bool())).collect();
        ca.with_name(key.into()).into_series()
    } else if any && all_int {
        let ca: Int64Chunked = values.iter().map(|v| v.and_then(|v| v.as_i64())).collect();
        ca.with_name(key.into()).into_series()
    } else if any && all_num {
        let ca: Float64Chunked = values.iter().map(|v| v.and_then(|v| v.as_f64())).collect();
        ca.with_name(key.into()).into_series()
    } else {
        let ca: StringChunked = values
            .iter()
            .map(|v| {
                v.map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
            })
            .collect();
        ca.with_name(key.into()).into_series()
    };

    Ok(series.into_column())
}

fn any_value_to_json(av: &AnyValue) -> Value {
    match av {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::Int8(v) => json!(*v),
        AnyValue::Int16(v) => json!(*v),
        AnyValue::Int32(v) => json!(*v),
        AnyValue::Int64(v) => json!(*v),
        AnyValue::UInt8(v) => json!(*v),
        AnyValue::UInt16(v) => json!(*v),
        AnyValue::UInt32(v) => json!(*v),
        AnyValue::UInt64(v) => json!(*v),
        AnyValue::Float32(v) => float_to_json(*v as f64),
        AnyValue::Float64(v) => float_to_json(*v),
        AnyValue::String(s) => Value::String((*s).to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Binary(b) => Value::String(hex::encode(b)),
        AnyValue::BinaryOwned(b) => Value::String(hex::encode(b)),
        other => Value::String(other.to_string()),
    }
}

fn float_to_json(v: f64) -> Value {
    // JSON has no NaN/Inf.
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

fn geometry_to_json(geom: &Geometry<f64>) -> Result<Value> {
    match geom {
        Geometry::Point(p) => Ok(json!({
            "type": "Point",
            "coordinates": [p.x(), p.y()],
        })),
        Geometry::Polygon(poly) => Ok(json!({
            "type": "Polygon",
            "coordinates": polygon_rings(poly),
        })),
        Geometry::MultiPolygon(mp) => Ok(json!({
            "type": "MultiPolygon",
            "coordinates": mp.0.iter().map(polygon_rings).collect::<Vec<_>>(),
        })),
        other => bail!("unsupported geometry type for GeoJSON export: {other:?}"),
    }
}

fn polygon_rings(poly: &Polygon<f64>) -> Vec<Vec<Vec<f64>>> {
    std::iter::once(poly.exterior())
        .chain(poly.interiors().iter())
        .map(|ring| ring.coords().map(|c| vec![c.x, c.y]).collect())
        .collect()
}

fn json_to_geometry(value: &Value) -> Result<Geometry<f64>> {
    let geom_type = value["type"]
        .as_str()
        .ok_or_else(|| anyhow!("GeoJSON geometry without a type"))?;
    let coords = &value["coordinates"];

    match geom_type {
        "Point" => {
            let pair = coords
                .as_array()
                .ok_or_else(|| anyhow!("invalid Point coordinates"))?;
            Ok(Geometry::Point(Point::new(coord_at(pair, 0)?, coord_at(pair, 1)?)))
        }
        "Polygon" => Ok(Geometry::Polygon(parse_polygon(coords)?)),
        "MultiPolygon" => {
            let polys = coords
                .as_array()
                .ok_or_else(|| anyhow!("invalid MultiPolygon coordinates"))?
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>>>()?;
            Ok(Geometry::MultiPolygon(MultiPolygon(polys)))
        }
        other => bail!("unsupported GeoJSON geometry type: {other}"),
    }
}

fn parse_polygon(coords: &Value) -> Result<Polygon<f64>> {
    let rings = coords
        .as_array()
        .ok_or_else(|| anyhow!("invalid Polygon coordinates"))?;
    if rings.is_empty() {
        bail!("Polygon without rings");
    }
    let mut parsed = rings.iter().map(parse_ring).collect::<Result<Vec<_>>>()?;
    let exterior = parsed.remove(0);
    Ok(Polygon::new(exterior, parsed))
}

fn parse_ring(ring: &Value) -> Result<LineString<f64>> {
    let points = ring
        .as_array()
        .ok_or_else(|| anyhow!("invalid ring coordinates"))?;
    let mut coords = Vec::with_capacity(points.len());
    for pair in points {
        let pair = pair
            .as_array()
            .ok_or_else(|| anyhow!("invalid coordinate pair"))?;
        coords.push(Coord { x: coord_at(pair, 0)?, y: coord_at(pair, 1)? });
    }
    // Close the ring if the source left it open.
    if coords.first() != coords.last() {
        if let Some(&first) = coords.first() {
            coords.push(first);
        }
    }
    Ok(LineString::from(coords))
}

fn coord_at(pair: &[Value], idx: usize) -> Result<f64> {
    pair.get(idx)
        .and_then(Value::as_f64)
        .ok_or_else(|| anyhow!("coordinate component {idx} is not a number"))
}
