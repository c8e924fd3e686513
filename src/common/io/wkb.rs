//! Minimal WKB codec for the geometry column.
//!
//! Covers the geometry types found in the municipal layers: points
//! (buildings), polygons and multipolygons (districts, crowns, green space).

use anyhow::{bail, Context, Result};
use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use std::io::{Cursor, Read, Write};

/// WKB geometry type tags.
const WKB_POINT: u32 = 1;
const WKB_POLYGON: u32 = 3;
const WKB_MULTIPOLYGON: u32 = 6;

/// WKB byte order: little endian.
const WKB_LE: u8 = 1;

/// Encode a geometry to WKB bytes (little endian).
pub fn geometry_to_wkb(geom: &Geometry<f64>) -> Result<Vec<u8>> {
    let mut wkb = Vec::new();
    write_geometry(&mut wkb, geom)?;
    Ok(wkb)
}

/// Decode a geometry from WKB bytes.
pub fn geometry_from_wkb(bytes: &[u8]) -> Result<Geometry<f64>> {
    let mut cursor = Cursor::new(bytes);
    read_geometry(&mut cursor)
}

fn write_geometry(out: &mut Vec<u8>, geom: &Geometry<f64>) -> Result<()> {
    out.write_all(&[WKB_LE])?;
    match geom {
        Geometry::Point(point) => {
            out.write_all(&WKB_POINT.to_le_bytes())?;
            write_coord(out, &point.0)?;
        }
        Geometry::Polygon(poly) => {
            out.write_all(&WKB_POLYGON.to_le_bytes())?;
            write_polygon_body(out, poly)?;
        }
        Geometry::MultiPolygon(mp) => {
            out.write_all(&WKB_MULTIPOLYGON.to_le_bytes())?;
            out.write_all(&(mp.0.len() as u32).to_le_bytes())?;
            for poly in mp.0.iter() {
                out.write_all(&[WKB_LE])?;
                out.write_all(&WKB_POLYGON.to_le_bytes())?;
                write_polygon_body(out, poly)?;
            }
        }
        other => bail!("unsupported geometry type for WKB encoding: {other:?}"),
    }
    Ok(())
}

fn write_polygon_body(out: &mut Vec<u8>, poly: &Polygon<f64>) -> Result<()> {
    let num_rings = (1 + poly.interiors().len()) as u32;
    out.write_all(&num_rings.to_le_bytes())?;
    write_ring(out, poly.exterior())?;
    for interior in poly.interiors() {
        write_ring(out, interior)?;
    }
    Ok(())
}

fn write_ring(out: &mut Vec<u8>, ring: &LineString<f64>) -> Result<()> {
    out.write_all(&(ring.0.len() as u32).to_le_bytes())?;
    for coord in ring.coords() {
        write_coord(out, coord)?;
    }
    Ok(())
}

fn write_coord(out: &mut Vec<u8>, coord: &Coord<f64>) -> Result<()> {
    out.write_all(&coord.x.to_le_bytes())?;
    out.write_all(&coord.y.to_le_bytes())?;
    Ok(())
}

fn read_geometry(cursor: &mut Cursor<&[u8]>) -> Result<Geometry<f64>> {
    let is_le = read_u8(cursor).context("failed to read WKB byte order")? == WKB_LE;
    let geom_type = read_u32(cursor, is_le).context("failed to read WKB geometry type")?;

    match geom_type {
        WKB_POINT => {
            let coord = read_coord(cursor, is_le)?;
            Ok(Geometry::Point(Point(coord)))
        }
        WKB_POLYGON => Ok(Geometry::Polygon(read_polygon_body(cursor, is_le)?)),
        WKB_MULTIPOLYGON => {
            let count = read_u32(cursor, is_le)? as usize;
            let mut polys = Vec::with_capacity(count);
            for _ in 0..count {
                let inner_le = read_u8(cursor)? == WKB_LE;
                let inner_type = read_u32(cursor, inner_le)?;
                if inner_type != WKB_POLYGON {
                    bail!("MultiPolygon member has geometry type {inner_type}, expected Polygon");
                }
                polys.push(read_polygon_body(cursor, inner_le)?);
            }
            Ok(Geometry::MultiPolygon(MultiPolygon(polys)))
        }
        other => bail!("unsupported WKB geometry type: {other}"),
    }
}

fn read_polygon_body(cursor: &mut Cursor<&[u8]>, is_le: bool) -> Result<Polygon<f64>> {
    let num_rings = read_u32(cursor, is_le)?;
    if num_rings == 0 {
        bail!("Polygon must have at least one ring");
    }
    let exterior = read_ring(cursor, is_le)?;
    let mut interiors = Vec::with_capacity(num_rings as usize - 1);
    for _ in 1..num_rings {
        interiors.push(read_ring(cursor, is_le)?);
    }
    Ok(Polygon::new(exterior, interiors))
}

fn read_ring(cursor: &mut Cursor<&[u8]>, is_le: bool) -> Result<LineString<f64>> {
    let len = read_u32(cursor, is_le)? as usize;
    let mut coords = Vec::with_capacity(len);
    for _ in 0..len {
        coords.push(read_coord(cursor, is_le)?);
    }
    Ok(LineString::from(coords))
}

fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8> {
    let mut buf = [0u8; 1];
    cursor.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32(cursor: &mut Cursor<&[u8]>, is_le: bool) -> Result<u32> {
    let mut buf = [0u8; 4];
    cursor.read_exact(&mut buf)?;
    Ok(if is_le { u32::from_le_bytes(buf) } else { u32::from_be_bytes(buf) })
}

fn read_coord(cursor: &mut Cursor<&[u8]>, is_le: bool) -> Result<Coord<f64>> {
    let mut x_bytes = [0u8; 8];
    let mut y_bytes = [0u8; 8];
    cursor.read_exact(&mut x_bytes)?;
    cursor.read_exact(&mut y_bytes)?;
    let x = if is_le { f64::from_le_bytes(x_bytes) } else { f64::from_be_bytes(x_bytes) };
    let y = if is_le { f64::from_le_bytes(y_bytes) } else { f64::from_be_bytes(y_bytes) };
    Ok(Coord { x, y })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon};

    #[test]
    fn point_and_polygon_survive_encoding() {
        let p: Geometry<f64> = point!(x: 597000.0, y: 6643000.0).into();
        assert_eq!(geometry_from_wkb(&geometry_to_wkb(&p).unwrap()).unwrap(), p);

        let poly: Geometry<f64> = polygon!(
            exterior: [
                (x: 0.0, y: 0.0), (x: 40.0, y: 0.0), (x: 40.0, y: 25.0), (x: 0.0, y: 25.0),
            ],
            interiors: [[
                (x: 10.0, y: 10.0), (x: 12.0, y: 10.0), (x: 12.0, y: 12.0), (x: 10.0, y: 12.0),
            ]],
        )
        .into();
        assert_eq!(geometry_from_wkb(&geometry_to_wkb(&poly).unwrap()).unwrap(), poly);
    }

    #[test]
    fn multipolygon_members_are_typed() {
        let mp: Geometry<f64> = Geometry::MultiPolygon(MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0),
        ]]));
        assert_eq!(geometry_from_wkb(&geometry_to_wkb(&mp).unwrap()).unwrap(), mp);
    }

    #[test]
    fn line_strings_are_rejected() {
        let line: Geometry<f64> =
            Geometry::LineString(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]));
        assert!(geometry_to_wkb(&line).is_err());
    }
}
