use anyhow::{anyhow, Context, Result};
use geo::{Coord, Geometry, MapCoords};
use proj4rs::{proj::Proj as Proj4, transform::transform};

/// PROJ.4 definition for a supported EPSG code.
///
/// proj4rs carries no EPSG database, so the codes this pipeline meets in
/// practice are spelled out here: WGS84/ETRS89 geographic sources, the
/// ETRS89 UTM zones covering Norway, and web mercator.
pub fn proj4_for_epsg(epsg: u32) -> Result<&'static str> {
    match epsg {
        4326 => Ok("+proj=longlat +datum=WGS84 +no_defs +type=crs"),
        4258 => Ok("+proj=longlat +ellps=GRS80 +no_defs +type=crs"),
        25832 => Ok("+proj=utm +zone=32 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs +type=crs"),
        25833 => Ok("+proj=utm +zone=33 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs +type=crs"),
        3857 => Ok("+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs"),
        _ => Err(anyhow!("no PROJ.4 definition for EPSG:{epsg}")),
    }
}

/// Whether coordinates in this CRS are degrees (proj4rs works in radians).
fn is_geographic(epsg: u32) -> bool {
    matches!(epsg, 4326 | 4258)
}

/// Reproject a geometry between two supported EPSG codes.
pub fn reproject_geometry(geom: &Geometry<f64>, from_epsg: u32, to_epsg: u32) -> Result<Geometry<f64>> {
    if from_epsg == to_epsg {
        return Ok(geom.clone());
    }

    let from = Proj4::from_proj_string(proj4_for_epsg(from_epsg)?)
        .with_context(|| format!("failed to build source projection for EPSG:{from_epsg}"))?;
    let to = Proj4::from_proj_string(proj4_for_epsg(to_epsg)?)
        .with_context(|| format!("failed to build target projection for EPSG:{to_epsg}"))?;

    let deg_in = is_geographic(from_epsg);
    let deg_out = is_geographic(to_epsg);

    geom.try_map_coords(|coord: Coord<f64>| {
        let mut point = if deg_in {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };
        transform(&from, &to, &mut point)
            .map_err(|e| anyhow!("CRS transform EPSG:{from_epsg} -> EPSG:{to_epsg} failed: {e}"))?;
        Ok(if deg_out {
            Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
        } else {
            Coord { x: point.0, y: point.1 }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, Geometry};

    #[test]
    fn identity_reprojection_is_a_noop() {
        let p: Geometry<f64> = point!(x: 10.0, y: 60.0).into();
        let out = reproject_geometry(&p, 25832, 25832).unwrap();
        assert_eq!(p, out);
    }

    #[test]
    fn wgs84_to_utm32_lands_in_meters() {
        // Oslo city hall, roughly.
        let p: Geometry<f64> = point!(x: 10.7335, y: 59.9123).into();
        let out = reproject_geometry(&p, 4326, 25832).unwrap();
        let Geometry::Point(utm) = out else {
            panic!("expected a point back");
        };
        // UTM zone 32N puts Oslo around (597km east, 6642km north).
        assert!((utm.x() - 597_000.0).abs() < 5_000.0, "easting {}", utm.x());
        assert!((utm.y() - 6_642_000.0).abs() < 5_000.0, "northing {}", utm.y());
    }

    #[test]
    fn unknown_epsg_is_an_error() {
        let p: Geometry<f64> = point!(x: 0.0, y: 0.0).into();
        assert!(reproject_geometry(&p, 4326, 12345).is_err());
    }
}
