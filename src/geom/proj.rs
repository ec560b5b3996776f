use anyhow::{Context, Result};
use geo::{Coord, MapCoords};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::error::Error;

/// A coordinate reference system the toolkit knows how to work with,
/// identified by EPSG code. Construction fails for codes outside the
/// supported table, so a held `Crs` is always transformable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crs {
    epsg: u32,
}

impl Crs {
    pub fn from_epsg(epsg: u32) -> Result<Self> {
        if proj4_for_epsg(epsg).is_none() {
            return Err(Error::Reprojection(format!(
                "no PROJ.4 definition for EPSG:{epsg}; supply data in a supported CRS"
            ))
            .into());
        }
        Ok(Self { epsg })
    }

    #[inline] pub fn epsg(&self) -> u32 { self.epsg }

    /// Angular (lon/lat) systems, where lengths and areas are meaningless.
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, 4326 | 4269 | 4617 | 4937)
    }

    fn to_proj4(&self) -> Result<Proj4> {
        let proj_string = proj4_for_epsg(self.epsg).ok_or_else(|| {
            Error::Reprojection(format!("no PROJ.4 definition for EPSG:{}", self.epsg))
        })?;
        Proj4::from_proj_string(&proj_string)
            .with_context(|| format!("failed to build PROJ.4 for EPSG:{}: {proj_string}", self.epsg))
    }
}

/// PROJ.4 definitions for the supported EPSG codes: WGS84/NAD83 geographic,
/// their UTM zones, web mercator, and BC Albers.
fn proj4_for_epsg(epsg: u32) -> Option<String> {
    let def = match epsg {
        4326 | 4617 => "+proj=longlat +datum=WGS84 +no_defs +type=crs".to_string(),
        4269 | 4937 => "+proj=longlat +datum=NAD83 +no_defs +type=crs".to_string(),
        3857 => "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs".to_string(),
        3005 => "+proj=aea +lat_0=45 +lon_0=-126 +lat_1=50 +lat_2=58.5 +x_0=1000000 +y_0=0 +datum=NAD83 +units=m +no_defs +type=crs".to_string(),
        26901..=26923 => format!("+proj=utm +zone={} +datum=NAD83 +units=m +no_defs +type=crs", epsg - 26900),
        32601..=32660 => format!("+proj=utm +zone={} +datum=WGS84 +units=m +no_defs +type=crs", epsg - 32600),
        32701..=32760 => format!("+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs +type=crs", epsg - 32700),
        _ => return None,
    };
    Some(def)
}

/// Reproject a geometry between two known CRSs. Geographic coordinates go
/// through the transform in radians.
pub fn reproject<G>(geom: &G, from: &Crs, to: &Crs) -> Result<G>
where
    G: MapCoords<f64, f64, Output = G> + Clone,
{
    if from == to {
        return Ok(geom.clone());
    }
    let from_proj = from.to_proj4()?;
    let to_proj = to.to_proj4()?;
    let from_geographic = from.is_geographic();
    let to_geographic = to.is_geographic();

    geom.try_map_coords(|coord: Coord<f64>| -> Result<Coord<f64>> {
        let mut point = if from_geographic {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };
        transform(&from_proj, &to_proj, &mut point).map_err(|e| {
            anyhow::Error::from(Error::Reprojection(format!(
                "EPSG:{} -> EPSG:{}: {e}",
                from.epsg(),
                to.epsg()
            )))
        })?;
        Ok(if to_geographic {
            Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
        } else {
            Coord { x: point.0, y: point.1 }
        })
    })
}
