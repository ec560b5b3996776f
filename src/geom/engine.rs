use anyhow::Result;
use geo::{Area, BooleanOps, Euclidean, Intersects, Length, MultiLineString, MultiPolygon};

use crate::error::Error;

use super::{GeometryOps, buffer, proj::Crs};

/// Geometry backend over the `geo` crate. Stateless apart from the CRS it
/// was built for, which it only consults to refuse angular-unit measurement.
#[derive(Debug, Clone)]
pub struct PlanarEngine {
    crs: Crs,
    cap_segments: usize,
}

impl PlanarEngine {
    pub fn new(crs: Crs, cap_segments: usize) -> Self {
        Self { crs, cap_segments }
    }

    #[inline] pub fn crs(&self) -> Crs { self.crs }

    fn require_linear_units(&self) -> Result<()> {
        if self.crs.is_geographic() {
            return Err(Error::UnprojectedCrs(format!(
                "EPSG:{} uses angular units; project the data before measuring",
                self.crs.epsg()
            ))
            .into());
        }
        Ok(())
    }
}

impl GeometryOps for PlanarEngine {
    fn buffer(&self, line: &MultiLineString<f64>, distance: f64) -> Result<MultiPolygon<f64>> {
        if distance <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "buffer distance must be positive, got {distance}"
            ))
            .into());
        }
        if line.0.iter().all(|part| part.0.is_empty()) {
            return Err(Error::InvalidGeometry("cannot buffer an empty line".into()).into());
        }
        Ok(buffer::buffer_line(line, distance, self.cap_segments))
    }

    fn clip(
        &self,
        zone: &MultiPolygon<f64>,
        line: &MultiLineString<f64>,
        invert: bool,
    ) -> MultiLineString<f64> {
        zone.clip(line, invert)
    }

    fn intersects(&self, zone: &MultiPolygon<f64>, line: &MultiLineString<f64>) -> bool {
        zone.intersects(line)
    }

    fn length(&self, line: &MultiLineString<f64>) -> Result<f64> {
        self.require_linear_units()?;
        Ok(Euclidean.length(line))
    }

    fn area(&self, polygon: &MultiPolygon<f64>) -> Result<f64> {
        self.require_linear_units()?;
        Ok(polygon.unsigned_area())
    }
}
