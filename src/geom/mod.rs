pub mod buffer;
pub mod engine;
pub mod proj;

pub use engine::PlanarEngine;
pub use proj::Crs;

use anyhow::Result;
use geo::{MultiLineString, MultiPolygon, Rect};
use rstar::{AABB, RTreeObject};

/// Engine-agnostic seam over the planar geometry backend. The classifier and
/// aggregator only talk to this trait, so the backend can be swapped without
/// touching them.
pub trait GeometryOps {
    /// Offset region within `distance` of the line. Errors on empty input or
    /// a non-positive distance.
    fn buffer(&self, line: &MultiLineString<f64>, distance: f64) -> Result<MultiPolygon<f64>>;

    /// Portion of `line` inside `zone`, or outside it when `invert` is set.
    /// An empty result is not an error.
    fn clip(
        &self,
        zone: &MultiPolygon<f64>,
        line: &MultiLineString<f64>,
        invert: bool,
    ) -> MultiLineString<f64>;

    fn intersects(&self, zone: &MultiPolygon<f64>, line: &MultiLineString<f64>) -> bool;

    /// Length in the projected linear unit.
    fn length(&self, line: &MultiLineString<f64>) -> Result<f64>;

    /// Area in the projected linear unit squared.
    fn area(&self, polygon: &MultiPolygon<f64>) -> Result<f64>;
}

/// R-tree entry tying a bounding rectangle back to a feature index.
#[derive(Debug, Clone)]
pub struct BoundingBox {
    idx: usize,
    bbox: Rect<f64>,
}

impl BoundingBox {
    pub fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    #[inline] pub fn idx(&self) -> usize { self.idx }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}
