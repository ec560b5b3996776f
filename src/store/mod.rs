mod convert;
mod read;

pub use read::{LayerSources, canonical_crs, load};

use std::sync::Arc;

use geo::{MultiLineString, MultiPolygon};

use crate::geom::Crs;

/// Watershed polygon with its caller-selected unique id and derived area.
#[derive(Debug, Clone)]
pub struct Watershed {
    pub id: Arc<str>,
    pub geometry: MultiPolygon<f64>,
    pub area_m2: f64,
}

/// Stream centerline. Attributes are not read; only the geometry matters.
#[derive(Debug, Clone)]
pub struct StreamSegment {
    pub geometry: MultiLineString<f64>,
}

/// Which network a road belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoadClass {
    Existing,
    Proposed,
}

impl RoadClass {
    pub fn as_str(self) -> &'static str {
        match self {
            RoadClass::Existing => "existing",
            RoadClass::Proposed => "proposed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoadSegment {
    pub class: RoadClass,
    pub geometry: MultiLineString<f64>,
}

/// Everything one run works from, in a single projected CRS.
#[derive(Debug)]
pub struct FeatureSet {
    pub crs: Crs,
    pub watersheds: Vec<Watershed>,
    pub streams: Vec<StreamSegment>,
    pub roads: Vec<RoadSegment>,
}
