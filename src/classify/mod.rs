use anyhow::Result;
use geo::{BooleanOps, MultiLineString, MultiPolygon};

use crate::geom::GeometryOps;
use crate::store::{RoadClass, RoadSegment, StreamSegment};

/// Largest near+far vs total mismatch tolerated silently, relative to the
/// road length. Clip operations snap coordinates at boundary crossings.
const LENGTH_TOLERANCE: f64 = 1e-4;

/// Union of all stream buffers. Empty when the distance is zero or there
/// are no streams in reach.
#[derive(Debug, Clone)]
pub struct NearStreamZone {
    pub geometry: MultiPolygon<f64>,
}

impl NearStreamZone {
    fn empty() -> Self {
        Self { geometry: MultiPolygon::new(vec![]) }
    }

    #[inline] pub fn is_empty(&self) -> bool { self.geometry.0.is_empty() }
}

/// A road partitioned into its near-stream and far portions.
#[derive(Debug, Clone)]
pub struct ClassifiedRoad {
    pub class: RoadClass,
    pub geometry: MultiLineString<f64>,
    pub near: MultiLineString<f64>,
    pub far: MultiLineString<f64>,
    pub total_len: f64,
    pub near_len: f64,
    pub far_len: f64,
}

#[derive(Debug)]
pub struct Classification {
    pub roads: Vec<ClassifiedRoad>,
    /// Zero-length inputs dropped with a warning.
    pub skipped_roads: usize,
    pub warnings: Vec<String>,
}

/// Buffer every stream and dissolve the buffers into one zone. Streams are
/// treated collectively so overlapping buffers from adjacent reaches do not
/// double count.
pub fn near_stream_zone(
    engine: &impl GeometryOps,
    streams: &[StreamSegment],
    distance_m: f64,
) -> Result<NearStreamZone> {
    if distance_m <= 0.0 {
        return Ok(NearStreamZone::empty());
    }

    let mut zone: Option<MultiPolygon<f64>> = None;
    for stream in streams {
        if stream.geometry.0.iter().all(|part| part.0.is_empty()) {
            continue;
        }
        let buffered = engine.buffer(&stream.geometry, distance_m)?;
        zone = Some(match zone {
            Some(accum) => accum.union(&buffered),
            None => buffered,
        });
    }

    Ok(zone.map(|geometry| NearStreamZone { geometry }).unwrap_or_else(NearStreamZone::empty))
}

/// Split every road into the portion inside the zone and the portion
/// outside it. Zero-length roads are skipped with a warning.
pub fn classify_roads(
    engine: &impl GeometryOps,
    roads: &[RoadSegment],
    zone: &NearStreamZone,
) -> Result<Classification> {
    let mut classified = Vec::with_capacity(roads.len());
    let mut skipped_roads = 0;
    let mut warnings = Vec::new();

    for (idx, road) in roads.iter().enumerate() {
        let total_len = if road.geometry.0.iter().all(|part| part.0.is_empty()) {
            0.0
        } else {
            engine.length(&road.geometry)?
        };
        if total_len <= 0.0 {
            skipped_roads += 1;
            warnings.push(format!(
                "skipping zero-length {} road (feature {idx})",
                road.class.as_str()
            ));
            continue;
        }

        let (near, far) = if zone.is_empty() {
            (MultiLineString::new(vec![]), road.geometry.clone())
        } else {
            (
                engine.clip(&zone.geometry, &road.geometry, false),
                engine.clip(&zone.geometry, &road.geometry, true),
            )
        };
        let near_len = engine.length(&near)?;
        let far_len = engine.length(&far)?;

        if ((near_len + far_len) - total_len).abs() > LENGTH_TOLERANCE * total_len.max(1.0) {
            warnings.push(format!(
                "{} road (feature {idx}): clipped lengths {:.3} + {:.3} differ from {:.3}",
                road.class.as_str(),
                near_len,
                far_len,
                total_len
            ));
        }

        classified.push(ClassifiedRoad {
            class: road.class,
            geometry: road.geometry.clone(),
            near,
            far,
            total_len,
            near_len,
            far_len,
        });
    }

    Ok(Classification { roads: classified, skipped_roads, warnings })
}

#[cfg(test)]
mod tests {
    use geo::line_string;

    use super::*;
    use crate::geom::{Crs, PlanarEngine};
    use crate::store::{RoadClass, RoadSegment, StreamSegment};

    fn engine() -> PlanarEngine {
        PlanarEngine::new(Crs::from_epsg(32610).unwrap(), 16)
    }

    fn stream(coords: geo::LineString<f64>) -> StreamSegment {
        StreamSegment { geometry: MultiLineString::new(vec![coords]) }
    }

    fn road(class: RoadClass, coords: geo::LineString<f64>) -> RoadSegment {
        RoadSegment { class, geometry: MultiLineString::new(vec![coords]) }
    }

    #[test]
    fn near_and_far_roads_split_as_expected() {
        let engine = engine();
        let streams = vec![stream(line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)])];
        let zone = near_stream_zone(&engine, &streams, 100.0).unwrap();
        assert!(!zone.is_empty());

        let roads = vec![
            road(RoadClass::Existing, line_string![(x: 0.0, y: 50.0), (x: 1000.0, y: 50.0)]),
            road(RoadClass::Proposed, line_string![(x: 0.0, y: 500.0), (x: 1000.0, y: 500.0)]),
        ];
        let result = classify_roads(&engine, &roads, &zone).unwrap();
        assert_eq!(result.roads.len(), 2);
        assert_eq!(result.skipped_roads, 0);

        let near_road = &result.roads[0];
        assert!((near_road.near_len - 1000.0).abs() < 1.0);
        assert!(near_road.far_len < 1.0);

        let far_road = &result.roads[1];
        assert_eq!(far_road.near_len, 0.0);
        assert!((far_road.far_len - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn near_plus_far_accounts_for_the_whole_road() {
        let engine = engine();
        let streams = vec![stream(line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)])];
        let zone = near_stream_zone(&engine, &streams, 100.0).unwrap();

        // Crosses the buffer boundary twice.
        let roads = vec![road(
            RoadClass::Existing,
            line_string![(x: 500.0, y: -300.0), (x: 500.0, y: 300.0)],
        )];
        let result = classify_roads(&engine, &roads, &zone).unwrap();

        let r = &result.roads[0];
        assert!((r.near_len - 200.0).abs() < 1.0);
        assert!((r.far_len - 400.0).abs() < 1.0);
        assert!(((r.near_len + r.far_len) - r.total_len).abs() < 1e-3 * r.total_len);
    }

    #[test]
    fn zero_distance_leaves_every_road_far() {
        let engine = engine();
        // One road touching the stream exactly, one elsewhere.
        let streams = vec![stream(line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)])];
        let zone = near_stream_zone(&engine, &streams, 0.0).unwrap();
        assert!(zone.is_empty());

        let roads = vec![
            road(RoadClass::Existing, line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)]),
            road(RoadClass::Proposed, line_string![(x: 0.0, y: 500.0), (x: 1000.0, y: 500.0)]),
        ];
        let result = classify_roads(&engine, &roads, &zone).unwrap();
        for r in &result.roads {
            assert_eq!(r.near_len, 0.0);
            assert!((r.far_len - r.total_len).abs() < 1e-9);
        }
    }

    #[test]
    fn no_streams_means_an_empty_zone() {
        let engine = engine();
        let zone = near_stream_zone(&engine, &[], 100.0).unwrap();
        assert!(zone.is_empty());
    }

    #[test]
    fn overlapping_stream_buffers_do_not_double_count() {
        let engine = engine();
        // Two parallel reaches 50 m apart share most of their buffers.
        let streams = vec![
            stream(line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)]),
            stream(line_string![(x: 0.0, y: 50.0), (x: 1000.0, y: 50.0)]),
        ];
        let zone = near_stream_zone(&engine, &streams, 100.0).unwrap();

        let roads = vec![road(
            RoadClass::Existing,
            line_string![(x: 0.0, y: 25.0), (x: 1000.0, y: 25.0)],
        )];
        let result = classify_roads(&engine, &roads, &zone).unwrap();
        let r = &result.roads[0];
        assert!((r.near_len - 1000.0).abs() < 1.0);
    }

    #[test]
    fn zero_length_road_is_skipped_with_a_warning() {
        let engine = engine();
        let streams = vec![stream(line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)])];
        let zone = near_stream_zone(&engine, &streams, 100.0).unwrap();

        let roads = vec![
            road(RoadClass::Existing, line_string![(x: 5.0, y: 5.0), (x: 5.0, y: 5.0)]),
            road(RoadClass::Existing, line_string![(x: 0.0, y: 50.0), (x: 100.0, y: 50.0)]),
        ];
        let result = classify_roads(&engine, &roads, &zone).unwrap();

        assert_eq!(result.roads.len(), 1);
        assert_eq!(result.skipped_roads, 1);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("zero-length"));
    }
}
