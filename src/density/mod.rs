pub mod report;

use std::sync::Arc;

use anyhow::Result;
use geo::BoundingRect;
use rstar::{AABB, RTree};

use crate::classify::ClassifiedRoad;
use crate::error::Error;
use crate::geom::{BoundingBox, GeometryOps};
use crate::pipeline::CancelToken;
use crate::store::{RoadClass, Watershed};

const M_PER_KM: f64 = 1000.0;
const M2_PER_KM2: f64 = 1_000_000.0;

/// One output row per watershed. Lengths in km, area in km², densities in
/// km of road per km² of watershed.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityRecord {
    pub watershed_id: Arc<str>,
    pub area_km2: f64,
    pub existing_near_km: f64,
    pub existing_total_km: f64,
    pub proposed_near_km: f64,
    pub proposed_total_km: f64,
    pub existing_near_density: f64,
    pub existing_total_density: f64,
    pub proposed_near_density: f64,
    pub proposed_total_density: f64,
}

impl DensityRecord {
    fn from_sums(watershed_id: Arc<str>, area_m2: f64, sums: &LengthSums) -> Self {
        let area_km2 = area_m2 / M2_PER_KM2;
        let existing_near_km = sums.existing_near / M_PER_KM;
        let existing_total_km = sums.existing_total / M_PER_KM;
        let proposed_near_km = sums.proposed_near / M_PER_KM;
        let proposed_total_km = sums.proposed_total / M_PER_KM;
        Self {
            watershed_id,
            area_km2,
            existing_near_km,
            existing_total_km,
            proposed_near_km,
            proposed_total_km,
            existing_near_density: existing_near_km / area_km2,
            existing_total_density: existing_total_km / area_km2,
            proposed_near_density: proposed_near_km / area_km2,
            proposed_total_density: proposed_total_km / area_km2,
        }
    }
}

#[derive(Debug, Default)]
struct LengthSums {
    existing_near: f64,
    existing_total: f64,
    proposed_near: f64,
    proposed_total: f64,
}

#[derive(Debug)]
pub struct Aggregation {
    pub records: Vec<DensityRecord>,
    /// Below the minimum-area threshold, skipped with a warning.
    pub skipped_watersheds: Vec<Arc<str>>,
    pub warnings: Vec<String>,
}

/// Clip the classified roads into each watershed and reduce to one record
/// per watershed, in input order. Each watershed depends only on itself and
/// the read-only road set, so ordering cannot change the numbers.
pub fn aggregate(
    engine: &impl GeometryOps,
    watersheds: &[Watershed],
    roads: &[ClassifiedRoad],
    min_area_m2: f64,
    cancel: &CancelToken,
) -> Result<Aggregation> {
    let rtree = RTree::bulk_load(
        roads
            .iter()
            .enumerate()
            .filter_map(|(idx, road)| road.geometry.bounding_rect().map(|b| BoundingBox::new(idx, b)))
            .collect(),
    );

    let mut records = Vec::with_capacity(watersheds.len());
    let mut skipped_watersheds = Vec::new();
    let mut warnings = Vec::new();

    for ws in watersheds {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled.into());
        }
        if ws.area_m2 < min_area_m2 {
            warnings.push(format!(
                "skipping watershed {:?}: area {:.1} m2 is below the {:.1} m2 minimum",
                ws.id, ws.area_m2, min_area_m2
            ));
            skipped_watersheds.push(ws.id.clone());
            continue;
        }
        let Some(rect) = ws.geometry.bounding_rect() else {
            skipped_watersheds.push(ws.id.clone());
            continue;
        };

        let search = AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );

        let mut sums = LengthSums::default();
        for candidate in rtree.locate_in_envelope_intersecting(&search) {
            let road = &roads[candidate.idx()];

            let total_in = engine.length(&engine.clip(&ws.geometry, &road.geometry, false))?;
            if total_in <= 0.0 {
                continue;
            }
            let near_in = if road.near.0.is_empty() {
                0.0
            } else {
                engine.length(&engine.clip(&ws.geometry, &road.near, false))?
            };

            match road.class {
                RoadClass::Existing => {
                    sums.existing_near += near_in;
                    sums.existing_total += total_in;
                }
                RoadClass::Proposed => {
                    sums.proposed_near += near_in;
                    sums.proposed_total += total_in;
                }
            }
        }

        records.push(DensityRecord::from_sums(ws.id.clone(), ws.area_m2, &sums));
    }

    Ok(Aggregation { records, skipped_watersheds, warnings })
}

#[cfg(test)]
mod tests {
    use geo::{MultiLineString, MultiPolygon, line_string, polygon};

    use super::*;
    use crate::classify::{classify_roads, near_stream_zone};
    use crate::geom::{Crs, PlanarEngine};
    use crate::store::{RoadClass, RoadSegment, StreamSegment, Watershed};

    fn engine() -> PlanarEngine {
        PlanarEngine::new(Crs::from_epsg(32610).unwrap(), 16)
    }

    fn watershed(id: &str, x0: f64, y0: f64, x1: f64, y1: f64) -> Watershed {
        let geometry = MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
        ]]);
        Watershed { id: Arc::from(id), area_m2: (x1 - x0) * (y1 - y0), geometry }
    }

    fn road(class: RoadClass, coords: geo::LineString<f64>) -> RoadSegment {
        RoadSegment { class, geometry: MultiLineString::new(vec![coords]) }
    }

    fn classify(
        engine: &PlanarEngine,
        streams: Vec<StreamSegment>,
        roads: Vec<RoadSegment>,
        distance: f64,
    ) -> Vec<crate::classify::ClassifiedRoad> {
        let zone = near_stream_zone(engine, &streams, distance).unwrap();
        classify_roads(engine, &roads, &zone).unwrap().roads
    }

    #[test]
    fn one_square_kilometer_scenario() {
        let engine = engine();
        // 1 km² watershed with a stream along its southern edge.
        let watersheds = vec![watershed("W1", 0.0, 0.0, 1000.0, 1000.0)];
        let streams = vec![StreamSegment {
            geometry: MultiLineString::new(vec![line_string![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0)]]),
        }];
        let roads = vec![
            // 1 km existing road 50 m from the stream.
            road(RoadClass::Existing, line_string![(x: 0.0, y: 50.0), (x: 1000.0, y: 50.0)]),
            // 1 km proposed road 500 m out.
            road(RoadClass::Proposed, line_string![(x: 0.0, y: 500.0), (x: 1000.0, y: 500.0)]),
        ];

        let classified = classify(&engine, streams, roads, 100.0);
        let cancel = CancelToken::new();
        let result = aggregate(&engine, &watersheds, &classified, 1.0, &cancel).unwrap();

        assert_eq!(result.records.len(), 1);
        let rec = &result.records[0];
        assert!((rec.area_km2 - 1.0).abs() < 1e-9);
        assert!((rec.existing_near_density - 1.0).abs() < 1e-3);
        assert!((rec.existing_total_density - 1.0).abs() < 1e-3);
        assert!(rec.proposed_near_density.abs() < 1e-3);
        assert!((rec.proposed_total_density - 1.0).abs() < 1e-3);
    }

    #[test]
    fn road_crossing_two_watersheds_splits_its_length() {
        let engine = engine();
        let watersheds = vec![
            watershed("W1", 0.0, 0.0, 1000.0, 1000.0),
            watershed("W2", 1000.0, 0.0, 2000.0, 1000.0),
        ];
        // 1 km road: 600 m in W1, 400 m in W2.
        let roads = vec![road(
            RoadClass::Existing,
            line_string![(x: 400.0, y: 500.0), (x: 1400.0, y: 500.0)],
        )];

        let classified = classify(&engine, vec![], roads, 100.0);
        let cancel = CancelToken::new();
        let result = aggregate(&engine, &watersheds, &classified, 1.0, &cancel).unwrap();

        let w1 = &result.records[0];
        let w2 = &result.records[1];
        assert!((w1.existing_total_km - 0.6).abs() < 1e-6);
        assert!((w2.existing_total_km - 0.4).abs() < 1e-6);
        assert!(
            ((w1.existing_total_km + w2.existing_total_km) - 1.0).abs() < 1e-6,
            "split lengths must sum to the full road"
        );
    }

    #[test]
    fn near_length_never_exceeds_total() {
        let engine = engine();
        let watersheds = vec![watershed("W1", 0.0, 0.0, 1000.0, 1000.0)];
        let streams = vec![StreamSegment {
            geometry: MultiLineString::new(vec![line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 1000.0)]]),
        }];
        let roads = vec![
            road(RoadClass::Existing, line_string![(x: 50.0, y: 0.0), (x: 900.0, y: 900.0)]),
            road(RoadClass::Proposed, line_string![(x: 0.0, y: 200.0), (x: 400.0, y: 200.0)]),
        ];

        let classified = classify(&engine, streams, roads, 100.0);
        let cancel = CancelToken::new();
        let result = aggregate(&engine, &watersheds, &classified, 1.0, &cancel).unwrap();

        let rec = &result.records[0];
        assert!(rec.existing_near_km <= rec.existing_total_km + 1e-9);
        assert!(rec.proposed_near_km <= rec.proposed_total_km + 1e-9);
        assert!(rec.existing_near_density >= 0.0);
        assert!(rec.proposed_near_density >= 0.0);
    }

    #[test]
    fn road_outside_every_watershed_contributes_nothing() {
        let engine = engine();
        let watersheds = vec![watershed("W1", 0.0, 0.0, 1000.0, 1000.0)];
        let roads = vec![road(
            RoadClass::Existing,
            line_string![(x: 5000.0, y: 5000.0), (x: 6000.0, y: 5000.0)],
        )];

        let classified = classify(&engine, vec![], roads, 100.0);
        let cancel = CancelToken::new();
        let result = aggregate(&engine, &watersheds, &classified, 1.0, &cancel).unwrap();

        let rec = &result.records[0];
        assert_eq!(rec.existing_total_km, 0.0);
        assert_eq!(rec.existing_near_km, 0.0);
    }

    #[test]
    fn sliver_watershed_is_skipped_not_failed() {
        let engine = engine();
        let watersheds = vec![
            watershed("W1", 0.0, 0.0, 1000.0, 1000.0),
            // 0.5 m² sliver.
            watershed("SLIVER", 2000.0, 0.0, 2001.0, 0.5),
        ];

        let cancel = CancelToken::new();
        let result = aggregate(&engine, &watersheds, &[], 1.0, &cancel).unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.skipped_watersheds.len(), 1);
        assert_eq!(&*result.skipped_watersheds[0], "SLIVER");
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn cancellation_aborts_between_watersheds() {
        let engine = engine();
        let watersheds = vec![watershed("W1", 0.0, 0.0, 1000.0, 1000.0)];

        let cancel = CancelToken::new();
        cancel.cancel();
        let err = aggregate(&engine, &watersheds, &[], 1.0, &cancel).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Cancelled)));
    }

    #[test]
    fn records_follow_input_watershed_order() {
        let engine = engine();
        let watersheds = vec![
            watershed("B", 0.0, 0.0, 100.0, 100.0),
            watershed("A", 200.0, 0.0, 300.0, 100.0),
        ];

        let cancel = CancelToken::new();
        let result = aggregate(&engine, &watersheds, &[], 1.0, &cancel).unwrap();
        let ids: Vec<&str> = result.records.iter().map(|r| &*r.watershed_id).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }
}
