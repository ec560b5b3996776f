use std::f64::consts::{FRAC_PI_2, PI};

use geo::{BooleanOps, Coord, LineString, MultiLineString, MultiPolygon, Polygon};

/// Offset region within `distance` of a polyline: one capsule (rectangle with
/// polygonal semicircular caps) per segment, unioned into a single region so
/// overlapping capsules along a reach do not double count.
///
/// `cap_segments` is the vertex count per semicircular cap; the polygonal
/// approximation is inscribed, so the region is slightly conservative near
/// the caps.
pub fn buffer_line(
    line: &MultiLineString<f64>,
    distance: f64,
    cap_segments: usize,
) -> MultiPolygon<f64> {
    let cap_segments = cap_segments.max(4);
    line.0
        .iter()
        .flat_map(|part| part.lines())
        .filter_map(|seg| capsule(seg.start, seg.end, distance, cap_segments))
        .map(|poly| MultiPolygon::new(vec![poly]))
        .reduce(|a, b| a.union(&b))
        .unwrap_or_else(|| MultiPolygon::new(vec![]))
}

/// Capsule around one segment. A zero-length segment degenerates to a disc.
fn capsule(a: Coord<f64>, b: Coord<f64>, distance: f64, cap_segments: usize) -> Option<Polygon<f64>> {
    if distance <= 0.0 {
        return None;
    }
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    if dx.hypot(dy) == 0.0 {
        return Some(disc(a, distance, 2 * cap_segments));
    }
    let theta = dy.atan2(dx);

    let mut ring = Vec::with_capacity(2 * cap_segments + 2);
    // End cap sweeps from the left normal through the heading to the right
    // normal; the start cap continues around the back. Together they close a
    // simple clockwise ring.
    arc(&mut ring, b, distance, theta + FRAC_PI_2, cap_segments);
    arc(&mut ring, a, distance, theta - FRAC_PI_2, cap_segments);
    Some(Polygon::new(LineString::new(ring), vec![]))
}

fn arc(ring: &mut Vec<Coord<f64>>, center: Coord<f64>, radius: f64, from_angle: f64, steps: usize) {
    for i in 0..=steps {
        let angle = from_angle - PI * (i as f64) / (steps as f64);
        ring.push(Coord {
            x: center.x + radius * angle.cos(),
            y: center.y + radius * angle.sin(),
        });
    }
}

fn disc(center: Coord<f64>, radius: f64, steps: usize) -> Polygon<f64> {
    let ring = (0..steps)
        .map(|i| {
            let angle = 2.0 * PI * (i as f64) / (steps as f64);
            Coord {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::new(ring), vec![])
}
