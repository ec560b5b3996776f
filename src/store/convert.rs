use geo::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};
use shapefile as shp;
use shapefile::Shape;

/// Polyline-ish shapes as a geo MultiLineString, one member per part.
pub(super) fn shape_to_lines(shape: &Shape) -> Option<MultiLineString<f64>> {
    match shape {
        Shape::Polyline(p) => Some(lines(p.parts().iter().map(|part| part.iter().map(|pt| (pt.x, pt.y))))),
        Shape::PolylineM(p) => Some(lines(p.parts().iter().map(|part| part.iter().map(|pt| (pt.x, pt.y))))),
        Shape::PolylineZ(p) => Some(lines(p.parts().iter().map(|part| part.iter().map(|pt| (pt.x, pt.y))))),
        _ => None,
    }
}

/// Polygon-ish shapes as a geo MultiPolygon. Shapefiles store each outer
/// ring followed by its holes, and the reader already labels rings, so
/// grouping is a single pass.
pub(super) fn shape_to_polygons(shape: &Shape) -> Option<MultiPolygon<f64>> {
    match shape {
        Shape::Polygon(p) => Some(polygons(p.rings().iter().map(|r| ring(r, |pt| (pt.x, pt.y))))),
        Shape::PolygonM(p) => Some(polygons(p.rings().iter().map(|r| ring(r, |pt| (pt.x, pt.y))))),
        Shape::PolygonZ(p) => Some(polygons(p.rings().iter().map(|r| ring(r, |pt| (pt.x, pt.y))))),
        _ => None,
    }
}

enum Ring {
    Outer(LineString<f64>),
    Inner(LineString<f64>),
}

fn ring<P>(ring: &shp::PolygonRing<P>, xy: impl Fn(&P) -> (f64, f64)) -> Ring {
    let coords = ring
        .points()
        .iter()
        .map(|pt| {
            let (x, y) = xy(pt);
            Coord { x, y }
        })
        .collect::<Vec<_>>();
    let ls = closed(coords);
    match ring {
        shp::PolygonRing::Outer(_) => Ring::Outer(ls),
        shp::PolygonRing::Inner(_) => Ring::Inner(ls),
    }
}

fn polygons(rings: impl Iterator<Item = Ring>) -> MultiPolygon<f64> {
    let mut polys: Vec<Polygon<f64>> = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes: Vec<LineString<f64>> = Vec::new();

    for ring in rings {
        match ring {
            Ring::Outer(ls) => {
                if let Some(ext) = exterior.replace(ls) {
                    polys.push(Polygon::new(ext, std::mem::take(&mut holes)));
                }
            }
            Ring::Inner(ls) => holes.push(ls),
        }
    }
    if let Some(ext) = exterior {
        polys.push(Polygon::new(ext, holes));
    }
    MultiPolygon::new(polys)
}

fn lines<I, J>(parts: I) -> MultiLineString<f64>
where
    I: Iterator<Item = J>,
    J: Iterator<Item = (f64, f64)>,
{
    MultiLineString::new(
        parts
            .map(|part| LineString::new(part.map(|(x, y)| Coord { x, y }).collect()))
            .collect(),
    )
}

/// geo rings must end where they start.
fn closed(mut coords: Vec<Coord<f64>>) -> LineString<f64> {
    if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
        if first != last {
            coords.push(first);
        }
    }
    LineString::new(coords)
}
