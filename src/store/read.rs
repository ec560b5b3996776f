use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::AHashSet;
use anyhow::{Context, Result};
use geo::MultiLineString;
use regex::Regex;
use shapefile::{Reader, dbase::FieldValue, dbase::Record};

use crate::error::Error;
use crate::geom::{Crs, GeometryOps, PlanarEngine, proj};

use super::{FeatureSet, RoadClass, RoadSegment, StreamSegment, Watershed, convert};

/// Input layers for one run. EPSG overrides win over `.prj` sidecars; a
/// layer with neither is assumed to already be in the watershed CRS.
#[derive(Debug, Clone)]
pub struct LayerSources {
    pub watersheds: PathBuf,
    pub id_field: String,
    pub streams: PathBuf,
    pub existing_roads: PathBuf,
    pub proposed_roads: PathBuf,
    pub watershed_epsg: Option<u32>,
    pub stream_epsg: Option<u32>,
    pub existing_epsg: Option<u32>,
    pub proposed_epsg: Option<u32>,
}

/// The CRS every layer is brought into: the watershed layer's own.
/// Fails fast when it cannot be established or is geographic, since every
/// downstream measurement would be meaningless.
pub fn canonical_crs(sources: &LayerSources) -> Result<Crs> {
    let crs = resolve_crs(&sources.watersheds, sources.watershed_epsg)?.ok_or_else(|| {
        Error::Reprojection(format!(
            "cannot establish a coordinate system for {} (no .prj sidecar; pass an EPSG override)",
            sources.watersheds.display()
        ))
    })?;
    if crs.is_geographic() {
        return Err(Error::UnprojectedCrs(format!(
            "watershed layer is in geographic EPSG:{}; lengths and areas need a projected CRS",
            crs.epsg()
        ))
        .into());
    }
    Ok(crs)
}

/// Load all four layers into memory in the engine's CRS, validating the
/// watershed id field along the way. Streams that touch no watershed are
/// dropped here so they are never buffered.
pub fn load(sources: &LayerSources, engine: &PlanarEngine) -> Result<FeatureSet> {
    let canonical = engine.crs();

    let watersheds = read_watersheds(sources, engine)?;

    let streams = read_lines(&sources.streams, sources.stream_epsg, &canonical)?
        .into_iter()
        .map(|geometry| StreamSegment { geometry })
        .filter(|stream| {
            watersheds.iter().any(|ws| engine.intersects(&ws.geometry, &stream.geometry))
        })
        .collect();

    let mut roads = Vec::new();
    for geometry in read_lines(&sources.existing_roads, sources.existing_epsg, &canonical)? {
        roads.push(RoadSegment { class: RoadClass::Existing, geometry });
    }
    for geometry in read_lines(&sources.proposed_roads, sources.proposed_epsg, &canonical)? {
        roads.push(RoadSegment { class: RoadClass::Proposed, geometry });
    }

    Ok(FeatureSet { crs: canonical, watersheds, streams, roads })
}

fn read_watersheds(sources: &LayerSources, engine: &PlanarEngine) -> Result<Vec<Watershed>> {
    let path = &sources.watersheds;
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut watersheds: Vec<Watershed> = Vec::new();
    let mut seen: AHashSet<Arc<str>> = AHashSet::new();

    for item in reader.iter_shapes_and_records() {
        let (shape, record) = item.context("Error reading shape+record")?;
        let Some(geometry) = convert::shape_to_polygons(&shape) else { continue };

        let id: Arc<str> = Arc::from(id_from_record(&record, &sources.id_field)?.as_str());
        if !seen.insert(id.clone()) {
            return Err(Error::Schema(format!(
                "duplicate watershed id {id:?} in field {:?}",
                sources.id_field
            ))
            .into());
        }

        let area_m2 = engine.area(&geometry)?;
        watersheds.push(Watershed { id, geometry, area_m2 });
    }

    if watersheds.is_empty() {
        return Err(Error::Schema(format!(
            "watershed layer {} has no polygon features",
            path.display()
        ))
        .into());
    }
    Ok(watersheds)
}

fn read_lines(path: &Path, epsg: Option<u32>, canonical: &Crs) -> Result<Vec<MultiLineString<f64>>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut lines = Vec::new();
    for item in reader.iter_shapes_and_records() {
        let (shape, _record) = item.context("Error reading shape+record")?;
        // Null shapes (and anything that is not a polyline) carry no length.
        if let Some(line) = convert::shape_to_lines(&shape) {
            lines.push(line);
        }
    }

    match resolve_crs(path, epsg)? {
        Some(crs) if crs != *canonical => lines
            .iter()
            .map(|line| proj::reproject(line, &crs, canonical))
            .collect(),
        _ => Ok(lines),
    }
}

fn resolve_crs(path: &Path, override_epsg: Option<u32>) -> Result<Option<Crs>> {
    let epsg = match override_epsg {
        Some(epsg) => Some(epsg),
        None => epsg_from_prj(path)?,
    };
    epsg.map(Crs::from_epsg).transpose()
}

/// Pull an EPSG code out of the `.prj` sidecar next to a shapefile. WKT
/// nests AUTHORITY tags per component; the last one names the CRS itself.
fn epsg_from_prj(shp_path: &Path) -> Result<Option<u32>> {
    let prj = shp_path.with_extension("prj");
    if !prj.exists() {
        return Ok(None);
    }
    let wkt = std::fs::read_to_string(&prj)
        .with_context(|| format!("Failed to read projection file: {}", prj.display()))?;
    let re = Regex::new(r#"AUTHORITY\["EPSG",\s*"?(\d+)"?\]"#).unwrap();
    Ok(re
        .captures_iter(&wkt)
        .last()
        .and_then(|caps| caps[1].parse().ok()))
}

fn id_from_record(record: &Record, field: &str) -> Result<String> {
    let value = record.get(field).ok_or_else(|| {
        Error::Schema(format!("field {field:?} not found in watershed attributes"))
    })?;
    let id = match value {
        FieldValue::Character(Some(s)) => s.trim().to_string(),
        FieldValue::Numeric(Some(n)) => format!("{n}"),
        FieldValue::Integer(n) => n.to_string(),
        FieldValue::Double(n) => format!("{n}"),
        FieldValue::Float(Some(n)) => format!("{n}"),
        FieldValue::Character(None) | FieldValue::Numeric(None) | FieldValue::Float(None) => {
            String::new()
        }
        other => {
            return Err(Error::Schema(format!(
                "field {field:?} has unsupported type: {other:?}"
            ))
            .into());
        }
    };
    if id.is_empty() {
        return Err(Error::Schema(format!("empty watershed id in field {field:?}")).into());
    }
    Ok(id)
}
