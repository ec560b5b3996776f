use std::path::Path;

use anyhow::{Context, Result};
use geo::MultiLineString;
use polars::{
    frame::DataFrame,
    io::SerWriter,
    prelude::{CsvWriter, NamedFrom},
    series::Series,
};
use serde_json::{Value, json};

use crate::classify::ClassifiedRoad;
use crate::common::io::{finalize_write, open_for_write};
use crate::density::DensityRecord;

/// Write the density table as CSV, one row per watershed. The write lands
/// atomically: a temp file beside the destination is renamed into place, so
/// a failure leaves nothing behind.
pub fn write_table(records: &[DensityRecord], path: &Path, force: bool) -> Result<()> {
    let mut df = table_frame(records)?;
    let mut pending = open_for_write(path, force)?;
    CsvWriter::new(&mut pending)
        .finish(&mut df)
        .with_context(|| format!("Failed to write density table to {}", path.display()))?;
    finalize_write(pending)
}

fn table_frame(records: &[DensityRecord]) -> Result<DataFrame> {
    fn column(records: &[DensityRecord], f: impl Fn(&DensityRecord) -> f64) -> Vec<f64> {
        records.iter().map(f).collect()
    }

    let ids: Vec<String> = records.iter().map(|r| r.watershed_id.to_string()).collect();

    Ok(DataFrame::new(vec![
        Series::new("watershed_id".into(), ids).into(),
        Series::new("area".into(), column(records, |r| r.area_km2)).into(),
        Series::new("existing_near_length".into(), column(records, |r| r.existing_near_km)).into(),
        Series::new("existing_total_length".into(), column(records, |r| r.existing_total_km)).into(),
        Series::new("proposed_near_length".into(), column(records, |r| r.proposed_near_km)).into(),
        Series::new("proposed_total_length".into(), column(records, |r| r.proposed_total_km)).into(),
        Series::new("existing_near_density".into(), column(records, |r| r.existing_near_density)).into(),
        Series::new("existing_total_density".into(), column(records, |r| r.existing_total_density)).into(),
        Series::new("proposed_near_density".into(), column(records, |r| r.proposed_near_density)).into(),
        Series::new("proposed_total_density".into(), column(records, |r| r.proposed_total_density)).into(),
    ])?)
}

/// Optional inspection output: each road's near and far portions as GeoJSON
/// MultiLineString features, tagged with the network and proximity status.
pub fn write_roads_geojson(roads: &[ClassifiedRoad], path: &Path, force: bool) -> Result<()> {
    let mut features = Vec::new();
    for (idx, road) in roads.iter().enumerate() {
        for (portion, near_stream) in [(&road.near, true), (&road.far, false)] {
            if portion.0.is_empty() {
                continue;
            }
            features.push(json!({
                "type": "Feature",
                "geometry": {
                    "type": "MultiLineString",
                    "coordinates": multiline_coords(portion),
                },
                "properties": {
                    "road": idx,
                    "road_class": road.class.as_str(),
                    "near_stream": near_stream,
                    "length_m": if near_stream { road.near_len } else { road.far_len },
                },
            }));
        }
    }

    let collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });

    let mut pending = open_for_write(path, force)?;
    serde_json::to_writer(&mut pending, &collection)
        .with_context(|| format!("Failed to write road GeoJSON to {}", path.display()))?;
    finalize_write(pending)
}

fn multiline_coords(mls: &MultiLineString<f64>) -> Value {
    let coords: Vec<Vec<[f64; 2]>> = mls
        .0
        .iter()
        .map(|ls| ls.coords().map(|c| [c.x, c.y]).collect())
        .collect();
    json!(coords)
}
