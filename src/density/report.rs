use std::cmp::Ordering;
use std::sync::Arc;

use super::DensityRecord;

/// How much a watershed's near-stream road density moves once proposed
/// construction is counted alongside the existing network.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityChange {
    pub watershed_id: Arc<str>,
    pub existing_density: f64,
    pub future_density: f64,
    pub change: f64,
}

/// Rank watersheds by the absolute change in near-stream density, largest
/// first, keeping the top `rows`.
pub fn change_report(records: &[DensityRecord], rows: usize) -> Vec<DensityChange> {
    let mut ranked: Vec<DensityChange> = records
        .iter()
        .map(|rec| {
            let future_density = if rec.area_km2 > 0.0 {
                (rec.existing_near_km + rec.proposed_near_km) / rec.area_km2
            } else {
                0.0
            };
            DensityChange {
                watershed_id: rec.watershed_id.clone(),
                existing_density: rec.existing_near_density,
                future_density,
                change: (future_density - rec.existing_near_density).abs(),
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.change.partial_cmp(&a.change).unwrap_or(Ordering::Equal));
    ranked.truncate(rows);
    ranked
}

/// Fixed-width text table for terminal display.
pub fn render(rows: &[DensityChange]) -> String {
    if rows.is_empty() {
        return String::from("no watershed records to rank");
    }
    let mut out = Vec::with_capacity(rows.len() + 1);
    out.push(format!(
        "{:<27} {:>10} {:>10} {:>10}",
        "watershed", "existing", "future", "change"
    ));
    for row in rows {
        out.push(format!(
            "{:<27.27} {:>10.6} {:>10.6} {:>10.6}",
            row.watershed_id, row.existing_density, row.future_density, row.change
        ));
    }
    out.join("\n")
}
