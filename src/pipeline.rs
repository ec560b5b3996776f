use std::path::PathBuf;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use anyhow::Result;

use crate::classify;
use crate::config::AnalysisConfig;
use crate::density::{self, DensityRecord, report::DensityChange};
use crate::geom::PlanarEngine;
use crate::output;
use crate::store::{self, LayerSources};

/// Cooperative cancellation flag, checked between watersheds during
/// aggregation. Cancelling aborts the run before anything is written.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Where results land. `roads` is the optional classified-geometry dump.
#[derive(Debug, Clone)]
pub struct OutputSpec {
    pub table: PathBuf,
    pub roads: Option<PathBuf>,
    pub force: bool,
}

/// What a finished run produced, beyond the files on disk.
#[derive(Debug)]
pub struct RunSummary {
    pub records: Vec<DensityRecord>,
    pub skipped_watersheds: Vec<Arc<str>>,
    pub skipped_roads: usize,
    pub warnings: Vec<String>,
    pub report: Vec<DensityChange>,
}

/// One road-density-near-streams run: load, classify, aggregate, write.
/// Any failure aborts before output is produced; there is no retry.
pub struct Analysis {
    config: AnalysisConfig,
    sources: LayerSources,
    output: OutputSpec,
}

impl Analysis {
    pub fn new(config: AnalysisConfig, sources: LayerSources, output: OutputSpec) -> Self {
        Self { config, sources, output }
    }

    pub fn run(&self, cancel: &CancelToken) -> Result<RunSummary> {
        let crs = store::canonical_crs(&self.sources)?;
        let engine = PlanarEngine::new(crs, self.config.cap_segments);

        let features = store::load(&self.sources, &engine)?;

        let zone = classify::near_stream_zone(
            &engine,
            &features.streams,
            self.config.distance.meters(),
        )?;
        let classification = classify::classify_roads(&engine, &features.roads, &zone)?;

        let aggregation = density::aggregate(
            &engine,
            &features.watersheds,
            &classification.roads,
            self.config.min_watershed_area_m2,
            cancel,
        )?;

        output::write_table(&aggregation.records, &self.output.table, self.output.force)?;
        if let Some(roads_path) = &self.output.roads {
            output::write_roads_geojson(&classification.roads, roads_path, self.output.force)?;
        }

        let report = density::report::change_report(&aggregation.records, self.config.report_rows);

        let mut warnings = classification.warnings;
        warnings.extend(aggregation.warnings);

        Ok(RunSummary {
            records: aggregation.records,
            skipped_watersheds: aggregation.skipped_watersheds,
            skipped_roads: classification.skipped_roads,
            warnings,
            report,
        })
    }
}
