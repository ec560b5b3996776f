use anyhow::Result;

use crate::cli::{AnalyzeArgs, Cli};
use crate::common::fs::{ensure_dir_exists, require_file_exists};
use crate::config::AnalysisConfig;
use crate::density::report;
use crate::pipeline::{Analysis, CancelToken, OutputSpec};
use crate::store::LayerSources;

pub fn analyze(cli: &Cli, args: &AnalyzeArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(distance) = args.distance {
        config.distance = distance;
    }

    for path in [&args.watersheds, &args.streams, &args.roads, &args.proposed_roads] {
        require_file_exists(path)?;
    }
    ensure_dir_exists(&args.out)?;

    if cli.verbose > 0 {
        eprintln!("[analyze] watersheds={} id_field={}", args.watersheds.display(), args.id_field);
        eprintln!("[analyze] buffer distance = {}", config.distance);
        eprintln!("[analyze] -> {}", args.out.display());
    }

    let sources = LayerSources {
        watersheds: args.watersheds.clone(),
        id_field: args.id_field.clone(),
        streams: args.streams.clone(),
        existing_roads: args.roads.clone(),
        proposed_roads: args.proposed_roads.clone(),
        watershed_epsg: args.epsg_watersheds,
        stream_epsg: args.epsg_streams,
        existing_epsg: args.epsg_roads,
        proposed_epsg: args.epsg_proposed_roads,
    };
    let output = OutputSpec {
        table: args.out.join("density.csv"),
        roads: args.roads_out.then(|| args.out.join("roads.geojson")),
        force: args.force,
    };

    let cancel = CancelToken::new();
    let summary = Analysis::new(config, sources, output).run(&cancel)?;

    for warning in &summary.warnings {
        eprintln!("[analyze] warning: {warning}");
    }
    if cli.verbose > 0 {
        eprintln!(
            "[analyze] wrote {} watershed records ({} skipped, {} roads skipped)",
            summary.records.len(),
            summary.skipped_watersheds.len(),
            summary.skipped_roads
        );
    }

    println!("{}", report::render(&summary.report));

    Ok(())
}
