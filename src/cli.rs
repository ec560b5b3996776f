use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

use crate::config::BufferDistance;

/// Road density near streams CLI (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "riparian", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute per-watershed road density near streams
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Watershed polygon shapefile
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub watersheds: PathBuf,

    /// Attribute field holding the unique watershed id
    #[arg(long)]
    pub id_field: String,

    /// Stream centerline shapefile
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub streams: PathBuf,

    /// Existing road shapefile
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub roads: PathBuf,

    /// Proposed road shapefile
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub proposed_roads: PathBuf,

    /// Stream buffer distance, e.g. "100 meters" (default from config)
    #[arg(long)]
    pub distance: Option<BufferDistance>,

    /// Output directory; receives density.csv (and roads.geojson with --roads-out)
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub out: PathBuf,

    /// Also write the classified road portions as GeoJSON
    #[arg(long)]
    pub roads_out: bool,

    /// EPSG override for the watershed layer (.prj sidecar is used otherwise)
    #[arg(long)]
    pub epsg_watersheds: Option<u32>,

    /// EPSG override for the stream layer
    #[arg(long)]
    pub epsg_streams: Option<u32>,

    /// EPSG override for the existing road layer
    #[arg(long)]
    pub epsg_roads: Option<u32>,

    /// EPSG override for the proposed road layer
    #[arg(long)]
    pub epsg_proposed_roads: Option<u32>,

    /// Optional JSON settings file (thresholds, report size)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Overwrite existing outputs
    #[arg(long)]
    pub force: bool,
}
