#![doc = "Road density near streams, aggregated per watershed"]
pub mod classify;
pub mod cli;
pub mod commands;
pub mod common;
pub mod config;
pub mod density;
pub mod error;
pub mod geom;
pub mod output;
pub mod pipeline;
pub mod store;

#[doc(inline)]
pub use config::{AnalysisConfig, BufferDistance, LinearUnit};

#[doc(inline)]
pub use error::Error;

#[doc(inline)]
pub use pipeline::{Analysis, CancelToken, OutputSpec, RunSummary};

#[doc(inline)]
pub use store::LayerSources;
