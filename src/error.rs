use thiserror::Error;

/// Failure kinds surfaced to the caller. Carried inside `anyhow::Error` so
/// context can be attached along the way; match with `downcast_ref`.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing, empty, or duplicate watershed id field.
    #[error("schema error: {0}")]
    Schema(String),

    /// A layer's coordinate system could not be established or converted.
    #[error("reprojection error: {0}")]
    Reprojection(String),

    /// Degenerate or empty geometry passed to a geometry operation.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Angular units where a linear measurement is required.
    #[error("unprojected coordinate system: {0}")]
    UnprojectedCrs(String),

    /// Output destination unwritable or already present.
    #[error("write error: {0}")]
    Write(String),

    /// The run was cancelled between watersheds.
    #[error("analysis cancelled")]
    Cancelled,
}
