use thiserror::Error;

/// Errors raised by the core rules.
///
/// None of these are fatal for a running view: load failures fall back to an
/// empty collection and editor errors are reported to the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid GeoJSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a FeatureCollection, found {0:?}")]
    NotACollection(String),

    #[error("Feature at index {0} has no geometry")]
    MissingGeometry(usize),

    #[error("Invalid level filter: {0:?}")]
    InvalidLevelFilter(String),

    #[error("Unknown editor field: {0:?}")]
    UnknownField(String),

    #[error("No feature selected")]
    NoSelection,
}
