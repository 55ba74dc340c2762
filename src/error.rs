use crate::location::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("terrain of region {0} is not observable")]
    TerrainUnavailable(String),
    #[error("no tile satisfies the hub placement constraints")]
    NoValidHub,
    #[error("region contains no walkable tiles")]
    NoWalkableTiles,
    #[error("point of interest at ({}, {}) has no path to the hub", .0.x(), .0.y())]
    UnreachablePointOfInterest(Location),
    #[error("stored {key} record is schema version {found}, newer than supported version {supported}")]
    UnsupportedVersion {
        key: String,
        found: u32,
        supported: u32,
    },
    #[error("failed to encode or decode a stored record")]
    Serialization(#[from] serde_json::Error),
}
