//! Error types shared across the topology builder.

use thiserror::Error;

/// Errors surfaced while declaring or synthesizing a topology.
#[derive(Error, Debug)]
pub enum Error {
    /// Two display names collapsed to the same logical identifier
    #[error("logical id '{id}' already generated from '{existing}', conflicting source '{conflicting}'")]
    DuplicateIdentifier {
        id: String,
        existing: String,
        conflicting: String,
    },

    /// A logical id was declared twice in the resource graph
    #[error("logical id '{id}' is already declared in the graph")]
    DuplicateResource { id: String },

    /// A container mount point referenced a volume its task definition never declared
    #[error("container '{container}' mounts unknown volume '{volume}' in task family '{family}'")]
    UnknownVolume {
        container: String,
        volume: String,
        family: String,
    },

    /// A declaration references a logical id missing from the graph
    #[error("'{referenced_by}' references unknown logical id '{id}'")]
    UnknownResource { id: String, referenced_by: String },

    /// Configuration failed validation
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
