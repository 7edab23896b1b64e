use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to load o3de manifest {}: {reason}", .path.display())]
    ManifestLoad { path: PathBuf, reason: String },

    #[error("Failed to fetch {uri}: {reason}")]
    Fetch { uri: String, reason: String },

    #[error("Downloadable {kind} '{name}' not found\n\n\
             Hint: None of the configured repositories advertise this object.\n\n\
             Solutions:\n\
             1. Check the name spelling (names are case-sensitive)\n\
             2. Refresh the repository cache:\n\
                o3de-fetch refresh-repos\n\
             3. Verify the repository is listed under \"repos\" in o3de_manifest.json")]
    NotFound { kind: String, name: String },

    #[error("SECURITY VIOLATION: {0}")]
    Integrity(String),

    #[error("Destination path {} already exists", .0.display())]
    DestinationConflict(PathBuf),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Checkout failed: {0}")]
    Checkout(String),

    #[error("Registration failed: {0}")]
    Registration(String),

    #[error("Repository {uri} is not valid: {reason}")]
    InvalidRepository { uri: String, reason: String },

    #[error("Invalid object descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("{0} name cannot be empty")]
    InvalidName(String),

    #[error("Resolution did not finish within {0} seconds")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),
}
