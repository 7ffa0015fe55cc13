use std::path::PathBuf;
use thiserror::Error;

/// Every way a single manifest-to-diagram conversion can fail. All variants
/// are terminal; nothing in the crate retries.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] json5::Error),

    #[error("invalid config value {field} = {value}: must be {expected}")]
    ConfigInvalid {
        field: &'static str,
        value: f32,
        expected: &'static str,
    },

    #[error("layout provider returned no positions for {nodes} node(s)")]
    LayoutUnavailable { nodes: usize },

    #[error("failed to serialize diagram: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("failed to serialize diagram: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialized diagram is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
