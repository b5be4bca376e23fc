use std::path::PathBuf;

use astref_ingest::IngestError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AstrefError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("dispatch error: {0}")]
    Ingest(#[from] IngestError),
    #[error("malformed AST dump `{}`: {source}", .path.display())]
    MalformedDump {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("malformed AST node: {0}")]
    MalformedNode(String),
    #[error("unknown declaration kind `{kind}` referenced by `{name}`")]
    UnknownDeclKind { kind: String, name: String },
}

impl AstrefError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AstrefError::Ingest(err) if err.is_cancelled())
    }

    pub fn is_malformed_dump(&self) -> bool {
        matches!(self, AstrefError::MalformedDump { .. })
    }
}

pub type Result<T> = std::result::Result<T, AstrefError>;
