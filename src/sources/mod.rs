//! Document sources that supply raw estimate documents

mod json_file;

pub use json_file::JsonFileSource;

use crate::types::Result;
use serde_json::Value;
use std::path::PathBuf;

/// One raw estimate document and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// File path, or `None` for stdin
    pub origin: Option<PathBuf>,
    pub value: Value,
}

impl RawDocument {
    /// Human-readable origin for diagnostics
    pub fn label(&self) -> String {
        match &self.origin {
            Some(path) => path.display().to_string(),
            None => "<stdin>".to_string(),
        }
    }
}

/// Trait for acquiring raw estimate documents
pub trait DocumentSource: Send + Sync {
    /// Source name (e.g., "json-file")
    fn name(&self) -> &str;

    /// Load every document, in input order
    fn load(&self) -> Result<Vec<RawDocument>>;
}

/// Split a stdin payload: a JSON array is a list of documents, anything
/// else is one document
pub(crate) fn split_documents(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}
