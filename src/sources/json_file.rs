//! JSON estimate documents from files, glob patterns or stdin

use super::{split_documents, DocumentSource, RawDocument};
use crate::types::{EstimergeError, Result};
use rayon::prelude::*;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Input naming stdin
const STDIN_INPUT: &str = "-";

#[derive(Debug, Clone, PartialEq)]
enum Input {
    Stdin,
    File(PathBuf),
}

/// Loads one estimate document per JSON file
pub struct JsonFileSource {
    inputs: Vec<String>,
}

impl JsonFileSource {
    /// Inputs are file paths, glob patterns, or `-` for stdin
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
        }
    }

    /// Expand patterns in input order.
    /// Existing files are taken verbatim, even when their names contain
    /// pattern characters. A literal path matching nothing is kept so that
    /// reading it reports the missing file.
    fn expand(&self) -> Result<Vec<Input>> {
        let mut expanded = Vec::new();
        for input in &self.inputs {
            if input == STDIN_INPUT {
                if expanded.contains(&Input::Stdin) {
                    return Err(EstimergeError::Parse(
                        "stdin (`-`) can only be given once".into(),
                    ));
                }
                expanded.push(Input::Stdin);
                continue;
            }

            if Path::new(input).is_file() {
                expanded.push(Input::File(PathBuf::from(input)));
                continue;
            }

            let matches: Vec<PathBuf> = glob::glob(input)
                .map_err(|e| EstimergeError::Parse(format!("invalid pattern {}: {}", input, e)))?
                .filter_map(|entry| entry.ok())
                .filter(|path| path.is_file())
                .collect();

            if matches.is_empty() {
                if is_pattern(input) {
                    tracing::warn!(pattern = %input, "pattern matched no files");
                } else {
                    expanded.push(Input::File(PathBuf::from(input)));
                }
            } else {
                expanded.extend(matches.into_iter().map(Input::File));
            }
        }
        Ok(expanded)
    }
}

impl DocumentSource for JsonFileSource {
    fn name(&self) -> &str {
        "json-file"
    }

    fn load(&self) -> Result<Vec<RawDocument>> {
        let inputs = self.expand()?;
        let loaded: Vec<Vec<RawDocument>> = inputs
            .par_iter()
            .map(|input| match input {
                Input::Stdin => read_stdin(),
                Input::File(path) => read_file(path).map(|doc| vec![doc]),
            })
            .collect::<Result<_>>()?;
        Ok(loaded.into_iter().flatten().collect())
    }
}

fn is_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

fn read_file(path: &Path) -> Result<RawDocument> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        EstimergeError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    let value: Value = serde_json::from_str(&content)
        .map_err(|e| EstimergeError::Parse(format!("{}: {}", path.display(), e)))?;
    Ok(RawDocument {
        origin: Some(path.to_path_buf()),
        value,
    })
}

fn read_stdin() -> Result<Vec<RawDocument>> {
    let mut content = String::new();
    std::io::stdin().lock().read_to_string(&mut content)?;
    let value: Value = serde_json::from_str(&content)?;
    Ok(split_documents(value)
        .into_iter()
        .map(|value| RawDocument {
            origin: None,
            value,
        })
        .collect())
}
