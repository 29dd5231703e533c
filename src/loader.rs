//! Loading the main config, custom config fragments and the group order

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use themecfg_ordering::{OrderingError, OrderingSpec, Record};

/// Errors for loading inputs. All of them abort before anything is written.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing main config: {}", .0.display())]
    MissingMainConfig(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON in {} must be an object, got {found}", .path.display())]
    NotAnObject { path: PathBuf, found: &'static str },

    #[error("JSON in {} must be an array, got {found}", .path.display())]
    NotAnArray { path: PathBuf, found: &'static str },

    #[error("group order {} must be an array of group names", .path.display())]
    InvalidGroupOrder { path: PathBuf },

    #[error("{}: {source}", .path.display())]
    Ordering {
        path: PathBuf,
        #[source]
        source: OrderingError,
    },
}

/// Custom config records gathered from every fragment file
#[derive(Debug, Clone, Default)]
pub struct Fragments {
    /// Files read, in load order
    pub files: Vec<PathBuf>,
    /// Records concatenated in file order
    pub records: Vec<Record>,
}

/// Load the main config, which must be a single JSON object
pub fn load_main_config(path: &Path) -> Result<Map<String, Value>, LoadError> {
    if !path.is_file() {
        return Err(LoadError::MissingMainConfig(path.to_path_buf()));
    }

    let config = match read_json(path)? {
        Value::Object(map) => map,
        other => {
            return Err(LoadError::NotAnObject {
                path: path.to_path_buf(),
                found: json_type_name(&other),
            })
        }
    };

    tracing::info!("Loaded main config: {}", path.display());
    Ok(config)
}

/// Load every `*.json` fragment in `dir`, sorted by file name
///
/// A missing directory or an empty one yields no records.
pub fn load_fragments(dir: &Path) -> Result<Fragments, LoadError> {
    if !dir.exists() {
        tracing::info!("No custom directory found: {} (skipping)", dir.display());
        return Ok(Fragments::default());
    }

    let files = fragment_files(dir)?;
    if files.is_empty() {
        tracing::info!("No custom JSON files in: {}", dir.display());
        return Ok(Fragments::default());
    }

    let mut records = Vec::new();
    for file in &files {
        let items = match read_json(file)? {
            Value::Array(items) => items,
            other => {
                return Err(LoadError::NotAnArray {
                    path: file.clone(),
                    found: json_type_name(&other),
                })
            }
        };

        for item in items {
            let record = Record::from_value(item).map_err(|source| LoadError::Ordering {
                path: file.clone(),
                source,
            })?;
            records.push(record);
        }
        tracing::info!("Loaded custom config: {}", file.display());
    }

    Ok(Fragments { files, records })
}

/// Load the group order manifest
///
/// A missing file is an empty specification. A single name is rejected.
pub fn load_ordering_spec(path: &Path) -> Result<OrderingSpec, LoadError> {
    if !path.is_file() {
        tracing::info!("Group order json is not found: {} (skipping)", path.display());
        return Ok(OrderingSpec::empty());
    }

    let names: Vec<String> = serde_json::from_value(read_json(path)?).map_err(|_| {
        LoadError::InvalidGroupOrder {
            path: path.to_path_buf(),
        }
    })?;

    let spec = OrderingSpec::new(names).map_err(|source| LoadError::Ordering {
        path: path.to_path_buf(),
        source,
    })?;

    if spec.is_empty() {
        tracing::info!("Group order json is empty (skipping)");
    }
    Ok(spec)
}

fn fragment_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn read_json(path: &Path) -> Result<Value, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Human name of a JSON value's type, for error messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
