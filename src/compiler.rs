//! Config compilation pipeline
//!
//! load main config → load fragments → order groups → rewrite fragment store
//! → merge → write `config.json`.
//!
//! Every input is loaded and validated before anything on disk changes.

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;
use themecfg_ordering::{reorder, Record, ReorderOutcome};

use crate::layout::{LayoutError, ThemeLayout, CUSTOM_CONFIG_KEY};
use crate::loader::{self, LoadError};
use crate::output::{atomic_write, pretty_ascii_bytes};
use crate::store::{partition, FaultPlan, FragmentStore, RewriteReport, StoreError};

/// Errors that abort a compilation
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to serialize merged config: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Knobs for a single run
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Load, validate and order, but write nothing
    pub dry_run: bool,
    /// Failures to inject while replacing the fragment store
    pub faults: FaultPlan,
}

/// What a run did
#[derive(Debug, Clone, Serialize)]
pub struct CompileReport {
    pub theme_root: PathBuf,
    pub main_config: PathBuf,
    /// Fragment files read, in load order
    pub fragment_files: Vec<PathBuf>,
    pub record_count: usize,
    /// None when no group order was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<ReorderOutcome>,
    /// None on a dry run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<RewriteReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// SHA-256 of the written `config.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_sha256: Option<String>,
    pub dry_run: bool,
}

/// Compiles one theme's configuration tree
pub struct Compiler {
    layout: ThemeLayout,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(layout: ThemeLayout) -> Self {
        Self {
            layout,
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn layout(&self) -> &ThemeLayout {
        &self.layout
    }

    /// Run the full pipeline
    pub fn run(&self) -> Result<CompileReport, CompileError> {
        let main_config = loader::load_main_config(self.layout.main_config_file())?;
        let fragments = loader::load_fragments(self.layout.groups_dir())?;
        let spec = loader::load_ordering_spec(self.layout.order_file())?;

        let (records, ordering) = if spec.is_empty() {
            (fragments.records, None)
        } else {
            let mut outcome = reorder(fragments.records, &spec);
            let records = std::mem::take(&mut outcome.records);
            (records, Some(outcome))
        };

        let buckets = partition(&records)?;

        let mut report = CompileReport {
            theme_root: self.layout.root().to_path_buf(),
            main_config: self.layout.main_config_file().to_path_buf(),
            fragment_files: fragments.files,
            record_count: records.len(),
            ordering,
            rewrite: None,
            output_path: None,
            output_sha256: None,
            dry_run: self.options.dry_run,
        };

        if self.options.dry_run {
            tracing::info!(
                "Dry run: {} record(s) in {} group(s), nothing written",
                records.len(),
                buckets.len()
            );
            return Ok(report);
        }

        let store =
            FragmentStore::from_layout(&self.layout).with_faults(self.options.faults.clone());
        report.rewrite = Some(store.rewrite(&buckets, spec.names())?);

        let merged = merge(&main_config, records);
        let mut bytes = pretty_ascii_bytes(&merged).map_err(CompileError::Serialize)?;
        bytes.push(b'\n');

        let out_path = self.layout.output_file();
        atomic_write(out_path, &bytes).map_err(|source| CompileError::Write {
            path: out_path.to_path_buf(),
            source,
        })?;
        tracing::info!("Wrote merged config to: {}", out_path.display());

        report.output_path = Some(out_path.to_path_buf());
        report.output_sha256 = Some(compute_sha256(&bytes));
        Ok(report)
    }
}

/// Copy of `main_config` with the records under [`CUSTOM_CONFIG_KEY`]
///
/// An existing key of that name is replaced in place.
pub fn merge(main_config: &Map<String, Value>, records: Vec<Record>) -> Value {
    let mut merged = main_config.clone();
    let custom: Vec<Value> = records.into_iter().map(Value::from).collect();
    merged.insert(CUSTOM_CONFIG_KEY.to_string(), Value::Array(custom));
    Value::Object(merged)
}

/// Compute SHA-256 of bytes and return hex string
pub fn compute_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
