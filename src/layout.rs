//! On-disk layout of a theme's configuration tree
//!
//! ```text
//! <root>/
//!   .publii_theme_root
//!   config.json                         merged output
//!   config/main.json                    main config
//!   config/custom/groups/*.json         custom config fragments
//!   config/custom/group_order/order.json
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Marker file identifying the theme root
pub const THEME_ROOT_MARKER: &str = ".publii_theme_root";

/// Key under which the ordered fragments are merged into the main config
pub const CUSTOM_CONFIG_KEY: &str = "customConfig";

/// File name of the merged output at the theme root
pub const OUTPUT_FILE_NAME: &str = "config.json";

/// Errors locating the theme root
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(
        "unable to locate theme root: no '.publii_theme_root' file in {} or its parents",
        .start.display()
    )]
    RootNotFound { start: PathBuf },

    #[error("cannot resolve {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Conventional paths below a theme root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeLayout {
    root: PathBuf,
    main_config_file: PathBuf,
    custom_dir: PathBuf,
    groups_dir: PathBuf,
    order_file: PathBuf,
    output_file: PathBuf,
}

impl ThemeLayout {
    /// Build the layout for a known root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config_dir = root.join("config");
        let custom_dir = config_dir.join("custom");

        Self {
            main_config_file: config_dir.join("main.json"),
            groups_dir: custom_dir.join("groups"),
            order_file: custom_dir.join("group_order").join("order.json"),
            output_file: root.join(OUTPUT_FILE_NAME),
            custom_dir,
            root,
        }
    }

    /// Find the root by walking up from `start`, then build the layout
    pub fn discover(start: &Path) -> Result<Self, LayoutError> {
        find_theme_root(start).map(Self::new)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn main_config_file(&self) -> &Path {
        &self.main_config_file
    }

    pub fn custom_dir(&self) -> &Path {
        &self.custom_dir
    }

    /// Directory holding one fragment file per group
    pub fn groups_dir(&self) -> &Path {
        &self.groups_dir
    }

    /// Group order manifest
    pub fn order_file(&self) -> &Path {
        &self.order_file
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }
}

/// Walk `start` and its ancestors looking for [`THEME_ROOT_MARKER`]
pub fn find_theme_root(start: &Path) -> Result<PathBuf, LayoutError> {
    let resolved = fs::canonicalize(start).map_err(|source| LayoutError::Io {
        path: start.to_path_buf(),
        source,
    })?;

    for candidate in resolved.ancestors() {
        if candidate.join(THEME_ROOT_MARKER).is_file() {
            tracing::info!("Theme root: {}", candidate.display());
            return Ok(candidate.to_path_buf());
        }
    }

    Err(LayoutError::RootNotFound { start: resolved })
}
