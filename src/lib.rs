//! Theme config compiler
//!
//! Merges a theme's main config with its grouped custom config fragments into
//! a single `config.json`, applying the user's group order first and
//! rewriting the fragment store so it mirrors the result.

pub mod compiler;
pub mod layout;
pub mod loader;
pub mod output;
pub mod store;

pub use compiler::{CompileError, CompileOptions, CompileReport, Compiler};
pub use layout::{find_theme_root, LayoutError, ThemeLayout};
pub use store::{CommitStep, FaultPlan, FragmentStore, RewriteReport, StoreError};
pub use themecfg_ordering::{OrderingError, OrderingSpec, Record, ReorderOutcome};
