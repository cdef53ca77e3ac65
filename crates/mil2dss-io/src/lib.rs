//! # mil2dss-io: Feeder Export Import
//!
//! Turns a WindMil-style project directory into a [`mil2dss_core::Feeder`]
//! graph. The pipeline is single-threaded and runs one pass per component:
//!
//! 1. **Table loading** ([`loader`]) - classify files by extension, parse
//!    each with its header/skip rules
//! 2. **Schema binding** ([`binder`]) - slice the header-less class tables
//!    by numeric code and install column names from the headings tables
//! 3. **Graph construction** ([`builder`]) - equipment library, then one
//!    factory per element class in fixed order, then consumer loads
//! 4. **Propagation** ([`propagate`]) - base-voltage fill along the rooted
//!    tree with a graph-level default for disconnected fragments
//!
//! Recoverable problems (unreadable file, orphan load, defaulted kv) are
//! collected in [`mil2dss_core::BuildDiagnostics`]; only a missing project
//! directory or a missing required table aborts the import.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! let result = mil2dss_io::import_project(Path::new("exports/feeder_a"))?;
//! println!("{}", result.diagnostics.summary());
//! println!("{}", result.feeder.stats());
//! # Ok::<(), mil2dss_core::MilError>(())
//! ```
//!
//! The [`config`] module loads the scenario/mapper TOML mappings for the
//! downstream emitter, and [`export`] defines the emitter boundary.

use std::path::Path;

use mil2dss_core::{BuildDiagnostics, Feeder, MilResult};

pub mod binder;
pub mod builder;
pub mod config;
pub mod export;
pub mod loader;
pub mod propagate;

pub use builder::{attach_loads, build_feeder, build_feeder_with, BuildOptions, FeederBuilder};
pub use export::DssEmitter;
pub use loader::{load_project, ProjectTables, TableKind};
pub use propagate::propagate_kv;

/// A constructed feeder plus the diagnostics of its construction.
#[derive(Debug)]
pub struct ImportResult {
    pub feeder: Feeder,
    pub diagnostics: BuildDiagnostics,
}

/// Run the full import pipeline over a project directory.
pub fn import_project(dir: &Path) -> MilResult<ImportResult> {
    import_project_with(dir, &BuildOptions::default())
}

/// Run the full import pipeline with explicit build options.
pub fn import_project_with(dir: &Path, options: &BuildOptions) -> MilResult<ImportResult> {
    let mut diagnostics = BuildDiagnostics::new();
    let tables = loader::load_project(dir, &mut diagnostics)?;
    let mut feeder = builder::build_feeder_with(&tables, options, &mut diagnostics)?;
    propagate::propagate_kv(&mut feeder, &mut diagnostics);
    Ok(ImportResult {
        feeder,
        diagnostics,
    })
}
