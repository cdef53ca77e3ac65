//! Scenario and mapper configuration loading.
//!
//! The downstream emitter receives two mappings loaded from TOML files: a
//! "scenario" mapping and a "mapper" mapping. Both are opaque to this crate
//! and are passed through unmodified, so they load as plain `toml::Table`
//! values rather than typed structs.

use std::fs;
use std::path::Path;

use mil2dss_core::{MilError, MilResult};

/// Load the scenario mapping from a TOML file.
pub fn load_scenario(path: &Path) -> MilResult<toml::Table> {
    load_mapping(path, "scenario")
}

/// Load the mapper mapping from a TOML file.
pub fn load_mapper(path: &Path) -> MilResult<toml::Table> {
    load_mapping(path, "mapper")
}

fn load_mapping(path: &Path, what: &str) -> MilResult<toml::Table> {
    let content = fs::read_to_string(path).map_err(|err| {
        MilError::Config(format!(
            "cannot read {what} mapping \"{}\": {err}",
            path.display()
        ))
    })?;
    content.parse::<toml::Table>().map_err(|err| {
        MilError::Config(format!(
            "invalid {what} mapping \"{}\": {err}",
            path.display()
        ))
    })
}
