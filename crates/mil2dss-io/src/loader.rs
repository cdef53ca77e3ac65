//! Project-directory table discovery and parsing.
//!
//! A project is a flat directory of delimited text files; the lowercase
//! extension decides which logical table a file carries. Three parse rules
//! vary per table: presence of a header row, and whether a leading line is
//! skipped. Everything else is uniform comma-delimited text handled by the
//! `csv` crate.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use mil2dss_core::{BuildDiagnostics, MilError, MilResult, Table};
use tracing::warn;

/// The logical tables of a feeder export, with their fixed extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableKind {
    Assemblies,
    ArchivedLoad,
    LoadControlPoints,
    BillingLoadData,
    ExternalTables,
    EquipmentData,
    CircuitElements,
    Results,
    StructureLocations,
    MapPoints,
    EquipmentDataHeadings,
    EquipmentLibHeadings,
}

impl TableKind {
    /// All recognized tables.
    pub const ALL: &'static [TableKind] = &[
        TableKind::Assemblies,
        TableKind::ArchivedLoad,
        TableKind::LoadControlPoints,
        TableKind::BillingLoadData,
        TableKind::ExternalTables,
        TableKind::EquipmentData,
        TableKind::CircuitElements,
        TableKind::Results,
        TableKind::StructureLocations,
        TableKind::MapPoints,
        TableKind::EquipmentDataHeadings,
        TableKind::EquipmentLibHeadings,
    ];

    /// File extension (lowercase, without the dot) carrying this table.
    pub fn extension(&self) -> &'static str {
        match self {
            TableKind::Assemblies => "asm",
            TableKind::ArchivedLoad => "cld",
            TableKind::LoadControlPoints => "lcp",
            TableKind::BillingLoadData => "sld",
            TableKind::ExternalTables => "csv",
            TableKind::EquipmentData => "seq",
            TableKind::CircuitElements => "std",
            TableKind::Results => "rsl",
            TableKind::StructureLocations => "gps",
            TableKind::MapPoints => "mpt",
            TableKind::EquipmentDataHeadings => "stdlib",
            TableKind::EquipmentLibHeadings => "seqlib",
        }
    }

    /// Human-readable table name.
    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Assemblies => "Assemblies",
            TableKind::ArchivedLoad => "Archived Load",
            TableKind::LoadControlPoints => "Load Control Points",
            TableKind::BillingLoadData => "Billing Load Data",
            TableKind::ExternalTables => "External Tables",
            TableKind::EquipmentData => "Equipment Data",
            TableKind::CircuitElements => "Circuit Elements",
            TableKind::Results => "Results",
            TableKind::StructureLocations => "Structure Locations",
            TableKind::MapPoints => "Map Points",
            TableKind::EquipmentDataHeadings => "Equipment Data Headings",
            TableKind::EquipmentLibHeadings => "Equipment Lib Headings",
        }
    }

    /// Classify a file by its lowercase extension.
    pub fn from_extension(ext: &str) -> Option<TableKind> {
        let ext = ext.to_ascii_lowercase();
        TableKind::ALL.iter().copied().find(|k| k.extension() == ext)
    }

    /// Whether the file carries a header row with column names. The
    /// header-less tables stay positional until the schema binder installs
    /// names.
    pub fn has_header(&self) -> bool {
        !matches!(
            self,
            TableKind::MapPoints
                | TableKind::ArchivedLoad
                | TableKind::BillingLoadData
                | TableKind::EquipmentData
                | TableKind::CircuitElements
        )
    }

    /// Leading lines to discard before any parsing.
    pub fn skip_lines(&self) -> usize {
        match self {
            TableKind::CircuitElements | TableKind::EquipmentData => 1,
            _ => 0,
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The parsed tables of one project directory.
#[derive(Debug, Clone, Default)]
pub struct ProjectTables {
    tables: BTreeMap<TableKind, Table>,
}

impl ProjectTables {
    pub fn insert(&mut self, kind: TableKind, table: Table) {
        self.tables.insert(kind, table);
    }

    pub fn get(&self, kind: TableKind) -> Option<&Table> {
        self.tables.get(&kind)
    }

    /// Fetch a table a factory cannot proceed without.
    pub fn require(&self, kind: TableKind) -> MilResult<&Table> {
        self.tables.get(&kind).ok_or_else(|| {
            MilError::Structure(format!(
                "required table '{}' (.{}) is missing from the project",
                kind.name(),
                kind.extension()
            ))
        })
    }

    pub fn kinds(&self) -> impl Iterator<Item = TableKind> + '_ {
        self.tables.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Parse one file according to its table's header/skip rules.
pub fn parse_table(path: &Path, kind: TableKind) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {} table '{}'", kind.name(), path.display()))?;

    let mut records = Vec::new();
    for record in reader.records() {
        let record =
            record.with_context(|| format!("reading {} table '{}'", kind.name(), path.display()))?;
        records.push(record.iter().map(str::to_string).collect::<Vec<String>>());
    }

    let mut rows = records.into_iter().skip(kind.skip_lines());
    let mut table = if kind.has_header() {
        match rows.next() {
            Some(header) => Table::new(header),
            None => Table::positional(),
        }
    } else {
        Table::positional()
    };
    for row in rows {
        table.push_row(row);
    }
    Ok(table)
}

/// Discover and parse the tables of a project directory (non-recursive).
///
/// Fails with a configuration error when the directory does not exist or
/// contains zero recognized files. An unreadable file is logged as a
/// warning and omitted; a factory that needs it will fail with a
/// structural error later.
pub fn load_project(dir: &Path, diag: &mut BuildDiagnostics) -> MilResult<ProjectTables> {
    if !dir.is_dir() {
        return Err(MilError::Config(format!(
            "project directory '{}' does not exist",
            dir.display()
        )));
    }

    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut tables = ProjectTables::default();
    for path in paths {
        let Some(kind) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(TableKind::from_extension)
        else {
            continue;
        };
        match parse_table(&path, kind) {
            Ok(table) => tables.insert(kind, table),
            Err(err) => {
                warn!(table = kind.name(), path = %path.display(), error = %err,
                    "skipping unreadable table");
                diag.add_warning_with_entity(
                    "parse",
                    &format!("could not parse {} table: {err:#}", kind.name()),
                    &path.display().to_string(),
                );
            }
        }
    }

    if tables.is_empty() {
        return Err(MilError::Config(format!(
            "project directory '{}' contains no recognized tables",
            dir.display()
        )));
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_extension_mapping_is_exact() {
        let expected = [
            ("asm", TableKind::Assemblies),
            ("cld", TableKind::ArchivedLoad),
            ("lcp", TableKind::LoadControlPoints),
            ("sld", TableKind::BillingLoadData),
            ("csv", TableKind::ExternalTables),
            ("seq", TableKind::EquipmentData),
            ("std", TableKind::CircuitElements),
            ("rsl", TableKind::Results),
            ("gps", TableKind::StructureLocations),
            ("mpt", TableKind::MapPoints),
            ("stdlib", TableKind::EquipmentDataHeadings),
            ("seqlib", TableKind::EquipmentLibHeadings),
        ];
        for (ext, kind) in expected {
            assert_eq!(TableKind::from_extension(ext), Some(kind), "{ext}");
        }
        assert_eq!(TableKind::from_extension("STD"), Some(TableKind::CircuitElements));
        assert_eq!(TableKind::from_extension("txt"), None);
    }

    #[test]
    fn test_header_and_skip_rules() {
        for kind in [
            TableKind::MapPoints,
            TableKind::ArchivedLoad,
            TableKind::BillingLoadData,
            TableKind::EquipmentData,
            TableKind::CircuitElements,
        ] {
            assert!(!kind.has_header(), "{kind} should be header-less");
        }
        assert!(TableKind::ExternalTables.has_header());
        assert!(TableKind::EquipmentDataHeadings.has_header());

        assert_eq!(TableKind::CircuitElements.skip_lines(), 1);
        assert_eq!(TableKind::EquipmentData.skip_lines(), 1);
        assert_eq!(TableKind::MapPoints.skip_lines(), 0);
    }

    #[test]
    fn test_parse_headerless_with_skip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feeder.std");
        fs::write(&path, "WindMil export v9\nsub1,9,src,b1,ABC\nline1,1,b1,b2,ABC\n").unwrap();

        let table = parse_table(&path, TableKind::CircuitElements).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.columns().is_empty());
        assert_eq!(table.row(0).unwrap().get_at(1), Some("9"));
    }

    #[test]
    fn test_parse_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("consumers.csv");
        fs::write(&path, "table,id,X,Y\nConsumers,m1,2,0.1\n").unwrap();

        let table = parse_table(&path, TableKind::ExternalTables).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.row(0).unwrap().get("id"), Some("m1"));
    }

    #[test]
    fn test_load_project_missing_dir() {
        let mut diag = BuildDiagnostics::new();
        let err = load_project(Path::new("/nonexistent/project"), &mut diag).unwrap_err();
        assert!(matches!(err, MilError::Config(_)));
    }

    #[test]
    fn test_load_project_no_recognized_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.txt"), "not a table").unwrap();
        let mut diag = BuildDiagnostics::new();
        let err = load_project(dir.path(), &mut diag).unwrap_err();
        assert!(matches!(err, MilError::Config(_)));
    }

    #[test]
    fn test_load_project_classifies_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("feeder.std"), "title\nsub1,9,src,b1\n").unwrap();
        fs::write(dir.path().join("points.mpt"), "1,2,3\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut diag = BuildDiagnostics::new();
        let tables = load_project(dir.path(), &mut diag).unwrap();
        assert_eq!(tables.len(), 2);
        assert!(tables.get(TableKind::CircuitElements).is_some());
        assert!(tables.get(TableKind::MapPoints).is_some());
        assert!(tables.get(TableKind::ExternalTables).is_none());
    }

    #[test]
    fn test_require_missing_is_structural() {
        let tables = ProjectTables::default();
        let err = tables.require(TableKind::CircuitElements).unwrap_err();
        assert!(matches!(err, MilError::Structure(_)));
        assert!(err.to_string().contains("Circuit Elements"));
    }
}
