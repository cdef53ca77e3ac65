//! Column-name binding for the header-less class tables.
//!
//! Circuit Elements and Equipment Data carry a numeric class code in column
//! index 1. The code tables below are fixed vendor constants and must match
//! the export exactly. Column names come from the companion headings
//! tables, keyed by class name: one row per class, first cell the class
//! name, remaining cells the ordered column names.

use mil2dss_core::{MilError, MilResult, Table};

/// Column index carrying the numeric class code in header-less tables.
pub const CLASS_CODE_COLUMN: usize = 1;

/// Element classes of the Circuit Elements table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCode {
    OhLine,
    UgLine,
    Regulator,
    Transformer,
    Switch,
    FakeNodeSection,
    Substation,
    Fuse,
    ServiceLocation,
}

impl DeviceCode {
    pub const ALL: &'static [DeviceCode] = &[
        DeviceCode::OhLine,
        DeviceCode::UgLine,
        DeviceCode::Regulator,
        DeviceCode::Transformer,
        DeviceCode::Switch,
        DeviceCode::FakeNodeSection,
        DeviceCode::Substation,
        DeviceCode::Fuse,
        DeviceCode::ServiceLocation,
    ];

    /// Numeric class code in the Circuit Elements table.
    pub fn code(&self) -> u32 {
        match self {
            DeviceCode::OhLine => 1,
            DeviceCode::UgLine => 3,
            DeviceCode::Regulator => 4,
            DeviceCode::Transformer => 5,
            DeviceCode::Switch => 6,
            DeviceCode::FakeNodeSection => 8,
            DeviceCode::Substation => 9,
            DeviceCode::Fuse => 10,
            DeviceCode::ServiceLocation => 13,
        }
    }

    /// Class name keying the Equipment Data Headings table.
    pub fn heading_key(&self) -> &'static str {
        match self {
            DeviceCode::OhLine => "OH lines",
            DeviceCode::UgLine => "UG lines",
            DeviceCode::Regulator => "Regulators",
            DeviceCode::Transformer => "Transformers",
            DeviceCode::Switch => "Switches",
            DeviceCode::FakeNodeSection => "Fake Node Sections",
            DeviceCode::Substation => "Substations",
            DeviceCode::Fuse => "Fuse",
            DeviceCode::ServiceLocation => "Service Locations",
        }
    }
}

/// Catalog classes of the Equipment Data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipCode {
    OhCable,
    UgCable,
    TransformerType,
    RegulatorType,
    LoadType,
    WireLayout,
    ProtectionType,
    ProtectionExtended,
}

impl EquipCode {
    pub const ALL: &'static [EquipCode] = &[
        EquipCode::OhCable,
        EquipCode::UgCable,
        EquipCode::TransformerType,
        EquipCode::RegulatorType,
        EquipCode::LoadType,
        EquipCode::WireLayout,
        EquipCode::ProtectionType,
        EquipCode::ProtectionExtended,
    ];

    /// Numeric class code in the Equipment Data table.
    pub fn code(&self) -> u32 {
        match self {
            EquipCode::OhCable => 1,
            EquipCode::UgCable => 2,
            EquipCode::TransformerType => 5,
            EquipCode::RegulatorType => 6,
            EquipCode::LoadType => 7,
            EquipCode::WireLayout => 8,
            EquipCode::ProtectionType => 10,
            EquipCode::ProtectionExtended => 11,
        }
    }

    /// Class name keying the Equipment Lib Headings table.
    pub fn heading_key(&self) -> &'static str {
        match self {
            EquipCode::OhCable => "OH cables",
            EquipCode::UgCable => "UG cables",
            EquipCode::TransformerType => "Transformer types",
            EquipCode::RegulatorType => "Regulator types",
            EquipCode::LoadType => "Load types",
            EquipCode::WireLayout => "Wire layouts",
            EquipCode::ProtectionType => "Protection device types",
            EquipCode::ProtectionExtended => "Protection extended",
        }
    }
}

/// Rows of `table` whose class-code column equals `code`, reindexed.
pub fn slice_by_code(table: &Table, code: u32) -> Table {
    let mut sliced = Table::positional();
    for row in table.iter() {
        let row_code = row
            .get_at(CLASS_CODE_COLUMN)
            .and_then(|cell| cell.trim().parse::<u32>().ok());
        if row_code == Some(code) {
            sliced.push_row(row.cells().to_vec());
        }
    }
    sliced
}

/// Ordered column names for `class_key` from a headings table.
pub fn heading_columns(headings: &Table, class_key: &str) -> Option<Vec<String>> {
    for row in headings.iter() {
        if row.get_at(0).map(str::trim) == Some(class_key) {
            let columns = row.cells()[1..]
                .iter()
                .map(|cell| cell.trim().to_string())
                .filter(|cell| !cell.is_empty())
                .collect();
            return Some(columns);
        }
    }
    None
}

fn bind(table: &Table, code: u32, headings: &Table, class_key: &str) -> MilResult<Table> {
    let mut sliced = slice_by_code(table, code);
    match heading_columns(headings, class_key) {
        Some(columns) => sliced.rename(columns),
        // Data rows without column names cannot be interpreted; an absent
        // class is fine.
        None if !sliced.is_empty() => {
            return Err(MilError::Structure(format!(
                "headings table has no row for class '{class_key}'"
            )))
        }
        None => {}
    }
    Ok(sliced)
}

/// Bind one element class out of the Circuit Elements table.
pub fn bind_device(elements: &Table, headings: &Table, class: DeviceCode) -> MilResult<Table> {
    bind(elements, class.code(), headings, class.heading_key())
}

/// Bind one catalog class out of the Equipment Data table.
pub fn bind_equipment(equipment: &Table, headings: &Table, class: EquipCode) -> MilResult<Table> {
    bind(equipment, class.code(), headings, class.heading_key())
}
