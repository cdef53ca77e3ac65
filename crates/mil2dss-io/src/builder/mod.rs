//! Feeder graph construction from bound class tables.
//!
//! [`build_feeder`] runs the factories in a fixed order: equipment library,
//! fuses, lines, switches, transformers, regulators, substation, fake nodes
//! (off by default), loads. Ordering matters: the first factory to reference
//! a node creates it, and the last factory to terminate at a node wins its
//! coordinates.

mod factories;
mod loads;

pub use loads::attach_loads;

use mil2dss_core::{node_id, BuildDiagnostics, Device, Element, Feeder, Kv, MilResult, PhaseSet};
use mil2dss_core::table::Row;
use tracing::warn;

use crate::binder::{bind_device, bind_equipment, DeviceCode, EquipCode};
use crate::loader::{ProjectTables, TableKind};

/// Knobs for feeder construction.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Emit fake-node section edges. Present in every export but disabled
    /// in the main flow; enable for debugging section continuity.
    pub fake_nodes: bool,
}

/// Builder carrying the graph under construction plus diagnostics.
pub struct FeederBuilder<'a> {
    feeder: Feeder,
    diag: &'a mut BuildDiagnostics,
}

impl<'a> FeederBuilder<'a> {
    pub fn new(diag: &'a mut BuildDiagnostics) -> Self {
        Self {
            feeder: Feeder::new(),
            diag,
        }
    }

    /// Record the substation base voltage on the graph (overwriting).
    fn set_kv_base(&mut self, kv: f64) {
        self.feeder.kv_base = Some(kv);
    }

    /// Shared factory tail: compute endpoints, add the directed edge, and
    /// write the `to`-node coordinates when the row carries them.
    ///
    /// Returns false when the row lacks endpoint ids and was skipped.
    fn add_device_row(&mut self, row: &Row, kv: Option<Kv>, device: Device) -> bool {
        let (Some(parent), Some(object)) = (row.text("parentID"), row.text("objectID")) else {
            self.diag.stats.skipped_rows += 1;
            self.diag.add_warning_with_entity(
                "structure",
                "row lacks parentID/objectID; no edge produced",
                row.text("gid").or_else(|| row.text("name")).unwrap_or("?"),
            );
            return false;
        };
        let from = node_id(parent);
        let to = node_id(object);

        let element = element_from_row(row, kv, device);
        self.feeder.add_element(&from, &to, element);

        let x = row.f64("x1");
        let y = row.f64("y1");
        if let Some(bus) = self.feeder.bus_mut(&to) {
            // Unconditional overwrite when present: the last factory to
            // terminate at a node wins its coordinates.
            if x.is_some() {
                bus.x = x;
            }
            if y.is_some() {
                bus.y = y;
            }
        }
        self.diag.stats.elements += 1;
        true
    }

    /// Consume the builder and return the constructed feeder.
    pub fn build(self) -> Feeder {
        self.diag.stats.nodes = self.feeder.graph.node_count();
        self.feeder
    }
}

/// Mandatory element record shared by every factory.
fn element_from_row(row: &Row, kv: Option<Kv>, device: Device) -> Element {
    Element {
        name: row.text("name").unwrap_or_default().to_string(),
        phases: PhaseSet::parse(row.get("phases").unwrap_or_default()),
        gid: row.text("gid").unwrap_or_default().to_string(),
        mgid: row.text("mGID").unwrap_or_default().to_string(),
        substation: row.text("substation").unwrap_or_default().to_string(),
        feeder: row.text("feeder").unwrap_or_default().to_string(),
        kv,
        device,
    }
}

/// Build a feeder from the project tables with default options.
pub fn build_feeder(tables: &ProjectTables, diag: &mut BuildDiagnostics) -> MilResult<Feeder> {
    build_feeder_with(tables, &BuildOptions::default(), diag)
}

/// Build a feeder from the project tables.
///
/// Circuit Elements, Equipment Data, and both headings tables are required;
/// their absence is a structural error. A missing External Tables file only
/// costs the consumer loads.
pub fn build_feeder_with(
    tables: &ProjectTables,
    options: &BuildOptions,
    diag: &mut BuildDiagnostics,
) -> MilResult<Feeder> {
    let elements = tables.require(TableKind::CircuitElements)?;
    let headings = tables.require(TableKind::EquipmentDataHeadings)?;
    let equipment = tables.require(TableKind::EquipmentData)?;
    let lib_headings = tables.require(TableKind::EquipmentLibHeadings)?;

    let mut builder = FeederBuilder::new(diag);

    for class in EquipCode::ALL {
        let catalog = bind_equipment(equipment, lib_headings, *class)?;
        builder.add_catalog(class.heading_key(), catalog);
    }

    builder.add_fuses(&bind_device(elements, headings, DeviceCode::Fuse)?);
    builder.add_lines(
        &bind_device(elements, headings, DeviceCode::OhLine)?,
        &bind_device(elements, headings, DeviceCode::UgLine)?,
    );
    builder.add_switches(&bind_device(elements, headings, DeviceCode::Switch)?);
    builder.add_transformers(&bind_device(elements, headings, DeviceCode::Transformer)?);
    builder.add_regulators(&bind_device(elements, headings, DeviceCode::Regulator)?);
    builder.add_substations(&bind_device(elements, headings, DeviceCode::Substation)?);
    if options.fake_nodes {
        builder.add_fake_nodes(&bind_device(elements, headings, DeviceCode::FakeNodeSection)?);
    }

    let mut feeder = builder.build();

    let service_locations = bind_device(elements, headings, DeviceCode::ServiceLocation)?;
    match tables.get(TableKind::ExternalTables) {
        Some(external) => attach_loads(&mut feeder, &service_locations, external, diag),
        None => {
            warn!("External Tables (.csv) missing; no consumer loads attached");
            diag.add_warning(
                "structure",
                "External Tables (.csv) missing; no consumer loads attached",
            );
        }
    }

    Ok(feeder)
}
