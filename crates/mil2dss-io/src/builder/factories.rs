//! Per-class element factories.
//!
//! Each factory walks one bound class table and emits directed edges via
//! [`FeederBuilder::add_device_row`]. Class-specific columns are read here;
//! the mandatory record fields are shared in the builder module.

use std::collections::BTreeMap;

use mil2dss_core::table::{Row, Table};
use mil2dss_core::{
    Device, FuseDevice, Kv, LineDevice, LineKind, Phase, PhaseSet, RegulatorDevice,
    SubstationDevice, SwitchDevice, TransformerDevice,
};

use super::FeederBuilder;

fn per_phase_text(row: &Row, prefix: &str) -> [String; 3] {
    ["A", "B", "C"].map(|phase| {
        row.text(&format!("{prefix}{phase}"))
            .unwrap_or_default()
            .to_string()
    })
}

fn per_phase_f64(row: &Row, prefix: &str) -> [f64; 3] {
    ["A", "B", "C"].map(|phase| row.f64(&format!("{prefix}{phase}")).unwrap_or(0.0))
}

/// Per-phase conductor names for a line row. Only phases the element
/// carries get a wire entry; the neutral is always present, with the empty
/// string standing in when the column holds no conductor name (bare
/// numbers appear there for unwired neutrals).
fn line_wires(row: &Row, phases: PhaseSet) -> BTreeMap<Phase, String> {
    let mut wires = BTreeMap::new();
    for (phase, column) in [(Phase::A, "condA"), (Phase::B, "condB"), (Phase::C, "condC")] {
        if phases.contains(phase) {
            wires.insert(
                phase,
                row.text(column).unwrap_or_default().to_string(),
            );
        }
    }
    let neutral = match row.text("condN") {
        Some(value) if value.parse::<f64>().is_err() => value.to_string(),
        _ => String::new(),
    };
    wires.insert(Phase::N, neutral);
    wires
}

impl FeederBuilder<'_> {
    /// Store one bound equipment catalog on the graph side data.
    pub fn add_catalog(&mut self, class: &str, catalog: Table) {
        self.feeder.library.insert(class, catalog);
    }

    /// Overhead and underground conductor sections.
    pub fn add_lines(&mut self, overhead: &Table, underground: &Table) {
        for (table, kind) in [
            (overhead, LineKind::Overhead),
            (underground, LineKind::Underground),
        ] {
            for row in table.iter() {
                let phases = PhaseSet::parse(row.get("phases").unwrap_or_default());
                let device = Device::Line(LineDevice {
                    kind,
                    grade: row.text("grade").unwrap_or_default().to_string(),
                    length: row.f64("length"),
                    wires: line_wires(&row, phases),
                });
                self.add_device_row(&row, None, device);
            }
        }
    }

    pub fn add_switches(&mut self, switches: &Table) {
        for row in switches.iter() {
            let device = Device::Switch(SwitchDevice {
                state: row.text("state").unwrap_or_default().to_string(),
                partner: row.text("partner").unwrap_or_default().to_string(),
            });
            self.add_device_row(&row, None, device);
        }
    }

    pub fn add_fuses(&mut self, fuses: &Table) {
        for row in fuses.iter() {
            let device = Device::Fuse(FuseDevice {
                equipment: per_phase_text(&row, "equip"),
                facility: row.text("facility").unwrap_or_default().to_string(),
                aux1: row.f64("aux1"),
                aux2: row.f64("aux2"),
            });
            self.add_device_row(&row, None, device);
        }
    }

    /// Two-winding transformers. The edge kv is the (high, low) pair; a
    /// row with only the high side degrades to a scalar.
    pub fn add_transformers(&mut self, transformers: &Table) {
        for row in transformers.iter() {
            let kv = match (row.f64("uh"), row.f64("ul")) {
                (Some(high), Some(low)) => Some(Kv::Pair(high, low)),
                (Some(high), None) => Some(Kv::Scalar(high)),
                _ => None,
            };
            let device = Device::Transformer(TransformerDevice {
                sphases: row.text("sphases").unwrap_or_default().to_string(),
                unom: row.f64("unom"),
                kva: per_phase_f64(&row, "kva"),
                equipment: per_phase_text(&row, "equip"),
                data: per_phase_text(&row, "data"),
            });
            self.add_device_row(&row, kv, device);
        }
    }

    pub fn add_regulators(&mut self, regulators: &Table) {
        for row in regulators.iter() {
            let device = Device::Regulator(RegulatorDevice {
                facility: row.text("facility").unwrap_or_default().to_string(),
                u: per_phase_f64(&row, "u"),
                equipment: per_phase_text(&row, "equip"),
                fh_hi: per_phase_f64(&row, "fhHi"),
            });
            self.add_device_row(&row, None, device);
        }
    }

    /// The substation tie. Creation records the base voltage on the graph,
    /// overwriting any earlier value.
    pub fn add_substations(&mut self, substations: &Table) {
        for row in substations.iter() {
            let kv = row.f64("kv");
            let device = Device::Substation(SubstationDevice {
                upu: row.f64("upu"),
                oh_gnd_z: row.f64("ohGndZ"),
                ug_gnd_z: row.f64("ugGndZ"),
            });
            if self.add_device_row(&row, kv.map(Kv::Scalar), device) {
                if let Some(kv) = kv {
                    self.set_kv_base(kv);
                }
            }
        }
    }

    pub fn add_fake_nodes(&mut self, fake_nodes: &Table) {
        for row in fake_nodes.iter() {
            self.add_device_row(&row, None, Device::FakeNode);
        }
    }
}
