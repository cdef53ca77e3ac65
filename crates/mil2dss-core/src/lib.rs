//! # mil2dss-core: Feeder Graph Model
//!
//! Fundamental data structures for the WindMil-style feeder pipeline: a
//! directed graph of buses and branch elements plus graph-level side data
//! (substation base voltage, equipment catalogs).
//!
//! ## Design
//!
//! The feeder is a **directed multigraph** rooted at the substation's parent
//! node:
//! - **Nodes**: buses, keyed by a normalized string id
//! - **Edges**: two-terminal branch elements (lines, switches, fuses,
//!   transformers, regulators, the substation tie)
//!
//! An edge's `from` endpoint is the source side; downstream consumers rely
//! on that orientation for upstream walks. Endpoint nodes are created
//! implicitly the first time an edge references them. Heterogeneous
//! per-class attributes are a tagged [`Device`] enum rather than an
//! inheritance ladder, so missing fields are simply absent.
//!
//! ## Quick Start
//!
//! ```rust
//! use mil2dss_core::*;
//!
//! let mut feeder = Feeder::new();
//! let element = Element {
//!     name: "tie".to_string(),
//!     phases: PhaseSet::parse("ABC"),
//!     gid: "g-1".to_string(),
//!     mgid: "m-1".to_string(),
//!     substation: "North".to_string(),
//!     feeder: "F1".to_string(),
//!     kv: Some(Kv::Scalar(11.0)),
//!     device: Device::Substation(SubstationDevice::default()),
//! };
//! feeder.add_element(&node_id("src"), &node_id("b1"), element);
//! assert_eq!(feeder.graph.node_count(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`diagnostics`] - issue collection for imports and validation
//! - [`error`] - unified error type
//! - [`phases`] - phase-set handling
//! - [`table`] - row-oriented tabular values (equipment catalogs)
//! - [`topology`] - islands, cycle basis, graph statistics
//!
//! The mil2dss-io crate builds [`Feeder`] values from vendor project
//! directories.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::{EdgeIndex, Graph, NodeIndex};
use serde::Serialize;

pub mod diagnostics;
pub mod error;
pub mod phases;
pub mod table;
pub mod topology;

pub use diagnostics::{BuildDiagnostics, BuildStats, DiagnosticIssue, Diagnostics, Severity};
pub use error::{MilError, MilResult};
pub use phases::{Phase, PhaseSet};
pub use table::Table;

/// Namespace token prefixed to every graph node id.
pub const NODE_PREFIX: &str = "node_";

/// Normalize a vendor identifier: lowercase, with each of
/// {space, '.', '{', '}'} replaced by '_'.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .map(|ch| match ch {
            ' ' | '.' | '{' | '}' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Normalized identifier with the node namespace prefix, e.g.
/// `"Feeder A.1{x}"` → `"node_feeder_a_1_x_"`.
pub fn node_id(raw: &str) -> String {
    format!("{}{}", NODE_PREFIX, normalize(raw))
}

/// Base voltage: a scalar for most elements, a (high, low) pair for
/// two-winding transformers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Kv {
    Scalar(f64),
    Pair(f64, f64),
}

impl Kv {
    /// Collapse to one scalar: the value itself, or the minimum of the
    /// pair. The propagator stamps collapsed values downstream.
    pub fn collapse(&self) -> f64 {
        match self {
            Kv::Scalar(v) => *v,
            Kv::Pair(high, low) => high.min(*low),
        }
    }
}

/// A consumer or street-light load attached to a bus.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumerLoad {
    /// Normalized consumer id (the key in [`Bus::loads`])
    pub id: String,
    /// Raw source table name: "Consumers" or "Light"
    pub kind: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub meter_number: String,
    pub meter_type: String,
    pub meter_misc: String,
    pub serial_number: String,
}

/// A bus: a point of common electrical connection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Bus {
    /// Normalized id with the `node_` prefix
    pub id: String,
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// Base voltage, filled by the propagator
    pub kv: Option<Kv>,
    /// Attached loads keyed by normalized consumer id (BTreeMap keeps
    /// iteration deterministic)
    pub loads: BTreeMap<String, ConsumerLoad>,
}

impl Bus {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn has_coords(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }
}

/// Overhead or underground construction of a line section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Overhead,
    Underground,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::Overhead => "overhead",
            LineKind::Underground => "underground",
        }
    }
}

/// A conductor section (overhead or underground).
#[derive(Debug, Clone, Serialize)]
pub struct LineDevice {
    pub kind: LineKind,
    pub grade: String,
    pub length: Option<f64>,
    /// Per-phase conductor names. Keys are a subset of the element's
    /// phases, plus N whose entry is the empty string when the neutral
    /// column holds no conductor name.
    pub wires: BTreeMap<Phase, String>,
}

/// A sectionalizing or tie switch.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchDevice {
    pub state: String,
    /// Partner switch id, opaque; resolved lazily by lookup, never an
    /// owning reference (partner pairs are mutual).
    pub partner: String,
}

/// A fused cutout.
#[derive(Debug, Clone, Serialize)]
pub struct FuseDevice {
    /// Per-phase protection equipment names (A, B, C)
    pub equipment: [String; 3],
    pub facility: String,
    pub aux1: Option<f64>,
    pub aux2: Option<f64>,
}

/// A two-winding distribution transformer.
#[derive(Debug, Clone, Serialize)]
pub struct TransformerDevice {
    pub sphases: String,
    pub unom: Option<f64>,
    /// Rated kVA per phase (A, B, C)
    pub kva: [f64; 3],
    /// Per-phase equipment names
    pub equipment: [String; 3],
    /// Per-phase opaque data fields carried through from the export
    pub data: [String; 3],
}

/// A step-voltage regulator.
#[derive(Debug, Clone, Serialize)]
pub struct RegulatorDevice {
    pub facility: String,
    /// Output voltage set-points per phase
    pub u: [f64; 3],
    pub equipment: [String; 3],
    pub fh_hi: [f64; 3],
}

/// The substation tie; its creation records the feeder's base voltage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubstationDevice {
    pub upu: Option<f64>,
    pub oh_gnd_z: Option<f64>,
    pub ug_gnd_z: Option<f64>,
}

/// Per-class payload of a branch element.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum Device {
    Line(LineDevice),
    Switch(SwitchDevice),
    Fuse(FuseDevice),
    Transformer(TransformerDevice),
    Regulator(RegulatorDevice),
    Substation(SubstationDevice),
    FakeNode,
}

impl Device {
    /// Class discriminator string.
    pub fn class_name(&self) -> &'static str {
        match self {
            Device::Line(_) => "line",
            Device::Switch(_) => "switch",
            Device::Fuse(_) => "fuse",
            Device::Transformer(_) => "transformer",
            Device::Regulator(_) => "regulator",
            Device::Substation(_) => "substation",
            Device::FakeNode => "fake_node",
        }
    }
}

/// A two-terminal branch element (edge weight).
///
/// Immutable after creation except for the `kv` attribute, which the
/// propagator back-fills. Transformers carry `Kv::Pair` and the substation
/// `Kv::Scalar` from construction.
#[derive(Debug, Clone, Serialize)]
pub struct Element {
    pub name: String,
    pub phases: PhaseSet,
    /// Opaque stable identifier from the source system
    pub gid: String,
    pub mgid: String,
    pub substation: String,
    pub feeder: String,
    pub kv: Option<Kv>,
    pub device: Device,
}

impl Element {
    pub fn class_name(&self) -> &'static str {
        self.device.class_name()
    }

    /// Human-readable label: the element name, falling back to the GID.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.gid
        } else {
            &self.name
        }
    }
}

/// Per-class equipment catalogs, stored on the graph as side data.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EquipmentLibrary {
    catalogs: BTreeMap<String, Table>,
}

impl EquipmentLibrary {
    pub fn insert(&mut self, class: impl Into<String>, catalog: Table) {
        self.catalogs.insert(class.into(), catalog);
    }

    pub fn catalog(&self, class: &str) -> Option<&Table> {
        self.catalogs.get(class)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }
}

/// The feeder network graph plus its side data.
#[derive(Debug, Default)]
pub struct Feeder {
    pub graph: Graph<Bus, Element>,
    node_ids: HashMap<String, NodeIndex>,
    /// Substation base voltage; written when the substation edge is
    /// created (overwriting), read by the propagator's default pass.
    pub kv_base: Option<f64>,
    pub library: EquipmentLibrary,
}

impl Feeder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_ids.get(id).copied()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_ids.contains_key(id)
    }

    pub fn bus(&self, id: &str) -> Option<&Bus> {
        self.node_index(id).map(|idx| &self.graph[idx])
    }

    pub fn bus_mut(&mut self, id: &str) -> Option<&mut Bus> {
        let idx = self.node_index(id)?;
        Some(&mut self.graph[idx])
    }

    /// Look up a node by id, creating a coordinate-less bus on first
    /// reference.
    pub fn node_or_insert(&mut self, id: &str) -> NodeIndex {
        if let Some(idx) = self.node_ids.get(id) {
            return *idx;
        }
        let idx = self.graph.add_node(Bus::new(id));
        self.node_ids.insert(id.to_string(), idx);
        idx
    }

    /// Add a directed edge `from → to`, creating endpoint nodes as needed.
    pub fn add_element(&mut self, from: &str, to: &str, element: Element) -> EdgeIndex {
        let from_idx = self.node_or_insert(from);
        let to_idx = self.node_or_insert(to);
        self.graph.add_edge(from_idx, to_idx, element)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.graph.edge_weights()
    }

    pub fn element_by_gid(&self, gid: &str) -> Option<&Element> {
        self.graph.edge_weights().find(|e| e.gid == gid)
    }

    /// Compute basic statistics about the feeder
    pub fn stats(&self) -> FeederStats {
        let mut stats = FeederStats {
            num_nodes: self.graph.node_count(),
            ..FeederStats::default()
        };

        for bus in self.graph.node_weights() {
            stats.num_loads += bus.loads.len();
        }

        for element in self.graph.edge_weights() {
            stats.num_elements += 1;
            match element.device {
                Device::Line(_) => stats.num_lines += 1,
                Device::Switch(_) => stats.num_switches += 1,
                Device::Fuse(_) => stats.num_fuses += 1,
                Device::Transformer(_) => stats.num_transformers += 1,
                Device::Regulator(_) => stats.num_regulators += 1,
                Device::Substation(_) => stats.num_substations += 1,
                Device::FakeNode => stats.num_fake_nodes += 1,
            }
        }

        stats
    }

    /// Validate the feeder structure for issues that break downstream
    /// export. Populates the provided `Diagnostics`; never fails.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        let stats = self.stats();

        if stats.num_nodes == 0 {
            diag.add_error("structure", "Feeder has no nodes");
            return;
        }

        if stats.num_elements == 0 && stats.num_nodes > 1 {
            diag.add_error("structure", "Feeder has multiple nodes but no elements");
        }

        match stats.num_substations {
            0 => diag.add_warning(
                "structure",
                "Feeder has no substation element; kv defaults unavailable",
            ),
            1 => {}
            n => diag.add_warning(
                "structure",
                &format!("Feeder has {} substation elements; last kv wins", n),
            ),
        }

        if stats.num_loads > 0 && stats.num_elements == 0 {
            diag.add_warning("structure", "Loads attached but no branch elements exist");
        }
    }
}

/// Statistics about a feeder's size and composition
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeederStats {
    pub num_nodes: usize,
    pub num_elements: usize,
    pub num_loads: usize,
    pub num_lines: usize,
    pub num_switches: usize,
    pub num_fuses: usize,
    pub num_transformers: usize,
    pub num_regulators: usize,
    pub num_substations: usize,
    pub num_fake_nodes: usize,
}

impl std::fmt::Display for FeederStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} nodes, {} elements ({} lines, {} switches, {} fuses, {} xfmrs, {} regs), {} loads",
            self.num_nodes,
            self.num_elements,
            self.num_lines,
            self.num_switches,
            self.num_fuses,
            self.num_transformers,
            self.num_regulators,
            self.num_loads
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_element(gid: &str) -> Element {
        Element {
            name: format!("line {gid}"),
            phases: PhaseSet::parse("ABC"),
            gid: gid.to_string(),
            mgid: String::new(),
            substation: "North".to_string(),
            feeder: "F1".to_string(),
            kv: None,
            device: Device::Line(LineDevice {
                kind: LineKind::Overhead,
                grade: String::new(),
                length: Some(120.0),
                wires: BTreeMap::new(),
            }),
        }
    }

    #[test]
    fn test_normalize_replaces_and_lowercases() {
        assert_eq!(normalize("Feeder A.1{x}"), "feeder_a_1_x_");
        assert_eq!(node_id("Feeder A.1{x}"), "node_feeder_a_1_x_");
    }

    #[test]
    fn test_normalized_ids_have_no_forbidden_chars() {
        for raw in ["A B", "a.b", "{x}", "MiXeD Case.id"] {
            let id = node_id(raw);
            assert!(!id.contains([' ', '.', '{', '}']), "bad id: {id}");
            assert_eq!(id, id.to_lowercase());
        }
    }

    #[test]
    fn test_implicit_node_creation() {
        let mut feeder = Feeder::new();
        feeder.add_element("node_a", "node_b", line_element("g1"));

        assert_eq!(feeder.graph.node_count(), 2);
        assert!(feeder.contains_node("node_a"));
        assert!(feeder.contains_node("node_b"));
        // Second element reuses the shared endpoint.
        feeder.add_element("node_b", "node_c", line_element("g2"));
        assert_eq!(feeder.graph.node_count(), 3);
        assert_eq!(feeder.graph.edge_count(), 2);
    }

    #[test]
    fn test_element_by_gid() {
        let mut feeder = Feeder::new();
        feeder.add_element("node_a", "node_b", line_element("g1"));
        assert!(feeder.element_by_gid("g1").is_some());
        assert!(feeder.element_by_gid("nope").is_none());
    }

    #[test]
    fn test_kv_collapse() {
        assert_eq!(Kv::Scalar(11.0).collapse(), 11.0);
        assert_eq!(Kv::Pair(11.0, 0.4).collapse(), 0.4);
        assert_eq!(Kv::Pair(0.4, 11.0).collapse(), 0.4);
    }

    #[test]
    fn test_stats_counts_by_class() {
        let mut feeder = Feeder::new();
        feeder.add_element("node_src", "node_b1", Element {
            device: Device::Substation(SubstationDevice::default()),
            kv: Some(Kv::Scalar(11.0)),
            ..line_element("sub")
        });
        feeder.add_element("node_b1", "node_b2", line_element("l1"));
        feeder.add_element("node_b2", "node_b3", Element {
            device: Device::Switch(SwitchDevice {
                state: "closed".to_string(),
                partner: String::new(),
            }),
            ..line_element("sw1")
        });

        let stats = feeder.stats();
        assert_eq!(stats.num_nodes, 4);
        assert_eq!(stats.num_elements, 3);
        assert_eq!(stats.num_lines, 1);
        assert_eq!(stats.num_switches, 1);
        assert_eq!(stats.num_substations, 1);
    }

    #[test]
    fn test_validate_empty_feeder() {
        let feeder = Feeder::new();
        let mut diag = Diagnostics::new();
        feeder.validate_into(&mut diag);
        assert!(diag.has_errors());
        assert!(diag.errors().any(|i| i.message.contains("no nodes")));
    }

    #[test]
    fn test_validate_missing_substation() {
        let mut feeder = Feeder::new();
        feeder.add_element("node_a", "node_b", line_element("g1"));
        let mut diag = Diagnostics::new();
        feeder.validate_into(&mut diag);
        assert!(!diag.has_errors());
        assert!(diag.warnings().any(|i| i.message.contains("no substation")));
    }

    #[test]
    fn test_device_class_names() {
        assert_eq!(
            Device::Substation(SubstationDevice::default()).class_name(),
            "substation"
        );
        assert_eq!(Device::FakeNode.class_name(), "fake_node");
    }

    #[test]
    fn test_element_serialization_tags_class() {
        let json = serde_json::to_string(&line_element("g1")).unwrap();
        assert!(json.contains("\"class\":\"line\""));
        assert!(json.contains("\"phases\":\"ABC\""));
    }
}
