//! Downstream emitter boundary.
//!
//! The OpenDSS text emitter is an external collaborator: it consumes the
//! finished graph plus the two opaque configuration mappings. This module
//! defines that contract and a JSON dump of the graph the CLI can write for
//! inspection.

use mil2dss_core::{Bus, Element, Feeder, MilError, MilResult};
use petgraph::visit::EdgeRef;
use serde::Serialize;

/// Contract for the external OpenDSS-style text emitter.
///
/// The scenario and mapper mappings come from [`crate::config`] and pass
/// through unmodified; their interpretation is entirely the emitter's.
pub trait DssEmitter {
    fn emit(
        &self,
        feeder: &Feeder,
        scenario: &toml::Table,
        mapper: &toml::Table,
    ) -> MilResult<String>;
}

/// Serializable snapshot of the feeder graph.
#[derive(Debug, Serialize)]
pub struct GraphDump<'a> {
    pub kv_base: Option<f64>,
    pub nodes: Vec<&'a Bus>,
    pub edges: Vec<EdgeDump<'a>>,
}

/// One edge of the snapshot: endpoints plus the element record.
#[derive(Debug, Serialize)]
pub struct EdgeDump<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub element: &'a Element,
}

/// Snapshot the feeder for serialization (node order = creation order).
pub fn dump(feeder: &Feeder) -> GraphDump<'_> {
    let nodes = feeder.graph.node_weights().collect();
    let edges = feeder
        .graph
        .edge_references()
        .map(|edge| EdgeDump {
            from: feeder.graph[edge.source()].id.as_str(),
            to: feeder.graph[edge.target()].id.as_str(),
            element: edge.weight(),
        })
        .collect();
    GraphDump {
        kv_base: feeder.kv_base,
        nodes,
        edges,
    }
}

/// Pretty-printed JSON snapshot of the feeder.
pub fn to_json_string(feeder: &Feeder) -> MilResult<String> {
    serde_json::to_string_pretty(&dump(feeder)).map_err(|err| MilError::Parse(err.to_string()))
}
