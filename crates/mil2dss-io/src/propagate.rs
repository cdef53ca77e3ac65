//! Base-voltage propagation.
//!
//! After construction only the substation (scalar) and transformers (pair)
//! carry kv. Pass 1 walks each kv-less edge upstream toward the source and
//! back-fills the traversed path; pass 2 gives anything still unset the
//! graph-level default; pass 3 fills endpoint kv for edges that carried
//! their value from construction. The walk is iterative with an explicit
//! visited set so a looped feeder cannot recurse unboundedly.

use std::collections::HashSet;

use mil2dss_core::{BuildDiagnostics, Feeder, Kv};
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::warn;

/// Fill the kv attribute of every edge and edge endpoint.
pub fn propagate_kv(feeder: &mut Feeder, diag: &mut BuildDiagnostics) {
    let edges: Vec<EdgeIndex> = feeder.graph.edge_indices().collect();

    // Pass 1: inherit from upstream along the rooted tree.
    for &edge in &edges {
        if feeder.graph[edge].kv.is_some() {
            continue;
        }
        if let Some((kv, path)) = upstream_kv(feeder, edge) {
            stamp(feeder, Kv::Scalar(kv.collapse()), &path);
        }
    }

    // Pass 2: conservative default for disconnected fragments.
    for &edge in &edges {
        if feeder.graph[edge].kv.is_some() {
            continue;
        }
        match feeder.kv_base {
            Some(base) => {
                stamp(feeder, Kv::Scalar(base), &[edge]);
                diag.stats.defaulted_kv += 1;
            }
            None => {
                let gid = feeder.graph[edge].gid.clone();
                warn!(gid = %gid, "no substation base voltage; edge left without kv");
                diag.add_warning_with_entity(
                    "propagation",
                    "no substation base voltage; edge left without kv",
                    &gid,
                );
            }
        }
    }

    // Pass 3: endpoints of edges that carried kv from construction.
    for &edge in &edges {
        let Some(kv) = feeder.graph[edge].kv else {
            continue;
        };
        let Some((from, to)) = feeder.graph.edge_endpoints(edge) else {
            continue;
        };
        for node in [from, to] {
            if feeder.graph[node].kv.is_none() {
                feeder.graph[node].kv = Some(Kv::Scalar(kv.collapse()));
            }
        }
    }
}

/// Walk upstream from `edge`'s source node until some edge carries kv.
///
/// Follows one in-edge per step, the upstream-most by insertion order
/// (smallest edge index). Returns the found kv and the kv-less path
/// (starting with `edge`), or `None` when the walk reaches a node without
/// in-edges or revisits a node.
fn upstream_kv(feeder: &Feeder, edge: EdgeIndex) -> Option<(Kv, Vec<EdgeIndex>)> {
    let (start, _) = feeder.graph.edge_endpoints(edge)?;
    let mut path = vec![edge];
    let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
    let mut node = start;
    loop {
        let upstream = feeder
            .graph
            .edges_directed(node, Direction::Incoming)
            .min_by_key(|candidate| candidate.id())?;
        let (up_edge, up_source) = (upstream.id(), upstream.source());
        if let Some(kv) = feeder.graph[up_edge].kv {
            return Some((kv, path));
        }
        path.push(up_edge);
        if !visited.insert(up_source) {
            return None;
        }
        node = up_source;
    }
}

/// Write `kv` onto every edge of `path` and onto both endpoints of each.
fn stamp(feeder: &mut Feeder, kv: Kv, path: &[EdgeIndex]) {
    for &edge in path {
        feeder.graph[edge].kv = Some(kv);
        if let Some((from, to)) = feeder.graph.edge_endpoints(edge) {
            feeder.graph[from].kv = Some(kv);
            feeder.graph[to].kv = Some(kv);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mil2dss_core::{
        Device, Element, LineDevice, LineKind, PhaseSet, SubstationDevice, TransformerDevice,
    };
    use std::collections::BTreeMap;

    fn element(gid: &str, kv: Option<Kv>, device: Device) -> Element {
        Element {
            name: gid.to_string(),
            phases: PhaseSet::parse("ABC"),
            gid: gid.to_string(),
            mgid: String::new(),
            substation: String::new(),
            feeder: String::new(),
            kv,
            device,
        }
    }

    fn line(gid: &str) -> Element {
        element(
            gid,
            None,
            Device::Line(LineDevice {
                kind: LineKind::Overhead,
                grade: String::new(),
                length: None,
                wires: BTreeMap::new(),
            }),
        )
    }

    fn substation(gid: &str, kv: f64) -> Element {
        element(
            gid,
            Some(Kv::Scalar(kv)),
            Device::Substation(SubstationDevice::default()),
        )
    }

    fn transformer(gid: &str, high: f64, low: f64) -> Element {
        element(
            gid,
            Some(Kv::Pair(high, low)),
            Device::Transformer(TransformerDevice {
                sphases: String::new(),
                unom: None,
                kva: [0.0; 3],
                equipment: Default::default(),
                data: Default::default(),
            }),
        )
    }

    /// Factory order puts lines before the substation edge, so the walk
    /// has to find the source through edges added later.
    fn radial() -> Feeder {
        let mut feeder = Feeder::new();
        feeder.add_element("node_b1", "node_b2", line("l1"));
        feeder.add_element("node_b2", "node_b3", transformer("t1", 11.0, 0.4));
        feeder.add_element("node_src", "node_b1", substation("sub", 11.0));
        feeder.kv_base = Some(11.0);
        feeder
    }

    #[test]
    fn test_scalar_inheritance_from_substation() {
        let mut feeder = radial();
        let mut diag = BuildDiagnostics::new();
        propagate_kv(&mut feeder, &mut diag);

        assert_eq!(feeder.element_by_gid("l1").unwrap().kv, Some(Kv::Scalar(11.0)));
        // The transformer keeps its pair.
        assert_eq!(
            feeder.element_by_gid("t1").unwrap().kv,
            Some(Kv::Pair(11.0, 0.4))
        );
        assert_eq!(diag.stats.defaulted_kv, 0);
    }

    #[test]
    fn test_pair_collapses_to_minimum_downstream() {
        let mut feeder = radial();
        // Low-voltage line below the transformer.
        feeder.add_element("node_b3", "node_b4", line("lv"));
        let mut diag = BuildDiagnostics::new();
        propagate_kv(&mut feeder, &mut diag);

        assert_eq!(feeder.element_by_gid("lv").unwrap().kv, Some(Kv::Scalar(0.4)));
        assert_eq!(feeder.bus("node_b4").unwrap().kv, Some(Kv::Scalar(0.4)));
    }

    #[test]
    fn test_post_propagation_totality() {
        let mut feeder = radial();
        feeder.add_element("node_b3", "node_b4", line("lv"));
        feeder.add_element("node_iso1", "node_iso2", line("frag"));
        let mut diag = BuildDiagnostics::new();
        propagate_kv(&mut feeder, &mut diag);

        for element in feeder.elements() {
            assert!(element.kv.is_some(), "edge {} lacks kv", element.gid);
        }
        for bus in feeder.graph.node_weights() {
            assert!(bus.kv.is_some(), "node {} lacks kv", bus.id);
        }
    }

    #[test]
    fn test_disconnected_fragment_gets_default() {
        let mut feeder = radial();
        feeder.add_element("node_iso1", "node_iso2", line("frag"));
        let mut diag = BuildDiagnostics::new();
        propagate_kv(&mut feeder, &mut diag);

        assert_eq!(
            feeder.element_by_gid("frag").unwrap().kv,
            Some(Kv::Scalar(11.0))
        );
        assert_eq!(feeder.bus("node_iso1").unwrap().kv, Some(Kv::Scalar(11.0)));
        assert_eq!(diag.stats.defaulted_kv, 1);
    }

    #[test]
    fn test_no_kv_base_leaves_fragment_unset() {
        let mut feeder = Feeder::new();
        feeder.add_element("node_a", "node_b", line("frag"));
        let mut diag = BuildDiagnostics::new();
        propagate_kv(&mut feeder, &mut diag);

        assert_eq!(feeder.element_by_gid("frag").unwrap().kv, None);
        assert!(diag.has_issues());
        assert_eq!(diag.stats.defaulted_kv, 0);
    }

    #[test]
    fn test_loop_does_not_hang_and_falls_back() {
        let mut feeder = Feeder::new();
        feeder.add_element("node_a", "node_b", line("l1"));
        feeder.add_element("node_b", "node_c", line("l2"));
        feeder.add_element("node_c", "node_a", line("l3"));
        feeder.kv_base = Some(6.6);
        let mut diag = BuildDiagnostics::new();
        propagate_kv(&mut feeder, &mut diag);

        for element in feeder.elements() {
            assert_eq!(element.kv, Some(Kv::Scalar(6.6)));
        }
        assert_eq!(diag.stats.defaulted_kv, 3);
    }

    #[test]
    fn test_ambiguous_upstream_breaks_ties_by_insertion_order() {
        let mut feeder = Feeder::new();
        feeder.add_element("node_s1", "node_join", substation("first", 11.0));
        feeder.add_element("node_s2", "node_join", substation("second", 22.0));
        feeder.add_element("node_join", "node_leaf", line("l1"));
        let mut diag = BuildDiagnostics::new();
        propagate_kv(&mut feeder, &mut diag);

        assert_eq!(feeder.element_by_gid("l1").unwrap().kv, Some(Kv::Scalar(11.0)));
    }

    #[test]
    fn test_inherited_value_matches_ancestor() {
        // Propagation monotonicity: the stamped scalar equals the
        // ancestor's scalar, or min of its pair.
        let mut feeder = radial();
        feeder.add_element("node_b3", "node_b4", line("lv"));
        let mut diag = BuildDiagnostics::new();
        propagate_kv(&mut feeder, &mut diag);

        let ancestor = feeder.element_by_gid("t1").unwrap().kv.unwrap();
        let inherited = feeder.element_by_gid("lv").unwrap().kv.unwrap();
        assert_eq!(inherited.collapse(), ancestor.collapse());
    }
}
