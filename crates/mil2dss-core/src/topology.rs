//! Topological health reporting on the undirected projection.
//!
//! A healthy feeder has one island and no cycles. These are diagnostic
//! outputs; the pipeline never fails on a non-radial topology.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use anyhow::{anyhow, Result};
use petgraph::algo::connected_components;
use petgraph::visit::EdgeRef;

use crate::Feeder;

/// Summary statistics of the feeder graph.
#[derive(Debug)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub islands: usize,
    pub cycle_count: usize,
    pub min_degree: usize,
    pub avg_degree: f64,
    pub max_degree: usize,
    pub density: f64,
}

/// One connected component of the undirected projection.
#[derive(Debug)]
pub struct IslandSummary {
    pub island_id: usize,
    pub node_count: usize,
}

/// Island membership of a single bus.
#[derive(Debug)]
pub struct NodeAssignment {
    pub node_index: usize,
    pub id: String,
    pub island_id: usize,
}

/// Aggregated island analysis result.
#[derive(Debug)]
pub struct IslandAnalysis {
    pub islands: Vec<IslandSummary>,
    pub assignments: Vec<NodeAssignment>,
}

/// Graph-level statistics: degree distribution, density, islands, cycles.
pub fn graph_stats(feeder: &Feeder) -> Result<GraphStats> {
    let node_count = feeder.graph.node_count();
    let edge_count = feeder.graph.edge_count();
    let mut degrees = Vec::with_capacity(node_count);
    for node in feeder.graph.node_indices() {
        degrees.push(feeder.graph.neighbors_undirected(node).count());
    }
    let min_degree = *degrees.iter().min().unwrap_or(&0);
    let max_degree = *degrees.iter().max().unwrap_or(&0);
    let avg_degree = if node_count == 0 {
        0.0
    } else {
        degrees.iter().copied().sum::<usize>() as f64 / node_count as f64
    };
    let density = if node_count < 2 {
        0.0
    } else {
        2.0 * edge_count as f64 / (node_count as f64 * (node_count as f64 - 1.0))
    };
    Ok(GraphStats {
        node_count,
        edge_count,
        islands: connected_components(&feeder.graph),
        cycle_count: cycle_basis(feeder).len(),
        min_degree,
        avg_degree,
        max_degree,
        density,
    })
}

/// Labels connected components (breadth-first search over the undirected
/// projection) and pulls island membership for reporting.
pub fn find_islands(feeder: &Feeder) -> Result<IslandAnalysis> {
    let mut visited = HashSet::new();
    let mut islands = Vec::new();
    let mut assignments = Vec::new();
    let mut island_id = 0;
    for start in feeder.graph.node_indices() {
        if visited.contains(&start) {
            continue;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            members.push(node);
            for neighbor in feeder.graph.neighbors_undirected(node) {
                if !visited.contains(&neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        if members.is_empty() {
            continue;
        }
        islands.push(IslandSummary {
            island_id,
            node_count: members.len(),
        });
        for node in members {
            assignments.push(NodeAssignment {
                node_index: node.index(),
                id: feeder.graph[node].id.clone(),
                island_id,
            });
        }
        island_id += 1;
    }
    assignments.sort_by_key(|assignment| assignment.node_index);
    Ok(IslandAnalysis {
        islands,
        assignments,
    })
}

/// Fundamental cycles of the undirected projection, as lists of bus ids.
///
/// Parallel edges and self-loops are collapsed before the search, so an
/// antiparallel edge pair is not reported as a two-node cycle. The basis is
/// built from a spanning forest rooted at the lowest-index node of each
/// component; output is deterministic for a given construction order.
pub fn cycle_basis(feeder: &Feeder) -> Vec<Vec<String>> {
    // Simple undirected adjacency, ordered for determinism.
    let mut adjacency: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for node in feeder.graph.node_indices() {
        adjacency.entry(node.index()).or_default();
    }
    for edge in feeder.graph.edge_references() {
        let (a, b) = (edge.source().index(), edge.target().index());
        if a == b {
            continue;
        }
        adjacency.entry(a).or_default().insert(b);
        adjacency.entry(b).or_default().insert(a);
    }

    let mut cycles: Vec<Vec<usize>> = Vec::new();
    let mut in_forest: BTreeSet<usize> = BTreeSet::new();

    for &root in adjacency.keys() {
        if in_forest.contains(&root) {
            continue;
        }
        // Spanning-tree walk; `used[z]` holds the neighbors of z already
        // examined from z's side, so each non-tree edge closes exactly one
        // cycle.
        let mut stack = vec![root];
        let mut pred: BTreeMap<usize, usize> = BTreeMap::from([(root, root)]);
        let mut used: BTreeMap<usize, BTreeSet<usize>> =
            BTreeMap::from([(root, BTreeSet::new())]);
        while let Some(z) = stack.pop() {
            let z_used = used.get(&z).cloned().unwrap_or_default();
            for &nbr in &adjacency[&z] {
                if !used.contains_key(&nbr) {
                    pred.insert(nbr, z);
                    stack.push(nbr);
                    used.insert(nbr, BTreeSet::from([z]));
                } else if !z_used.contains(&nbr) {
                    let closing = used[&nbr].clone();
                    let mut cycle = vec![nbr, z];
                    let mut p = pred[&z];
                    while !closing.contains(&p) {
                        cycle.push(p);
                        p = pred[&p];
                    }
                    cycle.push(p);
                    cycles.push(cycle);
                    if let Some(set) = used.get_mut(&nbr) {
                        set.insert(z);
                    }
                }
            }
        }
        in_forest.extend(pred.keys().copied());
    }

    cycles
        .into_iter()
        .map(|cycle| {
            cycle
                .into_iter()
                .map(|index| {
                    feeder.graph[petgraph::graph::NodeIndex::new(index)]
                        .id
                        .clone()
                })
                .collect()
        })
        .collect()
}

/// Export the topology so external tools can visualize the layout.
pub fn export_graph(feeder: &Feeder, format: &str) -> Result<String> {
    match format.to_ascii_lowercase().as_str() {
        "graphviz" | "dot" => Ok(render_dot(feeder)),
        other => Err(anyhow!("unsupported graph export format '{other}'")),
    }
}

fn render_dot(feeder: &Feeder) -> String {
    let mut buffer = String::new();
    buffer.push_str("digraph feeder {\n");
    for node in feeder.graph.node_indices() {
        let label = sanitize_label(&feeder.graph[node].id);
        buffer.push_str(&format!("  n{} [label=\"{}\"];\n", node.index(), label));
    }
    for edge in feeder.graph.edge_references() {
        buffer.push_str(&format!(
            "  n{} -> n{} [label=\"{}\"];\n",
            edge.source().index(),
            edge.target().index(),
            edge.weight().class_name()
        ));
    }
    buffer.push('}');
    buffer
}

fn sanitize_label(label: &str) -> String {
    label.replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Device, Element, Kv, PhaseSet, SubstationDevice, SwitchDevice};

    fn element(gid: &str, device: Device) -> Element {
        Element {
            name: gid.to_string(),
            phases: PhaseSet::parse("ABC"),
            gid: gid.to_string(),
            mgid: String::new(),
            substation: String::new(),
            feeder: String::new(),
            kv: None,
            device,
        }
    }

    fn switch(gid: &str) -> Element {
        element(
            gid,
            Device::Switch(SwitchDevice {
                state: "closed".to_string(),
                partner: String::new(),
            }),
        )
    }

    fn radial_feeder() -> Feeder {
        let mut feeder = Feeder::new();
        feeder.add_element(
            "node_src",
            "node_b1",
            Element {
                kv: Some(Kv::Scalar(11.0)),
                ..element("sub", Device::Substation(SubstationDevice::default()))
            },
        );
        feeder.add_element("node_b1", "node_b2", switch("s1"));
        feeder.add_element("node_b2", "node_b3", switch("s2"));
        feeder
    }

    #[test]
    fn test_radial_has_one_island_no_cycles() {
        let feeder = radial_feeder();
        let analysis = find_islands(&feeder).unwrap();
        assert_eq!(analysis.islands.len(), 1);
        assert_eq!(analysis.islands[0].node_count, 4);
        assert!(cycle_basis(&feeder).is_empty());
    }

    #[test]
    fn test_closing_switch_creates_cycle() {
        let mut feeder = radial_feeder();
        feeder.add_element("node_b3", "node_b1", switch("tie"));

        let analysis = find_islands(&feeder).unwrap();
        assert_eq!(analysis.islands.len(), 1);

        let cycles = cycle_basis(&feeder);
        assert_eq!(cycles.len(), 1);
        let mut members = cycles[0].clone();
        members.sort();
        assert_eq!(members, vec!["node_b1", "node_b2", "node_b3"]);
    }

    #[test]
    fn test_disconnected_fragment_counts_as_island() {
        let mut feeder = radial_feeder();
        feeder.add_element("node_iso1", "node_iso2", switch("frag"));

        let analysis = find_islands(&feeder).unwrap();
        assert_eq!(analysis.islands.len(), 2);
        let frag = analysis
            .assignments
            .iter()
            .find(|a| a.id == "node_iso1")
            .unwrap();
        let main = analysis
            .assignments
            .iter()
            .find(|a| a.id == "node_src")
            .unwrap();
        assert_ne!(frag.island_id, main.island_id);
    }

    #[test]
    fn test_parallel_edges_do_not_form_a_cycle() {
        let mut feeder = Feeder::new();
        feeder.add_element("node_a", "node_b", switch("s1"));
        feeder.add_element("node_b", "node_a", switch("s2"));
        assert!(cycle_basis(&feeder).is_empty());
    }

    #[test]
    fn test_reports_are_deterministic() {
        let build = || {
            let mut feeder = radial_feeder();
            feeder.add_element("node_b3", "node_b1", switch("tie"));
            feeder.add_element("node_iso1", "node_iso2", switch("frag"));
            feeder
        };
        let a = build();
        let b = build();
        assert_eq!(cycle_basis(&a), cycle_basis(&b));
        assert_eq!(
            format!("{:?}", find_islands(&a).unwrap()),
            format!("{:?}", find_islands(&b).unwrap())
        );
        assert_eq!(render_dot(&a), render_dot(&b));
    }

    #[test]
    fn test_graph_stats() {
        let feeder = radial_feeder();
        let stats = graph_stats(&feeder).unwrap();
        assert_eq!(stats.node_count, 4);
        assert_eq!(stats.edge_count, 3);
        assert_eq!(stats.islands, 1);
        assert_eq!(stats.cycle_count, 0);
        assert_eq!(stats.max_degree, 2);
        assert_eq!(stats.min_degree, 1);
    }

    #[test]
    fn test_dot_export() {
        let feeder = radial_feeder();
        let dot = export_graph(&feeder, "dot").unwrap();
        assert!(dot.starts_with("digraph feeder {"));
        assert!(dot.contains("node_src"));
        assert!(dot.contains("->"));
        assert!(export_graph(&feeder, "png").is_err());
    }
}
