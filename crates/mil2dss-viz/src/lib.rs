//! Read-only view extraction for external rendering.
//!
//! The vendor export carries real GIS coordinates, so rendering is a matter
//! of extracting segments and markers; no layout is synthesized here and no
//! plotting happens in this crate. All outputs serialize with serde so a
//! renderer can consume them as JSON.

use std::collections::BTreeMap;

use mil2dss_core::Feeder;
use petgraph::visit::EdgeRef;
use serde::Serialize;

/// Drop lines longer than this many coordinate units are suppressed; a
/// rendering heuristic against meter records geocoded far from their pole.
pub const DROP_LINE_LIMIT: f64 = 500.0;

/// A straight segment as coordinate pairs, matching the plotting
/// convention of per-axis arrays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub xs: (f64, f64),
    pub ys: (f64, f64),
}

impl Segment {
    fn length(&self) -> f64 {
        let dx = self.xs.1 - self.xs.0;
        let dy = self.ys.1 - self.ys.0;
        (dx * dx + dy * dy).sqrt()
    }

    fn has_zero_coordinate(&self) -> bool {
        [self.xs.0, self.xs.1, self.ys.0, self.ys.1]
            .iter()
            .any(|&coordinate| coordinate == 0.0)
    }
}

/// A plottable load: its coordinates plus the drop line to its parent
/// node, when one survives the filter.
#[derive(Debug, Clone, Serialize)]
pub struct LoadDrop {
    pub load_id: String,
    pub parent: String,
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop: Option<Segment>,
}

/// Every edge whose two endpoints both carry coordinates, in edge order.
pub fn branch_segments(feeder: &Feeder) -> Vec<Segment> {
    feeder
        .graph
        .edge_references()
        .filter_map(|edge| {
            let from = &feeder.graph[edge.source()];
            let to = &feeder.graph[edge.target()];
            match (from.x, from.y, to.x, to.y) {
                (Some(x1), Some(y1), Some(x2), Some(y2)) => Some(Segment {
                    xs: (x1, x2),
                    ys: (y1, y2),
                }),
                _ => None,
            }
        })
        .collect()
}

/// Terminal-node coordinates per element class name.
pub fn class_markers(feeder: &Feeder) -> BTreeMap<&'static str, Vec<(f64, f64)>> {
    let mut markers: BTreeMap<&'static str, Vec<(f64, f64)>> = BTreeMap::new();
    for edge in feeder.graph.edge_references() {
        let terminal = &feeder.graph[edge.target()];
        if let (Some(x), Some(y)) = (terminal.x, terminal.y) {
            markers
                .entry(edge.weight().class_name())
                .or_default()
                .push((x, y));
        }
    }
    markers
}

/// Load coordinates and their drop lines to the parent node.
///
/// Loads without coordinates are unplottable and skipped. A drop line is
/// suppressed (the load keeps its point) when the parent has no
/// coordinates, the segment is longer than [`DROP_LINE_LIMIT`], or any of
/// its four coordinates is exactly zero.
pub fn load_drops(feeder: &Feeder) -> Vec<LoadDrop> {
    let mut drops = Vec::new();
    for node in feeder.graph.node_indices() {
        let bus = &feeder.graph[node];
        for load in bus.loads.values() {
            let (Some(x), Some(y)) = (load.x, load.y) else {
                continue;
            };
            let drop = match (bus.x, bus.y) {
                (Some(px), Some(py)) => {
                    let segment = Segment {
                        xs: (x, px),
                        ys: (y, py),
                    };
                    (segment.length() <= DROP_LINE_LIMIT && !segment.has_zero_coordinate())
                        .then_some(segment)
                }
                _ => None,
            };
            drops.push(LoadDrop {
                load_id: load.id.clone(),
                parent: bus.id.clone(),
                x,
                y,
                drop,
            });
        }
    }
    drops
}
