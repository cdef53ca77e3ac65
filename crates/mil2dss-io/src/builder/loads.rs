//! Consumer load attachment.
//!
//! Joins the External Tables consumer rows ("Consumers" and "Light") with
//! the Service Locations class table on the global identifier, then hangs
//! the load metadata off the parent node. Loads whose parent node never
//! made it into the graph are skipped; the feeder stays usable.

use mil2dss_core::table::Table;
use mil2dss_core::{node_id, normalize, BuildDiagnostics, ConsumerLoad, Feeder};
use tracing::warn;

const CONSUMER_TABLES: [&str; 2] = ["Consumers", "Light"];

/// Attach consumer loads to their parent nodes.
///
/// Multiple loads per node are allowed; a repeated consumer id overwrites
/// the earlier entry (last wins).
pub fn attach_loads(
    feeder: &mut Feeder,
    service_locations: &Table,
    external: &Table,
    diag: &mut BuildDiagnostics,
) {
    for row in external.iter() {
        let Some(kind) = row.text("table") else {
            continue;
        };
        if !CONSUMER_TABLES.contains(&kind) {
            continue;
        }
        let Some(consumer_id) = row.text("id") else {
            continue;
        };

        for location in service_locations.iter() {
            if location.text("oGID") != Some(consumer_id) {
                continue;
            }
            let Some(parent_raw) = location.text("parentID") else {
                continue;
            };
            let parent = node_id(parent_raw);
            if !feeder.contains_node(&parent) {
                diag.stats.orphan_loads += 1;
                warn!(consumer = consumer_id, parent = %parent,
                    "load references unknown parent node; skipping");
                diag.add_warning_with_entity(
                    "integrity",
                    &format!("load parent node '{parent}' does not exist"),
                    consumer_id,
                );
                continue;
            }

            let key = normalize(consumer_id);
            let load = ConsumerLoad {
                id: key.clone(),
                kind: kind.to_string(),
                x: row.f64("X"),
                y: row.f64("Y"),
                meter_number: row.text("Meter Number").unwrap_or_default().to_string(),
                meter_type: row.text("Meter Type").unwrap_or_default().to_string(),
                meter_misc: row.text("Meter Misc").unwrap_or_default().to_string(),
                serial_number: row.text("Serial Number").unwrap_or_default().to_string(),
            };
            if let Some(bus) = feeder.bus_mut(&parent) {
                if bus.loads.insert(key, load).is_none() {
                    diag.stats.loads += 1;
                }
            }
        }
    }
}
