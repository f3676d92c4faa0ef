use crate::Result;
use lanefix_graph::{neutralize_intersections, spline_ends, ConnectorTable, EntityGraph};
use serde::Serialize;
use std::collections::BTreeSet;

/// What the integrity sweep removed and cascaded.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct SweepReport {
    /// Dangling spline entities deleted.
    pub removed: usize,
    /// Intersection fragments replaced with their neutral form.
    pub intersections_cleaned: usize,
    /// Connector side-table entries dropped.
    pub connectors_cleaned: usize,
}

/// Spline entities whose Start or End id does not resolve in the graph.
pub fn find_dangling(graph: &EntityGraph) -> Result<BTreeSet<u64>> {
    let mut dangling = BTreeSet::new();
    for (id, entity) in graph.iter() {
        let Some(ends) = spline_ends(entity)? else {
            continue;
        };
        if !graph.contains(ends.start_id) || !graph.contains(ends.end_id) {
            dangling.insert(id);
        }
    }
    Ok(dangling)
}

/// Excise dangling splines and everything that pointed at them.
///
/// Removal cascades two ways: intersection fragments on surviving entities
/// that reference a removed id are reset to their empty form (the host entity
/// is kept), and connector side-table entries for removed ids are dropped.
pub fn purge(
    graph: &mut EntityGraph,
    connectors: &mut ConnectorTable,
    dangling: &BTreeSet<u64>,
) -> SweepReport {
    let mut report = SweepReport::default();
    for &id in dangling {
        if graph.remove(id).is_some() {
            report.removed += 1;
        }
    }
    for (_, entity) in graph.iter_mut() {
        report.intersections_cleaned += neutralize_intersections(entity, dangling);
    }
    report.connectors_cleaned = connectors.remove_ids(dangling);

    if report.removed > 0 {
        log::info!(
            "integrity sweep: removed {} dangling splines, cleaned {} intersection fragments, {} connector entries",
            report.removed,
            report.intersections_cleaned,
            report.connectors_cleaned
        );
    }
    report
}
