use crate::junction::{discover_junctions, is_invisible_pole};
use crate::Result;
use lanefix_graph::{
    rewrite_spline_endpoint, spline_ends, strip_pole_refs, ConnectorTable, EndpointRole,
    EntityGraph, Vec3,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A pole farther than this from every junction is left alone rather than
/// reconnected to a guess.
pub const REVERT_DISTANCE_LIMIT: f64 = 500.0;

/// Counters for one revert run.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct RevertReport {
    pub poles_found: usize,
    pub poles_removed: usize,
    pub rewrites: usize,
    pub rewrite_failures: usize,
    /// Splines left pointing at a pole because no junction was close enough.
    pub warnings: usize,
    pub connectors_cleaned: usize,
    pub socket_refs_cleaned: usize,
}

struct RewritePlan {
    spline: u64,
    role: EndpointRole,
    pole_id: u64,
    junction_id: u64,
}

/// Invert a prior synthesis: reconnect splines from invisible poles to their
/// nearest junction, then delete the poles and every reference to them.
pub fn revert(graph: &mut EntityGraph, connectors: &mut ConnectorTable) -> Result<RevertReport> {
    let poles: BTreeMap<u64, Vec3> = graph
        .iter()
        .filter(|(_, e)| is_invisible_pole(e.config_path()))
        .map(|(id, e)| (id, e.translation()))
        .collect();

    let mut report = RevertReport {
        poles_found: poles.len(),
        ..RevertReport::default()
    };
    if poles.is_empty() {
        log::info!("no invisible poles found, nothing to revert");
        return Ok(report);
    }

    let junctions: BTreeMap<u64, Vec3> = discover_junctions(graph)
        .into_keys()
        .map(|id| (id, graph.get(id).expect("discovered").translation()))
        .collect();
    log::info!(
        "revert: {} poles, {} junctions/mergers",
        poles.len(),
        junctions.len()
    );

    // Plan endpoint restorations against the unmodified graph.
    let mut rewrites = Vec::new();
    for (spline_id, entity) in graph.iter() {
        let Some(ends) = spline_ends(entity)? else {
            continue;
        };
        for role in [EndpointRole::Start, EndpointRole::End] {
            let endpoint = ends.endpoint(role);
            let Some(&pole_pos) = poles.get(&endpoint) else {
                continue;
            };
            match nearest_junction(pole_pos, &junctions) {
                Some((junction_id, dist)) if dist <= REVERT_DISTANCE_LIMIT => {
                    log::debug!(
                        "spline {spline_id}: {} pole {endpoint} -> junction {junction_id} (dist {dist:.1})",
                        role.as_str()
                    );
                    rewrites.push(RewritePlan {
                        spline: spline_id,
                        role,
                        pole_id: endpoint,
                        junction_id,
                    });
                }
                Some((junction_id, dist)) => {
                    log::warn!(
                        "pole {endpoint}: nearest junction {junction_id} is {dist:.1} units away, spline {spline_id} left untouched"
                    );
                    report.warnings += 1;
                }
                None => {
                    log::warn!("pole {endpoint}: no junction in the graph, spline {spline_id} left untouched");
                    report.warnings += 1;
                }
            }
        }
    }

    for plan in rewrites {
        let done = graph.get_mut(plan.spline).is_some_and(|spline| {
            rewrite_spline_endpoint(spline, plan.pole_id, plan.junction_id, plan.role)
        });
        if done {
            report.rewrites += 1;
        } else {
            report.rewrite_failures += 1;
            log::warn!(
                "spline {}: {} endpoint {} -> {} found no matching text",
                plan.spline,
                plan.role.as_str(),
                plan.pole_id,
                plan.junction_id
            );
        }
    }

    let pole_ids: BTreeSet<u64> = poles.keys().copied().collect();
    for &id in &pole_ids {
        if graph.remove(id).is_some() {
            report.poles_removed += 1;
        }
    }
    report.connectors_cleaned = connectors.remove_ids(&pole_ids);
    for (_, entity) in graph.iter_mut() {
        if strip_pole_refs(entity, &pole_ids) {
            report.socket_refs_cleaned += 1;
        }
    }

    log::info!(
        "revert: removed {} poles, rewrote {} endpoints ({} failed, {} warnings)",
        report.poles_removed,
        report.rewrites,
        report.rewrite_failures,
        report.warnings
    );
    Ok(report)
}

fn nearest_junction(pos: Vec3, junctions: &BTreeMap<u64, Vec3>) -> Option<(u64, f64)> {
    let mut best: Option<(u64, f64)> = None;
    for (&id, &jpos) in junctions {
        let dist = pos.dist(jpos);
        if best.map_or(true, |(_, b)| dist < b) {
            best = Some((id, dist));
        }
    }
    best
}
