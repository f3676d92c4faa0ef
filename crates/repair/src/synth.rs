use crate::cluster::{cluster_lanes, detect_lane_axis, LANE_CLUSTER_TOLERANCE};
use crate::index::{build_touch_index, Touch};
use crate::junction::{
    discover_junctions, is_invisible_pole, is_support_pole, JunctionKind, Strategy,
};
use crate::Result;
use lanefix_graph::{
    build_socket_fragment, has_pole_pairing, rewrite_spline_endpoint, socket_fragment,
    write_socket_fragment, ConnectionType, EndpointRole, Entity, EntityGraph, SocketRecord, Vec3,
    INTERSECTION_FRAGMENT, INVISIBLE_POLE_CONFIG,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeSet;

/// How close a spline endpoint must sit to a computed socket position to
/// decide that socket's direction.
pub const SOCKET_MATCH_TOLERANCE: f64 = 15.0;

/// Local socket offsets of the 3-lane hub, measured in its frame: three
/// lanes, each with a face on either side of the hub. Verified against live
/// identity-rotation entities.
pub const HUB3_LANE_OFFSETS: [(Vec3, Vec3); 3] = [
    // center lane
    (
        Vec3::new(0.000001, -54.186704, 307.937676),
        Vec3::new(0.011049, 54.179305, 307.218374),
    ),
    // left lane
    (
        Vec3::new(-19.939297, -54.0, 307.937676),
        Vec3::new(-20.0, 54.0, 307.218374),
    ),
    // right lane
    (
        Vec3::new(19.991659, -54.0, 307.937676),
        Vec3::new(20.0, 54.0, 307.218374),
    ),
];

/// Counters for one forward synthesis run.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct SynthReport {
    pub junctions_fixed: usize,
    pub pole_paired_fixed: usize,
    pub clustered_fixed: usize,
    pub junctions_skipped: usize,
    pub already_has_sockets: usize,
    pub poles_created: usize,
    pub endpoint_rewrites: usize,
    pub rewrite_failures: usize,
    /// Invisible poles already present before this run; a leftover repair
    /// that should be reverted first.
    pub stale_poles_detected: usize,
}

#[derive(Default)]
struct Plan {
    sockets: Vec<SocketPlan>,
    poles: Vec<PolePlan>,
    rewrites: Vec<RewritePlan>,
}

struct SocketPlan {
    junction: u64,
    fragment: String,
    count: usize,
}

struct PolePlan {
    id: u64,
    entity: Entity,
}

struct RewritePlan {
    spline: u64,
    role: EndpointRole,
    old_id: u64,
    new_id: u64,
}

/// Synthesize socket metadata (and invisible poles where the junction kind
/// needs per-lane addressing) for every junction in the graph.
///
/// The whole plan is computed against the pre-repair graph before any
/// mutation is applied, so geometry decisions never observe partial state.
pub fn synthesize(graph: &mut EntityGraph) -> Result<SynthReport> {
    let junctions = discover_junctions(graph);
    let mut report = SynthReport {
        stale_poles_detected: graph
            .iter()
            .filter(|(_, e)| is_invisible_pole(e.config_path()))
            .count(),
        ..SynthReport::default()
    };
    if report.stale_poles_detected > 0 {
        log::warn!(
            "{} invisible poles already present; revert the previous repair first",
            report.stale_poles_detected
        );
    }

    let touch_index = build_touch_index(graph, &junctions)?;
    log::info!(
        "{} junctions, {} with connected splines",
        junctions.len(),
        touch_index.len()
    );

    let mut plan = Plan::default();
    let mut next_id = graph.next_id();

    for (&jid, &kind) in &junctions {
        let Some(touches) = touch_index.get(&jid) else {
            // Unconnected junction: nothing to derive sockets from.
            report.junctions_skipped += 1;
            continue;
        };
        let entity = graph.get(jid).expect("junction discovered from graph");
        match kind.strategy() {
            Strategy::Simple => plan_simple(jid, kind, entity, touches, &mut plan, &mut report),
            Strategy::PolePaired => {
                plan_pole_paired(jid, entity, touches, &mut next_id, &mut plan, &mut report)
            }
            Strategy::Clustered => plan_clustered(
                graph,
                jid,
                kind,
                entity,
                touches,
                &mut next_id,
                &mut plan,
                &mut report,
            ),
        }
    }

    apply(graph, plan, &mut report)?;

    log::info!(
        "synthesis: {} junctions fixed ({} pole-paired, {} clustered), {} poles created, {} skipped",
        report.junctions_fixed,
        report.pole_paired_fixed,
        report.clustered_fixed,
        report.poles_created,
        report.junctions_skipped
    );
    Ok(report)
}

fn plan_simple(
    jid: u64,
    kind: JunctionKind,
    entity: &Entity,
    touches: &[Touch],
    plan: &mut Plan,
    report: &mut SynthReport,
) {
    if socket_fragment(entity).is_some() {
        report.already_has_sockets += 1;
        report.junctions_skipped += 1;
        return;
    }

    // Coincident endpoints (two splines meeting at the same point) collapse
    // into one socket.
    let mut seen = BTreeSet::new();
    let mut records = Vec::new();
    for touch in touches {
        let Some(pos) = touch.pos else { continue };
        if !seen.insert(pos.rounded_key()) {
            continue;
        }
        records.push(SocketRecord {
            position: pos,
            connection: Some(direction_for(touch.role)),
            pole: None,
        });
    }
    if records.is_empty() {
        report.junctions_skipped += 1;
        return;
    }

    log::debug!("junction {jid} ({}): {} sockets", kind.label(), records.len());
    plan.sockets.push(SocketPlan {
        junction: jid,
        fragment: build_socket_fragment(&records),
        count: records.len(),
    });
    report.junctions_fixed += 1;
}

fn plan_pole_paired(
    jid: u64,
    entity: &Entity,
    touches: &[Touch],
    next_id: &mut u64,
    plan: &mut Plan,
    report: &mut SynthReport,
) {
    if socket_fragment(entity).is_some_and(has_pole_pairing) {
        report.already_has_sockets += 1;
        report.junctions_skipped += 1;
        return;
    }

    let origin = entity.translation();
    let rotation = entity.rotation();
    let mut records = Vec::with_capacity(HUB3_LANE_OFFSETS.len() * 2);

    for (lane, (offset_a, offset_b)) in HUB3_LANE_OFFSETS.iter().enumerate() {
        let pole_id = alloc(next_id);
        let face_a = origin.add(rotation.rotate(*offset_a));
        let face_b = origin.add(rotation.rotate(*offset_b));
        let conn_a = nearest_touch_direction(face_a, touches);
        let conn_b = nearest_touch_direction(face_b, touches);

        records.push(SocketRecord {
            position: face_a,
            connection: conn_a,
            pole: Some(pole_id),
        });
        records.push(SocketRecord {
            position: face_b,
            connection: conn_b,
            pole: Some(pole_id),
        });

        let pole_pos = Vec3::centroid([face_a, face_b]).expect("two face positions");
        plan.poles.push(PolePlan {
            id: pole_id,
            entity: invisible_pole_stub(pole_pos),
        });

        log::debug!(
            "hub {jid} lane {lane}: faces ({}, {}), pole {pole_id}",
            conn_a.map_or("-", ConnectionType::as_str),
            conn_b.map_or("-", ConnectionType::as_str)
        );
    }

    plan.sockets.push(SocketPlan {
        junction: jid,
        fragment: build_socket_fragment(&records),
        count: records.len(),
    });
    report.junctions_fixed += 1;
    report.pole_paired_fixed += 1;
}

#[allow(clippy::too_many_arguments)]
fn plan_clustered(
    graph: &EntityGraph,
    jid: u64,
    kind: JunctionKind,
    entity: &Entity,
    touches: &[Touch],
    next_id: &mut u64,
    plan: &mut Plan,
    report: &mut SynthReport,
) {
    if socket_fragment(entity).is_some_and(has_pole_pairing) {
        report.already_has_sockets += 1;
        report.junctions_skipped += 1;
        return;
    }

    let Some(axis) = detect_lane_axis(touches) else {
        log::debug!("junction {jid} ({}): no detectable lane axis", kind.label());
        report.junctions_skipped += 1;
        return;
    };
    let lanes = cluster_lanes(touches, axis, LANE_CLUSTER_TOLERANCE);
    if lanes.len() <= 1 {
        log::debug!("junction {jid} ({}): single lane, nothing to split", kind.label());
        report.junctions_skipped += 1;
        return;
    }

    let mut records = Vec::new();
    for (lane_idx, lane) in lanes.iter().enumerate() {
        let pole_id = alloc(next_id);
        let mut pole_pos = lane.centroid().expect("lanes hold positioned touches");
        if pole_pos.z == 0.0 {
            // Flat endpoint data carries no height; inherit the junction's.
            pole_pos.z = entity.translation().z;
        }

        let mut pole = match support_pole_template(graph, pole_pos) {
            Some(template) => template,
            None => invisible_pole_fallback(),
        };
        pole.set_translation(pole_pos);

        for touch in &lane.touches {
            let Some(pos) = touch.pos else { continue };
            records.push(SocketRecord {
                position: pos,
                connection: Some(direction_for(touch.role)),
                pole: Some(pole_id),
            });
            plan.rewrites.push(RewritePlan {
                spline: touch.spline_id,
                role: touch.role,
                old_id: jid,
                new_id: pole_id,
            });
        }

        log::debug!(
            "junction {jid} ({}) lane {lane_idx}: {} touches, pole {pole_id} at ({:.1}, {:.1}, {:.1})",
            kind.label(),
            lane.touches.len(),
            pole_pos.x,
            pole_pos.y,
            pole_pos.z
        );
        plan.poles.push(PolePlan {
            id: pole_id,
            entity: pole,
        });
    }

    plan.sockets.push(SocketPlan {
        junction: jid,
        fragment: build_socket_fragment(&records),
        count: records.len(),
    });
    report.junctions_fixed += 1;
    report.clustered_fixed += 1;
}

fn apply(graph: &mut EntityGraph, plan: Plan, report: &mut SynthReport) -> Result<()> {
    for pole in plan.poles {
        graph.insert(pole.id, pole.entity)?;
        report.poles_created += 1;
    }
    for rewrite in plan.rewrites {
        let done = graph
            .get_mut(rewrite.spline)
            .is_some_and(|spline| {
                rewrite_spline_endpoint(spline, rewrite.old_id, rewrite.new_id, rewrite.role)
            });
        if done {
            report.endpoint_rewrites += 1;
        } else {
            report.rewrite_failures += 1;
            log::warn!(
                "spline {}: {} endpoint {} -> {} found no matching text",
                rewrite.spline,
                rewrite.role.as_str(),
                rewrite.old_id,
                rewrite.new_id
            );
        }
    }
    for socket in plan.sockets {
        let entity = graph
            .get_mut(socket.junction)
            .expect("junction survived planning");
        let outcome = write_socket_fragment(entity, socket.fragment);
        log::debug!(
            "junction {}: {:?} socket fragment ({} sockets)",
            socket.junction,
            outcome,
            socket.count
        );
    }
    Ok(())
}

fn alloc(next_id: &mut u64) -> u64 {
    let id = *next_id;
    *next_id += 1;
    id
}

fn direction_for(role: EndpointRole) -> ConnectionType {
    match role {
        EndpointRole::Start => ConnectionType::Output,
        EndpointRole::End => ConnectionType::Input,
    }
}

/// Direction of the socket at `pos`: taken from the nearest touch within
/// tolerance, untyped when no spline ends nearby.
fn nearest_touch_direction(pos: Vec3, touches: &[Touch]) -> Option<ConnectionType> {
    let mut best_dist = SOCKET_MATCH_TOLERANCE;
    let mut best = None;
    for touch in touches {
        let Some(tpos) = touch.pos else { continue };
        let dist = pos.dist(tpos);
        if dist < best_dist {
            best_dist = dist;
            best = Some(direction_for(touch.role));
        }
    }
    best
}

/// Clone the nearest live rail-support pole as a construction template,
/// sanitized down to an invisible connector.
fn support_pole_template(graph: &EntityGraph, near: Vec3) -> Option<Entity> {
    let mut best: Option<(f64, &Entity)> = None;
    for (_, entity) in graph.iter() {
        if !is_support_pole(entity.config_path()) {
            continue;
        }
        let dist = entity.translation().dist(near);
        if best.map_or(true, |(b, _)| dist < b) {
            best = Some((dist, entity));
        }
    }
    let (_, template) = best?;

    let mut pole = template.clone();
    pole.set_config_path(INVISIBLE_POLE_CONFIG);
    pole.remove_fragments_containing(INTERSECTION_FRAGMENT);
    pole.reset_placement_state();
    pole.reset_transform();
    Some(pole)
}

/// Fixed-template invisible pole used for pole-paired hubs.
fn invisible_pole_stub(pos: Vec3) -> Entity {
    let mut pole = Entity::new(json!({
        "spawnData": {
            "entityConfigDataPath": INVISIBLE_POLE_CONFIG,
            "transform": {
                "rotation": {"x": 0, "y": 0, "z": 0, "w": 1},
                "translation": {"x": 0, "y": 0, "z": 0},
                "scale3D": {"x": 1, "y": 1, "z": 1}
            }
        },
        "tags": [],
        "fragmentValues": [
            "/Script/Chimera.CrElectricityFragment(ElectricityMultiplierLevel=1)"
        ]
    }));
    pole.set_translation(pos);
    pole
}

/// Minimal mechanically valid pole for when no live template entity exists.
fn invisible_pole_fallback() -> Entity {
    Entity::new(json!({
        "spawnData": {
            "entityConfigDataPath": INVISIBLE_POLE_CONFIG,
            "transform": {
                "rotation": {"x": 0, "y": 0, "z": 0, "w": 1},
                "translation": {"x": 0, "y": 0, "z": 0},
                "scale3D": {"x": 1, "y": 1, "z": 1}
            }
        },
        "tags": [],
        "fragmentValues": [
            "/Script/Chimera.CrStructuralStabilityFragment(StabilityLevel=1)",
            "/Script/Chimera.CrBuildingStateFragment(State=Completed)",
            "/Script/Chimera.CrElectricityFragment(ElectricityMultiplierLevel=1)",
            "/Script/Chimera.CrThermalFragment(Temperature=0.000000)"
        ]
    }))
}
