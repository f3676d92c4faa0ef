//! End-to-end runs over whole documents: repair, idempotence, revert
//! round-trip, and referential integrity.

use lanefix_graph::{spline_ends, EntityGraph, Vec3};
use lanefix_repair::{run, Mode, HUB3_LANE_OFFSETS};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};

fn entity_key(id: u64) -> String {
    format!("(ID={id})")
}

fn junction(kind: &str, pos: Vec3) -> Value {
    json!({
        "spawnData": {
            "entityConfigDataPath": format!("/Game/Chimera/Buildings/DroneConnections/DA_{kind}.DA_{kind}"),
            "transform": {
                "translation": {"x": pos.x, "y": pos.y, "z": pos.z},
                "rotation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0},
                "scale3D": {"x": 1, "y": 1, "z": 1}
            }
        },
        "tags": [],
        "fragmentValues": []
    })
}

fn plain_entity() -> Value {
    json!({"spawnData": {"entityConfigDataPath": "/Game/Chimera/Buildings/DA_Depot.DA_Depot"}, "fragmentValues": []})
}

fn spline(start: u64, end: u64, start_pos: Vec3, end_pos: Vec3) -> Value {
    json!({"fragmentValues": [format!(
        "/Script/Chimera.AuSplineConnectionFragment(StartEntity=(ID={start}),EndEntity=(ID={end}),\
         SplinePoints=(Position=(X={:.6},Y={:.6},Z={:.6}),Position=(X={:.6},Y={:.6},Z={:.6})))",
        start_pos.x, start_pos.y, start_pos.z, end_pos.x, end_pos.y, end_pos.z
    )]})
}

fn document(entities: Map<String, Value>) -> Value {
    json!({
        "header": {"saveVersion": 12},
        "world": {"entities": entities},
        "itemData": {"Mass": {"electricitySubsystemState": {"connectorData": {}}}}
    })
}

/// One 3-lane hub with an outbound and an inbound spline per lane.
fn hub3_document() -> Value {
    let jpos = Vec3::new(1000.0, 2000.0, 50.0);
    let mut entities = Map::new();
    entities.insert(entity_key(1), junction("DroneLane_3", jpos));

    let mut next = 10u64;
    for (offset_a, offset_b) in HUB3_LANE_OFFSETS {
        let face_a = jpos.add(offset_a);
        let face_b = jpos.add(offset_b);
        let far = Vec3::new(5000.0, 5000.0, 50.0);

        let depot_out = next;
        let depot_in = next + 1;
        entities.insert(entity_key(depot_out), plain_entity());
        entities.insert(entity_key(depot_in), plain_entity());
        // Outbound: starts at the junction's A face. Inbound: ends at B.
        entities.insert(entity_key(next + 2), spline(1, depot_out, face_a, far));
        entities.insert(entity_key(next + 3), spline(depot_in, 1, far, face_b));
        next += 4;
    }
    document(entities)
}

fn assert_referential_integrity(doc: &Value) {
    let container = doc.pointer("/world/entities").unwrap().as_object().unwrap();
    let graph = EntityGraph::from_container(container.clone());
    for (id, entity) in graph.iter() {
        if let Some(ends) = spline_ends(entity).unwrap() {
            assert!(graph.contains(ends.start_id), "spline {id} start dangles");
            assert!(graph.contains(ends.end_id), "spline {id} end dangles");
        }
    }
}

#[test]
fn hub3_repair_produces_six_sockets_and_three_poles() {
    let mut doc = hub3_document();
    let before = doc.pointer("/world/entities").unwrap().as_object().unwrap().len();

    let report = run(&mut doc, Mode::Repair).unwrap();
    let synth = report.synth.unwrap();
    assert_eq!(synth.junctions_fixed, 1);
    assert_eq!(synth.pole_paired_fixed, 1);
    assert_eq!(synth.poles_created, 3);

    let container = doc.pointer("/world/entities").unwrap().as_object().unwrap();
    assert_eq!(container.len(), before + 3);

    let hub = container.get("(ID=1)").unwrap();
    let sockets = hub["fragmentValues"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .find(|f| f.contains("CrLogisticsSocketsFragment"))
        .unwrap();
    assert_eq!(sockets.matches("WorldPosition=").count(), 6);
    assert_eq!(sockets.matches("SocketPairInvisibleConnector=").count(), 6);
    // Every face has a spline ending on it, so every socket is typed.
    assert_eq!(sockets.matches("ConnectionType=Output").count(), 3);
    assert_eq!(sockets.matches("ConnectionType=Input").count(), 3);

    assert_referential_integrity(&doc);
}

#[test]
fn second_repair_run_is_a_noop() {
    let mut doc = hub3_document();
    run(&mut doc, Mode::Repair).unwrap();
    let snapshot = doc.clone();

    let second = run(&mut doc, Mode::Repair).unwrap();
    let synth = second.synth.unwrap();
    assert_eq!(synth.junctions_fixed, 0);
    assert_eq!(synth.poles_created, 0);
    assert_eq!(synth.already_has_sockets, 1);
    assert_eq!(doc, snapshot);
}

#[test]
fn revert_after_repair_restores_the_original_topology() {
    let mut doc = hub3_document();
    run(&mut doc, Mode::Repair).unwrap();

    let report = run(&mut doc, Mode::Revert).unwrap();
    let revert = report.revert.unwrap();
    assert_eq!(revert.poles_removed, 3);
    assert_eq!(revert.warnings, 0);
    assert_eq!(revert.socket_refs_cleaned, 1);

    let container = doc.pointer("/world/entities").unwrap().as_object().unwrap();
    assert!(!container
        .values()
        .any(|e| e.pointer("/spawnData/entityConfigDataPath")
            .and_then(Value::as_str)
            .is_some_and(|c| c.contains("DroneInvisiblePole"))));
    assert_referential_integrity(&doc);

    // A fresh repair rebuilds an equivalent socket/pole structure.
    let again = run(&mut doc, Mode::Repair).unwrap().synth.unwrap();
    assert_eq!(again.junctions_fixed, 1);
    assert_eq!(again.poles_created, 3);
}

#[test]
fn clustered_hub_round_trips_spline_endpoints() {
    let jpos = Vec3::new(0.0, 0.0, 20.0);
    let mut entities = Map::new();
    entities.insert(entity_key(1), junction("DroneLane_5", jpos));
    entities.insert(entity_key(2), plain_entity());
    entities.insert(
        entity_key(20),
        spline(1, 2, Vec3::new(0.0, -50.0, 20.0), Vec3::new(0.0, -900.0, 20.0)),
    );
    entities.insert(
        entity_key(21),
        spline(1, 2, Vec3::new(40.0, -50.0, 20.0), Vec3::new(40.0, -900.0, 20.0)),
    );
    let mut doc = document(entities);

    let synth = run(&mut doc, Mode::Repair).unwrap().synth.unwrap();
    assert_eq!(synth.clustered_fixed, 1);
    assert_eq!(synth.poles_created, 2);
    assert_eq!(synth.endpoint_rewrites, 2);

    let revert = run(&mut doc, Mode::Revert).unwrap().revert.unwrap();
    assert_eq!(revert.poles_removed, 2);
    assert_eq!(revert.rewrites, 2);

    // Endpoints reference the junction directly again.
    let container = doc.pointer("/world/entities").unwrap().as_object().unwrap();
    let graph = EntityGraph::from_container(container.clone());
    for spline_id in [20, 21] {
        let ends = spline_ends(graph.get(spline_id).unwrap()).unwrap().unwrap();
        assert_eq!(ends.start_id, 1);
        assert_eq!(ends.end_id, 2);
    }
}

#[test]
fn dangling_splines_are_excised_before_synthesis() {
    let mut entities = Map::new();
    entities.insert(entity_key(1), junction("DroneMerger_3To1", Vec3::new(0.0, 0.0, 0.0)));
    entities.insert(entity_key(2), plain_entity());
    entities.insert(
        entity_key(20),
        spline(1, 2, Vec3::new(5.0, 0.0, 0.0), Vec3::new(90.0, 0.0, 0.0)),
    );
    // End references a missing entity.
    entities.insert(
        entity_key(21),
        spline(1, 999, Vec3::new(-5.0, 0.0, 0.0), Vec3::new(-90.0, 0.0, 0.0)),
    );
    let mut doc = document(entities);

    let report = run(&mut doc, Mode::Repair).unwrap();
    assert_eq!(report.sweep.unwrap().removed, 1);
    assert_referential_integrity(&doc);

    // The surviving touch still produced a socket.
    let synth = report.synth.unwrap();
    assert_eq!(synth.junctions_fixed, 1);
}

#[test]
fn document_without_entity_container_is_fatal() {
    let mut doc = json!({"header": {"saveVersion": 12}});
    let err = run(&mut doc, Mode::Repair).unwrap_err();
    assert!(err.to_string().contains("no entity container"));
}
