use crate::junction::JunctionKind;
use crate::Result;
use lanefix_graph::{spline_ends, EndpointRole, EntityGraph, Vec3};
use std::collections::BTreeMap;

/// One spline meeting one junction: which endpoint, which neighbor, where.
///
/// Derived, never stored. A touch without a position still counts for
/// connectivity but is excluded from geometric decisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub spline_id: u64,
    pub role: EndpointRole,
    pub neighbor: u64,
    pub pos: Option<Vec3>,
}

pub type TouchIndex = BTreeMap<u64, Vec<Touch>>;

/// Collect, per junction, every spline endpoint that terminates there.
///
/// A spline connecting two junctions contributes a touch to each; one looping
/// back to the same junction contributes two.
pub fn build_touch_index(
    graph: &EntityGraph,
    junctions: &BTreeMap<u64, JunctionKind>,
) -> Result<TouchIndex> {
    let mut index = TouchIndex::new();
    for (spline_id, entity) in graph.iter() {
        let Some(ends) = spline_ends(entity)? else {
            continue;
        };
        if junctions.contains_key(&ends.start_id) {
            index.entry(ends.start_id).or_default().push(Touch {
                spline_id,
                role: EndpointRole::Start,
                neighbor: ends.end_id,
                pos: ends.start_pos,
            });
        }
        if junctions.contains_key(&ends.end_id) {
            index.entry(ends.end_id).or_default().push(Touch {
                spline_id,
                role: EndpointRole::End,
                neighbor: ends.start_id,
                pos: ends.end_pos,
            });
        }
    }
    log::debug!(
        "touch index: {} junctions with at least one touch",
        index.len()
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanefix_graph::Entity;
    use serde_json::json;

    fn spline(start: u64, end: u64) -> Entity {
        Entity::new(json!({"fragmentValues": [format!(
            "/Script/Chimera.AuSplineConnectionFragment(StartEntity=(ID={start}),EndEntity=(ID={end}),\
             SplinePoints=(Position=(X=0.000000,Y=0.000000,Z=0.000000),\
             Position=(X=10.000000,Y=0.000000,Z=0.000000)))"
        )]}))
    }

    fn junction(kind: &str) -> Entity {
        Entity::new(json!({"spawnData": {
            "entityConfigDataPath": format!("/Game/Drone/DA_{kind}.DA_{kind}")
        }}))
    }

    #[test]
    fn indexes_touches_at_both_roles() {
        let mut graph = EntityGraph::default();
        graph.insert(1, junction("DroneMerger_3To1")).unwrap();
        graph.insert(2, junction("DroneMerger_3To1")).unwrap();
        graph.insert(10, spline(1, 2)).unwrap();
        graph.insert(11, spline(5, 1)).unwrap();

        let junctions = crate::discover_junctions(&graph);
        let index = build_touch_index(&graph, &junctions).unwrap();

        let at_1 = &index[&1];
        assert_eq!(at_1.len(), 2);
        assert!(at_1
            .iter()
            .any(|t| t.spline_id == 10 && t.role == EndpointRole::Start && t.neighbor == 2));
        assert!(at_1
            .iter()
            .any(|t| t.spline_id == 11 && t.role == EndpointRole::End && t.neighbor == 5));
        assert_eq!(index[&2].len(), 1);
    }

    #[test]
    fn non_junction_endpoints_are_ignored() {
        let mut graph = EntityGraph::default();
        graph.insert(1, junction("Conveyor")).unwrap();
        graph.insert(10, spline(1, 2)).unwrap();

        let junctions = crate::discover_junctions(&graph);
        let index = build_touch_index(&graph, &junctions).unwrap();
        assert!(index.is_empty());
    }
}
