use lanefix_graph::EntityGraph;
use std::collections::BTreeMap;

/// Multi-lane junction families, classified by config path substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JunctionKind {
    /// 3-lane hub with pre-measured socket geometry, needs pole pairing.
    Hub3,
    /// 5-lane hub; lane layout recovered geometrically.
    Hub5,
    Merger3,
    Merger5,
    Junction4,
}

/// How connector metadata is synthesized for a junction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Deduplicated sockets straight from spline endpoints, no poles.
    Simple,
    /// Fixed local lane offsets rotated into world space, one pole per lane.
    PolePaired,
    /// Lanes detected by axis clustering, one pole per cluster, endpoints
    /// rerouted through the poles.
    Clustered,
}

impl JunctionKind {
    pub fn classify(config_path: &str) -> Option<Self> {
        if config_path.contains("DroneLane_3") {
            Some(JunctionKind::Hub3)
        } else if config_path.contains("DroneLane_5") {
            Some(JunctionKind::Hub5)
        } else if config_path.contains("DroneMerger_3To1") {
            Some(JunctionKind::Merger3)
        } else if config_path.contains("DroneMerger_5To1") {
            Some(JunctionKind::Merger5)
        } else if config_path.contains("DA_DroneJunction_4") {
            Some(JunctionKind::Junction4)
        } else {
            None
        }
    }

    pub const fn strategy(self) -> Strategy {
        match self {
            JunctionKind::Hub3 => Strategy::PolePaired,
            JunctionKind::Hub5 => Strategy::Clustered,
            JunctionKind::Merger3 | JunctionKind::Merger5 | JunctionKind::Junction4 => {
                Strategy::Simple
            }
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            JunctionKind::Hub3 => "3-lane hub",
            JunctionKind::Hub5 => "5-lane hub",
            JunctionKind::Merger3 => "merger 3-to-1",
            JunctionKind::Merger5 => "merger 5-to-1",
            JunctionKind::Junction4 => "4-way junction",
        }
    }
}

/// Whether a config path marks a synthesized invisible connector pole.
pub fn is_invisible_pole(config_path: &str) -> bool {
    config_path.contains("DroneInvisiblePole")
}

/// Whether a config path marks a live rail-support pole usable as a clone
/// template for new invisible poles.
pub fn is_support_pole(config_path: &str) -> bool {
    config_path.contains("DronePole") && !is_invisible_pole(config_path)
}

/// All junction entities in the graph, keyed by id.
pub fn discover_junctions(graph: &EntityGraph) -> BTreeMap<u64, JunctionKind> {
    graph
        .iter()
        .filter_map(|(id, entity)| JunctionKind::classify(entity.config_path()).map(|k| (id, k)))
        .collect()
}
