use crate::Touch;
use lanefix_graph::Vec3;
use std::collections::BTreeMap;

/// Gap between projected endpoint positions that still belongs to the same
/// physical lane. Shared with socket-to-touch matching.
pub const LANE_CLUSTER_TOLERANCE: f64 = 15.0;

/// The horizontal axis that separates parallel lanes at a junction face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneAxis {
    X,
    Y,
}

impl LaneAxis {
    pub fn project(self, pos: Vec3) -> f64 {
        match self {
            LaneAxis::X => pos.x,
            LaneAxis::Y => pos.y,
        }
    }
}

/// One physical traffic lane: the touches whose projected positions cluster
/// together.
#[derive(Debug, Clone)]
pub struct Lane {
    pub touches: Vec<Touch>,
}

impl Lane {
    pub fn centroid(&self) -> Option<Vec3> {
        Vec3::centroid(self.touches.iter().filter_map(|t| t.pos))
    }
}

/// Detect the lane-separating axis for a junction's touches.
///
/// Touches sharing a neighbor entity sit on the same face of the junction, so
/// their spread is pure lane separation. The first neighbor group (in id
/// order, for determinism) with at least two positioned touches decides:
/// whichever of X/Y spreads wider wins, X on an exact tie. No such group
/// means no detectable multi-lane structure.
pub fn detect_lane_axis(touches: &[Touch]) -> Option<LaneAxis> {
    let mut by_neighbor: BTreeMap<u64, Vec<Vec3>> = BTreeMap::new();
    for touch in touches {
        if let Some(pos) = touch.pos {
            by_neighbor.entry(touch.neighbor).or_default().push(pos);
        }
    }
    for positions in by_neighbor.values() {
        if positions.len() < 2 {
            continue;
        }
        let spread = |f: fn(&Vec3) -> f64| {
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for p in positions {
                min = min.min(f(p));
                max = max.max(f(p));
            }
            max - min
        };
        let x_spread = spread(|p| p.x);
        let y_spread = spread(|p| p.y);
        return Some(if x_spread >= y_spread {
            LaneAxis::X
        } else {
            LaneAxis::Y
        });
    }
    None
}

/// Greedy 1-D clustering of touches along the detected axis.
///
/// Positioned touches are sorted by their projection; a gap between
/// consecutive values larger than `tolerance` opens a new cluster. Each
/// cluster is one lane.
pub fn cluster_lanes(touches: &[Touch], axis: LaneAxis, tolerance: f64) -> Vec<Lane> {
    let mut projected: Vec<(f64, Touch)> = touches
        .iter()
        .filter_map(|t| t.pos.map(|p| (axis.project(p), *t)))
        .collect();
    if projected.is_empty() {
        return Vec::new();
    }
    projected.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut lanes: Vec<Lane> = Vec::new();
    let mut last_value = f64::NEG_INFINITY;
    for (value, touch) in projected {
        match lanes.last_mut() {
            Some(lane) if (value - last_value).abs() <= tolerance => lane.touches.push(touch),
            _ => lanes.push(Lane {
                touches: vec![touch],
            }),
        }
        last_value = value;
    }
    lanes
}
