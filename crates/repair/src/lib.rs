//! # Lanefix Repair
//!
//! The junction repair engine: recovers per-lane connector metadata for
//! multi-lane drone junctions from spline geometry, and reverses a prior
//! repair losslessly.
//!
//! ## Pipeline
//!
//! ```text
//! document (JSON)
//!     │  take entity container + connector side-table
//!     ├──> Integrity sweep        excise dangling splines, cascade cleanup
//!     ├──> Touch index            which splines meet which junction, where
//!     ├──> Lane clustering        separating axis + greedy 1-D clusters
//!     ├──> Socket/pole synthesis  plan against the pre-repair graph,
//!     │                           then apply (poles, rewrites, sockets)
//!     └──> restore container + side-table
//! ```
//!
//! Revert walks the same structures backwards: splines pointing at invisible
//! poles are reconnected to the nearest junction, poles are deleted, stale
//! pairing references stripped.
//!
//! All mutation happens in memory; persistence is the caller's concern, which
//! is what makes dry runs report the same counts as apply runs.

mod cluster;
mod error;
mod index;
mod junction;
mod revert;
mod run;
mod sweep;
mod synth;

pub use cluster::{cluster_lanes, detect_lane_axis, Lane, LaneAxis, LANE_CLUSTER_TOLERANCE};
pub use error::{RepairError, Result};
pub use index::{build_touch_index, Touch, TouchIndex};
pub use junction::{discover_junctions, is_invisible_pole, is_support_pole, JunctionKind, Strategy};
pub use revert::{revert, RevertReport, REVERT_DISTANCE_LIMIT};
pub use run::{run, Mode, RunReport};
pub use sweep::{find_dangling, purge, SweepReport};
pub use synth::{synthesize, SynthReport, HUB3_LANE_OFFSETS, SOCKET_MATCH_TOLERANCE};
