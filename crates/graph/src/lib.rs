//! # Lanefix Graph
//!
//! In-memory entity graph over the archive's entity table, plus the codec for
//! the annotated text fragments the repair engine cares about.
//!
//! ## Architecture
//!
//! ```text
//! entity container (JSON map, "(ID=n)" keys)
//!     │
//!     ├──> EntityGraph (u64 -> Entity, monotonic id allocator)
//!     │      └─ Entity: raw record + typed accessors (config, transform,
//!     │         fragment list); untouched fields pass through verbatim
//!     │
//!     ├──> Fragment codec (regex parse / print)
//!     │      ├─ spline connections (endpoints + position sequence)
//!     │      ├─ logistics sockets (position, direction, pole pairing)
//!     │      └─ intersection routing (neutralized on cascade)
//!     │
//!     └──> ConnectorTable (external side-table keyed by entity id)
//! ```

mod connectors;
mod entity;
mod error;
mod fragments;
mod geometry;
mod graph;

pub use connectors::ConnectorTable;
pub use entity::Entity;
pub use error::{GraphError, Result};
pub use fragments::{
    build_socket_fragment, extract_intersection_refs, has_pole_pairing, neutralize_intersections,
    parse_spline, rewrite_spline_endpoint, socket_fragment, spline_ends, strip_pole_refs,
    write_socket_fragment, ConnectionType, EndpointRole, SocketRecord, SocketWrite, SplineEnds,
    INTERSECTION_FRAGMENT, INVISIBLE_POLE_CONFIG, SOCKET_FRAGMENT, SPLINE_FRAGMENT,
};
pub use geometry::{Quat, Vec3};
pub use graph::{EntityGraph, RESERVED_ID_FLOOR};
