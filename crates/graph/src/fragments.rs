use crate::{Entity, GraphError, Result, Vec3};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Marker substrings identifying fragment kinds inside the generic
/// `fragmentValues` list. Fragments of other kinds pass through untouched.
pub const SPLINE_FRAGMENT: &str = "AuSplineConnectionFragment";
pub const SOCKET_FRAGMENT: &str = "CrLogisticsSocketsFragment";
pub const INTERSECTION_FRAGMENT: &str = "CrLogisticsIntersectionFragment";

/// Config path of the zero-footprint connector entity synthesized per lane.
pub const INVISIBLE_POLE_CONFIG: &str =
    "/Game/Chimera/Buildings/DroneConnections/InvisibleConnection/DA_DroneInvisiblePole.DA_DroneInvisiblePole";

const NEUTRAL_INTERSECTION: &str =
    "/Script/Chimera.CrLogisticsIntersectionFragment(CachedMoveSpeedPerLine=())";

static START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"StartEntity=\(ID=(\d+)\)").expect("start pattern"));
static END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"EndEntity=\(ID=(\d+)\)").expect("end pattern"));
static POSITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Position=\(X=([\-\d.]+),Y=([\-\d.]+),Z=([\-\d.]+)\)").expect("position pattern")
});
static ENTITY_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Entity=\(ID=(\d+)\)").expect("entity ref pattern"));
static PAIR_REF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r",SocketPairInvisibleConnector=\(ID=(\d+)\)").expect("pair ref pattern")
});

/// Which endpoint field of a spline a touch or rewrite refers to.
///
/// Start/End is the field-level role, not necessarily flow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    Start,
    End,
}

impl EndpointRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            EndpointRole::Start => "Start",
            EndpointRole::End => "End",
        }
    }
}

/// Endpoints and terminal positions parsed out of a spline fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineEnds {
    pub start_id: u64,
    pub end_id: u64,
    pub start_pos: Option<Vec3>,
    pub end_pos: Option<Vec3>,
}

impl SplineEnds {
    pub fn endpoint(&self, role: EndpointRole) -> u64 {
        match role {
            EndpointRole::Start => self.start_id,
            EndpointRole::End => self.end_id,
        }
    }

    pub fn position(&self, role: EndpointRole) -> Option<Vec3> {
        match role {
            EndpointRole::Start => self.start_pos,
            EndpointRole::End => self.end_pos,
        }
    }
}

/// Parse a single fragment as a spline connection.
///
/// Tolerant on shape: a fragment without recognizable Start/End markers is
/// simply "not a spline" (`Ok(None)`). Malformed numeric fields are a hard
/// error, never silently coerced.
pub fn parse_spline(fragment: &str) -> Result<Option<SplineEnds>> {
    if !fragment.contains(SPLINE_FRAGMENT) {
        return Ok(None);
    }
    let (Some(start), Some(end)) = (START_RE.captures(fragment), END_RE.captures(fragment)) else {
        return Ok(None);
    };

    let start_id = parse_num::<u64>("StartEntity", &start[1])?;
    let end_id = parse_num::<u64>("EndEntity", &end[1])?;

    let mut positions = Vec::new();
    for caps in POSITION_RE.captures_iter(fragment) {
        positions.push(Vec3::new(
            parse_num("Position.X", &caps[1])?,
            parse_num("Position.Y", &caps[2])?,
            parse_num("Position.Z", &caps[3])?,
        ));
    }

    Ok(Some(SplineEnds {
        start_id,
        end_id,
        start_pos: positions.first().copied(),
        end_pos: positions.last().copied(),
    }))
}

/// First spline fragment carried by `entity`, if any.
pub fn spline_ends(entity: &Entity) -> Result<Option<SplineEnds>> {
    for fragment in entity.fragments() {
        if let Some(ends) = parse_spline(fragment)? {
            return Ok(Some(ends));
        }
    }
    Ok(None)
}

/// Rewrite one endpoint reference of the entity's spline fragment.
///
/// Returns `true` iff a textual substitution occurred. A miss (no matching
/// `<Role>Entity=(ID=old)` text) is reported to the caller, which counts it.
pub fn rewrite_spline_endpoint(
    entity: &mut Entity,
    old_id: u64,
    new_id: u64,
    role: EndpointRole,
) -> bool {
    let needle = format!("{}Entity=(ID={})", role.as_str(), old_id);
    let replacement = format!("{}Entity=(ID={})", role.as_str(), new_id);
    let Some(fragments) = entity.fragment_values_mut() else {
        return false;
    };
    for value in fragments.iter_mut() {
        let Some(text) = value.as_str() else { continue };
        if !text.contains(SPLINE_FRAGMENT) || !text.contains(&needle) {
            continue;
        }
        *value = serde_json::Value::String(text.replacen(&needle, &replacement, 1));
        return true;
    }
    false
}

/// Direction tag of a socket record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    Input,
    Output,
}

impl ConnectionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            ConnectionType::Input => "Input",
            ConnectionType::Output => "Output",
        }
    }
}

/// One socket of a junction's connector metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SocketRecord {
    pub position: Vec3,
    pub connection: Option<ConnectionType>,
    /// Pairing target for lane-addressable junctions.
    pub pole: Option<u64>,
}

/// Print a socket fragment from its records.
pub fn build_socket_fragment(records: &[SocketRecord]) -> String {
    let mut parts = Vec::with_capacity(records.len());
    for record in records {
        let mut s = format!(
            "WorldPosition=(X={:.6},Y={:.6},Z={:.6})",
            record.position.x, record.position.y, record.position.z
        );
        if let Some(conn) = record.connection {
            let _ = write!(s, ",ConnectionType={},ConnectionEntity=()", conn.as_str());
        }
        if let Some(pole) = record.pole {
            let _ = write!(s, ",SocketPairInvisibleConnector=(ID={pole})");
        }
        parts.push(format!("({s})"));
    }
    format!(
        "/Script/Chimera.{}(Sockets=({}))",
        SOCKET_FRAGMENT,
        parts.join(",")
    )
}

/// Outcome of writing a socket fragment onto an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketWrite {
    Replaced,
    Appended,
}

/// Add or replace the entity's socket fragment. At most one exists per entity.
pub fn write_socket_fragment(entity: &mut Entity, fragment: String) -> SocketWrite {
    if let Some(values) = entity.fragment_values_mut() {
        for value in values.iter_mut() {
            if value.as_str().is_some_and(|s| s.contains(SOCKET_FRAGMENT)) {
                *value = serde_json::Value::String(fragment);
                return SocketWrite::Replaced;
            }
        }
    }
    entity.push_fragment(fragment);
    SocketWrite::Appended
}

/// The entity's socket fragment, if present.
pub fn socket_fragment(entity: &Entity) -> Option<&str> {
    entity.fragments().find(|f| f.contains(SOCKET_FRAGMENT))
}

/// Whether a socket fragment already carries invisible-pole pairing data.
pub fn has_pole_pairing(fragment: &str) -> bool {
    fragment.contains("SocketPairInvisibleConnector")
}

/// Entity ids referenced by an intersection fragment.
pub fn extract_intersection_refs(fragment: &str) -> Vec<u64> {
    ENTITY_REF_RE
        .captures_iter(fragment)
        .filter_map(|c| c[1].parse().ok())
        .collect()
}

/// Replace intersection fragments referencing any removed id with the empty
/// form; the host entity is kept. Returns how many fragments were neutralized.
pub fn neutralize_intersections(entity: &mut Entity, removed: &BTreeSet<u64>) -> usize {
    let Some(values) = entity.fragment_values_mut() else {
        return 0;
    };
    let mut cleaned = 0;
    for value in values.iter_mut() {
        let Some(text) = value.as_str() else { continue };
        if !text.contains(INTERSECTION_FRAGMENT) {
            continue;
        }
        if extract_intersection_refs(text)
            .iter()
            .any(|id| removed.contains(id))
        {
            *value = serde_json::Value::String(NEUTRAL_INTERSECTION.to_string());
            cleaned += 1;
        }
    }
    cleaned
}

/// Strip pole-pairing references to deleted poles from the entity's socket
/// fragment, keeping the socket records themselves. Returns `true` on change.
pub fn strip_pole_refs(entity: &mut Entity, poles: &BTreeSet<u64>) -> bool {
    let Some(values) = entity.fragment_values_mut() else {
        return false;
    };
    let mut changed = false;
    for value in values.iter_mut() {
        let Some(text) = value.as_str() else { continue };
        if !text.contains(SOCKET_FRAGMENT) {
            continue;
        }
        let stripped = PAIR_REF_RE.replace_all(text, |caps: &regex::Captures<'_>| {
            match caps[1].parse::<u64>() {
                Ok(id) if poles.contains(&id) => String::new(),
                _ => caps[0].to_string(),
            }
        });
        if stripped != text {
            *value = serde_json::Value::String(stripped.into_owned());
            changed = true;
        }
    }
    changed
}

fn parse_num<T: std::str::FromStr>(field: &'static str, text: &str) -> Result<T> {
    text.parse().map_err(|_| GraphError::MalformedNumber {
        field,
        text: text.to_string(),
    })
}
