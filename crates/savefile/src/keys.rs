use once_cell::sync::Lazy;
use regex::Regex;

static ID_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\(ID=(\d+)\)$").expect("id key pattern"));

/// Parse the integer identifier out of an `(ID=<n>)` entity key.
///
/// The `(ID=n)` string convention is confined to the serialization boundary;
/// everything above this crate works with plain `u64` identifiers.
pub fn entity_id_from_key(key: &str) -> Option<u64> {
    let caps = ID_KEY.captures(key)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Render the entity key for an identifier.
pub fn entity_key(id: u64) -> String {
    format!("(ID={id})")
}
