use crate::{entity_id_from_key, Result, SavefileError};
use serde_json::{Map, Value};

/// One step of the path from the document root to the entity container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSeg {
    Key(String),
    Index(usize),
}

// Fallback detection threshold: an unlabeled object this large whose keys are
// all `(ID=n)` is taken to be the entity table of a corrupted document.
const MIN_FALLBACK_CONTAINER_KEYS: usize = 100;

/// Depth-first scan for the entity container.
///
/// A container is either the value under a literal `entities` key, or the
/// first sufficiently large object whose keys all parse as `(ID=<digits>)`.
/// First match wins.
pub fn locate_entity_container(root: &Value) -> Option<Vec<PathSeg>> {
    let mut path = Vec::new();
    if scan(root, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn scan(value: &Value, path: &mut Vec<PathSeg>) -> bool {
    match value {
        Value::Object(map) => {
            if map.contains_key("entities") {
                path.push(PathSeg::Key("entities".to_string()));
                return true;
            }
            if looks_like_container(map) {
                return true;
            }
            for (key, child) in map {
                path.push(PathSeg::Key(key.clone()));
                if scan(child, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                path.push(PathSeg::Index(i));
                if scan(child, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
        _ => false,
    }
}

fn looks_like_container(map: &Map<String, Value>) -> bool {
    map.len() > MIN_FALLBACK_CONTAINER_KEYS
        && map.keys().all(|k| entity_id_from_key(k).is_some())
}

/// Resolve a located path to a mutable value.
pub fn value_at_mut<'a>(root: &'a mut Value, path: &[PathSeg]) -> Option<&'a mut Value> {
    let mut cur = root;
    for seg in path {
        cur = match seg {
            PathSeg::Key(k) => cur.as_object_mut()?.get_mut(k)?,
            PathSeg::Index(i) => cur.as_array_mut()?.get_mut(*i)?,
        };
    }
    Some(cur)
}

/// Take the entity container out of the document, leaving an empty object in
/// its place. Returns the path so the rebuilt container can be put back.
pub fn take_entity_container(root: &mut Value) -> Result<(Vec<PathSeg>, Map<String, Value>)> {
    let path = locate_entity_container(root).ok_or(SavefileError::NoEntityContainer)?;
    let slot = value_at_mut(root, &path).ok_or(SavefileError::NoEntityContainer)?;
    match std::mem::replace(slot, Value::Object(Map::new())) {
        Value::Object(map) => Ok((path, map)),
        other => {
            // Not an object after all; restore and report.
            *value_at_mut(root, &path).expect("path just resolved") = other;
            Err(SavefileError::NoEntityContainer)
        }
    }
}

/// Put a rebuilt entity container back at its original location.
pub fn restore_entity_container(root: &mut Value, path: &[PathSeg], map: Map<String, Value>) {
    if let Some(slot) = value_at_mut(root, path) {
        *slot = Value::Object(map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn finds_labeled_container_at_depth() {
        let doc = json!({
            "header": {"version": 3},
            "world": {"chunk": {"entities": {"(ID=1)": {}}}}
        });
        let path = locate_entity_container(&doc).unwrap();
        assert_eq!(
            path,
            vec![
                PathSeg::Key("world".into()),
                PathSeg::Key("chunk".into()),
                PathSeg::Key("entities".into())
            ]
        );
    }

    #[test]
    fn finds_unlabeled_container_by_key_shape() {
        let mut big = Map::new();
        for i in 0..150u64 {
            big.insert(format!("(ID={i})"), json!({}));
        }
        let doc = json!({"blob": [ {"x": 1}, Value::Object(big) ]});
        let path = locate_entity_container(&doc).unwrap();
        assert_eq!(path, vec![PathSeg::Key("blob".into()), PathSeg::Index(1)]);
    }

    #[test]
    fn small_id_keyed_objects_are_not_containers() {
        let doc = json!({"connectorData": {"(ID=1)": {}, "(ID=2)": {}}});
        assert!(locate_entity_container(&doc).is_none());
    }

    #[test]
    fn take_and_restore_round_trip() {
        let mut doc = json!({"a": {"entities": {"(ID=9)": {"tags": []}}}});
        let original = doc.clone();

        let (path, map) = take_entity_container(&mut doc).unwrap();
        assert_eq!(map.len(), 1);
        restore_entity_container(&mut doc, &path, map);
        assert_eq!(doc, original);
    }

    #[test]
    fn missing_container_is_reported() {
        let mut doc = json!({"a": [1, 2, 3]});
        let err = take_entity_container(&mut doc).unwrap_err();
        assert!(matches!(err, SavefileError::NoEntityContainer));
    }
}
