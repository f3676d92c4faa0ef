use crate::{Quat, Vec3};
use serde_json::{json, Map, Value};

/// One entity record.
///
/// Wraps the raw JSON value so fields outside the repair's scope survive the
/// round trip byte-for-byte; typed accessors cover only what the engine needs
/// (config path, transform, fragment list).
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    value: Value,
}

impl Entity {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// `spawnData.entityConfigDataPath`, empty if absent.
    pub fn config_path(&self) -> &str {
        self.value
            .pointer("/spawnData/entityConfigDataPath")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn set_config_path(&mut self, path: &str) {
        if let Some(spawn) = self
            .value
            .get_mut("spawnData")
            .and_then(Value::as_object_mut)
        {
            spawn.insert("entityConfigDataPath".to_string(), json!(path));
        }
    }

    pub fn translation(&self) -> Vec3 {
        let t = self.value.pointer("/spawnData/transform/translation");
        Vec3::new(num(t, "x", 0.0), num(t, "y", 0.0), num(t, "z", 0.0))
    }

    pub fn rotation(&self) -> Quat {
        let r = self.value.pointer("/spawnData/transform/rotation");
        Quat::new(
            num(r, "x", 0.0),
            num(r, "y", 0.0),
            num(r, "z", 0.0),
            num(r, "w", 1.0),
        )
    }

    pub fn set_translation(&mut self, pos: Vec3) {
        let t = self.transform_field("translation");
        *t = json!({"x": pos.x, "y": pos.y, "z": pos.z});
    }

    /// Reset the transform to origin / identity / unit scale.
    pub fn reset_transform(&mut self) {
        *self.transform_field("translation") = json!({"x": 0, "y": 0, "z": 0});
        *self.transform_field("rotation") = json!({"x": 0, "y": 0, "z": 0, "w": 1});
        *self.transform_field("scale3D") = json!({"x": 1, "y": 1, "z": 1});
    }

    /// Zero out placement-timing state carried over from a cloned template.
    pub fn reset_placement_state(&mut self) {
        if let Some(spawn) = self
            .value
            .get_mut("spawnData")
            .and_then(Value::as_object_mut)
        {
            for key in ["placementTime", "buildProgress"] {
                if spawn.contains_key(key) {
                    spawn.insert(key.to_string(), json!(0));
                }
            }
        }
    }

    /// Fragment strings, in order. Non-string entries are skipped.
    pub fn fragments(&self) -> impl Iterator<Item = &str> {
        self.value
            .get("fragmentValues")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    pub(crate) fn fragment_values_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.value
            .get_mut("fragmentValues")
            .and_then(Value::as_array_mut)
    }

    pub fn push_fragment(&mut self, fragment: String) {
        match self.fragment_values_mut() {
            Some(list) => list.push(Value::String(fragment)),
            None => {
                if let Some(map) = self.value.as_object_mut() {
                    map.insert("fragmentValues".to_string(), json!([fragment]));
                }
            }
        }
    }

    /// Drop every fragment containing `marker`; returns how many were removed.
    pub fn remove_fragments_containing(&mut self, marker: &str) -> usize {
        let Some(list) = self.fragment_values_mut() else {
            return 0;
        };
        let before = list.len();
        list.retain(|f| !f.as_str().is_some_and(|s| s.contains(marker)));
        before - list.len()
    }

    fn transform_field(&mut self, name: &str) -> &mut Value {
        let map = self
            .value
            .as_object_mut()
            .expect("entity records are objects");
        let spawn = obj_entry(map, "spawnData");
        let transform = obj_entry(spawn, "transform");
        transform.entry(name.to_string()).or_insert(Value::Null)
    }
}

fn obj_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut().expect("just ensured object")
}

fn num(parent: Option<&Value>, key: &str, default: f64) -> f64 {
    parent
        .and_then(|v| v.get(key))
        .and_then(Value::as_f64)
        .unwrap_or(default)
}
