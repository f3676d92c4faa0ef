use lanefix_savefile::entity_id_from_key;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

const CONNECTOR_TABLE_PATH: [&str; 4] = [
    "itemData",
    "Mass",
    "electricitySubsystemState",
    "connectorData",
];

/// The electricity subsystem's connector side-table, keyed by `(ID=n)`.
///
/// Entries for entities removed by the sweep or revert must be dropped along
/// with them. The table is optional; older saves simply don't have one.
#[derive(Debug, Default)]
pub struct ConnectorTable {
    entries: Option<Map<String, Value>>,
}

impl ConnectorTable {
    /// Steal the table out of the document; `restore` puts it back.
    pub fn take_from(root: &mut Value) -> Self {
        let mut cur = Some(root);
        for key in CONNECTOR_TABLE_PATH {
            cur = cur.and_then(|v| v.get_mut(key));
        }
        let entries = cur.and_then(Value::as_object_mut).map(std::mem::take);
        ConnectorTable { entries }
    }

    /// Drop entries keyed by any of `ids`; returns how many were removed.
    pub fn remove_ids(&mut self, ids: &BTreeSet<u64>) -> usize {
        let Some(entries) = self.entries.as_mut() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|key, _| !entity_id_from_key(key).is_some_and(|id| ids.contains(&id)));
        before - entries.len()
    }

    /// Put the (possibly pruned) table back where it came from.
    pub fn restore(self, root: &mut Value) {
        let Some(entries) = self.entries else { return };
        let mut cur = Some(root);
        for key in CONNECTOR_TABLE_PATH {
            cur = cur.and_then(|v| v.get_mut(key));
        }
        if let Some(slot) = cur {
            *slot = Value::Object(entries);
        }
    }
}
