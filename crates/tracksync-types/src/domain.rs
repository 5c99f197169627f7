//! Dialogue domain types.
//!
//! Only the slot definitions of a domain matter for rebuilding trackers;
//! every other section of a `domain.yml` is ignored on load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The parts of a dialogue domain needed to replay tracker events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    #[serde(default)]
    pub slots: BTreeMap<String, SlotDefinition>,
}

/// One slot declared by the domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotDefinition {
    #[serde(rename = "type", default)]
    pub slot_type: Option<String>,

    /// Value the slot holds before any event sets it.
    #[serde(default)]
    pub initial_value: Value,
}

impl Domain {
    /// Slot values of a fresh conversation.
    pub fn initial_slots(&self) -> BTreeMap<String, Value> {
        self.slots
            .iter()
            .map(|(name, def)| (name.clone(), def.initial_value.clone()))
            .collect()
    }

    pub fn has_slot(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }
}
