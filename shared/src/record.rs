use crate::{archetype::ArchetypeId, constants::EMPTY_IDENTITY_ID, error::DeserializeError};
use serde::{Deserialize, Serialize};

/// Persisted identity of one actor, embedded in the actor's save record.
///
/// ```text
/// { "id": "zombie" | "empty", "EntityData": { ...shadow state... } }
/// ```
///
/// `id == "empty"` is the no-identity sentinel and is always paired with an empty
/// `EntityData` object, which readers ignore.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub id: String,
    #[serde(rename = "EntityData", default)]
    pub entity_data: serde_json::Value,
}

impl IdentityRecord {
    pub fn empty() -> Self {
        Self {
            id: EMPTY_IDENTITY_ID.to_owned(),
            entity_data: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    pub fn equipped(archetype: &ArchetypeId, entity_data: serde_json::Value) -> Self {
        Self {
            id: archetype.to_string(),
            entity_data,
        }
    }

    pub fn is_empty_sentinel(&self) -> bool {
        ArchetypeId::is_empty_sentinel(&self.id)
    }

    /// Archetype named by the record, or `None` for the sentinel.
    pub fn archetype(&self) -> Option<ArchetypeId> {
        (!self.is_empty_sentinel()).then(|| ArchetypeId::new(&self.id))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| Self::empty_json())
    }

    pub fn from_json(json: &str) -> Result<Self, DeserializeError> {
        serde_json::from_str(json).map_err(DeserializeError::Malformed)
    }

    fn empty_json() -> String {
        format!(r#"{{"id":"{EMPTY_IDENTITY_ID}","EntityData":{{}}}}"#)
    }
}

impl Default for IdentityRecord {
    fn default() -> Self {
        Self::empty()
    }
}
