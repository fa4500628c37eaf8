//! Preset documents: the host state blob and preset files.
//!
//! ```json
//! {
//!   "schemaVersion": 3,
//!   "parameters": { "hereticMix": 0.5, "filterCutoff": 0.91 },
//!   "author": "kept as-is"
//! }
//! ```
//!
//! Values are normalized. Loading an older document fills missing parameters
//! with their defaults. Unknown top-level keys and unknown parameter ids are
//! kept and written back on the next save, but never applied.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PresetError;
use crate::params::tree::ParameterTree;

/// Current document version.
pub const SCHEMA_VERSION: u32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetDocument {
    #[serde(rename = "schemaVersion")]
    pub schema_version: u32,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PresetDocument {
    /// Capture the current values of `tree`.
    pub fn capture(tree: &ParameterTree, preserved: &Preserved) -> Self {
        let mut parameters = preserved.parameters.clone();
        for parameter in tree.iter() {
            parameters.insert(parameter.id().to_string(), Value::from(parameter.normalized()));
        }
        Self {
            schema_version: SCHEMA_VERSION,
            parameters,
            extra: preserved.extra.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, PresetError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Keys a document carried that this build does not understand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preserved {
    pub parameters: Map<String, Value>,
    pub extra: Map<String, Value>,
}

/// Encode the tree as a preset document.
pub fn serialize(tree: &ParameterTree, preserved: &Preserved) -> Result<String, PresetError> {
    PresetDocument::capture(tree, preserved).to_json()
}

/// Decode `text` and apply it to `tree`.
///
/// The document is fully parsed and validated before any value is touched,
/// so an error leaves the tree exactly as it was. On success the keys this
/// build does not know about are returned for the next save.
pub fn deserialize(tree: &ParameterTree, text: &str) -> Result<Preserved, PresetError> {
    let document = PresetDocument::from_json(text)?;
    if document.schema_version > SCHEMA_VERSION {
        warn!(
            "refusing preset with schema version {} (supported {SCHEMA_VERSION})",
            document.schema_version
        );
        return Err(PresetError::SchemaMismatch {
            found: document.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    if document.schema_version < SCHEMA_VERSION {
        warn!(
            "migrating preset from schema version {} to {SCHEMA_VERSION}",
            document.schema_version
        );
    }

    let mut preserved = Preserved {
        parameters: Map::new(),
        extra: document.extra,
    };
    let mut values = Vec::with_capacity(tree.len());
    for (id, value) in document.parameters {
        match (tree.index_of(&id), value.as_f64()) {
            (Some(index), Some(normalized)) => values.push((index, normalized as f32)),
            _ => {
                preserved.parameters.insert(id, value);
            }
        }
    }

    // Additive migration: anything the document does not mention is default.
    for (index, parameter) in tree.iter().enumerate() {
        let normalized = values
            .iter()
            .find(|(target, _)| *target == index)
            .map(|(_, value)| *value)
            .unwrap_or_else(|| parameter.default_normalized());
        tree.set_normalized(index, normalized);
    }

    info!(
        "loaded preset: {} parameters, {} preserved keys",
        values.len(),
        preserved.parameters.len() + preserved.extra.len()
    );
    Ok(preserved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::layout::{build_tree, Param};

    #[test]
    fn round_trip_restores_every_value() {
        let tree = build_tree().unwrap();
        tree.set_normalized(Param::HereticMix.index(), 0.25);
        tree.set_normalized(Param::FilterCutoff.index(), 0.3);
        tree.set_normalized(Param::GlobalBypass.index(), 1.0);
        let before: Vec<f32> = tree.iter().map(|p| p.normalized()).collect();

        let text = serialize(&tree, &Preserved::default()).unwrap();

        let restored = build_tree().unwrap();
        deserialize(&restored, &text).unwrap();
        let after: Vec<f32> = restored.iter().map(|p| p.normalized()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn newer_schema_is_rejected_without_side_effects() {
        let tree = build_tree().unwrap();
        tree.set_normalized(Param::HereticMix.index(), 0.9);

        let text = r#"{ "schemaVersion": 99, "parameters": { "hereticMix": 0.1 } }"#;
        let err = deserialize(&tree, text).unwrap_err();
        assert!(matches!(err, PresetError::SchemaMismatch { found: 99, supported: SCHEMA_VERSION }));
        assert_eq!(tree.normalized(Param::HereticMix.index()), Some(0.9));
    }

    #[test]
    fn malformed_document_is_rejected() {
        let tree = build_tree().unwrap();
        assert!(matches!(deserialize(&tree, "{ not json"), Err(PresetError::Malformed(_))));
    }

    #[test]
    fn older_schema_fills_defaults() {
        let tree = build_tree().unwrap();
        tree.set_normalized(Param::DisfluxMix.index(), 0.0);

        let text = r#"{ "schemaVersion": 1, "parameters": { "hereticMix": 1.0 } }"#;
        deserialize(&tree, text).unwrap();

        assert_eq!(tree.normalized(Param::HereticMix.index()), Some(1.0));
        let disflux_mix = tree.get(Param::DisfluxMix.index()).unwrap();
        assert_eq!(disflux_mix.normalized(), disflux_mix.default_normalized());
    }

    #[test]
    fn version_two_documents_gain_the_shaping_controls() {
        let tree = build_tree().unwrap();
        tree.set_normalized(Param::OscDrive.index(), 0.8);
        tree.set_normalized(Param::DistortionCrush.index(), 0.0);

        let text = r#"{ "schemaVersion": 2, "parameters": { "oscGain": 0.5 } }"#;
        deserialize(&tree, text).unwrap();

        assert_eq!(tree.normalized(Param::OscGain.index()), Some(0.5));
        for param in [Param::OscDrive, Param::DistortionCrush, Param::EnvAttackSkew] {
            let parameter = tree.get(param.index()).unwrap();
            assert_eq!(parameter.normalized(), parameter.default_normalized(), "{param:?}");
        }
    }

    #[test]
    fn unknown_keys_survive_a_save() {
        let tree = build_tree().unwrap();
        let text = r#"{
            "schemaVersion": 2,
            "author": "someone",
            "parameters": { "hereticMix": 0.5, "futureKnob": 0.3 }
        }"#;
        let preserved = deserialize(&tree, text).unwrap();
        assert_eq!(preserved.extra.get("author"), Some(&Value::from("someone")));
        assert!(preserved.parameters.contains_key("futureKnob"));

        let saved = serialize(&tree, &preserved).unwrap();
        let document = PresetDocument::from_json(&saved).unwrap();
        assert_eq!(document.schema_version, SCHEMA_VERSION);
        assert!(document.parameters.contains_key("futureKnob"));
        assert_eq!(document.extra.get("author"), Some(&Value::from("someone")));
    }
}
