use std::collections::{BTreeMap, HashMap};

use eventhub_types::EventData;
use serde_json::{json, Map, Value};

/// A snapshot of one registered extension, as published in the hub's own
/// shared state under `com.adobe.module.eventhub` (§4.5.4).
#[derive(Clone, Debug, PartialEq)]
pub struct ExtensionInfo {
    pub version: String,
    pub friendly_name: String,
    pub metadata: Option<HashMap<String, String>>,
}

/// Builds the `EventData` payload for the hub's shared state (§4.5.4):
///
/// ```json
/// { "version": "<hub version>", "extensions": { "<friendlyName>": { "version": "...", "metadata": {...}? }, ... } }
/// ```
///
/// `extensions` is keyed by friendly name and sorted for deterministic
/// output, since it feeds a shared-state SET whose JSON a consumer may
/// snapshot-compare. `metadata` is omitted entirely when an extension
/// published none, rather than written out as `null`.
pub fn build_hub_state(hub_version: &str, extensions: &BTreeMap<String, ExtensionInfo>) -> EventData {
    let mut out = Map::new();
    out.insert("version".to_string(), Value::String(hub_version.to_string()));

    let mut ext_map = Map::new();
    for (name, info) in extensions {
        let mut entry = Map::new();
        entry.insert("version".to_string(), Value::String(info.version.clone()));
        entry.insert("friendlyName".to_string(), Value::String(info.friendly_name.clone()));
        if let Some(metadata) = &info.metadata {
            entry.insert("metadata".to_string(), json!(metadata));
        }
        ext_map.insert(name.clone(), Value::Object(entry));
    }
    out.insert("extensions".to_string(), Value::Object(ext_map));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_hub_state_lists_registered_extensions_by_friendly_name() {
        let mut extensions = BTreeMap::new();
        extensions.insert(
            "analytics".to_string(),
            ExtensionInfo {
                version: "1.2.0".to_string(),
                friendly_name: "Analytics".to_string(),
                metadata: Some(HashMap::from([("region".to_string(), "na".to_string())])),
            },
        );

        let state = build_hub_state("3.0.0", &extensions);
        assert_eq!(state.get("version").and_then(Value::as_str), Some("3.0.0"));
        let ext = state
            .get("extensions")
            .and_then(Value::as_object)
            .and_then(|m| m.get("analytics"))
            .and_then(Value::as_object)
            .expect("analytics entry present");
        assert_eq!(ext.get("version").and_then(Value::as_str), Some("1.2.0"));
        assert_eq!(
            ext.get("metadata").and_then(Value::as_object).and_then(|m| m.get("region")).and_then(Value::as_str),
            Some("na")
        );
    }

    #[test]
    fn build_hub_state_omits_metadata_key_when_extension_publishes_none() {
        let mut extensions = BTreeMap::new();
        extensions.insert(
            "analytics".to_string(),
            ExtensionInfo {
                version: "1.2.0".to_string(),
                friendly_name: "Analytics".to_string(),
                metadata: None,
            },
        );

        let state = build_hub_state("3.0.0", &extensions);
        let ext = state
            .get("extensions")
            .and_then(Value::as_object)
            .and_then(|m| m.get("analytics"))
            .and_then(Value::as_object)
            .expect("analytics entry present");
        assert!(!ext.contains_key("metadata"));
    }

    #[test]
    fn build_hub_state_with_no_extensions_is_an_empty_map() {
        let state = build_hub_state("1.0.0", &BTreeMap::new());
        assert_eq!(state.get("extensions"), Some(&Value::Object(Map::new())));
    }
}
