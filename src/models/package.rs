use serde::{Deserialize, Serialize};

/// Manifest metadata for the root package or a bundled one.
///
/// Fields this crate does not interpret are kept in `extra` so that the JSON
/// output mirrors the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Package directory relative to the published root (`.` for the root).
    #[serde(default = "root_path")]
    pub path: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn root_path() -> String {
    crate::rel_path::ROOT.to_string()
}

impl Package {
    pub fn named(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            description: None,
            path: path.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Builds the record from a parsed `package.json`. A manifest without a
    /// `name` falls back to `fallback_name`.
    pub fn from_manifest(
        manifest: &serde_json::Value,
        fallback_name: &str,
        path: impl Into<String>,
    ) -> Self {
        let mut extra = serde_json::Map::new();
        if let Some(object) = manifest.as_object() {
            for (key, value) in object {
                if matches!(key.as_str(), "name" | "version" | "description" | "path") {
                    continue;
                }
                extra.insert(key.clone(), value.clone());
            }
        }

        Self {
            name: manifest
                .get("name")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback_name)
                .to_string(),
            version: manifest
                .get("version")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            description: manifest
                .get("description")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            path: path.into(),
            extra,
        }
    }
}
