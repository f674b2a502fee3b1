//! Format-agnostic configuration loading

use crate::{Error, NormalizedPath, Result, io};
use serde::de::DeserializeOwned;

/// Format-agnostic configuration store.
///
/// Detects the format from the file extension and deserializes
/// transparently.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a file.
    ///
    /// Format is detected from file extension:
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    /// - `.yaml`, `.yml` -> YAML
    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let extension = path.extension().unwrap_or("").to_lowercase();
        let content = io::read_text(path)?;
        tracing::debug!(path = %path, format = %extension, "Loading configuration");

        match extension.as_str() {
            "toml" => toml::from_str(&content).map_err(|e| Error::ConfigParse {
                path: path.to_native(),
                format: "TOML".into(),
                message: e.to_string(),
            }),
            "json" => serde_json::from_str(&content).map_err(|e| Error::ConfigParse {
                path: path.to_native(),
                format: "JSON".into(),
                message: e.to_string(),
            }),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| Error::ConfigParse {
                path: path.to_native(),
                format: "YAML".into(),
                message: e.to_string(),
            }),
            _ => Err(Error::UnsupportedFormat { extension }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        #[serde(default)]
        enabled: bool,
    }

    #[test]
    fn loads_each_supported_format() {
        let temp = TempDir::new().unwrap();
        let cases = [
            ("a.toml", "name = \"x\"\nenabled = true\n"),
            ("a.json", r#"{"name": "x", "enabled": true}"#),
            ("a.yml", "name: x\nenabled: true\n"),
        ];
        for (file, body) in cases {
            let path = temp.path().join(file);
            std::fs::write(&path, body).unwrap();
            let loaded: Sample = ConfigStore::new().load(&NormalizedPath::new(&path)).unwrap();
            assert_eq!(
                loaded,
                Sample {
                    name: "x".into(),
                    enabled: true
                }
            );
        }
    }

    #[test]
    fn rejects_unknown_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.ini");
        std::fs::write(&path, "name=x").unwrap();
        let err = ConfigStore::new()
            .load::<Sample>(&NormalizedPath::new(&path))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
    }

    #[test]
    fn reports_parse_errors_with_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.toml");
        std::fs::write(&path, "name = ").unwrap();
        let err = ConfigStore::new()
            .load::<Sample>(&NormalizedPath::new(&path))
            .unwrap_err();
        assert!(err.to_string().contains("TOML"));
    }
}
