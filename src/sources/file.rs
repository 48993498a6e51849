//! File-based configuration source.

use super::MapSource;
use crate::error::{ConfigError, Result};
use crate::names::segments::{join, quoted_if_needed};
use config::{File, Source, Value, ValueKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-based configuration source.
///
/// Loads configuration from YAML, TOML, or JSON files with automatic format detection
/// based on file extension. Nested tables become dotted names, arrays become
/// indexed names and keys that contain dots are quoted:
///
/// ```yaml
/// server:
///   hosts: [a, b]        # server.hosts[0], server.hosts[1]
///   "web.api": 8080      # server."web.api"
/// ```
///
/// # Examples
///
/// ```rust,no_run
/// use overlay_config::sources::FileSource;
///
/// let source = FileSource::new("config/application.yaml").required(false);
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    ordinal: Option<i32>,
    required: bool,
}

impl FileSource {
    /// Create a new file source with automatic format detection.
    ///
    /// The format is detected from the file extension:
    /// - `.yaml`, `.yml` -> YAML
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ordinal: None,
            required: true,
        }
    }

    /// Set the ordinal for this source, ignoring any `config_ordinal` in the file.
    pub fn with_ordinal(mut self, ordinal: i32) -> Self {
        self.ordinal = Some(ordinal);
        self
    }

    /// Whether a missing file is an error. Optional files load as an empty source.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name the loaded source reports.
    pub fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }

    /// Validate that the file extension is supported.
    fn validate_extension(&self) -> Result<()> {
        let extension = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| ConfigError::load(self.name(), "unable to determine file format"))?;

        match extension {
            "yaml" | "yml" | "toml" | "json" => Ok(()),
            _ => Err(ConfigError::load(
                self.name(),
                format!(
                    "unsupported file extension: {}. Supported: .yaml, .yml, .toml, .json",
                    extension
                ),
            )),
        }
    }

    /// Read and flatten the file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LoadError`] if the extension is unsupported, the
    /// file is required but missing, or the contents cannot be parsed.
    pub fn load(&self) -> Result<MapSource> {
        self.validate_extension()?;

        let name = self.name();
        if !self.path.exists() {
            if self.required {
                return Err(ConfigError::load(name, "configuration file not found"));
            }
            debug!(source = %name, "optional configuration file absent");
            return Ok(MapSource::new(name, HashMap::<String, String>::new()));
        }

        let table = config::Config::builder()
            .add_source(File::from(self.path.clone()).required(true))
            .build()
            .and_then(|config| config.collect())
            .map_err(|e| ConfigError::load(&name, e))?;

        let mut properties = HashMap::new();
        for (key, value) in table {
            flatten(&quoted_if_needed(&key), value, &mut properties);
        }
        debug!(source = %name, properties = properties.len(), "loaded configuration file");

        let source = MapSource::new(name, properties);
        Ok(match self.ordinal {
            Some(ordinal) => source.with_ordinal(ordinal),
            None => source,
        })
    }
}

fn flatten(name: &str, value: Value, properties: &mut HashMap<String, String>) {
    let scalar = match value.kind {
        ValueKind::Table(table) => {
            for (key, child) in table {
                flatten(&join(name, &quoted_if_needed(&key)), child, properties);
            }
            return;
        }
        ValueKind::Array(items) if !items.is_empty() => {
            for (index, item) in items.into_iter().enumerate() {
                flatten(&format!("{}[{}]", name, index), item, properties);
            }
            return;
        }
        ValueKind::Array(_) | ValueKind::Nil => String::new(),
        ValueKind::String(s) => s,
        ValueKind::Boolean(b) => b.to_string(),
        ValueKind::I64(n) => n.to_string(),
        ValueKind::I128(n) => n.to_string(),
        ValueKind::U64(n) => n.to_string(),
        ValueKind::U128(n) => n.to_string(),
        ValueKind::Float(n) => n.to_string(),
    };
    properties.insert(name.to_string(), scalar);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::ConfigSource;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_extension() {
        for name in ["config.yaml", "config.yml", "config.toml", "config.json"] {
            assert!(FileSource::new(name).validate_extension().is_ok(), "{}", name);
        }
        assert!(FileSource::new("config.txt").validate_extension().is_err());
        assert!(FileSource::new("config").validate_extension().is_err());
    }

    #[test]
    fn test_load_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        fs::write(
            &config_path,
            r#"
server:
  port: 8080
  host: localhost
  hosts:
    - a
    - b
  "web.api": enabled
"#,
        )
        .unwrap();

        let source = FileSource::new(&config_path).load().unwrap();
        assert_eq!(source.get("server.port").as_deref(), Some("8080"));
        assert_eq!(source.get("server.host").as_deref(), Some("localhost"));
        assert_eq!(source.get("server.hosts[1]").as_deref(), Some("b"));
        assert_eq!(source.get("server.\"web.api\"").as_deref(), Some("enabled"));
    }

    #[test]
    fn test_ordinal_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "config_ordinal = 260\nname = \"x\"\n").unwrap();

        let source = FileSource::new(&config_path).load().unwrap();
        assert_eq!(source.ordinal(), 260);

        let source = FileSource::new(&config_path).with_ordinal(90).load().unwrap();
        assert_eq!(source.ordinal(), 90);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = FileSource::new("/nonexistent/config.yaml").load();
        assert!(matches!(result, Err(ConfigError::LoadError { .. })));
    }

    #[test]
    fn test_optional_missing_file_is_empty() {
        let source = FileSource::new("/nonexistent/config.yaml")
            .required(false)
            .load()
            .unwrap();
        assert!(source.is_empty());
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.json");
        fs::write(&config_path, "{ not json").unwrap();

        let result = FileSource::new(&config_path).load();
        assert!(matches!(result, Err(ConfigError::LoadError { .. })));
    }

    #[test]
    fn test_unreadable_file_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.yaml");
        fs::create_dir(&config_path).unwrap();

        match FileSource::new(&config_path).load() {
            Err(ConfigError::LoadError { source_name, .. }) => {
                assert!(source_name.contains("settings.yaml"));
            }
            other => panic!("expected a load error, got {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn test_name() {
        let source = FileSource::new("config.yaml");
        assert!(source.name().contains("config.yaml"));
    }
}
