//! Snapshot parser for loading and writing snapshot files.
//!
//! Snapshots are read from YAML or JSON documents. The format is chosen by
//! file extension, defaulting to YAML.

use crate::error::{ConfigError, GridconfError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::ClusterConfig;

/// Document format of a snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// YAML document.
    Yaml,
    /// JSON document.
    Json,
}

impl SnapshotFormat {
    /// Picks the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Parser for loading cluster snapshots.
#[derive(Debug, Default)]
pub struct SnapshotParser {
    /// Directory holding the `.env` file.
    base_path: Option<PathBuf>,
}

impl SnapshotParser {
    /// Creates a new snapshot parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the directory the `.env` file is loaded from.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Creates a parser whose `.env` lives next to `config_file`.
    #[must_use]
    pub fn for_config_file(config_file: &Path) -> Self {
        match config_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => Self::new().with_base_path(dir),
            None => Self::new(),
        }
    }

    /// Loads a snapshot from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ClusterConfig> {
        let path = path.as_ref().to_path_buf();
        info!("Loading snapshot from: {}", path.display());

        if !path.exists() {
            return Err(GridconfError::Config(ConfigError::FileNotFound { path }));
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            GridconfError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        match SnapshotFormat::from_path(&path) {
            SnapshotFormat::Json => Self::parse_json(&content, Some(&path)),
            SnapshotFormat::Yaml => Self::parse_yaml(&content, Some(&path)),
        }
    }

    /// Parses a snapshot from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(content: &str, source: Option<&Path>) -> Result<ClusterConfig> {
        debug!("Parsing YAML snapshot");

        let config: ClusterConfig = serde_yaml::from_str(content).map_err(|e| {
            GridconfError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })?;

        debug!("Parsed snapshot with {} entities", config.entity_count());
        Ok(config)
    }

    /// Parses a snapshot from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid.
    pub fn parse_json(content: &str, source: Option<&Path>) -> Result<ClusterConfig> {
        debug!("Parsing JSON snapshot");

        let config: ClusterConfig = serde_json::from_str(content).map_err(|e| {
            GridconfError::Config(ConfigError::ParseError {
                message: format!("JSON parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })?;

        debug!("Parsed snapshot with {} entities", config.entity_count());
        Ok(config)
    }

    /// Renders a snapshot in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be serialized.
    pub fn render(config: &ClusterConfig, format: SnapshotFormat) -> Result<String> {
        let rendered = match format {
            SnapshotFormat::Json => serde_json::to_string_pretty(config).map_err(|e| e.to_string()),
            SnapshotFormat::Yaml => serde_yaml::to_string(config).map_err(|e| e.to_string()),
        };

        rendered.map_err(|message| GridconfError::Config(ConfigError::SerializeError { message }))
    }

    /// Writes a snapshot to a file, picking the format from its extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be serialized or written.
    pub fn write_file(config: &ClusterConfig, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref().to_path_buf();
        let content = Self::render(config, SnapshotFormat::from_path(&path))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;

        info!("Wrote snapshot to: {}", path.display());
        Ok(path)
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                GridconfError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Default snapshot file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "gridconf.yaml",
    "gridconf.yml",
    "cluster.yaml",
    "cluster.json",
];

/// Finds the desired snapshot in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no snapshot file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found snapshot file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(GridconfError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_snapshot() {
        let yaml = r"
managers:
  - root
";
        let config = SnapshotParser::parse_yaml(yaml, None).expect("valid yaml");
        assert_eq!(config.managers, vec!["root"]);
        assert_eq!(config.entity_count(), 1);
    }

    #[test]
    fn test_parse_full_snapshot() {
        let yaml = r#"
global_config:
  execd_spool_dir: /var/spool/sge
  min_uid: 100
  load_sensor: []
user_set_lists:
  - name: staff
    type: ACL
    entries: [alice, bob]
projects:
  - name: physics
    fshare: 100
    acl: [staff]
complex_entries:
  - name: gpu
    shortcut: gpu
    type: RSMAP
    relop: "<="
    requestable: "YES"
    consumable: "YES"
    default: "0"
    urgency: 0
exec_hosts:
  - hostname: node1
    load_scaling:
      np_load_avg: 1.5
    complex_values:
      gpu: "4"
parallel_environments:
  - pe_name: mpi
    slots: 128
    allocation_rule: $round_robin
cluster_queues:
  - qname: gpu.q
    hostlist: ["@gpuhosts"]
    pe_list: [mpi]
    slots: ["4"]
"#;
        let config = SnapshotParser::parse_yaml(yaml, None).expect("valid yaml");

        assert_eq!(
            config.global_config.as_ref().map(|g| g.min_uid),
            Some(100)
        );
        assert_eq!(config.user_set_lists[0].entries.len(), 2);
        assert_eq!(config.complex_entries[0].value_type, "RSMAP");
        assert_eq!(config.exec_hosts[0].load_scaling.get("np_load_avg"), Some(&1.5));
        assert_eq!(config.parallel_environments[0].slots, 128);
        assert_eq!(config.cluster_queues[0].pe_list, vec!["mpi"]);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = SnapshotParser::parse_yaml("managers: {", None);
        assert!(matches!(
            result,
            Err(GridconfError::Config(ConfigError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_write_and_load_json() {
        let dir = TempDir::new().expect("temp dir");
        let config = ClusterConfig {
            operators: vec![String::from("ops")],
            ..ClusterConfig::default()
        };

        let target = dir.path().join("out/cluster.json");
        let written = SnapshotParser::write_file(&config, &target).expect("written");
        assert_eq!(written, target);

        let loaded = SnapshotParser::new().load_file(&target).expect("loaded");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_relative_path_with_directory() {
        let cwd = std::env::current_dir().expect("cwd");
        let dir = tempfile::Builder::new()
            .prefix(".gridconf-parser")
            .tempdir_in(&cwd)
            .expect("temp dir");
        std::fs::create_dir_all(dir.path().join("conf")).expect("mkdir");
        std::fs::write(dir.path().join("conf/cluster.yaml"), "managers: [root]\n").expect("write");
        std::fs::write(dir.path().join("conf/.env"), "GRIDCONF_PARSER_TEST=1\n").expect("write");

        let relative = dir
            .path()
            .strip_prefix(&cwd)
            .expect("inside cwd")
            .join("conf/cluster.yaml");
        assert!(relative.is_relative());

        let parser = SnapshotParser::for_config_file(&relative);
        parser.load_dotenv().expect("dotenv");
        let config = parser.load_file(&relative).expect("loaded");

        assert_eq!(config.managers, vec!["root"]);
        assert_eq!(std::env::var("GRIDCONF_PARSER_TEST").as_deref(), Ok("1"));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().expect("temp dir");
        let parser = SnapshotParser::new().with_base_path(dir.path());
        let result = parser.load_file(dir.path().join("absent.yaml"));
        assert!(matches!(
            result,
            Err(GridconfError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_find_config_file_in_parent() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join("cluster.yaml"), "managers: []\n").expect("write");
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).expect("mkdir");

        let found = find_config_file(&nested).expect("found");
        assert_eq!(found, dir.path().join("cluster.yaml"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(SnapshotFormat::from_path(Path::new("a.JSON")), SnapshotFormat::Json);
        assert_eq!(SnapshotFormat::from_path(Path::new("a.yml")), SnapshotFormat::Yaml);
        assert_eq!(SnapshotFormat::from_path(Path::new("noext")), SnapshotFormat::Yaml);
    }
}
