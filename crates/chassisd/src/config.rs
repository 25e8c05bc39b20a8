//! Daemon configuration and chassis config loading.

use anyhow::{bail, Context, Result};
use chassis_device::sim::MAX_SIM_PORTS;
use chassis_types::ChassisConfig;
use std::fmt;
use std::path::{Path, PathBuf};

/// Settings the daemon runs with, normally built from the command line.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Path of the chassis config to push at startup.
    pub chassis_config: PathBuf,
    /// Verify the chassis config and exit without touching the device.
    pub verify_only: bool,
    /// Front-panel ports per unit exposed by the simulated device.
    pub sim_port_count: u32,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            chassis_config: PathBuf::from("/etc/chassisd/chassis_config.yaml"),
            verify_only: false,
            sim_port_count: MAX_SIM_PORTS,
        }
    }
}

/// On-disk encodings accepted for chassis configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            _ => bail!(
                "cannot tell the format of {}: expected a .yaml, .yml or .json file",
                path.display()
            ),
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigFormat::Yaml => write!(f, "YAML"),
            ConfigFormat::Json => write!(f, "JSON"),
        }
    }
}

pub fn parse_chassis_config(contents: &str, format: ConfigFormat) -> Result<ChassisConfig> {
    let config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
        ConfigFormat::Json => serde_json::from_str(contents)?,
    };
    Ok(config)
}

/// Reads and parses a chassis config file.
pub fn load_chassis_config(path: &Path) -> Result<ChassisConfig> {
    let format = ConfigFormat::from_path(path)?;
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read chassis config {}", path.display()))?;
    parse_chassis_config(&contents, format)
        .with_context(|| format!("failed to parse {} chassis config {}", format, path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chassis_types::{AdminState, Platform};
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const YAML: &str = r#"
chassis:
  platform: p4_soft_switch
  name: lab
nodes:
  - id: 1
    slot: 1
singleton_ports:
  - id: 1
    slot: 1
    port: 1
    node: 1
    speed_bps: 10000000000
    config_params:
      admin_state: up
"#;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/b.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("b.JSON")).unwrap(),
            ConfigFormat::Json
        );
        assert!(ConfigFormat::from_path(Path::new("b.toml")).is_err());
        assert!(ConfigFormat::from_path(Path::new("chassis")).is_err());
    }

    #[test]
    fn test_load_yaml() {
        let file = write_temp(".yaml", YAML);
        let config = load_chassis_config(file.path()).unwrap();
        assert_eq!(config.platform(), Platform::P4SoftSwitch);
        assert_eq!(
            config.singleton_ports[0].config_params.admin_state,
            AdminState::Enabled
        );
    }

    #[test]
    fn test_load_json() {
        let file = write_temp(
            ".json",
            r#"{"nodes": [{"id": 3, "slot": 1}], "singleton_ports": []}"#,
        );
        let config = load_chassis_config(file.path()).unwrap();
        assert_eq!(config.nodes.len(), 1);
        assert_eq!(config.nodes[0].id, 3);
    }

    #[test]
    fn test_load_reports_path_on_error() {
        let file = write_temp(".json", "{ not json");
        let err = load_chassis_config(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to parse JSON chassis config"));

        let err = load_chassis_config(Path::new("/nonexistent/chassis.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read chassis config"));
    }
}
