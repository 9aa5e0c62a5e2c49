use crate::options::RefOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Namespace the cursor starts in
    pub root_namespace: String,
    /// Joins namespace and record path in findings
    pub path_separator: String,
    /// Report producers nothing consumed
    pub report_orphan_producers: bool,
    /// Option names for records that do not specify any
    pub default_options: Option<Vec<String>>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root_namespace: "default".to_string(),
            path_separator: " > ".to_string(),
            report_orphan_producers: true,
            default_options: None,
        }
    }
}

impl RegistryConfig {
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Options applied to records that omit them
    pub fn default_options(&self) -> crate::Result<RefOptions> {
        match &self.default_options {
            Some(names) => RefOptions::from_names(names),
            None => Ok(RefOptions::default()),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("reflink.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<RegistryConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config = RegistryConfig::from_toml_str(&contents)?;
    // Surface bad option names at load time rather than at first record
    config.default_options()?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &RegistryConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
