//! Configuration management for imgcluster.
//!
//! Loads configuration from ${IMGCLUSTER_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// What intake does when a candidate's name is already staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep the staged entry and skip the newcomer (default)
    #[default]
    Reject,
    /// Swap the staged entry for the newcomer, keeping its batch position
    Replace,
}

impl DuplicatePolicy {
    /// Returns the config spelling of this policy.
    pub fn display_name(&self) -> &'static str {
        match self {
            DuplicatePolicy::Reject => "reject",
            DuplicatePolicy::Replace => "replace",
        }
    }
}

/// Constraints applied to every intake pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakePolicy {
    /// Maximum number of entries in a batch
    pub max_files: usize,
    /// Longest allowed edge, in pixels
    pub max_dimension: u32,
    /// Byte size above which an image is re-encoded
    pub max_size: u64,
    /// Re-encode quality in `0.0..=1.0`
    pub resize_quality: f64,
    /// Handling of repeated file names
    pub duplicate_names: DuplicatePolicy,
}

impl IntakePolicy {
    pub const DEFAULT_MAX_FILES: usize = 24;
    pub const DEFAULT_MAX_DIMENSION: u32 = 600;
    pub const DEFAULT_MAX_SIZE: u64 = 1024 * 1024;
    pub const DEFAULT_RESIZE_QUALITY: f64 = 0.8;

    /// Rejects values the pipeline cannot honor.
    ///
    /// # Errors
    /// Returns an error naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.max_files == 0 {
            anyhow::bail!("intake.max_files must be at least 1");
        }
        if self.max_dimension == 0 {
            anyhow::bail!("intake.max_dimension must be at least 1");
        }
        if self.max_size == 0 {
            anyhow::bail!("intake.max_size must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.resize_quality) {
            anyhow::bail!(
                "intake.resize_quality must be between 0.0 and 1.0 (got {})",
                self.resize_quality
            );
        }
        Ok(())
    }
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            max_files: Self::DEFAULT_MAX_FILES,
            max_dimension: Self::DEFAULT_MAX_DIMENSION,
            max_size: Self::DEFAULT_MAX_SIZE,
            resize_quality: Self::DEFAULT_RESIZE_QUALITY,
            duplicate_names: DuplicatePolicy::default(),
        }
    }
}

/// Clustering service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Endpoint receiving the multipart upload
    pub endpoint: String,
    /// Multipart field name for each image
    pub field_name: String,
    /// Timeout for the whole request in seconds (0 disables)
    pub request_timeout_secs: u32,
}

impl ServiceConfig {
    pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/cluster-images";
    pub const DEFAULT_FIELD_NAME: &str = "files";

    /// Returns the endpoint to use, preferring `IMGCLUSTER_ENDPOINT`.
    pub fn effective_endpoint(&self) -> String {
        std::env::var("IMGCLUSTER_ENDPOINT")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.endpoint.clone())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.request_timeout_secs)))
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            field_name: Self::DEFAULT_FIELD_NAME.to_string(),
            request_timeout_secs: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Optional log file, written in addition to stderr.
    pub file: Option<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Intake constraints
    pub intake: IntakePolicy,

    /// Clustering service settings
    pub service: ServiceConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// New comments/sections from the template stay present while the user's
/// values win.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;

    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    merge_items(doc.as_table_mut(), user_doc.as_table());

    Ok(doc.to_string())
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source.iter() {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

/// Parses a CLI-provided value as TOML, falling back to a plain string.
fn parse_value(raw: &str) -> toml_edit::Value {
    raw.trim()
        .parse::<toml_edit::Value>()
        .unwrap_or_else(|_| toml_edit::Value::from(raw.trim()))
}

pub mod paths {
    //! Path resolution for imgcluster configuration.
    //!
    //! IMGCLUSTER_HOME resolution order:
    //! 1. IMGCLUSTER_HOME environment variable (if set)
    //! 2. ~/.config/imgcluster (default)
    //! 3. ./.imgcluster when no home directory is known

    use std::path::PathBuf;

    /// Returns the imgcluster home directory.
    pub fn imgcluster_home() -> PathBuf {
        if let Ok(home) = std::env::var("IMGCLUSTER_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".imgcluster"),
            |h| h.join(".config").join("imgcluster"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        imgcluster_home().join("config.toml")
    }
}

impl Config {
    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Fails when the file exists but cannot be read, parsed or validated.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Fails when the file exists but cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?
        } else {
            Config::default()
        };

        config
            .intake
            .validate()
            .with_context(|| format!("Invalid config at {}", path.display()))?;
        Ok(config)
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Sets one dotted key (e.g. `intake.max_files`) in the config file at `path`.
    ///
    /// Creates the file from the template if missing, otherwise merges the
    /// user's values into the latest template so comments survive. The result
    /// is validated before anything is written.
    ///
    /// # Errors
    /// Fails on an unknown key shape, an invalid value, or I/O errors.
    pub fn set_value_to(path: &Path, key: &str, raw_value: &str) -> Result<()> {
        use toml_edit::{DocumentMut, Item};

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        let Some((section, field)) = key.split_once('.') else {
            anyhow::bail!("Config key must look like <section>.<field> (got '{key}')");
        };
        let Some(table) = doc.get_mut(section).and_then(Item::as_table_mut) else {
            anyhow::bail!("Unknown config section '{section}'");
        };
        table[field] = Item::Value(parse_value(raw_value));

        let rendered = doc.to_string();
        let parsed: Config = toml::from_str(&rendered)
            .with_context(|| format!("Invalid value for {key}: {raw_value}"))?;
        parsed.intake.validate()?;

        Self::write_config(path, &rendered)
    }

    /// Renders the effective configuration as TOML.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize config to TOML")
    }

    fn write_config(path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}
