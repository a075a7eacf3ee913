//! CLI configuration management
//!
//! Handles loading and saving the persisted defaults, and layering them
//! under environment variables and command-line flags.

use anyhow::{Context, Result};
use gandi_core::GandiError;
use gandi_rpc::DEFAULT_ENDPOINT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::probe::ProbeSettings;

/// Stored answers for `server create`, used when the matching flag is absent
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CreateDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores: Option<i64>,
    /// Memory in MB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,
    /// Bandwidth in MB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_command: Option<String>,
}

/// SSH readiness probe settings, in seconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SshConfig {
    pub port: u16,
    pub connect_timeout: u64,
    pub banner_timeout: u64,
    pub refused_backoff: u64,
    /// Pause between the first successful probe and the bootstrap
    pub settle_delay: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            port: 22,
            connect_timeout: 5,
            banner_timeout: 5,
            refused_backoff: 2,
            settle_delay: 10,
        }
    }
}

impl SshConfig {
    /// Probe settings derived from this section
    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            port: self.port,
            connect_timeout: Duration::from_secs(self.connect_timeout),
            banner_timeout: Duration::from_secs(self.banner_timeout),
            refused_backoff: Duration::from_secs(self.refused_backoff),
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay)
    }
}

/// CLI configuration; keys missing from the file take their defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CliConfig {
    /// Provider API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// XML-RPC endpoint URL
    pub endpoint: String,

    /// Default output format
    pub output_format: String,

    /// Enable verbose logging by default
    pub verbose: bool,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Seconds between two operation status checks
    pub poll_interval: u64,

    pub create: CreateDefaults,

    pub ssh: SshConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            output_format: "table".to_string(),
            verbose: false,
            timeout: 30,
            poll_interval: 2,
            create: CreateDefaults::default(),
            ssh: SshConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from `path`, or defaults if the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read CLI config file {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse CLI config file {}", path.display()))
    }

    /// Save configuration to `path`.
    ///
    /// The file holds the API key, so on Unix it is only readable by its owner.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize CLI config")?;

        std::fs::write(path, content).context("Failed to write CLI config file")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to restrict CLI config file permissions")?;
        }

        Ok(())
    }

    /// The API key, or [`GandiError::MissingCredential`]
    pub fn require_api_key(&self) -> std::result::Result<&str, GandiError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(GandiError::MissingCredential)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Set a single value by key, as used by `config set`
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        fn number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
            value
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid value for {}. Must be a number", key))
        }

        match key {
            "api_key" => self.api_key = Some(value.to_string()),
            "endpoint" => {
                ConfigBuilder::validate_url(value)?;
                self.endpoint = value.to_string();
            }
            "output_format" => {
                ConfigBuilder::validate_output_format(value)?;
                self.output_format = value.to_string();
            }
            "verbose" => self.verbose = value.to_lowercase() == "true" || value == "1",
            "timeout" => {
                let timeout = number(key, value)?;
                ConfigBuilder::validate_timeout(timeout)?;
                self.timeout = timeout;
            }
            "poll_interval" => self.poll_interval = number(key, value)?,
            "create.datacenter_id" => self.create.datacenter_id = Some(number(key, value)?),
            "create.image_id" => self.create.image_id = Some(number(key, value)?),
            "create.cores" => self.create.cores = Some(number(key, value)?),
            "create.memory" => self.create.memory = Some(number(key, value)?),
            "create.bandwidth" => self.create.bandwidth = Some(number(key, value)?),
            "create.ip_version" => self.create.ip_version = Some(number(key, value)?),
            "create.login" => self.create.login = Some(value.to_string()),
            "create.distro" => self.create.distro = Some(value.to_string()),
            "create.bootstrap_version" => self.create.bootstrap_version = Some(value.to_string()),
            "create.template_file" => self.create.template_file = Some(value.to_string()),
            "create.identity_file" => self.create.identity_file = Some(value.to_string()),
            "create.environment" => self.create.environment = Some(value.to_string()),
            "create.bootstrap_command" => self.create.bootstrap_command = Some(value.to_string()),
            "ssh.port" => self.ssh.port = number(key, value)?,
            "ssh.connect_timeout" => self.ssh.connect_timeout = number(key, value)?,
            "ssh.banner_timeout" => self.ssh.banner_timeout = number(key, value)?,
            "ssh.refused_backoff" => self.ssh.refused_backoff = number(key, value)?,
            "ssh.settle_delay" => self.ssh.settle_delay = number(key, value)?,
            _ => return Err(anyhow::anyhow!("Unknown config key: {}", key)),
        }
        Ok(())
    }

    /// Create a new builder for constructing configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for CLI configuration with validation and priority chain support
///
/// Priority chain (lowest to highest):
/// 1. Defaults
/// 2. Config file
/// 3. Environment variables
/// 4. CLI arguments
///
/// Sources only fill values that are still unset, except CLI arguments,
/// which always overwrite. Apply environment before the file.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    api_key: Option<String>,
    endpoint: Option<String>,
    output_format: Option<String>,
    verbose: Option<bool>,
    timeout: Option<u64>,
    poll_interval: Option<u64>,
    create: Option<CreateDefaults>,
    ssh: Option<SshConfig>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(anyhow::anyhow!("API key cannot be empty"));
        }
        self.api_key = Some(key);
        Ok(self)
    }

    /// Set endpoint URL (with validation)
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        Self::validate_url(&url)?;
        self.endpoint = Some(url);
        Ok(self)
    }

    /// Set output format (with validation)
    pub fn with_output_format(mut self, format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        Self::validate_output_format(&format)?;
        self.output_format = Some(format);
        Ok(self)
    }

    /// Set verbose flag
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Set timeout (with validation)
    pub fn with_timeout(mut self, timeout: u64) -> Result<Self> {
        Self::validate_timeout(timeout)?;
        self.timeout = Some(timeout);
        Ok(self)
    }

    /// Load configuration from file, filling values not set yet
    pub fn with_config_file(self, path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(self);
        };

        let config = CliConfig::load_from(path)?;
        Ok(Self {
            api_key: self.api_key.or(config.api_key),
            endpoint: self.endpoint.or(Some(config.endpoint)),
            output_format: self.output_format.or(Some(config.output_format)),
            verbose: self.verbose.or(Some(config.verbose)),
            timeout: self.timeout.or(Some(config.timeout)),
            poll_interval: self.poll_interval.or(Some(config.poll_interval)),
            create: self.create.or(Some(config.create)),
            ssh: self.ssh.or(Some(config.ssh)),
        })
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(mut self) -> Self {
        // Only apply env vars if values weren't already set (preserving priority)
        if self.api_key.is_none() {
            if let Ok(key) = std::env::var("GANDI_API_KEY") {
                if !key.trim().is_empty() {
                    self.api_key = Some(key);
                }
            }
        }

        if self.endpoint.is_none() {
            if let Ok(url) = std::env::var("GANDI_ENDPOINT") {
                // Validate before applying
                if Self::validate_url(&url).is_ok() {
                    self.endpoint = Some(url);
                }
            }
        }

        if self.output_format.is_none() {
            if let Ok(format) = std::env::var("GANDI_FORMAT") {
                if Self::validate_output_format(&format).is_ok() {
                    self.output_format = Some(format);
                }
            }
        }

        if self.verbose.is_none() {
            if let Ok(verbose) = std::env::var("GANDI_VERBOSE") {
                self.verbose = Some(verbose.to_lowercase() == "true" || verbose == "1");
            }
        }

        if self.timeout.is_none() {
            if let Ok(timeout) = std::env::var("GANDI_TIMEOUT") {
                if let Ok(timeout) = timeout.parse() {
                    if Self::validate_timeout(timeout).is_ok() {
                        self.timeout = Some(timeout);
                    }
                }
            }
        }

        self
    }

    /// Build the final configuration with validation
    pub fn build(self) -> Result<CliConfig> {
        let defaults = CliConfig::default();

        let endpoint = self.endpoint.unwrap_or(defaults.endpoint);
        let output_format = self.output_format.unwrap_or(defaults.output_format);
        let timeout = self.timeout.unwrap_or(defaults.timeout);

        // Validate final values
        Self::validate_url(&endpoint)?;
        Self::validate_output_format(&output_format)?;
        Self::validate_timeout(timeout)?;

        Ok(CliConfig {
            api_key: self.api_key,
            endpoint,
            output_format,
            verbose: self.verbose.unwrap_or(defaults.verbose),
            timeout,
            poll_interval: self.poll_interval.unwrap_or(defaults.poll_interval),
            create: self.create.unwrap_or(defaults.create),
            ssh: self.ssh.unwrap_or(defaults.ssh),
        })
    }

    /// Validate URL format
    fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(anyhow::anyhow!("Endpoint URL cannot be empty"));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "Endpoint URL must start with http:// or https://"
            ));
        }

        Ok(())
    }

    /// Validate output format
    fn validate_output_format(format: &str) -> Result<()> {
        match format {
            "table" | "json" => Ok(()),
            _ => Err(anyhow::anyhow!(
                "Invalid output format '{}'. Must be 'table' or 'json'",
                format
            )),
        }
    }

    /// Validate timeout value
    fn validate_timeout(timeout: u64) -> Result<()> {
        if timeout == 0 {
            return Err(anyhow::anyhow!("Timeout must be greater than 0"));
        }

        if timeout > 300 {
            return Err(anyhow::anyhow!(
                "Timeout must be less than or equal to 300 seconds"
            ));
        }

        Ok(())
    }
}

/// Config file path: explicit path, else the default location
pub fn resolve_config_path(explicit: Option<&str>) -> PathBuf {
    explicit
        .map(PathBuf::from)
        .unwrap_or_else(gandi_core::default_config_path)
}
