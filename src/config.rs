use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub oracle: OracleSettings,
    #[serde(default)]
    pub dispatch: DispatchSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }

/// Gemini oracle settings
#[derive(Debug, Clone, Deserialize)]
pub struct OracleSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_oracle_timeout")]
    pub timeout_secs: u64,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_oracle_timeout(),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

fn default_model() -> String { "gemini-1.5-flash".to_string() }
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}
fn default_oracle_timeout() -> u64 { 30 }

/// MATS ambulance dispatch settings
///
/// When `endpoint` is unset the dispatch client logs notices instead of
/// posting them, which keeps level-1 escalations visible in development.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSettings {
    pub endpoint: Option<String>,
    #[serde(default = "default_dispatch_timeout")]
    pub timeout_secs: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_dispatch_timeout(),
        }
    }
}

fn default_dispatch_timeout() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with TRIAGE_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with TRIAGE_)
            // e.g., TRIAGE_SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("TRIAGE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        // Apply well-known environment overrides (GEMINI_API_KEY et al.)
        settings = apply_env_overrides(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("TRIAGE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Whether Gemini credentials are present in the loaded configuration
    pub fn oracle_configured(&self) -> bool {
        !self.oracle.api_key.trim().is_empty()
    }
}

/// Apply convenience environment overrides
///
/// `GEMINI_API_KEY` is the name operators already export for the Gemini SDK,
/// so it is honored ahead of the generic `TRIAGE_ORACLE__API_KEY` form. The
/// same applies to `MATS_DISPATCH_URL` for the ambulance sink.
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let api_key = env::var("GEMINI_API_KEY")
        .or_else(|_| env::var("TRIAGE_ORACLE__API_KEY"))
        .ok();

    let dispatch_endpoint = env::var("MATS_DISPATCH_URL").ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(api_key) = api_key {
        builder = builder.set_override("oracle.api_key", api_key)?;
    }
    if let Some(endpoint) = dispatch_endpoint {
        builder = builder.set_override("dispatch.endpoint", endpoint)?;
    }

    builder.build()
}
