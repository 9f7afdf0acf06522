//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub poller: PollerConfig,

    #[serde(default)]
    pub chart: ChartConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream collection endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub base_url: String,

    #[serde(default = "default_collection_path")]
    pub collection_path: String,

    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default = "default_sort_field")]
    pub sort_field: String,

    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_upstream_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_collection_path() -> String {
    "/service/mongo/localhost/local/test".to_string()
}

fn default_limit() -> usize {
    100
}

fn default_sort_field() -> String {
    "timestamp".to_string()
}

fn default_required_fields() -> Vec<String> {
    vec!["word".to_string(), "vowels.fraction".to_string()]
}

fn default_request_timeout() -> u64 {
    4000
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_url(),
            collection_path: default_collection_path(),
            limit: default_limit(),
            sort_field: default_sort_field(),
            required_fields: default_required_fields(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

/// What to do when a tick fires while a fetch is still outstanding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Skip the tick
    #[default]
    Skip,
    /// Cancel the outstanding fetch and start a new one
    Replace,
    /// Let fetches overlap; the last to complete wins
    Allow,
}

/// Refresh loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,

    #[serde(default)]
    pub overlap: OverlapPolicy,
}

fn default_poll_interval() -> u64 {
    5000 // 5 seconds
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            overlap: OverlapPolicy::default(),
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

/// Chart geometry and mark styling
#[derive(Debug, Clone, Deserialize)]
pub struct ChartConfig {
    /// Horizontal distance between consecutive records
    #[serde(default = "default_width_unit")]
    pub width_unit: f64,

    /// Canvas width is `initial_length - 1`, baseline length `width_unit * initial_length`
    #[serde(default = "default_initial_length")]
    pub initial_length: u32,

    #[serde(default = "default_height")]
    pub height: f64,

    #[serde(default = "default_radius")]
    pub radius: f64,

    #[serde(default = "default_fill")]
    pub fill: String,

    #[serde(default = "default_stroke")]
    pub stroke: String,

    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,

    #[serde(default = "default_transition")]
    pub transition_ms: u64,

    /// Fill marks from the vowel-fraction color scale instead of `fill`
    #[serde(default)]
    pub color_marks: bool,
}

fn default_width_unit() -> f64 {
    10.0
}

fn default_initial_length() -> u32 {
    1000
}

fn default_height() -> f64 {
    80.0
}

fn default_radius() -> f64 {
    3.0
}

fn default_fill() -> String {
    "green".to_string()
}

fn default_stroke() -> String {
    "white".to_string()
}

fn default_stroke_width() -> f64 {
    1.0
}

fn default_transition() -> u64 {
    1000
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width_unit: default_width_unit(),
            initial_length: default_initial_length(),
            height: default_height(),
            radius: default_radius(),
            fill: default_fill(),
            stroke: default_stroke(),
            stroke_width: default_stroke_width(),
            transition_ms: default_transition(),
            color_marks: false,
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Demo word source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_host")]
    pub host: String,

    #[serde(default = "default_source_port")]
    pub port: u16,

    #[serde(default = "default_words_file")]
    pub words_file: PathBuf,

    /// Upper bound of the random pause between inserted words
    #[serde(default = "default_max_pause")]
    pub max_pause_ms: u64,

    #[serde(default = "default_max_documents")]
    pub max_documents: usize,
}

fn default_source_host() -> String {
    "127.0.0.1".to_string()
}

fn default_source_port() -> u16 {
    8080
}

fn default_words_file() -> PathBuf {
    PathBuf::from("/usr/share/dict/words")
}

fn default_max_pause() -> u64 {
    1000
}

fn default_max_documents() -> usize {
    10_000
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            host: default_source_host(),
            port: default_source_port(),
            words_file: default_words_file(),
            max_pause_ms: default_max_pause(),
            max_documents: default_max_documents(),
        }
    }
}

impl SourceConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// A loaded configuration and where it came from
///
/// Loading runs before the subscriber exists, so the outcome is logged
/// afterwards with [`Resolved::log`].
#[derive(Debug)]
pub struct Resolved {
    pub config: Config,
    /// File the config was read from; `None` means defaults plus environment
    pub origin: Option<PathBuf>,
    /// Candidate files that existed but failed to load
    pub skipped: Vec<ConfigError>,
}

impl Resolved {
    pub fn log(&self) {
        for error in &self.skipped {
            tracing::warn!("Skipped config file: {}", error);
        }
        match &self.origin {
            Some(path) => tracing::info!("Loaded config from {:?}", path),
            None => tracing::info!("Using default config with environment overrides"),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Resolved {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("vowelscope").join("config.toml")),
            Some(PathBuf::from("/etc/vowelscope/config.toml")),
            Some(PathBuf::from("./vowelscope.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_first(&config_paths)
    }

    /// Load the first readable file among `paths`, falling back to defaults
    pub fn load_first(paths: &[PathBuf]) -> Resolved {
        let mut skipped = Vec::new();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_with_env(path) {
                Ok(config) => {
                    return Resolved {
                        config,
                        origin: Some(path.clone()),
                        skipped,
                    }
                }
                Err(e) => skipped.push(e),
            }
        }

        Resolved {
            config: Self::from_env(),
            origin: None,
            skipped,
        }
    }

    /// Load an explicit file if given, otherwise search the default locations
    pub fn resolve(path: Option<&Path>) -> Result<Resolved, ConfigError> {
        match path {
            Some(path) => Ok(Resolved {
                config: Self::load_with_env(path)?,
                origin: Some(path.to_path_buf()),
                skipped: Vec::new(),
            }),
            None => Ok(Self::load_default()),
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("VOWELSCOPE_UPSTREAM_URL") {
            self.upstream.base_url = url;
        }

        if let Ok(host) = std::env::var("VOWELSCOPE_API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = std::env::var("VOWELSCOPE_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        if let Ok(interval) = std::env::var("VOWELSCOPE_POLL_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                self.poller.interval_ms = ms;
            }
        }

        if let Ok(level) = std::env::var("VOWELSCOPE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("VOWELSCOPE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Vowelscope Configuration
#
# Environment variables override these settings:
# - VOWELSCOPE_UPSTREAM_URL
# - VOWELSCOPE_API_HOST
# - VOWELSCOPE_API_PORT
# - VOWELSCOPE_POLL_INTERVAL_MS
# - VOWELSCOPE_LOG_LEVEL
# - VOWELSCOPE_LOG_FORMAT

[upstream]
# Base URL of the document service
base_url = "http://localhost:8080"

# Collection query path
collection_path = "/service/mongo/localhost/local/test"

# Maximum number of records per fetch
limit = 100

# Newest first by this field
sort_field = "timestamp"

# Records must carry all of these fields
required_fields = ["word", "vowels.fraction"]

# Request timeout (ms)
request_timeout_ms = 4000

[poller]
# Refresh interval (ms)
interval_ms = 5000

# Outstanding fetch on tick: skip, replace or allow
overlap = "skip"

[chart]
width_unit = 10.0
initial_length = 1000
height = 80.0
radius = 3.0
fill = "green"
stroke = "white"
stroke_width = 1.0

# Enter/update/exit transition duration (ms)
transition_ms = 1000

# Fill marks by vowel fraction (darkred - lightgray - steelblue)
color_marks = false

[api]
host = "0.0.0.0"
port = 8090

[source]
# Demo word source (vowelscope-cli source)
host = "127.0.0.1"
port = 8080
words_file = "/usr/share/dict/words"
max_pause_ms = 1000
max_documents = 10000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
