//! Configuration loading
//!
//! Settings come from an optional TOML file overlaid with environment
//! variables such as `LEAFNODE_PROVIDERS__TMDB_API_KEY`.

use ::config::{Environment, File, FileFormat};
use anyhow::{Context, Result, bail};
use leafnode_core::TtlCacheConfig;
use leafnode_jobs::{JobKind, JobSettings, JobTuning, ProviderSetConfig};
use leafnode_providers::{
    GoogleBooksConfig, HttpConfig, OmdbConfig, OpenLibraryConfig, TmdbConfig, YouTubeConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const ENV_PREFIX: &str = "LEAFNODE";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub fanout: FanOutConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_auth_enabled")]
    pub enabled: bool,
    #[serde(default = "default_token_expiry_hours")]
    pub token_expiry_hours: i64,
    /// Shared secret for job-to-job calls; empty disables them
    #[serde(default)]
    pub internal_secret: String,
    /// Password for the admin user created on first start
    #[serde(default)]
    pub admin_password: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            enabled: default_auth_enabled(),
            token_expiry_hours: default_token_expiry_hours(),
            internal_secret: String::new(),
            admin_password: None,
        }
    }
}

/// External provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub google_books_api_key: Option<String>,
    #[serde(default)]
    pub tmdb_api_key: Option<String>,
    #[serde(default)]
    pub omdb_api_key: Option<String>,
    #[serde(default)]
    pub youtube_api_key: Option<String>,
    /// Whole-request timeout of the shared HTTP client
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Bound on one provider lookup inside a resolver chain
    #[serde(default = "default_request_timeout_secs")]
    pub provider_timeout_secs: u64,
    #[serde(default)]
    pub google_books: GoogleBooksTuning,
    /// Verified Criterion film pages keyed by film title
    #[serde(default)]
    pub criterion_links: HashMap<String, String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            google_books_api_key: None,
            tmdb_api_key: None,
            omdb_api_key: None,
            youtube_api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
            provider_timeout_secs: default_request_timeout_secs(),
            google_books: GoogleBooksTuning::default(),
            criterion_links: HashMap::new(),
        }
    }
}

/// Google Books response cache and request limiter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleBooksTuning {
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for GoogleBooksTuning {
    fn default() -> Self {
        Self {
            cache_size: default_cache_size(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

/// Batch limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Per-job overrides keyed by job name
    #[serde(default)]
    pub jobs: HashMap<String, JobOverride>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            jobs: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobOverride {
    pub batch_size: Option<usize>,
    pub delay_ms: Option<u64>,
}

/// Fan-out to sibling jobs after inserts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanOutConfig {
    #[serde(default = "default_fanout_enabled")]
    pub enabled: bool,
    /// Where the job endpoints live; defaults to this server
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            enabled: default_fanout_enabled(),
            base_url: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "./data/leafnode.db".to_string()
}

fn default_jwt_secret() -> String {
    "change-me-in-production".to_string()
}

fn default_auth_enabled() -> bool {
    true
}

fn default_token_expiry_hours() -> i64 {
    24
}

fn default_request_timeout_secs() -> u64 {
    8
}

fn default_cache_size() -> usize {
    500
}

fn default_cache_ttl_secs() -> u64 {
    60 * 60
}

fn default_max_requests() -> usize {
    100
}

fn default_window_secs() -> u64 {
    60
}

fn default_max_batch_size() -> usize {
    100
}

fn default_fanout_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Config {
    /// Load configuration from a file and the process environment
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with(path: &str, env: Environment) -> Result<Self> {
        if Path::new(path).exists() {
            info!("Loading configuration from {}", path);
        } else {
            info!("Config file not found at {}, using defaults", path);
        }

        let settings = ::config::Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                env.prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.enrichment.max_batch_size == 0 {
            bail!("enrichment.max_batch_size must be at least 1");
        }
        if self.auth.enabled && self.auth.jwt_secret == default_jwt_secret() {
            warn!("auth.jwt_secret is the built-in default; set LEAFNODE_AUTH__JWT_SECRET");
        }
        Ok(())
    }

    /// Provider settings for the resolver chains
    pub fn provider_set_config(&self) -> ProviderSetConfig {
        let providers = &self.providers;
        let google_books = &providers.google_books;

        ProviderSetConfig {
            http: HttpConfig {
                timeout: Duration::from_secs(providers.request_timeout_secs),
                ..HttpConfig::default()
            },
            google_books: GoogleBooksConfig {
                api_key: non_empty(&providers.google_books_api_key),
                cache: TtlCacheConfig {
                    max_size: google_books.cache_size,
                    ttl: Duration::from_secs(google_books.cache_ttl_secs),
                },
                max_requests: google_books.max_requests,
                time_window: Duration::from_secs(google_books.window_secs),
                ..GoogleBooksConfig::default()
            },
            open_library: OpenLibraryConfig::default(),
            tmdb: TmdbConfig {
                api_key: non_empty(&providers.tmdb_api_key),
                ..TmdbConfig::default()
            },
            omdb: OmdbConfig {
                api_key: non_empty(&providers.omdb_api_key),
                ..OmdbConfig::default()
            },
            youtube: YouTubeConfig {
                api_key: non_empty(&providers.youtube_api_key),
                ..YouTubeConfig::default()
            },
            criterion_links: providers.criterion_links.clone(),
            provider_timeout: Duration::from_secs(providers.provider_timeout_secs),
        }
    }

    /// Batch limits with per-job overrides applied
    pub fn job_settings(&self) -> Result<JobSettings> {
        let mut overrides = HashMap::new();

        for (name, job) in &self.enrichment.jobs {
            let kind: JobKind = name
                .parse()
                .with_context(|| format!("Invalid enrichment.jobs entry '{}'", name))?;
            let defaults = JobTuning::defaults(kind);
            overrides.insert(
                kind,
                JobTuning {
                    batch_size: job.batch_size.unwrap_or(defaults.batch_size),
                    delay: job
                        .delay_ms
                        .map(Duration::from_millis)
                        .unwrap_or(defaults.delay),
                },
            );
        }

        Ok(JobSettings {
            max_batch_size: self.enrichment.max_batch_size,
            overrides,
        })
    }

    /// Base URL the fan-out posts to
    pub fn fanout_base_url(&self) -> String {
        self.fanout.base_url.clone().unwrap_or_else(|| {
            let host = match self.server.bind_address.as_str() {
                "0.0.0.0" | "::" => "127.0.0.1",
                other => other,
            };
            format!("http://{}:{}", host, self.server.port)
        })
    }
}
