use serde::Deserialize;

/// Top-level application configuration.
/// Loaded from environment variables and/or a `.env` file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Sync registry settings
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (default: 0.0.0.0)
    #[serde(default = "default_host")]
    pub host: String,
    /// HTTP API port (default: 8080)
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Log level (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Liveness thresholds for the client registry.
///
/// `extend_after_secs` must stay strictly below `stale_after_secs`: the
/// keep-alive extender only makes sense while the freshest client has not
/// yet been reported stale.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Age beyond which a client's heartbeat is considered stale (default: 120)
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,
    /// Heartbeat gap after which the keep-alive extender refreshes the
    /// freshest client (default: 90)
    #[serde(default = "default_extend_after")]
    pub extend_after_secs: u64,
    /// Keep-alive extender tick interval (default: 30)
    #[serde(default = "default_tick")]
    pub tick_secs: u64,
    /// When set, records older than this are evicted by the stale sweeper.
    /// Unset (the default) disables eviction entirely.
    #[serde(default)]
    pub evict_after_secs: Option<u64>,
}

impl AppConfig {
    /// Load config from environment variables (prefix `SB`, `__` separator).
    pub fn load() -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: AppConfig = cfg.try_deserialize()?;
        app.sync.validate()?;
        Ok(app)
    }
}

impl SyncConfig {
    /// Reject threshold combinations the registry cannot honor.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.extend_after_secs >= self.stale_after_secs {
            return Err(config::ConfigError::Message(format!(
                "sync.extend_after_secs ({}) must be below sync.stale_after_secs ({})",
                self.extend_after_secs, self.stale_after_secs
            )));
        }
        if let Some(evict) = self.evict_after_secs {
            if evict < self.stale_after_secs * 2 {
                return Err(config::ConfigError::Message(format!(
                    "sync.evict_after_secs ({evict}) must be at least twice sync.stale_after_secs ({})",
                    self.stale_after_secs
                )));
            }
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_port: default_api_port(),
            log_level: default_log_level(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after(),
            extend_after_secs: default_extend_after(),
            tick_secs: default_tick(),
            evict_after_secs: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_api_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_stale_after() -> u64 {
    120
}
fn default_extend_after() -> u64 {
    90
}
fn default_tick() -> u64 {
    30
}
