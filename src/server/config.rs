use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_public_scheme")]
    pub public_scheme: String,

    /// Host used in resource URLs instead of the request's `Host` header.
    #[serde(default)]
    pub public_host: Option<String>,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    bind_address: Option<String>,
    database_url: Option<String>,
    max_connections: Option<u32>,
    public_scheme: Option<String>,
    public_host: Option<String>,
    log_dir: Option<String>,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_database_url() -> String {
    "sqlite://todos.db?mode=rwc".to_string()
}

// One shared store handle.
fn default_max_connections() -> u32 {
    1
}

fn default_public_scheme() -> String {
    "http".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_layers(PartialServerConfig::default(), PartialServerConfig::default())
    }
}

impl ServerConfig {
    /// Loads the configuration: an optional TOML file, overridden field by
    /// field by environment variables (`DATABASE_URL`, `BIND_ADDRESS`, ...),
    /// falling back to defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialServerConfig = match config_path {
            Some(path_str) if Path::new(path_str).exists() => {
                let path = Path::new(path_str);
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            }
            _ => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        let config = Self::from_layers(env_config, file_config);
        if config.public_scheme.is_empty() {
            return Err("PUBLIC_SCHEME must not be empty".to_string());
        }
        Ok(config)
    }

    fn from_layers(env_config: PartialServerConfig, file_config: PartialServerConfig) -> Self {
        ServerConfig {
            bind_address: env_config.bind_address.or(file_config.bind_address)
                .unwrap_or_else(default_bind_address),
            database_url: env_config.database_url.or(file_config.database_url)
                .unwrap_or_else(default_database_url),
            max_connections: env_config.max_connections.or(file_config.max_connections)
                .unwrap_or_else(default_max_connections),
            public_scheme: env_config.public_scheme.or(file_config.public_scheme)
                .unwrap_or_else(default_public_scheme),
            public_host: env_config.public_host.or(file_config.public_host),
            log_dir: env_config.log_dir.or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
        }
    }
}
