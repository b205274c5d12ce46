use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default)]
    pub max_connections: Option<u32>, // None = size from CPU count
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub static_dir: PathBuf,
    pub database_url: String,
    pub max_db_connections: u32,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        // Try to load config file
        let config_path = base_dir.join("config.toml");
        let config_file = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Some(toml::from_str::<ConfigFile>(&content)?)
        } else {
            None
        };

        // Env vars override config file
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .or_else(|| config_file.as_ref().map(|c| c.server.port))
            .unwrap_or(8000);

        let static_dir_str = std::env::var("STATIC_DIR")
            .ok()
            .or_else(|| config_file.as_ref().map(|c| c.server.static_dir.clone()))
            .unwrap_or_else(|| "static".to_string());

        let static_dir = if static_dir_str.starts_with('/') {
            PathBuf::from(static_dir_str)
        } else {
            base_dir.join(static_dir_str)
        };

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .or_else(|| config_file.as_ref().map(|c| c.database.url.clone()))
            .unwrap_or_else(|| "sqlite://videos.db".to_string());

        let cpu_count = num_cpus::get();
        let default_connections = cpu_count.clamp(2, 8) as u32;

        let max_db_connections = std::env::var("MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or_else(|| {
                config_file
                    .as_ref()
                    .and_then(|c| c.database.max_connections)
                    .filter(|&v| v > 0)
            })
            .unwrap_or(default_connections);

        Ok(Self {
            port,
            static_dir,
            database_url,
            max_db_connections,
        })
    }

    pub fn from_env() -> Self {
        Self::load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let cpu_count = num_cpus::get();

        Self {
            port: 8000,
            static_dir: base_dir.join("static"),
            database_url: "sqlite://videos.db".to_string(),
            max_db_connections: cpu_count.clamp(2, 8) as u32,
        }
    }
}
