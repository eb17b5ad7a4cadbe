use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub compute: ComputeConfig,
    pub definitions: DefinitionsConfig,
    pub cache: CacheConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Hides error details (debug chains) from HTTP responses
    pub production: bool,
    /// Externally reachable base URL of this server, used for pointer transport
    pub public_url: Option<String>,
}

/// How the definition file reaches the compute service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionTransport {
    /// Base64 file contents embedded in the request body
    Inline,
    /// URL of `/definition/{id}` on this server, fetched by compute
    Pointer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub auth_token: Option<String>,
    pub solve_timeout_secs: u64,
    pub status_timeout_secs: u64,
    pub solve_attempts: u32,
    pub probe_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub transport: DefinitionTransport,
    pub health_path: String,
    pub version_path: String,
    pub solve_path: String,
    pub io_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionsConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: usize,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticFilesConfig {
    pub dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            production: false,
            public_url: None,
        }
    }
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6500".to_string(),
            api_key: None,
            auth_token: None,
            solve_timeout_secs: 30,
            status_timeout_secs: 2,
            solve_attempts: 2,
            probe_attempts: 3,
            backoff_base_ms: 200,
            backoff_max_ms: 2_000,
            transport: DefinitionTransport::Inline,
            health_path: "/healthcheck".to_string(),
            version_path: "/version".to_string(),
            solve_path: "/grasshopper".to_string(),
            io_path: "/io".to_string(),
        }
    }
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("files"),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 256,
            ttl_secs: 3600, // 1 hour
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `appserver` config file
    /// and `APPSERVER_` environment variables (`__` separates nested keys)
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("appserver").required(false));

        // e.g. APPSERVER_COMPUTE__API_KEY -> compute.api_key
        config = config.add_source(
            config::Environment::with_prefix("APPSERVER")
                .separator("__")
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Get the server bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Base URL other services use to reach this server
    pub fn public_url(&self) -> String {
        match &self.server.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.server_address()),
        }
    }
}

impl ComputeConfig {
    /// Join a configured endpoint path onto the compute base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn solve_timeout(&self) -> Duration {
        Duration::from_secs(self.solve_timeout_secs)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_secs(self.status_timeout_secs)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}
