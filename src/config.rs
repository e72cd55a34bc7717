use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::scoring::{
    ScoringRules, DEFAULT_IMPORTANCE_THRESHOLD, DEFAULT_NEGATIVE_KEYWORDS, DEFAULT_URGENCY_KEYWORDS,
};

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener
    pub server: ServerConfig,
    /// Ticket storage backend
    pub store: StoreConfig,
    /// Log output
    pub logging: LoggingConfig,
    /// Keyword scoring rules
    pub scoring: ScoringConfig,
    /// Ticket listing
    pub tickets: TicketsConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
}

/// Where ticket rows live.
///
/// The hosted store's URL and service key are not part of this struct: they
/// are read from the environment variables named here on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `rest` for the hosted table API, `sqlite` for a local file
    pub backend: String,
    /// Table holding ticket rows
    pub table: String,
    /// Variable holding the hosted store URL
    pub url_env: String,
    /// Variables tried in order when `url_env` is unset
    pub url_env_fallbacks: Vec<String>,
    /// Variable holding the service key
    pub service_key_env: String,
    /// Timeout for each hosted store request
    pub request_timeout_secs: u64,
    /// `sqlite:` URL of the local database
    pub sqlite_url: String,
    /// SQLite pool size
    pub max_connections: u32,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset
    pub level: String,
    /// Optional daily-rolling JSON log file
    pub file_path: Option<String>,
    /// Console format, `text` or `json`
    pub format: String,
}

/// Scoring settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Words that make a message urgent
    pub urgency_keywords: Vec<String>,
    /// Words that make a message negative
    pub negative_keywords: Vec<String>,
    /// Messages longer than this many characters are important
    pub importance_threshold: usize,
}

/// Ticket listing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketsConfig {
    /// Maximum tickets returned by the list route
    pub list_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            store: StoreConfig {
                backend: "rest".to_string(),
                table: "tickets".to_string(),
                url_env: "SUPABASE_URL".to_string(),
                url_env_fallbacks: vec!["NEXT_PUBLIC_SUPABASE_URL".to_string()],
                service_key_env: "SUPABASE_SERVICE_ROLE_KEY".to_string(),
                request_timeout_secs: 30,
                sqlite_url: "sqlite:data/tickets.db".to_string(),
                max_connections: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            scoring: ScoringConfig {
                urgency_keywords: DEFAULT_URGENCY_KEYWORDS.iter().map(ToString::to_string).collect(),
                negative_keywords: DEFAULT_NEGATIVE_KEYWORDS.iter().map(ToString::to_string).collect(),
                importance_threshold: DEFAULT_IMPORTANCE_THRESHOLD,
            },
            tickets: TicketsConfig { list_limit: 25 },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();
        for (key, value) in Self::default() {
            builder = builder.set_default(key, value)?;
        }

        let config = builder
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // Add environment variables with prefix
            .add_source(
                Environment::with_prefix("TICKET_TRIAGE")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("store.url_env_fallbacks")
                    .with_list_parse_key("scoring.urgency_keywords")
                    .with_list_parse_key("scoring.negative_keywords")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(anyhow::anyhow!("server host cannot be empty"));
        }

        // Validate store config
        let valid_backends = ["rest", "sqlite"];
        if !valid_backends.contains(&self.store.backend.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid store backend: {}. Must be one of: {:?}",
                self.store.backend,
                valid_backends
            ));
        }
        if self.store.table.trim().is_empty() {
            return Err(anyhow::anyhow!("store table cannot be empty"));
        }
        if self.store.url_env.trim().is_empty() || self.store.service_key_env.trim().is_empty() {
            return Err(anyhow::anyhow!("store credential variable names cannot be empty"));
        }
        if self.store.url_env_fallbacks.iter().any(|name| name.trim().is_empty()) {
            return Err(anyhow::anyhow!("store url_env_fallbacks cannot contain empty names"));
        }
        if self.store.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("request_timeout_secs must be greater than 0"));
        }
        if self.store.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than 0"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        // Validate scoring and listing
        if self.scoring.importance_threshold == 0 {
            return Err(anyhow::anyhow!("importance_threshold must be greater than 0"));
        }
        if self.tickets.list_limit == 0 || self.tickets.list_limit > 1000 {
            return Err(anyhow::anyhow!("list_limit must be between 1 and 1000"));
        }

        Ok(())
    }

    /// Scoring rules built from the `scoring` section
    #[must_use]
    pub fn scoring_rules(&self) -> ScoringRules {
        ScoringRules::new(
            &self.scoring.urgency_keywords,
            &self.scoring.negative_keywords,
            self.scoring.importance_threshold,
        )
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Address the HTTP server binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl IntoIterator for AppConfig {
    type Item = (String, config::Value);
    type IntoIter = std::collections::hash_map::IntoIter<String, config::Value>;

    fn into_iter(self) -> Self::IntoIter {
        let mut map = std::collections::HashMap::new();

        // Flatten the configuration into key-value pairs
        map.insert("server.host".to_string(), config::Value::from(self.server.host));
        map.insert("server.port".to_string(), config::Value::from(u64::from(self.server.port)));

        map.insert("store.backend".to_string(), config::Value::from(self.store.backend));
        map.insert("store.table".to_string(), config::Value::from(self.store.table));
        map.insert("store.url_env".to_string(), config::Value::from(self.store.url_env));
        map.insert("store.url_env_fallbacks".to_string(), config::Value::from(self.store.url_env_fallbacks));
        map.insert("store.service_key_env".to_string(), config::Value::from(self.store.service_key_env));
        map.insert("store.request_timeout_secs".to_string(), config::Value::from(self.store.request_timeout_secs));
        map.insert("store.sqlite_url".to_string(), config::Value::from(self.store.sqlite_url));
        map.insert("store.max_connections".to_string(), config::Value::from(self.store.max_connections));

        map.insert("logging.level".to_string(), config::Value::from(self.logging.level));
        if let Some(file_path) = self.logging.file_path {
            map.insert("logging.file_path".to_string(), config::Value::from(file_path));
        }
        map.insert("logging.format".to_string(), config::Value::from(self.logging.format));

        map.insert("scoring.urgency_keywords".to_string(), config::Value::from(self.scoring.urgency_keywords));
        map.insert("scoring.negative_keywords".to_string(), config::Value::from(self.scoring.negative_keywords));
        map.insert(
            "scoring.importance_threshold".to_string(),
            config::Value::from(self.scoring.importance_threshold as u64),
        );

        map.insert("tickets.list_limit".to_string(), config::Value::from(self.tickets.list_limit as u64));

        map.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.store.backend, "rest");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.tickets.list_limit, 25);
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AppConfig::default();
        config.store.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_flattened_defaults_cover_every_section() {
        let keys: Vec<String> = AppConfig::default().into_iter().map(|(k, _)| k).collect();
        for section in ["server.", "store.", "logging.", "scoring.", "tickets."] {
            assert!(keys.iter().any(|k| k.starts_with(section)), "missing {section}");
        }
    }
}
