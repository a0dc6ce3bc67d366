use crate::buffer::FEED_CAPACITY;
use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const ENV_HOST: &str = "STILLFROST_HOST";
pub const ENV_PORT: &str = "STILLFROST_PORT";
pub const ENV_BIND: &str = "STILLFROST_BIND";

const DEFAULT_PORT: u16 = 8001;

/// Where the feed connects and how it paces itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub reconnect_delay_ms: u64,
    pub demo_interval_ms: u64,
    pub capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            path: "/ws/telemetry".to_string(),
            reconnect_delay_ms: 5_000,
            demo_interval_ms: 2_500,
            capacity: FEED_CAPACITY,
        }
    }
}

impl FeedConfig {
    pub fn endpoint(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.path)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn demo_interval(&self) -> Duration {
        Duration::from_millis(self.demo_interval_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.reconnect_delay_ms == 0 || self.demo_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "feed intervals must be greater than zero".to_string(),
            });
        }
        if self.capacity == 0 {
            return Err(ConfigError::Invalid {
                message: "feed capacity must be at least 1".to_string(),
            });
        }
        if !self.path.starts_with('/') {
            return Err(ConfigError::Invalid {
                message: format!("feed path must start with '/': {}", self.path),
            });
        }
        Ok(())
    }
}

/// Settings for the telemetry broadcaster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub demo: bool,
    pub demo_interval_secs: u64,
    pub demo_start_delay_secs: u64,
    pub history_size: usize,
    pub replay_size: usize,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            demo: true,
            demo_interval_secs: 4,
            demo_start_delay_secs: 5,
            history_size: 100,
            replay_size: 20,
        }
    }
}

impl ServeConfig {
    pub fn demo_interval(&self) -> Duration {
        Duration::from_secs(self.demo_interval_secs)
    }

    pub fn demo_start_delay(&self) -> Duration {
        Duration::from_secs(self.demo_start_delay_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.demo && self.demo_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "demo interval must be greater than zero".to_string(),
            });
        }
        if self.replay_size > self.history_size {
            return Err(ConfigError::Invalid {
                message: format!(
                    "replay size {} exceeds history size {}",
                    self.replay_size, self.history_size
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub feed: FeedConfig,
    pub serve: ServeConfig,
}

impl Settings {
    /// Defaults, then the TOML file if one is given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST).filter(|value| !value.trim().is_empty()) {
            self.feed.host = host;
        }
        if let Some(bind) = lookup(ENV_BIND).filter(|value| !value.trim().is_empty()) {
            self.serve.host = bind;
        }
        if let Some(raw) = lookup(ENV_PORT) {
            let port = raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_PORT.to_string(),
                value: raw.clone(),
            })?;
            self.feed.port = port;
            self.serve.port = port;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.feed.validate()?;
        self.serve.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.feed.endpoint(), "ws://localhost:8001/ws/telemetry");
        assert_eq!(settings.feed.reconnect_delay(), Duration::from_millis(5000));
        assert_eq!(settings.feed.demo_interval(), Duration::from_millis(2500));
        assert_eq!(settings.feed.capacity, 8);
        assert_eq!(settings.serve.replay_size, 20);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[feed]\nhost = \"backend\"\nreconnect_delay_ms = 1000\n\n[serve]\nport = 9000"
        )
        .unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.feed.host, "backend");
        assert_eq!(settings.feed.reconnect_delay_ms, 1000);
        assert_eq!(settings.feed.port, 8001);
        assert_eq!(settings.serve.port, 9000);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[feed]\nhost = \"backend\"").unwrap();

        let mut settings = Settings::from_file(file.path()).unwrap();
        settings
            .apply_env(env(&[(ENV_HOST, "edge"), (ENV_PORT, "8100")]))
            .unwrap();
        assert_eq!(settings.feed.host, "edge");
        assert_eq!(settings.feed.port, 8100);
        assert_eq!(settings.serve.port, 8100);
    }

    #[test]
    fn test_invalid_port_env() {
        let mut settings = Settings::default();
        let err = settings.apply_env(env(&[(ENV_PORT, "not-a-port")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let err = Settings::from_file(Path::new("/nonexistent/stillfrost.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[feed\nhost =").unwrap();
        let err = Settings::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_validation_rejects_zero_intervals() {
        let mut settings = Settings::default();
        settings.feed.demo_interval_ms = 0;
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid { .. })));

        let mut settings = Settings::default();
        settings.serve.replay_size = 500;
        assert!(settings.validate().is_err());
    }
}
