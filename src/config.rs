use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub host: String,
    /// Server bind port.
    pub port: u16,
    /// Path to the SQLite database file.
    pub db_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            db_path: env::var("DB_PATH").unwrap_or_else(|_| "journal-sync.db".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_host_and_port() {
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");
        std::env::remove_var("DB_PATH");
        let config = Config::from_env();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert_eq!(config.db_path, "journal-sync.db");
    }
}
