use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sidequest", about = "A game review and Q&A web app")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// API key for the game catalog service
    #[arg(long)]
    pub api_key: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub catalog: CatalogConfig,
    pub votes: VotesConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub session_hours: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Upvote rows are intentionally not unique per (user, target); `dedupe`
/// turns repeated upvotes into no-ops instead.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct VotesConfig {
    pub dedupe: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { session_hours: 720 }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.rawg.io/api".to_string(),
            api_key: String::new(),
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI and environment overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Ok(key) = std::env::var("SIDEQUEST_API_KEY") {
            config.catalog.api_key = key;
        }
        if let Some(ref key) = cli.api_key {
            config.catalog.api_key = key.clone();
        }

        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("sidequest.db"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .expect("Could not determine home directory")
                .join(".sidequest")
        })
    }

    pub fn db_path(&self) -> &PathBuf {
        self.database.path.as_ref().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(data_dir: Option<PathBuf>) -> Cli {
        Cli {
            config: None,
            host: None,
            port: None,
            data_dir,
            api_key: None,
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.session_hours, 720);
        assert_eq!(config.catalog.base_url, "https://api.rawg.io/api");
        assert!(!config.votes.dedupe);
        assert!(config.database.path.is_none());
    }

    #[test]
    fn data_dir_uses_cli_override() {
        let cli = cli(Some(PathBuf::from("/tmp/test-sidequest")));
        assert_eq!(Config::data_dir(&cli), PathBuf::from("/tmp/test-sidequest"));
    }

    #[test]
    fn load_with_no_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = cli(Some(tmp.path().to_path_buf()));
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.db_path(), &tmp.path().join("sidequest.db"));
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
host = "127.0.0.1"
port = 9000

[auth]
session_hours = 24

[catalog]
base_url = "http://localhost:1234/api"
api_key = "k"

[votes]
dedupe = true
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            host: None,
            port: None,
            data_dir: Some(tmp.path().to_path_buf()),
            api_key: None,
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.session_hours, 24);
        assert_eq!(config.catalog.base_url, "http://localhost:1234/api");
        assert_eq!(config.catalog.api_key, "k");
        assert!(config.votes.dedupe);
    }

    #[test]
    fn cli_overrides_beat_toml_values() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
port = 9000
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            host: Some("10.0.0.1".to_string()),
            port: Some(4000),
            data_dir: Some(tmp.path().to_path_buf()),
            api_key: Some("cli-key".to_string()),
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "10.0.0.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.catalog.api_key, "cli-key");
    }
}
