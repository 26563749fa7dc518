//! Process configuration, read once from environment variables at startup.

use anyhow::{bail, Context};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

const DOTENV_PATH: &str = ".env";

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    pub topic: String,
    pub group_id: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of orders held in memory. Always > 0.
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    pub server: ServerConfig,
    pub metrics_port: u16,
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from the process environment, falling back to a
    /// `.env` file in the working directory when one exists. Variables
    /// already set in the environment win over the file.
    ///
    /// Environment variables:
    /// - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`,
    ///   `DB_MAX_CONNECTIONS`
    /// - `KAFKA_BROKERS` (comma-separated), `KAFKA_TOPIC`, `KAFKA_GROUP`
    /// - `SERVER_PORT`, `METRICS_PORT`
    /// - `CACHE_SIZE` (must be positive)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::load(|key| std::env::var(key).ok(), Path::new(DOTENV_PATH))
    }

    fn load<F>(lookup: F, dotenv_path: &Path) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dotenv = read_dotenv(dotenv_path)?;
        Self::from_lookup(|key| lookup(key).or_else(|| dotenv.get(key).cloned()))
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset.
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let string = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let database = DatabaseConfig {
            host: string("DB_HOST", "localhost"),
            port: parse(&var, "DB_PORT", 5432)?,
            user: string("DB_USER", "postgres"),
            password: string("DB_PASSWORD", ""),
            name: string("DB_NAME", "orders"),
            max_connections: parse(&var, "DB_MAX_CONNECTIONS", 25)?,
        };

        let brokers: Vec<String> = string("KAFKA_BROKERS", "localhost:9092")
            .split(',')
            .map(|broker| broker.trim().to_string())
            .filter(|broker| !broker.is_empty())
            .collect();
        if brokers.is_empty() {
            bail!("KAFKA_BROKERS must name at least one broker");
        }

        let kafka = KafkaConfig {
            brokers,
            topic: string("KAFKA_TOPIC", "orders"),
            group_id: string("KAFKA_GROUP", "order_service"),
        };

        let cache_size: i64 = parse(&var, "CACHE_SIZE", 100)?;
        if cache_size <= 0 {
            bail!("CACHE_SIZE must be greater than zero, got {}", cache_size);
        }

        Ok(Self {
            database,
            kafka,
            server: ServerConfig {
                port: parse(&var, "SERVER_PORT", 8080)?,
            },
            metrics_port: parse(&var, "METRICS_PORT", 9090)?,
            cache: CacheConfig {
                size: usize::try_from(cache_size)
                    .context("CACHE_SIZE does not fit in usize")?,
            },
        })
    }
}

/// Read `KEY=value` pairs from `path`. A missing file yields no pairs.
fn read_dotenv(path: &Path) -> anyhow::Result<HashMap<String, String>> {
    match dotenvy::from_path_iter(path) {
        Ok(iter) => {
            let vars = iter
                .collect::<Result<HashMap<_, _>, _>>()
                .with_context(|| format!("invalid dotenv file {}", path.display()))?;
            tracing::debug!(path = %path.display(), count = vars.len(), "Loaded dotenv file");
            Ok(vars)
        }
        Err(e) if e.not_found() => Ok(HashMap::new()),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

fn parse<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
