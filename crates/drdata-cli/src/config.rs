use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

use drdata_generate::GenerateOptions;
use drdata_introspect::IntrospectOptions;
use drdata_load::CsvOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("toml decode error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid database url: {0}")]
    Url(#[source] sqlx::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Contents of the file given by `--config` / `DRDATA_CONFIG`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DrdataConfig {
    pub db: DbConfig,
    pub generate: GenerateConfig,
    pub csv: CsvConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Full connection url; takes precedence over the discrete fields.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    /// Namespace whose tables are managed.
    pub schema: String,
    pub max_connections: u32,
    /// Rows per INSERT statement.
    pub batch_size: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: None,
            password: None,
            database: None,
            schema: "public".to_string(),
            max_connections: 5,
            batch_size: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Rows per table for `inject` when `--rows` is not given.
    pub rows: Option<u64>,
    pub seed: Option<u64>,
    pub null_probability: f64,
    pub max_unique_attempts: u32,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        let defaults = GenerateOptions::default();
        Self {
            rows: None,
            seed: defaults.seed,
            null_probability: defaults.null_probability,
            max_unique_attempts: defaults.max_unique_attempts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    pub delimiter: char,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

impl DrdataConfig {
    /// Read a config file: JSON when the extension is `.json`, TOML otherwise.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: Self = if is_json {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db.url.is_none() && self.db.database.is_none() {
            return Err(ConfigError::Invalid(
                "either db.url or db.database must be set".to_string(),
            ));
        }
        if self.db.schema.trim().is_empty() {
            return Err(ConfigError::Invalid("db.schema must not be empty".to_string()));
        }
        if self.db.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "db.max_connections must be at least 1".to_string(),
            ));
        }
        if self.db.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "db.batch_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.generate.null_probability) {
            return Err(ConfigError::Invalid(format!(
                "generate.null_probability must be between 0 and 1, got {}",
                self.generate.null_probability
            )));
        }
        if !self.csv.delimiter.is_ascii() || self.csv.delimiter == '"' {
            return Err(ConfigError::Invalid(format!(
                "csv.delimiter must be a single ASCII character other than '\"', got {:?}",
                self.csv.delimiter
            )));
        }
        Ok(())
    }

    /// Generator options with command-line overrides applied.
    pub fn generate_options(&self, seed: Option<u64>) -> GenerateOptions {
        GenerateOptions {
            seed: seed.or(self.generate.seed),
            null_probability: self.generate.null_probability,
            max_unique_attempts: self.generate.max_unique_attempts,
        }
    }

    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            delimiter: self.csv.delimiter as u8,
        }
    }

    /// Cache identity of the database this config points at.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let encoded = serde_json::to_vec(&self.db)?;
        Ok(hex::encode(Sha256::digest(&encoded)))
    }
}

impl DbConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        if let Some(url) = &self.url {
            return url.parse().map_err(ConfigError::Url);
        }

        let mut options = PgConnectOptions::new().host(&self.host).port(self.port);
        if let Some(user) = &self.user {
            options = options.username(user);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        if let Some(database) = &self.database {
            options = options.database(database);
        }
        Ok(options)
    }

    pub fn introspect_options(&self) -> IntrospectOptions {
        IntrospectOptions {
            namespace: self.schema.clone(),
            batch_size: self.batch_size,
            ..IntrospectOptions::default()
        }
    }

    /// Database name used for export file names.
    pub fn database_name(&self) -> Option<String> {
        if let Some(database) = &self.database {
            return Some(database.clone());
        }
        let url = self.url.as_deref()?;
        let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
        let path = after_scheme.split_once('/')?.1;
        let name = path.split('?').next().unwrap_or_default();
        (!name.is_empty()).then(|| name.to_string())
    }

    /// Connection target with the password masked, for logs.
    pub fn redacted(&self) -> String {
        match &self.url {
            Some(url) => redact_url(url),
            None => format!(
                "{}@{}:{}/{}",
                self.user.as_deref().unwrap_or(""),
                self.host,
                self.port,
                self.database.as_deref().unwrap_or("")
            ),
        }
    }
}

fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let (authority, tail) = match rest.find('/') {
        Some(index) => rest.split_at(index),
        None => (rest, ""),
    };
    let authority = match authority.rsplit_once('@') {
        Some((credentials, host)) => match credentials.split_once(':') {
            Some((user, _)) => format!("{user}:***@{host}"),
            None => authority.to_string(),
        },
        None => authority.to_string(),
    };

    let tail = match tail.split_once('?') {
        Some((path, query)) => {
            let params: Vec<String> = query
                .split('&')
                .map(|pair| match pair.split_once('=') {
                    Some((key, _)) if key.eq_ignore_ascii_case("password") => {
                        format!("{key}=***")
                    }
                    _ => pair.to_string(),
                })
                .collect();
            format!("{path}?{}", params.join("&"))
        }
        None => tail.to_string(),
    };
    format!("{scheme}://{authority}{tail}")
}
