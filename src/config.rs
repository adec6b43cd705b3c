//! Connection and server settings, read from flags or the environment.
//!
//! `.env` is loaded first (see [`load_dotenv`]) so every `env = "..."` below
//! can also come from that file.

use std::str::FromStr;
use std::time::Duration;

use clap::{Args, ValueEnum};
use sqlx::sqlite::SqliteConnectOptions;
use thiserror::Error;

/// Default database file when no `DATABASE_URL` is given.
pub const DEFAULT_DB_NAME: &str = "library.db";

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("invalid DATABASE_URL '{url}': {source}")]
	InvalidUrl {
		url: String,
		#[source]
		source: sqlx::Error,
	},

	#[error("DB_MAX_CONNECTIONS must be at least 1")]
	ZeroConnections,
}

/// How connections are obtained for each data access call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Pooling {
	/// Reuse connections from a bounded pool.
	#[default]
	Pool,
	/// Open a fresh connection for every call and close it afterwards.
	PerCall,
}

#[derive(Debug, Clone, Args)]
pub struct DbConfig {
	/// Full sqlx SQLite URL, e.g. `sqlite:library.db`; overrides --db-name
	#[arg(long, env = "DATABASE_URL")]
	pub database_url: Option<String>,

	/// Database file, created when missing
	#[arg(long, env = "DB_NAME", default_value = DEFAULT_DB_NAME)]
	pub db_name: String,

	#[arg(long, env = "DB_POOLING", value_enum, default_value_t = Pooling::Pool)]
	pub pooling: Pooling,

	#[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
	pub max_connections: u32,

	#[arg(long, env = "DB_ACQUIRE_TIMEOUT_SECS", default_value_t = DEFAULT_ACQUIRE_TIMEOUT_SECS)]
	pub acquire_timeout_secs: u64,
}

impl Default for DbConfig {
	fn default() -> Self {
		DbConfig {
			database_url: None,
			db_name: DEFAULT_DB_NAME.to_string(),
			pooling: Pooling::Pool,
			max_connections: DEFAULT_MAX_CONNECTIONS,
			acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
		}
	}
}

impl DbConfig {
	/// Settings for a database file at `path`, everything else default.
	pub fn for_file(path: impl Into<String>) -> Self {
		DbConfig { db_name: path.into(), ..Default::default() }
	}

	/// Options shared by every connection: foreign keys on (cascades and
	/// references depend on it) and the file created on first use.
	pub fn connect_options(&self) -> Result<SqliteConnectOptions, ConfigError> {
		let options = match &self.database_url {
			Some(url) => SqliteConnectOptions::from_str(url)
				.map_err(|source| ConfigError::InvalidUrl { url: url.clone(), source })?,
			None => SqliteConnectOptions::new().filename(&self.db_name),
		};
		Ok(options.create_if_missing(true).foreign_keys(true))
	}

	pub fn acquire_timeout(&self) -> Duration {
		Duration::from_secs(self.acquire_timeout_secs)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_connections == 0 {
			return Err(ConfigError::ZeroConnections);
		}
		Ok(())
	}

	/// What the logs show instead of the raw URL.
	pub fn describe(&self) -> String {
		match &self.database_url {
			Some(_) => "DATABASE_URL".to_string(),
			None => self.db_name.clone(),
		}
	}
}

/// Load `.env` if there is one; a missing file is not an error.
pub fn load_dotenv() {
	match dotenvy::dotenv() {
		Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
		Err(e) if e.not_found() => {}
		Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
	}
}
