//! Connection providers.
//!
//! The data access layer only ever asks a [`ConnectionProvider`] for a
//! [`DbConn`]; whether that comes out of a pool or is opened for the call
//! is decided once, from [`DbConfig::pooling`].

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{ConnectOptions, Sqlite, SqliteConnection};

use crate::config::{ConfigError, DbConfig, Pooling};
use crate::error::{LibraryError, Result};

/// A live connection for the length of one data access call.
///
/// Dropping it hands a pooled connection back or closes a dedicated one,
/// so every exit path releases it.
pub enum DbConn {
	Pooled(PoolConnection<Sqlite>),
	Dedicated(SqliteConnection),
}

impl Deref for DbConn {
	type Target = SqliteConnection;

	fn deref(&self) -> &SqliteConnection {
		match self {
			DbConn::Pooled(conn) => &**conn,
			DbConn::Dedicated(conn) => conn,
		}
	}
}

impl DerefMut for DbConn {
	fn deref_mut(&mut self) -> &mut SqliteConnection {
		match self {
			DbConn::Pooled(conn) => &mut **conn,
			DbConn::Dedicated(conn) => conn,
		}
	}
}

#[async_trait]
pub trait ConnectionProvider: Send + Sync + fmt::Debug {
	/// Obtain a connection or fail with [`LibraryError::Connection`].
	async fn acquire(&self) -> Result<DbConn>;

	/// Release whatever the provider keeps open.
	async fn close(&self) {}
}

/// Connections borrowed from a bounded sqlx pool.
#[derive(Clone)]
pub struct PooledProvider {
	pool: SqlitePool,
}

impl fmt::Debug for PooledProvider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PooledProvider")
			.field("size", &self.pool.size())
			.finish_non_exhaustive()
	}
}

impl PooledProvider {
	pub async fn connect(options: SqliteConnectOptions, config: &DbConfig) -> Result<Self> {
		let pool = SqlitePoolOptions::new()
			.max_connections(config.max_connections)
			.acquire_timeout(config.acquire_timeout())
			.connect_with(options)
			.await
			.map_err(LibraryError::Connection)?;
		Ok(PooledProvider { pool })
	}
}

#[async_trait]
impl ConnectionProvider for PooledProvider {
	async fn acquire(&self) -> Result<DbConn> {
		self.pool
			.acquire()
			.await
			.map(DbConn::Pooled)
			.map_err(LibraryError::Connection)
	}

	async fn close(&self) {
		self.pool.close().await;
	}
}

/// A fresh connection for every call, closed when the call is done.
#[derive(Debug, Clone)]
pub struct PerCallProvider {
	options: SqliteConnectOptions,
}

impl PerCallProvider {
	pub fn new(options: SqliteConnectOptions) -> Self {
		PerCallProvider { options }
	}
}

#[async_trait]
impl ConnectionProvider for PerCallProvider {
	async fn acquire(&self) -> Result<DbConn> {
		self.options
			.connect()
			.await
			.map(DbConn::Dedicated)
			.map_err(LibraryError::Connection)
	}
}

/// Build the provider the configuration asks for.
///
/// The pooled variant opens its first connection here, so an unreachable
/// database fails at startup rather than on the first request.
pub async fn connect(config: &DbConfig) -> Result<Arc<dyn ConnectionProvider>, ConnectError> {
	config.validate()?;
	let options = config.connect_options()?;
	let provider: Arc<dyn ConnectionProvider> = match config.pooling {
		Pooling::Pool => Arc::new(PooledProvider::connect(options, config).await?),
		Pooling::PerCall => Arc::new(PerCallProvider::new(options)),
	};
	tracing::info!(database = %config.describe(), pooling = ?config.pooling, "database provider ready");
	Ok(provider)
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Library(#[from] LibraryError),
}

/// Round-trip a trivial query and report the engine version.
pub async fn test_connection(provider: &dyn ConnectionProvider) -> Result<String> {
	let mut conn = provider.acquire().await?;
	let version: String = sqlx::query_scalar("SELECT sqlite_version()")
		.fetch_one(&mut *conn)
		.await?;
	Ok(format!("SQLite {version}"))
}
