//! Data access layer.
//!
//! Every call acquires its own connection, runs its statements (inside a
//! transaction when there is more than one), and lets the connection go when
//! it returns. A transaction that is dropped without `commit` rolls back, so
//! an early `?` or business-rule return never leaves partial writes behind.
//!
//! Reads return `Ok(None)` / `Ok(vec![])` when nothing matches; an `Err`
//! always means the query itself could not run.

mod authors;
mod books;
mod loans;
mod orders;
mod reports;

use std::sync::Arc;

use sqlx::SqliteConnection;

use crate::config::DbConfig;
use crate::db::{self, ConnectError, ConnectionProvider};
use crate::error::Result;
use crate::sql;
use crate::types::TableCount;

pub use authors::AuthorRepo;
pub use books::BookRepo;
pub use loans::LoanRepo;
pub use orders::OrderRepo;
pub use reports::ReportRepo;

#[derive(Debug, Clone)]
pub struct Library {
	db: Arc<dyn ConnectionProvider>,
}

impl Library {
	pub fn new(db: Arc<dyn ConnectionProvider>) -> Self {
		Library { db }
	}

	/// Connect with `config` and make sure the schema exists.
	pub async fn open(config: &DbConfig) -> Result<Self, ConnectError> {
		let library = Library::new(db::connect(config).await?);
		library.init_schema().await?;
		Ok(library)
	}

	pub async fn init_schema(&self) -> Result<()> {
		let mut conn = self.db.acquire().await?;
		sql::init_schema(&mut conn).await?;
		tracing::debug!("schema ready");
		Ok(())
	}

	pub async fn test_connection(&self) -> Result<String> {
		db::test_connection(self.db.as_ref()).await
	}

	/// Row count of every table, in schema order.
	pub async fn table_counts(&self) -> Result<Vec<TableCount>> {
		let mut conn = self.db.acquire().await?;
		let mut counts = Vec::with_capacity(sql::COUNTED_TABLES.len());
		for table in sql::COUNTED_TABLES {
			let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
				.fetch_one(&mut *conn)
				.await?;
			counts.push(TableCount { table, rows });
		}
		Ok(counts)
	}

	pub fn authors(&self) -> AuthorRepo<'_> {
		AuthorRepo::new(self.db.as_ref())
	}

	pub fn books(&self) -> BookRepo<'_> {
		BookRepo::new(self.db.as_ref())
	}

	pub fn loans(&self) -> LoanRepo<'_> {
		LoanRepo::new(self.db.as_ref())
	}

	pub fn orders(&self) -> OrderRepo<'_> {
		OrderRepo::new(self.db.as_ref())
	}

	pub fn reports(&self) -> ReportRepo<'_> {
		ReportRepo::new(self.db.as_ref())
	}

	pub async fn close(&self) {
		self.db.close().await;
	}
}

// table names below only ever come from string literals in this module tree

async fn row_exists(conn: &mut SqliteConnection, table: &'static str, id: i64) -> Result<bool> {
	let found: i64 = sqlx::query_scalar(&format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?)"))
		.bind(id)
		.fetch_one(conn)
		.await?;
	Ok(found != 0)
}

async fn count_referencing(
	conn: &mut SqliteConnection,
	table: &'static str,
	column: &'static str,
	id: i64,
) -> Result<i64> {
	let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?"))
		.bind(id)
		.fetch_one(conn)
		.await?;
	Ok(count)
}
