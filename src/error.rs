//! Error types shared by the data access layer and both front-ends.

use thiserror::Error;

/// Rejected input, raised before any SQL is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
	#[error("{field} is required")]
	Empty { field: &'static str },

	#[error("{field} must be greater than zero")]
	NotPositive { field: &'static str },

	#[error("{field} cannot be negative")]
	Negative { field: &'static str },

	#[error("{field}: {reason}")]
	Inconsistent { field: &'static str, reason: &'static str },

	#[error("invalid {field}: '{value}'")]
	Malformed { field: &'static str, value: String },
}

/// Everything a data access call can fail with.
///
/// Business-rule failures (`ReferenceNotFound`, `DependencyExists`,
/// `NotFound`, `OutOfStock`, `Validation`) are ordinary results for the
/// caller to show; `Connection` and `Storage` wrap the underlying sqlx error.
#[derive(Debug, Error)]
pub enum LibraryError {
	#[error("could not connect to the database: {0}")]
	Connection(#[source] sqlx::Error),

	#[error("{resource} {id} does not exist")]
	ReferenceNotFound { resource: &'static str, id: i64 },

	#[error("cannot remove {resource} {id}: referenced by {count} {dependent}")]
	DependencyExists {
		resource: &'static str,
		id: i64,
		dependent: &'static str,
		count: i64,
	},

	#[error("{resource} {id} not found")]
	NotFound { resource: &'static str, id: i64 },

	#[error("no copies of book {book_id} are available")]
	OutOfStock { book_id: i64 },

	#[error(transparent)]
	Validation(#[from] ValidationError),

	#[error("storage error: {0}")]
	Storage(#[from] sqlx::Error),
}

impl LibraryError {
	/// True for outcomes decided by the library's own rules rather than by
	/// a failing database.
	pub fn is_business_rule(&self) -> bool {
		!matches!(self, Self::Connection(_) | Self::Storage(_))
	}
}

pub type Result<T, E = LibraryError> = std::result::Result<T, E>;
