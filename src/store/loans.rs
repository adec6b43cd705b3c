use sqlx::Connection;

use super::row_exists;
use crate::db::ConnectionProvider;
use crate::error::{LibraryError, Result, ValidationError};
use crate::types::{Bid, Lid, Loan, LoanEntry};

pub struct LoanRepo<'a> {
	db: &'a dyn ConnectionProvider,
}

impl<'a> LoanRepo<'a> {
	pub fn new(db: &'a dyn ConnectionProvider) -> Self {
		Self { db }
	}

	/// Lend one copy of `book_id` to `borrower_name`.
	///
	/// The decrement only matches while a copy is left, so two checkouts
	/// racing for the last copy cannot both succeed; the loser gets
	/// `OutOfStock` and nothing is written.
	pub async fn checkout(&self, book_id: Bid, borrower_name: &str) -> Result<Loan> {
		let borrower_name = borrower_name.trim();
		if borrower_name.is_empty() {
			return Err(ValidationError::Empty { field: "borrower_name" }.into());
		}

		let mut conn = self.db.acquire().await?;
		let mut tx = conn.begin().await?;

		let taken = sqlx::query(
			r#"
			UPDATE books SET available_copies = available_copies - 1
			WHERE id = ? AND available_copies > 0
			"#,
		)
		.bind(book_id)
		.execute(&mut *tx)
		.await?
		.rows_affected();

		if taken == 0 {
			let err = if row_exists(&mut tx, "books", book_id).await? {
				LibraryError::OutOfStock { book_id }
			} else {
				LibraryError::NotFound { resource: "book", id: book_id }
			};
			tracing::warn!(book_id, %err, "checkout rejected");
			return Err(err);
		}

		let loan = sqlx::query_as::<_, Loan>(
			r#"
			INSERT INTO loans (book_id, borrower_name)
			VALUES (?, ?)
			RETURNING id, book_id, borrower_name, checkout_date
			"#,
		)
		.bind(book_id)
		.bind(borrower_name)
		.fetch_one(&mut *tx)
		.await?;

		tx.commit().await?;
		tracing::info!(book_id, loan_id = loan.id, "book checked out");
		Ok(loan)
	}

	/// Close loan `loan_id` and put its copy back on the shelf.
	pub async fn return_loan(&self, loan_id: Lid) -> Result<Loan> {
		let mut conn = self.db.acquire().await?;
		let mut tx = conn.begin().await?;

		let loan = sqlx::query_as::<_, Loan>(
			"DELETE FROM loans WHERE id = ? RETURNING id, book_id, borrower_name, checkout_date",
		)
		.bind(loan_id)
		.fetch_optional(&mut *tx)
		.await?
		.ok_or(LibraryError::NotFound { resource: "loan", id: loan_id })?;

		let restored = sqlx::query(
			r#"
			UPDATE books SET available_copies = available_copies + 1
			WHERE id = ? AND available_copies < total_copies
			"#,
		)
		.bind(loan.book_id)
		.execute(&mut *tx)
		.await?
		.rows_affected();

		// counters edited outside the library may leave no copy missing
		if restored == 0 {
			tracing::warn!(loan_id, book_id = loan.book_id, "return rejected, no copy is missing");
			return Err(ValidationError::Inconsistent {
				field: "available_copies",
				reason: "every copy of this book is already on the shelf",
			}
			.into());
		}

		tx.commit().await?;
		tracing::info!(loan_id, book_id = loan.book_id, "book returned");
		Ok(loan)
	}

	/// Active loans with book titles, oldest first.
	pub async fn list(&self) -> Result<Vec<LoanEntry>> {
		let mut conn = self.db.acquire().await?;
		let loans = sqlx::query_as::<_, LoanEntry>(
			r#"
			SELECT l.id, l.book_id, b.title, l.borrower_name, l.checkout_date
			FROM loans l
				INNER JOIN books b ON b.id = l.book_id
			ORDER BY l.checkout_date, l.id
			"#,
		)
		.fetch_all(&mut *conn)
		.await?;
		Ok(loans)
	}
}
