use sqlx::{Connection, SqliteConnection};

use super::{count_referencing, row_exists};
use crate::db::ConnectionProvider;
use crate::error::{LibraryError, Result, ValidationError};
use crate::types::{Aid, Bid, Book, NewBook};

const SELECT_BOOK: &str = r#"
SELECT
	b.id, b.title, b.author_id, a.name AS author_name, b.genre,
	b.publication_year, b.price, b.total_copies, b.available_copies
FROM books b
	INNER JOIN authors a ON a.id = b.author_id
"#;

pub struct BookRepo<'a> {
	db: &'a dyn ConnectionProvider,
}

impl<'a> BookRepo<'a> {
	pub fn new(db: &'a dyn ConnectionProvider) -> Self {
		Self { db }
	}

	/// Insert a book whose author must already exist.
	pub async fn insert(&self, book: &NewBook) -> Result<Bid> {
		book.validate()?;
		let mut conn = self.db.acquire().await?;
		let mut tx = conn.begin().await?;

		ensure_author(&mut tx, book.author_id).await?;

		let id: Bid = sqlx::query_scalar(
			r#"
			INSERT INTO books
				(title, author_id, genre, publication_year, price, total_copies, available_copies)
			VALUES
				(?, ?, ?, ?, ?, ?, ?)
			RETURNING id
			"#,
		)
		.bind(book.title.trim())
		.bind(book.author_id)
		.bind(book.genre.trim())
		.bind(book.publication_year)
		.bind(book.price)
		.bind(book.total_copies)
		.bind(book.available_copies)
		.fetch_one(&mut *tx)
		.await?;

		tx.commit().await?;
		tracing::info!(book_id = id, author_id = book.author_id, "book inserted");
		Ok(id)
	}

	/// All books with their author's name, by title.
	pub async fn list(&self) -> Result<Vec<Book>> {
		let mut conn = self.db.acquire().await?;
		let books = sqlx::query_as::<_, Book>(&format!("{SELECT_BOOK} ORDER BY b.title, b.id"))
			.fetch_all(&mut *conn)
			.await?;
		Ok(books)
	}

	pub async fn get(&self, id: Bid) -> Result<Option<Book>> {
		let mut conn = self.db.acquire().await?;
		let book = sqlx::query_as::<_, Book>(&format!("{SELECT_BOOK} WHERE b.id = ?"))
			.bind(id)
			.fetch_optional(&mut *conn)
			.await?;
		Ok(book)
	}

	/// Replace every column of book `id`; the author is checked again.
	///
	/// Copies out on loan stay off the shelf: the new counts must leave at
	/// least one missing copy per active loan.
	pub async fn update(&self, id: Bid, book: &NewBook) -> Result<()> {
		book.validate()?;
		let mut conn = self.db.acquire().await?;
		let mut tx = conn.begin().await?;

		ensure_author(&mut tx, book.author_id).await?;

		let lent = count_referencing(&mut tx, "loans", "book_id", id).await?;
		if book.total_copies - book.available_copies < lent {
			tracing::warn!(book_id = id, lent, "book update would shelve lent copies");
			return Err(ValidationError::Inconsistent {
				field: "available_copies",
				reason: "copies out on loan cannot be put back on the shelf",
			}
			.into());
		}

		let updated = sqlx::query(
			r#"
			UPDATE books SET
				title = ?, author_id = ?, genre = ?, publication_year = ?,
				price = ?, total_copies = ?, available_copies = ?
			WHERE id = ?
			"#,
		)
		.bind(book.title.trim())
		.bind(book.author_id)
		.bind(book.genre.trim())
		.bind(book.publication_year)
		.bind(book.price)
		.bind(book.total_copies)
		.bind(book.available_copies)
		.bind(id)
		.execute(&mut *tx)
		.await?
		.rows_affected();
		if updated == 0 {
			return Err(LibraryError::NotFound { resource: "book", id });
		}

		tx.commit().await?;
		tracing::info!(book_id = id, "book updated");
		Ok(())
	}

	/// Refused while the book appears in an order or is out on loan.
	pub async fn remove(&self, id: Bid) -> Result<()> {
		let mut conn = self.db.acquire().await?;
		let mut tx = conn.begin().await?;

		for (table, dependent) in [("order_items", "order item(s)"), ("loans", "loan(s)")] {
			let count = count_referencing(&mut tx, table, "book_id", id).await?;
			if count > 0 {
				tracing::warn!(book_id = id, count, dependent, "book removal blocked");
				return Err(LibraryError::DependencyExists { resource: "book", id, dependent, count });
			}
		}

		let deleted = sqlx::query("DELETE FROM books WHERE id = ?")
			.bind(id)
			.execute(&mut *tx)
			.await?
			.rows_affected();
		if deleted == 0 {
			return Err(LibraryError::NotFound { resource: "book", id });
		}

		tx.commit().await?;
		tracing::info!(book_id = id, "book removed");
		Ok(())
	}
}

async fn ensure_author(conn: &mut SqliteConnection, author_id: Aid) -> Result<()> {
	if !row_exists(conn, "authors", author_id).await? {
		tracing::warn!(author_id, "book references a missing author");
		return Err(LibraryError::ReferenceNotFound { resource: "author", id: author_id });
	}
	Ok(())
}
