use sqlx::Connection;

use super::count_referencing;
use crate::db::ConnectionProvider;
use crate::error::{LibraryError, Result};
use crate::types::{blank_to_none, Aid, Author, NewAuthor};

pub struct AuthorRepo<'a> {
	db: &'a dyn ConnectionProvider,
}

impl<'a> AuthorRepo<'a> {
	pub fn new(db: &'a dyn ConnectionProvider) -> Self {
		Self { db }
	}

	pub async fn insert(&self, author: &NewAuthor) -> Result<Aid> {
		author.validate()?;
		let mut conn = self.db.acquire().await?;

		let id: Aid = sqlx::query_scalar(
			r#"
			INSERT INTO authors (name, nationality, birth_date, biography)
			VALUES (?, ?, ?, ?)
			RETURNING id
			"#,
		)
		.bind(author.name.trim())
		.bind(blank_to_none(author.nationality.clone()))
		.bind(author.birth_date)
		.bind(blank_to_none(author.biography.clone()))
		.fetch_one(&mut *conn)
		.await?;

		tracing::info!(author_id = id, "author inserted");
		Ok(id)
	}

	/// All authors, by name.
	pub async fn list(&self) -> Result<Vec<Author>> {
		let mut conn = self.db.acquire().await?;
		let authors = sqlx::query_as::<_, Author>(
			"SELECT id, name, nationality, birth_date, biography FROM authors ORDER BY name, id",
		)
		.fetch_all(&mut *conn)
		.await?;
		Ok(authors)
	}

	pub async fn get(&self, id: Aid) -> Result<Option<Author>> {
		let mut conn = self.db.acquire().await?;
		let author = sqlx::query_as::<_, Author>(
			"SELECT id, name, nationality, birth_date, biography FROM authors WHERE id = ?",
		)
		.bind(id)
		.fetch_optional(&mut *conn)
		.await?;
		Ok(author)
	}

	pub async fn update(&self, id: Aid, author: &NewAuthor) -> Result<()> {
		author.validate()?;
		let mut conn = self.db.acquire().await?;

		let updated = sqlx::query(
			r#"
			UPDATE authors
			SET name = ?, nationality = ?, birth_date = ?, biography = ?
			WHERE id = ?
			"#,
		)
		.bind(author.name.trim())
		.bind(blank_to_none(author.nationality.clone()))
		.bind(author.birth_date)
		.bind(blank_to_none(author.biography.clone()))
		.bind(id)
		.execute(&mut *conn)
		.await?
		.rows_affected();

		if updated == 0 {
			return Err(LibraryError::NotFound { resource: "author", id });
		}
		tracing::info!(author_id = id, "author updated");
		Ok(())
	}

	/// Refused while any book still names this author.
	pub async fn remove(&self, id: Aid) -> Result<()> {
		let mut conn = self.db.acquire().await?;
		let mut tx = conn.begin().await?;

		let books = count_referencing(&mut tx, "books", "author_id", id).await?;
		if books > 0 {
			tracing::warn!(author_id = id, books, "author removal blocked");
			return Err(LibraryError::DependencyExists {
				resource: "author",
				id,
				dependent: "book(s)",
				count: books,
			});
		}

		let deleted = sqlx::query("DELETE FROM authors WHERE id = ?")
			.bind(id)
			.execute(&mut *tx)
			.await?
			.rows_affected();
		if deleted == 0 {
			return Err(LibraryError::NotFound { resource: "author", id });
		}

		tx.commit().await?;
		tracing::info!(author_id = id, "author removed");
		Ok(())
	}
}
