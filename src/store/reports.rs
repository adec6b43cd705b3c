use crate::db::ConnectionProvider;
use crate::error::Result;
use crate::types::{GenreSales, OrderDetail};

/// Read-only aggregate queries over orders and their items.
pub struct ReportRepo<'a> {
	db: &'a dyn ConnectionProvider,
}

impl<'a> ReportRepo<'a> {
	pub fn new(db: &'a dyn ConnectionProvider) -> Self {
		Self { db }
	}

	/// One row per genre that sold anything, best-selling by value first.
	pub async fn sales_by_genre(&self) -> Result<Vec<GenreSales>> {
		let mut conn = self.db.acquire().await?;
		let rows = sqlx::query_as::<_, GenreSales>(
			r#"
			SELECT
				b.genre AS genre,
				COUNT(i.id) AS sales_count,
				SUM(i.quantity) AS quantity_sold,
				SUM(i.subtotal) AS total_value
			FROM books b
				INNER JOIN order_items i ON i.book_id = b.id
			GROUP BY b.genre
			ORDER BY total_value DESC, b.genre
			"#,
		)
		.fetch_all(&mut *conn)
		.await?;
		tracing::debug!(genres = rows.len(), "sales by genre");
		Ok(rows)
	}

	/// Every order line with its order, book and author.
	pub async fn order_details(&self) -> Result<Vec<OrderDetail>> {
		let mut conn = self.db.acquire().await?;
		let rows = sqlx::query_as::<_, OrderDetail>(
			r#"
			SELECT
				o.id AS order_id, o.order_date, o.customer_name,
				b.title, a.name AS author_name,
				i.quantity, i.unit_price, i.subtotal
			FROM orders o
				INNER JOIN order_items i ON i.order_id = o.id
				INNER JOIN books b ON b.id = i.book_id
				INNER JOIN authors a ON a.id = b.author_id
			ORDER BY o.order_date DESC, o.id, i.id
			"#,
		)
		.fetch_all(&mut *conn)
		.await?;
		tracing::debug!(lines = rows.len(), "detailed orders");
		Ok(rows)
	}
}
