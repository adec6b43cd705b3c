use sqlx::Connection;

use super::row_exists;
use crate::db::ConnectionProvider;
use crate::error::{LibraryError, Result};
use crate::types::{blank_to_none, NewOrder, NewOrderItem, Oid, Order, OrderItem};

pub struct OrderRepo<'a> {
	db: &'a dyn ConnectionProvider,
}

impl<'a> OrderRepo<'a> {
	pub fn new(db: &'a dyn ConnectionProvider) -> Self {
		Self { db }
	}

	/// New orders start empty, with a total of zero.
	pub async fn insert(&self, order: &NewOrder) -> Result<Oid> {
		let email = blank_to_none(order.customer_email.clone());
		let order = NewOrder { customer_email: email, ..order.clone() };
		order.validate()?;
		let mut conn = self.db.acquire().await?;

		let id: Oid = sqlx::query_scalar(
			r#"
			INSERT INTO orders (customer_name, customer_email, total_value)
			VALUES (?, ?, 0.0)
			RETURNING id
			"#,
		)
		.bind(order.customer_name.trim())
		.bind(order.customer_email.as_deref())
		.fetch_one(&mut *conn)
		.await?;

		tracing::info!(order_id = id, "order inserted");
		Ok(id)
	}

	/// All orders, newest first.
	pub async fn list(&self) -> Result<Vec<Order>> {
		let mut conn = self.db.acquire().await?;
		let orders = sqlx::query_as::<_, Order>(
			r#"
			SELECT id, order_date, customer_name, customer_email, total_value
			FROM orders
			ORDER BY order_date DESC, id DESC
			"#,
		)
		.fetch_all(&mut *conn)
		.await?;
		Ok(orders)
	}

	pub async fn get(&self, id: Oid) -> Result<Option<Order>> {
		let mut conn = self.db.acquire().await?;
		let order = sqlx::query_as::<_, Order>(
			"SELECT id, order_date, customer_name, customer_email, total_value FROM orders WHERE id = ?",
		)
		.bind(id)
		.fetch_optional(&mut *conn)
		.await?;
		Ok(order)
	}

	/// Replace the customer fields; the total stays derived from the items.
	pub async fn update(&self, id: Oid, order: &NewOrder) -> Result<()> {
		let email = blank_to_none(order.customer_email.clone());
		let order = NewOrder { customer_email: email, ..order.clone() };
		order.validate()?;
		let mut conn = self.db.acquire().await?;

		let updated = sqlx::query("UPDATE orders SET customer_name = ?, customer_email = ? WHERE id = ?")
			.bind(order.customer_name.trim())
			.bind(order.customer_email.as_deref())
			.bind(id)
			.execute(&mut *conn)
			.await?
			.rows_affected();
		if updated == 0 {
			return Err(LibraryError::NotFound { resource: "order", id });
		}
		tracing::info!(order_id = id, "order updated");
		Ok(())
	}

	/// Delete an order; its items go with it through `ON DELETE CASCADE`.
	pub async fn remove(&self, id: Oid) -> Result<()> {
		let mut conn = self.db.acquire().await?;
		let deleted = sqlx::query("DELETE FROM orders WHERE id = ?")
			.bind(id)
			.execute(&mut *conn)
			.await?
			.rows_affected();
		if deleted == 0 {
			return Err(LibraryError::NotFound { resource: "order", id });
		}
		tracing::info!(order_id = id, "order removed");
		Ok(())
	}

	/// Add a line at the book's current price and refresh the order total.
	pub async fn add_item(&self, item: &NewOrderItem) -> Result<OrderItem> {
		item.validate()?;
		let mut conn = self.db.acquire().await?;
		let mut tx = conn.begin().await?;

		if !row_exists(&mut tx, "orders", item.order_id).await? {
			return Err(LibraryError::ReferenceNotFound { resource: "order", id: item.order_id });
		}
		let unit_price: f64 = sqlx::query_scalar("SELECT price FROM books WHERE id = ?")
			.bind(item.book_id)
			.fetch_optional(&mut *tx)
			.await?
			.ok_or(LibraryError::ReferenceNotFound { resource: "book", id: item.book_id })?;

		let subtotal = item.quantity as f64 * unit_price;
		let line = sqlx::query_as::<_, OrderItem>(
			r#"
			INSERT INTO order_items (order_id, book_id, quantity, unit_price, subtotal)
			VALUES (?, ?, ?, ?, ?)
			RETURNING id, order_id, book_id, quantity, unit_price, subtotal
			"#,
		)
		.bind(item.order_id)
		.bind(item.book_id)
		.bind(item.quantity)
		.bind(unit_price)
		.bind(subtotal)
		.fetch_one(&mut *tx)
		.await?;

		sqlx::query(
			r#"
			UPDATE orders SET total_value = (
				SELECT COALESCE(SUM(subtotal), 0.0) FROM order_items WHERE order_id = ?
			)
			WHERE id = ?
			"#,
		)
		.bind(item.order_id)
		.bind(item.order_id)
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;
		tracing::info!(order_id = item.order_id, item_id = line.id, "order item added");
		Ok(line)
	}

	pub async fn items(&self, order_id: Oid) -> Result<Vec<OrderItem>> {
		let mut conn = self.db.acquire().await?;
		let items = sqlx::query_as::<_, OrderItem>(
			r#"
			SELECT id, order_id, book_id, quantity, unit_price, subtotal
			FROM order_items
			WHERE order_id = ?
			ORDER BY id
			"#,
		)
		.bind(order_id)
		.fetch_all(&mut *conn)
		.await?;
		Ok(items)
	}
}
