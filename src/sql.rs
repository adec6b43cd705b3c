use sqlx::{Connection, SqliteConnection};

use crate::error::Result;

pub const AUTHORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS authors (
	id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	name TEXT NOT NULL,
	nationality TEXT DEFAULT NULL,
	birth_date DATE DEFAULT NULL,
	biography TEXT DEFAULT NULL
);
"#;

pub const BOOKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS books (
	id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	title TEXT NOT NULL,
	author_id INTEGER NOT NULL,
	genre TEXT NOT NULL,
	publication_year INTEGER DEFAULT NULL,
	price REAL NOT NULL DEFAULT 0.0,
	total_copies INTEGER NOT NULL,
	available_copies INTEGER NOT NULL,
	CHECK(price >= 0),
	CHECK(available_copies >= 0),
	CHECK(available_copies <= total_copies),
	FOREIGN KEY(author_id) REFERENCES authors(id)
);
"#;

pub const LOANS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS loans (
	id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	book_id INTEGER NOT NULL,
	borrower_name TEXT NOT NULL,
	checkout_date DATE NOT NULL DEFAULT CURRENT_DATE,
	FOREIGN KEY(book_id) REFERENCES books(id)
);
"#;

pub const ORDERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
	id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	order_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
	customer_name TEXT NOT NULL,
	customer_email TEXT DEFAULT NULL,
	total_value REAL NOT NULL DEFAULT 0.0
);
"#;

pub const ORDER_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS order_items (
	id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	order_id INTEGER NOT NULL,
	book_id INTEGER NOT NULL,
	quantity INTEGER NOT NULL,
	unit_price REAL NOT NULL,
	subtotal REAL NOT NULL,
	CHECK(quantity > 0),
	FOREIGN KEY(order_id) REFERENCES orders(id) ON DELETE CASCADE,
	FOREIGN KEY(book_id) REFERENCES books(id)
);
"#;

/// Creation order matters: every table comes after the ones it references.
pub const TABLE_SCHEMA: [&str; 5] = [
	AUTHORS_TABLE,
	BOOKS_TABLE,
	LOANS_TABLE,
	ORDERS_TABLE,
	ORDER_ITEMS_TABLE,
];

/// Tables reported on the console splash screen.
pub const COUNTED_TABLES: [&str; 5] = ["authors", "books", "loans", "orders", "order_items"];

/// Create every table that does not exist yet; safe to run on each start.
pub async fn init_schema(conn: &mut SqliteConnection) -> Result<()> {
	let mut tx = conn.begin().await?;
	for ddl in TABLE_SCHEMA {
		sqlx::query(ddl).execute(&mut *tx).await?;
	}
	tx.commit().await?;
	Ok(())
}

/*

[console] sales by genre
SELECT b.genre, COUNT(i.id), SUM(i.quantity), SUM(i.subtotal)
FROM books b
	INNER JOIN order_items i ON i.book_id = b.id
GROUP BY b.genre;

[web] checkout -- only succeeds while a copy is left
UPDATE books SET available_copies = available_copies - 1
WHERE id = ? AND available_copies > 0;

[web] return
DELETE FROM loans WHERE id = ? RETURNING book_id;
UPDATE books SET available_copies = available_copies + 1
WHERE id = ? AND available_copies < total_copies;

*/
