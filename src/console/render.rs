//! Plain-text screens for the console app.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::types::{Author, Book, GenreSales, Order, OrderDetail, TableCount};

const TITLE_WIDTH: usize = 30;

/// Grid table: `+---+` rules, `+===+` under the header.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
	let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
	for cells in rows {
		for (width, cell) in widths.iter_mut().zip(cells) {
			*width = (*width).max(cell.chars().count());
		}
	}

	let mut lines = vec![
		rule(&widths, '-'),
		row(&widths, headers.iter().copied()),
		rule(&widths, '='),
	];
	for cells in rows {
		lines.push(row(&widths, cells.iter().map(String::as_str)));
		lines.push(rule(&widths, '-'));
	}
	lines.join("\n")
}

fn rule(widths: &[usize], fill: char) -> String {
	let mut line = String::from("+");
	for width in widths {
		line.extend(std::iter::repeat(fill).take(width + 2));
		line.push('+');
	}
	line
}

fn row<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
	let mut line = String::from("|");
	for (width, cell) in widths.iter().zip(cells) {
		let pad = width.saturating_sub(cell.chars().count());
		line.push(' ');
		line.push_str(cell);
		line.extend(std::iter::repeat(' ').take(pad + 1));
		line.push('|');
	}
	line
}

pub fn money(value: f64) -> String {
	format!("{value:.2}")
}

fn short_title(title: &str) -> String {
	if title.chars().count() > TITLE_WIDTH {
		let cut: String = title.chars().take(TITLE_WIDTH).collect();
		format!("{cut}...")
	} else {
		title.to_string()
	}
}

fn or_dash(value: Option<impl ToString>) -> String {
	value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

pub fn splash(counts: &[TableCount], now: NaiveDateTime) -> String {
	let rows: Vec<Vec<String>> = counts
		.iter()
		.map(|c| {
			let status = if c.rows > 0 { "populated" } else { "empty" };
			vec![c.table.to_uppercase(), c.rows.to_string(), status.to_string()]
		})
		.collect();
	format!(
		"LIBRARY MANAGEMENT\n\n{}\n\nDate/time: {}",
		table(&["Table", "Rows", "Status"], &rows),
		now.format("%d/%m/%Y %H:%M:%S"),
	)
}

pub fn sales_by_genre(report: &[GenreSales]) -> String {
	if report.is_empty() {
		return "No sales recorded yet.".to_string();
	}
	let rows: Vec<Vec<String>> = report
		.iter()
		.map(|r| {
			vec![
				r.genre.clone(),
				r.sales_count.to_string(),
				r.quantity_sold.to_string(),
				money(r.total_value),
			]
		})
		.collect();
	let sales: i64 = report.iter().map(|r| r.sales_count).sum();
	let quantity: i64 = report.iter().map(|r| r.quantity_sold).sum();
	let value: f64 = report.iter().map(|r| r.total_value).sum();

	format!(
		"{}\n\nTotals: {sales} sale(s), {quantity} copies, value {}",
		table(&["Genre", "Sales", "Quantity", "Total value"], &rows),
		money(value),
	)
}

pub fn order_details(report: &[OrderDetail]) -> String {
	if report.is_empty() {
		return "No orders found.".to_string();
	}
	let rows: Vec<Vec<String>> = report
		.iter()
		.map(|r| {
			vec![
				r.order_id.to_string(),
				r.order_date.format("%d/%m/%Y").to_string(),
				r.customer_name.clone(),
				short_title(&r.title),
				r.author_name.clone(),
				r.quantity.to_string(),
				money(r.unit_price),
				money(r.subtotal),
			]
		})
		.collect();
	let orders: BTreeSet<i64> = report.iter().map(|r| r.order_id).collect();
	let value: f64 = report.iter().map(|r| r.subtotal).sum();

	format!(
		"{}\n\nTotals: {} order(s), {} line(s), value {}",
		table(
			&["Order", "Date", "Customer", "Book", "Author", "Qty", "Unit price", "Subtotal"],
			&rows,
		),
		orders.len(),
		report.len(),
		money(value),
	)
}

pub fn authors(authors: &[Author]) -> String {
	let rows: Vec<Vec<String>> = authors
		.iter()
		.map(|a| {
			vec![
				a.id.to_string(),
				a.name.clone(),
				or_dash(a.nationality.as_deref()),
				or_dash(a.birth_date.map(|d| d.format("%d/%m/%Y"))),
			]
		})
		.collect();
	table(&["ID", "Name", "Nationality", "Born"], &rows)
}

pub fn books(books: &[Book]) -> String {
	let rows: Vec<Vec<String>> = books
		.iter()
		.map(|b| {
			vec![
				b.id.to_string(),
				short_title(&b.title),
				b.author_name.clone(),
				b.genre.clone(),
				or_dash(b.publication_year),
				money(b.price),
				format!("{}/{}", b.available_copies, b.total_copies),
			]
		})
		.collect();
	table(&["ID", "Title", "Author", "Genre", "Year", "Price", "Copies"], &rows)
}

pub fn orders(orders: &[Order]) -> String {
	let rows: Vec<Vec<String>> = orders
		.iter()
		.map(|o| {
			vec![
				o.id.to_string(),
				o.order_date.format("%d/%m/%Y %H:%M").to_string(),
				o.customer_name.clone(),
				or_dash(o.customer_email.as_deref()),
				money(o.total_value),
			]
		})
		.collect();
	table(&["ID", "Date", "Customer", "Email", "Total"], &rows)
}
