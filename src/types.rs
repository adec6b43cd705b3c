use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use sqlx::FromRow;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::ValidationError;

pub type Aid = i64;
pub type Bid = i64;
pub type Lid = i64;
pub type Oid = i64;
pub type Iid = i64;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Author {
	pub id: Aid,
	pub name: String,
	pub nationality: Option<String>,
	pub birth_date: Option<NaiveDate>,
	pub biography: Option<String>,
}

/// Whole-row author data, used by insert and update alike.
#[derive(Debug, Clone, Default)]
pub struct NewAuthor {
	pub name: String,
	pub nationality: Option<String>,
	pub birth_date: Option<NaiveDate>,
	pub biography: Option<String>,
}

impl NewAuthor {
	pub fn new(name: impl Into<String>) -> Self {
		NewAuthor { name: name.into(), ..Default::default() }
	}

	pub fn validate(&self) -> Result<(), ValidationError> {
		required("name", &self.name)
	}
}

/// Book row joined with its author's name.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Book {
	pub id: Bid,
	pub title: String,
	pub author_id: Aid,
	pub author_name: String,
	pub genre: String,
	pub publication_year: Option<i64>,
	pub price: f64,
	pub total_copies: i64,
	pub available_copies: i64,
}

#[derive(Debug, Clone)]
pub struct NewBook {
	pub title: String,
	pub author_id: Aid,
	pub genre: String,
	pub publication_year: Option<i64>,
	pub price: f64,
	pub total_copies: i64,
	pub available_copies: i64,
}

impl NewBook {
	/// A fresh title with every copy on the shelf.
	pub fn with_copies(
		title: impl Into<String>,
		author_id: Aid,
		genre: impl Into<String>,
		copies: i64,
	) -> Self {
		NewBook {
			title: title.into(),
			author_id,
			genre: genre.into(),
			publication_year: None,
			price: 0.0,
			total_copies: copies,
			available_copies: copies,
		}
	}

	pub fn validate(&self) -> Result<(), ValidationError> {
		required("title", &self.title)?;
		required("genre", &self.genre)?;
		if !self.price.is_finite() {
			return Err(ValidationError::Malformed { field: "price", value: self.price.to_string() });
		}
		if self.price < 0.0 {
			return Err(ValidationError::Negative { field: "price" });
		}
		if self.total_copies < 0 {
			return Err(ValidationError::Negative { field: "total_copies" });
		}
		if self.available_copies < 0 {
			return Err(ValidationError::Negative { field: "available_copies" });
		}
		if self.available_copies > self.total_copies {
			return Err(ValidationError::Inconsistent {
				field: "available_copies",
				reason: "cannot exceed total_copies",
			});
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Loan {
	pub id: Lid,
	pub book_id: Bid,
	pub borrower_name: String,
	pub checkout_date: NaiveDate,
}

/// Active loan with the borrowed book's title, as listed on the index page.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct LoanEntry {
	pub id: Lid,
	pub book_id: Bid,
	pub title: String,
	pub borrower_name: String,
	pub checkout_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Order {
	pub id: Oid,
	pub order_date: NaiveDateTime,
	pub customer_name: String,
	pub customer_email: Option<String>,
	pub total_value: f64,
}

#[derive(Debug, Clone, Default)]
pub struct NewOrder {
	pub customer_name: String,
	pub customer_email: Option<String>,
}

impl NewOrder {
	pub fn new(customer_name: impl Into<String>) -> Self {
		NewOrder { customer_name: customer_name.into(), customer_email: None }
	}

	pub fn validate(&self) -> Result<(), ValidationError> {
		required("customer_name", &self.customer_name)?;
		match &self.customer_email {
			Some(email) if !email.contains('@') => Err(ValidationError::Malformed {
				field: "customer_email",
				value: email.clone(),
			}),
			_ => Ok(()),
		}
	}
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OrderItem {
	pub id: Iid,
	pub order_id: Oid,
	pub book_id: Bid,
	pub quantity: i64,
	pub unit_price: f64,
	pub subtotal: f64,
}

/// The unit price is taken from the book when the item is written.
#[derive(Debug, Clone, Copy)]
pub struct NewOrderItem {
	pub order_id: Oid,
	pub book_id: Bid,
	pub quantity: i64,
}

impl NewOrderItem {
	pub fn validate(&self) -> Result<(), ValidationError> {
		if self.quantity <= 0 {
			return Err(ValidationError::NotPositive { field: "quantity" });
		}
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct GenreSales {
	pub genre: String,
	pub sales_count: i64,
	pub quantity_sold: i64,
	pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OrderDetail {
	pub order_id: Oid,
	pub order_date: NaiveDateTime,
	pub customer_name: String,
	pub title: String,
	pub author_name: String,
	pub quantity: i64,
	pub unit_price: f64,
	pub subtotal: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCount {
	pub table: &'static str,
	pub rows: i64,
}

#[derive(Debug, Deserialize)]
pub struct NewBookForm {
	pub title: String,
	pub author_id: Aid,
	pub genre: String,
	pub copies: i64,
	#[serde(default, deserialize_with = "empty_as_none")]
	pub price: Option<f64>,
	#[serde(default, deserialize_with = "empty_as_none")]
	pub publication_year: Option<i64>,
}

impl NewBookForm {
	pub fn into_new_book(self) -> NewBook {
		let mut book = NewBook::with_copies(self.title.trim(), self.author_id, self.genre.trim(), self.copies);
		book.price = self.price.unwrap_or(0.0);
		book.publication_year = self.publication_year;
		book
	}
}

#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
	pub borrower_name: String,
}

/// Empty or whitespace-only optional text is stored as NULL.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
	value
		.map(|v| v.trim().to_owned())
		.filter(|v| !v.is_empty())
}

// html forms submit untouched optional inputs as ""
fn empty_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
	D: Deserializer<'de>,
	T: FromStr,
	T::Err: Display,
{
	let raw: Option<String> = Option::deserialize(de)?;
	match raw.as_deref().map(str::trim) {
		None | Some("") => Ok(None),
		Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
	}
}

fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() {
		return Err(ValidationError::Empty { field });
	}
	Ok(())
}
