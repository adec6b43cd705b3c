//! HTML front-end: book and loan listing plus the add / lend / return /
//! delete actions. Every action redirects back to `/` with a flash message.

use axum::{
	extract::{rejection::FormRejection, Path, State},
	http::StatusCode,
	response::{IntoResponse, Redirect, Response},
	routing::{get, post},
	Form, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use maud::{html, Markup, DOCTYPE};
use tower_cookies::{Cookie, CookieManagerLayer, Cookies};
use tower_http::trace::TraceLayer;

use crate::error::{LibraryError, ValidationError};
use crate::store::Library;
use crate::types::{Author, Bid, Book, CheckoutForm, Lid, LoanEntry, NewBookForm};

pub const FLASH_COOKIE: &str = "flash";

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 2em; }
table { border-collapse: collapse; margin-bottom: 2em; }
td, th { border: 1px solid #ccc; padding: .3em .6em; }
.flash { padding: .6em; margin-bottom: 1em; }
.success { background: #d4edda; }
.warning { background: #fff3cd; }
.danger { background: #f8d7da; }
form.inline { display: inline; }
"#;

pub fn router(library: Library) -> Router {
	Router::new()
		.route("/", get(index))
		.route("/healthz", get(healthz))
		.route("/book/add", post(add_book))
		.route("/book/checkout/:id", post(checkout_book))
		.route("/loan/return/:id", post(return_book))
		.route("/book/delete/:id", post(delete_book))
		.layer(CookieManagerLayer::new())
		.layer(TraceLayer::new_for_http())
		.with_state(library)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
	Success,
	Warning,
	Danger,
}

impl FlashKind {
	pub fn as_str(self) -> &'static str {
		match self {
			FlashKind::Success => "success",
			FlashKind::Warning => "warning",
			FlashKind::Danger => "danger",
		}
	}

	fn parse(raw: &str) -> Option<Self> {
		match raw {
			"success" => Some(FlashKind::Success),
			"warning" => Some(FlashKind::Warning),
			"danger" => Some(FlashKind::Danger),
			_ => None,
		}
	}
}

/// One-shot message carried across the redirect in a cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
	pub kind: FlashKind,
	pub message: String,
}

impl Flash {
	pub fn success(message: impl Into<String>) -> Self {
		Flash { kind: FlashKind::Success, message: message.into() }
	}

	/// Running out of copies is only a warning; any other failure is shown
	/// as an error.
	pub fn from_error(err: &LibraryError) -> Self {
		let kind = match err {
			LibraryError::OutOfStock { .. } => FlashKind::Warning,
			_ => FlashKind::Danger,
		};
		if err.is_business_rule() {
			tracing::warn!(error = %err, "request rejected");
		} else {
			tracing::error!(error = %err, "request failed");
		}
		Flash { kind, message: err.to_string() }
	}

	// base64 keeps ';', ',' and quotes in messages out of the cookie value
	pub fn encode(&self) -> String {
		URL_SAFE_NO_PAD.encode(format!("{}\n{}", self.kind.as_str(), self.message))
	}

	pub fn decode(raw: &str) -> Option<Self> {
		let bytes = URL_SAFE_NO_PAD.decode(raw).ok()?;
		let text = String::from_utf8(bytes).ok()?;
		let (kind, message) = text.split_once('\n')?;
		Some(Flash { kind: FlashKind::parse(kind)?, message: message.to_owned() })
	}
}

fn set_flash(cookies: &Cookies, flash: Flash) {
	cookies.add(
		Cookie::build((FLASH_COOKIE, flash.encode()))
			.path("/")
			.http_only(true)
			.into(),
	);
}

fn take_flash(cookies: &Cookies) -> Option<Flash> {
	let raw = cookies.get(FLASH_COOKIE)?;
	cookies.remove(Cookie::build(FLASH_COOKIE).path("/").into());
	Flash::decode(raw.value())
}

fn finish<T>(cookies: &Cookies, result: Result<T, LibraryError>, ok: impl FnOnce(T) -> String) -> Redirect {
	let flash = match result {
		Ok(value) => Flash::success(ok(value)),
		Err(e) => Flash::from_error(&e),
	};
	set_flash(cookies, flash);
	Redirect::to("/")
}

// undecodable bodies (blank or non-numeric fields) go through the flash too
fn form_input<T>(form: Result<Form<T>, FormRejection>) -> Result<T, LibraryError> {
	form.map(|Form(value)| value).map_err(|rejection| {
		ValidationError::Malformed { field: "form", value: rejection.body_text() }.into()
	})
}

/// A page that could not be built at all.
#[derive(Debug)]
pub struct WebError(LibraryError);

impl From<LibraryError> for WebError {
	fn from(e: LibraryError) -> Self {
		WebError(e)
	}
}

impl IntoResponse for WebError {
	fn into_response(self) -> Response {
		tracing::error!(error = %self.0, "page failed");
		let status = match self.0 {
			LibraryError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		};
		let body = layout(html! {
			div class="flash danger" { "The library is unavailable right now: " (self.0) }
		});
		(status, body).into_response()
	}
}

async fn index(State(library): State<Library>, cookies: Cookies) -> Result<Markup, WebError> {
	let books = library.books().list().await?;
	let loans = library.loans().list().await?;
	let authors = library.authors().list().await?;
	let flash = take_flash(&cookies);

	Ok(index_page(flash.as_ref(), &books, &loans, &authors))
}

async fn healthz(State(library): State<Library>) -> Response {
	match library.test_connection().await {
		Ok(version) => (StatusCode::OK, version).into_response(),
		Err(e) => {
			tracing::error!(error = %e, "health check failed");
			(StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
		}
	}
}

async fn add_book(
	State(library): State<Library>,
	cookies: Cookies,
	form: Result<Form<NewBookForm>, FormRejection>,
) -> Redirect {
	let result = match form_input(form) {
		Ok(form) if form.copies <= 0 => Err(ValidationError::NotPositive { field: "copies" }.into()),
		Ok(form) => library.books().insert(&form.into_new_book()).await,
		Err(e) => Err(e),
	};
	finish(&cookies, result, |id| format!("Book added (id {id})."))
}

async fn checkout_book(
	State(library): State<Library>,
	cookies: Cookies,
	Path(book_id): Path<Bid>,
	form: Result<Form<CheckoutForm>, FormRejection>,
) -> Redirect {
	let result = match form_input(form) {
		Ok(form) => library.loans().checkout(book_id, &form.borrower_name).await,
		Err(e) => Err(e),
	};
	finish(&cookies, result, |loan| format!("Book lent to {}.", loan.borrower_name))
}

async fn return_book(
	State(library): State<Library>,
	cookies: Cookies,
	Path(loan_id): Path<Lid>,
) -> Redirect {
	let result = library.loans().return_loan(loan_id).await;
	finish(&cookies, result, |_| "Book returned.".to_string())
}

async fn delete_book(
	State(library): State<Library>,
	cookies: Cookies,
	Path(book_id): Path<Bid>,
) -> Redirect {
	let result = library.books().remove(book_id).await;
	finish(&cookies, result, |_| "Book deleted.".to_string())
}

fn layout(content: Markup) -> Markup {
	html! {
		(DOCTYPE)
		html {
			head {
				meta charset="utf-8";
				title { "libdesk" }
				style { (STYLE) }
			}
			body {
				h1 { "Library" }
				(content)
			}
		}
	}
}

fn index_page(flash: Option<&Flash>, books: &[Book], loans: &[LoanEntry], authors: &[Author]) -> Markup {
	layout(html! {
		@if let Some(flash) = flash {
			div class={ "flash " (flash.kind.as_str()) } { (flash.message) }
		}

		h2 { "Books" }
		table {
			thead { tr {
				th { "Title" }
				th { "Author" }
				th { "Genre" }
				th { "Available" }
				th { "Lend" }
				th {}
			} }
			tbody {
				@for book in books {
					tr {
						td { (book.title) }
						td { (book.author_name) }
						td { (book.genre) }
						td { (book.available_copies) " / " (book.total_copies) }
						td {
							@if book.available_copies > 0 {
								form.inline method="post" action={ "/book/checkout/" (book.id) } {
									input name="borrower_name" placeholder="borrower" required;
									button { "Lend" }
								}
							} @else {
								"none left"
							}
						}
						td {
							form.inline method="post" action={ "/book/delete/" (book.id) } {
								button { "Delete" }
							}
						}
					}
				}
			}
		}

		h2 { "Loans" }
		table {
			thead { tr {
				th { "Book" }
				th { "Borrower" }
				th { "Since" }
				th {}
			} }
			tbody {
				@for loan in loans {
					tr {
						td { (loan.title) }
						td { (loan.borrower_name) }
						td { (loan.checkout_date.format("%d/%m/%Y")) }
						td {
							form.inline method="post" action={ "/loan/return/" (loan.id) } {
								button { "Return" }
							}
						}
					}
				}
			}
		}

		h2 { "Add a book" }
		@if authors.is_empty() {
			p { "Register an author first." }
		} @else {
			form method="post" action="/book/add" {
				input name="title" placeholder="title" required;
				select name="author_id" {
					@for author in authors {
						option value=(author.id) { (author.name) }
					}
				}
				input name="genre" placeholder="genre" required;
				input name="copies" type="number" min="1" value="1" required;
				input name="price" type="number" min="0" step="0.01" placeholder="price";
				input name="publication_year" type="number" placeholder="year";
				button { "Add" }
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flash_survives_cookie_encoding() {
		let flash = Flash {
			kind: FlashKind::Warning,
			message: "no copies; try \"later\", please".into(),
		};
		let encoded = flash.encode();
		assert!(!encoded.contains(';'));
		assert!(!encoded.contains('"'));
		assert_eq!(Flash::decode(&encoded), Some(flash));
	}

	#[test]
	fn garbage_flash_is_ignored() {
		assert_eq!(Flash::decode("not base64!"), None);
		assert_eq!(Flash::decode(&URL_SAFE_NO_PAD.encode("bogus\nmessage")), None);
	}

	#[test]
	fn out_of_stock_is_a_warning() {
		let flash = Flash::from_error(&LibraryError::OutOfStock { book_id: 3 });
		assert_eq!(flash.kind, FlashKind::Warning);

		let flash = Flash::from_error(&LibraryError::NotFound { resource: "loan", id: 9 });
		assert_eq!(flash.kind, FlashKind::Danger);
		assert_eq!(flash.message, "loan 9 not found");
	}

	#[test]
	fn sold_out_books_have_no_lend_form() {
		let book = Book {
			id: 7,
			title: "Iracema".into(),
			author_id: 1,
			author_name: "José de Alencar".into(),
			genre: "Novel".into(),
			publication_year: Some(1865),
			price: 20.0,
			total_copies: 1,
			available_copies: 0,
		};
		let page = index_page(None, &[book], &[], &[]).into_string();
		assert!(page.contains("Iracema"));
		assert!(page.contains("none left"));
		assert!(!page.contains("/book/checkout/7"));
		assert!(page.contains("Register an author first."));
	}
}
