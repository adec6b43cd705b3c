//! Web routes driven through the router, without a listening socket.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use libdesk::config::DbConfig;
use libdesk::types::{Bid, NewAuthor, NewBook};
use libdesk::web::{self, Flash, FlashKind};
use libdesk::Library;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
	_dir: TempDir,
	library: Library,
	router: Router,
}

async fn app() -> TestApp {
	let dir = tempfile::tempdir().unwrap();
	let config = DbConfig::for_file(dir.path().join("web.db").to_string_lossy());
	let library = Library::open(&config).await.unwrap();
	let router = web::router(library.clone());
	TestApp { _dir: dir, library, router }
}

impl TestApp {
	async fn seed_book(&self, title: &str, copies: i64) -> Bid {
		let author = self.library.authors().insert(&NewAuthor::new("Machado de Assis")).await.unwrap();
		self.library
			.books()
			.insert(&NewBook::with_copies(title, author, "Novel", copies))
			.await
			.unwrap()
	}

	async fn post(&self, uri: &str, body: &str) -> Response {
		let request = Request::builder()
			.method("POST")
			.uri(uri)
			.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
			.body(Body::from(body.to_string()))
			.unwrap();
		self.router.clone().oneshot(request).await.unwrap()
	}

	async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
		let mut request = Request::builder().uri(uri);
		if let Some(cookie) = cookie {
			request = request.header(header::COOKIE, cookie);
		}
		self.router
			.clone()
			.oneshot(request.body(Body::empty()).unwrap())
			.await
			.unwrap()
	}
}

async fn text(response: Response) -> String {
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
	String::from_utf8(bytes.to_vec()).unwrap()
}

/// `flash=<value>` as sent back by the browser.
fn flash_cookie(response: &Response) -> String {
	let set_cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
	set_cookie.split(';').next().unwrap().to_string()
}

/// Check the redirect and return the flash it carries.
fn redirected_flash(response: &Response) -> Flash {
	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");
	let cookie = flash_cookie(response);
	let value = cookie.strip_prefix("flash=").unwrap();
	Flash::decode(value).unwrap()
}

#[tokio::test]
async fn index_lists_books_and_the_add_form() {
	let app = app().await;
	app.seed_book("Quincas Borba", 2).await;

	let response = app.get("/", None).await;
	assert_eq!(response.status(), StatusCode::OK);
	let page = text(response).await;
	assert!(page.contains("Quincas Borba"));
	assert!(page.contains("Machado de Assis"));
	assert!(page.contains("2 / 2"));
	assert!(page.contains(r#"action="/book/add""#));
}

#[tokio::test]
async fn adding_a_book_redirects_with_success() {
	let app = app().await;
	let author = app.library.authors().insert(&NewAuthor::new("Aluísio Azevedo")).await.unwrap();

	let body = format!("title=O+Corti%C3%A7o&author_id={author}&genre=Novel&copies=3&price=&publication_year=1890");
	let response = app.post("/book/add", &body).await;
	let flash = redirected_flash(&response);
	assert_eq!(flash.kind, FlashKind::Success);

	let books = app.library.books().list().await.unwrap();
	assert_eq!(books.len(), 1);
	assert_eq!(books[0].title, "O Cortiço");
	assert_eq!((books[0].available_copies, books[0].total_copies), (3, 3));
	assert_eq!(books[0].price, 0.0);
	assert_eq!(books[0].publication_year, Some(1890));
}

#[tokio::test]
async fn adding_a_book_with_bad_input_flashes_danger() {
	let app = app().await;
	let author = app.library.authors().insert(&NewAuthor::new("Aluísio Azevedo")).await.unwrap();

	let response = app
		.post("/book/add", &format!("title=Casa+de+Pens%C3%A3o&author_id={author}&genre=Novel&copies=0"))
		.await;
	let flash = redirected_flash(&response);
	assert_eq!(flash.kind, FlashKind::Danger);
	assert_eq!(flash.message, "copies must be greater than zero");

	let response = app.post("/book/add", "title=Orphan&author_id=99&genre=Novel&copies=1").await;
	let flash = redirected_flash(&response);
	assert_eq!(flash.kind, FlashKind::Danger);
	assert_eq!(flash.message, "author 99 does not exist");

	assert!(app.library.books().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn undecodable_forms_flash_danger() {
	let app = app().await;
	let id = app.seed_book("Senhora", 1).await;
	let author = app.library.books().get(id).await.unwrap().unwrap().author_id;

	let response = app
		.post("/book/add", &format!("title=Lucíola&author_id={author}&genre=Novel&copies="))
		.await;
	let flash = redirected_flash(&response);
	assert_eq!(flash.kind, FlashKind::Danger);
	assert!(flash.message.starts_with("invalid form"), "{}", flash.message);

	let response = app.post("/book/add", "title=Diva&author_id=abc&genre=Novel&copies=1").await;
	assert_eq!(redirected_flash(&response).kind, FlashKind::Danger);

	let response = app.post(&format!("/book/checkout/{id}"), "").await;
	assert_eq!(redirected_flash(&response).kind, FlashKind::Danger);

	assert_eq!(app.library.books().list().await.unwrap().len(), 1);
	assert!(app.library.loans().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn checkout_then_return() {
	let app = app().await;
	let id = app.seed_book("Dom Casmurro", 1).await;

	let response = app.post(&format!("/book/checkout/{id}"), "borrower_name=Alice").await;
	let flash = redirected_flash(&response);
	assert_eq!(flash, Flash::success("Book lent to Alice."));
	assert_eq!(app.library.books().get(id).await.unwrap().unwrap().available_copies, 0);

	let response = app.post(&format!("/book/checkout/{id}"), "borrower_name=Bento").await;
	let flash = redirected_flash(&response);
	assert_eq!(flash.kind, FlashKind::Warning);

	let loans = app.library.loans().list().await.unwrap();
	assert_eq!(loans.len(), 1);
	let response = app.post(&format!("/loan/return/{}", loans[0].id), "").await;
	let flash = redirected_flash(&response);
	assert_eq!(flash.kind, FlashKind::Success);
	assert_eq!(app.library.books().get(id).await.unwrap().unwrap().available_copies, 1);

	let response = app.post(&format!("/loan/return/{}", loans[0].id), "").await;
	let flash = redirected_flash(&response);
	assert_eq!(flash.kind, FlashKind::Danger);
}

#[tokio::test]
async fn deleting_a_lent_book_is_refused() {
	let app = app().await;
	let id = app.seed_book("Memorial de Aires", 1).await;
	app.library.loans().checkout(id, "Fidélia").await.unwrap();

	let response = app.post(&format!("/book/delete/{id}"), "").await;
	let flash = redirected_flash(&response);
	assert_eq!(flash.kind, FlashKind::Danger);
	assert!(flash.message.contains("loan(s)"), "{}", flash.message);
	assert!(app.library.books().get(id).await.unwrap().is_some());

	let loan = app.library.loans().list().await.unwrap().remove(0);
	app.library.loans().return_loan(loan.id).await.unwrap();
	let response = app.post(&format!("/book/delete/{id}"), "").await;
	assert_eq!(redirected_flash(&response), Flash::success("Book deleted."));
	assert!(app.library.books().get(id).await.unwrap().is_none());
}

#[tokio::test]
async fn index_shows_the_flash_once() {
	let app = app().await;
	let id = app.seed_book("Esaú e Jacó", 1).await;
	let response = app.post(&format!("/book/checkout/{id}"), "borrower_name=Flora").await;
	let cookie = flash_cookie(&response);

	let response = app.get("/", Some(cookie.as_str())).await;
	assert_eq!(response.status(), StatusCode::OK);
	let cleared = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap().to_string();
	assert!(cleared.starts_with("flash="), "{cleared}");
	assert!(cleared.contains("Max-Age=0"), "{cleared}");

	let page = text(response).await;
	assert!(page.contains("Book lent to Flora."));
	assert!(page.contains("flash success"));
}

#[tokio::test]
async fn healthz_reports_the_engine() {
	let app = app().await;
	let response = app.get("/healthz", None).await;
	assert_eq!(response.status(), StatusCode::OK);
	assert!(text(response).await.starts_with("SQLite "));
}
