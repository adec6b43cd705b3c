//! Interactive terminal front-end.
//!
//! A splash screen with table counts, then a looping main menu
//! (Reports / Insert / Remove / Update / Exit) with one submenu per entity.
//! Every action repeats until the user declines "another?".

mod prompt;
pub mod render;

use std::fmt;

use anyhow::Result;
use inquire::InquireError;

use crate::error::LibraryError;
use crate::store::Library;
use crate::types::{NewAuthor, NewBook, NewOrder, NewOrderItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MainChoice {
	Reports,
	Insert,
	Remove,
	Update,
	Exit,
}

impl MainChoice {
	const ALL: [MainChoice; 5] = [
		MainChoice::Reports,
		MainChoice::Insert,
		MainChoice::Remove,
		MainChoice::Update,
		MainChoice::Exit,
	];
}

impl fmt::Display for MainChoice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			MainChoice::Reports => "1. Reports",
			MainChoice::Insert => "2. Insert",
			MainChoice::Remove => "3. Remove",
			MainChoice::Update => "4. Update",
			MainChoice::Exit => "5. Exit",
		};
		f.write_str(label)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportChoice {
	SalesByGenre,
	OrderDetails,
	Back,
}

impl fmt::Display for ReportChoice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			ReportChoice::SalesByGenre => "1. Sales by genre",
			ReportChoice::OrderDetails => "2. Detailed orders",
			ReportChoice::Back => "3. Back",
		};
		f.write_str(label)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entity {
	Author,
	Book,
	Order,
	OrderItem,
}

/// A submenu line: an entity, or the way back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EntityChoice {
	position: usize,
	entity: Option<Entity>,
}

impl fmt::Display for EntityChoice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self.entity {
			Some(Entity::Author) => "Author",
			Some(Entity::Book) => "Book",
			Some(Entity::Order) => "Order",
			Some(Entity::OrderItem) => "Order item",
			None => "Back",
		};
		write!(f, "{}. {label}", self.position)
	}
}

fn entity_choices(entities: &[Entity]) -> Vec<EntityChoice> {
	entities
		.iter()
		.map(|&entity| Some(entity))
		.chain([None])
		.enumerate()
		.map(|(i, entity)| EntityChoice { position: i + 1, entity })
		.collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
	Insert,
	Remove,
	Update,
}

impl Action {
	/// Order items are only ever added; they go away with their order.
	fn entities(self) -> &'static [Entity] {
		match self {
			Action::Insert => &[Entity::Author, Entity::Book, Entity::Order, Entity::OrderItem],
			Action::Remove | Action::Update => &[Entity::Author, Entity::Book, Entity::Order],
		}
	}
}

/// Esc inside a form.
fn cancelled(err: &anyhow::Error) -> bool {
	matches!(err.downcast_ref::<InquireError>(), Some(InquireError::OperationCanceled))
}

/// Ctrl+C anywhere.
fn interrupted(err: &anyhow::Error) -> bool {
	matches!(err.downcast_ref::<InquireError>(), Some(InquireError::OperationInterrupted))
}

/// Print the outcome of a data access call; failures never end the session.
fn show<T>(result: Result<T, LibraryError>, success: impl FnOnce(T) -> String) {
	match result {
		Ok(value) => println!("✔ {}", success(value)),
		Err(e) => fail(&e),
	}
}

fn fail(e: &LibraryError) {
	if e.is_business_rule() {
		tracing::warn!(error = %e, "operation rejected");
	} else {
		tracing::error!(error = %e, "operation failed");
	}
	println!("✘ {e}");
}

pub struct Console {
	library: Library,
}

impl Console {
	pub fn new(library: Library) -> Self {
		Console { library }
	}

	/// Run until the user picks Exit or presses Ctrl+C.
	pub async fn run(&self) -> Result<()> {
		match self.main_loop().await {
			Err(e) if interrupted(&e) => {
				println!();
				Ok(())
			}
			other => other,
		}
	}

	async fn main_loop(&self) -> Result<()> {
		self.splash().await?;
		loop {
			println!();
			let choice = prompt::menu("Main menu", MainChoice::ALL.to_vec())?.unwrap_or(MainChoice::Exit);
			match choice {
				MainChoice::Reports => self.reports_menu().await?,
				MainChoice::Insert => self.entity_menu(Action::Insert).await?,
				MainChoice::Remove => self.entity_menu(Action::Remove).await?,
				MainChoice::Update => self.entity_menu(Action::Update).await?,
				MainChoice::Exit => break,
			}
		}
		println!("Goodbye.");
		Ok(())
	}

	async fn splash(&self) -> Result<()> {
		let counts = self.library.table_counts().await?;
		let now = chrono::Local::now().naive_local();
		println!("{}", render::splash(&counts, now));
		Ok(())
	}

	async fn reports_menu(&self) -> Result<()> {
		let options = vec![ReportChoice::SalesByGenre, ReportChoice::OrderDetails, ReportChoice::Back];
		loop {
			println!();
			match prompt::menu("Reports", options.clone())? {
				Some(ReportChoice::SalesByGenre) => match self.library.reports().sales_by_genre().await {
					Ok(report) => println!("\nSALES BY GENRE\n{}", render::sales_by_genre(&report)),
					Err(e) => fail(&e),
				},
				Some(ReportChoice::OrderDetails) => match self.library.reports().order_details().await {
					Ok(report) => println!("\nDETAILED ORDERS\n{}", render::order_details(&report)),
					Err(e) => fail(&e),
				},
				Some(ReportChoice::Back) | None => return Ok(()),
			}
		}
	}

	async fn entity_menu(&self, action: Action) -> Result<()> {
		let title = match action {
			Action::Insert => "Insert",
			Action::Remove => "Remove",
			Action::Update => "Update",
		};
		loop {
			println!();
			let Some(EntityChoice { entity: Some(entity), .. }) = prompt::menu(title, entity_choices(action.entities()))? else {
				return Ok(());
			};
			let outcome = match (action, entity) {
				(Action::Insert, Entity::Author) => self.insert_author().await,
				(Action::Insert, Entity::Book) => self.insert_book().await,
				(Action::Insert, Entity::Order) => self.insert_order().await,
				(Action::Insert, Entity::OrderItem) => self.insert_order_item().await,
				(Action::Remove, Entity::Author) => self.remove_author().await,
				(Action::Remove, Entity::Book) => self.remove_book().await,
				(Action::Remove, Entity::Order) => self.remove_order().await,
				(Action::Update, Entity::Author) => self.update_author().await,
				(Action::Update, Entity::Book) => self.update_book().await,
				(Action::Update, Entity::Order) => self.update_order().await,
				(Action::Remove | Action::Update, Entity::OrderItem) => {
					unreachable!("{title} menu never offers order items")
				}
			};
			match outcome {
				Ok(()) => {}
				Err(e) if cancelled(&e) => println!("Cancelled."),
				Err(e) => match e.downcast_ref::<LibraryError>() {
					Some(err) => fail(err),
					None => return Err(e),
				},
			}
		}
	}

	async fn insert_author(&self) -> Result<()> {
		loop {
			println!("\nNEW AUTHOR");
			let author = NewAuthor {
				name: prompt::required_text("Name:", None)?,
				nationality: prompt::optional_text("Nationality:", None)?,
				birth_date: prompt::optional_date("Birth date:", None)?,
				biography: prompt::optional_text("Biography:", None)?,
			};
			show(self.library.authors().insert(&author).await, |id| {
				format!("Author '{}' registered with id {id}.", author.name)
			});
			if !prompt::another("Insert")? {
				return Ok(());
			}
		}
	}

	async fn insert_book(&self) -> Result<()> {
		loop {
			let authors = self.library.authors().list().await?;
			if authors.is_empty() {
				println!("No authors registered. Insert an author first.");
				return Ok(());
			}
			println!("\nNEW BOOK\n{}", render::authors(&authors));

			let title = prompt::required_text("Title:", None)?;
			let author_id = prompt::id("Author id:", None)?;
			let genre = prompt::required_text("Genre:", None)?;
			let mut book = NewBook::with_copies(title, author_id, genre, 0);
			book.publication_year = prompt::optional_year("Publication year:", None)?;
			book.price = prompt::price("Price:", 0.0)?;
			book.total_copies = prompt::count("Copies in stock:", 1)?;
			book.available_copies = book.total_copies;

			show(self.library.books().insert(&book).await, |id| {
				format!("Book '{}' registered with id {id}.", book.title)
			});
			if !prompt::another("Insert")? {
				return Ok(());
			}
		}
	}

	async fn insert_order(&self) -> Result<()> {
		loop {
			println!("\nNEW ORDER");
			let order = NewOrder {
				customer_name: prompt::required_text("Customer name:", None)?,
				customer_email: prompt::optional_email("Customer email:", None)?,
			};
			show(self.library.orders().insert(&order).await, |id| {
				format!("Order {id} created for {}. Add items to it from Insert > Order item.", order.customer_name)
			});
			if !prompt::another("Insert")? {
				return Ok(());
			}
		}
	}

	async fn insert_order_item(&self) -> Result<()> {
		loop {
			let orders = self.library.orders().list().await?;
			let books = self.library.books().list().await?;
			if orders.is_empty() || books.is_empty() {
				println!("An order item needs at least one order and one book.");
				return Ok(());
			}
			println!("\nNEW ORDER ITEM\n{}\n{}", render::orders(&orders), render::books(&books));

			let item = NewOrderItem {
				order_id: prompt::id("Order id:", None)?,
				book_id: prompt::id("Book id:", None)?,
				quantity: prompt::quantity("Quantity:", 1)?,
			};
			show(self.library.orders().add_item(&item).await, |line| {
				format!(
					"Added {} x {} = {} to order {}.",
					line.quantity,
					render::money(line.unit_price),
					render::money(line.subtotal),
					line.order_id,
				)
			});
			if !prompt::another("Insert")? {
				return Ok(());
			}
		}
	}

	async fn remove_author(&self) -> Result<()> {
		loop {
			let authors = self.library.authors().list().await?;
			if authors.is_empty() {
				println!("No authors registered.");
				return Ok(());
			}
			println!("\nREMOVE AUTHOR\n{}", render::authors(&authors));

			let id = prompt::id("Author id:", None)?;
			match self.library.authors().get(id).await? {
				None => println!("✘ Author {id} not found."),
				Some(author) => {
					if prompt::confirm(&format!("Remove author '{}'?", author.name))? {
						show(self.library.authors().remove(id).await, |_| format!("Author {id} removed."));
					} else {
						println!("Kept.");
					}
				}
			}
			if !prompt::another("Remove")? {
				return Ok(());
			}
		}
	}

	async fn remove_book(&self) -> Result<()> {
		loop {
			let books = self.library.books().list().await?;
			if books.is_empty() {
				println!("No books registered.");
				return Ok(());
			}
			println!("\nREMOVE BOOK\n{}", render::books(&books));

			let id = prompt::id("Book id:", None)?;
			match self.library.books().get(id).await? {
				None => println!("✘ Book {id} not found."),
				Some(book) => {
					if prompt::confirm(&format!("Remove book '{}'?", book.title))? {
						show(self.library.books().remove(id).await, |_| format!("Book {id} removed."));
					} else {
						println!("Kept.");
					}
				}
			}
			if !prompt::another("Remove")? {
				return Ok(());
			}
		}
	}

	async fn remove_order(&self) -> Result<()> {
		loop {
			let orders = self.library.orders().list().await?;
			if orders.is_empty() {
				println!("No orders registered.");
				return Ok(());
			}
			println!("\nREMOVE ORDER\n{}", render::orders(&orders));

			let id = prompt::id("Order id:", None)?;
			match self.library.orders().get(id).await? {
				None => println!("✘ Order {id} not found."),
				Some(order) => {
					let items = self.library.orders().items(id).await?;
					let question = format!(
						"Remove order {id} of {} and its {} item(s)?",
						order.customer_name,
						items.len()
					);
					if prompt::confirm(&question)? {
						show(self.library.orders().remove(id).await, |_| format!("Order {id} removed."));
					} else {
						println!("Kept.");
					}
				}
			}
			if !prompt::another("Remove")? {
				return Ok(());
			}
		}
	}

	async fn update_author(&self) -> Result<()> {
		loop {
			let authors = self.library.authors().list().await?;
			if authors.is_empty() {
				println!("No authors registered.");
				return Ok(());
			}
			println!("\nUPDATE AUTHOR\n{}", render::authors(&authors));

			let id = prompt::id("Author id:", None)?;
			match self.library.authors().get(id).await? {
				None => println!("✘ Author {id} not found."),
				Some(current) => {
					let author = NewAuthor {
						name: prompt::required_text("Name:", Some(&current.name))?,
						nationality: prompt::optional_text("Nationality:", current.nationality.as_deref())?,
						birth_date: prompt::optional_date("Birth date:", current.birth_date)?,
						biography: prompt::optional_text("Biography:", current.biography.as_deref())?,
					};
					show(self.library.authors().update(id, &author).await, |_| format!("Author {id} updated."));
				}
			}
			if !prompt::another("Update")? {
				return Ok(());
			}
		}
	}

	async fn update_book(&self) -> Result<()> {
		loop {
			let books = self.library.books().list().await?;
			if books.is_empty() {
				println!("No books registered.");
				return Ok(());
			}
			println!("\nUPDATE BOOK\n{}", render::books(&books));

			let id = prompt::id("Book id:", None)?;
			match self.library.books().get(id).await? {
				None => println!("✘ Book {id} not found."),
				Some(current) => {
					let book = NewBook {
						title: prompt::required_text("Title:", Some(&current.title))?,
						author_id: prompt::id("Author id:", Some(current.author_id))?,
						genre: prompt::required_text("Genre:", Some(&current.genre))?,
						publication_year: prompt::optional_year("Publication year:", current.publication_year)?,
						price: prompt::price("Price:", current.price)?,
						total_copies: prompt::count("Total copies:", current.total_copies)?,
						available_copies: prompt::count("Available copies:", current.available_copies)?,
					};
					show(self.library.books().update(id, &book).await, |_| format!("Book {id} updated."));
				}
			}
			if !prompt::another("Update")? {
				return Ok(());
			}
		}
	}

	async fn update_order(&self) -> Result<()> {
		loop {
			let orders = self.library.orders().list().await?;
			if orders.is_empty() {
				println!("No orders registered.");
				return Ok(());
			}
			println!("\nUPDATE ORDER\n{}", render::orders(&orders));

			let id = prompt::id("Order id:", None)?;
			match self.library.orders().get(id).await? {
				None => println!("✘ Order {id} not found."),
				Some(current) => {
					let order = NewOrder {
						customer_name: prompt::required_text("Customer name:", Some(&current.customer_name))?,
						customer_email: prompt::optional_email("Customer email:", current.customer_email.as_deref())?,
					};
					show(self.library.orders().update(id, &order).await, |_| format!("Order {id} updated."));
				}
			}
			if !prompt::another("Update")? {
				return Ok(());
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn main_menu_is_numbered() {
		let labels: Vec<String> = MainChoice::ALL.iter().map(ToString::to_string).collect();
		assert_eq!(labels, ["1. Reports", "2. Insert", "3. Remove", "4. Update", "5. Exit"]);
	}

	#[test]
	fn entity_menus_end_with_back() {
		let labels: Vec<String> = entity_choices(&[Entity::Author, Entity::Book, Entity::Order])
			.iter()
			.map(ToString::to_string)
			.collect();
		assert_eq!(labels, ["1. Author", "2. Book", "3. Order", "4. Back"]);
	}

	#[test]
	fn order_items_are_insert_only() {
		assert!(Action::Insert.entities().contains(&Entity::OrderItem));
		assert!(!Action::Remove.entities().contains(&Entity::OrderItem));
		assert!(!Action::Update.entities().contains(&Entity::OrderItem));
		let labels: Vec<String> = entity_choices(Action::Insert.entities())
			.iter()
			.map(ToString::to_string)
			.collect();
		assert_eq!(labels.last().map(String::as_str), Some("5. Back"));
	}

	#[test]
	fn escape_and_ctrl_c_are_told_apart() {
		let esc = anyhow::Error::from(InquireError::OperationCanceled);
		let ctrl_c = anyhow::Error::from(InquireError::OperationInterrupted);
		assert!(cancelled(&esc) && !interrupted(&esc));
		assert!(interrupted(&ctrl_c) && !cancelled(&ctrl_c));
	}
}
