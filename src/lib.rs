//! libdesk: a small library and bookstore back office.
//!
//! Authors, books, loans and orders live in SQLite and are reached through
//! the [`store::Library`] data access layer. Two front-ends sit on top of
//! it: an HTML app ([`web`]) and an interactive terminal app ([`console`]).

pub mod config;
pub mod console;
pub mod db;
pub mod error;
pub mod logging;
pub mod sql;
pub mod store;
pub mod types;
pub mod web;

pub use config::{DbConfig, Pooling};
pub use error::{LibraryError, ValidationError};
pub use store::Library;
