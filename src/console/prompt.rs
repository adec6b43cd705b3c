//! inquire prompts with the checks the forms need.
//!
//! Esc cancels the current form (`InquireError::OperationCanceled`), Ctrl+C
//! leaves the app (`OperationInterrupted`); both surface as errors and are
//! sorted out by the menu loop.

use std::fmt::Display;

use anyhow::Result;
use chrono::NaiveDate;
use inquire::validator::{Validation, ValueRequiredValidator};
use inquire::{Confirm, CustomType, CustomUserError, Select, Text};

use crate::error::ValidationError;
use crate::types::blank_to_none;

/// Numbered menu; `None` when the user backs out with Esc.
pub fn menu<T: Display>(title: &str, options: Vec<T>) -> Result<Option<T>> {
	Ok(Select::new(title, options).with_page_size(8).prompt_skippable()?)
}

pub fn required_text(message: &str, current: Option<&str>) -> Result<String> {
	let mut prompt = Text::new(message).with_validator(ValueRequiredValidator::default());
	if let Some(current) = current {
		prompt = prompt.with_initial_value(current);
	}
	Ok(prompt.prompt()?.trim().to_string())
}

/// Blank input means "no value".
pub fn optional_text(message: &str, current: Option<&str>) -> Result<Option<String>> {
	let mut prompt = Text::new(message).with_help_message("leave blank to skip");
	if let Some(current) = current {
		prompt = prompt.with_initial_value(current);
	}
	Ok(blank_to_none(Some(prompt.prompt()?)))
}

pub fn optional_email(message: &str, current: Option<&str>) -> Result<Option<String>> {
	let mut prompt = Text::new(message)
		.with_help_message("leave blank to skip")
		.with_validator(email_or_blank);
	if let Some(current) = current {
		prompt = prompt.with_initial_value(current);
	}
	Ok(blank_to_none(Some(prompt.prompt()?)))
}

pub fn optional_date(message: &str, current: Option<NaiveDate>) -> Result<Option<NaiveDate>> {
	let initial = current.map(|d| d.format("%Y-%m-%d").to_string());
	let mut prompt = Text::new(message)
		.with_help_message("YYYY-MM-DD, leave blank to skip")
		.with_validator(date_or_blank);
	if let Some(initial) = initial.as_deref() {
		prompt = prompt.with_initial_value(initial);
	}
	Ok(parse_date(&prompt.prompt()?)?)
}

pub fn optional_year(message: &str, current: Option<i64>) -> Result<Option<i64>> {
	let initial = current.map(|y| y.to_string());
	let mut prompt = Text::new(message)
		.with_help_message("leave blank to skip")
		.with_validator(year_or_blank);
	if let Some(initial) = initial.as_deref() {
		prompt = prompt.with_initial_value(initial);
	}
	let raw = prompt.prompt()?;
	match raw.trim() {
		"" => Ok(None),
		year => Ok(Some(year.parse()?)),
	}
}

/// Record id; only positive numbers get through.
pub fn id(message: &str, current: Option<i64>) -> Result<i64> {
	let mut prompt = CustomType::<i64>::new(message)
		.with_error_message("Please type a whole number")
		.with_validator(positive);
	if let Some(current) = current {
		prompt = prompt.with_default(current);
	}
	Ok(prompt.prompt()?)
}

pub fn quantity(message: &str, default: i64) -> Result<i64> {
	Ok(CustomType::<i64>::new(message)
		.with_default(default)
		.with_error_message("Please type a whole number")
		.with_validator(positive)
		.prompt()?)
}

pub fn count(message: &str, default: i64) -> Result<i64> {
	Ok(CustomType::<i64>::new(message)
		.with_default(default)
		.with_error_message("Please type a whole number")
		.with_validator(not_negative)
		.prompt()?)
}

pub fn price(message: &str, default: f64) -> Result<f64> {
	Ok(CustomType::<f64>::new(message)
		.with_default(default)
		.with_error_message("Please type a number, e.g. 39.90")
		.with_validator(not_negative_price)
		.prompt()?)
}

pub fn confirm(message: &str) -> Result<bool> {
	Ok(Confirm::new(message).with_default(false).prompt()?)
}

pub fn another(what: &str) -> Result<bool> {
	Ok(Confirm::new(&format!("{what} another?")).with_default(false).prompt()?)
}

/// `YYYY-MM-DD`, blank for none.
pub fn parse_date(raw: &str) -> Result<Option<NaiveDate>, ValidationError> {
	let raw = raw.trim();
	if raw.is_empty() {
		return Ok(None);
	}
	NaiveDate::parse_from_str(raw, "%Y-%m-%d")
		.map(Some)
		.map_err(|_| ValidationError::Malformed { field: "date", value: raw.to_string() })
}

fn verdict(ok: bool, message: &str) -> Result<Validation, CustomUserError> {
	if ok {
		Ok(Validation::Valid)
	} else {
		Ok(Validation::Invalid(message.into()))
	}
}

fn positive(value: &i64) -> Result<Validation, CustomUserError> {
	verdict(*value > 0, "must be greater than zero")
}

fn not_negative(value: &i64) -> Result<Validation, CustomUserError> {
	verdict(*value >= 0, "cannot be negative")
}

fn not_negative_price(value: &f64) -> Result<Validation, CustomUserError> {
	verdict(value.is_finite() && *value >= 0.0, "cannot be negative")
}

fn date_or_blank(input: &str) -> Result<Validation, CustomUserError> {
	verdict(parse_date(input).is_ok(), "use YYYY-MM-DD, e.g. 1839-06-21")
}

fn year_or_blank(input: &str) -> Result<Validation, CustomUserError> {
	let input = input.trim();
	verdict(input.is_empty() || input.parse::<i64>().is_ok(), "type a year, e.g. 1899")
}

fn email_or_blank(input: &str) -> Result<Validation, CustomUserError> {
	let input = input.trim();
	verdict(input.is_empty() || input.contains('@'), "that does not look like an email address")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn dates_are_iso_or_blank() {
		assert_eq!(parse_date("  "), Ok(None));
		assert_eq!(parse_date("1839-06-21"), Ok(NaiveDate::from_ymd_opt(1839, 6, 21)));
		assert_eq!(
			parse_date("21/06/1839"),
			Err(ValidationError::Malformed { field: "date", value: "21/06/1839".into() })
		);
	}

	#[test]
	fn validators_accept_and_reject() {
		assert!(matches!(positive(&1), Ok(Validation::Valid)));
		assert!(matches!(positive(&0), Ok(Validation::Invalid(_))));
		assert!(matches!(not_negative(&0), Ok(Validation::Valid)));
		assert!(matches!(not_negative_price(&-0.5), Ok(Validation::Invalid(_))));
		assert!(matches!(year_or_blank(""), Ok(Validation::Valid)));
		assert!(matches!(year_or_blank("18x9"), Ok(Validation::Invalid(_))));
		assert!(matches!(email_or_blank("bia@example.com"), Ok(Validation::Valid)));
		assert!(matches!(email_or_blank("bia"), Ok(Validation::Invalid(_))));
	}
}
