//! Tracing setup shared by both binaries.
//!
//! `RUST_LOG` always wins; otherwise each binary passes its own default.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Where log lines go. The console app keeps stdout for its own screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
	Stdout,
	Stderr,
}

pub fn init_tracing(default_filter: &str, target: LogTarget) -> Result<()> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
	let builder = tracing_subscriber::fmt().with_env_filter(filter).compact();

	let installed = match target {
		LogTarget::Stdout => builder.try_init(),
		LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
	};
	installed.map_err(|err| anyhow!(err))
}
