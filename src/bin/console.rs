// library console front-end

use anyhow::Context;
use clap::Parser;
use libdesk::{
	config::{load_dotenv, DbConfig},
	console::Console,
	logging::{init_tracing, LogTarget},
	Library,
};

/// Menu-driven maintenance of authors, books and orders, plus sales reports.
#[derive(Parser, Debug)]
#[command(name = "libdesk-console", version, about, long_about = None)]
struct Cli {
	#[command(flatten)]
	db: DbConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	load_dotenv();
	let cli = Cli::parse();
	// stdout belongs to the menus
	init_tracing("warn", LogTarget::Stderr)?;

	let library = Library::open(&cli.db)
		.await
		.with_context(|| format!("can't open the library database ({})", cli.db.describe()))?;
	let version = library.test_connection().await?;
	tracing::info!(%version, "database ready");

	let outcome = Console::new(library.clone()).run().await;
	library.close().await;
	outcome
}
