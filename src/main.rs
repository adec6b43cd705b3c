// library web front-end

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use libdesk::{
	config::{load_dotenv, DbConfig},
	logging::{init_tracing, LogTarget},
	web, Library,
};

/// Browse books and loans, add books, lend and take back copies.
#[derive(Parser, Debug)]
#[command(name = "libdesk-web", version, about, long_about = None)]
struct Cli {
	#[arg(long, env = "LIBDESK_BIND", default_value = "0.0.0.0")]
	bind: String,

	#[arg(long, env = "LIBDESK_PORT", default_value_t = 8080)]
	port: u16,

	#[command(flatten)]
	db: DbConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	load_dotenv();
	let cli = Cli::parse();
	init_tracing("info", LogTarget::Stdout)?;
	cli.db.validate()?;

	tracing::info!(database = %cli.db.describe(), pooling = ?cli.db.pooling, "opening library");
	let library = Library::open(&cli.db).await.context("can't open the library database")?;
	let version = library.test_connection().await?;
	tracing::info!(%version, "database ready");

	let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port)
		.parse()
		.with_context(|| format!("bad bind address {}:{}", cli.bind, cli.port))?;
	let listener = tokio::net::TcpListener::bind(addr).await?;
	tracing::info!("listening on http://{addr}");

	axum::serve(listener, web::router(library.clone()))
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	library.close().await;
	tracing::info!("shutdown complete");
	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::warn!(error = %e, "can't listen for ctrl-c, running until killed");
		std::future::pending::<()>().await;
	}
	tracing::info!("received ctrl-c");
}
