mod config;
mod database;
mod editor;
mod error;
mod legacy;
mod server;
mod timing;

use std::sync::Arc;

use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use r2d2_sqlite::SqliteConnectionManager;
use server::server::Server;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::{config::Config, database::sqlite::SqliteDatabase, error::Result};

pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sukimise_hours=info".into()),
        )
        .init();

    let config = Config::load()?;

    let manager = SqliteConnectionManager::file(&config.database_path);
    let pool = r2d2::Pool::builder()
        .max_size(config.pool_size)
        .build(manager)?;
    let pool = Arc::new(pool);

    {
        let connection = pool.get()?;
        SqliteDatabase::create_tables(&connection)?;
        SqliteDatabase::migrate_legacy_hours(&connection)?;
    }

    let server = Server::setup(pool.clone());

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(
        "listening on {} (database: {})",
        config.bind_address(),
        config.database_path
    );

    loop {
        let (stream, _) = match listener.accept().await {
            Ok(connection) => connection,
            Err(err) => {
                error!("could not accept connection: {}", err);
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let server_clone = server.clone();
        tokio::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(io, server_clone)
                .await
            {
                error!("{}", err);
            }
        });
    }
}
