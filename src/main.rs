use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

mod aggregation;
mod alerts;
mod auth;
mod config;
mod errors;
mod logging;
mod routes;
mod schemas;
mod store;

use crate::{
    auth::Authenticator,
    config::{Config, StoreBackend},
    store::{MemoryUserStore, MongoUserStore, UserStore},
};

fn cors(origin: Option<&str>) -> Cors {
    match origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials(),
        None => Cors::permissive(),
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn UserStore>> {
    let store: Arc<dyn UserStore> = match config.store {
        StoreBackend::Mongo => {
            info!(database = %config.database, "Connecting to MongoDB");
            let store = MongoUserStore::connect(&config.mongodb_uri, &config.database)
                .await
                .context("failed to connect")?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            Arc::new(MemoryUserStore::new())
        }
    };
    Ok(store)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let config = Config::from_env()?;

    let store = open_store(&config).await?;
    let store = web::Data::from(store);
    let authenticator = web::Data::new(
        Authenticator::from_config(&config).context("invalid password hash settings")?,
    );
    let cors_origin = config.cors_origin.clone();

    info!(address = %config.bind_address, port = config.port, "Starting MoneyMap API");
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors(cors_origin.as_deref()))
            .app_data(store.clone())
            .app_data(authenticator.clone())
            .app_data(routes::json_config())
            .configure(routes::configure)
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await?;
    Ok(())
}
