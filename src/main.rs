mod auth;
mod filtering;
mod models;
mod routes;
mod schedule;
mod state;
mod store;
mod templates;
mod wizard;

use actix_web::{middleware, web, App, HttpServer};
use chrono::Local;
use std::env;

use crate::{auth::AuthGate, state::AppState, store::EntityStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let auth = AuthGate::from_env()?;
    let store = EntityStore::with_defaults(Local::now().date_naive());
    let state = AppState::new(store, auth);

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080);

    let address = format!("0.0.0.0:{port}");
    log::info!("Starting Clinix on http://{address}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .configure(routes::public::configure)
            .configure(routes::admin::configure)
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
