use axum::middleware::from_fn;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::sync::Mutex;

mod components;
mod config;
mod controllers;
mod errors;
mod extractors;
mod map;
mod middleware;
mod models;
mod notes;
mod notify;
mod npcs;
mod routes;
mod session;
mod store;
mod tabs;
mod views;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let config = config::Config::from_env()?;
    let storage: Box<dyn store::Storage> = if config.ephemeral {
        log::warn!("ephemeral mode: saved sessions vanish on exit");
        Box::<store::MemoryStorage>::default()
    } else {
        log::info!("session data lives in {}", config.data_dir.display());
        Box::new(store::FileStorage::new(config.data_dir.clone()))
    };
    let mut session = session::DmSession::new(storage);
    session.load_on_startup();

    let state = models::AppState {
        session: Arc::new(Mutex::new(session)),
    };
    let app = routes::get_routes()
        .layer(from_fn(middleware::html_headers))
        .with_state(state);

    log::info!("listening on {}", config.addr);
    axum::Server::bind(&config.addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
