use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::info;

use taskmanager::{db, routes, store::PgStore, AppState, Config};

fn startup_error(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(startup_error)?;

    let pool = db::connect(&config).await.map_err(startup_error)?;
    db::migrate(&pool).await.map_err(startup_error)?;

    let store = Arc::new(PgStore::new(pool));
    let state = web::Data::new(AppState::new(&config, store.clone(), store));
    state
        .accounts
        .ensure_admin(&config.admin)
        .await
        .map_err(startup_error)?;

    if state.oauth.is_some() {
        info!("Yandex OAuth is enabled");
    } else {
        info!("Yandex OAuth is disabled (YANDEX_CLIENT_ID not set)");
    }

    info!("Starting TaskManager server at {}", config.server_url());
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(routes::health::index)
            .service(routes::health::health)
            .service(web::scope("/api/v1").configure(routes::config))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
