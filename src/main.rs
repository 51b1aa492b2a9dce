use std::io;
use std::sync::Arc;

use actix_web::{web, HttpServer};
use task_manager::{
    auth::TokenService,
    config::Config,
    create_app,
    seed::{self, AdminAccount},
    store::{MemoryStore, PgStore, Store},
    telemetry, AppState,
};

fn startup_error<E: std::fmt::Display>(err: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;
    config.log_summary();

    let _sentry = telemetry::init_sentry(&config);

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.database_max_connections)
                .await
                .map_err(startup_error)?;
            store.migrate().await.map_err(startup_error)?;
            log::info!("Database migrations applied");
            Arc::new(store)
        }
        None => Arc::new(MemoryStore::new()),
    };

    seed::load_defaults(
        store.as_ref(),
        AdminAccount {
            email: &config.admin_email,
            password: &config.admin_password,
        },
        config.bcrypt_cost,
    )
    .await
    .map_err(startup_error)?;

    let tokens = TokenService::new(&config.jwt_secret, config.jwt_ttl());
    let data = web::Data::new(AppState::new(store, tokens, config.bcrypt_cost));

    log::info!("Starting task manager at {}", config.server_url());
    HttpServer::new(move || create_app(data.clone()))
        .bind((config.server_host.as_str(), config.server_port))?
        .run()
        .await
}
