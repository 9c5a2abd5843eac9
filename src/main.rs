use actix_web::{web, App, HttpServer};
use pulse_chat_service::{config, error, logging, routes, state::AppState};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let cfg = Arc::new(config::Config::from_env()?);

    let state = AppState::new(cfg.clone());

    let bind_addr = format!("{}:{}", cfg.bind_addr, cfg.port);
    tracing::info!(%bind_addr, "starting pulse-chat-service");

    let server_cfg = cfg.clone();
    HttpServer::new(move || {
        let cors = match server_cfg.cors_allowed_origin.as_deref() {
            Some(origin) => actix_cors::Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .max_age(3600),
            None => actix_cors::Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600),
        };

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure_routes)
    })
    .bind(&bind_addr)
    .map_err(|e| error::AppError::StartServer(e.to_string()))?
    .run()
    .await
    .map_err(|e| error::AppError::StartServer(e.to_string()))?;

    Ok(())
}
