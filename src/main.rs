use econ_pipeline::{
    app_state::models::AppState,
    db::postgres::postgres_service::PostgresService,
    jobs::initialize_application,
    logger,
    server::{create_application_router, start_http_server},
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let settings = match initialize_application("status server") {
        Ok(settings) => Arc::new(settings),
        Err(err) => {
            let _ = logger::init_logger("info", "plain", true);
            error!("Failed to initialize application: {}", err);
            return;
        }
    };

    let server_address: SocketAddr = match format!(
        "{}:{}",
        settings.app_config.server.address, settings.app_config.server.port,
    )
    .parse()
    {
        Ok(addr) => addr,
        Err(err) => {
            error!("Invalid server address configuration: {}", err);
            return;
        }
    };

    info!("Server will listen on: {}", server_address);

    let postgres_service = match PostgresService::new(&settings).await {
        Ok(service) => {
            info!("PostgreSQL connection established successfully");
            service
        }
        Err(err) => {
            error!("Failed to connect to PostgreSQL: {}", err);
            return;
        }
    };

    let app_state = Arc::new(AppState::new(settings.clone(), Arc::new(postgres_service)));
    let app_router = create_application_router(app_state);

    start_http_server(app_router, server_address).await;

    info!("Server stopped");
}
