// File: services/callpush_backend/src/main.rs
use axum::{routing::get, Router};
use callpush_common::logging::log_result;
use callpush_common::store::{BlobStore, FileBlobStore};
use callpush_config::load_config;
use callpush_dispatch::PushDispatcher;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(load_config()?);

    let level = config.logging.level.parse().unwrap_or(Level::INFO);
    let _log_guard = match config.logging.dir.as_deref() {
        Some(dir) => Some(callpush_common::logging::init_with_file(
            level,
            Path::new(dir),
            "callpush.log",
        )),
        None => {
            callpush_common::logging::init_with_level(level);
            None
        }
    };

    let store: Arc<dyn BlobStore> = Arc::new(FileBlobStore::new(&config.storage.data_dir));
    let dispatcher = Arc::new(log_result(
        PushDispatcher::from_config(&config, store),
        "Push dispatcher initialized",
        "Failed to initialize push dispatcher",
    )?);

    let api_router = Router::new()
        .route("/", get(|| async { "callpush API" }))
        .merge(callpush_dispatch::routes(dispatcher));

    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    #[cfg(feature = "openapi")]
    {
        use callpush_dispatch::openapi::PushApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        info!("Adding Swagger UI at /api/docs");
        let swagger_ui = SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", PushApiDoc::openapi());
        app = app.merge(swagger_ui);
    }

    let app = app.layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("Push endpoint available at http://{}/api/push", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
