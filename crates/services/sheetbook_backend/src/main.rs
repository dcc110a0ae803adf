// File: services/sheetbook_backend/src/main.rs
mod app_state;

use std::error::Error;
use std::sync::Arc;

use axum::{routing::get, Router};
use sheetbook_common::logging;
use sheetbook_config::{load_config, startup_warnings};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::app_state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Arc::new(load_config()?);
    logging::init_from_str(config.log_level.as_deref());
    for warning in startup_warnings(&config) {
        warn!("{}", warning);
    }

    let state = logging::log_result(
        AppState::new(config.clone()).await,
        "Spreadsheets connected",
        "Startup failed",
    )?;
    let policy = state.bookings.policy();
    info!(
        "Confirmation policy: write_mode={:?}, lookup_keys={:?}",
        policy.write_mode, policy.lookup_keys
    );

    let api_router = Router::new()
        .route("/", get(|| async { "Sheetbook API" }))
        .merge(sheetbook_bookings::routes(state.bookings.clone()));

    #[allow(unused_mut)] // mutated only with the openapi feature
    let mut app = Router::new()
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http());

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use sheetbook_bookings::doc::BookingApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Sheetbook API",
                version = "0.1.0",
                description = "Bookings backed by Stripe and Google Sheets",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(BookingApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");
        app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
    }

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
