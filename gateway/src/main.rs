use anyhow::Result;
use axum::{routing::get, Json, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geo_report::{DisasterType, ReportGenerator, ZoneStore};
use risk_model::{PlaceholderModel, RiskScorer};
use weather_client::WeatherClient;

mod bookmarks;
mod risk_routes;
mod routes;
mod weather_routes;

use bookmarks::{BookmarkStore, InMemoryBookmarks};

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<ReportGenerator>,
    pub weather: Arc<WeatherClient>,
    pub bookmarks: Arc<dyn BookmarkStore>,
    pub risk: Arc<dyn RiskScorer>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "disaster_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = std::env::var("DISASTER_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let store = ZoneStore::new(&data_dir);
    for ty in DisasterType::ALL {
        match store.feature_count(ty) {
            Ok(count) => tracing::info!("   {} zones: {} features", ty, count),
            Err(e) => tracing::warn!("   {} zones unreadable: {}", ty, e),
        }
    }

    let state = AppState {
        generator: Arc::new(ReportGenerator::new(store)),
        weather: Arc::new(WeatherClient::from_env()),
        bookmarks: Arc::new(InMemoryBookmarks::new()),
        risk: Arc::new(PlaceholderModel::new()),
    };

    let api_routes = Router::new()
        .route("/weather/:lat/:lon", get(weather_routes::get_weather))
        .route(
            "/weather/:lat/:lon/forecast",
            get(weather_routes::get_forecast),
        )
        .route("/search/:city", get(weather_routes::search_city))
        .route(
            "/disaster-data/:disaster_type",
            get(routes::get_disaster_data),
        )
        .route("/download-report", get(routes::download_report))
        .route("/ml-predict", get(risk_routes::ml_predict))
        .route("/analytics", get(routes::get_analytics))
        .route(
            "/bookmarks",
            get(bookmarks::list_bookmarks).post(bookmarks::add_bookmark),
        )
        .with_state(state);

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Dashboard assets, when a built UI is present
    let ui_path = std::path::Path::new("static");
    let app = if ui_path.exists() {
        tracing::info!("   Serving UI from {}", ui_path.display());
        app.nest_service("/", ServeDir::new(ui_path))
    } else {
        app
    };

    let port = std::env::var("DISASTER_GATEWAY_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "5000".to_string());
    let addr = format!("0.0.0.0:{}", port);

    tracing::info!("Disaster gateway starting on {}", addr);
    tracing::info!("   Zone data directory: {}", data_dir);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "disaster-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
