use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::aggregator::Aggregator;
use crate::error::ScrapeError;
use crate::models::{ProductRecord, SearchResponse};

pub struct AppState {
    pub aggregator: Aggregator,
}

#[derive(OpenApi)]
#[openapi(
    paths(scrape, health),
    components(schemas(SearchResponse, ProductRecord, ErrorBody, HealthResponse)),
    tags((name = "scraper", description = "Marketplace search scraping API"))
)]
pub struct ApiDoc;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScrapeQuery {
    /// Search keyword; omit to aggregate the default and fallback terms
    pub keyword: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// `ScrapeError` rendered as an HTTP response
pub struct ApiError(pub ScrapeError);

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ScrapeError::Blocked => StatusCode::SERVICE_UNAVAILABLE,
            ScrapeError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ScrapeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let details = self.0.details();
        if let Some(ref details) = details {
            error!(status = status.as_u16(), details = %details, "❌ {}", self.0);
        }

        let body = ErrorBody {
            error: self.0.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/api/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/scrape", get(scrape))
        .route("/api/health", get(health))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/scrape",
    params(ScrapeQuery),
    responses(
        (status = 200, description = "Products found", body = SearchResponse),
        (status = 503, description = "Challenge page served by the marketplace", body = ErrorBody),
        (status = 502, description = "Marketplace could not be reached", body = ErrorBody),
        (status = 500, description = "Unexpected failure", body = ErrorBody)
    ),
    tag = "scraper"
)]
pub async fn scrape(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let response = state.aggregator.search(query.keyword.as_deref()).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "scraper"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Route not found".to_string(),
            details: None,
        }),
    )
}
