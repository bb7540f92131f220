use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{
    Coordinate, Place, PlaceFetchOrchestrator, PlaceFinderError, VERSION,
    orchestrator::PRIMARY_DEPENDENCY, resilience::CircuitStatus,
};

/// Search radius in meters when the request does not give one
pub const DEFAULT_RADIUS_M: u32 = 1500;

pub type AppState = Arc<PlaceFetchOrchestrator>;

#[derive(Debug, Deserialize)]
pub struct PlacesQuery {
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "default_radius")]
    pub radius: u32,
}

fn default_radius() -> u32 {
    DEFAULT_RADIUS_M
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiHealth {
    pub status: String,
    pub version: String,
    pub primary_circuit: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn error_response(err: &PlaceFinderError) -> (StatusCode, Json<ApiError>) {
    let status = match err {
        PlaceFinderError::Validation { .. } => StatusCode::BAD_REQUEST,
        PlaceFinderError::Dependency { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ApiError {
            error: err.user_message(),
        }),
    )
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/places", get(get_places))
        .route("/health", get(get_health))
        .with_state(state)
}

async fn get_places(
    State(orchestrator): State<AppState>,
    Query(query): Query<PlacesQuery>,
) -> ApiResult<Vec<Place>> {
    let coordinate = Coordinate::try_new(query.lat, query.lng).map_err(|e| error_response(&e))?;
    if query.radius == 0 {
        return Err(error_response(&PlaceFinderError::validation(
            "radius must be greater than zero",
        )));
    }

    let places = orchestrator
        .fetch(coordinate, query.radius)
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(places))
}

async fn get_health(State(orchestrator): State<AppState>) -> Json<ApiHealth> {
    let primary_circuit = match orchestrator.circuit_breaker().status(PRIMARY_DEPENDENCY) {
        CircuitStatus::Closed => "closed",
        CircuitStatus::Open => "open",
    };

    Json(ApiHealth {
        status: "ok".to_string(),
        version: VERSION.to_string(),
        primary_circuit: primary_circuit.to_string(),
    })
}
