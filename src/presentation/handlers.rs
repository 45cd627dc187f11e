// HTTP request handlers
use crate::domain::range::DateRange;
use crate::domain::series::SeriesSnapshot;
use crate::error::DashboardError;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Serialize, Deserialize)]
pub struct RangeResponse {
    pub range: DateRange,
    pub days: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeRequest {
    pub range: DateRange,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshAccepted {
    pub epoch: u64,
    pub range: DateRange,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CustomSeriesRequest {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Names of every series in the store
pub async fn list_metrics(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.dashboard_service.metric_names().await.into_iter().collect())
}

pub async fn get_series(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SeriesSnapshot>, StatusCode> {
    state
        .dashboard_service
        .series(&name)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn get_range(State(state): State<Arc<AppState>>) -> Json<RangeResponse> {
    let (range, window) = state.dashboard_service.selected_range().await;
    Json(RangeResponse {
        range,
        days: window.days,
    })
}

/// Select a range and start a refresh; results arrive on `/events`
pub async fn put_range(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RangeRequest>,
) -> Response {
    let service = &state.dashboard_service;
    match service.select_range(body.range).await {
        Ok(handle) => {
            let accepted = RefreshAccepted {
                epoch: handle.epoch,
                range: handle.range,
                start: handle.window.start,
                end: handle.window.end,
            };
            service.watch(handle);
            (StatusCode::ACCEPTED, Json(accepted)).into_response()
        }
        Err(e @ DashboardError::AuthorizationDenied) => {
            error_response(StatusCode::FORBIDDEN, e.to_string())
        }
        Err(e @ DashboardError::Superseded { .. }) => {
            error_response(StatusCode::CONFLICT, e.to_string())
        }
        Err(e) => {
            tracing::error!("Error starting refresh: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub async fn add_custom_series(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CustomSeriesRequest>,
) -> Response {
    match state
        .dashboard_service
        .add_custom_series(&request.name, &request.unit, &request.text)
        .await
    {
        Ok(snapshot) => (StatusCode::CREATED, Json(snapshot)).into_response(),
        Err(e) => error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    }
}

/// Stream store changes as server-sent events
pub async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let mut rx = state.dashboard_service.subscribe().await;

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => yield Event::default().json_data(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event subscriber lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
