use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::domain::{SalaryInput, ValidationError};
use super::engine::PredictionEngine;
use super::history::{PredictionRecord, StatisticsSummary};
use super::views::{
    Diagnostics, HealthView, ModelInfo, PredictionResponse, ReloadSummary, WelcomeView,
};
use crate::error::AppError;

pub const DEFAULT_HISTORY_LIMIT: i64 = 10;

const ENDPOINTS: [&str; 9] = [
    "/",
    "/health",
    "/predict",
    "/model-info",
    "/statistics",
    "/history",
    "/debug",
    "/reload-model",
    "/test-prediction",
];

/// Router builder exposing the prediction, history and model-management
/// endpoints.
pub fn prediction_router(engine: Arc<PredictionEngine>) -> Router {
    Router::new()
        .route("/", get(welcome_handler))
        .route("/health", get(health_handler))
        .route("/debug", get(debug_handler))
        .route("/predict", post(predict_handler))
        .route("/model-info", get(model_info_handler))
        .route("/statistics", get(statistics_handler))
        .route(
            "/history",
            get(history_handler).delete(clear_history_handler),
        )
        .route("/reload-model", post(reload_handler))
        .route("/test-prediction", post(test_prediction_handler))
        .with_state(engine)
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: i64,
}

fn default_history_limit() -> i64 {
    DEFAULT_HISTORY_LIMIT
}

pub(crate) async fn welcome_handler(
    State(engine): State<Arc<PredictionEngine>>,
) -> Json<WelcomeView> {
    Json(WelcomeView {
        message: "Welcome to the Salary Predictor API",
        status: "active",
        model_loaded: engine.status().model_loaded,
        available_endpoints: ENDPOINTS.to_vec(),
    })
}

pub(crate) async fn health_handler(
    State(engine): State<Arc<PredictionEngine>>,
) -> Json<HealthView> {
    Json(HealthView::from(&engine.status()))
}

pub(crate) async fn debug_handler(
    State(engine): State<Arc<PredictionEngine>>,
) -> Json<Diagnostics> {
    Json(engine.diagnostics())
}

pub(crate) async fn predict_handler(
    State(engine): State<Arc<PredictionEngine>>,
    payload: Result<Json<SalaryInput>, JsonRejection>,
) -> Result<Json<PredictionResponse>, AppError> {
    let Json(input) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "unreadable prediction payload");
        ValidationError::Malformed(rejection.body_text())
    })?;
    run_prediction(&engine, input).map(Json)
}

fn run_prediction(
    engine: &PredictionEngine,
    input: SalaryInput,
) -> Result<PredictionResponse, AppError> {
    if let Err(err) = input.validate() {
        warn!(error = %err, "rejected prediction input");
        return Err(err.into());
    }
    let outcome = engine.predict(&input)?;
    Ok(PredictionResponse {
        predicted_salary: outcome.predicted_salary,
        input_data: input,
        confidence_score: outcome.confidence_score,
    })
}

pub(crate) async fn model_info_handler(
    State(engine): State<Arc<PredictionEngine>>,
) -> Json<ModelInfo> {
    Json(engine.model_info())
}

pub(crate) async fn statistics_handler(
    State(engine): State<Arc<PredictionEngine>>,
) -> Json<StatisticsSummary> {
    Json(engine.statistics())
}

pub(crate) async fn history_handler(
    State(engine): State<Arc<PredictionEngine>>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<PredictionRecord>>, AppError> {
    let Query(query) =
        query.map_err(|rejection| ValidationError::Malformed(rejection.body_text()))?;
    info!(limit = query.limit, "prediction history requested");
    Ok(Json(engine.history(query.limit)))
}

pub(crate) async fn clear_history_handler(
    State(engine): State<Arc<PredictionEngine>>,
) -> Json<Value> {
    engine.clear_history();
    Json(json!({ "message": "Prediction history cleared" }))
}

pub(crate) async fn reload_handler(
    State(engine): State<Arc<PredictionEngine>>,
) -> Json<ReloadSummary> {
    Json(engine.reload())
}

/// Push the fixed sample input through the full pipeline, reporting failures
/// in the body instead of the status code.
pub(crate) async fn test_prediction_handler(
    State(engine): State<Arc<PredictionEngine>>,
) -> Json<Value> {
    match run_prediction(&engine, SalaryInput::sample()) {
        Ok(result) => Json(json!({
            "test_successful": true,
            "result": result,
            "message": "Test prediction completed successfully",
        })),
        Err(err) => Json(json!({
            "test_successful": false,
            "error": err.to_string(),
            "message": "Test prediction failed",
        })),
    }
}
