use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        Form, Json, State,
    },
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use log::{error, info, warn};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::assessment::{assess, Assessment, RiskCategory, Severity};
use crate::error::{HeartRiskError, Result};
use crate::features::{Features, RawFeatures};
use crate::model::Classifier;
use crate::render::{render_page, Outcome};

pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

#[derive(Clone)]
struct AppState {
    model: Arc<dyn Classifier>,
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    label: i32,
    probability: f64,
    percent: String,
    category: RiskCategory,
    severity: Severity,
    message: &'static str,
}

impl From<Assessment> for PredictResponse {
    fn from(assessment: Assessment) -> Self {
        PredictResponse {
            label: assessment.label,
            probability: assessment.probability,
            percent: assessment.percent(),
            category: assessment.category,
            severity: assessment.severity,
            message: assessment.severity.message(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(model: Arc<dyn Classifier>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/predict", post(predict_json))
        .route("/health", get(health))
        .layer(cors)
        .with_state(AppState { model })
}

pub async fn serve(addr: SocketAddr, model: Arc<dyn Classifier>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(HeartRiskError::Server)?;
    info!("heart-risk listening on http://{addr}");
    axum::serve(listener, router(model))
        .await
        .map_err(HeartRiskError::Server)
}

fn run(model: &dyn Classifier, raw: RawFeatures) -> Result<(Features, Assessment)> {
    let features = Features::try_from(raw)?;
    let assessment = assess(model, &features)?;
    info!(
        "predicted label {} with probability {:.3}",
        assessment.label, assessment.probability
    );
    Ok((features, assessment))
}

fn status_of(err: &HeartRiskError) -> StatusCode {
    if err.is_input_error() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        error!("prediction failed: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn index() -> Html<String> {
    Html(render_page(&RawFeatures::default(), None))
}

async fn predict_form(
    State(state): State<AppState>,
    form: std::result::Result<Form<RawFeatures>, FormRejection>,
) -> Response {
    let raw = match form {
        Ok(Form(raw)) => raw,
        Err(rejection) => {
            warn!("form rejected: {}", rejection.body_text());
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render_page(
                    &RawFeatures::default(),
                    Some(&Outcome::Rejected(rejection.body_text())),
                )),
            )
                .into_response();
        }
    };
    match run(state.model.as_ref(), raw) {
        Ok((features, assessment)) => Html(render_page(
            &features.raw(),
            Some(&Outcome::Assessed(assessment)),
        ))
        .into_response(),
        Err(e) => (
            status_of(&e),
            Html(render_page(&raw, Some(&Outcome::Rejected(e.to_string())))),
        )
            .into_response(),
    }
}

async fn predict_json(
    State(state): State<AppState>,
    body: std::result::Result<Json<RawFeatures>, JsonRejection>,
) -> Response {
    let raw = match body {
        Ok(Json(raw)) => raw,
        Err(rejection) => {
            warn!("json body rejected: {}", rejection.body_text());
            // 422 for mistyped fields, 400/415 for bodies that are not JSON at all
            return (
                rejection.status(),
                Json(ErrorResponse {
                    error: rejection.body_text(),
                }),
            )
                .into_response();
        }
    };
    match run(state.model.as_ref(), raw) {
        Ok((_, assessment)) => Json(PredictResponse::from(assessment)).into_response(),
        Err(e) => (
            status_of(&e),
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}
