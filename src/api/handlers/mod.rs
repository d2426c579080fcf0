use std::sync::{MutexGuard, PoisonError};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AppState;
use crate::animator::PhaseAnimator;
use crate::editor::{Draft, EditField, SaveOutcome};
use crate::models::{
    FeatureCollection, FilterState, LevelFilter, LevelOption, Phase, PhaseFilter, LEVEL_OPTIONS,
};
use crate::session::{MapSession, SessionError, StyledFeature};
use crate::style::Style;
use crate::CoreError;

type ApiResult<T> = Result<T, (StatusCode, String)>;

// ============================================================
// Error Handling
// ============================================================

/// Map a session error to a response. Caller mistakes are returned as-is;
/// anything else is logged and sanitized.
fn session_error(e: SessionError) -> (StatusCode, String) {
    let status = match &e {
        SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        SessionError::Core(CoreError::NoSelection) => StatusCode::CONFLICT,
        SessionError::Core(CoreError::UnknownField(_))
        | SessionError::Core(CoreError::InvalidLevelFilter(_)) => StatusCode::BAD_REQUEST,
        SessionError::Core(_) => {
            tracing::error!("Internal error: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            );
        }
    };
    tracing::warn!("Request error: {}", e);
    (status, e.to_string())
}

fn session(state: &AppState) -> MutexGuard<'_, MapSession> {
    state.session.lock().unwrap_or_else(PoisonError::into_inner)
}

fn animator(state: &AppState) -> MutexGuard<'_, PhaseAnimator> {
    state.animator.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Features
// ============================================================

pub async fn get_features(State(state): State<AppState>) -> Json<FeatureCollection> {
    Json(session(&state).collection().clone())
}

pub async fn list_styled_features(State(state): State<AppState>) -> Json<Vec<StyledFeature>> {
    Json(session(&state).styled_features())
}

pub async fn get_feature_style(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Style>> {
    session(&state)
        .style_of(&id)
        .map(Json)
        .ok_or_else(|| session_error(SessionError::NotFound(id)))
}

// ============================================================
// Filters
// ============================================================

/// Partial filter update. Values use the selector strings, `"all"` included.
#[derive(Debug, Deserialize)]
pub struct UpdateFilterInput {
    pub phase: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FilterOptions {
    pub phases: Vec<Phase>,
    pub levels: Vec<LevelOption>,
}

pub async fn get_filter(State(state): State<AppState>) -> Json<FilterState> {
    Json(session(&state).filter().clone())
}

pub async fn update_filter(
    State(state): State<AppState>,
    Json(input): Json<UpdateFilterInput>,
) -> ApiResult<Json<FilterState>> {
    let level = input
        .level
        .as_deref()
        .map(LevelFilter::parse)
        .transpose()
        .map_err(|e| session_error(e.into()))?;

    let mut guard = session(&state);
    let mut filter = guard.filter().clone();
    if let Some(phase) = input.phase.as_deref() {
        filter.phase = PhaseFilter::parse(phase);
    }
    if let Some(level) = level {
        filter.level = level;
    }
    guard.set_filter(filter.clone());
    Ok(Json(filter))
}

pub async fn filter_options() -> Json<FilterOptions> {
    Json(FilterOptions {
        phases: Phase::CYCLE.to_vec(),
        levels: LEVEL_OPTIONS.to_vec(),
    })
}

// ============================================================
// Animation
// ============================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct AnimatorStatus {
    pub running: bool,
    pub phase: PhaseFilter,
    pub interval_ms: u64,
}

fn animator_snapshot(state: &AppState, running: bool, interval_ms: u64) -> Json<AnimatorStatus> {
    Json(AnimatorStatus {
        running,
        phase: session(state).filter().phase.clone(),
        interval_ms,
    })
}

pub async fn animator_status(State(state): State<AppState>) -> Json<AnimatorStatus> {
    let (running, interval_ms) = {
        let animator = animator(&state);
        (animator.is_running(), animator.interval().as_millis() as u64)
    };
    animator_snapshot(&state, running, interval_ms)
}

pub async fn start_animator(State(state): State<AppState>) -> Json<AnimatorStatus> {
    let interval_ms = {
        let mut animator = animator(&state);
        animator.start(state.session.clone());
        animator.interval().as_millis() as u64
    };
    animator_snapshot(&state, true, interval_ms)
}

pub async fn stop_animator(State(state): State<AppState>) -> Json<AnimatorStatus> {
    let interval_ms = {
        let mut animator = animator(&state);
        animator.stop();
        animator.interval().as_millis() as u64
    };
    animator_snapshot(&state, false, interval_ms)
}

pub async fn toggle_animator(State(state): State<AppState>) -> Json<AnimatorStatus> {
    let (running, interval_ms) = {
        let mut animator = animator(&state);
        let running = animator.toggle(state.session.clone());
        (running, animator.interval().as_millis() as u64)
    };
    animator_snapshot(&state, running, interval_ms)
}

// ============================================================
// Selection / editor
// ============================================================

/// One form input. Numbers are accepted and read as their text.
#[derive(Debug, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub field: String,
    pub value: Value,
}

impl FieldUpdate {
    fn text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

pub async fn select_feature(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Draft>> {
    session(&state).select(&id).map(Json).map_err(session_error)
}

pub async fn get_selection(State(state): State<AppState>) -> ApiResult<Json<Draft>> {
    session(&state)
        .selection()
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "No feature selected".to_string()))
}

pub async fn update_selection(
    State(state): State<AppState>,
    Json(input): Json<FieldUpdate>,
) -> ApiResult<Json<Draft>> {
    let field: EditField = input
        .field
        .parse()
        .map_err(|e: CoreError| session_error(e.into()))?;

    session(&state)
        .update(field, &input.text())
        .map(Json)
        .map_err(session_error)
}

pub async fn save_selection(State(state): State<AppState>) -> ApiResult<Json<SaveOutcome>> {
    session(&state).save().map(Json).map_err(session_error)
}

pub async fn cancel_selection(State(state): State<AppState>) -> StatusCode {
    session(&state).cancel();
    StatusCode::NO_CONTENT
}
