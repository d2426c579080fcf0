mod handlers;

use std::sync::{Arc, Mutex};

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::animator::PhaseAnimator;
use crate::session::{MapSession, SharedSession};

/// State shared by all handlers: the view session and its animator.
#[derive(Clone)]
pub struct AppState {
    pub session: SharedSession,
    pub animator: Arc<Mutex<PhaseAnimator>>,
}

impl AppState {
    pub fn new(session: MapSession, animator: PhaseAnimator) -> Self {
        Self {
            session: session.shared(),
            animator: Arc::new(Mutex::new(animator)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    create_router_with_cors(state, None)
}

/// Build the router, restricting CORS to `origins` when given.
pub fn create_router_with_cors(state: AppState, origins: Option<&[String]>) -> Router {
    let api = Router::new()
        // Features
        .route("/features", get(handlers::get_features))
        .route("/features/styled", get(handlers::list_styled_features))
        .route("/features/{id}/style", get(handlers::get_feature_style))
        .route("/features/{id}/select", post(handlers::select_feature))
        // Filters
        .route(
            "/filter",
            get(handlers::get_filter).put(handlers::update_filter),
        )
        .route("/filter/options", get(handlers::filter_options))
        // Animation
        .route("/animator", get(handlers::animator_status))
        .route("/animator/start", post(handlers::start_animator))
        .route("/animator/stop", post(handlers::stop_animator))
        .route("/animator/toggle", post(handlers::toggle_animator))
        // Selection / editor
        .route(
            "/selection",
            get(handlers::get_selection)
                .patch(handlers::update_selection)
                .delete(handlers::cancel_selection),
        )
        .route("/selection/save", post(handlers::save_selection))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(origins))
        .with_state(state)
}

fn cors_layer(origins: Option<&[String]>) -> CorsLayer {
    match origins {
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match origin.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    }
}
