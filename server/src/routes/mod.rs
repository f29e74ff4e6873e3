use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::{attendees, comments, events, health_check, users};
use crate::state::AppState;

/// Resource routes only. Methods not listed here (e.g. `PUT` on an event)
/// answer 405.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/usuarios/registro", post(users::register_user))
        .route("/usuarios/token", post(users::obtain_token))
        .route("/usuarios/me", get(users::current_user))
        .route("/eventos", get(events::list_events).post(events::create_event))
        .route(
            "/eventos/:id",
            get(events::get_event)
                .patch(events::update_event)
                .delete(events::delete_event),
        )
        .route("/eventos/:id/asistentes", get(attendees::list_attendees))
        .route(
            "/eventos/:id/asistentes/registro",
            post(attendees::register_attendee),
        )
        .route("/eventos/:id/comentarios", get(comments::list_comments))
        .route("/eventos/:id/comentarios/crear", post(comments::create_comment))
        .with_state(state)
}

pub fn create_routes(state: AppState, config: &Config) -> Router {
    api_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(config.production))
        .layer(create_cors_layer(config.cors_allowed_origins.as_deref()))
}
