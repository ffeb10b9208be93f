use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use shared_config::AppConfig;

use crate::handlers;

pub fn scheduling_routes(state: Arc<AppConfig>) -> Router {
    // Booking flow: horizon, week window and the selected day's slots
    let booking_routes = Router::new()
        .route("/horizon", get(handlers::get_horizon))
        .route("/window/select", post(handlers::select_day))
        .route("/window/select-index", post(handlers::select_day_at_index))
        .route("/window/forward", post(handlers::page_forward))
        .route("/window/backward", post(handlers::page_backward))
        .route("/doctors/{doctor_id}/slots", get(handlers::get_slots));

    // Waiting-room display
    let display_routes = Router::new()
        .route("/doctors/{doctor_id}/queue", get(handlers::get_queue));

    Router::new()
        .merge(booking_routes)
        .merge(display_routes)
        .with_state(state)
}
