use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{get_notifications, mark_read, unread_count};

pub fn init_notifications_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_notifications))
        .route("/unread-count", get(unread_count))
        .route("/{id}/read", post(mark_read))
}
