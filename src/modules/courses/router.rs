use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    approve_course, create_course, delete_course, get_course, get_courses, publish_course,
    reject_course, start_review, submit_course, update_course, upload_summary,
};

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_course).get(get_courses))
        .route(
            "/{id}",
            get(get_course).patch(update_course).delete(delete_course),
        )
        .route("/{id}/submit", post(submit_course))
        .route("/{id}/review", post(start_review))
        .route("/{id}/approve", post(approve_course))
        .route("/{id}/reject", post(reject_course))
        .route("/{id}/publish", post(publish_course))
        .route("/{id}/summary", post(upload_summary))
}
