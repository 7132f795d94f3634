pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::agents::handlers as agents;
use crate::applications::handlers as applications;
use crate::notifications::handlers as notifications;
use crate::opportunities::handlers as opportunities;
use crate::questions::handlers as questions;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Opportunities and their question sets
        .route(
            "/api/v1/opportunities",
            get(opportunities::handle_list_opportunities),
        )
        .route(
            "/api/v1/opportunities/:id",
            get(opportunities::handle_get_opportunity),
        )
        .route(
            "/api/v1/opportunities/:id/questions",
            get(questions::handle_list_questions)
                .post(questions::handle_create_question)
                .put(questions::handle_reorder_questions),
        )
        .route(
            "/api/v1/opportunities/:id/questions/sync",
            put(questions::handle_sync_questions),
        )
        .route(
            "/api/v1/questions/:id",
            get(questions::handle_get_question)
                .put(questions::handle_update_question)
                .delete(questions::handle_delete_question),
        )
        // Applications
        .route(
            "/api/v1/applications",
            get(applications::handle_list_applications)
                .post(applications::handle_submit_application),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::handle_get_application),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(applications::handle_update_status),
        )
        // Notification feed
        .route(
            "/api/v1/notifications",
            get(notifications::handle_list_notifications),
        )
        .route(
            "/api/v1/notifications/unread-count",
            get(notifications::handle_unread_count),
        )
        .route(
            "/api/v1/notifications/read-all",
            post(notifications::handle_mark_all_read),
        )
        .route(
            "/api/v1/notifications/:id/read",
            post(notifications::handle_mark_read),
        )
        // Agent profile
        .route(
            "/api/v1/agents/me",
            get(agents::handle_get_profile).put(agents::handle_update_profile),
        )
        .with_state(state)
}
