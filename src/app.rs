use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/login", post(handlers::login))
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/members", get(handlers::list_members).post(handlers::create_member))
        .route(
            "/api/members/:id",
            get(handlers::get_member)
                .patch(handlers::update_member)
                .delete(handlers::delete_member),
        )
        .route("/api/members/:id/stats", get(handlers::member_stats))
        .route("/api/attendance/:date", get(handlers::attendance_sheet))
        .route("/api/attendance/:date/mark-all", post(handlers::mark_all_present))
        .route("/api/attendance/:date/save", post(handlers::save_attendance))
        .route("/api/attendance/:date/:member_id", put(handlers::set_attendance))
        .route("/api/audit", get(handlers::list_audit))
        .route("/api/logs", get(handlers::logs))
        .route("/api/logs/export", get(handlers::export_logs))
        .route("/api/stats/daily", get(handlers::daily_stats))
        .route("/api/analytics", get(handlers::analytics))
        .with_state(state)
}
