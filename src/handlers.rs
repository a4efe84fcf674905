use crate::errors::{AppError, StoreError};
use crate::export::{export_file_name, logs_to_csv};
use crate::models::{
    AnalyticsResponse, AttendanceRecord, AttendanceSheet, AttendanceStatus, AuditEntry, BulkActionRequest,
    DailyPresentPoint, DashboardResponse, LogFilter, LogsResponse, LoginRequest, Member,
    MemberPage, MemberPatch, MemberQuery, MemberStatsResponse, RangeQuery, SessionUser, SetAttendanceRequest,
    WindowQuery,
};
use crate::state::AppState;
use crate::stats::status_totals;
use crate::store::{DEFAULT_PER_PAGE, DEFAULT_PROFILE_WINDOW, UNKNOWN_USER, today};
use crate::ui::render_dashboard;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse},
};
use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let store = state.store.lock().await;
    Html(render_dashboard(&store.dashboard()))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionUser>, AppError> {
    let store = state.store.lock().await;
    let user = store
        .authenticate(payload.username.trim(), &payload.password)
        .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

    info!(user = %user.id, "login");
    Ok(Json(SessionUser::from(user)))
}

pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    let store = state.store.lock().await;
    Json(store.dashboard())
}

pub async fn list_members(
    State(state): State<AppState>,
    Query(query): Query<MemberQuery>,
) -> Json<MemberPage> {
    let store = state.store.lock().await;
    Json(store.member_page(
        query.query.as_deref(),
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(DEFAULT_PER_PAGE),
    ))
}

pub async fn create_member(State(state): State<AppState>) -> Result<(StatusCode, Json<Member>), AppError> {
    let mut store = state.store.lock().await;
    let mut next = store.clone();
    let member = next.add_member();

    state.storage.persist_members(next.members()).await?;
    state.storage.persist_member_seq(next.member_seq()).await?;
    *store = next;

    info!(member = %member.id, "member added");
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Member>, AppError> {
    let store = state.store.lock().await;
    Ok(Json(store.member(&id)?.clone()))
}

pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<MemberPatch>,
) -> Result<Json<Member>, AppError> {
    let mut store = state.store.lock().await;
    let mut next = store.clone();
    let member = next.update_member(&id, patch)?;

    state.storage.persist_members(next.members()).await?;
    *store = next;
    Ok(Json(member))
}

pub async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Member>, AppError> {
    let mut store = state.store.lock().await;
    let mut next = store.clone();
    let member = next.delete_member(&id)?;

    state.storage.persist_members(next.members()).await?;
    *store = next;

    info!(member = %member.id, "member deleted, attendance history kept");
    Ok(Json(member))
}

pub async fn member_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<MemberStatsResponse>, AppError> {
    let store = state.store.lock().await;
    store.member(&id)?;

    let window = store.recorded_dates_window(query.window.unwrap_or(DEFAULT_PROFILE_WINDOW));
    Ok(Json(MemberStatsResponse {
        stats: store.member_stats(&id, &window),
        trend: store.member_trend(&id, &window),
        member_id: id,
        window,
    }))
}

pub async fn attendance_sheet(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<AttendanceSheet>, AppError> {
    let date = parse_date(&date)?;
    let store = state.store.lock().await;
    Ok(Json(store.attendance_sheet(date)))
}

pub async fn set_attendance(
    State(state): State<AppState>,
    Path((date, member_id)): Path<(String, String)>,
    Json(payload): Json<SetAttendanceRequest>,
) -> Result<Json<AttendanceRecord>, AppError> {
    let date = parse_date(&date)?;
    let status = payload.status.parse::<AttendanceStatus>()?;
    let marked_by = payload.marked_by.unwrap_or_else(|| UNKNOWN_USER.to_string());

    let mut store = state.store.lock().await;
    let mut next = store.clone();
    let record = next.set_attendance(date, &member_id, status, &marked_by)?;
    state.storage.persist_attendance(next.attendance()).await?;
    *store = next;

    debug!(%date, member = %member_id, %status, "attendance set");
    Ok(Json(record))
}

pub async fn mark_all_present(
    State(state): State<AppState>,
    Path(date): Path<String>,
    body: Option<Json<BulkActionRequest>>,
) -> Result<Json<AttendanceSheet>, AppError> {
    let date = parse_date(&date)?;
    let by = actor(body);

    let mut store = state.store.lock().await;
    let mut next = store.clone();
    let marked = next.mark_all_present(date, &by);
    state.storage.persist_attendance(next.attendance()).await?;
    *store = next;

    info!(%date, marked, "all active members marked present");
    Ok(Json(store.attendance_sheet(date)))
}

pub async fn save_attendance(
    State(state): State<AppState>,
    Path(date): Path<String>,
    body: Option<Json<BulkActionRequest>>,
) -> Result<(StatusCode, Json<AuditEntry>), AppError> {
    let date = parse_date(&date)?;
    let by = actor(body);

    let mut store = state.store.lock().await;
    let mut next = store.clone();
    let entry = next.record_audit(date, &by);
    state.storage.persist_audit(next.audit()).await?;
    *store = next;

    info!(%date, by = %entry.by, "attendance saved");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_audit(State(state): State<AppState>) -> Json<Vec<AuditEntry>> {
    let store = state.store.lock().await;
    Json(store.audit().to_vec())
}

pub async fn logs(
    State(state): State<AppState>,
    Query(filter): Query<LogFilter>,
) -> Json<LogsResponse> {
    let store = state.store.lock().await;
    let rows = store.log_rows(&filter);
    let totals = status_totals(&rows);
    Json(LogsResponse { rows, totals })
}

pub async fn export_logs(
    State(state): State<AppState>,
    Query(filter): Query<LogFilter>,
) -> impl IntoResponse {
    let store = state.store.lock().await;
    let csv = logs_to_csv(&store.log_rows(&filter));
    let disposition = format!("attachment; filename=\"{}\"", export_file_name(today()));

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
}

/// Defaults to the seven days ending today.
pub async fn daily_stats(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<DailyPresentPoint>>, AppError> {
    let to = range.to.unwrap_or_else(today);
    let from = range
        .from
        .unwrap_or_else(|| to.checked_sub_signed(Duration::days(6)).unwrap_or(NaiveDate::MIN));

    let store = state.store.lock().await;
    Ok(Json(store.daily_present_counts(from, to)?))
}

pub async fn analytics(State(state): State<AppState>) -> Json<AnalyticsResponse> {
    let store = state.store.lock().await;
    Json(store.analytics())
}

fn parse_date(raw: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| StoreError::InvalidDate(raw.to_string()))
}

fn actor(body: Option<Json<BulkActionRequest>>) -> String {
    body.and_then(|Json(request)| request.by)
        .filter(|by| !by.is_empty())
        .unwrap_or_else(|| UNKNOWN_USER.to_string())
}
