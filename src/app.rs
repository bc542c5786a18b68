use crate::handlers;
use crate::session::{SessionId, SESSION_COOKIE};
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    let session_routes = Router::new()
        .route("/", get(handlers::index))
        .route("/team", post(handlers::select_team))
        .route("/nav/next", post(handlers::nav_next))
        .route("/nav/prev", post(handlers::nav_prev))
        .route("/nav/select", post(handlers::nav_select))
        .route("/pages/add", post(handlers::add_page))
        .route("/pages/remove", post(handlers::remove_page))
        .route("/screenshot-mode", post(handlers::toggle_screenshot_mode))
        .route("/kpis/add", post(handlers::add_kpi))
        .route("/kpis/update", post(handlers::update_kpi))
        .route("/kpis/remove", post(handlers::remove_kpi))
        .route("/kpis/font-size", post(handlers::set_font_size))
        .route("/performance-image", post(handlers::upload_performance_image))
        .route("/performance-image/remove", post(handlers::remove_performance_image))
        .route("/safety-news/add", post(handlers::add_safety_news))
        .route("/safety-news/remove", post(handlers::remove_safety_news))
        .route("/team-news/add", post(handlers::add_team_news))
        .route("/team-news/remove", post(handlers::remove_team_news))
        .route("/actions/add", post(handlers::add_action))
        .route("/actions/status", post(handlers::set_action_status))
        .route("/actions/remove", post(handlers::remove_action))
        .route("/content/pictures", post(handlers::upload_picture))
        .route("/content/pictures/remove", post(handlers::remove_picture))
        .route("/content/info/add", post(handlers::add_note))
        .route("/content/info/remove", post(handlers::remove_note))
        .route("/content/spreadsheets", post(handlers::upload_spreadsheet))
        .route("/content/spreadsheets/remove", post(handlers::remove_spreadsheet))
        .route("/media/performance-image", get(handlers::performance_image))
        .route("/media/pictures/:index", get(handlers::picture))
        .route("/guide", get(handlers::download_guide))
        .route("/api/session", get(handlers::get_session))
        .route("/api/nav", post(handlers::navigate))
        .route("/api/pages", post(handlers::api_add_page).delete(handlers::api_remove_page))
        .route("/api/kpis", get(handlers::list_kpis).post(handlers::api_add_kpi))
        .route_layer(middleware::from_fn_with_state(state.clone(), session_cookie));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/kpi/evaluate", post(handlers::evaluate))
        .merge(session_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Attaches the caller's session to the request, issuing a cookie for new sessions.
async fn session_cookie(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let requested = session_from_headers(request.headers());
    let (id, created) = state.sessions.lock().await.resolve(requested, Utc::now());
    request.extensions_mut().insert(SessionId(id));

    let mut response = next.run(request).await;
    if created {
        let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

fn session_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find_map(|raw| Uuid::parse_str(raw.trim()).ok())
}
