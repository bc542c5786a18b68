use crate::errors::AppError;
use crate::guide::{guide_file_name, screenshot_guide};
use crate::kpi::{evaluate_kpi, EvaluateRequest, KpiResult};
use crate::models::{
    ActionForm, ActionStatusForm, ContentForm, Direction, FontSizeForm, IdeaAction, IndexForm, InfoNote, Kpi,
    KpiForm, KpiView, NavRequest, NewsForm, NewsItem, PageForm, RemovePageRequest, SessionSnapshot, TeamData,
    TeamForm, TeamNews, UploadedFile,
};
use crate::session::{DashboardSession, SessionId};
use crate::spreadsheet::load_preview;
use crate::state::AppState;
use crate::ui::render_page;
use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{Html, IntoResponse, Redirect},
    Extension, Form, Json,
};
use chrono::Local;
use tracing::info;

type FormResult = Result<Redirect, AppError>;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn index(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
) -> Result<Html<String>, AppError> {
    let now = Local::now().naive_local();
    let page = state
        .with_session(id, |session| render_page(session, now).map_err(AppError::from))
        .await?;
    Ok(Html(page))
}

/// Applies a form action to the session and re-renders via redirect.
async fn apply(
    state: &AppState,
    id: uuid::Uuid,
    action: impl FnOnce(&mut DashboardSession) -> Result<(), AppError>,
) -> FormResult {
    state.with_session(id, action).await?;
    Ok(Redirect::to("/"))
}

pub async fn select_team(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<TeamForm>,
) -> FormResult {
    apply(&state, id, |session| {
        session.select_team(form.team);
        Ok(())
    })
    .await
}

pub async fn nav_next(State(state): State<AppState>, Extension(SessionId(id)): Extension<SessionId>) -> FormResult {
    apply(&state, id, |session| {
        session.navigate(Direction::Next)?;
        Ok(())
    })
    .await
}

pub async fn nav_prev(State(state): State<AppState>, Extension(SessionId(id)): Extension<SessionId>) -> FormResult {
    apply(&state, id, |session| {
        session.navigate(Direction::Previous)?;
        Ok(())
    })
    .await
}

pub async fn nav_select(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<PageForm>,
) -> FormResult {
    apply(&state, id, |session| Ok(session.select_page(&form.page)?)).await
}

pub async fn add_page(State(state): State<AppState>, Extension(SessionId(id)): Extension<SessionId>) -> FormResult {
    apply(&state, id, |session| {
        session.add_page();
        Ok(())
    })
    .await
}

pub async fn remove_page(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<PageForm>,
) -> FormResult {
    apply(&state, id, |session| Ok(session.remove_page(&form.page)?)).await
}

pub async fn toggle_screenshot_mode(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
) -> FormResult {
    apply(&state, id, |session| {
        let enabled = session.toggle_screenshot_mode();
        info!(enabled, "screenshot mode toggled");
        Ok(())
    })
    .await
}

pub async fn add_kpi(State(state): State<AppState>, Extension(SessionId(id)): Extension<SessionId>) -> FormResult {
    apply(&state, id, |session| {
        session.add_kpi(Kpi::default())?;
        Ok(())
    })
    .await
}

pub async fn update_kpi(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<KpiForm>,
) -> FormResult {
    let index = form.index.ok_or_else(|| AppError::bad_request("index is required"))?;
    apply(&state, id, |session| Ok(session.update_kpi(index, form.into_kpi())?)).await
}

pub async fn remove_kpi(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<IndexForm>,
) -> FormResult {
    apply(&state, id, |session| {
        session.remove_kpi(form.index)?;
        Ok(())
    })
    .await
}

pub async fn set_font_size(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<FontSizeForm>,
) -> FormResult {
    apply(&state, id, |session| {
        session.set_kpi_font_size(form.size);
        Ok(())
    })
    .await
}

pub async fn upload_performance_image(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    mut multipart: Multipart,
) -> FormResult {
    let image = read_image(&mut multipart).await?;
    info!(file = %image.file_name, bytes = image.bytes.len(), "performance image uploaded");
    apply(&state, id, |session| {
        session.set_performance_image(Some(image));
        Ok(())
    })
    .await
}

pub async fn remove_performance_image(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
) -> FormResult {
    apply(&state, id, |session| {
        session.set_performance_image(None);
        Ok(())
    })
    .await
}

pub async fn add_safety_news(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<NewsForm>,
) -> FormResult {
    let item = NewsItem {
        kind: form.kind,
        content: form.content.trim().to_string(),
    };
    apply(&state, id, |session| Ok(session.add_safety_news(item)?)).await
}

pub async fn remove_safety_news(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<IndexForm>,
) -> FormResult {
    apply(&state, id, |session| {
        session.remove_safety_news(form.index)?;
        Ok(())
    })
    .await
}

pub async fn add_team_news(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<ContentForm>,
) -> FormResult {
    let item = TeamNews {
        content: form.content.trim().to_string(),
    };
    apply(&state, id, |session| Ok(session.add_team_news(item)?)).await
}

pub async fn remove_team_news(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<IndexForm>,
) -> FormResult {
    apply(&state, id, |session| {
        session.remove_team_news(form.index)?;
        Ok(())
    })
    .await
}

pub async fn add_action(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<ActionForm>,
) -> FormResult {
    let action = IdeaAction {
        idea: form.idea.trim().to_string(),
        todo: form.todo.trim().to_string(),
        who: form.who.trim().to_string(),
        when: form.when.trim().to_string(),
        status: form.status,
    };
    apply(&state, id, |session| Ok(session.add_action(action)?)).await
}

pub async fn set_action_status(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<ActionStatusForm>,
) -> FormResult {
    apply(&state, id, |session| Ok(session.set_action_status(form.index, form.status)?)).await
}

pub async fn remove_action(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<IndexForm>,
) -> FormResult {
    apply(&state, id, |session| {
        session.remove_action(form.index)?;
        Ok(())
    })
    .await
}

pub async fn upload_picture(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    mut multipart: Multipart,
) -> FormResult {
    let picture = read_image(&mut multipart).await?;
    info!(file = %picture.file_name, bytes = picture.bytes.len(), "picture uploaded");
    apply(&state, id, |session| {
        session.add_picture(picture)?;
        Ok(())
    })
    .await
}

pub async fn remove_picture(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<IndexForm>,
) -> FormResult {
    apply(&state, id, |session| {
        session.remove_picture(form.index)?;
        Ok(())
    })
    .await
}

pub async fn add_note(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<ContentForm>,
) -> FormResult {
    let note = InfoNote {
        content: form.content.trim().to_string(),
    };
    apply(&state, id, |session| Ok(session.add_note(note)?)).await
}

pub async fn remove_note(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<IndexForm>,
) -> FormResult {
    apply(&state, id, |session| {
        session.remove_note(form.index)?;
        Ok(())
    })
    .await
}

pub async fn upload_spreadsheet(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    mut multipart: Multipart,
) -> FormResult {
    let upload = read_file(&mut multipart).await?;
    let preview = load_preview(&upload.file_name, &upload.bytes, state.config.preview_rows)?;
    let (rows, columns) = preview.shape();
    info!(file = %preview.file_name, rows, columns, "spreadsheet preview loaded");
    apply(&state, id, |session| Ok(session.add_spreadsheet(preview)?)).await
}

pub async fn remove_spreadsheet(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<IndexForm>,
) -> FormResult {
    apply(&state, id, |session| {
        session.remove_spreadsheet(form.index)?;
        Ok(())
    })
    .await
}

pub async fn performance_image(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
) -> Result<impl IntoResponse, AppError> {
    let image = state
        .with_session(id, |session| {
            session
                .team()
                .performance_image
                .clone()
                .ok_or_else(|| AppError::not_found("no performance image uploaded"))
        })
        .await?;
    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        image.bytes,
    ))
}

pub async fn picture(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, AppError> {
    let image = state
        .with_session(id, |session| {
            session
                .current_content()
                .and_then(|content| content.pictures.get(index))
                .cloned()
                .ok_or_else(|| AppError::not_found(format!("no picture at index {index}")))
        })
        .await?;
    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        image.bytes,
    ))
}

pub async fn download_guide(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
) -> Result<impl IntoResponse, AppError> {
    let now = Local::now().naive_local();
    let (team, guide) = state
        .with_session(id, |session| {
            let team = session.selected_team();
            Ok((team, screenshot_guide(team.header_title(), session.pages().names(), now)))
        })
        .await?;
    let disposition = format!("attachment; filename=\"{}\"", guide_file_name(team.display_name(), now));
    info!(team = team.display_name(), "screenshot guide generated");
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        guide,
    ))
}

pub async fn evaluate(Json(request): Json<EvaluateRequest>) -> Json<KpiResult> {
    Json(evaluate_kpi(
        request.value,
        request.target,
        request.higher_is_better,
        request.is_percentage,
    ))
}

pub async fn get_session(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = state.with_session(id, |session| Ok(session.snapshot()?)).await?;
    Ok(Json(snapshot))
}

pub async fn navigate(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Json(request): Json<NavRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = state
        .with_session(id, |session| {
            session.navigate(request.direction)?;
            Ok(session.snapshot()?)
        })
        .await?;
    Ok(Json(snapshot))
}

pub async fn api_add_page(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = state
        .with_session(id, |session| {
            session.add_page();
            Ok(session.snapshot()?)
        })
        .await?;
    Ok(Json(snapshot))
}

pub async fn api_remove_page(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Json(request): Json<RemovePageRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = state
        .with_session(id, |session| {
            session.remove_page(&request.page)?;
            Ok(session.snapshot()?)
        })
        .await?;
    Ok(Json(snapshot))
}

pub async fn list_kpis(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
) -> Result<Json<Vec<KpiView>>, AppError> {
    let kpis = state.with_session(id, |session| Ok(kpi_views(session.team()))).await?;
    Ok(Json(kpis))
}

pub async fn api_add_kpi(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Json(kpi): Json<Kpi>,
) -> Result<Json<Vec<KpiView>>, AppError> {
    let kpis = state
        .with_session(id, |session| {
            session.add_kpi(kpi)?;
            Ok(kpi_views(session.team()))
        })
        .await?;
    Ok(Json(kpis))
}

fn kpi_views(team: &TeamData) -> Vec<KpiView> {
    team.kpis
        .iter()
        .map(|kpi| KpiView {
            kpi: kpi.clone(),
            evaluation: kpi.evaluate(),
        })
        .collect()
}

async fn read_file(multipart: &mut Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().trim().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await?;
        if file_name.is_empty() || bytes.is_empty() {
            return Err(AppError::bad_request("choose a file to upload"));
        }
        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(AppError::bad_request("missing 'file' field"))
}

async fn read_image(multipart: &mut Multipart) -> Result<UploadedFile, AppError> {
    let upload = read_file(multipart).await?;
    if !upload.content_type.starts_with("image/") {
        return Err(AppError::bad_request(format!(
            "'{}' is not an image ({})",
            upload.file_name, upload.content_type
        )));
    }
    Ok(upload)
}
