use crate::models::{
    ActionStatus, Direction, IdeaAction, InfoNote, Kpi, NewsItem, PageContent, SessionSnapshot, Team, TeamData,
    TeamNews, UploadedFile, MAX_FONT_SIZE, MAX_KPIS, MAX_PICTURES, MIN_FONT_SIZE,
};
use crate::pages::{PageError, PageList, ADDITIONAL_CONTENT, DASHBOARD};
use crate::spreadsheet::SpreadsheetPreview;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Page(#[from] PageError),
    #[error("at most {max} {what} allowed")]
    Limit { what: &'static str, max: usize },
    #[error("no {what} at index {index}")]
    IndexOutOfRange { what: &'static str, index: usize },
    #[error("page '{0}' does not hold additional content")]
    NotContentPage(String),
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
}

/// Everything one browser session edits: both teams' dashboards plus navigation.
#[derive(Debug, Clone)]
pub struct DashboardSession {
    teams: [TeamData; 2],
    pages: PageList,
    current_page: String,
    selected_team: Team,
    screenshot_mode: bool,
}

impl Default for DashboardSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardSession {
    pub fn new() -> Self {
        Self {
            teams: [TeamData::default(), TeamData::default()],
            pages: PageList::new(),
            current_page: DASHBOARD.to_string(),
            selected_team: Team::default(),
            screenshot_mode: false,
        }
    }

    pub fn selected_team(&self) -> Team {
        self.selected_team
    }

    pub fn select_team(&mut self, team: Team) {
        self.selected_team = team;
    }

    pub fn team(&self) -> &TeamData {
        &self.teams[self.selected_team.index()]
    }

    fn team_mut(&mut self) -> &mut TeamData {
        &mut self.teams[self.selected_team.index()]
    }

    pub fn pages(&self) -> &PageList {
        &self.pages
    }

    pub fn current_page(&self) -> &str {
        &self.current_page
    }

    pub fn current_index(&self) -> Result<usize, PageError> {
        self.pages
            .position(&self.current_page)
            .ok_or_else(|| PageError::InvalidState(self.current_page.clone()))
    }

    pub fn is_dashboard(&self) -> bool {
        self.current_page == DASHBOARD
    }

    pub fn screenshot_mode(&self) -> bool {
        self.screenshot_mode
    }

    pub fn toggle_screenshot_mode(&mut self) -> bool {
        self.screenshot_mode = !self.screenshot_mode;
        self.screenshot_mode
    }

    pub fn select_page(&mut self, name: &str) -> Result<(), SessionError> {
        if !self.pages.contains(name) {
            return Err(PageError::NotFound(name.to_string()).into());
        }
        self.current_page = name.to_string();
        Ok(())
    }

    pub fn navigate(&mut self, direction: Direction) -> Result<&str, SessionError> {
        let target = match direction {
            Direction::Next => self.pages.next(&self.current_page)?,
            Direction::Previous => self.pages.previous(&self.current_page)?,
        };
        self.current_page = target.to_string();
        Ok(&self.current_page)
    }

    /// Appends a page and gives every team an empty content slot for it.
    pub fn add_page(&mut self) -> String {
        let name = self.pages.add_page();
        for data in self.teams.iter_mut() {
            data.additional_pages.insert(name.clone(), PageContent::default());
        }
        info!(page = %name, "page added");
        name
    }

    /// Removes a page; the selection falls back to the dashboard if it was showing.
    pub fn remove_page(&mut self, name: &str) -> Result<(), SessionError> {
        self.pages.remove_page(name)?;
        for data in self.teams.iter_mut() {
            data.additional_pages.remove(name);
        }
        if self.current_page == name {
            self.current_page = DASHBOARD.to_string();
        }
        info!(page = %name, "page removed");
        Ok(())
    }

    /// Right-hand header text: the date on the dashboard, the page number elsewhere.
    pub fn header_right(&self, today: NaiveDate) -> Result<String, PageError> {
        if self.is_dashboard() {
            return Ok(today.format("%B %d, %Y").to_string());
        }
        Ok(format!("Page {}", self.current_index()?))
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, PageError> {
        Ok(SessionSnapshot {
            team: self.selected_team,
            pages: self.pages.names().to_vec(),
            current_page: self.current_page.clone(),
            current_index: self.current_index()?,
            screenshot_mode: self.screenshot_mode,
        })
    }

    pub fn add_kpi(&mut self, kpi: Kpi) -> Result<usize, SessionError> {
        require_finite(&kpi)?;
        let kpis = &mut self.team_mut().kpis;
        if kpis.len() >= MAX_KPIS {
            return Err(SessionError::Limit { what: "KPIs", max: MAX_KPIS });
        }
        kpis.push(kpi);
        Ok(kpis.len() - 1)
    }

    pub fn update_kpi(&mut self, index: usize, kpi: Kpi) -> Result<(), SessionError> {
        require_finite(&kpi)?;
        let slot = self
            .team_mut()
            .kpis
            .get_mut(index)
            .ok_or(SessionError::IndexOutOfRange { what: "KPI", index })?;
        *slot = kpi;
        Ok(())
    }

    pub fn remove_kpi(&mut self, index: usize) -> Result<Kpi, SessionError> {
        remove_at(&mut self.team_mut().kpis, index, "KPI")
    }

    pub fn set_kpi_font_size(&mut self, size: u8) -> u8 {
        let size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.team_mut().kpi_font_size = size;
        size
    }

    pub fn set_performance_image(&mut self, image: Option<UploadedFile>) {
        self.team_mut().performance_image = image;
    }

    pub fn add_safety_news(&mut self, item: NewsItem) -> Result<(), SessionError> {
        require_text(&item.content, "news content")?;
        self.team_mut().safety_news.push(item);
        Ok(())
    }

    pub fn remove_safety_news(&mut self, index: usize) -> Result<NewsItem, SessionError> {
        remove_at(&mut self.team_mut().safety_news, index, "safety/news item")
    }

    pub fn add_team_news(&mut self, item: TeamNews) -> Result<(), SessionError> {
        require_text(&item.content, "team news")?;
        self.team_mut().team_news.push(item);
        Ok(())
    }

    pub fn remove_team_news(&mut self, index: usize) -> Result<TeamNews, SessionError> {
        remove_at(&mut self.team_mut().team_news, index, "team news item")
    }

    pub fn add_action(&mut self, action: IdeaAction) -> Result<(), SessionError> {
        require_text(&action.idea, "idea")?;
        self.team_mut().ideas_actions.push(action);
        Ok(())
    }

    pub fn set_action_status(&mut self, index: usize, status: ActionStatus) -> Result<(), SessionError> {
        let action = self
            .team_mut()
            .ideas_actions
            .get_mut(index)
            .ok_or(SessionError::IndexOutOfRange { what: "action", index })?;
        action.status = status;
        Ok(())
    }

    pub fn remove_action(&mut self, index: usize) -> Result<IdeaAction, SessionError> {
        remove_at(&mut self.team_mut().ideas_actions, index, "action")
    }

    /// Content of the current page, or `None` on the dashboard.
    pub fn current_content(&self) -> Option<&PageContent> {
        let team = self.team();
        match self.current_page.as_str() {
            DASHBOARD => None,
            ADDITIONAL_CONTENT => Some(&team.additional_content),
            page => team.additional_pages.get(page),
        }
    }

    fn current_content_mut(&mut self) -> Result<&mut PageContent, SessionError> {
        let page = self.current_page.clone();
        if page == DASHBOARD {
            return Err(SessionError::NotContentPage(page));
        }
        let team = self.team_mut();
        if page == ADDITIONAL_CONTENT {
            return Ok(&mut team.additional_content);
        }
        Ok(team.additional_pages.entry(page).or_default())
    }

    pub fn add_picture(&mut self, picture: UploadedFile) -> Result<usize, SessionError> {
        let pictures = &mut self.current_content_mut()?.pictures;
        if pictures.len() >= MAX_PICTURES {
            return Err(SessionError::Limit { what: "pictures per page", max: MAX_PICTURES });
        }
        pictures.push(picture);
        Ok(pictures.len() - 1)
    }

    pub fn remove_picture(&mut self, index: usize) -> Result<UploadedFile, SessionError> {
        remove_at(&mut self.current_content_mut()?.pictures, index, "picture")
    }

    pub fn add_note(&mut self, note: InfoNote) -> Result<(), SessionError> {
        require_text(&note.content, "content information")?;
        self.current_content_mut()?.picture_info.push(note);
        Ok(())
    }

    pub fn remove_note(&mut self, index: usize) -> Result<InfoNote, SessionError> {
        remove_at(&mut self.current_content_mut()?.picture_info, index, "note")
    }

    pub fn add_spreadsheet(&mut self, preview: SpreadsheetPreview) -> Result<(), SessionError> {
        self.current_content_mut()?.spreadsheets.push(preview);
        Ok(())
    }

    pub fn remove_spreadsheet(&mut self, index: usize) -> Result<SpreadsheetPreview, SessionError> {
        remove_at(&mut self.current_content_mut()?.spreadsheets, index, "spreadsheet")
    }
}

fn remove_at<T>(items: &mut Vec<T>, index: usize, what: &'static str) -> Result<T, SessionError> {
    if index >= items.len() {
        return Err(SessionError::IndexOutOfRange { what, index });
    }
    Ok(items.remove(index))
}

fn require_text(text: &str, field: &'static str) -> Result<(), SessionError> {
    if text.trim().is_empty() {
        return Err(SessionError::EmptyField(field));
    }
    Ok(())
}

fn require_finite(kpi: &Kpi) -> Result<(), SessionError> {
    if !kpi.value.is_finite() {
        return Err(SessionError::NotFinite("KPI value"));
    }
    if !kpi.target.is_finite() {
        return Err(SessionError::NotFinite("KPI target"));
    }
    Ok(())
}

pub const SESSION_COOKIE: &str = "session_id";

/// Session of the current request, resolved from the cookie before the handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId(pub Uuid);

#[derive(Debug)]
struct SessionEntry {
    dashboard: DashboardSession,
    last_seen: DateTime<Utc>,
}

/// Per-browser sessions keyed by the `session_id` cookie.
///
/// Holds at most `max_sessions` entries; starting one more evicts the least recently seen.
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<Uuid, SessionEntry>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Touches a known session or starts a new one. The flag is true for new sessions.
    pub fn resolve(&mut self, id: Option<Uuid>, now: DateTime<Utc>) -> (Uuid, bool) {
        if let Some(id) = id {
            if let Some(entry) = self.sessions.get_mut(&id) {
                entry.last_seen = now;
                return (id, false);
            }
        }

        self.prune(now);
        while self.sessions.len() >= self.max_sessions {
            self.evict_oldest();
        }
        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            SessionEntry {
                dashboard: DashboardSession::new(),
                last_seen: now,
            },
        );
        info!(session = %id, active = self.sessions.len(), "session started");
        (id, true)
    }

    pub fn get(&self, id: Uuid) -> Option<&DashboardSession> {
        self.sessions.get(&id).map(|entry| &entry.dashboard)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut DashboardSession> {
        self.sessions.get_mut(&id).map(|entry| &mut entry.dashboard)
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| now - entry.last_seen <= ttl);
        let pruned = before - self.sessions.len();
        if pruned > 0 {
            debug!(pruned, "expired sessions dropped");
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|(_, entry)| entry.last_seen)
            .map(|(id, _)| *id);
        if let Some(id) = oldest {
            self.sessions.remove(&id);
            debug!(session = %id, "session evicted");
        }
    }
}
