use crate::kpi::{evaluate_kpi, KpiResult};
use crate::spreadsheet::SpreadsheetPreview;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAX_KPIS: usize = 6;
pub const MAX_PICTURES: usize = 4;
pub const MIN_FONT_SIZE: u8 = 16;
pub const MAX_FONT_SIZE: u8 = 40;
pub const DEFAULT_FONT_SIZE: u8 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    #[default]
    Pud,
    Wth,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Pud, Team::Wth];

    pub fn display_name(self) -> &'static str {
        match self {
            Team::Pud => "Team PUD",
            Team::Wth => "Team WTH",
        }
    }

    pub fn header_title(self) -> &'static str {
        match self {
            Team::Pud => "PUD Performance Dialogue",
            Team::Wth => "WTH Performance Dialogue",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Team::Pud => 0,
            Team::Wth => 1,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Team::Pud => "pud",
            Team::Wth => "wth",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Kpi {
    pub name: String,
    pub value: f64,
    pub target: f64,
    pub higher_is_better: bool,
    pub is_percentage: bool,
}

impl Default for Kpi {
    fn default() -> Self {
        Self {
            name: "New KPI".to_string(),
            value: 0.0,
            target: 100.0,
            higher_is_better: true,
            is_percentage: false,
        }
    }
}

impl Kpi {
    pub fn evaluate(&self) -> KpiResult {
        evaluate_kpi(self.value, self.target, self.higher_is_better, self.is_percentage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewsKind {
    Safety,
    News,
}

impl NewsKind {
    pub fn label(self) -> &'static str {
        match self {
            NewsKind::Safety => "Safety",
            NewsKind::News => "News",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub kind: NewsKind,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamNews {
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ActionStatus {
    #[default]
    Open,
    InProgress,
    Completed,
}

impl ActionStatus {
    pub const ALL: [ActionStatus; 3] = [ActionStatus::Open, ActionStatus::InProgress, ActionStatus::Completed];

    pub fn label(self) -> &'static str {
        match self {
            ActionStatus::Open => "Open",
            ActionStatus::InProgress => "In Progress",
            ActionStatus::Completed => "Completed",
        }
    }

    /// Variant name as submitted by the status select.
    pub fn form_value(self) -> &'static str {
        match self {
            ActionStatus::Open => "Open",
            ActionStatus::InProgress => "InProgress",
            ActionStatus::Completed => "Completed",
        }
    }

    pub fn display(self) -> String {
        match self {
            ActionStatus::Open => self.label().to_string(),
            ActionStatus::InProgress => format!("🟡 {}", self.label()),
            ActionStatus::Completed => format!("✅ {}", self.label()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaAction {
    pub idea: String,
    pub todo: String,
    pub who: String,
    pub when: String,
    #[serde(default)]
    pub status: ActionStatus,
}

/// Opaque handle for an uploaded image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoNote {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PageContent {
    pub pictures: Vec<UploadedFile>,
    pub picture_info: Vec<InfoNote>,
    pub spreadsheets: Vec<SpreadsheetPreview>,
}

impl PageContent {
    pub fn is_empty(&self) -> bool {
        self.pictures.is_empty() && self.spreadsheets.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamData {
    pub kpis: Vec<Kpi>,
    pub performance_image: Option<UploadedFile>,
    pub kpi_font_size: u8,
    pub safety_news: Vec<NewsItem>,
    pub team_news: Vec<TeamNews>,
    pub ideas_actions: Vec<IdeaAction>,
    pub additional_content: PageContent,
    pub additional_pages: BTreeMap<String, PageContent>,
}

impl Default for TeamData {
    fn default() -> Self {
        Self {
            kpis: Vec::new(),
            performance_image: None,
            kpi_font_size: DEFAULT_FONT_SIZE,
            safety_news: Vec::new(),
            team_news: Vec::new(),
            ideas_actions: Vec::new(),
            additional_content: PageContent::default(),
            additional_pages: BTreeMap::new(),
        }
    }
}

impl TeamData {
    /// Number of KPI slots on the dashboard; the chart image takes the space of four.
    pub fn kpi_slots(&self) -> usize {
        if self.performance_image.is_some() { 2 } else { MAX_KPIS }
    }
}

#[derive(Debug, Deserialize)]
pub struct TeamForm {
    pub team: Team,
}

#[derive(Debug, Deserialize)]
pub struct PageForm {
    pub page: String,
}

#[derive(Debug, Deserialize)]
pub struct IndexForm {
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct FontSizeForm {
    pub size: u8,
}

/// HTML checkboxes are only submitted when ticked, so the flags default to false.
#[derive(Debug, Deserialize)]
pub struct KpiForm {
    pub index: Option<usize>,
    pub name: String,
    pub value: f64,
    pub target: f64,
    #[serde(default, deserialize_with = "checkbox")]
    pub higher_is_better: bool,
    #[serde(default, deserialize_with = "checkbox")]
    pub is_percentage: bool,
}

impl KpiForm {
    pub fn into_kpi(self) -> Kpi {
        Kpi {
            name: self.name.trim().to_string(),
            value: self.value,
            target: self.target,
            higher_is_better: self.higher_is_better,
            is_percentage: self.is_percentage,
        }
    }
}

fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(matches!(value.as_str(), "on" | "true" | "1"))
}

#[derive(Debug, Deserialize)]
pub struct NewsForm {
    pub kind: NewsKind,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ContentForm {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ActionForm {
    pub idea: String,
    pub todo: String,
    pub who: String,
    pub when: String,
    #[serde(default)]
    pub status: ActionStatus,
}

#[derive(Debug, Deserialize)]
pub struct ActionStatusForm {
    pub index: usize,
    pub status: ActionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Previous,
}

#[derive(Debug, Deserialize)]
pub struct NavRequest {
    pub direction: Direction,
}

#[derive(Debug, Deserialize)]
pub struct RemovePageRequest {
    pub page: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub team: Team,
    pub pages: Vec<String>,
    pub current_page: String,
    pub current_index: usize,
    pub screenshot_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct KpiView {
    #[serde(flatten)]
    pub kpi: Kpi,
    pub evaluation: KpiResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_data_fills_missing_fields() {
        let data: TeamData = serde_json::from_str(r#"{"kpis": [{"name": "OTD"}]}"#).unwrap();
        assert_eq!(data.kpi_font_size, DEFAULT_FONT_SIZE);
        assert!(data.additional_pages.is_empty());
        assert_eq!(data.kpis[0].name, "OTD");
        assert_eq!(data.kpis[0].target, 100.0);
        assert!(data.kpis[0].higher_is_better);
    }

    #[test]
    fn kpi_slots_shrink_with_image() {
        let mut data = TeamData::default();
        assert_eq!(data.kpi_slots(), 6);
        data.performance_image = Some(UploadedFile {
            file_name: "chart.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        });
        assert_eq!(data.kpi_slots(), 2);
    }

    #[test]
    fn action_status_display_markers() {
        assert_eq!(ActionStatus::Open.display(), "Open");
        assert_eq!(ActionStatus::InProgress.display(), "🟡 In Progress");
        assert_eq!(ActionStatus::Completed.display(), "✅ Completed");
    }

    #[test]
    fn team_parses_from_slug() {
        let form: TeamForm = serde_json::from_str(r#"{"team": "wth"}"#).unwrap();
        assert_eq!(form.team, Team::Wth);
        assert_eq!(form.team.display_name(), "Team WTH");
    }
}
