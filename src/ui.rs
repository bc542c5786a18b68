use crate::models::{ActionStatus, Kpi, NewsKind, PageContent, Team, TeamData, MAX_FONT_SIZE, MAX_KPIS, MAX_PICTURES, MIN_FONT_SIZE};
use crate::pages::PageError;
use crate::session::DashboardSession;
use crate::spreadsheet::SpreadsheetPreview;
use chrono::NaiveDateTime;
use maud::{html, Markup, PreEscaped, DOCTYPE};

const SLOGAN: &str = "Excellence. Simply delivered.";

pub fn render_page(session: &DashboardSession, now: NaiveDateTime) -> Result<String, PageError> {
    let team = session.selected_team();
    let header_right = session.header_right(now.date())?;
    let screenshot_mode = session.screenshot_mode();

    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Performance Dashboard" }
                style { (PreEscaped(CSS)) }
            }
            body.screenshot-mode[screenshot_mode] {
                @if !screenshot_mode {
                    (render_sidebar(session))
                }
                main.app {
                    header.main-header {
                        div {
                            span.header-title { (team.header_title()) }
                            span.header-slogan { (SLOGAN) }
                        }
                        span.header-date { (header_right) }
                    }
                    @match session.current_content() {
                        Some(content) => { (render_content_page(content)) }
                        None => { (render_dashboard(session.team())) }
                    }
                    @if screenshot_mode {
                        form.screenshot-exit method="post" action="/screenshot-mode" {
                            button type="submit" title="Show sidebar and navigation" { "👁️" }
                        }
                    } @else {
                        (render_nav_bar(session.current_page()))
                    }
                }
            }
        }
    };

    Ok(markup.into_string())
}

fn render_sidebar(session: &DashboardSession) -> Markup {
    let selected = session.selected_team();
    let pages = session.pages();

    html! {
        aside.sidebar {
            section {
                h3 { "👥 Team Selection" }
                form method="post" action="/team" {
                    select name="team" onchange="this.form.submit()" {
                        @for team in Team::ALL {
                            option value=(team.slug()) selected[team == selected] { (team.display_name()) }
                        }
                    }
                    noscript { button type="submit" { "Select" } }
                }
            }
            hr;
            section {
                h3 { "📸 Export Dashboard" }
                p.tip { "💡 Tip: hide the sidebar before taking screenshots." }
                a.button.wide href="/guide" { "📋 Download Screenshot Guide" }
                details {
                    summary { "🖥️ Browser Screenshot Instructions" }
                    p { strong { "Chrome/Edge: " } "Ctrl+Shift+I, then Ctrl+Shift+P, type \"screenshot\", choose \"Capture full size screenshot\"." }
                    p { strong { "Firefox: " } "Right-click the page, \"Take Screenshot\", \"Save full page\"." }
                    p { strong { "Any browser: " } "Windows+Shift+S (Windows) or Cmd+Shift+4 (Mac)." }
                }
                form method="post" action="/screenshot-mode" {
                    button.wide type="submit" { "👁️ Toggle Sidebar for Screenshots" }
                }
            }
            hr;
            section {
                h3 { "📋 Navigation" }
                form method="post" action="/nav/select" {
                    select name="page" onchange="this.form.submit()" {
                        @for page in pages.names() {
                            option value=(page) selected[page == session.current_page()] { (page) }
                        }
                    }
                    noscript { button type="submit" { "Go" } }
                }
            }
            hr;
            section {
                h3 { "📄 Page Management" }
                form method="post" action="/pages/add" {
                    button type="submit" { "➕ Add New Page" }
                }
                @let removable = pages.removable().collect::<Vec<_>>();
                @if !removable.is_empty() {
                    p { strong { "Delete Pages:" } }
                    @for page in removable {
                        form.inline method="post" action="/pages/remove" {
                            input type="hidden" name="page" value=(page);
                            button.danger type="submit" { "🗑️ Delete " (page) }
                        }
                    }
                }
            }
            hr;
            @match session.current_content() {
                Some(content) => { (render_content_management(session.current_page(), content)) }
                None => { (render_dashboard_management(session.team())) }
            }
        }
    }
}

fn render_dashboard_management(team: &TeamData) -> Markup {
    html! {
        section {
            h3 { "📈 Performance Management" }
            form method="post" action="/kpis/font-size" {
                label {
                    "KPI Font Size "
                    input type="range" name="size" min=(MIN_FONT_SIZE) max=(MAX_FONT_SIZE) value=(team.kpi_font_size)
                        onchange="this.form.submit()";
                    " " (team.kpi_font_size) "px"
                }
            }
            form method="post" action="/kpis/add" {
                button type="submit" disabled[team.kpis.len() >= MAX_KPIS] {
                    "➕ Add New KPI (" (team.kpis.len()) "/" (MAX_KPIS) ")"
                }
            }
            @for (index, kpi) in team.kpis.iter().enumerate() {
                (render_kpi_editor(index, kpi))
            }

            h4 { "Performance Image" }
            @if let Some(image) = &team.performance_image {
                p.muted { (image.file_name) }
                form method="post" action="/performance-image/remove" {
                    button.danger type="submit" { "Remove image" }
                }
            }
            form method="post" action="/performance-image" enctype="multipart/form-data" {
                input type="file" name="file" accept="image/*" required;
                button type="submit" { "Upload" }
            }
        }
        hr;
        section {
            h3 { "🛡️ Safety & News" }
            form method="post" action="/safety-news/add" {
                select name="kind" {
                    option value="Safety" { "Safety" }
                    option value="News" { "News" }
                }
                textarea name="content" rows="2" required {}
                button type="submit" { "Add item" }
            }
            (render_removable_list("/safety-news/remove", team.safety_news.iter().map(|item| format!("{}: {}", item.kind.label(), item.content))))
        }
        hr;
        section {
            h3 { "👥 Team News" }
            form method="post" action="/team-news/add" {
                textarea name="content" rows="2" required {}
                button type="submit" { "Add news" }
            }
            (render_removable_list("/team-news/remove", team.team_news.iter().map(|news| news.content.clone())))
        }
        hr;
        section {
            h3 { "💡 Ideas & Actions" }
            form.stacked method="post" action="/actions/add" {
                input type="text" name="idea" placeholder="Idea" required;
                input type="text" name="todo" placeholder="To Do";
                input type="text" name="who" placeholder="Who";
                input type="text" name="when" placeholder="Till When";
                (status_select(ActionStatus::Open))
                button type="submit" { "Add action" }
            }
            @for (index, action) in team.ideas_actions.iter().enumerate() {
                div.list-item {
                    span { (action.idea) }
                    form.inline method="post" action="/actions/status" {
                        input type="hidden" name="index" value=(index);
                        (status_select(action.status))
                        button type="submit" { "Set" }
                    }
                    form.inline method="post" action="/actions/remove" {
                        input type="hidden" name="index" value=(index);
                        button.danger type="submit" { "🗑️" }
                    }
                }
            }
        }
    }
}

fn render_kpi_editor(index: usize, kpi: &Kpi) -> Markup {
    html! {
        details.kpi-editor {
            summary { "KPI " (index + 1) ": " (kpi.name) }
            form.stacked method="post" action="/kpis/update" {
                input type="hidden" name="index" value=(index);
                label { "Name " input type="text" name="name" value=(kpi.name) required; }
                label { "Value " input type="number" step="any" name="value" value=(kpi.value) required; }
                label { "Target " input type="number" step="any" name="target" value=(kpi.target) required; }
                label { input type="checkbox" name="higher_is_better" checked[kpi.higher_is_better]; " Higher is better" }
                label { input type="checkbox" name="is_percentage" checked[kpi.is_percentage]; " Percentage" }
                button type="submit" { "Save" }
            }
            form method="post" action="/kpis/remove" {
                input type="hidden" name="index" value=(index);
                button.danger type="submit" { "🗑️ Remove KPI" }
            }
        }
    }
}

fn status_select(current: ActionStatus) -> Markup {
    html! {
        select name="status" {
            @for status in ActionStatus::ALL {
                option value=(status.form_value()) selected[status == current] { (status.label()) }
            }
        }
    }
}

fn render_removable_list(action: &str, items: impl Iterator<Item = String>) -> Markup {
    html! {
        @for (index, text) in items.enumerate() {
            div.list-item {
                span { (text) }
                form.inline method="post" action=(action) {
                    input type="hidden" name="index" value=(index);
                    button.danger type="submit" { "🗑️" }
                }
            }
        }
    }
}

fn render_content_management(page: &str, content: &PageContent) -> Markup {
    html! {
        section {
            h3 { "🖼️ " (page) }
            h4 { "Pictures (" (content.pictures.len()) "/" (MAX_PICTURES) ")" }
            @if content.pictures.len() < MAX_PICTURES {
                form method="post" action="/content/pictures" enctype="multipart/form-data" {
                    input type="file" name="file" accept="image/*" required;
                    button type="submit" { "Upload picture" }
                }
            }
            (render_removable_list("/content/pictures/remove", content.pictures.iter().map(|picture| picture.file_name.clone())))

            h4 { "Spreadsheets" }
            form method="post" action="/content/spreadsheets" enctype="multipart/form-data" {
                input type="file" name="file" accept=".csv,.xlsx,.xlsm,.xls,.xlsb,.ods" required;
                button type="submit" { "Upload spreadsheet" }
            }
            (render_removable_list("/content/spreadsheets/remove", content.spreadsheets.iter().map(|sheet| sheet.file_name.clone())))

            h4 { "Content Information" }
            form method="post" action="/content/info/add" {
                textarea name="content" rows="3" required {}
                button type="submit" { "Add information" }
            }
            (render_removable_list("/content/info/remove", content.picture_info.iter().map(|note| note.content.clone())))
        }
    }
}

fn render_dashboard(team: &TeamData) -> Markup {
    html! {
        div.grid {
            section.panel {
                h3 { "📈 Performance" }
                @if team.performance_image.is_some() {
                    img.performance-image src="/media/performance-image" alt="Performance chart";
                }
                div.kpi-grid {
                    @for slot in 0..team.kpi_slots() {
                        @match team.kpis.get(slot) {
                            Some(kpi) => { (render_kpi_card(kpi, team.kpi_font_size)) }
                            None => { div.empty-kpi-slot { "Empty Slot" } }
                        }
                    }
                }
            }
            section.panel {
                h3 { "🛡️ Safety & News" }
                @if team.safety_news.is_empty() {
                    p.info { "No safety or news items added yet." }
                }
                @for item in &team.safety_news {
                    @match item.kind {
                        NewsKind::Safety => { p.warning { strong { "Safety: " } (item.content) } }
                        NewsKind::News => { p.info { strong { "News: " } (item.content) } }
                    }
                }
            }
            section.panel {
                h3 { "💡 Ideas & Actions" }
                @if team.ideas_actions.is_empty() {
                    p.info { "No ideas or actions added yet." }
                } @else {
                    table {
                        thead {
                            tr { th { "Idea" } th { "To Do" } th { "Who" } th { "Till When" } th { "Status" } }
                        }
                        tbody {
                            @for action in &team.ideas_actions {
                                tr {
                                    td { (action.idea) }
                                    td { (action.todo) }
                                    td { (action.who) }
                                    td { (action.when) }
                                    td { (action.status.display()) }
                                }
                            }
                        }
                    }
                }
            }
            section.panel {
                h3 { "👥 Team News" }
                @if team.team_news.is_empty() {
                    p.info { "No team news added yet." }
                }
                @for news in &team.team_news {
                    p { "📢 " (news.content) }
                }
            }
        }
    }
}

fn render_kpi_card(kpi: &Kpi, font_size: u8) -> Markup {
    let result = kpi.evaluate();
    html! {
        div.custom-kpi {
            div.kpi-name { (kpi.name) }
            div.kpi-value style={ "font-size: " (font_size) "px" } { (result.formatted_value) }
            div.kpi-target { "Target: " (result.formatted_target) }
            div class={ "kpi-result " (result.semantic_color.css_class()) } { (result.deviation_text) }
        }
    }
}

fn render_content_page(content: &PageContent) -> Markup {
    let single_picture = content.pictures.len() == 1 && content.spreadsheets.is_empty();

    html! {
        div.content-layout {
            div.content-main {
                @if content.is_empty() {
                    p.info { "No pictures or spreadsheets uploaded yet. Use the sidebar to add content." }
                    div.picture-grid {
                        div.empty-picture-slot { "Empty Content Slot" }
                        div.empty-picture-slot { "Empty Content Slot" }
                    }
                } @else if single_picture {
                    (render_picture(0, "picture-single"))
                } @else {
                    @if !content.pictures.is_empty() {
                        div.picture-grid {
                            @for index in 0..content.pictures.len() {
                                (render_picture(index, "picture-tile"))
                            }
                        }
                    }
                    @if !content.spreadsheets.is_empty() {
                        hr;
                        @for sheet in &content.spreadsheets {
                            (render_spreadsheet(sheet))
                        }
                    }
                }
            }
            section.panel.content-info {
                h3 { "📝 Content Information" }
                @if content.picture_info.is_empty() {
                    p.info { "No content information added yet." }
                }
                @for note in &content.picture_info {
                    div.picture-info { (note.content) }
                }
            }
        }
    }
}

fn render_picture(index: usize, class: &str) -> Markup {
    html! {
        figure class=(class) {
            img src={ "/media/pictures/" (index) } alt={ "Picture " (index + 1) };
            figcaption { "Picture " (index + 1) }
        }
    }
}

fn render_spreadsheet(sheet: &SpreadsheetPreview) -> Markup {
    let (rows, columns) = sheet.shape();
    html! {
        div.excel-container {
            div.excel-title { "📊 " (sheet.file_name) }
            div.muted { "Rows: " (rows) " | Columns: " (columns) }
            div.table-scroll {
                table {
                    thead { tr { @for column in &sheet.columns { th { (column) } } } }
                    tbody {
                        @for row in &sheet.rows {
                            tr { @for cell in row { td { (cell) } } }
                        }
                    }
                }
            }
        }
    }
}

fn render_nav_bar(current_page: &str) -> Markup {
    html! {
        nav.nav-buttons {
            form method="post" action="/nav/prev" {
                button.wide type="submit" { "⬅️ Previous Page" }
            }
            div.nav-current {
                "Current: " strong { (current_page) }
            }
            form method="post" action="/nav/next" {
                button.wide type="submit" { "Next Page ➡️" }
            }
        }
    }
}

const CSS: &str = r#"
:root {
  --brand-yellow: #FFCC00;
  --brand-red: #D40511;
  --ink: #222;
  --muted: #6b6b6b;
  --panel-border: #e4e4e4;
}

* { box-sizing: border-box; }

body {
  margin: 0;
  font-family: "Segoe UI", Arial, sans-serif;
  color: var(--ink);
  display: flex;
  min-height: 100vh;
  background: #fafafa;
}

.sidebar {
  width: 320px;
  flex-shrink: 0;
  padding: 16px;
  background: #f0f2f6;
  overflow-y: auto;
  max-height: 100vh;
  position: sticky;
  top: 0;
}

.sidebar h3 { margin: 8px 0; font-size: 1rem; }
.sidebar h4 { margin: 12px 0 6px; font-size: 0.9rem; }
.sidebar select, .sidebar textarea, .sidebar input[type="text"], .sidebar input[type="number"] { width: 100%; margin: 4px 0; }
.sidebar hr { border: none; border-top: 1px solid #d6d9e0; margin: 14px 0; }
.sidebar .tip { background: #e7f3ff; padding: 8px; border-radius: 6px; font-size: 0.85rem; }

.app { flex: 1; padding: 20px 28px; min-width: 0; }

.main-header {
  background-color: var(--brand-yellow);
  padding: 8px 20px;
  border-radius: 10px;
  margin-bottom: 15px;
  display: flex;
  justify-content: space-between;
  align-items: center;
}
.header-title { color: var(--brand-red); font-size: 32px; font-weight: bold; }
.header-slogan { color: var(--brand-red); font-size: 14px; font-style: italic; margin-left: 10px; }
.header-date { color: var(--brand-red); font-size: 16px; font-weight: bold; }

button, .button {
  display: inline-block;
  border: 1px solid #c9ccd3;
  background: white;
  border-radius: 6px;
  padding: 6px 12px;
  cursor: pointer;
  font-size: 0.9rem;
  color: var(--ink);
  text-decoration: none;
  margin: 4px 0;
}
button:disabled { opacity: 0.5; cursor: not-allowed; }
button.danger { border-color: var(--brand-red); color: var(--brand-red); }
.wide { width: 100%; text-align: center; }

form.inline { display: inline; }
form.stacked label { display: block; margin: 4px 0; }
.list-item { display: flex; gap: 6px; align-items: center; justify-content: space-between; padding: 4px 0; }
.list-item span { flex: 1; overflow-wrap: anywhere; }
.muted { color: var(--muted); font-size: 0.85rem; }

.grid { display: grid; grid-template-columns: 1fr 1fr; gap: 16px; }
.panel { border: 1px solid var(--panel-border); border-radius: 10px; padding: 12px 16px; background: white; }
.panel h3 { margin-top: 0; }

.performance-image { max-width: 460px; width: 100%; display: block; margin-bottom: 10px; }
.kpi-grid { display: grid; grid-template-columns: 1fr 1fr; gap: 8px; }

.custom-kpi {
  padding: 10px;
  border-radius: 8px;
  text-align: center;
  background-color: #f8f9fa;
  border-left: 4px solid var(--brand-red);
  min-height: 80px;
}
.kpi-name { font-weight: bold; font-size: 0.9rem; }
.kpi-value { font-weight: bold; }
.kpi-target { color: var(--muted); font-size: 0.8rem; }
.kpi-result { font-weight: bold; }
.kpi-result.positive { color: #1a8f3c; }
.kpi-result.negative { color: var(--brand-red); }
.kpi-result.neutral { color: black; }

.empty-kpi-slot, .empty-picture-slot {
  padding: 10px;
  border-radius: 8px;
  text-align: center;
  border: 2px dashed #e0e0e0;
  opacity: 0.3;
  filter: blur(0.5px);
  display: flex;
  align-items: center;
  justify-content: center;
}
.empty-kpi-slot { min-height: 80px; }
.empty-picture-slot { min-height: 200px; }

.info { background: #e7f3ff; padding: 8px 12px; border-radius: 6px; }
.warning { background: #fff6d6; padding: 8px 12px; border-radius: 6px; }

table { border-collapse: collapse; width: 100%; font-size: 0.85rem; }
th, td { border: 1px solid var(--panel-border); padding: 4px 8px; text-align: left; }
th { background: #f3f3f3; }

.content-layout { display: grid; grid-template-columns: 2fr 1fr; gap: 16px; }
.picture-grid { display: grid; grid-template-columns: 1fr 1fr; gap: 12px; }
.picture-single img { max-width: 600px; width: 100%; }
.picture-tile img { max-width: 300px; width: 100%; }
figure { margin: 0; }
figcaption { color: var(--muted); font-size: 0.8rem; }

.picture-info {
  background-color: #e7f3ff;
  border-left: 4px solid var(--brand-red);
  padding: 10px;
  margin: 8px 0;
  border-radius: 5px;
}

.excel-container {
  border: 2px solid var(--brand-red);
  border-radius: 8px;
  padding: 10px;
  margin: 10px 0;
  background-color: white;
}
.excel-title { font-weight: bold; }
.table-scroll { max-height: 400px; overflow: auto; margin-top: 8px; }

.nav-buttons {
  display: grid;
  grid-template-columns: 1fr 2fr 1fr;
  gap: 12px;
  align-items: center;
  margin: 20px 0;
  padding-top: 10px;
  border-top: 1px solid var(--panel-border);
}
.nav-current { text-align: center; }

.screenshot-exit { position: fixed; bottom: 12px; right: 12px; opacity: 0.25; }
.screenshot-exit:hover { opacity: 1; }
"#;
