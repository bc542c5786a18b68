use chrono::NaiveDateTime;
use std::fmt::Write;

/// Builds the manual screenshot guide offered as the dashboard export.
pub fn screenshot_guide<S: AsRef<str>>(header_title: &str, pages: &[S], generated_at: NaiveDateTime) -> String {
    let mut guide = format!(
        "# {header_title} Dashboard Screenshot Guide

## Instructions for Creating Dashboard Export:

### Method 1: Browser Screenshots
1. **Hide Sidebar**: Use the \"Toggle Sidebar for Screenshots\" button in the sidebar
2. **Full Screen**: Press F11 for full-screen mode (optional)
3. **Take Screenshots**: Use your browser's screenshot tool or:
   - **Chrome**: Ctrl+Shift+I → Ctrl+Shift+P → type \"screenshot\" → \"Capture full size screenshot\"
   - **Firefox**: Right-click → \"Take Screenshot\" → \"Save full page\"
   - **Windows**: Windows+Shift+S for snipping tool
   - **Mac**: Cmd+Shift+4 for area selection

### Pages to Capture:
"
    );

    for (number, page) in pages.iter().enumerate() {
        let _ = writeln!(guide, "{}. **{}**", number + 1, page.as_ref());
    }

    guide.push_str("\n### File Naming Suggestion:\n");
    for (number, page) in pages.iter().enumerate() {
        let _ = writeln!(
            guide,
            "- {}_{}_Page{}.png",
            file_stem(header_title),
            file_stem(page.as_ref()),
            number + 1
        );
    }

    let _ = write!(
        guide,
        "
### Tips:
- Ensure full page is visible before screenshot
- Use landscape orientation for best results
- Hide browser bookmarks bar for cleaner look
- Take screenshots at consistent zoom level (100%)

Generated on: {}
",
        generated_at.format("%B %d, %Y at %H:%M")
    );

    guide
}

/// File name for the downloaded guide, e.g. `Team_PUD_Screenshot_Guide_20261018.txt`.
pub fn guide_file_name(team_name: &str, generated_at: NaiveDateTime) -> String {
    format!(
        "{}_Screenshot_Guide_{}.txt",
        file_stem(team_name),
        generated_at.format("%Y%m%d")
    )
}

fn file_stem(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}
