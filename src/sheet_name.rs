use std::sync::OnceLock;

use regex::Regex;

fn sheet_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?)\s+(\d{4})$").expect("valid sheet name pattern"))
}

/// Split a sheet title like "Aktivitus AB 2023" into company and fiscal year.
pub fn parse_sheet_name(title: &str) -> Option<(String, i32)> {
    let caps = sheet_name_re().captures(title.trim())?;
    let company = caps[1].trim().to_string();
    let year = caps[2].parse().ok()?;
    if company.is_empty() {
        return None;
    }
    Some((company, year))
}
