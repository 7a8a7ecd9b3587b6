use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{DayColor, FactorScore, TeamColor, percent, weekday_name};
use crate::repository::MatchRepository;

/// Maximum swing from day compatibility, in percentage points.
const DAY_COMPATIBILITY_SPREAD: f64 = 15.0;
/// Maximum swing from the inter-team clash bonus.
const CLASH_BONUS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parses `#rrggbb`, `rrggbb` or the `#rgb` shorthand.
    pub fn from_hex(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let hex = match trimmed.split_once('#') {
            Some((_, rest)) => rest.trim(),
            None => trimmed,
        };
        let expanded: String = if hex.len() == 3 {
            hex.chars().flat_map(|c| [c, c]).collect()
        } else {
            hex.to_string()
        };
        if expanded.len() != 6 || !expanded.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |idx: usize| u8::from_str_radix(&expanded[idx..idx + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    fn unit(self) -> [f64; 3] {
        [self.r, self.g, self.b].map(|c| f64::from(c) / 255.0)
    }
}

/// Euclidean RGB distance scaled to `[0, 1]`.
pub fn color_distance(a: Rgb, b: Rgb) -> f64 {
    let (a, b) = (a.unit(), b.unit());
    let sum: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();
    sum.sqrt() / 3f64.sqrt()
}

/// Bell-shaped compatibility: 1 at distance 0.5, 0 for identical or opposite colors.
pub fn compatibility(a: Rgb, b: Rgb) -> f64 {
    1.0 - (color_distance(a, b) - 0.5).abs() * 2.0
}

pub fn find_team_color<'a>(team: &str, colors: &'a [TeamColor]) -> Option<&'a TeamColor> {
    let team = team.trim();
    if team.is_empty() {
        return None;
    }
    colors
        .iter()
        .find(|c| c.team_name.trim().eq_ignore_ascii_case(team))
}

pub fn find_day_color(weekday: Weekday, colors: &[DayColor]) -> Option<&DayColor> {
    colors.iter().find(|c| c.weekday == weekday)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorTheoryResult {
    pub team_a_performance: u8,
    pub team_b_performance: u8,
    #[serde(default)]
    pub weekday: Option<Weekday>,
    #[serde(default)]
    pub team_a_compatibility: Option<f64>,
    #[serde(default)]
    pub team_b_compatibility: Option<f64>,
    #[serde(default)]
    pub color_clash: Option<f64>,
    #[serde(skip)]
    pub logs: Vec<String>,
}

impl ColorTheoryResult {
    fn neutral(weekday: Option<Weekday>, logs: Vec<String>) -> Self {
        Self {
            team_a_performance: 50,
            team_b_performance: 50,
            weekday,
            team_a_compatibility: None,
            team_b_compatibility: None,
            color_clash: None,
            logs,
        }
    }
}

impl FactorScore for ColorTheoryResult {
    fn title(&self) -> &'static str {
        "Color theory"
    }

    fn team_a_score(&self) -> f64 {
        f64::from(self.team_a_performance)
    }

    fn team_b_score(&self) -> f64 {
        f64::from(self.team_b_performance)
    }

    fn audit(&self) -> &[String] {
        &self.logs
    }
}

/// Loads both color tables from `repo` and scores them.
pub fn analyze_with<R: MatchRepository + ?Sized>(
    repo: &R,
    team_a: &str,
    team_b: &str,
    date: NaiveDate,
) -> ColorTheoryResult {
    let tables = repo
        .team_colors()
        .and_then(|teams| Ok((teams, repo.day_colors()?)));
    match tables {
        Ok((team_colors, day_colors)) => analyze(team_a, team_b, date, &team_colors, &day_colors),
        Err(err) => {
            warn!(team_a, team_b, error = %format!("{err:#}"), "color data unavailable");
            ColorTheoryResult::neutral(
                Some(date.weekday()),
                vec![
                    format!("Color data unavailable: {err:#}"),
                    "Falling back to neutral 50/50 color split".to_string(),
                ],
            )
        }
    }
}

pub fn analyze(
    team_a: &str,
    team_b: &str,
    date: NaiveDate,
    team_colors: &[TeamColor],
    day_colors: &[DayColor],
) -> ColorTheoryResult {
    let weekday = date.weekday();
    let mut logs = vec![format!("Match day: {}", weekday_name(weekday))];

    let color_a = resolve_team(team_a, team_colors, &mut logs);
    let color_b = resolve_team(team_b, team_colors, &mut logs);
    let day = match find_day_color(weekday, day_colors) {
        Some(day) => match Rgb::from_hex(&day.color_hex) {
            Some(rgb) => {
                logs.push(format!(
                    "{} color: {} ({})",
                    weekday_name(weekday),
                    day.color_hex,
                    if day.color_name.is_empty() { "unnamed" } else { day.color_name.as_str() }
                ));
                Some(rgb)
            }
            None => {
                logs.push(format!(
                    "{} color {:?} is not a valid hex color",
                    weekday_name(weekday),
                    day.color_hex
                ));
                None
            }
        },
        None => {
            logs.push(format!("No color assigned to {}", weekday_name(weekday)));
            None
        }
    };

    let (Some(color_a), Some(color_b), Some(day)) = (color_a, color_b, day) else {
        logs.push("Color comparison incomplete; using neutral 50/50".to_string());
        return ColorTheoryResult::neutral(Some(weekday), logs);
    };

    let compat_a = compatibility(color_a, day);
    let compat_b = compatibility(color_b, day);
    let clash = color_distance(color_a, color_b);
    logs.push(format!(
        "Day compatibility: {team_a} {compat_a:.2} | {team_b} {compat_b:.2}"
    ));
    logs.push(format!("Jersey color clash distance: {clash:.2}"));

    let mut perf_a = 50.0 + (compat_a - 0.5) * 2.0 * DAY_COMPATIBILITY_SPREAD;
    let mut perf_b = 50.0 + (compat_b - 0.5) * 2.0 * DAY_COMPATIBILITY_SPREAD;

    let bonus = (1.0 - clash) * CLASH_BONUS;
    // Ties favour team B.
    if compat_a > compat_b {
        perf_a += bonus;
        perf_b -= bonus;
        logs.push(format!("{team_a} has the better day match (+{bonus:.1})"));
    } else {
        perf_b += bonus;
        perf_a -= bonus;
        logs.push(format!("{team_b} has the better day match (+{bonus:.1})"));
    }

    let team_a_performance = percent(perf_a);
    let team_b_performance = percent(perf_b);
    logs.push(format!(
        "Color performance: {team_a} {team_a_performance} | {team_b} {team_b_performance}"
    ));
    debug!(
        team_a,
        team_b,
        a = team_a_performance,
        b = team_b_performance,
        "color theory analysed"
    );

    ColorTheoryResult {
        team_a_performance,
        team_b_performance,
        weekday: Some(weekday),
        team_a_compatibility: Some(compat_a),
        team_b_compatibility: Some(compat_b),
        color_clash: Some(clash),
        logs,
    }
}

fn resolve_team(team: &str, colors: &[TeamColor], logs: &mut Vec<String>) -> Option<Rgb> {
    let Some(entry) = find_team_color(team, colors) else {
        logs.push(format!("No jersey color on record for {team}"));
        return None;
    };
    match Rgb::from_hex(&entry.primary_color) {
        Some(rgb) => {
            logs.push(format!("{team} jersey color: {}", entry.primary_color));
            Some(rgb)
        }
        None => {
            logs.push(format!(
                "{team} jersey color {:?} is not a valid hex color",
                entry.primary_color
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(name: &str, hex: &str) -> TeamColor {
        TeamColor {
            team_name: name.to_string(),
            primary_color: hex.to_string(),
            secondary_color: String::new(),
        }
    }

    fn friday(hex: &str) -> Vec<DayColor> {
        vec![DayColor {
            weekday: Weekday::Fri,
            color_hex: hex.to_string(),
            color_name: String::new(),
        }]
    }

    // 2024-03-15 is a Friday.
    fn match_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(Rgb::from_hex("#FF8000"), Some(Rgb { r: 255, g: 128, b: 0 }));
        assert_eq!(Rgb::from_hex("Blue #00f"), Some(Rgb { r: 0, g: 0, b: 255 }));
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert_eq!(Rgb::from_hex("zzzzzz"), None);
    }

    #[test]
    fn identical_colors_are_incompatible() {
        let black = Rgb::from_hex("#000000").unwrap();
        assert_eq!(compatibility(black, black), 0.0);
    }

    #[test]
    fn identical_jerseys_split_evenly_on_a_tie() {
        let colors = [team("India", "#000000"), team("Australia", "#000000")];
        let result = analyze("India", "Australia", match_day(), &colors, &friday("#000000"));
        // 50 - 15 for zero compatibility, then the full clash bonus goes to B on a tie.
        assert_eq!(result.team_a_performance, 25);
        assert_eq!(result.team_b_performance, 45);
    }

    #[test]
    fn missing_team_color_is_neutral() {
        let colors = [team("India", "#0000FF")];
        let result = analyze("India", "Nepal", match_day(), &colors, &friday("#FFFFFF"));
        assert_eq!((result.team_a_performance, result.team_b_performance), (50, 50));
        assert!(result.color_clash.is_none());
    }

    #[test]
    fn team_lookup_ignores_case() {
        let colors = [team("India", "#0000FF")];
        assert!(find_team_color("india", &colors).is_some());
        assert!(find_team_color("", &colors).is_none());
    }
}
