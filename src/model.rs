use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::color_theory::ColorTheoryResult;
use crate::error::InputError;
use crate::head_to_head::HeadToHeadResult;
use crate::score_pattern::ScorePatternResult;
use crate::seasonal::SeasonalResult;
use crate::stadium::StadiumResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchFormat {
    #[serde(rename = "ODI")]
    Odi,
    #[serde(rename = "T20")]
    T20,
}

impl MatchFormat {
    pub const ALL: [MatchFormat; 2] = [MatchFormat::Odi, MatchFormat::T20];

    pub fn label(self) -> &'static str {
        match self {
            MatchFormat::Odi => "ODI",
            MatchFormat::T20 => "T20",
        }
    }
}

impl fmt::Display for MatchFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MatchFormat {
    type Err = InputError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ODI" => Ok(MatchFormat::Odi),
            "T20" | "T20I" => Ok(MatchFormat::T20),
            _ => Err(InputError::UnknownFormat(raw.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Gender {
    type Err = InputError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => Err(InputError::UnknownGender(raw.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionMode {
    #[serde(rename = "pre-match")]
    PreMatch,
    #[serde(rename = "post-innings")]
    PostInnings,
}

impl PredictionMode {
    pub fn key(self) -> &'static str {
        match self {
            PredictionMode::PreMatch => "pre-match",
            PredictionMode::PostInnings => "post-innings",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PredictionMode::PreMatch => "Pre-Match",
            PredictionMode::PostInnings => "Inning Break",
        }
    }
}

impl fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PredictionMode {
    type Err = InputError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pre-match" | "prematch" => Ok(PredictionMode::PreMatch),
            "post-innings" | "postinnings" | "inning-break" => Ok(PredictionMode::PostInnings),
            _ => Err(InputError::UnknownMode(raw.trim().to_string())),
        }
    }
}

/// Result of a finished match from one team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamOutcome {
    Won,
    Lost,
    NoResult,
}

impl TeamOutcome {
    pub fn token(self) -> char {
        match self {
            TeamOutcome::Won => 'W',
            TeamOutcome::Lost => 'L',
            TeamOutcome::NoResult => 'D',
        }
    }
}

/// One historical match. `winner` is empty for draws and no-results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub team_a: String,
    pub team_b: String,
    #[serde(default)]
    pub winner: String,
    pub format: MatchFormat,
    pub gender: Gender,
    #[serde(default)]
    pub match_date: Option<NaiveDate>,
    #[serde(default)]
    pub stadium: String,
}

impl MatchRecord {
    pub fn involves(&self, team: &str) -> bool {
        self.team_a == team || self.team_b == team
    }

    pub fn is_between(&self, team_a: &str, team_b: &str) -> bool {
        (self.team_a == team_a && self.team_b == team_b)
            || (self.team_a == team_b && self.team_b == team_a)
    }

    pub fn has_winner(&self) -> bool {
        !self.winner.trim().is_empty()
    }

    /// Outcome for `team`, or `None` when the team did not play.
    pub fn outcome_for(&self, team: &str) -> Option<TeamOutcome> {
        if !self.involves(team) {
            return None;
        }
        if self.winner == team {
            Some(TeamOutcome::Won)
        } else if self.has_winner() {
            Some(TeamOutcome::Lost)
        } else {
            Some(TeamOutcome::NoResult)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamColor {
    pub team_name: String,
    pub primary_color: String,
    #[serde(default)]
    pub secondary_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayColor {
    pub weekday: Weekday,
    pub color_hex: String,
    #[serde(default)]
    pub color_name: String,
}

/// Unvalidated prediction request, shaped like the form payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub team_a: String,
    pub team_b: String,
    pub match_format: String,
    pub gender: String,
    pub match_date: String,
    pub stadium: String,
    #[serde(default)]
    pub team_a_score: Option<i64>,
    pub prediction_mode: String,
}

impl PredictionRequest {
    pub fn into_input(self) -> Result<PredictionInput, InputError> {
        let team_a = required(&self.team_a, "team A")?;
        let team_b = required(&self.team_b, "team B")?;
        let match_format = self.match_format.parse::<MatchFormat>()?;
        let gender = self.gender.parse::<Gender>()?;
        let raw_date = required(&self.match_date, "match date")?;
        let match_date =
            parse_match_date(&raw_date).ok_or_else(|| InputError::InvalidDate(raw_date.clone()))?;
        let stadium = required(&self.stadium, "stadium")?;
        let prediction_mode = self.prediction_mode.parse::<PredictionMode>()?;
        let team_a_score = match self.team_a_score {
            Some(score) => Some(
                u32::try_from(score).map_err(|_| InputError::InvalidScore(score.to_string()))?,
            ),
            None => None,
        };

        let input = PredictionInput {
            team_a,
            team_b,
            match_format,
            gender,
            match_date,
            stadium,
            prediction_mode,
            team_a_score,
        };
        input.validate()?;
        Ok(input)
    }
}

fn required(raw: &str, field: &'static str) -> Result<String, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionInput {
    pub team_a: String,
    pub team_b: String,
    pub match_format: MatchFormat,
    pub gender: Gender,
    pub match_date: NaiveDate,
    pub stadium: String,
    pub prediction_mode: PredictionMode,
    #[serde(default)]
    pub team_a_score: Option<u32>,
}

impl PredictionInput {
    pub fn validate(&self) -> Result<(), InputError> {
        if self.team_a.trim().is_empty() {
            return Err(InputError::MissingField("team A"));
        }
        if self.team_b.trim().is_empty() {
            return Err(InputError::MissingField("team B"));
        }
        if self.stadium.trim().is_empty() {
            return Err(InputError::MissingField("stadium"));
        }
        if self.prediction_mode == PredictionMode::PostInnings && self.team_a_score.is_none() {
            return Err(InputError::MissingScore);
        }
        Ok(())
    }

    /// Score used by the score-pattern factor, present only after the first innings.
    pub fn first_innings_score(&self) -> Option<u32> {
        match self.prediction_mode {
            PredictionMode::PostInnings => self.team_a_score,
            PredictionMode::PreMatch => None,
        }
    }
}

/// Common view over the per-factor results used by the aggregator.
pub trait FactorScore {
    fn title(&self) -> &'static str;
    fn team_a_score(&self) -> f64;
    fn team_b_score(&self) -> f64;
    fn audit(&self) -> &[String];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionFactors {
    pub head_to_head: HeadToHeadResult,
    pub stadium_advantage: StadiumResult,
    pub color_theory: ColorTheoryResult,
    pub seasonal_factor: SeasonalResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_pattern: Option<ScorePatternResult>,
}

impl PredictionFactors {
    pub fn iter(&self) -> impl Iterator<Item = &dyn FactorScore> {
        let fixed: [&dyn FactorScore; 4] = [
            &self.head_to_head,
            &self.stadium_advantage,
            &self.color_theory,
            &self.seasonal_factor,
        ];
        fixed.into_iter().chain(
            self.score_pattern
                .as_ref()
                .map(|score| score as &dyn FactorScore),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub team_a_win_percentage: u8,
    pub team_b_win_percentage: u8,
    pub factors: PredictionFactors,
    pub logs: Vec<String>,
}

/// Rounds a percentage into `[0, 100]`.
pub fn percent(value: f64) -> u8 {
    if !value.is_finite() {
        return 50;
    }
    value.clamp(0.0, 100.0).round() as u8
}

/// Integer win rate, or `None` without any matches.
pub fn win_rate(wins: u32, matches: u32) -> Option<u8> {
    if matches == 0 {
        return None;
    }
    Some(percent(f64::from(wins) / f64::from(matches) * 100.0))
}

pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    const FORMATS: [&str; 10] = [
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d/%m/%Y",
        "%d-%m-%Y",
        "%b %d, %Y",
        "%B %d, %Y",
        "%d %b %Y",
        "%d %B %Y",
        "%Y%m%d",
    ];

    let cleaned = raw.trim().trim_matches('"');
    if cleaned.is_empty() {
        return None;
    }
    // Timestamps such as 2024-03-15T09:30:00Z only need the date part.
    let cleaned = match cleaned.split_once('T') {
        Some((date, _)) if date.len() == 10 => date,
        _ => cleaned,
    };
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok())
}

/// Venue key used for comparisons: trimmed, single-spaced, lowercase.
pub fn venue_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn same_venue(a: &str, b: &str) -> bool {
    venue_key(a) == venue_key(b)
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn month_name(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    month
        .checked_sub(1)
        .and_then(|idx| MONTHS.get(idx as usize))
        .copied()
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_date_layouts() {
        let want = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(parse_match_date("2024-03-15"), want);
        assert_eq!(parse_match_date("15-03-2024"), want);
        assert_eq!(parse_match_date("Mar 15, 2024"), want);
        assert_eq!(parse_match_date("15 March 2024"), want);
        assert_eq!(parse_match_date("2024-03-15T09:30:00Z"), want);
        assert_eq!(parse_match_date("not a date"), None);
    }

    #[test]
    fn venue_key_ignores_spacing_and_case() {
        assert!(same_venue("Wankhede  Stadium ", "wankhede stadium"));
        assert!(!same_venue("Eden Gardens", "Wankhede Stadium"));
    }

    #[test]
    fn outcome_from_team_perspective() {
        let m = MatchRecord {
            team_a: "India".to_string(),
            team_b: "Australia".to_string(),
            winner: "India".to_string(),
            format: MatchFormat::Odi,
            gender: Gender::Male,
            match_date: None,
            stadium: String::new(),
        };
        assert_eq!(m.outcome_for("India"), Some(TeamOutcome::Won));
        assert_eq!(m.outcome_for("Australia"), Some(TeamOutcome::Lost));
        assert_eq!(m.outcome_for("England"), None);
    }

    #[test]
    fn post_innings_request_requires_score() {
        let req = PredictionRequest {
            team_a: "India".to_string(),
            team_b: "Australia".to_string(),
            match_format: "T20".to_string(),
            gender: "Male".to_string(),
            match_date: "2024-03-15".to_string(),
            stadium: "Eden Gardens".to_string(),
            team_a_score: None,
            prediction_mode: "post-innings".to_string(),
        };
        assert_eq!(req.into_input(), Err(InputError::MissingScore));
    }

    #[test]
    fn unknown_enums_are_rejected() {
        assert!(matches!(
            "Test".parse::<MatchFormat>(),
            Err(InputError::UnknownFormat(_))
        ));
        assert!(matches!(
            "mixed".parse::<Gender>(),
            Err(InputError::UnknownGender(_))
        ));
        assert!(matches!(
            "mid-match".parse::<PredictionMode>(),
            Err(InputError::UnknownMode(_))
        ));
    }
}
