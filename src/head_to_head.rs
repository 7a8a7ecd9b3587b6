use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{FactorScore, Gender, MatchFormat, MatchRecord, TeamOutcome, percent};
use crate::repository::MatchRepository;

const RECENT_FORM_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadToHeadResult {
    pub team_a_wins: u32,
    pub team_b_wins: u32,
    pub team_a_win_percentage: u8,
    #[serde(default)]
    pub matches: u32,
    #[serde(default)]
    pub no_results: u32,
    #[serde(skip)]
    pub logs: Vec<String>,
}

impl HeadToHeadResult {
    fn neutral(matches: u32, no_results: u32, logs: Vec<String>) -> Self {
        Self {
            team_a_wins: 0,
            team_b_wins: 0,
            team_a_win_percentage: 50,
            matches,
            no_results,
            logs,
        }
    }

    pub fn team_b_win_percentage(&self) -> u8 {
        100 - self.team_a_win_percentage
    }
}

impl FactorScore for HeadToHeadResult {
    fn title(&self) -> &'static str {
        "Head-to-head"
    }

    fn team_a_score(&self) -> f64 {
        f64::from(self.team_a_win_percentage)
    }

    fn team_b_score(&self) -> f64 {
        f64::from(self.team_b_win_percentage())
    }

    fn audit(&self) -> &[String] {
        &self.logs
    }
}

pub fn analyze<R: MatchRepository + ?Sized>(
    repo: &R,
    team_a: &str,
    team_b: &str,
    format: MatchFormat,
    gender: Gender,
) -> HeadToHeadResult {
    match repo.matches_between(team_a, team_b, format, gender) {
        Ok(matches) => {
            let result = summarize(team_a, team_b, format, gender, &matches);
            debug!(
                team_a,
                team_b,
                matches = result.matches,
                pct = result.team_a_win_percentage,
                "head-to-head analysed"
            );
            result
        }
        Err(err) => {
            warn!(team_a, team_b, error = %format!("{err:#}"), "head-to-head lookup failed");
            HeadToHeadResult::neutral(
                0,
                0,
                vec![
                    format!("Head-to-head data unavailable: {err:#}"),
                    "Falling back to neutral 50/50 head-to-head split".to_string(),
                ],
            )
        }
    }
}

/// Scores already-filtered matches between the two teams.
pub fn summarize(
    team_a: &str,
    team_b: &str,
    format: MatchFormat,
    gender: Gender,
    matches: &[MatchRecord],
) -> HeadToHeadResult {
    let mut logs = Vec::new();
    let relevant: Vec<&MatchRecord> = matches
        .iter()
        .filter(|m| m.is_between(team_a, team_b))
        .collect();

    if relevant.is_empty() {
        logs.push(format!(
            "No previous {format} {gender} matches found between {team_a} and {team_b}"
        ));
        logs.push("Using neutral 50/50 head-to-head split".to_string());
        return HeadToHeadResult::neutral(0, 0, logs);
    }

    let mut team_a_wins = 0u32;
    let mut team_b_wins = 0u32;
    let mut no_results = 0u32;
    for m in &relevant {
        if m.winner == team_a {
            team_a_wins += 1;
        } else if m.winner == team_b {
            team_b_wins += 1;
        } else {
            no_results += 1;
        }
    }
    let total = relevant.len() as u32;

    logs.push(format!(
        "Found {total} previous {format} {gender} matches between {team_a} and {team_b}"
    ));
    logs.push(format!(
        "{team_a} wins: {team_a_wins}, {team_b} wins: {team_b_wins}, no result: {no_results}"
    ));
    logs.push(format!(
        "Recent form {team_a} (latest first): {}",
        recent_form(team_a, &relevant)
    ));
    logs.push(format!(
        "Recent form {team_b} (latest first): {}",
        recent_form(team_b, &relevant)
    ));

    let decisive = team_a_wins + team_b_wins;
    if decisive == 0 {
        logs.push("No decisive results in these matches; using neutral 50/50".to_string());
        return HeadToHeadResult::neutral(total, no_results, logs);
    }

    let team_a_win_percentage =
        percent(f64::from(team_a_wins) / f64::from(decisive) * 100.0);
    logs.push(format!(
        "{team_a} head-to-head win rate: {team_a_win_percentage}% ({team_b}: {}%)",
        100 - team_a_win_percentage
    ));

    HeadToHeadResult {
        team_a_wins,
        team_b_wins,
        team_a_win_percentage,
        matches: total,
        no_results,
        logs,
    }
}

/// Last few results for `team`, newest first, as W/L/D tokens.
fn recent_form(team: &str, matches: &[&MatchRecord]) -> String {
    let mut ordered: Vec<&&MatchRecord> = matches.iter().collect();
    // Undated matches sort last.
    ordered.sort_by(|a, b| b.match_date.cmp(&a.match_date));
    let tokens: Vec<String> = ordered
        .into_iter()
        .filter_map(|m| m.outcome_for(team))
        .take(RECENT_FORM_LEN)
        .map(|o: TeamOutcome| o.token().to_string())
        .collect();
    if tokens.is_empty() {
        return "-".to_string();
    }
    tokens.join(" ")
}
