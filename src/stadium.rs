use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{FactorScore, Gender, MatchFormat, MatchRecord, percent, win_rate};
use crate::repository::MatchRepository;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StadiumResult {
    pub team_a_win_percentage: u8,
    pub team_b_win_percentage: u8,
    #[serde(default)]
    pub team_a_matches: u32,
    #[serde(default)]
    pub team_a_wins: u32,
    #[serde(default)]
    pub team_b_matches: u32,
    #[serde(default)]
    pub team_b_wins: u32,
    #[serde(skip)]
    pub logs: Vec<String>,
}

impl StadiumResult {
    fn neutral(logs: Vec<String>) -> Self {
        Self {
            team_a_win_percentage: 50,
            team_b_win_percentage: 50,
            team_a_matches: 0,
            team_a_wins: 0,
            team_b_matches: 0,
            team_b_wins: 0,
            logs,
        }
    }
}

impl FactorScore for StadiumResult {
    fn title(&self) -> &'static str {
        "Stadium"
    }

    fn team_a_score(&self) -> f64 {
        f64::from(self.team_a_win_percentage)
    }

    fn team_b_score(&self) -> f64 {
        f64::from(self.team_b_win_percentage)
    }

    fn audit(&self) -> &[String] {
        &self.logs
    }
}

pub fn analyze<R: MatchRepository + ?Sized>(
    repo: &R,
    team_a: &str,
    team_b: &str,
    stadium: &str,
    format: MatchFormat,
    gender: Gender,
) -> StadiumResult {
    match repo.matches_at_venue(stadium, format, gender) {
        Ok(matches) => {
            let result = summarize(team_a, team_b, stadium, &matches);
            debug!(
                stadium,
                venue_matches = matches.len(),
                a = result.team_a_win_percentage,
                b = result.team_b_win_percentage,
                "stadium analysed"
            );
            result
        }
        Err(err) => {
            warn!(stadium, error = %format!("{err:#}"), "stadium lookup failed");
            StadiumResult::neutral(vec![
                format!("Stadium data unavailable for {stadium}: {err:#}"),
                "Falling back to neutral 50/50 stadium split".to_string(),
            ])
        }
    }
}

/// Scores matches already known to be played at `stadium`.
///
/// Each team's own win rate at the venue is computed independently. When
/// both teams have played there, the rates are weighted by how many matches
/// each side played and renormalised to 100, so one lucky win does not
/// outweigh a long mixed record.
pub fn summarize(team_a: &str, team_b: &str, stadium: &str, matches: &[MatchRecord]) -> StadiumResult {
    let mut logs = Vec::new();
    let (a_matches, a_wins) = venue_record(team_a, matches);
    let (b_matches, b_wins) = venue_record(team_b, matches);

    logs.push(format!(
        "Found {} matches at {stadium} in the selected format",
        matches.len()
    ));
    logs.push(describe_record(team_a, stadium, a_matches, a_wins));
    logs.push(describe_record(team_b, stadium, b_matches, b_wins));

    let rate_a = win_rate(a_wins, a_matches);
    let rate_b = win_rate(b_wins, b_matches);

    let (pct_a, pct_b) = match (rate_a, rate_b) {
        (Some(rate_a), Some(rate_b)) => {
            let total = f64::from(a_matches + b_matches);
            let weighted_a = f64::from(rate_a) * f64::from(a_matches) / total;
            let weighted_b = f64::from(rate_b) * f64::from(b_matches) / total;
            logs.push(format!(
                "Weighting by matches played: {team_a} {weighted_a:.1} | {team_b} {weighted_b:.1}"
            ));
            let weighted_total = weighted_a + weighted_b;
            if weighted_total <= 0.0 {
                logs.push("Neither team has won here; using neutral 50/50".to_string());
                (50, 50)
            } else {
                let pct_a = percent(weighted_a / weighted_total * 100.0);
                (pct_a, 100 - pct_a)
            }
        }
        (Some(rate_a), None) => {
            logs.push(format!(
                "Only {team_a} has played at {stadium}; {team_b} takes the remainder"
            ));
            (rate_a, 100 - rate_a)
        }
        (None, Some(rate_b)) => {
            logs.push(format!(
                "Only {team_b} has played at {stadium}; {team_a} takes the remainder"
            ));
            (100 - rate_b, rate_b)
        }
        (None, None) => {
            logs.push("No venue history for either team; using neutral 50/50".to_string());
            (50, 50)
        }
    };

    logs.push(format!(
        "Stadium advantage: {team_a} {pct_a}% | {team_b} {pct_b}%"
    ));

    StadiumResult {
        team_a_win_percentage: pct_a,
        team_b_win_percentage: pct_b,
        team_a_matches: a_matches,
        team_a_wins: a_wins,
        team_b_matches: b_matches,
        team_b_wins: b_wins,
        logs,
    }
}

fn venue_record(team: &str, matches: &[MatchRecord]) -> (u32, u32) {
    matches
        .iter()
        .filter(|m| m.involves(team))
        .fold((0, 0), |(played, won), m| {
            (played + 1, won + u32::from(m.winner == team))
        })
}

fn describe_record(team: &str, stadium: &str, played: u32, won: u32) -> String {
    match win_rate(won, played) {
        Some(rate) => format!("{team} at {stadium}: {won}/{played} wins ({rate}%)"),
        None => format!("{team} has no matches at {stadium} (treated as 50%)"),
    }
}
