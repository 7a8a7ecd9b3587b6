use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{FactorScore, Gender, MatchFormat, MatchRecord, month_name, win_rate};
use crate::repository::MatchRepository;

/// Score for a month without any recorded matches.
const NEUTRAL_MONTH: u8 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalResult {
    pub month: u32,
    pub team_a_seasonal_advantage: u8,
    pub team_b_seasonal_advantage: u8,
    #[serde(default)]
    pub team_a_month_matches: u32,
    #[serde(default)]
    pub team_b_month_matches: u32,
    #[serde(skip)]
    pub logs: Vec<String>,
}

impl FactorScore for SeasonalResult {
    fn title(&self) -> &'static str {
        "Seasonal"
    }

    fn team_a_score(&self) -> f64 {
        f64::from(self.team_a_seasonal_advantage)
    }

    fn team_b_score(&self) -> f64 {
        f64::from(self.team_b_seasonal_advantage)
    }

    fn audit(&self) -> &[String] {
        &self.logs
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct MonthTally {
    matches: u32,
    wins: u32,
}

fn tally_by_month(team: &str, matches: &[MatchRecord]) -> [MonthTally; 12] {
    let mut months = [MonthTally::default(); 12];
    for m in matches.iter().filter(|m| m.involves(team)) {
        let Some(date) = m.match_date else {
            continue;
        };
        let slot = &mut months[date.month0() as usize];
        slot.matches += 1;
        if m.winner == team {
            slot.wins += 1;
        }
    }
    months
}

/// Win rate per calendar month (January first). Months without matches are 50.
pub fn monthly_win_rates(team: &str, matches: &[MatchRecord]) -> [u8; 12] {
    tally_by_month(team, matches)
        .map(|t| win_rate(t.wins, t.matches).unwrap_or(NEUTRAL_MONTH))
}

pub fn analyze<R: MatchRepository + ?Sized>(
    repo: &R,
    team_a: &str,
    team_b: &str,
    date: NaiveDate,
    format: MatchFormat,
    gender: Gender,
) -> SeasonalResult {
    match repo.all_matches(format, gender) {
        Ok(matches) => {
            let result = summarize(team_a, team_b, date, &matches);
            debug!(
                team_a,
                team_b,
                month = result.month,
                a = result.team_a_seasonal_advantage,
                b = result.team_b_seasonal_advantage,
                "seasonal factor analysed"
            );
            result
        }
        Err(err) => {
            warn!(team_a, team_b, error = %format!("{err:#}"), "seasonal lookup failed");
            SeasonalResult {
                month: date.month(),
                team_a_seasonal_advantage: NEUTRAL_MONTH,
                team_b_seasonal_advantage: NEUTRAL_MONTH,
                team_a_month_matches: 0,
                team_b_month_matches: 0,
                logs: vec![
                    format!("Seasonal data unavailable: {err:#}"),
                    "Falling back to neutral 50/50 seasonal split".to_string(),
                ],
            }
        }
    }
}

/// Each team's win rate in the month of `date`, over every opponent in `matches`.
pub fn summarize(team_a: &str, team_b: &str, date: NaiveDate, matches: &[MatchRecord]) -> SeasonalResult {
    let month = date.month();
    let idx = date.month0() as usize;
    let name = month_name(month);

    let mut logs = vec![format!("Match month: {name}")];
    let tally_a = tally_by_month(team_a, matches)[idx];
    let tally_b = tally_by_month(team_b, matches)[idx];

    let mut side = |team: &str, tally: MonthTally| -> u8 {
        match win_rate(tally.wins, tally.matches) {
            Some(rate) => {
                logs.push(format!(
                    "{team} in {name}: {}/{} wins ({rate}%)",
                    tally.wins, tally.matches
                ));
                rate
            }
            None => {
                logs.push(format!("{team} has no {name} matches on record (treated as 50%)"));
                NEUTRAL_MONTH
            }
        }
    };
    let advantage_a = side(team_a, tally_a);
    let advantage_b = side(team_b, tally_b);

    logs.push(format!(
        "Seasonal advantage: {team_a} {advantage_a} | {team_b} {advantage_b}"
    ));

    SeasonalResult {
        month,
        team_a_seasonal_advantage: advantage_a,
        team_b_seasonal_advantage: advantage_b,
        team_a_month_matches: tally_a.matches,
        team_b_month_matches: tally_b.matches,
        logs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(a: &str, b: &str, winner: &str, ymd: (i32, u32, u32)) -> MatchRecord {
        MatchRecord {
            team_a: a.to_string(),
            team_b: b.to_string(),
            winner: winner.to_string(),
            format: MatchFormat::T20,
            gender: Gender::Female,
            match_date: NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2),
            stadium: "Lord's".to_string(),
        }
    }

    #[test]
    fn months_without_matches_default_to_fifty() {
        let matches = [
            game("England", "India", "England", (2022, 6, 1)),
            game("England", "Pakistan", "Pakistan", (2023, 6, 9)),
            game("England", "India", "India", (2023, 1, 5)),
        ];
        let rates = monthly_win_rates("England", &matches);
        assert_eq!(rates[5], 50);
        assert_eq!(rates[0], 0);
        assert_eq!(rates[2], 50);
    }

    #[test]
    fn losing_month_stays_at_zero() {
        let matches = [game("England", "India", "India", (2023, 1, 5))];
        let date = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        let result = summarize("England", "India", date, &matches);
        assert_eq!(result.team_a_seasonal_advantage, 0);
        assert_eq!(result.team_b_seasonal_advantage, 100);
    }
}
