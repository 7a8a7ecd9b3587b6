use serde::{Deserialize, Serialize};

use crate::model::{FactorScore, MatchFormat, percent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePatternResult {
    pub score: u32,
    pub format: MatchFormat,
    pub baseline: f64,
    pub digit_adjustment: i8,
    pub team_a_win_probability: u8,
    #[serde(skip)]
    pub logs: Vec<String>,
}

impl ScorePatternResult {
    pub fn team_b_win_probability(&self) -> u8 {
        100 - self.team_a_win_probability
    }
}

impl FactorScore for ScorePatternResult {
    fn title(&self) -> &'static str {
        "Score pattern"
    }

    fn team_a_score(&self) -> f64 {
        f64::from(self.team_a_win_probability)
    }

    fn team_b_score(&self) -> f64 {
        f64::from(self.team_b_win_probability())
    }

    fn audit(&self) -> &[String] {
        &self.logs
    }
}

/// Win probability for the side batting first, before the last-digit rule.
pub fn baseline_probability(score: u32, format: MatchFormat) -> f64 {
    let s = f64::from(score);
    match format {
        MatchFormat::T20 => match score {
            0..120 => 20.0 + (s - 100.0) / 2.0,
            120..140 => 35.0 + (s - 120.0) / 2.0,
            140..160 => 45.0 + (s - 140.0) / 2.0,
            160..180 => 55.0 + (s - 160.0) / 2.0,
            180..200 => 65.0 + (s - 180.0) / 2.0,
            200..220 => 75.0 + (s - 200.0) / 4.0,
            _ => 85.0 + ((s - 220.0) / 10.0).min(10.0),
        },
        MatchFormat::Odi => match score {
            0..200 => 15.0 + (s - 150.0) / 5.0,
            200..250 => 30.0 + (s - 200.0) / 5.0,
            250..300 => 40.0 + (s - 250.0) / 5.0,
            300..350 => 60.0 + (s - 300.0) / 5.0,
            350..400 => 75.0 + (s - 350.0) / 10.0,
            _ => 85.0 + ((s - 400.0) / 20.0).min(15.0),
        },
    }
}

/// Last-digit rule: a score ending in 7 gains five points, one ending in 0, 1 or 4 loses two.
pub fn digit_adjustment(score: u32) -> i8 {
    match score % 10 {
        7 => 5,
        0 | 1 | 4 => -2,
        _ => 0,
    }
}

pub fn analyze(score: u32, format: MatchFormat) -> ScorePatternResult {
    let baseline = baseline_probability(score, format);
    let adjustment = digit_adjustment(score);
    let team_a_win_probability = percent(baseline + f64::from(adjustment));

    let mut logs = vec![
        format!("First innings score: {score} ({format})"),
        format!("Bracket baseline win probability: {baseline:.1}%"),
    ];
    if adjustment != 0 {
        logs.push(format!(
            "Last digit {} adjustment: {adjustment:+}",
            score % 10
        ));
    }
    logs.push(format!(
        "Batting-first win probability: {team_a_win_probability}%"
    ));

    ScorePatternResult {
        score,
        format,
        baseline,
        digit_adjustment: adjustment,
        team_a_win_probability,
        logs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t20_brackets_with_digit_rule() {
        assert_eq!(analyze(160, MatchFormat::T20).team_a_win_probability, 53);
        // 53.5 + 5 rounds to 59.
        assert_eq!(analyze(157, MatchFormat::T20).team_a_win_probability, 59);
        assert_eq!(analyze(183, MatchFormat::T20).team_a_win_probability, 67);
    }

    #[test]
    fn odi_brackets_with_digit_rule() {
        assert_eq!(analyze(300, MatchFormat::Odi).team_a_win_probability, 58);
        assert_eq!(analyze(275, MatchFormat::Odi).team_a_win_probability, 45);
    }

    #[test]
    fn extremes_are_clamped() {
        assert_eq!(analyze(0, MatchFormat::T20).team_a_win_probability, 0);
        assert_eq!(analyze(0, MatchFormat::Odi).team_a_win_probability, 0);
        assert_eq!(analyze(999, MatchFormat::T20).team_a_win_probability, 95);
        assert_eq!(analyze(997, MatchFormat::Odi).team_a_win_probability, 100);
    }
}
