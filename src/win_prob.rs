use tracing::info;

use crate::color_theory;
use crate::error::InputError;
use crate::head_to_head;
use crate::model::{FactorScore, PredictionFactors, PredictionInput, PredictionMode, PredictionResult};
use crate::repository::MatchRepository;
use crate::score_pattern;
use crate::seasonal;
use crate::stadium;

const SEPARATOR: &str = "---------------------------------------------";

/// Fixed weight per factor. `score_pattern` is zero when the factor does not run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorWeights {
    pub head_to_head: f64,
    pub stadium: f64,
    pub color: f64,
    pub seasonal: f64,
    pub score_pattern: f64,
}

impl FactorWeights {
    pub const PRE_MATCH: FactorWeights = FactorWeights {
        head_to_head: 0.35,
        stadium: 0.25,
        color: 0.15,
        seasonal: 0.25,
        score_pattern: 0.0,
    };

    pub const POST_INNINGS: FactorWeights = FactorWeights {
        head_to_head: 0.20,
        stadium: 0.15,
        color: 0.10,
        seasonal: 0.15,
        score_pattern: 0.40,
    };

    pub fn for_mode(mode: PredictionMode) -> Self {
        match mode {
            PredictionMode::PreMatch => Self::PRE_MATCH,
            PredictionMode::PostInnings => Self::POST_INNINGS,
        }
    }

    fn table(&self) -> [(&'static str, f64); 5] {
        [
            ("Head-to-head record", self.head_to_head),
            ("Stadium performance", self.stadium),
            ("Color theory", self.color),
            ("Seasonal factors", self.seasonal),
            ("First innings score", self.score_pattern),
        ]
    }

    /// Weights in the same order as [`PredictionFactors::iter`].
    pub fn ordered(&self) -> [f64; 5] {
        [
            self.head_to_head,
            self.stadium,
            self.color,
            self.seasonal,
            self.score_pattern,
        ]
    }
}

/// Runs every factor against `repo` and combines them into a final pair that sums to 100.
///
/// Only malformed input is an error. Data gaps and repository failures are
/// absorbed by each factor's neutral fallback and show up in the logs.
pub fn predict_match<R: MatchRepository + ?Sized>(
    repo: &R,
    input: &PredictionInput,
) -> Result<PredictionResult, InputError> {
    input.validate()?;

    let PredictionInput {
        team_a,
        team_b,
        match_format,
        gender,
        match_date,
        stadium: venue,
        prediction_mode,
        ..
    } = input;
    let (format, gender, date, mode) = (*match_format, *gender, *match_date, *prediction_mode);

    let ((head_to_head, stadium_advantage), (color_theory, seasonal_factor)) = rayon::join(
        || {
            rayon::join(
                || head_to_head::analyze(repo, team_a, team_b, format, gender),
                || stadium::analyze(repo, team_a, team_b, venue, format, gender),
            )
        },
        || {
            rayon::join(
                || color_theory::analyze_with(repo, team_a, team_b, date),
                || seasonal::analyze(repo, team_a, team_b, date, format, gender),
            )
        },
    );
    let score_pattern = input
        .first_innings_score()
        .map(|score| score_pattern::analyze(score, format));

    let factors = PredictionFactors {
        head_to_head,
        stadium_advantage,
        color_theory,
        seasonal_factor,
        score_pattern,
    };
    let weights = FactorWeights::for_mode(mode);

    let mut logs = vec![
        format!("Starting prediction analysis for {team_a} vs {team_b}"),
        format!("Match details: {format}, {gender}, {venue}, {date}"),
        format!("Prediction mode: {}", mode.label()),
    ];
    let sections = [
        "FACTOR 1: HEAD-TO-HEAD ANALYSIS",
        "FACTOR 2: STADIUM PERFORMANCE ANALYSIS",
        "FACTOR 3: COLOR THEORY ANALYSIS",
        "FACTOR 4: SEASONAL PERFORMANCE ANALYSIS",
        "FACTOR 5: FIRST INNINGS SCORE ANALYSIS",
    ];
    for (heading, factor) in sections.iter().zip(factors.iter()) {
        push_heading(&mut logs, heading);
        logs.extend(factor.audit().iter().cloned());
    }

    push_heading(&mut logs, "FINAL PREDICTION CALCULATION");
    logs.push(format!("{} prediction model weights:", mode.label()));
    for (label, weight) in weights.table() {
        if weight > 0.0 {
            logs.push(format!("- {label}: {}%", weight_percent(weight)));
        }
    }

    logs.push("Component contributions to final prediction:".to_string());
    let mut raw_a = 0.0;
    let mut raw_b = 0.0;
    for (factor, weight) in factors.iter().zip(weights.ordered()) {
        let part_a = factor.team_a_score() * weight;
        let part_b = factor.team_b_score() * weight;
        raw_a += part_a;
        raw_b += part_b;
        logs.push(format!(
            "- {}: {team_a} {part_a:.1}% | {team_b} {part_b:.1}%",
            factor.title()
        ));
    }
    if mode == PredictionMode::PostInnings {
        raw_b = 100.0 - raw_a;
    }

    let (team_a_win_percentage, team_b_win_percentage) = normalize(raw_a, raw_b);

    logs.push(SEPARATOR.to_string());
    logs.push(format!(
        "FINAL PREDICTION: {team_a} {team_a_win_percentage}% - {team_b} {team_b_win_percentage}%"
    ));
    logs.push(SEPARATOR.to_string());

    info!(
        team_a = team_a.as_str(),
        team_b = team_b.as_str(),
        mode = mode.key(),
        a = team_a_win_percentage,
        b = team_b_win_percentage,
        "prediction complete"
    );

    Ok(PredictionResult {
        team_a_win_percentage,
        team_b_win_percentage,
        factors,
        logs,
    })
}

/// Scales a raw weighted pair so the rounded result sums to exactly 100.
pub fn normalize(raw_a: f64, raw_b: f64) -> (u8, u8) {
    let total = raw_a + raw_b;
    if !total.is_finite() || total <= 0.0 {
        return (50, 50);
    }
    let a = (raw_a / total * 100.0).clamp(0.0, 100.0).round() as u8;
    (a, 100 - a)
}

fn push_heading(logs: &mut Vec<String>, heading: &str) {
    logs.push(SEPARATOR.to_string());
    logs.push(heading.to_string());
    logs.push(SEPARATOR.to_string());
}

fn weight_percent(weight: f64) -> String {
    let pct = weight * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{}", pct.round() as i64)
    } else {
        format!("{pct:.1}")
    }
}
