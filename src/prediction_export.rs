use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::model::FactorScore;
use crate::store::{StoredPrediction, User};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub predictions: usize,
    pub factor_rows: usize,
    pub errors: Vec<String>,
}

/// Writes saved predictions to an XLSX workbook with `Predictions` and `Factors` sheets.
///
/// Predictions whose stored result cannot be decoded still get a row on the
/// first sheet; the decode error is reported instead of their factor rows.
pub fn export_predictions(
    path: &Path,
    predictions: &[StoredPrediction],
    users: &[User],
) -> Result<ExportReport> {
    let usernames: HashMap<i64, &str> = users
        .iter()
        .map(|u| (u.id, u.username.as_str()))
        .collect();
    let mut errors = Vec::new();

    let mut prediction_rows = vec![vec![
        "ID".to_string(),
        "User".to_string(),
        "Created".to_string(),
        "Team A".to_string(),
        "Team B".to_string(),
        "Format".to_string(),
        "Gender".to_string(),
        "Match Date".to_string(),
        "Stadium".to_string(),
        "Mode".to_string(),
        "Team A Score".to_string(),
        "Team A Win %".to_string(),
        "Team B Win %".to_string(),
        "Weather".to_string(),
    ]];

    let mut factor_rows = vec![vec![
        "Prediction ID".to_string(),
        "Factor".to_string(),
        "Team A".to_string(),
        "Team B".to_string(),
        "Team A Value".to_string(),
        "Team B Value".to_string(),
    ]];

    for prediction in predictions {
        let user = prediction
            .user_id
            .map(|id| {
                usernames
                    .get(&id)
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| format!("#{id}"))
            })
            .unwrap_or_else(|| "guest".to_string());
        let weather = match prediction.weather() {
            Ok(Some(w)) => format!("{} {}°C {}", w.city, w.temperature, w.conditions),
            Ok(None) => String::new(),
            Err(err) => {
                errors.push(format!("{err:#}"));
                String::new()
            }
        };
        prediction_rows.push(vec![
            prediction.id.to_string(),
            user,
            prediction.created_at.clone(),
            prediction.team_a.clone(),
            prediction.team_b.clone(),
            prediction.match_format.clone(),
            prediction.gender.clone(),
            prediction.match_date.clone(),
            prediction.stadium.clone(),
            prediction.prediction_mode.clone(),
            opt_to_string(prediction.team_a_score),
            prediction.team_a_win_percentage.to_string(),
            prediction.team_b_win_percentage.to_string(),
            weather,
        ]);

        match prediction.result() {
            Ok(result) => {
                factor_rows.extend(
                    result
                        .factors
                        .iter()
                        .map(|factor| factor_row(prediction, factor)),
                );
            }
            Err(err) => errors.push(format!("{err:#}")),
        }
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Predictions")?;
        write_rows(sheet, &prediction_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Factors")?;
        write_rows(sheet, &factor_rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;

    Ok(ExportReport {
        predictions: prediction_rows.len() - 1,
        factor_rows: factor_rows.len() - 1,
        errors,
    })
}

fn factor_row(prediction: &StoredPrediction, factor: &dyn FactorScore) -> Vec<String> {
    vec![
        prediction.id.to_string(),
        factor.title().to_string(),
        prediction.team_a.clone(),
        prediction.team_b.clone(),
        format!("{:.0}", factor.team_a_score()),
        format!("{:.0}", factor.team_b_score()),
    ]
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
