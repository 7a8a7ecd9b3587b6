use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use serde::Deserialize;

use cricket_oracle::config::{self, AppConfig};
use cricket_oracle::csv_data::{CsvRepository, TableCache};
use cricket_oracle::logging;
use cricket_oracle::model::{DayColor, FactorScore, MatchRecord, PredictionRequest, TeamColor};
use cricket_oracle::{MemoryRepository, PredictionResult, predict_match};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredictCase {
    #[serde(flatten)]
    request: PredictionRequest,
    #[serde(default)]
    fixtures: Option<Fixtures>,
}

/// Inline history used instead of the CSV directory.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixtures {
    #[serde(default)]
    matches: Vec<MatchRecord>,
    #[serde(default)]
    team_colors: Vec<TeamColor>,
    #[serde(default)]
    day_colors: Vec<DayColor>,
}

struct Args {
    case: PathBuf,
    data_dir: Option<PathBuf>,
    json: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut case = None;
    let mut data_dir = None;
    let mut json = false;
    let mut idx = 0;
    while idx < args.len() {
        let arg = &args[idx];
        if let Some(dir) = arg.strip_prefix("--data=") {
            data_dir = Some(PathBuf::from(dir.trim()));
        } else if arg == "--data" {
            let Some(next) = args.get(idx + 1) else {
                bail!("--data needs a directory");
            };
            data_dir = Some(PathBuf::from(next));
            idx += 1;
        } else if arg == "--json" {
            json = true;
        } else if arg.starts_with("--") {
            bail!("unknown flag {arg}");
        } else {
            case = Some(PathBuf::from(arg));
        }
        idx += 1;
    }
    Ok(Args {
        case: case.unwrap_or_else(|| PathBuf::from("tests/fixtures/predict_case.json")),
        data_dir,
        json,
    })
}

fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    logging::init_stderr();
    let args = parse_args()?;

    let raw = fs::read_to_string(&args.case)
        .with_context(|| format!("read {}", args.case.display()))?;
    let case: PredictCase =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", args.case.display()))?;
    let input = case.request.into_input()?;

    // Inline fixtures win over the data directory unless one is passed explicitly.
    let result = match (case.fixtures, args.data_dir) {
        (Some(fixtures), None) => {
            let repo = MemoryRepository::new()
                .with_matches(fixtures.matches)
                .with_team_colors(fixtures.team_colors)
                .with_day_colors(fixtures.day_colors);
            predict_match(&repo, &input)?
        }
        (_, data_dir) => {
            let data_dir = data_dir.unwrap_or_else(|| AppConfig::from_env().data_dir);
            let repo = CsvRepository::new(data_dir, Arc::new(TableCache::new()));
            predict_match(&repo, &input)?
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&input.team_a, &input.team_b, &result);
    }
    Ok(())
}

fn print_report(team_a: &str, team_b: &str, result: &PredictionResult) {
    for line in &result.logs {
        println!("{line}");
    }
    println!();
    for factor in result.factors.iter() {
        println!(
            "{:<14} {team_a} {:>3.0}%  {team_b} {:>3.0}%",
            factor.title(),
            factor.team_a_score(),
            factor.team_b_score()
        );
    }
    println!();
    println!("{team_a}: {}%", result.team_a_win_percentage);
    println!("{team_b}: {}%", result.team_b_win_percentage);
}
