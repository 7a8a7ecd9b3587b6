use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};

use cricket_oracle::csv_data::{CsvRepository, TableCache};
use cricket_oracle::model::{DayColor, Gender, MatchFormat, MatchRecord, TeamColor};
use cricket_oracle::{InputError, MatchRepository, PredictionRequest, predict_match};

fn data_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("data");
    path
}

fn fixture_repo() -> CsvRepository {
    CsvRepository::new(data_dir(), Arc::new(TableCache::new()))
}

fn request(format: &str, gender: &str, mode: &str, score: Option<i64>) -> PredictionRequest {
    PredictionRequest {
        team_a: "India".to_string(),
        team_b: "Australia".to_string(),
        match_format: format.to_string(),
        gender: gender.to_string(),
        match_date: "2024-03-15".to_string(),
        stadium: "Wankhede Stadium".to_string(),
        team_a_score: score,
        prediction_mode: mode.to_string(),
    }
}

struct BrokenRepository;

impl MatchRepository for BrokenRepository {
    fn all_matches(&self, _format: MatchFormat, _gender: Gender) -> Result<Vec<MatchRecord>> {
        Err(anyhow!("match store offline"))
    }

    fn team_colors(&self) -> Result<Vec<TeamColor>> {
        Err(anyhow!("color store offline"))
    }

    fn day_colors(&self) -> Result<Vec<DayColor>> {
        Err(anyhow!("color store offline"))
    }
}

#[test]
fn pre_match_prediction_combines_all_factors() {
    let repo = fixture_repo();
    let input = request("ODI", "Male", "pre-match", None).into_input().unwrap();
    let result = predict_match(&repo, &input).unwrap();

    let f = &result.factors;
    assert_eq!(f.head_to_head.team_a_win_percentage, 67);
    assert_eq!(f.stadium_advantage.team_a_win_percentage, 67);
    assert_eq!(f.stadium_advantage.team_b_win_percentage, 33);
    assert_eq!(f.color_theory.team_a_performance, 46);
    assert_eq!(f.color_theory.team_b_performance, 60);
    assert_eq!(f.seasonal_factor.team_a_seasonal_advantage, 67);
    assert_eq!(f.seasonal_factor.team_b_seasonal_advantage, 50);
    assert!(f.score_pattern.is_none());

    assert_eq!(result.team_a_win_percentage, 61);
    assert_eq!(result.team_b_win_percentage, 39);
    assert_eq!(
        result.logs.first().map(String::as_str),
        Some("Starting prediction analysis for India vs Australia")
    );
    assert!(
        result
            .logs
            .iter()
            .any(|l| l == "FINAL PREDICTION: India 61% - Australia 39%")
    );
    assert!(!result.logs.iter().any(|l| l.contains("FACTOR 5")));
}

#[test]
fn repeated_predictions_are_identical() {
    let repo = fixture_repo();
    let input = request("ODI", "Male", "pre-match", None).into_input().unwrap();
    let first = predict_match(&repo, &input).unwrap();
    let second = predict_match(&repo, &input).unwrap();
    assert_eq!(first, second);
}

#[test]
fn post_innings_adds_score_pattern() {
    let repo = fixture_repo();
    let input = request("T20", "Male", "post-innings", Some(183))
        .into_input()
        .unwrap();
    let result = predict_match(&repo, &input).unwrap();

    let f = &result.factors;
    assert_eq!(f.head_to_head.team_a_win_percentage, 50);
    assert_eq!(f.stadium_advantage.team_a_win_percentage, 0);
    assert_eq!(f.stadium_advantage.team_b_win_percentage, 100);
    assert_eq!(f.seasonal_factor.team_a_seasonal_advantage, 50);
    let score = f.score_pattern.as_ref().expect("score pattern should run");
    assert_eq!(score.team_a_win_probability, 67);

    // 10 + 0 + 4.6 + 7.5 + 26.8 for India, Australia takes the rest.
    assert_eq!(result.team_a_win_percentage, 49);
    assert_eq!(result.team_b_win_percentage, 51);
    assert!(result.logs.iter().any(|l| l.contains("FACTOR 5")));
    assert_eq!(result.factors.iter().count(), 5);
}

#[test]
fn pre_match_ignores_supplied_score() {
    let repo = fixture_repo();
    let input = request("ODI", "Male", "pre-match", Some(300))
        .into_input()
        .unwrap();
    let result = predict_match(&repo, &input).unwrap();
    assert!(result.factors.score_pattern.is_none());
    assert_eq!(result.team_a_win_percentage, 61);
}

#[test]
fn missing_match_file_falls_back_to_neutral() {
    // The index points women's ODIs at a file that does not exist.
    let repo = fixture_repo();
    let input = request("ODI", "Female", "pre-match", None).into_input().unwrap();
    let result = predict_match(&repo, &input).unwrap();

    let f = &result.factors;
    assert_eq!(f.head_to_head.team_a_win_percentage, 50);
    assert_eq!(f.stadium_advantage.team_a_win_percentage, 50);
    assert_eq!(f.seasonal_factor.team_a_seasonal_advantage, 50);
    assert_eq!(f.color_theory.team_a_performance, 46);
    assert_eq!(result.team_a_win_percentage, 49);
    assert_eq!(result.team_b_win_percentage, 51);
}

#[test]
fn unavailable_repository_gives_even_split() {
    let input = request("T20", "Male", "pre-match", None).into_input().unwrap();
    let result = predict_match(&BrokenRepository, &input).unwrap();
    assert_eq!(result.team_a_win_percentage, 50);
    assert_eq!(result.team_b_win_percentage, 50);
    assert!(result.logs.iter().any(|l| l.contains("match store offline")));
}

#[test]
fn percentages_always_sum_to_hundred() {
    let repo = fixture_repo();
    for (format, gender) in [("ODI", "Male"), ("T20", "Male"), ("ODI", "Female"), ("T20", "Female")] {
        for score in [0, 97, 150, 187, 264, 333, 999] {
            for mode in ["pre-match", "post-innings"] {
                let input = request(format, gender, mode, Some(score)).into_input().unwrap();
                let result = predict_match(&repo, &input).unwrap();
                assert_eq!(
                    u32::from(result.team_a_win_percentage) + u32::from(result.team_b_win_percentage),
                    100,
                    "{format} {gender} {mode} {score}"
                );
            }
        }
    }
}

#[test]
fn malformed_requests_are_rejected() {
    let mut blank_team = request("ODI", "Male", "pre-match", None);
    blank_team.team_b = "  ".to_string();
    assert_eq!(blank_team.into_input(), Err(InputError::MissingField("team B")));

    let mut bad_date = request("ODI", "Male", "pre-match", None);
    bad_date.match_date = "someday".to_string();
    assert!(matches!(bad_date.into_input(), Err(InputError::InvalidDate(_))));

    assert!(matches!(
        request("Test", "Male", "pre-match", None).into_input(),
        Err(InputError::UnknownFormat(_))
    ));
    assert_eq!(
        request("T20", "Male", "post-innings", None).into_input(),
        Err(InputError::MissingScore)
    );
    assert!(matches!(
        request("T20", "Male", "post-innings", Some(-5)).into_input(),
        Err(InputError::InvalidScore(_))
    ));
}

#[test]
fn predict_match_validates_constructed_input() {
    let repo = fixture_repo();
    let mut input = request("T20", "Male", "post-innings", Some(150))
        .into_input()
        .unwrap();
    input.team_a_score = None;
    assert_eq!(predict_match(&repo, &input), Err(InputError::MissingScore));
}
