use chrono::{Duration, NaiveDate, Weekday};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use cricket_oracle::csv_data::{parse_match_row, parse_table};
use cricket_oracle::model::{DayColor, Gender, MatchFormat, MatchRecord, TeamColor};
use cricket_oracle::weather::parse_weather;
use cricket_oracle::{MemoryRepository, PredictionRequest, predict_match};

const TEAMS: [&str; 8] = [
    "India",
    "Australia",
    "England",
    "South Africa",
    "New Zealand",
    "Pakistan",
    "Sri Lanka",
    "West Indies",
];
const VENUES: [&str; 5] = [
    "Wankhede Stadium",
    "Eden Gardens",
    "Lord's",
    "Melbourne Cricket Ground",
    "Newlands",
];

fn sample_repo(matches: usize) -> MemoryRepository {
    let start = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
    let history = (0..matches).map(|i| {
        let a = TEAMS[i % TEAMS.len()];
        let b = TEAMS[(i * 3 + 1) % TEAMS.len()];
        let b = if a == b { TEAMS[(i + 1) % TEAMS.len()] } else { b };
        MatchRecord {
            team_a: a.to_string(),
            team_b: b.to_string(),
            winner: match i % 5 {
                0 => String::new(),
                1 | 2 => a.to_string(),
                _ => b.to_string(),
            },
            format: if i % 2 == 0 { MatchFormat::Odi } else { MatchFormat::T20 },
            gender: Gender::Male,
            match_date: Some(start + Duration::days((i * 3) as i64)),
            stadium: VENUES[i % VENUES.len()].to_string(),
        }
    });
    let colors = ["0000FF", "FFFF00", "000080", "006400", "000000", "00FF00", "0000CD", "800000"];
    let team_colors = TEAMS.iter().zip(colors).map(|(team, hex)| TeamColor {
        team_name: team.to_string(),
        primary_color: hex.to_string(),
        secondary_color: String::new(),
    });
    let days = [
        (Weekday::Mon, "#FFFFFF"),
        (Weekday::Tue, "#FF0000"),
        (Weekday::Wed, "#0000FF"),
        (Weekday::Thu, "#FFFF00"),
        (Weekday::Fri, "#00FF00"),
        (Weekday::Sat, "#000000"),
        (Weekday::Sun, "#FFA500"),
    ]
    .map(|(weekday, hex)| DayColor {
        weekday,
        color_hex: hex.to_string(),
        color_name: String::new(),
    });

    MemoryRepository::new()
        .with_matches(history)
        .with_team_colors(team_colors)
        .with_day_colors(days)
}

fn request(mode: &str, score: Option<i64>) -> PredictionRequest {
    PredictionRequest {
        team_a: "India".to_string(),
        team_b: "Australia".to_string(),
        match_format: "ODI".to_string(),
        gender: "Male".to_string(),
        match_date: "2024-03-15".to_string(),
        stadium: "Wankhede Stadium".to_string(),
        team_a_score: score,
        prediction_mode: mode.to_string(),
    }
}

fn bench_predict_pre_match(c: &mut Criterion) {
    let repo = sample_repo(5_000);
    let input = request("pre-match", None).into_input().unwrap();
    c.bench_function("predict_pre_match", |b| {
        b.iter(|| {
            let result = predict_match(&repo, black_box(&input)).unwrap();
            black_box(result.team_a_win_percentage);
        })
    });
}

fn bench_predict_post_innings(c: &mut Criterion) {
    let repo = sample_repo(5_000);
    let input = request("post-innings", Some(287)).into_input().unwrap();
    c.bench_function("predict_post_innings", |b| {
        b.iter(|| {
            let result = predict_match(&repo, black_box(&input)).unwrap();
            black_box(result.logs.len());
        })
    });
}

fn bench_match_csv_parse(c: &mut Criterion) {
    c.bench_function("match_csv_parse", |b| {
        b.iter(|| {
            let rows = parse_table(black_box(ODI_CSV.as_bytes())).unwrap();
            let matches = rows
                .iter()
                .filter_map(|row| parse_match_row(row, MatchFormat::Odi, Gender::Male))
                .count();
            black_box(matches);
        })
    });
}

fn bench_weather_parse(c: &mut Criterion) {
    c.bench_function("weather_parse", |b| {
        b.iter(|| {
            let weather =
                parse_weather(black_box(WEATHER_CURRENT_JSON), black_box(WEATHER_FORECAST_JSON), 4)
                    .unwrap();
            black_box(weather.rain_probability.len());
        })
    });
}

criterion_group!(
    perf,
    bench_predict_pre_match,
    bench_predict_post_innings,
    bench_match_csv_parse,
    bench_weather_parse
);
criterion_main!(perf);

static ODI_CSV: &str = include_str!("../tests/fixtures/data/ODI.csv");
static WEATHER_CURRENT_JSON: &str = include_str!("../tests/fixtures/weather_current.json");
static WEATHER_FORECAST_JSON: &str = include_str!("../tests/fixtures/weather_forecast.json");
