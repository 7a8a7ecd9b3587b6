use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, Weekday};

use cricket_oracle::MatchRepository;
use cricket_oracle::csv_data::{CsvRepository, TEAMS_FILE, TableCache};
use cricket_oracle::model::{Gender, MatchFormat};

fn repo() -> CsvRepository {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("data");
    CsvRepository::new(path, Arc::new(TableCache::new()))
}

#[test]
fn index_selects_match_files() {
    let repo = repo();
    assert_eq!(repo.match_file(MatchFormat::Odi, Gender::Male), "ODI.csv");
    assert_eq!(repo.match_file(MatchFormat::Odi, Gender::Female), "ODI_Women.csv");
    // No index row for women's T20s, so the format default is used.
    assert_eq!(repo.match_file(MatchFormat::T20, Gender::Female), "T20.csv");
}

#[test]
fn loads_matches_with_dates_and_stadiums() {
    let matches = repo().all_matches(MatchFormat::Odi, Gender::Male).unwrap();
    assert_eq!(matches.len(), 7);

    let first = &matches[0];
    assert_eq!(first.team_a, "India");
    assert_eq!(first.team_b, "Australia");
    assert_eq!(first.winner, "India");
    assert_eq!(first.stadium, "Wankhede Stadium");
    assert_eq!(first.match_date, NaiveDate::from_ymd_opt(2023, 3, 12));
    assert_eq!(first.format, MatchFormat::Odi);

    let no_result = matches.last().unwrap();
    assert!(!no_result.has_winner());
    assert_eq!(no_result.stadium, "Eden Gardens");
}

#[test]
fn missing_match_file_is_an_error() {
    assert!(repo().all_matches(MatchFormat::Odi, Gender::Female).is_err());
}

#[test]
fn venue_lookup_ignores_case_and_spacing() {
    let matches = repo()
        .matches_at_venue("  wankhede   STADIUM ", MatchFormat::Odi, Gender::Male)
        .unwrap();
    assert_eq!(matches.len(), 4);
}

#[test]
fn reads_color_tables() {
    let repo = repo();
    let teams = repo.team_colors().unwrap();
    assert_eq!(teams.len(), 3);
    let india = repo.team_color("india").unwrap().unwrap();
    assert_eq!(india.primary_color, "0000FF");
    assert_eq!(india.secondary_color, "FF9933");

    let days = repo.day_colors().unwrap();
    assert_eq!(days.len(), 7);
    let friday = repo.day_color(Weekday::Fri).unwrap().unwrap();
    assert_eq!(friday.color_hex, "#00FF00");
    assert_eq!(friday.color_name, "हरा");
}

#[test]
fn team_and_stadium_search() {
    let repo = repo();
    let teams = repo.teams().unwrap();
    assert_eq!(teams.len(), 4);
    assert_eq!(teams[0].short_name.as_deref(), Some("IND"));

    assert_eq!(repo.search_teams("ENG").unwrap(), vec!["England".to_string()]);
    assert!(repo.search_teams("zzz").unwrap().is_empty());

    assert_eq!(
        repo.stadiums(),
        vec![
            "Eden Gardens".to_string(),
            "Greenfield International Stadium".to_string(),
            "Lord's".to_string(),
            "Wankhede Stadium".to_string(),
        ]
    );
    assert_eq!(repo.search_stadiums("green"), vec!["Greenfield International Stadium".to_string()]);
}

#[test]
fn stadium_city_comes_from_raw_venue() {
    let repo = repo();
    assert_eq!(repo.city_for_stadium("Wankhede Stadium"), "Mumbai");
    assert_eq!(repo.city_for_stadium("Lord's"), "London");
    assert_eq!(repo.city_for_stadium("Unknown Oval"), "Unknown Oval");
}

#[test]
fn tables_are_cached_per_repository() {
    let repo = repo();
    repo.teams().unwrap();
    let cached = repo.cache().len();
    assert!(cached >= 1);
    repo.teams().unwrap();
    assert_eq!(repo.cache().len(), cached);

    repo.cache().clear(Some(TEAMS_FILE));
    assert_eq!(repo.cache().len(), cached - 1);
}
