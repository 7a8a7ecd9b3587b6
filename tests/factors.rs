use chrono::{NaiveDate, Weekday};

use cricket_oracle::color_theory::{self, Rgb, color_distance, compatibility};
use cricket_oracle::model::{DayColor, Gender, MatchFormat, MatchRecord, TeamColor};
use cricket_oracle::{head_to_head, score_pattern, seasonal, stadium};

fn played(a: &str, b: &str, winner: &str, date: &str, venue: &str) -> MatchRecord {
    MatchRecord {
        team_a: a.to_string(),
        team_b: b.to_string(),
        winner: winner.to_string(),
        format: MatchFormat::Odi,
        gender: Gender::Male,
        match_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
        stadium: venue.to_string(),
    }
}

fn day(weekday: Weekday, hex: &str) -> DayColor {
    DayColor {
        weekday,
        color_hex: hex.to_string(),
        color_name: String::new(),
    }
}

fn jersey(team: &str, hex: &str) -> TeamColor {
    TeamColor {
        team_name: team.to_string(),
        primary_color: hex.to_string(),
        secondary_color: String::new(),
    }
}

#[test]
fn head_to_head_counts_decisive_results() {
    let matches = [
        played("India", "Australia", "India", "2023-03-12", "Wankhede Stadium"),
        played("Australia", "India", "Australia", "2023-09-22", "Eden Gardens"),
        played("India", "Australia", "India", "2022-03-05", "Wankhede Stadium"),
        played("India", "Australia", "", "2021-01-01", "MCG"),
        played("India", "England", "India", "2020-01-01", "Lord's"),
    ];
    let result = head_to_head::summarize("India", "Australia", MatchFormat::Odi, Gender::Male, &matches);
    assert_eq!(result.team_a_wins, 2);
    assert_eq!(result.team_b_wins, 1);
    assert_eq!(result.no_results, 1);
    assert_eq!(result.matches, 4);
    assert_eq!(result.team_a_win_percentage, 67);
    assert_eq!(result.team_b_win_percentage(), 33);
}

#[test]
fn head_to_head_without_history_is_neutral() {
    let result = head_to_head::summarize("India", "Nepal", MatchFormat::T20, Gender::Female, &[]);
    assert_eq!(result.team_a_win_percentage, 50);
    assert!(result.logs[0].starts_with("No previous T20 Female matches"));
}

#[test]
fn stadium_weights_by_matches_played() {
    let venue = "Wankhede Stadium";
    let matches = [
        played("India", "England", "India", "2023-01-01", venue),
        played("India", "England", "India", "2022-01-01", venue),
        played("India", "England", "India", "2021-01-01", venue),
        played("India", "England", "England", "2020-01-01", venue),
        played("Australia", "England", "Australia", "2019-01-01", venue),
    ];
    // India 3/4 = 75% over 4 games, Australia 1/1 = 100% over 1 game.
    let result = stadium::summarize("India", "Australia", venue, &matches);
    assert_eq!((result.team_a_matches, result.team_a_wins), (4, 3));
    assert_eq!((result.team_b_matches, result.team_b_wins), (1, 1));
    assert_eq!(result.team_a_win_percentage, 75);
    assert_eq!(result.team_b_win_percentage, 25);
}

#[test]
fn stadium_with_one_side_missing_uses_complement() {
    let venue = "Eden Gardens";
    let matches = [
        played("India", "England", "India", "2023-01-01", venue),
        played("India", "England", "England", "2022-01-01", venue),
        played("India", "England", "England", "2021-01-01", venue),
        played("India", "England", "England", "2020-01-01", venue),
    ];
    let result = stadium::summarize("India", "Australia", venue, &matches);
    assert_eq!(result.team_a_win_percentage, 25);
    assert_eq!(result.team_b_win_percentage, 75);

    let empty = stadium::summarize("India", "Australia", venue, &[]);
    assert_eq!((empty.team_a_win_percentage, empty.team_b_win_percentage), (50, 50));
}

#[test]
fn stadium_where_nobody_won_is_neutral() {
    let venue = "MCG";
    let matches = [
        played("India", "Australia", "", "2023-01-01", venue),
        played("India", "Australia", "", "2022-01-01", venue),
    ];
    let result = stadium::summarize("India", "Australia", venue, &matches);
    assert_eq!((result.team_a_win_percentage, result.team_b_win_percentage), (50, 50));
}

#[test]
fn seasonal_uses_match_month_only() {
    let matches = [
        played("India", "England", "India", "2023-03-01", "A"),
        played("India", "England", "England", "2022-03-09", "A"),
        played("India", "England", "India", "2021-03-20", "A"),
        played("India", "England", "England", "2021-07-20", "A"),
        played("Australia", "England", "England", "2020-03-05", "B"),
    ];
    let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let result = seasonal::summarize("India", "Australia", date, &matches);
    assert_eq!(result.month, 3);
    assert_eq!(result.team_a_seasonal_advantage, 67);
    assert_eq!(result.team_b_seasonal_advantage, 0);
    assert_eq!(result.team_a_month_matches, 3);

    let rates = seasonal::monthly_win_rates("India", &matches);
    assert_eq!(rates[2], 67);
    assert_eq!(rates[6], 0);
    assert_eq!(rates[0], 50);
}

#[test]
fn color_theory_rewards_day_compatibility() {
    // 2024-03-15 is a Friday.
    let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
    let teams = [jersey("India", "0000FF"), jersey("Australia", "#FFFF00")];
    let days = [day(Weekday::Fri, "#00FF00"), day(Weekday::Mon, "#FFFFFF")];

    let result = color_theory::analyze("India", "Australia", date, &teams, &days);
    assert_eq!(result.weekday, Some(Weekday::Fri));
    assert_eq!(result.team_a_performance, 46);
    assert_eq!(result.team_b_performance, 60);
    let clash = result.color_clash.unwrap();
    assert!((clash - 1.0).abs() < 1e-9);
}

#[test]
fn color_theory_without_day_color_is_neutral() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();
    let teams = [jersey("India", "0000FF"), jersey("Australia", "FFFF00")];
    let days = [day(Weekday::Fri, "00FF00")];
    let result = color_theory::analyze("India", "Australia", date, &teams, &days);
    assert_eq!((result.team_a_performance, result.team_b_performance), (50, 50));
    assert!(result.color_clash.is_none());
}

#[test]
fn color_math_is_bounded() {
    let black = Rgb::from_hex("#000").unwrap();
    let white = Rgb::from_hex("ffffff").unwrap();
    assert!((color_distance(black, white) - 1.0).abs() < 1e-9);
    assert!(compatibility(black, white).abs() < 1e-9);
    assert!(Rgb::from_hex("#12345").is_none());
    assert!(Rgb::from_hex("zzzzzz").is_none());
}

#[test]
fn score_pattern_follows_format_bands() {
    let t20 = score_pattern::analyze(183, MatchFormat::T20);
    assert_eq!(t20.team_a_win_probability, 67);
    assert_eq!(t20.team_b_win_probability(), 33);
    assert_eq!(t20.digit_adjustment, 0);

    let lucky = score_pattern::analyze(157, MatchFormat::T20);
    assert_eq!(lucky.digit_adjustment, 5);
    assert_eq!(lucky.team_a_win_probability, 59);

    assert_eq!(score_pattern::analyze(300, MatchFormat::Odi).team_a_win_probability, 58);
    assert_eq!(score_pattern::analyze(0, MatchFormat::T20).team_a_win_probability, 0);
}
