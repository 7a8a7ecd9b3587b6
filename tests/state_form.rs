use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};

use cricket_oracle::auth::{Role, Session};
use cricket_oracle::model::{Gender, MatchFormat, PredictionMode};
use cricket_oracle::state::{
    AppState, FormField, LoginField, LoginMode, PredictionForm, Screen, SuggestionKind,
};
use cricket_oracle::{InputError, MemoryRepository, predict_match};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn type_text(form: &mut PredictionForm, text: &str) {
    for c in text.chars() {
        form.insert_char(c);
    }
}

fn filled_form() -> PredictionForm {
    let mut form = PredictionForm::new(today());
    type_text(&mut form, "India");
    form.focus_next();
    type_text(&mut form, "Australia");
    form.focus_next();
    form.focus_next();
    form.focus_next();
    form.focus_next();
    type_text(&mut form, "Wankhede Stadium");
    form
}

fn session() -> Session {
    Session {
        token: "token".to_string(),
        user_id: 7,
        username: "priya".to_string(),
        role: Role::User,
        expires_at: Utc::now() + chrono::Duration::hours(1),
    }
}

#[test]
fn form_starts_with_todays_date() {
    let form = PredictionForm::new(today());
    assert_eq!(form.match_date, "2024-03-15");
    assert_eq!(form.focus, FormField::TeamA);
    assert!(!form.visible_fields().contains(&FormField::Score));
}

#[test]
fn score_field_only_appears_after_first_innings() {
    let mut form = filled_form();
    assert_eq!(form.focus, FormField::Stadium);
    form.focus_next();
    assert_eq!(form.focus, FormField::Mode);
    form.cycle_choice(true);
    assert_eq!(form.mode, PredictionMode::PostInnings);
    form.focus_next();
    assert_eq!(form.focus, FormField::Score);

    type_text(&mut form, "1a8-3");
    assert_eq!(form.score, "183");

    form.focus_prev();
    form.cycle_choice(false);
    assert_eq!(form.mode, PredictionMode::PreMatch);
    form.focus_next();
    assert_eq!(form.focus, FormField::TeamA);
}

#[test]
fn choice_fields_cycle_both_ways() {
    let mut form = PredictionForm::new(today());
    form.focus_next();
    form.focus_next();
    assert_eq!(form.focus, FormField::Format);
    form.cycle_choice(true);
    assert_eq!(form.format, MatchFormat::T20);
    form.cycle_choice(true);
    assert_eq!(form.format, MatchFormat::Odi);

    form.focus_next();
    form.cycle_choice(false);
    assert_eq!(form.gender, Gender::Female);

    // Typing into a choice field does nothing.
    form.insert_char('x');
    assert_eq!(form.gender, Gender::Female);
}

#[test]
fn suggestions_fill_the_focused_field() {
    let mut form = PredictionForm::new(today());
    type_text(&mut form, "ind");
    assert_eq!(form.suggestion_query(), Some((SuggestionKind::Team, "ind")));

    form.set_suggestions(vec!["India".to_string(), "Indonesia".to_string()]);
    form.select_suggestion(true);
    assert!(form.accept_suggestion());
    assert_eq!(form.team_a, "Indonesia");
    assert!(form.suggestions.is_empty());
    assert!(!form.accept_suggestion());

    form.focus_next();
    form.focus_next();
    assert_eq!(form.suggestion_query(), None);
}

#[test]
fn suggestion_list_is_capped() {
    let mut form = PredictionForm::new(today());
    form.set_suggestions((0..20).map(|i| format!("Team {i}")).collect());
    assert_eq!(form.suggestions.len(), cricket_oracle::state::MAX_SUGGESTIONS);
    form.select_suggestion(false);
    assert_eq!(form.suggestion_selected, form.suggestions.len() - 1);
}

#[test]
fn form_converts_to_validated_input() {
    let form = filled_form();
    let input = form.to_input().unwrap();
    assert_eq!(input.team_a, "India");
    assert_eq!(input.team_b, "Australia");
    assert_eq!(input.match_format, MatchFormat::Odi);
    assert_eq!(input.match_date, today());
    assert_eq!(input.team_a_score, None);

    let request = form.to_request();
    assert_eq!(request.match_format, "ODI");
    assert_eq!(request.prediction_mode, "pre-match");
}

#[test]
fn post_innings_form_needs_a_score() {
    let mut form = filled_form();
    form.mode = PredictionMode::PostInnings;
    assert_eq!(form.to_input(), Err(InputError::MissingScore));
    form.score = "99999999999999999999".to_string();
    assert!(matches!(form.to_input(), Err(InputError::InvalidScore(_))));
    form.score = "160".to_string();
    assert_eq!(form.to_input().unwrap().team_a_score, Some(160));
}

#[test]
fn blank_form_reports_first_missing_field() {
    let form = PredictionForm::new(today());
    assert_eq!(form.to_input(), Err(InputError::MissingField("team A")));
}

#[test]
fn login_form_tracks_mode_and_focus() {
    let mut state = AppState::new(today(), true);
    assert_eq!(state.screen, Screen::Login);
    let login = &mut state.login;
    for c in "priya".chars() {
        login.insert_char(c);
    }
    login.focus_next();
    assert_eq!(login.focus, LoginField::Password);
    login.focus_next();
    assert_eq!(login.focus, LoginField::Username);

    login.toggle_mode();
    assert_eq!(login.mode, LoginMode::Register);
    login.focus_prev();
    assert_eq!(login.focus, LoginField::Confirm);
    login.insert_char('x');
    assert_eq!(login.confirm, "x");

    login.toggle_mode();
    assert_eq!(login.mode, LoginMode::SignIn);
    assert!(login.confirm.is_empty());
    assert_eq!(login.focus, LoginField::Username);
    assert_eq!(login.credentials().username, "priya");
}

#[test]
fn prediction_reveals_logs_then_result() {
    let mut state = AppState::new(today(), false);
    state.sign_in(session());
    assert_eq!(state.screen, Screen::Form);
    assert!(!state.is_guest());

    let input = filled_form().to_input().unwrap();
    let result = predict_match(&MemoryRepository::new(), &input).unwrap();
    let total = result.logs.len();
    state.begin_prediction(input, result, Duration::from_millis(10));
    assert_eq!(state.screen, Screen::Logs);
    assert!(state.pending_save);

    let start = Instant::now();
    state.tick_reveal(start);
    assert_eq!(state.reveal.as_ref().unwrap().visible().len(), 1);
    assert_eq!(state.screen, Screen::Logs);

    state.tick_reveal(start + Duration::from_millis(10) * total as u32);
    assert!(state.reveal.as_ref().unwrap().is_done());
    assert_eq!(state.screen, Screen::Result);
}

#[test]
fn guests_do_not_queue_saves() {
    let mut state = AppState::new(today(), false);
    state.continue_as_guest();
    let input = filled_form().to_input().unwrap();
    let result = predict_match(&MemoryRepository::new(), &input).unwrap();
    state.begin_prediction(input, result, Duration::from_millis(10));
    assert!(!state.pending_save);
    state.skip_reveal();
    assert_eq!(state.screen, Screen::Result);
}

#[test]
fn sign_out_clears_user_data() {
    let mut state = AppState::new(today(), false);
    state.sign_in(session());
    state.compose = "draft".to_string();
    state.sign_out();
    assert!(state.is_guest());
    assert_eq!(state.screen, Screen::Login);
    assert!(state.inbox.is_empty());
    assert!(state.logs.iter().any(|l| l.contains("Signed out priya")));
}
