use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::auth::{Credentials, Session};
use crate::error::InputError;
use crate::model::{
    Gender, MatchFormat, PredictionInput, PredictionMode, PredictionRequest, PredictionResult,
};
use crate::store::{Message, StoredPrediction};
use crate::weather::WeatherData;

const MAX_LOGS: usize = 200;
pub const MAX_SUGGESTIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Form,
    Logs,
    Result,
    History,
    Inbox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    SignIn,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
    Confirm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub mode: LoginMode,
    pub username: String,
    pub password: String,
    pub confirm: String,
    pub focus: LoginField,
    pub error: Option<String>,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            mode: LoginMode::SignIn,
            username: String::new(),
            password: String::new(),
            confirm: String::new(),
            focus: LoginField::Username,
            error: None,
        }
    }
}

impl LoginForm {
    fn fields(&self) -> &'static [LoginField] {
        match self.mode {
            LoginMode::SignIn => &[LoginField::Username, LoginField::Password],
            LoginMode::Register => &[LoginField::Username, LoginField::Password, LoginField::Confirm],
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            LoginMode::SignIn => LoginMode::Register,
            LoginMode::Register => LoginMode::SignIn,
        };
        self.confirm.clear();
        self.error = None;
        if !self.fields().contains(&self.focus) {
            self.focus = LoginField::Username;
        }
    }

    pub fn focus_next(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + 1) % fields.len()];
    }

    pub fn focus_prev(&mut self) {
        let fields = self.fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(idx + fields.len() - 1) % fields.len()];
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
            LoginField::Confirm => &mut self.confirm,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.field_mut().push(c);
        self.error = None;
    }

    pub fn backspace(&mut self) {
        self.field_mut().pop();
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.trim(), self.password.clone())
    }

    /// Clears secrets after a sign-in attempt.
    pub fn reset_secrets(&mut self) {
        self.password.clear();
        self.confirm.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    TeamA,
    TeamB,
    Format,
    Gender,
    Date,
    Stadium,
    Mode,
    Score,
}

impl FormField {
    pub const ALL: [FormField; 8] = [
        FormField::TeamA,
        FormField::TeamB,
        FormField::Format,
        FormField::Gender,
        FormField::Date,
        FormField::Stadium,
        FormField::Mode,
        FormField::Score,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::TeamA => "Team A",
            FormField::TeamB => "Team B",
            FormField::Format => "Format",
            FormField::Gender => "Gender",
            FormField::Date => "Match date",
            FormField::Stadium => "Stadium",
            FormField::Mode => "Mode",
            FormField::Score => "Team A score",
        }
    }

    /// Fields cycled with left/right instead of typed.
    pub fn is_choice(self) -> bool {
        matches!(self, FormField::Format | FormField::Gender | FormField::Mode)
    }
}

/// What the suggestion list under the focused field is searching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Team,
    Stadium,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionForm {
    pub team_a: String,
    pub team_b: String,
    pub format: MatchFormat,
    pub gender: Gender,
    pub match_date: String,
    pub stadium: String,
    pub mode: PredictionMode,
    pub score: String,
    pub focus: FormField,
    pub suggestions: Vec<String>,
    pub suggestion_selected: usize,
    pub error: Option<String>,
}

impl Default for PredictionForm {
    fn default() -> Self {
        Self {
            team_a: String::new(),
            team_b: String::new(),
            format: MatchFormat::Odi,
            gender: Gender::Male,
            match_date: String::new(),
            stadium: String::new(),
            mode: PredictionMode::PreMatch,
            score: String::new(),
            focus: FormField::TeamA,
            suggestions: Vec::new(),
            suggestion_selected: 0,
            error: None,
        }
    }
}

impl PredictionForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            match_date: today.format("%Y-%m-%d").to_string(),
            ..Self::default()
        }
    }

    /// Fields shown for the current mode; the score only after the first innings.
    pub fn visible_fields(&self) -> Vec<FormField> {
        FormField::ALL
            .into_iter()
            .filter(|f| *f != FormField::Score || self.mode == PredictionMode::PostInnings)
            .collect()
    }

    pub fn focus_next(&mut self) {
        let fields = self.visible_fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.set_focus(fields[(idx + 1) % fields.len()]);
    }

    pub fn focus_prev(&mut self) {
        let fields = self.visible_fields();
        let idx = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.set_focus(fields[(idx + fields.len() - 1) % fields.len()]);
    }

    fn set_focus(&mut self, field: FormField) {
        self.focus = field;
        self.suggestions.clear();
        self.suggestion_selected = 0;
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::TeamA => Some(&mut self.team_a),
            FormField::TeamB => Some(&mut self.team_b),
            FormField::Date => Some(&mut self.match_date),
            FormField::Stadium => Some(&mut self.stadium),
            FormField::Score => Some(&mut self.score),
            FormField::Format | FormField::Gender | FormField::Mode => None,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        if self.focus == FormField::Score && !c.is_ascii_digit() {
            return;
        }
        if let Some(text) = self.text_mut() {
            text.push(c);
            self.error = None;
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.text_mut() {
            text.pop();
        }
    }

    /// Steps a choice field forwards or backwards.
    pub fn cycle_choice(&mut self, forward: bool) {
        match self.focus {
            FormField::Format => self.format = cycle(&MatchFormat::ALL, self.format, forward),
            FormField::Gender => self.gender = cycle(&Gender::ALL, self.gender, forward),
            FormField::Mode => {
                self.mode = cycle(
                    &[PredictionMode::PreMatch, PredictionMode::PostInnings],
                    self.mode,
                    forward,
                );
            }
            _ => {}
        }
    }

    pub fn suggestion_query(&self) -> Option<(SuggestionKind, &str)> {
        let (kind, text) = match self.focus {
            FormField::TeamA => (SuggestionKind::Team, self.team_a.as_str()),
            FormField::TeamB => (SuggestionKind::Team, self.team_b.as_str()),
            FormField::Stadium => (SuggestionKind::Stadium, self.stadium.as_str()),
            _ => return None,
        };
        let text = text.trim();
        (!text.is_empty()).then_some((kind, text))
    }

    pub fn set_suggestions(&mut self, mut items: Vec<String>) {
        items.truncate(MAX_SUGGESTIONS);
        self.suggestions = items;
        self.suggestion_selected = 0;
    }

    pub fn select_suggestion(&mut self, forward: bool) {
        let len = self.suggestions.len();
        if len == 0 {
            return;
        }
        self.suggestion_selected = if forward {
            (self.suggestion_selected + 1) % len
        } else {
            (self.suggestion_selected + len - 1) % len
        };
    }

    /// Copies the highlighted suggestion into the focused field. Returns whether one was applied.
    pub fn accept_suggestion(&mut self) -> bool {
        let Some(choice) = self.suggestions.get(self.suggestion_selected).cloned() else {
            return false;
        };
        let Some(text) = self.text_mut() else {
            return false;
        };
        *text = choice;
        self.suggestions.clear();
        self.suggestion_selected = 0;
        true
    }

    pub fn to_request(&self) -> PredictionRequest {
        let score = self.score.trim();
        PredictionRequest {
            team_a: self.team_a.trim().to_string(),
            team_b: self.team_b.trim().to_string(),
            match_format: self.format.label().to_string(),
            gender: self.gender.label().to_string(),
            match_date: self.match_date.trim().to_string(),
            stadium: self.stadium.trim().to_string(),
            team_a_score: match self.mode {
                PredictionMode::PostInnings if !score.is_empty() => score.parse::<i64>().ok(),
                _ => None,
            },
            prediction_mode: self.mode.key().to_string(),
        }
    }

    pub fn to_input(&self) -> Result<PredictionInput, InputError> {
        let score = self.score.trim();
        if self.mode == PredictionMode::PostInnings
            && !score.is_empty()
            && score.parse::<i64>().is_err()
        {
            return Err(InputError::InvalidScore(score.to_string()));
        }
        self.to_request().into_input()
    }
}

fn cycle<T: Copy + PartialEq>(options: &[T], current: T, forward: bool) -> T {
    let len = options.len();
    let idx = options.iter().position(|o| *o == current).unwrap_or(0);
    let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
    options[next]
}

/// Replays audit lines one at a time.
#[derive(Debug, Clone)]
pub struct LogReveal {
    lines: Vec<String>,
    shown: usize,
    interval: Duration,
    last_step: Option<Instant>,
}

impl LogReveal {
    pub fn new(lines: Vec<String>, interval: Duration) -> Self {
        Self {
            lines,
            shown: 0,
            interval,
            last_step: None,
        }
    }

    /// Reveals as many lines as are due at `now`. Returns whether anything changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.is_done() {
            return false;
        }
        let Some(last) = self.last_step else {
            self.last_step = Some(now);
            self.shown = 1;
            return true;
        };
        let interval = self.interval.max(Duration::from_millis(1));
        let due = (now.saturating_duration_since(last).as_millis() / interval.as_millis()) as usize;
        if due == 0 {
            return false;
        }
        self.shown = (self.shown + due).min(self.lines.len());
        self.last_step = Some(last + interval * due as u32);
        true
    }

    pub fn skip(&mut self) {
        self.shown = self.lines.len();
    }

    pub fn is_done(&self) -> bool {
        self.shown >= self.lines.len()
    }

    pub fn visible(&self) -> &[String] {
        &self.lines[..self.shown]
    }

    pub fn total(&self) -> usize {
        self.lines.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherStatus {
    Disabled,
    Idle,
    Loading(String),
    Ready(WeatherData),
    Failed(String),
}

impl WeatherStatus {
    pub fn data(&self) -> Option<&WeatherData> {
        match self {
            WeatherStatus::Ready(data) => Some(data),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub help_overlay: bool,
    pub login: LoginForm,
    pub form: PredictionForm,
    pub session: Option<Session>,
    pub reveal: Option<LogReveal>,
    pub last_input: Option<PredictionInput>,
    pub result: Option<PredictionResult>,
    pub pending_save: bool,
    pub weather: WeatherStatus,
    pub history: Vec<StoredPrediction>,
    pub history_selected: usize,
    pub inbox: Vec<Message>,
    pub compose: String,
    pub composing: bool,
    pub status: Option<String>,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new(today: NaiveDate, weather_enabled: bool) -> Self {
        Self {
            screen: Screen::Login,
            help_overlay: false,
            login: LoginForm::default(),
            form: PredictionForm::new(today),
            session: None,
            reveal: None,
            last_input: None,
            result: None,
            pending_save: false,
            weather: if weather_enabled {
                WeatherStatus::Idle
            } else {
                WeatherStatus::Disabled
            },
            history: Vec::new(),
            history_selected: 0,
            inbox: Vec::new(),
            compose: String::new(),
            composing: false,
            status: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn is_guest(&self) -> bool {
        self.session.is_none()
    }

    pub fn sign_in(&mut self, session: Session) {
        self.push_log(format!("[INFO] Signed in as {}", session.username));
        self.session = Some(session);
        self.login.reset_secrets();
        self.login.error = None;
        self.screen = Screen::Form;
    }

    pub fn continue_as_guest(&mut self) {
        self.session = None;
        self.login.reset_secrets();
        self.push_log("[INFO] Continuing as guest; predictions are not saved");
        self.screen = Screen::Form;
    }

    pub fn sign_out(&mut self) {
        if let Some(session) = self.session.take() {
            self.push_log(format!("[INFO] Signed out {}", session.username));
        }
        self.history.clear();
        self.inbox.clear();
        self.pending_save = false;
        self.screen = Screen::Login;
    }

    /// Starts the log replay for a finished prediction.
    pub fn begin_prediction(
        &mut self,
        input: PredictionInput,
        result: PredictionResult,
        reveal_interval: Duration,
    ) {
        self.reveal = Some(LogReveal::new(result.logs.clone(), reveal_interval));
        self.pending_save = self.session.is_some();
        self.last_input = Some(input);
        self.result = Some(result);
        self.form.error = None;
        self.screen = Screen::Logs;
    }

    /// Advances the log replay and moves to the result once it is complete.
    pub fn tick_reveal(&mut self, now: Instant) {
        let Some(reveal) = self.reveal.as_mut() else {
            return;
        };
        reveal.tick(now);
        if reveal.is_done() && self.screen == Screen::Logs {
            self.screen = Screen::Result;
        }
    }

    pub fn skip_reveal(&mut self) {
        if let Some(reveal) = self.reveal.as_mut() {
            reveal.skip();
        }
        if self.screen == Screen::Logs {
            self.screen = Screen::Result;
        }
    }

    pub fn select_history(&mut self, forward: bool) {
        let len = self.history.len();
        if len == 0 {
            self.history_selected = 0;
            return;
        }
        self.history_selected = if forward {
            (self.history_selected + 1).min(len - 1)
        } else {
            self.history_selected.saturating_sub(1)
        };
    }

    pub fn selected_history(&self) -> Option<&StoredPrediction> {
        self.history.get(self.history_selected)
    }

    pub fn unread_messages(&self) -> usize {
        self.inbox.iter().filter(|m| m.from_admin && !m.read).count()
    }
}
