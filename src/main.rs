use std::io;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph, Row, Table, Wrap};
use tracing::{error, info, warn};

use cricket_oracle::account::Account;
use cricket_oracle::auth::{AuthService, Authenticator};
use cricket_oracle::config::{self, AppConfig};
use cricket_oracle::csv_data::{CsvRepository, TableCache};
use cricket_oracle::error::AuthError;
use cricket_oracle::logging;
use cricket_oracle::model::{FactorScore, PredictionMode, PredictionRequest, PredictionResult};
use cricket_oracle::predict_match;
use cricket_oracle::state::{
    AppState, FormField, LogReveal, LoginField, LoginMode, PredictionForm, Screen, SuggestionKind,
    WeatherStatus,
};
use cricket_oracle::store::Store;
use cricket_oracle::weather::{self, WeatherData};
use cricket_oracle::win_prob::FactorWeights;

const LOG_FILE: &str = "cricket_oracle.log";

struct WeatherUpdate {
    city: String,
    outcome: Result<WeatherData, String>,
}

struct App {
    state: AppState,
    config: AppConfig,
    repo: CsvRepository,
    auth: AuthService,
    weather_tx: mpsc::Sender<WeatherUpdate>,
    should_quit: bool,
}

impl App {
    fn new(
        config: AppConfig,
        repo: CsvRepository,
        auth: AuthService,
        weather_tx: mpsc::Sender<WeatherUpdate>,
    ) -> Self {
        let state = AppState::new(Local::now().date_naive(), config.weather_api_key.is_some());
        Self {
            state,
            config,
            repo,
            auth,
            weather_tx,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        self.state.status = None;
        if key.code == KeyCode::F(1) {
            self.state.help_overlay = !self.state.help_overlay;
            return;
        }
        if self.state.help_overlay {
            if key.code == KeyCode::Esc {
                self.state.help_overlay = false;
            }
            return;
        }

        match self.state.screen {
            Screen::Login => self.on_login_key(key),
            Screen::Form => self.on_form_key(key),
            Screen::Logs => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.state.skip_reveal(),
                KeyCode::Esc => self.state.screen = Screen::Form,
                _ => {}
            },
            Screen::Result => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('?') => self.state.help_overlay = true,
                KeyCode::Esc | KeyCode::Char('b') => self.state.screen = Screen::Form,
                KeyCode::Char('l') => self.replay_logs(),
                KeyCode::Char('w') => {
                    if let Some(stadium) = self.state.last_input.as_ref().map(|i| i.stadium.clone()) {
                        self.request_weather(&stadium);
                    }
                }
                KeyCode::Char('h') => self.open_history(),
                KeyCode::Char('m') => self.open_inbox(),
                _ => {}
            },
            Screen::History => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('?') => self.state.help_overlay = true,
                KeyCode::Esc | KeyCode::Char('b') => self.state.screen = Screen::Form,
                KeyCode::Down | KeyCode::Char('j') => self.state.select_history(true),
                KeyCode::Up | KeyCode::Char('k') => self.state.select_history(false),
                KeyCode::Enter => self.show_saved_prediction(),
                _ => {}
            },
            Screen::Inbox => self.on_inbox_key(key),
        }
    }

    fn on_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down => self.state.login.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.state.login.focus_prev(),
            KeyCode::F(2) => self.state.login.toggle_mode(),
            KeyCode::F(3) => self.state.continue_as_guest(),
            KeyCode::Enter => self.submit_login(),
            KeyCode::Backspace => self.state.login.backspace(),
            KeyCode::Char(c) => self.state.login.insert_char(c),
            _ => {}
        }
    }

    fn on_form_key(&mut self, key: KeyEvent) {
        let has_suggestions = !self.state.form.suggestions.is_empty();
        let on_choice = self.state.form.focus.is_choice();
        match key.code {
            KeyCode::Esc if has_suggestions => self.state.form.set_suggestions(Vec::new()),
            KeyCode::Tab => {
                if !self.state.form.accept_suggestion() {
                    self.state.form.focus_next();
                }
            }
            KeyCode::BackTab => self.state.form.focus_prev(),
            KeyCode::Down if has_suggestions => self.state.form.select_suggestion(true),
            KeyCode::Up if has_suggestions => self.state.form.select_suggestion(false),
            KeyCode::Down => self.state.form.focus_next(),
            KeyCode::Up => self.state.form.focus_prev(),
            KeyCode::Left if on_choice => self.state.form.cycle_choice(false),
            KeyCode::Right if on_choice => self.state.form.cycle_choice(true),
            KeyCode::Char(' ') if on_choice => self.state.form.cycle_choice(true),
            KeyCode::Enter if has_suggestions => {
                self.state.form.accept_suggestion();
            }
            KeyCode::Enter => self.run_prediction(),
            KeyCode::F(4) => self.sign_out(),
            KeyCode::F(5) => self.open_history(),
            KeyCode::F(6) => self.open_inbox(),
            KeyCode::Backspace => {
                self.state.form.backspace();
                self.refresh_suggestions();
            }
            KeyCode::Char(c) => {
                self.state.form.insert_char(c);
                self.refresh_suggestions();
            }
            _ => {}
        }
    }

    fn on_inbox_key(&mut self, key: KeyEvent) {
        if self.state.composing {
            match key.code {
                KeyCode::Esc => {
                    self.state.composing = false;
                    self.state.compose.clear();
                }
                KeyCode::Enter => self.send_message(),
                KeyCode::Backspace => {
                    self.state.compose.pop();
                }
                KeyCode::Char(c) => self.state.compose.push(c),
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            KeyCode::Esc | KeyCode::Char('b') => self.state.screen = Screen::Form,
            KeyCode::Char('c') => self.state.composing = true,
            KeyCode::Char('r') => self.mark_inbox_read(),
            _ => {}
        }
    }

    fn submit_login(&mut self) {
        let credentials = self.state.login.credentials();
        let outcome = match self.state.login.mode {
            LoginMode::SignIn => self.auth.authenticate(&credentials),
            LoginMode::Register => self.auth.register(
                &credentials.username,
                &credentials.password,
                &self.state.login.confirm,
            ),
        };
        match outcome {
            Ok(session) => {
                self.state.sign_in(session);
                self.load_inbox();
            }
            Err(err) => {
                warn!(user = credentials.username.as_str(), error = %err, "sign-in failed");
                self.state.login.error = Some(err.to_string());
                self.state.login.reset_secrets();
            }
        }
    }

    fn sign_out(&mut self) {
        if let Some(session) = self.state.session.as_ref()
            && let Err(err) = self.auth.logout(&session.token)
        {
            warn!(error = %err, "logout failed");
        }
        self.state.sign_out();
    }

    fn refresh_suggestions(&mut self) {
        let Some((kind, query)) = self.state.form.suggestion_query() else {
            self.state.form.set_suggestions(Vec::new());
            return;
        };
        let query = query.to_string();
        let items = match kind {
            SuggestionKind::Team => self.repo.search_teams(&query).unwrap_or_else(|err| {
                warn!(error = %format!("{err:#}"), "team lookup failed");
                Vec::new()
            }),
            SuggestionKind::Stadium => self.repo.search_stadiums(&query),
        };
        self.state.form.set_suggestions(items);
    }

    fn run_prediction(&mut self) {
        let input = match self.state.form.to_input() {
            Ok(input) => input,
            Err(err) => {
                self.state.form.error = Some(err.to_string());
                return;
            }
        };
        match predict_match(&self.repo, &input) {
            Ok(result) => {
                self.state.push_log(format!(
                    "[INFO] {} vs {} at {}: {}% / {}%",
                    input.team_a,
                    input.team_b,
                    input.stadium,
                    result.team_a_win_percentage,
                    result.team_b_win_percentage
                ));
                let stadium = input.stadium.clone();
                self.state
                    .begin_prediction(input, result, self.config.log_reveal_interval);
                self.request_weather(&stadium);
            }
            Err(err) => self.state.form.error = Some(err.to_string()),
        }
    }

    fn replay_logs(&mut self) {
        if let Some(result) = self.state.result.as_ref() {
            self.state.reveal = Some(LogReveal::new(
                result.logs.clone(),
                self.config.log_reveal_interval,
            ));
            self.state.screen = Screen::Logs;
        }
    }

    fn request_weather(&mut self, stadium: &str) {
        if self.state.weather == WeatherStatus::Disabled {
            return;
        }
        let city = self.repo.city_for_stadium(stadium);
        self.state.weather = WeatherStatus::Loading(city.clone());
        let tx = self.weather_tx.clone();
        let config = self.config.clone();
        thread::spawn(move || {
            let outcome = weather::fetch_weather(&config, &city, config.weather_forecast_hours)
                .map_err(|err| format!("{err:#}"));
            let _ = tx.send(WeatherUpdate { city, outcome });
        });
    }

    fn apply_weather(&mut self, update: WeatherUpdate) {
        let WeatherStatus::Loading(pending) = &self.state.weather else {
            return;
        };
        if *pending != update.city {
            return;
        }
        match update.outcome {
            Ok(data) => {
                self.state.push_log(format!(
                    "[INFO] Weather for {}: {}°C {}",
                    data.city, data.temperature, data.conditions
                ));
                self.state.weather = WeatherStatus::Ready(data);
            }
            Err(err) => {
                self.state.push_log(format!("[WARN] Weather for {}: {err}", update.city));
                self.state.weather = WeatherStatus::Failed(err);
            }
        }
    }

    /// Persists the latest prediction once its logs are shown and weather settled.
    fn maybe_save(&mut self) {
        if !self.state.pending_save {
            return;
        }
        let reveal_done = self.state.reveal.as_ref().is_none_or(|r| r.is_done());
        if !reveal_done || matches!(self.state.weather, WeatherStatus::Loading(_)) {
            return;
        }
        self.state.pending_save = false;
        let (Some(session), Some(input), Some(result)) = (
            self.state.session.clone(),
            self.state.last_input.as_ref(),
            self.state.result.as_ref(),
        ) else {
            return;
        };
        let saved = Account::open(&self.auth, session)
            .map_err(anyhow::Error::from)
            .and_then(|account| account.save_prediction(input, result, self.state.weather.data()));
        match saved {
            Ok(stored) => {
                info!(id = stored.id, "prediction saved");
                let msg = format!("Saved prediction #{}", stored.id);
                self.state.push_log(format!("[INFO] {msg}"));
                self.state.status = Some(msg);
            }
            Err(err) => self.report_failure("save prediction", err),
        }
    }

    fn open_history(&mut self) {
        let Some(session) = self.state.session.clone() else {
            self.state.status = Some("Sign in to keep a prediction history".to_string());
            return;
        };
        let loaded = Account::open(&self.auth, session)
            .map_err(anyhow::Error::from)
            .and_then(|account| account.predictions());
        match loaded {
            Ok(history) => {
                self.state.history = history;
                self.state.history_selected = 0;
                self.state.screen = Screen::History;
            }
            Err(err) => self.report_failure("load history", err),
        }
    }

    fn show_saved_prediction(&mut self) {
        let Some(saved) = self.state.selected_history().cloned() else {
            return;
        };
        let result = match saved.result() {
            Ok(result) => result,
            Err(err) => {
                self.state.status = Some(format!("Prediction #{} is unreadable: {err:#}", saved.id));
                return;
            }
        };
        let request = PredictionRequest {
            team_a: saved.team_a.clone(),
            team_b: saved.team_b.clone(),
            match_format: saved.match_format.clone(),
            gender: saved.gender.clone(),
            match_date: saved.match_date.clone(),
            stadium: saved.stadium.clone(),
            team_a_score: saved.team_a_score.map(i64::from),
            prediction_mode: saved.prediction_mode.clone(),
        };
        self.state.last_input = request.into_input().ok();
        if let Ok(Some(data)) = saved.weather() {
            self.state.weather = WeatherStatus::Ready(data);
        }
        self.state.reveal = None;
        self.state.pending_save = false;
        self.state.result = Some(result);
        self.state.screen = Screen::Result;
    }

    fn load_inbox(&mut self) {
        let Some(session) = self.state.session.clone() else {
            return;
        };
        let loaded = Account::open(&self.auth, session)
            .map_err(anyhow::Error::from)
            .and_then(|account| account.messages());
        match loaded {
            Ok(messages) => self.state.inbox = messages,
            Err(err) => self.report_failure("load messages", err),
        }
    }

    fn open_inbox(&mut self) {
        if self.state.is_guest() {
            self.state.status = Some("Sign in to message the admins".to_string());
            return;
        }
        self.load_inbox();
        if self.state.session.is_some() {
            self.state.screen = Screen::Inbox;
        }
    }

    fn send_message(&mut self) {
        let Some(session) = self.state.session.clone() else {
            return;
        };
        let sent = Account::open(&self.auth, session)
            .and_then(|account| account.send_message(&self.state.compose));
        match sent {
            Ok(_) => {
                self.state.compose.clear();
                self.state.composing = false;
                self.state.status = Some("Message sent".to_string());
                self.load_inbox();
            }
            Err(AuthError::Validation(msg)) => self.state.status = Some(msg),
            Err(err) => self.report_failure("send message", err.into()),
        }
    }

    fn mark_inbox_read(&mut self) {
        let Some(session) = self.state.session.clone() else {
            return;
        };
        let unread: Vec<i64> = self
            .state
            .inbox
            .iter()
            .filter(|m| m.from_admin && !m.read)
            .map(|m| m.id)
            .collect();
        let outcome = Account::open(&self.auth, session).and_then(|account| {
            unread
                .iter()
                .try_for_each(|id| account.mark_read(*id).map(|_| ()))
        });
        match outcome {
            Ok(()) => self.load_inbox(),
            Err(err) => self.report_failure("mark messages read", err.into()),
        }
    }

    fn report_failure(&mut self, action: &str, err: anyhow::Error) {
        if matches!(err.downcast_ref::<AuthError>(), Some(AuthError::SessionExpired)) {
            self.state.sign_out();
            self.state.login.error = Some("Session expired, please sign in again".to_string());
            return;
        }
        error!(action, error = %format!("{err:#}"), "request failed");
        self.state.push_log(format!("[ERROR] {action}: {err:#}"));
        self.state.status = Some(format!("Could not {action}"));
    }
}

fn main() -> Result<()> {
    config::load_dotenv();
    let config = AppConfig::from_env();
    if let Some(dir) = config::app_cache_dir() {
        // The terminal owns stdout and stderr while the UI is up.
        if let Err(err) = logging::init_file(&dir.join(LOG_FILE)) {
            eprintln!("warning: file logging disabled: {err:#}");
        }
    }

    let repo = CsvRepository::new(config.data_dir.clone(), Arc::new(TableCache::new()));
    let store = Store::open(&config.db_path)
        .with_context(|| format!("open account store {}", config.db_path.display()))?;
    let auth = AuthService::from_config(store, &config);
    if let Some(admin) = auth.ensure_admin(&config.admin_username, &config.admin_password)? {
        eprintln!("created admin account {:?}; change its password", admin.username);
    }
    info!(data_dir = %config.data_dir.display(), db = %config.db_path.display(), "starting");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let mut app = App::new(config, repo, auth, tx);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<WeatherUpdate>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(update) = rx.try_recv() {
            app.apply_weather(update);
        }

        app.state.tick_reveal(Instant::now());
        app.maybe_save();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Login => render_login(frame, chunks[1], &app.state),
        Screen::Form => render_form(frame, chunks[1], &app.state),
        Screen::Logs => render_logs(frame, chunks[1], &app.state),
        Screen::Result => render_result(frame, chunks[1], &app.state),
        Screen::History => render_history(frame, chunks[1], &app.state),
        Screen::Inbox => render_inbox(frame, chunks[1], &app.state),
    }

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let screen = match state.screen {
        Screen::Login => "Sign in",
        Screen::Form => "New prediction",
        Screen::Logs => "Analysis",
        Screen::Result => "Result",
        Screen::History => "History",
        Screen::Inbox => "Messages",
    };
    let user = match &state.session {
        Some(session) if session.is_admin() => format!("{} (admin)", session.username),
        Some(session) => session.username.clone(),
        None => "guest".to_string(),
    };
    let unread = match state.unread_messages() {
        0 => String::new(),
        n => format!(" | {n} unread"),
    };
    let line1 = format!("  _||_  CRICKET ORACLE | {screen} | {user}{unread}");
    let line2 = match &state.status {
        Some(status) => format!("  |  |  {status}"),
        None => "  |  |".to_string(),
    };
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Login => {
            "Tab/↑/↓ Field | Enter Submit | F2 Sign in/Register | F3 Guest | F1 Help | Esc Quit".to_string()
        }
        Screen::Form => {
            "Tab Next/accept | ←/→ Choice | Enter Predict | F4 Sign out | F5 History | F6 Messages | F1 Help".to_string()
        }
        Screen::Logs => "Enter/Space Skip | Esc Form | F1 Help".to_string(),
        Screen::Result => {
            "b/Esc Form | l Replay logs | w Weather | h History | m Messages | ? Help | q Quit".to_string()
        }
        Screen::History => "j/k/↑/↓ Move | Enter Open | b/Esc Form | ? Help | q Quit".to_string(),
        Screen::Inbox if state.composing => "Enter Send | Esc Cancel".to_string(),
        Screen::Inbox => "c Compose | r Mark read | b/Esc Form | ? Help | q Quit".to_string(),
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn render_login(frame: &mut Frame, area: Rect, state: &AppState) {
    let login = &state.login;
    let popup = centered_rect(50, 60, area);
    let title = match login.mode {
        LoginMode::SignIn => "Sign in",
        LoginMode::Register => "Register",
    };

    let mut fields = vec![
        (LoginField::Username, "Username", login.username.clone()),
        (LoginField::Password, "Password", "*".repeat(login.password.chars().count())),
    ];
    if login.mode == LoginMode::Register {
        fields.push((
            LoginField::Confirm,
            "Confirm",
            "*".repeat(login.confirm.chars().count()),
        ));
    }

    let mut lines: Vec<Line> = vec![Line::from("")];
    for (field, label, value) in fields {
        let focused = login.focus == field;
        let marker = if focused { ">" } else { " " };
        lines.push(Line::styled(
            format!("{marker} {label:<10} {value}"),
            focus_style(focused),
        ));
    }
    lines.push(Line::from(""));
    if let Some(err) = &login.error {
        lines.push(Line::styled(err.clone(), Style::default().fg(Color::Red)));
    } else {
        lines.push(Line::styled(
            "Guests can predict but nothing is saved.",
            Style::default().fg(Color::DarkGray),
        ));
    }

    let panel = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(panel, popup);
}

fn field_value(form: &PredictionForm, field: FormField) -> String {
    match field {
        FormField::TeamA => form.team_a.clone(),
        FormField::TeamB => form.team_b.clone(),
        FormField::Format => format!("< {} >", form.format.label()),
        FormField::Gender => format!("< {} >", form.gender.label()),
        FormField::Date => form.match_date.clone(),
        FormField::Stadium => form.stadium.clone(),
        FormField::Mode => format!("< {} >", form.mode.label()),
        FormField::Score => form.score.clone(),
    }
}

fn render_form(frame: &mut Frame, area: Rect, state: &AppState) {
    let form = &state.form;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    for field in form.visible_fields() {
        let focused = form.focus == field;
        let marker = if focused { ">" } else { " " };
        lines.push(Line::styled(
            format!("{marker} {:<13} {}", field.label(), field_value(form, field)),
            focus_style(focused),
        ));
    }
    lines.push(Line::from(""));
    lines.push(Line::styled(
        weather_text(&state.weather),
        Style::default().fg(Color::DarkGray),
    ));
    if let Some(err) = &form.error {
        lines.push(Line::from(""));
        lines.push(Line::styled(err.clone(), Style::default().fg(Color::Red)));
    }
    let panel = Paragraph::new(lines)
        .block(Block::default().title("Match").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(panel, columns[0]);

    let suggestions: Vec<Line> = form
        .suggestions
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let selected = idx == form.suggestion_selected;
            let style = if selected {
                Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::styled(item.clone(), style)
        })
        .collect();
    let panel = Paragraph::new(suggestions)
        .block(Block::default().title("Suggestions").borders(Borders::ALL));
    frame.render_widget(panel, columns[1]);
}

fn render_logs(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(reveal) = state.reveal.as_ref() else {
        frame.render_widget(
            Paragraph::new("No analysis yet.").block(Block::default().borders(Borders::ALL)),
            area,
        );
        return;
    };
    let lines: Vec<Line> = reveal
        .visible()
        .iter()
        .map(|line| Line::styled(line.clone(), log_style(line)))
        .collect();
    let inner_height = area.height.saturating_sub(2) as usize;
    let offset = lines.len().saturating_sub(inner_height) as u16;
    let title = format!("Analysis {}/{}", reveal.visible().len(), reveal.total());
    let panel = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .scroll((offset, 0));
    frame.render_widget(panel, area);
}

fn log_style(line: &str) -> Style {
    if line.starts_with("FINAL PREDICTION") {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else if line.starts_with("FACTOR") {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else if line.starts_with("---") {
        Style::default().fg(Color::DarkGray)
    } else if line.contains("neutral") || line.contains("No ") {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn render_result(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(result) = state.result.as_ref() else {
        frame.render_widget(
            Paragraph::new("No prediction yet.").block(Block::default().borders(Borders::ALL)),
            area,
        );
        return;
    };
    let (team_a, team_b) = match &state.last_input {
        Some(input) => (input.team_a.clone(), input.team_b.clone()),
        None => ("Team A".to_string(), "Team B".to_string()),
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(4),
            Constraint::Length(4),
        ])
        .split(area);

    let chart = win_bar_chart(&team_a, &team_b, result)
        .block(Block::default().title("Win probability").borders(Borders::ALL));
    frame.render_widget(chart, rows[0]);

    frame.render_widget(factor_table(&team_a, &team_b, result), rows[1]);

    let mut weather_lines = vec![Line::from(weather_text(&state.weather))];
    if let Some(data) = state.weather.data()
        && !data.rain_probability.is_empty()
    {
        let rain = data
            .rain_probability
            .iter()
            .map(|p| format!("{p}%"))
            .collect::<Vec<_>>()
            .join("  ");
        weather_lines.push(Line::from(format!("Rain chance by forecast slot: {rain}")));
    }
    let panel = Paragraph::new(weather_lines)
        .block(Block::default().title("Conditions").borders(Borders::ALL));
    frame.render_widget(panel, rows[2]);
}

fn win_bar_chart(team_a: &str, team_b: &str, result: &PredictionResult) -> BarChart<'static> {
    let a = Bar::default()
        .value(u64::from(result.team_a_win_percentage))
        .label(Line::from(team_a.to_string()))
        .text_value(format!("{}%", result.team_a_win_percentage))
        .style(Style::default().fg(Color::Green));
    let b = Bar::default()
        .value(u64::from(result.team_b_win_percentage))
        .label(Line::from(team_b.to_string()))
        .text_value(format!("{}%", result.team_b_win_percentage))
        .style(Style::default().fg(Color::Red));

    BarChart::default()
        .data(BarGroup::default().bars(&[a, b]))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(1)
        .group_gap(0)
        .max(100)
}

fn factor_table(team_a: &str, team_b: &str, result: &PredictionResult) -> Table<'static> {
    let mode = if result.factors.score_pattern.is_some() {
        PredictionMode::PostInnings
    } else {
        PredictionMode::PreMatch
    };
    let weights = FactorWeights::for_mode(mode).ordered();
    let rows: Vec<Row> = result
        .factors
        .iter()
        .zip(weights)
        .map(|(factor, weight)| {
            Row::new(vec![
                factor.title().to_string(),
                format!("{:.0}%", factor.team_a_score()),
                format!("{:.0}%", factor.team_b_score()),
                format!("{:.0}%", weight * 100.0),
            ])
        })
        .collect();
    let header = Row::new(vec![
        "Factor".to_string(),
        team_a.to_string(),
        team_b.to_string(),
        "Weight".to_string(),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Min(10),
            Constraint::Min(10),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(Block::default().title("Factors").borders(Borders::ALL))
}

fn weather_text(status: &WeatherStatus) -> String {
    match status {
        WeatherStatus::Disabled => "Weather: off (set OPENWEATHER_API_KEY)".to_string(),
        WeatherStatus::Idle => "Weather: fetched after each prediction".to_string(),
        WeatherStatus::Loading(city) => format!("Weather: loading {city}..."),
        WeatherStatus::Ready(data) => format!(
            "Weather: {} {}°C {}",
            data.city, data.temperature, data.conditions
        ),
        WeatherStatus::Failed(err) => format!("Weather unavailable: {err}"),
    }
}

fn render_history(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.history.is_empty() {
        let panel = Paragraph::new("No saved predictions yet.")
            .block(Block::default().title("History").borders(Borders::ALL));
        frame.render_widget(panel, area);
        return;
    }
    let inner_height = area.height.saturating_sub(2) as usize;
    let (start, end) = visible_range(state.history_selected, state.history.len(), inner_height);
    let lines: Vec<Line> = state.history[start..end]
        .iter()
        .enumerate()
        .map(|(offset, saved)| {
            let selected = start + offset == state.history_selected;
            let style = if selected {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Line::styled(
                format!(
                    "#{:<4} {}  {} {}% vs {} {}%  {} {} {}",
                    saved.id,
                    saved.match_date,
                    saved.team_a,
                    saved.team_a_win_percentage,
                    saved.team_b,
                    saved.team_b_win_percentage,
                    saved.match_format,
                    saved.gender,
                    saved.stadium
                ),
                style,
            )
        })
        .collect();
    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(format!("History ({})", state.history.len()))
            .borders(Borders::ALL),
    );
    frame.render_widget(panel, area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_inbox(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(area);

    let lines: Vec<Line> = if state.inbox.is_empty() {
        vec![Line::from("No messages yet. Press c to write to the admins.")]
    } else {
        state
            .inbox
            .iter()
            .map(|m| {
                let who = if m.from_admin { "admin" } else { "you" };
                let style = if m.from_admin && !m.read {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::styled(format!("{}  {who:>5}: {}", m.created_at, m.content), style)
            })
            .collect()
    };
    let inner_height = rows[0].height.saturating_sub(2) as usize;
    let offset = lines.len().saturating_sub(inner_height) as u16;
    let thread = Paragraph::new(lines)
        .block(Block::default().title("Messages").borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    frame.render_widget(thread, rows[0]);

    let compose = Paragraph::new(state.compose.as_str())
        .style(focus_style(state.composing))
        .block(Block::default().title("Compose").borders(Borders::ALL));
    frame.render_widget(compose, rows[1]);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Cricket Oracle - Help",
        "",
        "Global:",
        "  F1           Toggle help",
        "  Ctrl+C       Quit",
        "",
        "Prediction form:",
        "  Tab / ↑/↓    Move between fields",
        "  ←/→ Space    Change format, gender or mode",
        "  Tab / Enter  Accept highlighted suggestion",
        "  Enter        Run prediction",
        "  F4 F5 F6     Sign out, history, messages",
        "",
        "Result:",
        "  l            Replay analysis logs",
        "  w            Refresh weather",
        "  b / Esc      Back to form",
        "",
        "Inbox:",
        "  c            Compose a message",
        "  r            Mark admin replies read",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
