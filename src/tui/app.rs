//! Application state and event loop

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::Widget,
    DefaultTerminal, Frame,
};

use crate::services::{
    Aggregator, AppConfig, CatalogLoad, CatalogService, Gateway, HttpGateway, Register,
    SessionStore, StatsReport,
};
use crate::types::{CacheWarning, PrestaError, Transaction};

use super::form::{FilterField, RecordField, RecordForm, StatsFilter, TextInput};
use super::theme::Theme;
use super::widgets::{
    help::HelpPopup,
    login::LoginView,
    quit_confirm::{QuitConfirmPopup, QuitConfirmState},
    record::RecordView,
    spinner::{LoadingStage, Spinner},
    stats::StatsView,
    status::StatusMessage,
    tabs::Tab,
};

/// Application state
pub enum AppState {
    /// No session token yet
    SignedOut { input: TextInput },
    /// Loading data with spinner animation
    Loading {
        spinner_frame: usize,
        stage: LoadingStage,
    },
    /// Ready with loaded data
    Ready { data: Box<AppData> },
    /// The catalog could not be loaded
    Error { message: String },
}

/// Loaded application data
pub struct AppData {
    pub register: Register,
    pub transactions: Vec<Transaction>,
    pub report: StatsReport,
    /// Set when the history could not be fetched; the Record tab still works
    pub history_error: Option<String>,
    pub catalog_warning: Option<CacheWarning>,
}

/// Result of the background load
pub struct LoadedData {
    pub catalog: CatalogLoad,
    pub transactions: Result<Vec<Transaction>, String>,
}

/// Messages from the loader thread
pub enum LoadEvent {
    Stage(LoadingStage),
    Done(Result<LoadedData, String>),
}

/// Work the event loop performs outside of key handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Login(String),
    Logout,
    Reload,
    Submit,
    RefreshHistory,
}

/// Main application
pub struct App {
    state: AppState,
    should_quit: bool,
    current_tab: Tab,
    show_help: bool,
    quit_confirm: Option<QuitConfirmState>,
    token: Option<String>,
    form: RecordForm,
    filter: StatsFilter,
    status: Option<StatusMessage>,
    submitting: bool,
    pending: Option<PendingAction>,
    theme: Theme,
}

impl App {
    /// Start signed out, or loading when a token is already stored
    pub fn new(token: Option<String>, today: NaiveDate, theme: Theme) -> Self {
        let mut app = Self {
            state: AppState::SignedOut {
                input: TextInput::default(),
            },
            should_quit: false,
            current_tab: Tab::default(),
            show_help: false,
            quit_confirm: None,
            token: None,
            form: RecordForm::new(today),
            filter: StatsFilter::default(),
            status: None,
            submitting: false,
            pending: None,
            theme,
        };
        if let Some(token) = token {
            app.signed_in(token);
        }
        app
    }

    /// Token accepted: start loading
    pub fn signed_in(&mut self, token: String) {
        self.token = Some(token);
        self.state = AppState::Loading {
            spinner_frame: 0,
            stage: LoadingStage::Catalog,
        };
        self.pending = Some(PendingAction::Reload);
    }

    /// Token removed: back to the sign-in screen
    pub fn signed_out(&mut self) {
        self.token = None;
        self.state = AppState::SignedOut {
            input: TextInput::default(),
        };
        self.status = Some(StatusMessage::info("Session supprimée."));
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn take_pending(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }

    /// Show an error; transport detail goes to the log only
    pub fn report_error(&mut self, err: &PrestaError) {
        if let PrestaError::Transport(detail) = err {
            tracing::error!(%detail, "request failed");
        }
        self.status = Some(StatusMessage::error(err.user_message()));
    }

    pub fn set_stage(&mut self, new_stage: LoadingStage) {
        if let AppState::Loading { stage, .. } = &mut self.state {
            *stage = new_stage;
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, AppState::Loading { .. })
    }

    /// Apply the background load result
    pub fn apply_load(&mut self, result: Result<LoadedData, String>) {
        match result {
            Ok(loaded) => {
                let (transactions, history_error) = match loaded.transactions {
                    Ok(transactions) => (transactions, None),
                    Err(message) => (Vec::new(), Some(message)),
                };
                if let Some(warning) = &loaded.catalog.warning {
                    self.status = Some(StatusMessage::error(warning.message()));
                }
                self.form.catalog_cursor = 0;
                self.state = AppState::Ready {
                    data: Box::new(AppData {
                        register: Register::new(loaded.catalog.entries),
                        transactions,
                        report: StatsReport::from_service_stats(&Default::default()),
                        history_error,
                        catalog_warning: loaded.catalog.warning,
                    }),
                };
                self.recompute_stats();
            }
            Err(message) => self.state = AppState::Error { message },
        }
    }

    /// Re-run the aggregation for the current filter
    fn recompute_stats(&mut self) {
        let AppState::Ready { data } = &mut self.state else {
            return;
        };
        match self.filter.range() {
            Ok(range) => {
                let stats = Aggregator::for_range(&data.transactions, &range);
                data.report = StatsReport::from_service_stats(&stats);
                self.filter.scroll = 0;
            }
            Err(e) => self.status = Some(StatusMessage::error(e.user_message())),
        }
    }

    /// Submit the pending transaction. The submitting flag is cleared on
    /// every outcome.
    pub fn perform_submit(&mut self, gateway: &dyn Gateway) {
        self.submitting = false;
        let AppState::Ready { data } = &mut self.state else {
            return;
        };

        let date = match self.form.parse_date() {
            Ok(date) => date,
            Err(e) => {
                self.status = Some(StatusMessage::error(e.user_message()));
                return;
            }
        };

        match data.register.submit(
            gateway,
            self.token.as_deref(),
            date,
            self.form.invoice.value(),
        ) {
            Ok(submission) => {
                self.status = Some(StatusMessage::success(format!(
                    "Transaction enregistrée : {} prestation(s), {}.",
                    submission.prestations.len(),
                    submission.total()
                )));
                self.form.reset(Local::now().date_naive());
                self.pending = Some(PendingAction::RefreshHistory);
            }
            Err(e) => self.report_error(&e),
        }
    }

    /// Fetch the history again and re-aggregate
    pub fn refresh_history(&mut self, gateway: &dyn Gateway) {
        let Some(token) = self.token.clone() else {
            self.report_error(&PrestaError::not_signed_in());
            return;
        };
        let AppState::Ready { data } = &mut self.state else {
            return;
        };
        match gateway.list_transactions(&token) {
            Ok(transactions) => {
                data.transactions = transactions;
                data.history_error = None;
                self.recompute_stats();
            }
            Err(e) => {
                data.history_error = Some(e.user_message());
                self.report_error(&e);
            }
        }
    }

    /// Handle keyboard events
    pub fn handle_event(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.quit_confirm.is_some() {
            self.handle_quit_confirm_key(key.code);
            return;
        }
        if self.show_help {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.show_help = false;
            }
            return;
        }
        // Ignore input while a submission is in flight
        if self.submitting {
            return;
        }

        match &mut self.state {
            AppState::SignedOut { input } => match key.code {
                KeyCode::Enter if !input.is_blank() => {
                    self.pending = Some(PendingAction::Login(input.value().trim().to_string()));
                }
                KeyCode::Esc => self.should_quit = true,
                KeyCode::Backspace => input.backspace(),
                KeyCode::Char(c) => input.push(c),
                _ => {}
            },
            AppState::Loading { .. } => {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    self.should_quit = true;
                }
            }
            AppState::Error { .. } => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                KeyCode::Char('r') => {
                    if let Some(token) = self.token.clone() {
                        self.signed_in(token);
                    }
                }
                KeyCode::Char('o') => self.pending = Some(PendingAction::Logout),
                _ => {}
            },
            AppState::Ready { .. } => self.handle_ready_key(key),
        }
    }

    fn handle_quit_confirm_key(&mut self, code: KeyCode) {
        let Some(confirm) = &mut self.quit_confirm else {
            return;
        };
        match code {
            KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('l') => {
                confirm.toggle()
            }
            KeyCode::Char('y') | KeyCode::Char('o') => self.should_quit = true,
            KeyCode::Char('n') | KeyCode::Esc => self.quit_confirm = None,
            KeyCode::Enter => {
                if confirm.yes_selected {
                    self.should_quit = true;
                } else {
                    self.quit_confirm = None;
                }
            }
            _ => {}
        }
    }

    fn handle_ready_key(&mut self, key: KeyEvent) {
        if self.form.editing.is_some() || self.filter.editing.is_some() {
            self.handle_input_key(key.code);
            return;
        }
        self.status = None;

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.request_quit(),
            KeyCode::Tab => self.current_tab = self.current_tab.next(),
            KeyCode::BackTab => self.current_tab = self.current_tab.prev(),
            KeyCode::Char(c @ '1'..='2') => {
                if let Some(tab) = Tab::from_number(c as u8 - b'0') {
                    self.current_tab = tab;
                }
            }
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('o') => self.pending = Some(PendingAction::Logout),
            _ => match self.current_tab {
                Tab::Record => self.handle_record_key(key.code),
                Tab::Stats => self.handle_stats_key(key.code),
            },
        }
    }

    /// Keys typed into the focused text field
    fn handle_input_key(&mut self, code: KeyCode) {
        let input = match (self.form.editing, self.filter.editing) {
            (Some(field), _) => self.form.input_mut(field),
            (None, Some(field)) => self.filter.input_mut(field),
            (None, None) => return,
        };
        match code {
            KeyCode::Char(c) => input.push(c),
            KeyCode::Backspace => input.backspace(),
            KeyCode::Esc => {
                self.form.editing = None;
                self.filter.editing = None;
            }
            KeyCode::Enter => {
                self.form.editing = None;
                if self.filter.editing.take().is_some() {
                    self.recompute_stats();
                }
            }
            _ => {}
        }
    }

    fn handle_record_key(&mut self, code: KeyCode) {
        let AppState::Ready { data } = &mut self.state else {
            return;
        };
        let catalog_len = data.register.catalog().len();
        let selected_len = data.register.selected().len();

        match code {
            KeyCode::Up | KeyCode::Char('k') => self.form.move_catalog(-1, catalog_len),
            KeyCode::Down | KeyCode::Char('j') => self.form.move_catalog(1, catalog_len),
            KeyCode::Char('K') => self.form.move_selected(-1, selected_len),
            KeyCode::Char('J') => self.form.move_selected(1, selected_len),
            KeyCode::Char('m') => self.form.cycle_method(),
            KeyCode::Char('p') => self.form.editing = Some(RecordField::Price),
            KeyCode::Char('i') => self.form.editing = Some(RecordField::Invoice),
            KeyCode::Char('d') => self.form.editing = Some(RecordField::Date),
            KeyCode::Enter | KeyCode::Char('a') => {
                let name = data
                    .register
                    .catalog()
                    .get(self.form.catalog_cursor)
                    .map(|entry| entry.name.clone());
                match data
                    .register
                    .add(name.as_deref(), self.form.method, self.form.price.value())
                {
                    Ok(draft) => {
                        self.status = Some(StatusMessage::success(format!(
                            "{} ajouté ({}, {}).",
                            draft.name, draft.payment_method, draft.actual_earning
                        )));
                        self.form.price.clear();
                        self.form.selected_cursor = data.register.selected().len() - 1;
                    }
                    Err(e) => self.status = Some(StatusMessage::error(e.user_message())),
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(draft) = data.register.remove(self.form.selected_cursor) {
                    self.status = Some(StatusMessage::info(format!("{} retiré.", draft.name)));
                }
                self.form.clamp_selected(data.register.selected().len());
            }
            KeyCode::Char('c') => {
                data.register.clear();
                self.form.selected_cursor = 0;
            }
            KeyCode::Char('s') => {
                if data.register.is_empty() {
                    self.status = Some(StatusMessage::error(
                        crate::services::register::EMPTY_TRANSACTION,
                    ));
                } else {
                    self.submitting = true;
                    self.status = Some(StatusMessage::info("Envoi en cours..."));
                    self.pending = Some(PendingAction::Submit);
                }
            }
            _ => {}
        }
    }

    fn handle_stats_key(&mut self, code: KeyCode) {
        let max_scroll = match &self.state {
            AppState::Ready { data } => StatsView::max_scroll(&data.report),
            _ => return,
        };
        match code {
            KeyCode::Char('f') => self.filter.editing = Some(FilterField::From),
            KeyCode::Char('t') => self.filter.editing = Some(FilterField::To),
            KeyCode::Enter => self.recompute_stats(),
            KeyCode::Char('x') => {
                self.filter.clear();
                self.recompute_stats();
            }
            KeyCode::Char('r') => {
                self.status = Some(StatusMessage::info("Actualisation..."));
                self.pending = Some(PendingAction::RefreshHistory);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.filter.scroll = self.filter.scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.filter.scroll = (self.filter.scroll + 1).min(max_scroll);
            }
            _ => {}
        }
    }

    /// Quit, asking first when prestations would be lost
    fn request_quit(&mut self) {
        match &self.state {
            AppState::Ready { data } if !data.register.is_empty() => {
                self.quit_confirm = Some(QuitConfirmState::default());
            }
            _ => self.should_quit = true,
        }
    }

    /// Update spinner animation
    pub fn tick(&mut self) {
        if let AppState::Loading { spinner_frame, .. } = &mut self.state {
            *spinner_frame = Spinner::next_frame(*spinner_frame);
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Draw the application
    pub fn draw(&self, frame: &mut Frame) {
        frame.render_widget(self, frame.area());
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match &self.state {
            AppState::SignedOut { input } => {
                LoginView::new(input, self.theme)
                    .with_status(self.status.as_ref())
                    .render(area, buf);
            }
            AppState::Loading {
                spinner_frame,
                stage,
            } => {
                Spinner::new(*spinner_frame, *stage, self.theme).render(area, buf);
            }
            AppState::Ready { data } => {
                match self.current_tab {
                    Tab::Record => RecordView::new(&data.register, &self.form, self.theme)
                        .with_status(self.status.as_ref())
                        .with_catalog_warning(data.catalog_warning.as_ref())
                        .render(area, buf),
                    Tab::Stats => StatsView::new(&data.report, &self.filter, self.theme)
                        .with_status(self.status.as_ref())
                        .with_history_error(data.history_error.as_deref())
                        .render(area, buf),
                }

                if self.show_help {
                    HelpPopup::new(self.theme).render(HelpPopup::centered_area(area), buf);
                }
                if let Some(confirm) = &self.quit_confirm {
                    QuitConfirmPopup::new(confirm, data.register.selected().len(), self.theme)
                        .render(QuitConfirmPopup::centered_area(area), buf);
                }
            }
            AppState::Error { message } => {
                let y = area.y + area.height / 2;
                let text = format!("Erreur : {}", message);
                let x = area.x + (area.width.saturating_sub(text.chars().count() as u16)) / 2;
                buf.set_string(x, y, &text, Style::default().fg(self.theme.error()));

                let hint = "r : réessayer   o : se déconnecter   q : quitter";
                let x = area.x + (area.width.saturating_sub(hint.chars().count() as u16)) / 2;
                buf.set_string(x, y + 2, hint, Style::default().fg(self.theme.muted()));
            }
        }
    }
}

/// Run the TUI application
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    match crate::logging::default_log_path() {
        Ok(path) => {
            if let Err(e) = crate::logging::init_file(&path) {
                eprintln!("[prestatrack] Warning: file logging disabled: {}", e);
            }
        }
        Err(e) => eprintln!("[prestatrack] Warning: file logging disabled: {}", e),
    }

    let session = SessionStore::new()?;
    let gateway = Arc::new(HttpGateway::new(config)?);
    // Detect before raw mode
    let theme = Theme::detect();

    let app = App::new(session.get_token(), Local::now().date_naive(), theme);
    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, app, &session, gateway);
    ratatui::restore();
    result
}

/// Load catalog then history (extracted for the background thread)
fn load_data_sync(
    gateway: &dyn Gateway,
    catalog: &CatalogService,
    token: &str,
    progress: impl Fn(LoadingStage),
) -> Result<LoadedData, String> {
    progress(LoadingStage::Catalog);
    let catalog = catalog.load(gateway, false).map_err(|e| {
        tracing::error!(error = %e, "catalog load failed");
        e.user_message()
    })?;

    progress(LoadingStage::History);
    let transactions = gateway.list_transactions(token).map_err(|e| {
        tracing::warn!(error = %e, "history load failed");
        e.user_message()
    });

    Ok(LoadedData {
        catalog,
        transactions,
    })
}

fn spawn_loader(gateway: Arc<HttpGateway>, token: String) -> Receiver<LoadEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let catalog = CatalogService::new();
        let progress_tx = tx.clone();
        let result = load_data_sync(gateway.as_ref(), &catalog, &token, |stage| {
            let _ = progress_tx.send(LoadEvent::Stage(stage));
        });
        let _ = tx.send(LoadEvent::Done(result));
    });
    rx
}

fn run_app(
    terminal: &mut DefaultTerminal,
    mut app: App,
    session: &SessionStore,
    gateway: Arc<HttpGateway>,
) -> anyhow::Result<()> {
    let mut loader: Option<Receiver<LoadEvent>> = None;

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        if app.should_quit() {
            break;
        }

        // Check for loader progress (non-blocking)
        if let Some(rx) = &loader {
            let events: Vec<LoadEvent> = rx.try_iter().collect();
            for event in events {
                match event {
                    LoadEvent::Stage(stage) => app.set_stage(stage),
                    LoadEvent::Done(result) => app.apply_load(result),
                }
            }
            if !app.is_loading() {
                loader = None;
            }
        }

        if let Some(action) = app.take_pending() {
            match action {
                PendingAction::Login(token) => match session.set_token(&token) {
                    Ok(()) => app.signed_in(token),
                    Err(e) => app.report_error(&e),
                },
                PendingAction::Logout => match session.clear_token() {
                    Ok(()) => app.signed_out(),
                    Err(e) => app.report_error(&e),
                },
                PendingAction::Reload => {
                    if let Some(token) = app.token() {
                        loader = Some(spawn_loader(Arc::clone(&gateway), token.to_string()));
                    }
                }
                PendingAction::Submit => {
                    // Show the submitting status before blocking
                    terminal.draw(|frame| app.draw(frame))?;
                    app.perform_submit(gateway.as_ref());
                }
                PendingAction::RefreshHistory => {
                    terminal.draw(|frame| app.draw(frame))?;
                    app.refresh_history(gateway.as_ref());
                }
            }
            continue;
        }

        // Poll for events with 100ms timeout for spinner animation
        if event::poll(Duration::from_millis(100))? {
            app.handle_event(event::read()?);
        } else {
            app.tick();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CatalogEntry, Money, PaymentMethod, Submission};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Gateway fake that records submissions
    #[derive(Default)]
    struct FakeGateway {
        submitted: RefCell<Vec<Submission>>,
        fail_submit: Option<PrestaError>,
        history: Vec<Transaction>,
    }

    impl Gateway for FakeGateway {
        fn list_catalog(&self) -> crate::types::Result<Vec<CatalogEntry>> {
            Ok(catalog())
        }

        fn submit_transaction(&self, submission: &Submission, _: &str) -> crate::types::Result<()> {
            match &self.fail_submit {
                Some(PrestaError::Backend(msg)) => Err(PrestaError::Backend(msg.clone())),
                Some(_) => Err(PrestaError::Transport("connection reset".into())),
                None => {
                    self.submitted.borrow_mut().push(submission.clone());
                    Ok(())
                }
            }
        }

        fn list_transactions(&self, _: &str) -> crate::types::Result<Vec<Transaction>> {
            Ok(self.history.clone())
        }
    }

    fn catalog() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry {
                name: "Coupe".into(),
                earning: Money::from_cents(3000),
                cost: Money::from_cents(1000),
            },
            CatalogEntry {
                name: "Couleur".into(),
                earning: Money::from_cents(5500),
                cost: Money::from_cents(2000),
            },
        ]
    }

    fn history() -> Vec<Transaction> {
        let at = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_hms_opt(10, 0, 0);
        vec![
            Transaction {
                date: at(5),
                prestation_name: "Coupe".into(),
                actual_earning: Some(Money::from_cents(3000)),
                cost: Some(Money::from_cents(1000)),
                payment_method: PaymentMethod::Cash.into(),
            },
            Transaction {
                date: at(25),
                prestation_name: "Couleur".into(),
                actual_earning: Some(Money::from_cents(5500)),
                cost: Some(Money::from_cents(2000)),
                payment_method: PaymentMethod::Paylib.into(),
            },
        ]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_event(key(code));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn make_ready_app() -> App {
        let mut app = App::new(Some("tok".into()), today(), Theme::Dark);
        assert_eq!(app.take_pending(), Some(PendingAction::Reload));
        app.apply_load(Ok(LoadedData {
            catalog: CatalogLoad {
                entries: catalog(),
                warning: None,
            },
            transactions: Ok(history()),
        }));
        app
    }

    fn data(app: &App) -> &AppData {
        match &app.state {
            AppState::Ready { data } => data,
            _ => panic!("app not ready"),
        }
    }

    #[test]
    fn test_app_starts_signed_out_without_token() {
        let app = App::new(None, today(), Theme::Dark);
        assert!(matches!(app.state, AppState::SignedOut { .. }));
        assert!(app.pending.is_none());
    }

    #[test]
    fn test_app_starts_loading_with_token() {
        let app = App::new(Some("tok".into()), today(), Theme::Dark);
        assert!(app.is_loading());
        assert_eq!(app.token(), Some("tok"));
    }

    #[test]
    fn test_login_input_requests_login() {
        let mut app = App::new(None, today(), Theme::Dark);
        press(&mut app, KeyCode::Enter);
        assert!(app.take_pending().is_none());

        type_text(&mut app, " abc ");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.take_pending(), Some(PendingAction::Login("abc".into())));
    }

    #[test]
    fn test_app_quit_on_q() {
        let mut app = make_ready_app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit());
    }

    #[test]
    fn test_ctrl_c_always_quits() {
        let mut app = make_ready_app();
        press(&mut app, KeyCode::Char('p'));
        app.handle_event(Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(app.should_quit());
    }

    #[test]
    fn test_app_tick_updates_spinner() {
        let mut app = App::new(Some("tok".into()), today(), Theme::Dark);
        app.tick();
        assert!(matches!(
            app.state,
            AppState::Loading {
                spinner_frame: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_loader_stage_updates() {
        let mut app = App::new(Some("tok".into()), today(), Theme::Dark);
        app.set_stage(LoadingStage::History);
        assert!(matches!(
            app.state,
            AppState::Loading {
                stage: LoadingStage::History,
                ..
            }
        ));
    }

    #[test]
    fn test_catalog_failure_shows_error_and_retry() {
        let mut app = App::new(Some("tok".into()), today(), Theme::Dark);
        app.take_pending();
        app.apply_load(Err("Le serveur a refusé la requête.".into()));
        assert!(matches!(app.state, AppState::Error { .. }));

        press(&mut app, KeyCode::Char('r'));
        assert!(app.is_loading());
        assert_eq!(app.take_pending(), Some(PendingAction::Reload));
    }

    #[test]
    fn test_history_failure_keeps_record_tab() {
        let mut app = App::new(Some("tok".into()), today(), Theme::Dark);
        app.apply_load(Ok(LoadedData {
            catalog: CatalogLoad {
                entries: catalog(),
                warning: Some(CacheWarning::Stale("Catalogue hors ligne".into())),
            },
            transactions: Err("erreur".into()),
        }));
        let data = data(&app);
        assert_eq!(data.register.catalog().len(), 2);
        assert_eq!(data.history_error.as_deref(), Some("erreur"));
        assert!(app.status.is_some());
    }

    #[test]
    fn test_tab_navigation() {
        let mut app = make_ready_app();
        assert_eq!(app.current_tab, Tab::Record);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_tab, Tab::Stats);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.current_tab, Tab::Record);
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.current_tab, Tab::Stats);
        press(&mut app, KeyCode::Char('1'));
        assert_eq!(app.current_tab, Tab::Record);
    }

    #[test]
    fn test_help_toggle() {
        let mut app = make_ready_app();
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit());
        press(&mut app, KeyCode::Char('?'));
        assert!(!app.show_help);
    }

    #[test]
    fn test_add_requires_payment_method() {
        let mut app = make_ready_app();
        press(&mut app, KeyCode::Char('a'));
        assert!(data(&app).register.is_empty());
        assert_eq!(
            app.status.as_ref().map(|s| s.text.as_str()),
            Some("Veuillez sélectionner un mode de règlement.")
        );
    }

    #[test]
    fn test_add_with_custom_price() {
        let mut app = make_ready_app();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('m'));
        press(&mut app, KeyCode::Char('p'));
        type_text(&mut app, "49.90");
        press(&mut app, KeyCode::Enter);
        assert!(app.form.editing.is_none());
        press(&mut app, KeyCode::Char('a'));

        let selected = data(&app).register.selected();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "Couleur");
        assert_eq!(selected[0].payment_method, PaymentMethod::Cash);
        assert_eq!(selected[0].actual_earning, Money::from_cents(4990));
        assert!(app.form.price.is_blank());
    }

    #[test]
    fn test_keys_typed_into_field_are_not_commands() {
        let mut app = make_ready_app();
        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "q2s");
        assert!(!app.should_quit());
        assert_eq!(app.current_tab, Tab::Record);
        assert_eq!(app.form.invoice.value(), "q2s");
        assert!(app.pending.is_none());
    }

    #[test]
    fn test_remove_selected() {
        let mut app = make_ready_app();
        press(&mut app, KeyCode::Char('m'));
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(data(&app).register.selected().len(), 2);
        assert_eq!(app.form.selected_cursor, 1);

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(data(&app).register.selected().len(), 1);
        assert_eq!(app.form.selected_cursor, 0);
    }

    #[test]
    fn test_submit_empty_is_rejected_without_request() {
        let mut app = make_ready_app();
        press(&mut app, KeyCode::Char('s'));
        assert!(app.pending.is_none());
        assert!(!app.submitting);
    }

    #[test]
    fn test_submit_success_clears_and_refreshes() {
        let mut app = make_ready_app();
        press(&mut app, KeyCode::Char('m'));
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('s'));
        assert!(app.submitting);
        assert_eq!(app.take_pending(), Some(PendingAction::Submit));

        // Keys are ignored while submitting
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(data(&app).register.selected().len(), 1);

        let gw = FakeGateway::default();
        app.perform_submit(&gw);
        assert!(!app.submitting);
        assert!(data(&app).register.is_empty());
        assert_eq!(gw.submitted.borrow().len(), 1);
        assert_eq!(gw.submitted.borrow()[0].date, today());
        assert_eq!(app.take_pending(), Some(PendingAction::RefreshHistory));
    }

    #[test]
    fn test_submit_success_resets_form() {
        let mut app = make_ready_app();
        press(&mut app, KeyCode::Char('m'));
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "F-42");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('s'));
        app.take_pending();

        let gw = FakeGateway::default();
        app.perform_submit(&gw);
        assert_eq!(gw.submitted.borrow()[0].invoice_number, "F-42");
        assert!(app.form.method.is_none());
        assert!(app.form.invoice.is_blank());
        assert_eq!(
            app.form.date.value(),
            Local::now().date_naive().format("%Y-%m-%d").to_string()
        );
    }

    #[test]
    fn test_submit_failure_keeps_selection() {
        let mut app = make_ready_app();
        press(&mut app, KeyCode::Char('m'));
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('s'));
        app.take_pending();

        let gw = FakeGateway {
            fail_submit: Some(PrestaError::Transport(String::new())),
            ..Default::default()
        };
        app.perform_submit(&gw);
        assert!(!app.submitting);
        assert_eq!(data(&app).register.selected().len(), 1);
        assert_eq!(
            app.status.as_ref().map(|s| s.text.as_str()),
            Some(crate::types::TRANSPORT_USER_MESSAGE)
        );
        assert!(app.pending.is_none());
    }

    #[test]
    fn test_submit_invalid_date_resets_flag() {
        let mut app = make_ready_app();
        press(&mut app, KeyCode::Char('m'));
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('d'));
        type_text(&mut app, "x");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('s'));
        app.take_pending();

        let gw = FakeGateway::default();
        app.perform_submit(&gw);
        assert!(!app.submitting);
        assert!(gw.submitted.borrow().is_empty());
        assert!(app.status.as_ref().unwrap().text.starts_with("Date invalide"));
    }

    #[test]
    fn test_stats_filter_recompute() {
        let mut app = make_ready_app();
        assert_eq!(data(&app).report.rows.len(), 2);

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('f'));
        type_text(&mut app, "2024-01-20");
        press(&mut app, KeyCode::Enter);

        let report = &data(&app).report;
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].name, "Couleur");

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(data(&app).report.rows.len(), 2);
    }

    #[test]
    fn test_stats_invalid_filter_keeps_report() {
        let mut app = make_ready_app();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('t'));
        type_text(&mut app, "demain");
        press(&mut app, KeyCode::Enter);

        assert_eq!(data(&app).report.rows.len(), 2);
        assert!(app.status.as_ref().unwrap().text.contains("demain"));
    }

    #[test]
    fn test_refresh_history() {
        let mut app = make_ready_app();
        let gw = FakeGateway {
            history: history()[..1].to_vec(),
            ..Default::default()
        };
        app.refresh_history(&gw);
        assert_eq!(data(&app).report.rows.len(), 1);
        assert_eq!(data(&app).report.total.count, 1);
    }

    #[test]
    fn test_quit_with_pending_selection_asks_first() {
        let mut app = make_ready_app();
        press(&mut app, KeyCode::Char('m'));
        press(&mut app, KeyCode::Char('a'));

        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit());
        assert!(app.quit_confirm.is_some());

        // Default answer is no
        press(&mut app, KeyCode::Enter);
        assert!(app.quit_confirm.is_none());
        assert!(!app.should_quit());

        press(&mut app, KeyCode::Char('q'));
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Enter);
        assert!(app.should_quit());
    }

    #[test]
    fn test_logout_key() {
        let mut app = make_ready_app();
        press(&mut app, KeyCode::Char('o'));
        assert_eq!(app.take_pending(), Some(PendingAction::Logout));
        app.signed_out();
        assert!(matches!(app.state, AppState::SignedOut { .. }));
        assert!(app.token().is_none());
    }

    #[test]
    fn test_load_data_sync_reports_stages() {
        let gw = FakeGateway {
            history: history(),
            ..Default::default()
        };
        let temp = tempfile::TempDir::new().unwrap();
        let catalog = CatalogService::with_cache_path(temp.path().join("catalog.json"));
        let stages = RefCell::new(Vec::new());

        let loaded = load_data_sync(&gw, &catalog, "tok", |s| stages.borrow_mut().push(s)).unwrap();
        assert_eq!(loaded.catalog.entries.len(), 2);
        assert_eq!(loaded.transactions.unwrap().len(), 2);
        assert_eq!(
            *stages.borrow(),
            vec![LoadingStage::Catalog, LoadingStage::History]
        );
    }

    #[test]
    fn test_render_ready_app() {
        let app = make_ready_app();
        let area = Rect::new(0, 0, 100, 24);
        let mut buf = Buffer::empty(area);
        (&app).render(area, &mut buf);
        let text = crate::tui::widgets::status::buffer_text(&buf);
        assert!(text.contains("[Saisie]"));
        assert!(text.contains("Coupe"));
    }

    #[test]
    fn test_empty_report_on_start() {
        let report = StatsReport::from_service_stats(&HashMap::new());
        assert!(report.is_empty());
    }
}
