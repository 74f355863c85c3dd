use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::KeyEvent;

use crate::api::Client;
use crate::api::models::{
    RegisterProfile, Role, StudentStats, Submission, TestStats, TestSummary, UserProfile,
};
use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::session::attempt::{Question, QuestionKind};
use crate::session::controller::{IdHints, Submitted, TestSessionController};
use crate::session::probe::QuestionProbe;
use crate::ui::line_input::{InputResult, LineInput};
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Auth,
    Dashboard,
    Test,
    Result,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthField {
    Email,
    FirstName,
    LastName,
    Password,
    Password2,
    Role,
}

impl AuthField {
    pub fn label(self) -> &'static str {
        match self {
            AuthField::Email => "Email",
            AuthField::FirstName => "First name",
            AuthField::LastName => "Last name",
            AuthField::Password => "Password",
            AuthField::Password2 => "Confirm password",
            AuthField::Role => "Role",
        }
    }
}

const LOGIN_FIELDS: &[AuthField] = &[AuthField::Email, AuthField::Password];
const REGISTER_FIELDS: &[AuthField] = &[
    AuthField::Email,
    AuthField::FirstName,
    AuthField::LastName,
    AuthField::Password,
    AuthField::Password2,
    AuthField::Role,
];

pub struct AuthForm {
    pub mode: AuthMode,
    pub focus: usize,
    pub email: LineInput,
    pub first_name: LineInput,
    pub last_name: LineInput,
    pub password: LineInput,
    pub password2: LineInput,
    pub role: Role,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            mode: AuthMode::Login,
            focus: 0,
            email: LineInput::default(),
            first_name: LineInput::default(),
            last_name: LineInput::default(),
            password: LineInput::masked(),
            password2: LineInput::masked(),
            role: Role::Student,
        }
    }
}

impl AuthForm {
    pub fn fields(&self) -> &'static [AuthField] {
        match self.mode {
            AuthMode::Login => LOGIN_FIELDS,
            AuthMode::Register => REGISTER_FIELDS,
        }
    }

    pub fn focused(&self) -> AuthField {
        let fields = self.fields();
        fields[self.focus.min(fields.len() - 1)]
    }

    pub fn input(&self, field: AuthField) -> Option<&LineInput> {
        match field {
            AuthField::Email => Some(&self.email),
            AuthField::FirstName => Some(&self.first_name),
            AuthField::LastName => Some(&self.last_name),
            AuthField::Password => Some(&self.password),
            AuthField::Password2 => Some(&self.password2),
            AuthField::Role => None,
        }
    }

    fn input_mut(&mut self, field: AuthField) -> Option<&mut LineInput> {
        match field {
            AuthField::Email => Some(&mut self.email),
            AuthField::FirstName => Some(&mut self.first_name),
            AuthField::LastName => Some(&mut self.last_name),
            AuthField::Password => Some(&mut self.password),
            AuthField::Password2 => Some(&mut self.password2),
            AuthField::Role => None,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields().len();
    }

    pub fn focus_prev(&mut self) {
        let len = self.fields().len();
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.focus = 0;
        self.clear_secrets();
    }

    pub fn cycle_role(&mut self, forward: bool) {
        let idx = Role::ALL.iter().position(|r| *r == self.role).unwrap_or(0);
        let len = Role::ALL.len();
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        self.role = Role::ALL[next];
    }

    /// Feed a key to the focused field.
    pub fn handle_key(&mut self, key: KeyEvent) -> InputResult {
        let field = self.focused();
        match self.input_mut(field) {
            Some(input) => input.handle(key),
            None => {
                use crossterm::event::KeyCode;
                match key.code {
                    KeyCode::Left | KeyCode::Char('h') => self.cycle_role(false),
                    KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => {
                        self.cycle_role(true)
                    }
                    KeyCode::Enter => return InputResult::Submit,
                    KeyCode::Esc => return InputResult::Cancel,
                    KeyCode::Tab | KeyCode::Down => return InputResult::Next,
                    KeyCode::BackTab | KeyCode::Up => return InputResult::Prev,
                    _ => {}
                }
                InputResult::Continue
            }
        }
    }

    pub fn profile(&self) -> RegisterProfile {
        RegisterProfile {
            email: self.email.value().trim().to_string(),
            password: self.password.value().to_string(),
            password2: self.password2.value().to_string(),
            first_name: self.first_name.value().trim().to_string(),
            last_name: self.last_name.value().trim().to_string(),
            role: self.role,
        }
    }

    pub fn clear_secrets(&mut self) {
        self.password.clear();
        self.password2.clear();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DashboardTab {
    Tests,
    Submissions,
    Stats,
}

impl DashboardTab {
    pub const ALL: [DashboardTab; 3] = [
        DashboardTab::Tests,
        DashboardTab::Submissions,
        DashboardTab::Stats,
    ];

    pub fn title(self) -> &'static str {
        match self {
            DashboardTab::Tests => "Tests",
            DashboardTab::Submissions => "Submissions",
            DashboardTab::Stats => "Stats",
        }
    }

    pub fn index(self) -> usize {
        match self {
            DashboardTab::Tests => 0,
            DashboardTab::Submissions => 1,
            DashboardTab::Stats => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Cursor and modal state of the test screen. Answers themselves live in the
/// controller's answer sheet.
#[derive(Default)]
pub struct TestView {
    pub selected: usize,
    pub choice_cursor: usize,
    pub editing: Option<LineInput>,
    pub confirm_leave: bool,
    pub confirm_submit: bool,
    pub hints: IdHints,
}

impl TestView {
    fn for_test(test_id: i64) -> Self {
        Self {
            hints: IdHints {
                submit_control: Some(test_id),
                test_view: Some(test_id),
            },
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
    pub shown_at: Instant,
}

pub struct ResultView {
    pub submission: Submission,
    pub timed_out: bool,
}

pub struct App {
    pub screen: AppScreen,
    pub config: Config,
    pub theme: &'static Theme,
    pub client: Client,
    pub controller: TestSessionController,
    pub user: Option<UserProfile>,
    pub auth_form: AuthForm,
    pub tab: DashboardTab,
    pub tests: Vec<TestSummary>,
    pub test_selected: usize,
    pub submissions: Vec<Submission>,
    pub submission_selected: usize,
    pub student_stats: Option<StudentStats>,
    pub test_stats: Option<TestStats>,
    pub test_view: TestView,
    pub result: Option<ResultView>,
    pub notice: Option<Notice>,
    /// Test id of an attempt left by an earlier run, waiting for resume or discard.
    pub pending_resume: Option<i64>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        config: Config,
        theme: &'static Theme,
        client: Client,
        controller: TestSessionController,
    ) -> Self {
        Self {
            screen: AppScreen::Auth,
            config,
            theme,
            client,
            controller,
            user: None,
            auth_form: AuthForm::default(),
            tab: DashboardTab::Tests,
            tests: Vec::new(),
            test_selected: 0,
            submissions: Vec::new(),
            submission_selected: 0,
            student_stats: None,
            test_stats: None,
            test_view: TestView::default(),
            result: None,
            notice: None,
            pending_resume: None,
            should_quit: false,
        }
    }

    /// Skip the login screen when stored tokens still work.
    pub fn init(&mut self) {
        if self.client.auth().is_authenticated() {
            self.enter_dashboard();
        } else {
            self.screen = AppScreen::Auth;
        }
    }

    pub fn notify(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notice = Some(Notice {
            message: message.into(),
            kind,
            shown_at: Instant::now(),
        });
    }

    pub fn expire_notice(&mut self, now: Instant) {
        let ttl = Duration::from_secs(self.config.notice_secs);
        if self
            .notice
            .as_ref()
            .is_some_and(|n| now.duration_since(n.shown_at) >= ttl)
        {
            self.notice = None;
        }
    }

    /// Turn a failed operation into a notice. An expired session also drops
    /// the user back to the login screen.
    pub fn handle_error(&mut self, err: ClientError) {
        tracing::warn!(error = %err, screen = ?self.screen, "operation failed");
        if err.is_session_expired() {
            self.controller.suspend();
            self.user = None;
            self.auth_form = AuthForm::default();
            self.screen = AppScreen::Auth;
        }
        self.notify(NoticeKind::Error, err.to_string());
    }

    pub fn can_author(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role.can_author())
    }

    // --- auth ---

    pub fn submit_auth_form(&mut self) {
        match self.auth_form.mode {
            AuthMode::Login => self.login(),
            AuthMode::Register => self.register(),
        }
    }

    pub fn login(&mut self) {
        let email = self.auth_form.email.value().trim().to_string();
        let password = self.auth_form.password.value().to_string();
        match self.client.auth_mut().login(&email, &password) {
            Ok(_) => {
                self.auth_form.clear_secrets();
                self.notify(NoticeKind::Success, "Login successful");
                self.enter_dashboard();
            }
            Err(err) => self.handle_error(err),
        }
    }

    pub fn register(&mut self) {
        let profile = self.auth_form.profile();
        match self.client.auth().register(&profile) {
            Ok(()) => {
                self.auth_form.toggle_mode();
                self.notify(NoticeKind::Success, "Registration successful. Please login.");
            }
            Err(err) => self.handle_error(err),
        }
    }

    pub fn logout(&mut self) {
        self.controller.abandon();
        self.client.auth_mut().logout();
        self.user = None;
        self.tests.clear();
        self.submissions.clear();
        self.student_stats = None;
        self.test_stats = None;
        self.result = None;
        self.pending_resume = None;
        self.auth_form = AuthForm::default();
        self.screen = AppScreen::Auth;
        self.notify(NoticeKind::Success, "Logged out successfully");
    }

    // --- dashboard ---

    pub fn enter_dashboard(&mut self) {
        match self.client.current_user() {
            Ok(user) => {
                tracing::info!(user_id = user.id, role = user.role.as_str(), "signed in");
                self.user = Some(user);
            }
            Err(err) => {
                self.user = None;
                self.screen = AppScreen::Auth;
                self.handle_error(err);
                return;
            }
        }

        self.screen = AppScreen::Dashboard;
        self.tab = DashboardTab::Tests;
        self.refresh_tests();

        self.pending_resume = self.controller.stored_test_id();
        if let Some(test_id) = self.pending_resume {
            self.notify(
                NoticeKind::Warning,
                format!("Unfinished attempt at test {test_id} found. [r] Resume  [x] Discard"),
            );
        }
    }

    pub fn select_tab(&mut self, tab: DashboardTab) {
        self.tab = tab;
        match tab {
            DashboardTab::Tests => self.refresh_tests(),
            DashboardTab::Submissions => self.refresh_submissions(),
            DashboardTab::Stats => self.refresh_stats(),
        }
    }

    pub fn refresh_tests(&mut self) {
        match self.client.list_tests() {
            Ok(tests) => {
                self.tests = tests;
                self.test_selected = self.test_selected.min(self.tests.len().saturating_sub(1));
            }
            Err(err) => self.handle_error(err),
        }
    }

    pub fn refresh_submissions(&mut self) {
        match self.client.list_submissions() {
            Ok(submissions) => {
                self.submissions = submissions;
                self.submission_selected = self
                    .submission_selected
                    .min(self.submissions.len().saturating_sub(1));
            }
            Err(err) => self.handle_error(err),
        }
    }

    /// Students see their own stats; authors see stats of the selected test.
    pub fn refresh_stats(&mut self) {
        if self.can_author() {
            self.student_stats = None;
            let Some(test_id) = self.tests.get(self.test_selected).map(|t| t.id) else {
                self.test_stats = None;
                return;
            };
            match self.client.test_stats(test_id) {
                Ok(stats) => self.test_stats = Some(stats),
                Err(err) => self.handle_error(err),
            }
        } else {
            self.test_stats = None;
            match self.client.student_stats() {
                Ok(stats) => self.student_stats = Some(stats),
                Err(err) => self.handle_error(err),
            }
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        let (selected, len) = match self.tab {
            DashboardTab::Tests | DashboardTab::Stats => (&mut self.test_selected, self.tests.len()),
            DashboardTab::Submissions => (&mut self.submission_selected, self.submissions.len()),
        };
        *selected = step(*selected, delta, len);
        if self.tab == DashboardTab::Stats && self.can_author() {
            self.refresh_stats();
        }
    }

    pub fn start_selected_test(&mut self) {
        let Some(test_id) = self.tests.get(self.test_selected).map(|t| t.id) else {
            return;
        };
        self.start_test(test_id);
    }

    pub fn start_test(&mut self, test_id: i64) {
        self.notify(NoticeKind::Info, "Loading test...");
        match self.controller.start_test(&mut self.client, test_id) {
            Ok(_) => {
                self.pending_resume = None;
                self.test_view = TestView::for_test(test_id);
                self.screen = AppScreen::Test;
                if let Some(probe) = self.controller.found_by()
                    && probe != QuestionProbe::Primary
                {
                    tracing::info!(test_id, probe = probe.name(), "questions loaded via fallback");
                }
                self.notice = None;
            }
            Err(err) => self.handle_error(err),
        }
    }

    pub fn resume_pending(&mut self) {
        if self.pending_resume.take().is_none() {
            return;
        }
        match self.controller.resume_stored(Utc::now()) {
            Some(resumed) => {
                self.test_view = TestView::for_test(resumed.test_id);
                self.screen = AppScreen::Test;
                self.notice = None;
                if resumed.expired {
                    self.submit_current(true);
                }
            }
            None => {
                self.controller.abandon();
                self.notify(NoticeKind::Warning, "Saved attempt could not be restored");
            }
        }
    }

    pub fn discard_pending(&mut self) {
        if self.pending_resume.take().is_some() {
            self.controller.abandon();
            self.notify(NoticeKind::Info, "Saved attempt discarded");
        }
    }

    pub fn open_selected_submission(&mut self) {
        let Some(submission_id) = self.submissions.get(self.submission_selected).map(|s| s.id)
        else {
            return;
        };
        self.show_result(submission_id, false);
    }

    // --- test screen ---

    pub fn current_question(&self) -> Option<&Question> {
        self.controller
            .attempt()?
            .questions
            .get(self.test_view.selected)
    }

    pub fn move_question(&mut self, delta: isize) {
        self.commit_edit();
        self.controller.save_progress();
        let len = self.controller.sheet().len();
        self.test_view.selected = step(self.test_view.selected, delta, len);
        self.test_view.choice_cursor = 0;
    }

    pub fn move_choice(&mut self, delta: isize) {
        let len = self.current_question().map_or(0, |q| q.choices.len());
        self.test_view.choice_cursor = step(self.test_view.choice_cursor, delta, len);
    }

    /// Toggle the choice at `index` (0-based) of the current question.
    pub fn toggle_choice(&mut self, index: usize) {
        let Some(choice_id) = self
            .current_question()
            .and_then(|q| q.choices.get(index))
            .map(|c| c.id)
        else {
            return;
        };
        self.test_view.choice_cursor = index;
        let selected = self.test_view.selected;
        let changed = self
            .controller
            .sheet_mut()
            .card_mut(selected)
            .is_some_and(|card| card.toggle(choice_id));
        if changed {
            self.controller.save_progress();
        }
    }

    pub fn begin_edit(&mut self) {
        let Some(question) = self.current_question() else {
            return;
        };
        if question.kind != QuestionKind::Text {
            return;
        }
        let current = self
            .controller
            .sheet()
            .cards()
            .get(self.test_view.selected)
            .map(|c| c.text().to_string())
            .unwrap_or_default();
        self.test_view.editing = Some(LineInput::new(&current));
    }

    /// Feed a key to the text answer being edited. Text is written to the
    /// answer sheet on every keystroke.
    pub fn handle_edit_key(&mut self, key: KeyEvent) {
        let Some(input) = self.test_view.editing.as_mut() else {
            return;
        };
        let result = input.handle(key);
        self.commit_edit();
        match result {
            InputResult::Continue => {}
            InputResult::Submit | InputResult::Cancel => self.test_view.editing = None,
            InputResult::Next => {
                self.test_view.editing = None;
                self.move_question(1);
            }
            InputResult::Prev => {
                self.test_view.editing = None;
                self.move_question(-1);
            }
        }
    }

    fn commit_edit(&mut self) {
        let Some(text) = self.test_view.editing.as_ref().map(|i| i.value().to_string()) else {
            return;
        };
        let selected = self.test_view.selected;
        if let Some(card) = self.controller.sheet_mut().card_mut(selected) {
            card.set_text(&text);
        }
    }

    pub fn on_second(&mut self) {
        if self.screen != AppScreen::Test {
            return;
        }
        let hints = self.test_view.hints;
        if let Some(outcome) = self.controller.on_second(&mut self.client, hints) {
            self.handle_submission(outcome, true);
        }
    }

    pub fn submit_current(&mut self, timed_out: bool) {
        self.commit_edit();
        self.test_view.editing = None;
        self.test_view.confirm_submit = false;
        if !timed_out {
            self.notify(NoticeKind::Info, "Submitting test...");
        }
        let hints = self.test_view.hints;
        let outcome = self.controller.submit_test(&mut self.client, timed_out, hints);
        self.handle_submission(outcome, timed_out);
    }

    /// Report the outcome of a submit. A timed-out attempt always tells the
    /// user that time ran out, whether or not the submit went through.
    pub fn handle_submission(&mut self, outcome: ClientResult<Submitted>, timed_out: bool) {
        match outcome {
            Ok(submitted) => {
                if submitted.timed_out {
                    self.notify(NoticeKind::Warning, "Time is up! Your test has been submitted.");
                } else {
                    self.notify(NoticeKind::Success, "Test submitted successfully!");
                }
                self.test_view = TestView::default();
                self.show_result(submitted.submission_id, submitted.timed_out);
            }
            Err(err) if timed_out => {
                let message = format!("Time is up! {err}");
                self.handle_error(err);
                self.notify(NoticeKind::Error, message);
            }
            Err(err) => self.handle_error(err),
        }
    }

    pub fn show_result(&mut self, submission_id: i64, timed_out: bool) {
        match self
            .controller
            .load_submission_result(&mut self.client, submission_id)
        {
            Ok(submission) => {
                self.result = Some(ResultView {
                    submission,
                    timed_out,
                });
                self.screen = AppScreen::Result;
            }
            Err(err) => {
                let session_expired = err.is_session_expired();
                self.handle_error(err);
                if !session_expired {
                    self.screen = AppScreen::Dashboard;
                }
            }
        }
    }

    /// Leave the test screen without submitting.
    pub fn leave_test(&mut self) {
        self.controller.abandon();
        self.test_view = TestView::default();
        self.screen = AppScreen::Dashboard;
        self.refresh_tests();
    }

    pub fn back_to_dashboard(&mut self) {
        self.result = None;
        self.screen = AppScreen::Dashboard;
        let tab = self.tab;
        self.select_tab(tab);
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn auth_form_focus_wraps_per_mode() {
        let mut form = AuthForm::default();
        assert_eq!(form.focused(), AuthField::Email);
        form.focus_next();
        assert_eq!(form.focused(), AuthField::Password);
        form.focus_next();
        assert_eq!(form.focused(), AuthField::Email);

        form.toggle_mode();
        assert_eq!(form.fields().len(), 6);
        form.focus_prev();
        assert_eq!(form.focused(), AuthField::Role);
    }

    #[test]
    fn role_field_cycles_roles() {
        let mut form = AuthForm::default();
        form.toggle_mode();
        form.focus = 5;
        assert_eq!(form.handle_key(key(KeyCode::Right)), InputResult::Continue);
        assert_eq!(form.role, Role::Teacher);
        form.handle_key(key(KeyCode::Left));
        form.handle_key(key(KeyCode::Left));
        assert_eq!(form.role, Role::Admin);
        assert_eq!(form.handle_key(key(KeyCode::Enter)), InputResult::Submit);
    }

    #[test]
    fn profile_trims_names_but_not_passwords() {
        let mut form = AuthForm::default();
        form.toggle_mode();
        for ch in " ann ".chars() {
            form.first_name.handle(key(KeyCode::Char(ch)));
        }
        for ch in " pw ".chars() {
            form.password.handle(key(KeyCode::Char(ch)));
        }
        let profile = form.profile();
        assert_eq!(profile.first_name, "ann");
        assert_eq!(profile.password, " pw ");
    }

    #[test]
    fn toggling_mode_clears_passwords() {
        let mut form = AuthForm::default();
        form.password.handle(key(KeyCode::Char('x')));
        form.toggle_mode();
        assert_eq!(form.password.value(), "");
        assert_eq!(form.mode, AuthMode::Register);
    }

    #[test]
    fn tabs_cycle() {
        assert_eq!(DashboardTab::Tests.next(), DashboardTab::Submissions);
        assert_eq!(DashboardTab::Tests.prev(), DashboardTab::Stats);
        assert_eq!(DashboardTab::Stats.next(), DashboardTab::Tests);
    }

    #[test]
    fn step_clamps() {
        assert_eq!(step(0, -1, 3), 0);
        assert_eq!(step(2, 1, 3), 2);
        assert_eq!(step(1, 1, 3), 2);
        assert_eq!(step(4, 0, 0), 0);
    }
}
