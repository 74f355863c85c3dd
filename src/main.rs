use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Tabs};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use quizdesk::api::Client;
use quizdesk::api::endpoints::Endpoints;
use quizdesk::api::transport::HttpTransport;
use quizdesk::app::{App, AppScreen, DashboardTab};
use quizdesk::auth::AuthManager;
use quizdesk::authoring::{self, TestDraft};
use quizdesk::config::Config;
use quizdesk::event::{AppEvent, EventHandler};
use quizdesk::session::attempt::QuestionKind;
use quizdesk::session::controller::TestSessionController;
use quizdesk::store::json_store::JsonStore;
use quizdesk::ui::components::auth_form::AuthFormView;
use quizdesk::ui::components::confirm_dialog::ConfirmDialog;
use quizdesk::ui::components::countdown::CountdownBadge;
use quizdesk::ui::components::notice_bar::NoticeBar;
use quizdesk::ui::components::progress_bar::ProgressBar;
use quizdesk::ui::components::question_nav::QuestionNav;
use quizdesk::ui::components::question_view::QuestionView;
use quizdesk::ui::components::result_view::ResultPanel;
use quizdesk::ui::components::stats_view::{StudentStatsView, TestStatsView};
use quizdesk::ui::components::submission_list::SubmissionList;
use quizdesk::ui::components::test_list::TestList;
use quizdesk::ui::layout::{AppLayout, centered_rect, pack_hint_lines};
use quizdesk::ui::theme::Theme;

#[derive(Parser)]
#[command(name = "quizdesk", version, about = "Terminal client for online tests")]
struct Cli {
    #[arg(long, help = "API base URL, e.g. http://localhost:8000/api/v1")]
    api_url: Option<String>,

    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "Directory for tokens, saved attempts and logs")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Forget the stored tokens
    Logout,
    /// List available tests
    Tests,
    /// List your submissions
    Submissions,
    /// Show the result of one submission
    Result { id: i64 },
    /// Create a test from a TOML draft (teachers and admins)
    Author { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let first_run = !Config::config_path().exists();
    let mut config = Config::load().context("loading config")?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir.to_string_lossy().to_string();
    }
    config.validate();

    let _guard = init_logging(&config)?;
    tracing::info!(api = %config.api_base_url, "quizdesk starting");
    if first_run && let Err(err) = Config::default().save() {
        tracing::warn!(error = %err, "could not write default config");
    }

    let store = JsonStore::new(&config.data_path()).context("opening data directory")?;
    let transport = HttpTransport::new(Duration::from_secs(config.request_timeout_secs))
        .context("building HTTP client")?;
    let auth = AuthManager::new(
        Box::new(transport),
        Endpoints::new(&config.api_base_url),
        store.clone(),
    );
    let mut client = Client::new(auth);

    if let Some(command) = cli.command {
        return run_command(command, &mut client);
    }

    let loaded_theme = Theme::load(&config.theme).unwrap_or_else(|| {
        tracing::warn!(theme = %config.theme, "theme not found, using default");
        Theme::default()
    });
    let theme: &'static Theme = Box::leak(Box::new(loaded_theme));
    let tick_rate = Duration::from_millis(config.tick_rate_ms);
    let mut app = App::new(config, theme, client, TestSessionController::new(store));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(tick_rate);
    app.init();
    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        tracing::error!(error = ?err, "quizdesk exited with an error");
    }
    result
}

/// Daily-rolling log file under `<data_dir>/logs`. The returned guard must
/// outlive the program or buffered lines are lost.
fn init_logging(config: &Config) -> Result<WorkerGuard> {
    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "quizdesk.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();
    Ok(guard)
}

fn run_command(command: Command, client: &mut Client) -> Result<()> {
    if let Command::Logout = command {
        client.auth_mut().logout();
        println!("Logged out.");
        return Ok(());
    }
    if !client.auth().is_authenticated() {
        bail!("not logged in; start quizdesk without a subcommand to sign in");
    }

    match command {
        Command::Logout => {}
        Command::Tests => {
            let tests = client.list_tests()?;
            if tests.is_empty() {
                println!("No tests available.");
            }
            for test in tests {
                println!(
                    "{:>5}  {}  ({}, {} min, {} questions)",
                    test.id, test.title, test.subject, test.time_limit, test.question_count
                );
            }
        }
        Command::Submissions => {
            let submissions = client.list_submissions()?;
            if submissions.is_empty() {
                println!("No submissions yet.");
            }
            for s in submissions {
                let test = s
                    .test
                    .map_or_else(|| "-".to_string(), |id| id.to_string());
                println!(
                    "{:>5}  test {:<5}  {:<12}  {}",
                    s.id,
                    test,
                    s.status_display(),
                    s.score_display()
                );
            }
        }
        Command::Result { id } => {
            let result = client.submission(id)?;
            println!("Score:  {}", result.score_display());
            println!("Status: {}", result.status_display());
        }
        Command::Author { file } => {
            let user = client.current_user()?;
            if !user.role.can_author() {
                bail!("only teachers and admins can create tests");
            }
            let draft = TestDraft::load(&file)?;
            let test_id = authoring::publish(client, &draft)?;
            println!(
                "Test created successfully! id {test_id}, {} questions",
                draft.questions.len()
            );
        }
    }
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => app.expire_notice(Instant::now()),
            AppEvent::Second => app.on_second(),
            AppEvent::Resize(width, height) => tracing::debug!(width, height, "terminal resized"),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Auth => handle_auth_key(app, key),
        AppScreen::Dashboard => handle_dashboard_key(app, key),
        AppScreen::Test => handle_test_key(app, key),
        AppScreen::Result => handle_result_key(app, key),
    }
}

fn handle_auth_key(app: &mut App, key: KeyEvent) {
    use quizdesk::ui::line_input::InputResult;

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('r') {
        app.auth_form.toggle_mode();
        return;
    }
    match app.auth_form.handle_key(key) {
        InputResult::Continue => {}
        InputResult::Submit => app.submit_auth_form(),
        InputResult::Cancel => app.should_quit = true,
        InputResult::Next => app.auth_form.focus_next(),
        InputResult::Prev => app.auth_form.focus_prev(),
    }
}

fn handle_dashboard_key(app: &mut App, key: KeyEvent) {
    if app.pending_resume.is_some() {
        match key.code {
            KeyCode::Char('r') => return app.resume_pending(),
            KeyCode::Char('x') => return app.discard_pending(),
            _ => {}
        }
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('L') => app.logout(),
        KeyCode::Char('R') => {
            let tab = app.tab;
            app.select_tab(tab);
        }
        KeyCode::Tab => {
            let tab = app.tab.next();
            app.select_tab(tab);
        }
        KeyCode::BackTab => {
            let tab = app.tab.prev();
            app.select_tab(tab);
        }
        KeyCode::Char('1') => app.select_tab(DashboardTab::Tests),
        KeyCode::Char('2') => app.select_tab(DashboardTab::Submissions),
        KeyCode::Char('3') => app.select_tab(DashboardTab::Stats),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Enter => match app.tab {
            DashboardTab::Tests => app.start_selected_test(),
            DashboardTab::Submissions => app.open_selected_submission(),
            DashboardTab::Stats => {}
        },
        _ => {}
    }
}

fn handle_test_key(app: &mut App, key: KeyEvent) {
    if app.test_view.editing.is_some() {
        app.handle_edit_key(key);
        return;
    }

    // Confirmation dialogs take priority
    if app.test_view.confirm_leave {
        match key.code {
            KeyCode::Char('y') => app.leave_test(),
            KeyCode::Char('n') | KeyCode::Esc => app.test_view.confirm_leave = false,
            _ => {}
        }
        return;
    }
    if app.test_view.confirm_submit {
        match key.code {
            KeyCode::Char('y') => app.submit_current(false),
            KeyCode::Char('n') | KeyCode::Esc => app.test_view.confirm_submit = false,
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.test_view.confirm_leave = true,
        KeyCode::Char('s') => app.test_view.confirm_submit = true,
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab | KeyCode::Char('n') => {
            app.move_question(1)
        }
        KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab | KeyCode::Char('p') => {
            app.move_question(-1)
        }
        KeyCode::Down | KeyCode::Char('j') => app.move_choice(1),
        KeyCode::Up | KeyCode::Char('k') => app.move_choice(-1),
        KeyCode::Char(' ') => {
            let cursor = app.test_view.choice_cursor;
            app.toggle_choice(cursor);
        }
        KeyCode::Enter => {
            if app.current_question().is_some_and(|q| q.kind == QuestionKind::Text) {
                app.begin_edit();
            } else {
                let cursor = app.test_view.choice_cursor;
                app.toggle_choice(cursor);
            }
        }
        KeyCode::Char(ch @ '1'..='9') => {
            let index = ch as usize - '1' as usize;
            app.toggle_choice(index);
        }
        _ => {}
    }
}

fn handle_result_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('q') | KeyCode::Esc => app.back_to_dashboard(),
        _ => {}
    }
}

fn footer_hints(app: &App) -> Vec<&'static str> {
    match app.screen {
        AppScreen::Auth => vec![
            "[Enter] Submit",
            "[Tab] Next field",
            "[Ctrl-r] Login/Register",
            "[Esc] Quit",
        ],
        AppScreen::Dashboard => {
            let mut hints = vec!["[Tab/1-3] Switch tab", "[j/k] Select"];
            match app.tab {
                DashboardTab::Tests => hints.push("[Enter] Start test"),
                DashboardTab::Submissions => hints.push("[Enter] View result"),
                DashboardTab::Stats => {}
            }
            if app.pending_resume.is_some() {
                hints.push("[r] Resume attempt");
                hints.push("[x] Discard attempt");
            }
            hints.extend(["[R] Refresh", "[L] Logout", "[q] Quit"]);
            hints
        }
        AppScreen::Test if app.test_view.editing.is_some() => {
            vec!["[Enter/Esc] Done", "[Tab] Next question", "[Ctrl-u] Clear"]
        }
        AppScreen::Test => vec![
            "[h/l] Prev/next question",
            "[j/k] Move",
            "[Space/1-9] Select",
            "[Enter] Select/edit",
            "[s] Submit",
            "[q] Leave",
        ],
        AppScreen::Result => vec!["[Enter] Back to dashboard"],
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    let hints = pack_hint_lines(&footer_hints(app), area.width as usize);
    let layout = AppLayout::new(area, hints.len() as u16, app.screen == AppScreen::Test);

    render_header(frame, app, layout.header);
    frame.render_widget(NoticeBar::new(app.notice.as_ref(), app.theme), layout.notice);

    match app.screen {
        AppScreen::Auth => render_auth(frame, app, layout.main),
        AppScreen::Dashboard => render_dashboard(frame, app, layout.main),
        AppScreen::Test => render_test(frame, app, &layout),
        AppScreen::Result => render_result(frame, app, layout.main),
    }

    let footer_lines: Vec<Line> = hints
        .into_iter()
        .map(|h| Line::from(Span::styled(h, Style::default().fg(colors.muted()))))
        .collect();
    frame.render_widget(Paragraph::new(footer_lines), layout.footer);
}

fn render_header(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let base = Style::default().bg(colors.header_bg());

    let context = match (app.screen, app.controller.attempt()) {
        (AppScreen::Test, Some(attempt)) if attempt.subject.is_empty() => {
            format!(" {} ", attempt.title)
        }
        (AppScreen::Test, Some(attempt)) => format!(" {} | {} ", attempt.title, attempt.subject),
        _ => app
            .user
            .as_ref()
            .map(|u| format!(" {} ", u.display_name()))
            .unwrap_or_default(),
    };

    let block = Block::bordered()
        .border_style(base.fg(colors.border()))
        .style(base);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(24)])
        .split(inner);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " quizdesk ",
            base.fg(colors.header_fg()).add_modifier(Modifier::BOLD),
        ),
        Span::styled(context, base.fg(colors.muted())),
    ]))
    .style(base);
    frame.render_widget(header, columns[0]);

    if app.screen == AppScreen::Test && app.controller.attempt().is_some() {
        frame.render_widget(
            CountdownBadge::new(app.controller.countdown(), app.theme),
            columns[1],
        );
    }
}

fn render_auth(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let height = AuthFormView::height(&app.auth_form);
    let form_area = centered_rect(64, height, area);
    frame.render_widget(AuthFormView::new(&app.auth_form, app.theme), form_area);
}

fn render_dashboard(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let colors = &app.theme.colors;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let titles: Vec<&str> = DashboardTab::ALL.iter().map(|t| t.title()).collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .style(Style::default().fg(colors.muted()))
        .highlight_style(
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        );
    frame.render_widget(tabs, layout[0]);

    match app.tab {
        DashboardTab::Tests => frame.render_widget(
            TestList::new(&app.tests, app.test_selected, app.theme),
            layout[1],
        ),
        DashboardTab::Submissions => frame.render_widget(
            SubmissionList::new(&app.submissions, app.submission_selected, app.theme),
            layout[1],
        ),
        DashboardTab::Stats if app.can_author() => {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(layout[1]);
            frame.render_widget(
                TestList::new(&app.tests, app.test_selected, app.theme),
                columns[0],
            );
            frame.render_widget(TestStatsView::new(app.test_stats.as_ref(), app.theme), columns[1]);
        }
        DashboardTab::Stats => frame.render_widget(
            StudentStatsView::new(app.student_stats.as_ref(), app.theme),
            layout[1],
        ),
    }
}

fn render_test(frame: &mut ratatui::Frame, app: &App, layout: &AppLayout) {
    let colors = &app.theme.colors;
    let sheet = app.controller.sheet();

    let Some(question) = app.current_question() else {
        let empty = Paragraph::new(Line::from(Span::styled(
            "  No test in progress. Press q to return to the dashboard.",
            Style::default().fg(colors.muted()),
        )));
        frame.render_widget(empty, layout.main);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(3)])
        .split(layout.main);

    let selected = app.test_view.selected;
    let view = QuestionView::new(
        question,
        sheet.cards().get(selected),
        selected,
        sheet.len(),
        app.theme,
    )
    .choice_cursor(app.test_view.choice_cursor)
    .editing(app.test_view.editing.as_ref());
    frame.render_widget(view, rows[0]);

    frame.render_widget(
        ProgressBar::new("Progress", sheet.answered_count(), sheet.len(), app.theme),
        rows[1],
    );

    if let Some(sidebar) = layout.sidebar {
        frame.render_widget(QuestionNav::new(sheet, selected, app.theme), sidebar);
    }

    let area = frame.area();
    if app.test_view.confirm_leave {
        frame.render_widget(
            ConfirmDialog::new(
                "Leave test",
                "Leave without submitting? Your answers will be lost.",
                app.theme,
            ),
            area,
        );
    } else if app.test_view.confirm_submit {
        let unanswered = sheet.len() - sheet.answered_count();
        let message = if unanswered == 0 {
            "Submit your answers?".to_string()
        } else {
            format!("{unanswered} question(s) unanswered. Submit anyway?")
        };
        frame.render_widget(ConfirmDialog::new("Submit test", message, app.theme), area);
    }
}

fn render_result(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    if let Some(result) = &app.result {
        let centered = centered_rect(64, 14, area);
        frame.render_widget(
            ResultPanel::new(&result.submission, result.timed_out, app.theme),
            centered,
        );
    }
}
