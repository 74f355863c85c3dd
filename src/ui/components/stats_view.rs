use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Cell, Paragraph, Row, Table, Widget};

use crate::api::models::{StudentStats, TestStats, format_score};
use crate::ui::theme::Theme;

fn summary_line<'s>(label: &'s str, value: String, theme: &Theme) -> Line<'s> {
    let colors = &theme.colors;
    Line::from(vec![
        Span::styled(label, Style::default().fg(colors.fg())),
        Span::styled(
            value,
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        ),
    ])
}

fn framed<'b>(title: &'b str, theme: &Theme) -> Block<'b> {
    Block::bordered()
        .title(title)
        .border_style(Style::default().fg(theme.colors.border()))
        .style(Style::default().bg(theme.colors.bg()))
}

pub struct StudentStatsView<'a> {
    stats: Option<&'a StudentStats>,
    theme: &'a Theme,
}

impl<'a> StudentStatsView<'a> {
    pub fn new(stats: Option<&'a StudentStats>, theme: &'a Theme) -> Self {
        Self { stats, theme }
    }
}

impl Widget for StudentStatsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = framed(" My Statistics ", self.theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(stats) = self.stats else {
            Paragraph::new(Line::styled(
                "  Statistics not loaded. Press [R] to refresh.",
                Style::default().fg(colors.muted()),
            ))
            .render(inner, buf);
            return;
        };

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(inner);

        let mut summary = vec![
            summary_line("  Tests taken:   ", stats.tests_taken.to_string(), self.theme),
            summary_line("  Average score: ", format_score(stats.avg_score), self.theme),
        ];
        if let Some(message) = &stats.message {
            summary.push(Line::styled(
                format!("  {message}"),
                Style::default().fg(colors.muted()),
            ));
        }
        Paragraph::new(summary).render(layout[0], buf);

        let header = Row::new(["  Test", "Score", "Completed"]).style(
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        );
        let rows: Vec<Row> = stats
            .test_results
            .iter()
            .map(|r| {
                let completed = r
                    .completed_at
                    .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string());
                Row::new([
                    Cell::from(format!("  {}", r.test_title)),
                    Cell::from(format_score(r.score)),
                    Cell::from(completed),
                ])
                .style(Style::default().fg(colors.fg()))
            })
            .collect();
        Table::new(
            rows,
            [
                Constraint::Min(20),
                Constraint::Length(10),
                Constraint::Length(12),
            ],
        )
        .header(header)
        .render(layout[1], buf);
    }
}

/// Per-test statistics for teachers and admins.
pub struct TestStatsView<'a> {
    stats: Option<&'a TestStats>,
    theme: &'a Theme,
}

impl<'a> TestStatsView<'a> {
    pub fn new(stats: Option<&'a TestStats>, theme: &'a Theme) -> Self {
        Self { stats, theme }
    }
}

impl Widget for TestStatsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let title = match self.stats {
            Some(stats) => format!(" {} ", stats.test_title),
            None => " Test Statistics ".to_string(),
        };
        let block = framed(&title, self.theme);
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(stats) = self.stats else {
            Paragraph::new(Line::styled(
                "  Select a test with j/k to see its statistics.",
                Style::default().fg(colors.muted()),
            ))
            .render(inner, buf);
            return;
        };

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0)])
            .split(inner);

        let mut summary = vec![
            summary_line("  Submissions: ", stats.submission_count.to_string(), self.theme),
            summary_line("  Average:     ", format_score(stats.avg_score), self.theme),
            summary_line(
                "  Best/worst:  ",
                format!(
                    "{} / {}",
                    format_score(stats.max_score),
                    format_score(stats.min_score)
                ),
                self.theme,
            ),
        ];
        if let Some(message) = &stats.message {
            summary.push(Line::styled(
                format!("  {message}"),
                Style::default().fg(colors.muted()),
            ));
        }
        Paragraph::new(summary).render(layout[0], buf);

        let header = Row::new(["  Question", "Correct", "Incorrect", "Rate"]).style(
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        );
        let rows: Vec<Row> = stats
            .question_stats
            .iter()
            .map(|q| {
                let rate_color = if q.correct_percentage >= 70.0 {
                    colors.success()
                } else if q.correct_percentage >= 40.0 {
                    colors.warning()
                } else {
                    colors.error()
                };
                Row::new([
                    Cell::from(format!("  {}", q.question_text)),
                    Cell::from(q.correct_count.to_string()),
                    Cell::from(q.incorrect_count.to_string()),
                    Cell::from(Span::styled(
                        format!("{:.0}%", q.correct_percentage),
                        Style::default().fg(rate_color),
                    )),
                ])
                .style(Style::default().fg(colors.fg()))
            })
            .collect();
        Table::new(
            rows,
            [
                Constraint::Min(24),
                Constraint::Length(9),
                Constraint::Length(10),
                Constraint::Length(6),
            ],
        )
        .header(header)
        .render(layout[1], buf);
    }
}
