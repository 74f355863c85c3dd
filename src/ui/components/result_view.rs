use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::api::models::SubmissionResult;
use crate::ui::theme::Theme;

pub struct ResultPanel<'a> {
    pub result: &'a SubmissionResult,
    pub timed_out: bool,
    pub theme: &'a Theme,
}

impl<'a> ResultPanel<'a> {
    pub fn new(result: &'a SubmissionResult, timed_out: bool, theme: &'a Theme) -> Self {
        Self {
            result,
            timed_out,
            theme,
        }
    }
}

impl Widget for ResultPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Test Complete ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        let mut title_spans = vec![Span::styled(
            "Results",
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )];
        if self.timed_out {
            title_spans.push(Span::styled(
                "  (submitted when time ran out)",
                Style::default().fg(colors.warning()),
            ));
        }
        Paragraph::new(Line::from(title_spans))
            .alignment(Alignment::Center)
            .render(layout[0], buf);

        let score_color = match self.result.score {
            None => colors.muted(),
            Some(s) if s >= 80.0 => colors.success(),
            Some(s) if s >= 50.0 => colors.warning(),
            Some(_) => colors.error(),
        };
        let score_line = Line::from(vec![
            Span::styled("  Score:     ", Style::default().fg(colors.fg())),
            Span::styled(
                self.result.score_display(),
                Style::default()
                    .fg(score_color)
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        Paragraph::new(score_line).render(layout[1], buf);

        let status_line = Line::from(vec![
            Span::styled("  Status:    ", Style::default().fg(colors.fg())),
            Span::styled(self.result.status_display(), Style::default().fg(colors.fg())),
        ]);
        Paragraph::new(status_line).render(layout[2], buf);

        let fmt_time = |t: Option<chrono::DateTime<chrono::Utc>>| {
            t.map(|t| {
                t.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            })
        };
        let started = fmt_time(self.result.started_at).unwrap_or_else(|| "-".to_string());
        let completed =
            fmt_time(self.result.completed_at).unwrap_or_else(|| "In Progress".to_string());
        Paragraph::new(Line::from(vec![
            Span::styled("  Started:   ", Style::default().fg(colors.fg())),
            Span::styled(started, Style::default().fg(colors.muted())),
        ]))
        .render(layout[3], buf);
        Paragraph::new(Line::from(vec![
            Span::styled("  Completed: ", Style::default().fg(colors.fg())),
            Span::styled(completed, Style::default().fg(colors.muted())),
        ]))
        .render(layout[4], buf);

        Paragraph::new(Line::from(Span::styled(
            "  [Enter/q] Back to dashboard",
            Style::default().fg(colors.accent()),
        )))
        .render(layout[6], buf);
    }
}
