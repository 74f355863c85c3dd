use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Cell, Paragraph, Row, Table, Widget};

use crate::api::models::Submission;
use crate::ui::theme::Theme;

pub struct SubmissionList<'a> {
    submissions: &'a [Submission],
    selected: usize,
    theme: &'a Theme,
}

impl<'a> SubmissionList<'a> {
    pub fn new(submissions: &'a [Submission], selected: usize, theme: &'a Theme) -> Self {
        Self {
            submissions,
            selected,
            theme,
        }
    }
}

impl Widget for SubmissionList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" My Submissions ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.submissions.is_empty() {
            Paragraph::new(Line::styled(
                "  No submissions yet.",
                Style::default().fg(colors.muted()),
            ))
            .render(inner, buf);
            return;
        }

        let header = Row::new(["  Test", "Status", "Score", "Completed"]).style(
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        );

        let visible = inner.height.saturating_sub(1).max(1) as usize;
        let offset = self.selected.saturating_sub(visible - 1);

        let rows: Vec<Row> = self
            .submissions
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(i, s)| {
                let test = s
                    .test
                    .map_or_else(|| "-".to_string(), |id| format!("Test {id}"));
                let completed = s
                    .completed_at
                    .map(|t| {
                        t.with_timezone(&chrono::Local)
                            .format("%Y-%m-%d %H:%M")
                            .to_string()
                    })
                    .unwrap_or_else(|| "In Progress".to_string());
                let indicator = if i == self.selected { "> " } else { "  " };
                let style = if i == self.selected {
                    Style::default().fg(colors.fg()).bg(colors.selected_bg())
                } else {
                    Style::default().fg(colors.fg())
                };
                Row::new([
                    Cell::from(format!("{indicator}{test}")),
                    Cell::from(s.status_display()),
                    Cell::from(s.score_display()),
                    Cell::from(completed),
                ])
                .style(style)
            })
            .collect();

        Table::new(
            rows,
            [
                Constraint::Length(14),
                Constraint::Length(12),
                Constraint::Length(10),
                Constraint::Min(16),
            ],
        )
        .header(header)
        .render(inner, buf);
    }
}
