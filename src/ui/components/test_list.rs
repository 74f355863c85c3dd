use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::api::models::TestSummary;
use crate::ui::theme::Theme;

pub struct TestList<'a> {
    tests: &'a [TestSummary],
    selected: usize,
    theme: &'a Theme,
}

impl<'a> TestList<'a> {
    pub fn new(tests: &'a [TestSummary], selected: usize, theme: &'a Theme) -> Self {
        Self {
            tests,
            selected,
            theme,
        }
    }
}

impl Widget for TestList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Available Tests ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.tests.is_empty() {
            Paragraph::new(Span::styled(
                "  No tests available.",
                Style::default().fg(colors.muted()),
            ))
            .render(inner, buf);
            return;
        }

        // Two lines per test
        let per_page = (inner.height as usize / 2).max(1);
        let offset = self.selected.saturating_sub(per_page - 1);

        let mut lines = Vec::new();
        for (i, test) in self.tests.iter().enumerate().skip(offset).take(per_page) {
            let is_selected = i == self.selected;
            let indicator = if is_selected { " > " } else { "   " };
            let title_style = if is_selected {
                Style::default()
                    .fg(colors.accent())
                    .bg(colors.selected_bg())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };
            let mut title = vec![
                Span::styled(indicator, title_style),
                Span::styled(test.title.as_str(), title_style),
            ];
            if test.is_active == Some(false) {
                title.push(Span::styled("  (inactive)", Style::default().fg(colors.warning())));
            }
            lines.push(Line::from(title));

            let limit = match test.time_limit {
                0 => "no time limit".to_string(),
                n => format!("{n} min"),
            };
            lines.push(Line::from(Span::styled(
                format!(
                    "     {}  ·  {limit}  ·  {} questions",
                    test.subject, test.question_count
                ),
                Style::default().fg(colors.muted()),
            )));
        }

        Paragraph::new(lines).render(inner, buf);
    }
}
