use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::answers::AnswerSheet;
use crate::ui::theme::Theme;

/// Sidebar listing every question with its answered state.
pub struct QuestionNav<'a> {
    sheet: &'a AnswerSheet,
    selected: usize,
    theme: &'a Theme,
}

impl<'a> QuestionNav<'a> {
    pub fn new(sheet: &'a AnswerSheet, selected: usize, theme: &'a Theme) -> Self {
        Self {
            sheet,
            selected,
            theme,
        }
    }
}

impl Widget for QuestionNav<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Questions ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let visible = inner.height as usize;
        let offset = if visible == 0 {
            0
        } else {
            self.selected.saturating_sub(visible.saturating_sub(1))
        };

        let lines: Vec<Line> = self
            .sheet
            .cards()
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(i, card)| {
                let (mark, mark_color) = if card.is_answered() {
                    ("●", colors.success())
                } else {
                    ("○", colors.muted())
                };
                let is_selected = i == self.selected;
                let label_style = if is_selected {
                    Style::default()
                        .fg(colors.accent())
                        .bg(colors.selected_bg())
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.fg())
                };
                Line::from(vec![
                    Span::styled(format!(" {mark} "), Style::default().fg(mark_color)),
                    Span::styled(format!("Question {}", i + 1), label_style),
                ])
            })
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}
