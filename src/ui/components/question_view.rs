use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::answers::QuestionCard;
use crate::session::attempt::{Question, QuestionKind};
use crate::ui::line_input::LineInput;
use crate::ui::theme::Theme;

/// One question with its choices or text answer.
pub struct QuestionView<'a> {
    question: &'a Question,
    card: Option<&'a QuestionCard>,
    index: usize,
    total: usize,
    choice_cursor: usize,
    editing: Option<&'a LineInput>,
    theme: &'a Theme,
}

impl<'a> QuestionView<'a> {
    pub fn new(
        question: &'a Question,
        card: Option<&'a QuestionCard>,
        index: usize,
        total: usize,
        theme: &'a Theme,
    ) -> Self {
        Self {
            question,
            card,
            index,
            total,
            choice_cursor: 0,
            editing: None,
            theme,
        }
    }

    pub fn choice_cursor(mut self, cursor: usize) -> Self {
        self.choice_cursor = cursor;
        self
    }

    pub fn editing(mut self, editing: Option<&'a LineInput>) -> Self {
        self.editing = editing;
        self
    }

    fn kind_hint(&self) -> &'static str {
        match self.question.kind {
            QuestionKind::SingleChoice => "choose one",
            QuestionKind::MultipleChoice => "choose all that apply",
            QuestionKind::Text => "type your answer",
        }
    }
}

impl Widget for QuestionView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let points = if self.question.points == 1 {
            "1 point".to_string()
        } else {
            format!("{} points", self.question.points)
        };
        let block = Block::bordered()
            .title(format!(" Question {} of {} ", self.index + 1, self.total))
            .title_bottom(Line::from(format!(" {points} ")).right_aligned())
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let text_lines =
            crate::ui::layout::wrapped_line_count(&self.question.text, inner.width.max(1) as usize)
                as u16;
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(text_lines + 1),
                Constraint::Length(2),
                Constraint::Min(0),
            ])
            .split(inner);

        Paragraph::new(Span::styled(
            self.question.text.as_str(),
            Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
        ))
        .wrap(Wrap { trim: false })
        .render(layout[0], buf);

        Paragraph::new(Span::styled(
            format!("({})", self.kind_hint()),
            Style::default().fg(colors.muted()),
        ))
        .render(layout[1], buf);

        if self.question.kind.has_choices() {
            let multiple = self.question.kind == QuestionKind::MultipleChoice;
            let lines: Vec<Line> = self
                .question
                .choices
                .iter()
                .enumerate()
                .map(|(i, choice)| {
                    let checked = self.card.is_some_and(|c| c.is_selected(choice.id));
                    let mark = match (multiple, checked) {
                        (true, true) => "[x]",
                        (true, false) => "[ ]",
                        (false, true) => "(•)",
                        (false, false) => "( )",
                    };
                    let is_cursor = i == self.choice_cursor;
                    let indicator = if is_cursor { " > " } else { "   " };
                    let mut style = Style::default().fg(if checked {
                        colors.accent()
                    } else {
                        colors.fg()
                    });
                    if is_cursor {
                        style = style.bg(colors.selected_bg()).add_modifier(Modifier::BOLD);
                    }
                    Line::from(vec![
                        Span::styled(indicator, style),
                        Span::styled(format!("{} {mark} ", i + 1), style),
                        Span::styled(choice.text.as_str(), style),
                    ])
                })
                .collect();
            if lines.is_empty() {
                Paragraph::new(Span::styled(
                    "This question has no choices.",
                    Style::default().fg(colors.warning()),
                ))
                .render(layout[2], buf);
            } else {
                Paragraph::new(lines).wrap(Wrap { trim: false }).render(layout[2], buf);
            }
            return;
        }

        let answer_block = Block::bordered()
            .title(" Answer ")
            .border_style(Style::default().fg(if self.editing.is_some() {
                colors.border_focused()
            } else {
                colors.border()
            }));
        let answer_area = Rect {
            height: layout[2].height.min(3),
            ..layout[2]
        };
        let answer_inner = answer_block.inner(answer_area);
        answer_block.render(answer_area, buf);

        let line = match self.editing {
            Some(input) => {
                let (before, cursor, after) = input.render_parts();
                Line::from(vec![
                    Span::styled(before, Style::default().fg(colors.fg())),
                    Span::styled(
                        cursor.map_or_else(|| " ".to_string(), String::from),
                        Style::default().fg(colors.bg()).bg(colors.accent()),
                    ),
                    Span::styled(after, Style::default().fg(colors.fg())),
                ])
            }
            None => {
                let text = self.card.map(QuestionCard::text).unwrap_or("");
                if text.is_empty() {
                    Line::from(Span::styled(
                        "Press Enter to write an answer",
                        Style::default().fg(colors.muted()),
                    ))
                } else {
                    Line::from(Span::styled(text, Style::default().fg(colors.fg())))
                }
            }
        };
        Paragraph::new(line).render(answer_inner, buf);
    }
}
