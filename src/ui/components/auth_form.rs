use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::app::{AuthForm, AuthMode};
use crate::ui::theme::Theme;

pub struct AuthFormView<'a> {
    form: &'a AuthForm,
    theme: &'a Theme,
}

impl<'a> AuthFormView<'a> {
    pub fn new(form: &'a AuthForm, theme: &'a Theme) -> Self {
        Self { form, theme }
    }

    /// Height the form needs for its current mode.
    pub fn height(form: &AuthForm) -> u16 {
        form.fields().len() as u16 * 2 + 6
    }
}

impl Widget for AuthFormView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let title = match self.form.mode {
            AuthMode::Login => " Login ",
            AuthMode::Register => " Register ",
        };

        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let fields = self.form.fields();
        let mut constraints = vec![Constraint::Length(1)];
        constraints.extend(fields.iter().map(|_| Constraint::Length(2)));
        constraints.push(Constraint::Min(0));
        constraints.push(Constraint::Length(1));
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        let focused = self.form.focused();
        for (i, field) in fields.iter().enumerate() {
            let is_focused = *field == focused;
            let label_style = Style::default()
                .fg(if is_focused { colors.accent() } else { colors.fg() })
                .add_modifier(if is_focused {
                    Modifier::BOLD
                } else {
                    Modifier::empty()
                });
            let indicator = if is_focused { " > " } else { "   " };
            let label = Span::styled(format!("{indicator}{:<17}", field.label()), label_style);

            let value: Vec<Span> = match self.form.input(*field) {
                Some(input) if is_focused => {
                    let (before, cursor, after) = input.render_parts();
                    vec![
                        Span::styled(before, Style::default().fg(colors.fg())),
                        Span::styled(
                            cursor.map_or_else(|| " ".to_string(), String::from),
                            Style::default().fg(colors.bg()).bg(colors.accent()),
                        ),
                        Span::styled(after, Style::default().fg(colors.fg())),
                    ]
                }
                Some(input) => {
                    let (before, cursor, after) = input.render_parts();
                    let mut text = before;
                    text.extend(cursor);
                    text.push_str(&after);
                    vec![Span::styled(text, Style::default().fg(colors.fg()))]
                }
                None => {
                    let role_style = Style::default().fg(if is_focused {
                        colors.accent()
                    } else {
                        colors.fg()
                    });
                    vec![Span::styled(
                        format!("< {} >", self.form.role.as_str()),
                        role_style,
                    )]
                }
            };

            let mut spans = vec![label];
            spans.extend(value);
            Paragraph::new(Line::from(spans)).render(layout[i + 1], buf);
        }

        let switch = match self.form.mode {
            AuthMode::Login => "[Ctrl-r] Create an account",
            AuthMode::Register => "[Ctrl-r] Back to login",
        };
        Paragraph::new(Line::from(vec![
            Span::styled("[Enter] Submit  [Tab] Next field  ", Style::default().fg(colors.accent())),
            Span::styled(switch, Style::default().fg(colors.muted())),
        ]))
        .alignment(Alignment::Center)
        .render(layout[fields.len() + 2], buf);

    }
}
