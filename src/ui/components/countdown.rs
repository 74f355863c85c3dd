use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use crate::session::timer::Countdown;
use crate::ui::theme::Theme;

/// Time-left readout. Switches to the warning colour in the last five
/// minutes and shows "No time limit" when the test has none.
pub struct CountdownBadge<'a> {
    countdown: Option<&'a Countdown>,
    theme: &'a Theme,
}

impl<'a> CountdownBadge<'a> {
    pub fn new(countdown: Option<&'a Countdown>, theme: &'a Theme) -> Self {
        Self { countdown, theme }
    }
}

impl Widget for CountdownBadge<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let base = Style::default().bg(colors.header_bg());

        let line = match self.countdown {
            Some(countdown) => {
                let style = if countdown.remaining_seconds() == 0 {
                    base.fg(colors.error()).add_modifier(Modifier::BOLD)
                } else if countdown.is_warning() {
                    base.fg(colors.warning()).add_modifier(Modifier::BOLD)
                } else {
                    base.fg(colors.header_fg())
                };
                Line::from(vec![
                    Span::styled("Time left ", base.fg(colors.muted())),
                    Span::styled(countdown.display(), style),
                    Span::styled(" ", base),
                ])
            }
            None => Line::from(Span::styled("No time limit ", base.fg(colors.muted()))),
        };

        Paragraph::new(line)
            .alignment(Alignment::Right)
            .style(base)
            .render(area, buf);
    }
}
