use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use crate::app::{Notice, NoticeKind};
use crate::ui::theme::Theme;

pub struct NoticeBar<'a> {
    notice: Option<&'a Notice>,
    theme: &'a Theme,
}

impl<'a> NoticeBar<'a> {
    pub fn new(notice: Option<&'a Notice>, theme: &'a Theme) -> Self {
        Self { notice, theme }
    }
}

impl Widget for NoticeBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(notice) = self.notice else {
            return;
        };
        let colors = &self.theme.colors;
        let (tag, color) = match notice.kind {
            NoticeKind::Info => ("info", colors.accent()),
            NoticeKind::Success => ("ok", colors.success()),
            NoticeKind::Warning => ("warn", colors.warning()),
            NoticeKind::Error => ("error", colors.error()),
        };

        Paragraph::new(Line::from(vec![
            Span::styled(
                format!(" [{tag}] "),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(notice.message.as_str(), Style::default().fg(color)),
        ]))
        .render(area, buf);
    }
}
