//! Transient status line and shared view chrome

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::tui::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Message shown under the current view until the next key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

/// Status line widget
pub struct StatusBar<'a> {
    status: Option<&'a StatusMessage>,
    theme: Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(status: Option<&'a StatusMessage>, theme: Theme) -> Self {
        Self { status, theme }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(status) = self.status else {
            return;
        };
        let color = match status.kind {
            StatusKind::Info => self.theme.accent(),
            StatusKind::Success => self.theme.positive(),
            StatusKind::Error => self.theme.error(),
        };
        Paragraph::new(Line::from(Span::styled(
            status.text.as_str(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(area, buf);
    }
}

/// Horizontal rule across `area`
pub fn render_separator(area: Rect, buf: &mut Buffer, theme: Theme) {
    let line = "─".repeat(area.width as usize);
    buf.set_string(area.x, area.y, &line, Style::default().fg(theme.muted()));
}

/// Centered `key: action` hints
pub fn render_keybindings(area: Rect, buf: &mut Buffer, bindings: &[(&str, &str)], theme: Theme) {
    let mut spans = Vec::with_capacity(bindings.len() * 3);
    for (i, (key, action)) in bindings.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(*key, Style::default().fg(theme.accent())));
        spans.push(Span::styled(
            format!(": {}", action),
            Style::default().fg(theme.muted()),
        ));
    }
    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .render(area, buf);
}

#[cfg(test)]
pub(crate) fn buffer_text(buf: &Buffer) -> String {
    let area = buf.area;
    (area.y..area.y + area.height)
        .map(|y| {
            (area.x..area.x + area.width)
                .map(|x| buf[(x, y)].symbol().to_string())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_constructors() {
        assert_eq!(StatusMessage::info("a").kind, StatusKind::Info);
        assert_eq!(StatusMessage::success("b").kind, StatusKind::Success);
        assert_eq!(StatusMessage::error("c").text, "c");
    }

    #[test]
    fn test_status_bar_renders_text() {
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        let status = StatusMessage::error("Date invalide");
        StatusBar::new(Some(&status), Theme::Dark).render(area, &mut buf);
        assert!(buffer_text(&buf).contains("Date invalide"));
    }

    #[test]
    fn test_status_bar_empty() {
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);
        StatusBar::new(None, Theme::Dark).render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }

    #[test]
    fn test_keybindings_line() {
        let area = Rect::new(0, 0, 60, 1);
        let mut buf = Buffer::empty(area);
        render_keybindings(area, &mut buf, &[("q", "Quitter"), ("?", "Aide")], Theme::Dark);
        let text = buffer_text(&buf);
        assert!(text.contains("q: Quitter"));
        assert!(text.contains("?: Aide"));
    }
}
