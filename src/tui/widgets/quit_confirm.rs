//! Quit confirmation popup, shown when a transaction is still being composed

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::tui::theme::Theme;

/// Width and height of the quit confirm popup
const POPUP_WIDTH: u16 = 48;
const POPUP_HEIGHT: u16 = 8;

/// State for quit confirmation dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuitConfirmState {
    /// "Non" is preselected
    pub yes_selected: bool,
}

impl QuitConfirmState {
    pub fn toggle(&mut self) {
        self.yes_selected = !self.yes_selected;
    }
}

/// Quit confirmation popup overlay
pub struct QuitConfirmPopup {
    yes_selected: bool,
    pending: usize,
    theme: Theme,
}

impl QuitConfirmPopup {
    /// `pending` is the number of prestations that would be lost
    pub fn new(state: &QuitConfirmState, pending: usize, theme: Theme) -> Self {
        Self {
            yes_selected: state.yes_selected,
            pending,
            theme,
        }
    }

    /// Calculate centered popup area
    pub fn centered_area(area: Rect) -> Rect {
        let x = area.x + (area.width.saturating_sub(POPUP_WIDTH)) / 2;
        let y = area.y + (area.height.saturating_sub(POPUP_HEIGHT)) / 2;
        Rect {
            x,
            y,
            width: POPUP_WIDTH.min(area.width),
            height: POPUP_HEIGHT.min(area.height),
        }
    }

    fn button(&self, label: &'static str, selected: bool) -> [Span<'static>; 2] {
        if selected {
            let style = Style::default()
                .fg(self.theme.accent())
                .add_modifier(Modifier::BOLD);
            [Span::styled("▸ ", style), Span::styled(label, style)]
        } else {
            let style = Style::default().fg(self.theme.muted());
            [Span::styled("  ", style), Span::styled(label, style)]
        }
    }
}

impl Widget for QuitConfirmPopup {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .title(" Quitter ? ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.date()));

        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::vertical([
            Constraint::Length(1), // [0] Padding
            Constraint::Length(1), // [1] Question
            Constraint::Length(1), // [2] Detail
            Constraint::Length(1), // [3] Padding
            Constraint::Length(1), // [4] Buttons
            Constraint::Length(1), // [5] Key hints
        ])
        .split(inner);

        Paragraph::new(Line::from(Span::styled(
            "La transaction en cours sera perdue.",
            Style::default().fg(self.theme.text()),
        )))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        Paragraph::new(Line::from(Span::styled(
            format!("{} prestation(s) non envoyée(s)", self.pending),
            Style::default().fg(self.theme.warning()),
        )))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        let mut buttons = Vec::with_capacity(5);
        buttons.extend(self.button("Oui", self.yes_selected));
        buttons.push(Span::raw("       "));
        buttons.extend(self.button("Non", !self.yes_selected));
        Paragraph::new(Line::from(buttons))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);

        let hint_style = Style::default().fg(self.theme.muted());
        let hint_line = Line::from(vec![
            Span::styled("←→", hint_style.add_modifier(Modifier::BOLD)),
            Span::styled(" Choisir  ", hint_style),
            Span::styled("Entrée", hint_style.add_modifier(Modifier::BOLD)),
            Span::styled(" Confirmer", hint_style),
        ]);
        Paragraph::new(hint_line)
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::widgets::status::buffer_text;

    #[test]
    fn test_quit_confirm_default_is_no() {
        assert!(!QuitConfirmState::default().yes_selected);
    }

    #[test]
    fn test_quit_confirm_toggle() {
        let mut state = QuitConfirmState::default();
        state.toggle();
        assert!(state.yes_selected);
        state.toggle();
        assert!(!state.yes_selected);
    }

    #[test]
    fn test_quit_confirm_centered_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup_area = QuitConfirmPopup::centered_area(area);

        assert_eq!(popup_area.width, POPUP_WIDTH);
        assert_eq!(popup_area.height, POPUP_HEIGHT);
        assert_eq!(popup_area.x, (100 - POPUP_WIDTH) / 2);
        assert_eq!(popup_area.y, (50 - POPUP_HEIGHT) / 2);
    }

    #[test]
    fn test_quit_confirm_small_terminal() {
        let area = Rect::new(0, 0, 20, 4);
        let popup_area = QuitConfirmPopup::centered_area(area);

        assert_eq!(popup_area.width, 20);
        assert_eq!(popup_area.height, 4);
    }

    #[test]
    fn test_quit_confirm_renders() {
        let area = Rect::new(0, 0, 60, 20);
        let popup_area = QuitConfirmPopup::centered_area(area);
        let mut buf = Buffer::empty(area);
        let state = QuitConfirmState { yes_selected: true };
        QuitConfirmPopup::new(&state, 2, Theme::Dark).render(popup_area, &mut buf);

        let content = buffer_text(&buf);
        assert!(content.contains("Quitter ?"));
        assert!(content.contains("2 prestation(s)"));
        assert!(content.contains("▸ Oui"));
        assert!(content.contains("Non"));
    }
}
