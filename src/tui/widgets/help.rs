//! Help popup widget - displays keyboard shortcuts

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::tui::theme::Theme;

/// Version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Width of the help popup
const POPUP_WIDTH: u16 = 50;

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("Tab / Shift+Tab", "Changer de vue"),
            ("1 / 2", "Saisie / Statistiques"),
            ("o", "Se déconnecter"),
        ],
    ),
    (
        "Saisie",
        &[
            ("Haut/Bas ou j/k", "Choisir une prestation"),
            ("m", "Mode de règlement"),
            ("p / i / d", "Prix, facture, date"),
            ("a ou Entrée", "Ajouter la prestation"),
            ("J/K puis x", "Retirer une prestation"),
            ("c", "Vider la transaction"),
            ("s", "Envoyer la transaction"),
        ],
    ),
    (
        "Statistiques",
        &[
            ("f / t", "Saisir les dates"),
            ("Entrée", "Recalculer"),
            ("x", "Effacer le filtre"),
            ("r", "Actualiser"),
        ],
    ),
    ("Général", &[("q / Échap", "Quitter"), ("?", "Aide")]),
];

/// Help popup widget showing keyboard shortcuts
pub struct HelpPopup {
    theme: Theme,
}

impl HelpPopup {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    /// Border, headers, separators, bindings and the close hint
    fn content_height() -> u16 {
        let rows: usize = SECTIONS.iter().map(|(_, keys)| keys.len() + 3).sum();
        rows as u16 + 3
    }

    /// Calculate centered popup area
    pub fn centered_area(area: Rect) -> Rect {
        let height = Self::content_height();
        let x = area.x + (area.width.saturating_sub(POPUP_WIDTH)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        Rect {
            x,
            y,
            width: POPUP_WIDTH.min(area.width),
            height: height.min(area.height),
        }
    }
}

impl Default for HelpPopup {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl Widget for HelpPopup {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Clear the area first (for overlay effect)
        Clear.render(area, buf);

        let title = format!(" prestatrack v{} ", VERSION);
        let block = Block::default()
            .title(title)
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent()));

        let inner = block.inner(area);
        block.render(area, buf);

        let [body, hint] =
            Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

        let sep = "─".repeat(inner.width as usize);
        let mut lines = Vec::new();
        for (header, keys) in SECTIONS {
            lines.push(Line::from(Span::styled(
                *header,
                Style::default()
                    .fg(self.theme.date())
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                sep.clone(),
                Style::default().fg(self.theme.muted()),
            )));
            for (key, desc) in *keys {
                lines.push(keybinding_line(key, desc, self.theme));
            }
            lines.push(Line::default());
        }
        Paragraph::new(lines).render(body, buf);

        Paragraph::new(Line::from(Span::styled(
            "? pour fermer",
            Style::default().fg(self.theme.muted()),
        )))
        .alignment(Alignment::Center)
        .render(hint, buf);
    }
}

/// A single keybinding line
fn keybinding_line(key: &str, desc: &str, theme: Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<18}", key), Style::default().fg(theme.accent())),
        Span::styled(desc.to_string(), Style::default().fg(theme.text())),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::widgets::status::buffer_text;

    #[test]
    fn test_help_popup_centered_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup_area = HelpPopup::centered_area(area);
        let height = HelpPopup::content_height();

        assert_eq!(popup_area.width, POPUP_WIDTH);
        assert_eq!(popup_area.height, height);
        assert_eq!(popup_area.x, (100 - POPUP_WIDTH) / 2);
        assert_eq!(popup_area.y, (50 - height) / 2);
    }

    #[test]
    fn test_help_popup_small_terminal() {
        let area = Rect::new(0, 0, 30, 10);
        let popup_area = HelpPopup::centered_area(area);

        assert_eq!(popup_area.width, 30);
        assert_eq!(popup_area.height, 10);
    }

    #[test]
    fn test_help_lists_submit_key() {
        let area = Rect::new(0, 0, 60, 40);
        let mut buf = Buffer::empty(area);
        HelpPopup::default().render(HelpPopup::centered_area(area), &mut buf);

        let text = buffer_text(&buf);
        assert!(text.contains("Envoyer la transaction"));
        assert!(text.contains("prestatrack v"));
    }
}
