//! Sign-in screen: paste the token issued by the identity provider

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::status::{render_keybindings, StatusBar, StatusMessage};
use crate::tui::form::TextInput;
use crate::tui::theme::Theme;

const BOX_WIDTH: u16 = 64;

/// Sign-in view
pub struct LoginView<'a> {
    input: &'a TextInput,
    status: Option<&'a StatusMessage>,
    theme: Theme,
}

impl<'a> LoginView<'a> {
    pub fn new(input: &'a TextInput, theme: Theme) -> Self {
        Self {
            input,
            status: None,
            theme,
        }
    }

    pub fn with_status(mut self, status: Option<&'a StatusMessage>) -> Self {
        self.status = status;
        self
    }

    /// The token is masked except for its last four characters
    fn masked(&self) -> String {
        let chars: Vec<char> = self.input.value().chars().collect();
        let visible = chars.len().min(4);
        let hidden = chars.len() - visible;
        let mut out = "•".repeat(hidden.min(40));
        out.extend(&chars[hidden..]);
        out
    }
}

impl Widget for LoginView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [_, middle, status, keys] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(7),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .areas(area);

        let width = BOX_WIDTH.min(middle.width);
        let boxed = Rect {
            x: middle.x + (middle.width - width) / 2,
            width,
            ..middle
        };

        let block = Block::default()
            .title(" Connexion ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.accent()));
        let inner = block.inner(boxed);
        block.render(boxed, buf);

        let lines = vec![
            Line::from(Span::styled(
                "Veuillez vous connecter.",
                Style::default()
                    .fg(self.theme.text())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Collez le jeton de session puis validez avec Entrée.",
                Style::default().fg(self.theme.muted()),
            )),
            Line::default(),
            Line::from(vec![
                Span::styled("Jeton : ", Style::default().fg(self.theme.muted())),
                Span::styled(
                    format!("{}█", self.masked()),
                    Style::default().fg(self.theme.accent()),
                ),
            ]),
        ];
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(inner, buf);

        StatusBar::new(self.status, self.theme).render(status, buf);
        render_keybindings(
            keys,
            buf,
            &[("Entrée", "Se connecter"), ("Échap", "Quitter")],
            self.theme,
        );
    }
}
