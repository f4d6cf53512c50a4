//! Tab bar widget for view navigation

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use crate::tui::theme::Theme;

/// Available tabs in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Record,
    Stats,
}

impl Tab {
    /// Get the display label for this tab
    pub fn label(self) -> &'static str {
        match self {
            Self::Record => "Saisie",
            Self::Stats => "Statistiques",
        }
    }

    /// Get all tabs in order
    pub fn all() -> &'static [Tab] {
        &[Tab::Record, Tab::Stats]
    }

    /// Get the next tab (wrapping)
    pub fn next(self) -> Self {
        match self {
            Self::Record => Self::Stats,
            Self::Stats => Self::Record,
        }
    }

    /// Get the previous tab (wrapping)
    pub fn prev(self) -> Self {
        // Two tabs: previous and next coincide
        self.next()
    }

    /// Get tab from number key (1-2)
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Record),
            2 => Some(Self::Stats),
            _ => None,
        }
    }
}

/// Tab bar widget showing available views
pub struct TabBar {
    selected: Tab,
    theme: Theme,
}

impl TabBar {
    pub fn new(selected: Tab, theme: Theme) -> Self {
        Self { selected, theme }
    }
}

impl Widget for TabBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let display = |tab: Tab| {
            if tab == self.selected {
                format!("[{}]", tab.label())
            } else {
                tab.label().to_string()
            }
        };

        // Center the tabs
        let total_width: u16 = Tab::all()
            .iter()
            .map(|tab| display(*tab).chars().count() as u16 + 2)
            .sum::<u16>()
            .saturating_sub(2);
        let mut x = area.x + (area.width.saturating_sub(total_width)) / 2;

        for tab in Tab::all() {
            let text = display(*tab);
            let width = text.chars().count() as u16;
            if x + width > area.x + area.width {
                break;
            }

            let style = if *tab == self.selected {
                Style::default()
                    .fg(self.theme.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted())
            };

            buf.set_string(x, area.y, &text, style);
            x += width + 2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_labels() {
        assert_eq!(Tab::Record.label(), "Saisie");
        assert_eq!(Tab::Stats.label(), "Statistiques");
    }

    #[test]
    fn test_tab_navigation_wraps() {
        assert_eq!(Tab::Record.next(), Tab::Stats);
        assert_eq!(Tab::Stats.next(), Tab::Record);
        assert_eq!(Tab::Record.prev(), Tab::Stats);
    }

    #[test]
    fn test_tab_default() {
        assert_eq!(Tab::default(), Tab::Record);
    }

    #[test]
    fn test_tab_from_number() {
        assert_eq!(Tab::from_number(1), Some(Tab::Record));
        assert_eq!(Tab::from_number(2), Some(Tab::Stats));
        assert_eq!(Tab::from_number(0), None);
        assert_eq!(Tab::from_number(3), None);
    }

    #[test]
    fn test_tab_bar_marks_selected() {
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        TabBar::new(Tab::Stats, Theme::Dark).render(area, &mut buf);

        let line: String = (0..area.width)
            .map(|x| buf[(x, 0)].symbol().to_string())
            .collect();
        assert!(line.contains("[Statistiques]"));
        assert!(line.contains("Saisie"));
    }
}
