//! Loading screen: branding plus a checklist of load stages

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::tui::theme::Theme;

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

const APP_NAME: &str = "prestatrack";
const TAGLINE: &str = "Suivi des prestations";

/// What the loader thread is fetching, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingStage {
    Catalog,
    History,
}

impl LoadingStage {
    pub fn all() -> &'static [LoadingStage] {
        &[Self::Catalog, Self::History]
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Catalog => "Chargement du catalogue...",
            Self::History => "Chargement des transactions...",
        }
    }

    fn done_message(self) -> &'static str {
        match self {
            Self::Catalog => "Catalogue chargé",
            Self::History => "Transactions chargées",
        }
    }

    /// 1-based position among all stages
    pub fn step(self) -> usize {
        Self::all().iter().position(|s| *s == self).unwrap_or(0) + 1
    }
}

/// Loading screen widget
pub struct Spinner {
    frame: usize,
    stage: LoadingStage,
    theme: Theme,
}

impl Spinner {
    pub fn new(frame: usize, stage: LoadingStage, theme: Theme) -> Self {
        Self {
            frame,
            stage,
            theme,
        }
    }

    pub fn current_char(&self) -> char {
        SPINNER_FRAMES[self.frame % SPINNER_FRAMES.len()]
    }

    /// Advance to next frame, returning the new frame index
    pub fn next_frame(frame: usize) -> usize {
        (frame + 1) % SPINNER_FRAMES.len()
    }

    /// Finished stages get a check mark, the current one the spinner,
    /// later ones stay dimmed
    fn stage_line(&self, stage: LoadingStage) -> Line<'static> {
        let current = self.stage.step();
        let (mark, text, style) = match stage.step().cmp(&current) {
            std::cmp::Ordering::Less => (
                '✓',
                stage.done_message(),
                Style::default().fg(self.theme.positive()),
            ),
            std::cmp::Ordering::Equal => (
                self.current_char(),
                stage.message(),
                Style::default().fg(self.theme.accent()),
            ),
            std::cmp::Ordering::Greater => (
                '·',
                stage.message(),
                Style::default().fg(self.theme.muted()),
            ),
        };
        Line::from(Span::styled(format!("{} {:<32}", mark, text), style))
    }
}

impl Widget for Spinner {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let stages = LoadingStage::all();
        let height = 4 + stages.len() as u16;
        if area.height < height || area.width < 36 {
            return;
        }

        let [_, body, _] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .areas(area);

        let mut lines = vec![
            Line::from(Span::styled(
                APP_NAME,
                Style::default()
                    .fg(self.theme.text())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(TAGLINE, Style::default().fg(self.theme.muted()))),
            Line::default(),
        ];
        lines.extend(stages.iter().map(|s| self.stage_line(*s)));
        lines.push(Line::from(Span::styled(
            format!("Étape {}/{}", self.stage.step(), stages.len()),
            Style::default().fg(self.theme.muted()),
        )));

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(body, buf);
    }
}
