//! Record view widget - catalog list, entry form and the pending transaction

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::status::{render_keybindings, render_separator, StatusBar, StatusMessage};
use super::tabs::{Tab, TabBar};
use crate::services::Register;
use crate::tui::form::{RecordField, RecordForm, TextInput};
use crate::tui::theme::Theme;
use crate::types::CacheWarning;

/// Maximum content width (consistent with the Stats view)
const MAX_CONTENT_WIDTH: u16 = 140;

/// Record view widget
pub struct RecordView<'a> {
    register: &'a Register,
    form: &'a RecordForm,
    status: Option<&'a StatusMessage>,
    catalog_warning: Option<&'a CacheWarning>,
    theme: Theme,
}

impl<'a> RecordView<'a> {
    pub fn new(register: &'a Register, form: &'a RecordForm, theme: Theme) -> Self {
        Self {
            register,
            form,
            status: None,
            catalog_warning: None,
            theme,
        }
    }

    pub fn with_status(mut self, status: Option<&'a StatusMessage>) -> Self {
        self.status = status;
        self
    }

    pub fn with_catalog_warning(mut self, warning: Option<&'a CacheWarning>) -> Self {
        self.catalog_warning = warning;
        self
    }
}

impl Widget for RecordView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let content_width = area.width.min(MAX_CONTENT_WIDTH);
        let centered_area = Rect {
            x: area.x + (area.width.saturating_sub(content_width)) / 2,
            width: content_width,
            ..area
        };

        let chunks = Layout::vertical([
            Constraint::Length(1), // Top padding
            Constraint::Length(1), // Tabs
            Constraint::Length(1), // Separator
            Constraint::Min(6),    // Body
            Constraint::Length(1), // Separator
            Constraint::Length(1), // Status
            Constraint::Length(1), // Keybindings
        ])
        .split(centered_area);

        TabBar::new(Tab::Record, self.theme).render(chunks[1], buf);
        render_separator(chunks[2], buf, self.theme);

        let [catalog_area, right] =
            Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
                .areas(chunks[3]);
        let [form_area, selection_area] =
            Layout::vertical([Constraint::Length(6), Constraint::Min(3)]).areas(right);

        self.render_catalog(catalog_area, buf);
        self.render_form(form_area, buf);
        self.render_selection(selection_area, buf);

        render_separator(chunks[4], buf, self.theme);
        StatusBar::new(self.status, self.theme).render(chunks[5], buf);
        self.render_keybindings(chunks[6], buf);
    }
}

impl RecordView<'_> {
    fn render_catalog(&self, area: Rect, buf: &mut Buffer) {
        let (title, border) = match self.catalog_warning {
            Some(_) => (" Catalogue (hors ligne) ", self.theme.warning()),
            None => (" Catalogue ", self.theme.muted()),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));
        let inner = block.inner(area);
        block.render(area, buf);

        let catalog = self.register.catalog();
        if catalog.is_empty() {
            Paragraph::new(Span::styled(
                "Catalogue vide.",
                Style::default().fg(self.theme.muted()),
            ))
            .render(inner, buf);
            return;
        }

        let window = visible_window(self.form.catalog_cursor, catalog.len(), inner.height);
        let lines: Vec<Line> = catalog[window.clone()]
            .iter()
            .enumerate()
            .map(|(offset, entry)| {
                let is_cursor = window.start + offset == self.form.catalog_cursor;
                let (marker, name_style) = if is_cursor {
                    (
                        "▸ ",
                        Style::default()
                            .fg(self.theme.accent())
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    ("  ", Style::default().fg(self.theme.text()))
                };
                let price = entry.earning.to_string();
                let name_width = (inner.width as usize)
                    .saturating_sub(price.chars().count() + 3)
                    .max(1);
                Line::from(vec![
                    Span::styled(marker, name_style),
                    Span::styled(format!("{:<name_width$}", truncate(&entry.name, name_width)), name_style),
                    Span::raw(" "),
                    Span::styled(price, Style::default().fg(self.theme.money())),
                ])
            })
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }

    fn render_form(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Prestation ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.muted()));
        let inner = block.inner(area);
        block.render(area, buf);

        let method = match self.form.method {
            Some(method) => Span::styled(method.label(), Style::default().fg(self.theme.date())),
            None => Span::styled("aucun (touche m)", Style::default().fg(self.theme.muted())),
        };
        let lines = vec![
            Line::from(vec![self.label("Mode de règlement"), method]),
            self.field_line(RecordField::Price, "Prix personnalisé", &self.form.price, "prix du catalogue"),
            self.field_line(RecordField::Invoice, "N° de facture", &self.form.invoice, ""),
            self.field_line(RecordField::Date, "Date", &self.form.date, "AAAA-MM-JJ"),
        ];
        Paragraph::new(lines).render(inner, buf);
    }

    fn render_selection(&self, area: Rect, buf: &mut Buffer) {
        let selected = self.register.selected();
        let title = format!(" Transaction en cours ({}) ", selected.len());
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.muted()));
        let inner = block.inner(area);
        block.render(area, buf);

        if selected.is_empty() {
            Paragraph::new(Span::styled(
                "Aucune prestation ajoutée.",
                Style::default().fg(self.theme.muted()),
            ))
            .render(inner, buf);
            return;
        }

        // Last line is reserved for the total
        let list_height = inner.height.saturating_sub(1);
        let window = visible_window(self.form.selected_cursor, selected.len(), list_height);
        let mut lines: Vec<Line> = selected[window.clone()]
            .iter()
            .enumerate()
            .map(|(offset, draft)| {
                let is_cursor = window.start + offset == self.form.selected_cursor;
                let marker = if is_cursor { "▸ " } else { "  " };
                let custom = if draft.is_custom_price() { "*" } else { " " };
                Line::from(vec![
                    Span::styled(marker, Style::default().fg(self.theme.accent())),
                    Span::styled(
                        format!("{:<24}", truncate(&draft.name, 24)),
                        Style::default().fg(self.theme.text()),
                    ),
                    Span::styled(
                        format!(" {:<7}", draft.payment_method.label()),
                        Style::default().fg(self.theme.date()),
                    ),
                    Span::styled(
                        format!(" {:>12}", draft.actual_earning.to_string()),
                        Style::default().fg(self.theme.money()),
                    ),
                    Span::styled(custom, Style::default().fg(self.theme.warning())),
                ])
            })
            .collect();

        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:<32}", "Total"),
                Style::default()
                    .fg(self.theme.text())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {:>12}", self.register.total().to_string()),
                Style::default()
                    .fg(self.theme.money())
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
        Paragraph::new(lines).render(inner, buf);
    }

    fn label(&self, text: &str) -> Span<'static> {
        Span::styled(
            format!("{:<19}: ", text),
            Style::default().fg(self.theme.muted()),
        )
    }

    fn field_line(
        &self,
        field: RecordField,
        label: &str,
        input: &TextInput,
        placeholder: &str,
    ) -> Line<'static> {
        let editing = self.form.editing == Some(field);
        let value = if editing {
            Span::styled(
                format!("{}█", input.value()),
                Style::default().fg(self.theme.accent()),
            )
        } else if input.is_blank() {
            Span::styled(placeholder.to_string(), Style::default().fg(self.theme.muted()))
        } else {
            Span::styled(input.value().to_string(), Style::default().fg(self.theme.text()))
        };
        Line::from(vec![self.label(label), value])
    }

    fn render_keybindings(&self, area: Rect, buf: &mut Buffer) {
        let bindings: &[(&str, &str)] = if self.form.editing.is_some() {
            &[("Entrée", "Valider"), ("Échap", "Terminer")]
        } else {
            &[
                ("↑↓", "Catalogue"),
                ("m", "Mode"),
                ("p/i/d", "Prix/Facture/Date"),
                ("a", "Ajouter"),
                ("J/K x", "Retirer"),
                ("s", "Envoyer"),
                ("?", "Aide"),
            ]
        };
        render_keybindings(area, buf, bindings, self.theme);
    }
}

/// Rows to show so that `cursor` stays visible in `height` lines
pub fn visible_window(cursor: usize, len: usize, height: u16) -> std::ops::Range<usize> {
    let height = (height as usize).max(1);
    let start = if cursor >= height {
        cursor + 1 - height
    } else {
        0
    };
    start..(start + height).min(len)
}

/// Cut `text` to `max` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::widgets::status::buffer_text;
    use crate::types::{CatalogEntry, Money, PaymentMethod};
    use chrono::NaiveDate;

    fn register() -> Register {
        Register::new(vec![
            CatalogEntry {
                name: "Coupe".into(),
                earning: Money::from_cents(3000),
                cost: Money::from_cents(1000),
            },
            CatalogEntry {
                name: "Couleur".into(),
                earning: Money::from_cents(5500),
                cost: Money::ZERO,
            },
        ])
    }

    fn form() -> RecordForm {
        RecordForm::new(NaiveDate::from_ymd_opt(2024, 5, 17).unwrap())
    }

    fn render(view: RecordView) -> String {
        let area = Rect::new(0, 0, 100, 20);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);
        buffer_text(&buf)
    }

    #[test]
    fn test_visible_window() {
        assert_eq!(visible_window(0, 10, 4), 0..4);
        assert_eq!(visible_window(5, 10, 4), 2..6);
        assert_eq!(visible_window(9, 10, 4), 6..10);
        assert_eq!(visible_window(0, 2, 4), 0..2);
        assert_eq!(visible_window(0, 0, 4), 0..0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Coupe", 10), "Coupe");
        assert_eq!(truncate("Coloration complète", 8), "Colorat…");
    }

    #[test]
    fn test_renders_catalog_and_empty_selection() {
        let register = register();
        let form = form();
        let text = render(RecordView::new(&register, &form, Theme::Dark));

        assert!(text.contains("▸ Coupe"));
        assert!(text.contains("55,00 €"));
        assert!(text.contains("Aucune prestation ajoutée."));
        assert!(text.contains("2024-05-17"));
        assert!(text.contains("aucun (touche m)"));
    }

    #[test]
    fn test_renders_selection_with_total() {
        let mut register = register();
        register
            .add(Some("Coupe"), Some(PaymentMethod::Check), "25")
            .unwrap();
        let form = form();
        let text = render(RecordView::new(&register, &form, Theme::Dark));

        assert!(text.contains("Transaction en cours (1)"));
        assert!(text.contains("Chèque"));
        assert!(text.contains("25,00 €*"));
        assert!(text.contains("Total"));
    }

    #[test]
    fn test_offline_catalog_title() {
        let register = register();
        let form = form();
        let warning = CacheWarning::Stale("hors ligne".into());
        let text = render(
            RecordView::new(&register, &form, Theme::Dark).with_catalog_warning(Some(&warning)),
        );
        assert!(text.contains("Catalogue (hors ligne)"));
    }

    #[test]
    fn test_status_is_shown() {
        let register = register();
        let form = form();
        let status = StatusMessage::error("Veuillez sélectionner un mode de règlement.");
        let text = render(RecordView::new(&register, &form, Theme::Dark).with_status(Some(&status)));
        assert!(text.contains("Veuillez sélectionner un mode de règlement."));
    }
}
