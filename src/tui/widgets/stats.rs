//! Stats view widget - date filter and per-service statistics table

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, Widget},
};

use super::status::{render_keybindings, render_separator, StatusBar, StatusMessage};
use super::tabs::{Tab, TabBar};
use crate::services::report::NO_DATA;
use crate::services::StatsReport;
use crate::tui::form::{FilterField, StatsFilter, TextInput};
use crate::tui::theme::Theme;
use crate::types::{Money, PaymentMethod, ServiceStats};

/// Maximum content width for Stats view (consistent with other views)
const MAX_CONTENT_WIDTH: u16 = 140;

const HEADERS: [&str; 7] = [
    "Prestation",
    "Chiffre d'affaire",
    "Bénéfice",
    "Nb",
    "Espèce",
    "Chèque",
    "Paylib",
];

/// Stats view widget
pub struct StatsView<'a> {
    report: &'a StatsReport,
    filter: &'a StatsFilter,
    history_error: Option<&'a str>,
    status: Option<&'a StatusMessage>,
    theme: Theme,
}

impl<'a> StatsView<'a> {
    pub fn new(report: &'a StatsReport, filter: &'a StatsFilter, theme: Theme) -> Self {
        Self {
            report,
            filter,
            history_error: None,
            status: None,
            theme,
        }
    }

    pub fn with_status(mut self, status: Option<&'a StatusMessage>) -> Self {
        self.status = status;
        self
    }

    /// Message shown instead of the table when the history failed to load
    pub fn with_history_error(mut self, error: Option<&'a str>) -> Self {
        self.history_error = error;
        self
    }

    /// Number of table rows that can be scrolled past
    pub fn max_scroll(report: &StatsReport) -> usize {
        report.rows.len().saturating_sub(1)
    }
}

impl Widget for StatsView<'_> {
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
            Constraint::Length(1), // Date filter
            Constraint::Length(1), // Blank
            Constraint::Min(3),    // Table
            Constraint::Length(1), // Separator
            Constraint::Length(1), // Status
            Constraint::Length(1), // Keybindings
        ])
        .split(centered_area);

        TabBar::new(Tab::Stats, self.theme).render(chunks[1], buf);
        render_separator(chunks[2], buf, self.theme);
        self.render_filter(chunks[3], buf);

        if let Some(error) = self.history_error {
            self.render_message(chunks[5], buf, error, self.theme.error());
        } else if self.report.is_empty() {
            self.render_message(chunks[5], buf, NO_DATA, self.theme.muted());
        } else {
            self.render_table(chunks[5], buf);
        }

        render_separator(chunks[6], buf, self.theme);
        StatusBar::new(self.status, self.theme).render(chunks[7], buf);
        self.render_keybindings(chunks[8], buf);
    }
}

impl StatsView<'_> {
    fn render_filter(&self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();
        spans.extend(self.filter_field(FilterField::From, "Du", &self.filter.from));
        spans.push(Span::raw("    "));
        spans.extend(self.filter_field(FilterField::To, "Au", &self.filter.to));
        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn filter_field(&self, field: FilterField, label: &str, input: &TextInput) -> [Span<'static>; 2] {
        let label = Span::styled(format!("{} : ", label), Style::default().fg(self.theme.muted()));
        let value = if self.filter.editing == Some(field) {
            Span::styled(
                format!("{}█", input.value()),
                Style::default().fg(self.theme.accent()),
            )
        } else if input.is_blank() {
            Span::styled("----------", Style::default().fg(self.theme.muted()))
        } else {
            Span::styled(input.value().to_string(), Style::default().fg(self.theme.date()))
        };
        [label, value]
    }

    fn render_message(&self, area: Rect, buf: &mut Buffer, text: &str, color: Color) {
        Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
            .alignment(Alignment::Center)
            .render(area, buf);
    }

    fn stats_cells(&self, name: &str, stats: &ServiceStats, bold: bool) -> Row<'static> {
        let modifier = if bold {
            Modifier::BOLD
        } else {
            Modifier::empty()
        };
        let money = |amount: Money, color: Color| {
            Cell::from(Line::from(amount.to_string()).alignment(Alignment::Right))
                .style(Style::default().fg(color).add_modifier(modifier))
        };
        let count = |n: u64| {
            Cell::from(Line::from(n.to_string()).alignment(Alignment::Right))
                .style(Style::default().fg(self.theme.text()).add_modifier(modifier))
        };

        Row::new(vec![
            Cell::from(name.to_string())
                .style(Style::default().fg(self.theme.text()).add_modifier(modifier)),
            money(stats.revenue, self.theme.money()),
            money(stats.profit, self.theme.signed(stats.profit.cents() < 0)),
            count(stats.count),
            count(stats.method_count(PaymentMethod::Cash)),
            count(stats.method_count(PaymentMethod::Check)),
            count(stats.method_count(PaymentMethod::Paylib)),
        ])
    }

    fn render_table(&self, area: Rect, buf: &mut Buffer) {
        let header = Row::new(HEADERS.iter().enumerate().map(|(i, h)| {
            let line = Line::from(*h);
            let line = if i == 0 {
                line
            } else {
                line.alignment(Alignment::Right)
            };
            Cell::from(line)
        }))
        .style(
            Style::default()
                .fg(self.theme.date())
                .add_modifier(Modifier::BOLD),
        );

        // Header and total stay pinned; the body scrolls
        let body_height = area.height.saturating_sub(2) as usize;
        let scroll = self.filter.scroll.min(StatsView::max_scroll(self.report));
        let mut rows: Vec<Row> = self
            .report
            .rows
            .iter()
            .skip(scroll)
            .take(body_height)
            .map(|row| self.stats_cells(&row.name, &row.stats, false))
            .collect();
        rows.push(self.stats_cells("Total", &self.report.total, true));

        let widths = [
            Constraint::Min(16),
            Constraint::Length(17),
            Constraint::Length(14),
            Constraint::Length(5),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(7),
        ];
        Table::new(rows, widths)
            .header(header)
            .column_spacing(2)
            .render(area, buf);
    }

    fn render_keybindings(&self, area: Rect, buf: &mut Buffer) {
        let bindings: &[(&str, &str)] = if self.filter.editing.is_some() {
            &[("Entrée", "Appliquer"), ("Échap", "Terminer")]
        } else {
            &[
                ("f/t", "Du/Au"),
                ("Entrée", "Recalculer"),
                ("x", "Effacer le filtre"),
                ("r", "Actualiser"),
                ("Tab", "Changer de vue"),
                ("?", "Aide"),
            ]
        };
        render_keybindings(area, buf, bindings, self.theme);
    }
}
