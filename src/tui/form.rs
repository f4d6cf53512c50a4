//! Editable form state for the Record and Stats tabs

use chrono::NaiveDate;

use crate::types::{DateRange, PaymentMethod, PrestaError, Result};

/// Single-line text field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
}

impl TextInput {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn push(&mut self, c: char) {
        if !c.is_control() {
            self.value.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.value.pop();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Text fields of the Record tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Price,
    Invoice,
    Date,
}

/// Record tab state: catalog cursor, payment method and inputs
#[derive(Debug, Clone)]
pub struct RecordForm {
    pub catalog_cursor: usize,
    pub selected_cursor: usize,
    /// None until the user picks one
    pub method: Option<PaymentMethod>,
    pub price: TextInput,
    pub invoice: TextInput,
    pub date: TextInput,
    pub editing: Option<RecordField>,
}

impl RecordForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            catalog_cursor: 0,
            selected_cursor: 0,
            method: None,
            price: TextInput::default(),
            invoice: TextInput::default(),
            date: TextInput::new(today.format("%Y-%m-%d").to_string()),
            editing: None,
        }
    }

    /// Fresh form after a recorded transaction; the catalog cursor stays put
    pub fn reset(&mut self, today: NaiveDate) {
        *self = Self {
            catalog_cursor: self.catalog_cursor,
            ..Self::new(today)
        };
    }

    /// Espèce first, then cycle through the rest
    pub fn cycle_method(&mut self) {
        self.method = Some(self.method.map_or(PaymentMethod::Cash, PaymentMethod::next));
    }

    pub fn move_catalog(&mut self, delta: isize, len: usize) {
        self.catalog_cursor = step(self.catalog_cursor, delta, len);
    }

    pub fn move_selected(&mut self, delta: isize, len: usize) {
        self.selected_cursor = step(self.selected_cursor, delta, len);
    }

    /// Keep the selected-list cursor on an existing row
    pub fn clamp_selected(&mut self, len: usize) {
        self.selected_cursor = self.selected_cursor.min(len.saturating_sub(1));
    }

    pub fn input_mut(&mut self, field: RecordField) -> &mut TextInput {
        match field {
            RecordField::Price => &mut self.price,
            RecordField::Invoice => &mut self.invoice,
            RecordField::Date => &mut self.date,
        }
    }

    /// Transaction date from the date field
    pub fn parse_date(&self) -> Result<NaiveDate> {
        let raw = self.date.value().trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            PrestaError::Validation(format!("Date invalide : {} (format AAAA-MM-JJ)", raw))
        })
    }
}

/// Date bounds of the Stats tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    From,
    To,
}

#[derive(Debug, Clone, Default)]
pub struct StatsFilter {
    pub from: TextInput,
    pub to: TextInput,
    pub editing: Option<FilterField>,
    pub scroll: usize,
}

impl StatsFilter {
    pub fn input_mut(&mut self, field: FilterField) -> &mut TextInput {
        match field {
            FilterField::From => &mut self.from,
            FilterField::To => &mut self.to,
        }
    }

    /// Blank fields leave that side open
    pub fn range(&self) -> Result<DateRange> {
        DateRange::parse(Some(self.from.value()), Some(self.to.value()))
    }

    pub fn clear(&mut self) {
        self.from.clear();
        self.to.clear();
        self.scroll = 0;
    }
}

fn step(cursor: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    cursor.saturating_add_signed(delta).min(len - 1)
}
