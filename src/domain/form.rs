//! Create-record form and single-row edit drafts.

use serde::Deserialize;

use crate::domain::error::StockdashError;
use crate::domain::record::{NewStockRecord, RecordField, StockRecord};

/// Text-entry state of the create form. Every field is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StockForm {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub trade_code: String,
    #[serde(default)]
    pub high: String,
    #[serde(default)]
    pub low: String,
    #[serde(default)]
    pub open: String,
    #[serde(default)]
    pub close: String,
    #[serde(default)]
    pub volume: String,
}

impl StockForm {
    pub fn value(&self, field: RecordField) -> &str {
        match field {
            RecordField::Date => &self.date,
            RecordField::TradeCode => &self.trade_code,
            RecordField::Open => &self.open,
            RecordField::High => &self.high,
            RecordField::Low => &self.low,
            RecordField::Close => &self.close,
            RecordField::Volume => &self.volume,
        }
    }

    pub fn set(&mut self, field: RecordField, value: impl Into<String>) {
        let value = value.into();
        match field {
            RecordField::Date => self.date = value,
            RecordField::TradeCode => self.trade_code = value,
            RecordField::Open => self.open = value,
            RecordField::High => self.high = value,
            RecordField::Low => self.low = value,
            RecordField::Close => self.close = value,
            RecordField::Volume => self.volume = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Required-field check plus conversion of the numeric columns.
    pub fn to_payload(&self) -> Result<NewStockRecord, StockdashError> {
        for field in RecordField::ALL {
            if self.value(field).trim().is_empty() {
                return Err(StockdashError::validation(field.name(), "is required"));
            }
        }

        Ok(NewStockRecord {
            date: self.date.trim().to_string(),
            trade_code: self.trade_code.trim().to_string(),
            high: parse_number(RecordField::High, &self.high)?,
            low: parse_number(RecordField::Low, &self.low)?,
            open: parse_number(RecordField::Open, &self.open)?,
            close: parse_number(RecordField::Close, &self.close)?,
            volume: self.volume.trim().parse::<i64>().map_err(|_| {
                StockdashError::validation("volume", format!("'{}' is not a whole number", self.volume))
            })?,
        })
    }
}

fn parse_number(field: RecordField, text: &str) -> Result<f64, StockdashError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| StockdashError::validation(field.name(), format!("'{text}' is not a number")))
}

/// Edit-mode draft of one table row. Edits never touch the original until
/// the draft is saved.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEdit {
    pub original: StockRecord,
    pub draft: StockRecord,
}

impl RecordEdit {
    pub fn begin(record: &StockRecord) -> Self {
        Self {
            original: record.clone(),
            draft: record.clone(),
        }
    }

    pub fn id(&self) -> i64 {
        self.original.id
    }

    pub fn set(&mut self, field: RecordField, value: impl Into<String>) {
        self.draft.set_field(field, value);
    }

    pub fn is_dirty(&self) -> bool {
        self.original != self.draft
    }
}
