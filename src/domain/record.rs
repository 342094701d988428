//! Stock record representation.
//!
//! Prices and volume are held as the text the backend sent so that what the
//! user searches and edits is exactly what is shown. Typed views are parsed
//! on demand.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// One OHLC/volume observation for a trade code on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: i64,
    pub date: String,
    pub trade_code: String,
    #[serde(deserialize_with = "text_or_number")]
    pub high: String,
    #[serde(deserialize_with = "text_or_number")]
    pub low: String,
    #[serde(deserialize_with = "text_or_number")]
    pub open: String,
    #[serde(deserialize_with = "text_or_number")]
    pub close: String,
    #[serde(deserialize_with = "text_or_number")]
    pub volume: String,
}

/// Payload for creating a record. The server assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStockRecord {
    pub date: String,
    pub trade_code: String,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub close: f64,
    pub volume: i64,
}

/// Editable fields of a record, in table column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Date,
    TradeCode,
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl RecordField {
    pub const ALL: [RecordField; 7] = [
        RecordField::Date,
        RecordField::TradeCode,
        RecordField::Open,
        RecordField::High,
        RecordField::Low,
        RecordField::Close,
        RecordField::Volume,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RecordField::Date => "date",
            RecordField::TradeCode => "trade_code",
            RecordField::Open => "open",
            RecordField::High => "high",
            RecordField::Low => "low",
            RecordField::Close => "close",
            RecordField::Volume => "volume",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordField::Date => "Date",
            RecordField::TradeCode => "Trade Code",
            RecordField::Open => "Open",
            RecordField::High => "High",
            RecordField::Low => "Low",
            RecordField::Close => "Close",
            RecordField::Volume => "Volume",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "date" => Some(RecordField::Date),
            "trade_code" | "code" => Some(RecordField::TradeCode),
            "open" => Some(RecordField::Open),
            "high" => Some(RecordField::High),
            "low" => Some(RecordField::Low),
            "close" => Some(RecordField::Close),
            "volume" => Some(RecordField::Volume),
            _ => None,
        }
    }
}

impl StockRecord {
    pub fn field(&self, field: RecordField) -> &str {
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

    pub fn set_field(&mut self, field: RecordField, value: impl Into<String>) {
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

    pub fn close_value(&self) -> Option<f64> {
        parse_price(&self.close)
    }

    pub fn volume_value(&self) -> Option<i64> {
        parse_volume(&self.volume)
    }

    pub fn date_value(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

pub fn parse_price(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer volume with `,` thousands separators stripped.
pub fn parse_volume(text: &str) -> Option<i64> {
    let digits: String = text.trim().chars().filter(|c| *c != ',').collect();
    if let Ok(v) = digits.parse::<i64>() {
        return Some(v);
    }
    // "1200.0" style values from numeric JSON
    digits
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.trunc() as i64)
}

/// Calendar date from `YYYY-MM-DD`, tolerating a trailing time component.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let head = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(i) => i.to_string(),
        Raw::Float(f) => f.to_string(),
    })
}
