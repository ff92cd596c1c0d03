//! Date ranges and the day descriptors shown as columns

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::{AggregationError, DateKey};

const WEEKDAY_LABELS: [(&str, &str); 7] = [
    ("lunes", "lun"),
    ("martes", "mar"),
    ("miércoles", "mié"),
    ("jueves", "jue"),
    ("viernes", "vie"),
    ("sábado", "sáb"),
    ("domingo", "dom"),
];

/// Stable `YYYY-MM-DD` key for a date
pub fn date_key(date: NaiveDate) -> DateKey {
    date.format("%Y-%m-%d").to_string()
}

/// Localized (Spanish) weekday name and its short form
pub fn weekday_labels(weekday: Weekday) -> (&'static str, &'static str) {
    WEEKDAY_LABELS[weekday.num_days_from_monday() as usize]
}

/// An inclusive range of calendar days
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AggregationError> {
        if end < start {
            return Err(AggregationError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering a single day
    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn start_key(&self) -> DateKey {
        date_key(self.start)
    }

    pub fn end_key(&self) -> DateKey {
        date_key(self.end)
    }

    /// Keys compare lexicographically in date order, so no parsing is needed
    pub fn contains(&self, key: &str) -> bool {
        key.len() == 10 && key >= self.start_key().as_str() && key <= self.end_key().as_str()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// One descriptor per day, in order. Regenerate whenever the range changes.
    pub fn days(&self) -> Vec<DayDescriptor> {
        self.start
            .iter_days()
            .take_while(|d| *d <= self.end)
            .map(DayDescriptor::new)
            .collect()
    }

    pub fn len_days(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }
}

/// One calendar day in the visible range
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayDescriptor {
    pub date: NaiveDate,
    pub date_key: DateKey,
    pub label: String,
    pub short_label: String,
    pub day_of_month: u32,
}

impl DayDescriptor {
    pub fn new(date: NaiveDate) -> Self {
        let (label, short_label) = weekday_labels(date.weekday());
        Self {
            date,
            date_key: date_key(date),
            label: label.to_string(),
            short_label: short_label.to_string(),
            day_of_month: date.day(),
        }
    }
}
