//! Hour segments (user-editable shifts) and their mapping to feed work shifts

use chrono::{DateTime, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::WorkShift;

/// One `HH:MM`–`HH:MM` block of work as edited by a user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HourSegment {
    pub id: String,
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SegmentError {
    #[error("Invalid start time '{0}' (expected HH:MM)")]
    InvalidStart(String),

    #[error("Invalid end time '{0}' (expected HH:MM)")]
    InvalidEnd(String),

    #[error("End time {end} must be after start time {start}")]
    EndNotAfterStart { start: String, end: String },
}

impl HourSegment {
    pub fn new(id: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start: start.into(),
            end: end.into(),
            total: None,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Both times must be 24-hour `HH:MM` and `end > start`
    pub fn validate(&self) -> Result<(NaiveTime, NaiveTime), SegmentError> {
        let start = parse_hhmm(&self.start).ok_or_else(|| SegmentError::InvalidStart(self.start.clone()))?;
        let end = parse_hhmm(&self.end).ok_or_else(|| SegmentError::InvalidEnd(self.end.clone()))?;
        if end <= start {
            return Err(SegmentError::EndNotAfterStart {
                start: self.start.clone(),
                end: self.end.clone(),
            });
        }
        Ok((start, end))
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// `end - start` in hours, for valid segments only
    pub fn duration_hours(&self) -> Option<f64> {
        self.validate()
            .ok()
            .map(|(start, end)| (end - start).num_minutes() as f64 / 60.0)
    }

    /// Explicit total if one was set, otherwise the clock duration
    pub fn effective_hours(&self) -> f64 {
        self.total
            .filter(|t| t.is_finite())
            .or_else(|| self.duration_hours())
            .unwrap_or(0.0)
    }

    pub fn to_work_shift(&self) -> WorkShift {
        WorkShift {
            id: self.id.clone(),
            start_time: Some(self.start.clone()),
            end_time: Some(self.end.clone()),
            hours: Some(self.effective_hours()),
        }
    }

    /// Feed shifts may carry full timestamps; they are shown as `HH:MM`
    pub fn from_work_shift(shift: &WorkShift) -> Self {
        let clock = |raw: &Option<String>| {
            raw.as_deref()
                .map(|s| parse_clock(s).map(format_hhmm).unwrap_or_else(|| s.to_string()))
                .unwrap_or_default()
        };
        Self {
            id: shift.id.clone(),
            start: clock(&shift.start_time),
            end: clock(&shift.end_time),
            total: shift.hours,
            description: None,
        }
    }
}

/// Sum of effective hours over valid segments
pub fn segments_total(segments: &[HourSegment]) -> f64 {
    segments
        .iter()
        .filter(|s| s.is_valid())
        .map(HourSegment::effective_hours)
        .sum()
}

/// Hours of a feed shift: explicit value, else positive clock difference
pub fn shift_hours(shift: &WorkShift) -> Option<f64> {
    if let Some(hours) = shift.hours.filter(|h| h.is_finite()) {
        return Some(hours);
    }
    let start = parse_clock(shift.start_time.as_deref()?)?;
    let end = parse_clock(shift.end_time.as_deref()?)?;
    let hours = (end - start).num_minutes() as f64 / 60.0;
    (hours > 0.0).then_some(hours)
}

fn parse_hhmm(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M").ok()
}

/// Clock time from `HH:MM`, `HH:MM:SS` or a full timestamp
pub fn parse_clock(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.time()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
                .ok()
                .map(|dt| dt.time())
        })
}

pub fn format_hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
