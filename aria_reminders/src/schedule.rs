//! Structured schedules and their compact recurrence-expression encoding.
//!
//! A schedule without a year encodes to five fields,
//! `minute hour day month dow`. With a year it encodes to seven fields,
//! `0 minute hour day month dow Y-Y`, the leading seconds field fixed at zero
//! and the year written as a single-value range.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ReminderError, Result};

const ANY: &str = "*";

/// One schedule field: `*`, a number, or a range/list/step expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawField", into = "String")]
pub struct ScheduleField(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Number(i64),
    Text(String),
    Null,
}

impl ScheduleField {
    #[must_use]
    pub fn any() -> Self {
        Self(ANY.to_string())
    }

    pub fn new(value: &str) -> std::result::Result<Self, String> {
        let value = value.trim();
        if value.is_empty() {
            return Err("empty field".to_string());
        }
        if let Some(bad) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '*' | ',' | '-' | '/')))
        {
            return Err(format!("unexpected character '{bad}'"));
        }
        Ok(Self(value.to_string()))
    }

    #[must_use]
    pub fn is_any(&self) -> bool {
        self.0 == ANY
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parse_named(name: &'static str, value: &str) -> Result<Self> {
        Self::new(value).map_err(|reason| ReminderError::field(name, value, reason))
    }
}

impl Default for ScheduleField {
    fn default() -> Self {
        Self::any()
    }
}

impl TryFrom<RawField> for ScheduleField {
    type Error = String;

    fn try_from(raw: RawField) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawField::Number(n) if n >= 0 => Ok(Self(n.to_string())),
            RawField::Number(n) => Err(format!("negative value {n}")),
            RawField::Text(s) => Self::new(&s),
            RawField::Null => Ok(Self::any()),
        }
    }
}

impl From<ScheduleField> for String {
    fn from(field: ScheduleField) -> Self {
        field.0
    }
}

impl From<u32> for ScheduleField {
    fn from(n: u32) -> Self {
        Self(n.to_string())
    }
}

impl fmt::Display for ScheduleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// When a reminder repeats. Omitted fields default to `*`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub minute: ScheduleField,
    #[serde(default)]
    pub hour: ScheduleField,
    #[serde(default)]
    pub day: ScheduleField,
    #[serde(default)]
    pub month: ScheduleField,
    #[serde(default, alias = "day_of_week")]
    pub dow: ScheduleField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<ScheduleField>,
}

impl Schedule {
    /// Canonical form: a `*` year is dropped and a `Y-Y` year becomes `Y`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.year = match self.year {
            Some(year) if year.is_any() => None,
            Some(year) => Some(ScheduleField(collapse_year(year.as_str()))),
            None => None,
        };
        self
    }

    #[must_use]
    pub fn to_expression(&self) -> String {
        let five = format!(
            "{} {} {} {} {}",
            self.minute, self.hour, self.day, self.month, self.dow
        );
        match &self.year {
            None => five,
            Some(year) => format!("0 {five} {}", expand_year(year.as_str())),
        }
    }

    /// Decode a five- or seven-field expression.
    pub fn from_expression(expr: &str) -> Result<Self> {
        let parts: Vec<&str> = expr.split_whitespace().collect();
        let (fields, year) = match parts.as_slice() {
            [minute, hour, day, month, dow] => ([*minute, *hour, *day, *month, *dow], None),
            [seconds, minute, hour, day, month, dow, year] => {
                if *seconds != "0" {
                    return Err(ReminderError::expression(
                        expr,
                        "seconds field must be 0",
                    ));
                }
                (
                    [*minute, *hour, *day, *month, *dow],
                    Some(ScheduleField::parse_named("year", &collapse_year(year))?),
                )
            }
            _ => {
                return Err(ReminderError::expression(
                    expr,
                    format!("expected 5 or 7 fields, found {}", parts.len()),
                ));
            }
        };

        let [minute, hour, day, month, dow] = fields;
        Ok(Self {
            minute: ScheduleField::parse_named("minute", minute)?,
            hour: ScheduleField::parse_named("hour", hour)?,
            day: ScheduleField::parse_named("day", day)?,
            month: ScheduleField::parse_named("month", month)?,
            dow: ScheduleField::parse_named("dow", dow)?,
            year,
        })
    }
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn expand_year(year: &str) -> String {
    if is_number(year) {
        format!("{year}-{year}")
    } else {
        year.to_string()
    }
}

fn collapse_year(year: &str) -> String {
    match year.split_once('-') {
        Some((from, to)) if from == to && is_number(from) => from.to_string(),
        _ => year.to_string(),
    }
}
