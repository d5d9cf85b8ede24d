use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TaskError};

/// Longest accepted task name, in characters.
pub const NAME_MAX_CHARS: usize = 200;

/// Largest accepted number of integer digits in a cost (a `NUMERIC(10, 2)`).
pub const COST_MAX_INTEGER_DIGITS: u32 = 8;

/// Fractional digits kept for a cost.
pub const COST_SCALE: i64 = 2;

/// Wire and form format for due dates.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Non-negative decimal amount, always held at two fractional digits.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cost(BigDecimal);

impl Cost {
    pub fn zero() -> Self {
        Self(BigDecimal::zero().with_scale(COST_SCALE))
    }

    /// Build from the stored cents column. Negative amounts are rejected.
    pub fn from_cents(cents: i64) -> Result<Self> {
        if cents < 0 {
            return Err(TaskError::Validation("cost must not be negative".into()));
        }
        Ok(Self(BigDecimal::new(BigInt::from(cents), COST_SCALE)))
    }

    /// Whole cents, as stored in the database.
    pub fn cents(&self) -> Result<i64> {
        let (digits, _) = self.0.with_scale(COST_SCALE).into_bigint_and_exponent();
        digits
            .to_i64()
            .ok_or_else(|| TaskError::Validation(format!("cost {self} is out of range")))
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.with_scale(COST_SCALE))
    }
}

impl FromStr for Cost {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(TaskError::Validation("cost is required".into()));
        }
        if raw.starts_with('-') {
            return Err(TaskError::Validation("cost must not be negative".into()));
        }
        // BigDecimal also takes signs and exponents; a cost is plain digits.
        let plain = raw.bytes().any(|b| b.is_ascii_digit())
            && raw.bytes().all(|b| b.is_ascii_digit() || b == b'.')
            && raw.bytes().filter(|&b| b == b'.').count() <= 1;
        let value = BigDecimal::from_str(raw)
            .ok()
            .filter(|_| plain)
            .ok_or_else(|| TaskError::Validation(format!("cost '{raw}' is not a decimal number")))?;

        let (_, scale) = value.as_bigint_and_exponent();
        if scale > COST_SCALE {
            return Err(TaskError::Validation(format!(
                "cost '{raw}' has more than {COST_SCALE} decimal places"
            )));
        }
        if value >= BigDecimal::from(10_i64.pow(COST_MAX_INTEGER_DIGITS)) {
            return Err(TaskError::Validation(format!(
                "cost '{raw}' exceeds {COST_MAX_INTEGER_DIGITS} integer digits"
            )));
        }

        Ok(Self(value.with_scale(COST_SCALE)))
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost(self.0 + rhs.0)
    }
}

impl<'a> Sum<&'a Cost> for Cost {
    fn sum<I: Iterator<Item = &'a Cost>>(iter: I) -> Cost {
        iter.fold(Cost::zero(), |acc, cost| Cost(acc.0 + &cost.0))
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::zero(), Add::add)
    }
}

impl Serialize for Cost {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Cost {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub cost: Cost,
    pub due_date: NaiveDate,
    pub display_order: i64,
}

/// The user-editable fields of a task, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInput {
    pub name: String,
    pub cost: Cost,
    pub due_date: NaiveDate,
}

impl TaskInput {
    pub fn new(name: impl Into<String>, cost: Cost, due_date: NaiveDate) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            cost,
            due_date,
        })
    }

    /// Parse raw form/CLI strings into a validated input.
    pub fn parse(name: &str, cost: &str, due_date: &str) -> Result<Self> {
        Self::new(name, cost.parse()?, parse_due_date(due_date)?)
    }
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TaskError::Validation("name is required".into()));
    }
    let len = name.chars().count();
    if len > NAME_MAX_CHARS {
        return Err(TaskError::Validation(format!(
            "name is {len} characters long (max {NAME_MAX_CHARS})"
        )));
    }
    Ok(())
}

pub fn parse_due_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DUE_DATE_FORMAT).map_err(|_| {
        TaskError::Validation(format!("due date '{raw}' is not a valid YYYY-MM-DD date"))
    })
}

/// All tasks in display order, with their summed cost.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskListing {
    pub tasks: Vec<Task>,
    pub total: Cost,
}

impl TaskListing {
    pub fn new(tasks: Vec<Task>) -> Self {
        let total = tasks.iter().map(|t| &t.cost).sum();
        Self { tasks, total }
    }
}
