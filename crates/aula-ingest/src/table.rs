//! Typed event table.
//!
//! Normalization is the strict half of the two-phase decode: raw records
//! stay loosely typed so malformed rows can be filtered on string content,
//! then the survivors are coerced into [`EventRow`] with a fixed schema.

use crate::enrich;
use crate::{Error, Result};
use aula_core::{fields, RawRecord};
use chrono::{DateTime, NaiveDate};
use std::collections::BTreeMap;

/// One normalized learning-activity event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    /// Completion percentage.
    pub percentage: f64,

    /// Event time, Unix seconds.
    pub timestamp: f64,

    /// Seconds spent on the unit, when the batch carried the column.
    pub time_spent: Option<f64>,

    /// UTC calendar day of `timestamp`.
    pub day: NaiveDate,

    /// Path-like content identifier.
    pub url: String,

    /// Author segment of `url`; `"anonymous"` for unstructured urls.
    pub author: String,

    /// Unit segment of `url`; the whole url for unstructured urls.
    pub unit: String,

    /// Content/Evaluation tag. `None` until [`enrich::add_unit_type`]
    /// classifies the table.
    pub unit_type: Option<String>,

    /// Remaining payload fields, preserved as text.
    pub extra: BTreeMap<String, String>,
}

/// Normalized, timestamp-ordered event collection.
///
/// Owned by a single ingestion run; immutable after enrichment except for
/// explicit [`enrich::add_unit_type`] calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTable {
    rows: Vec<EventRow>,
}

impl EventTable {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in timestamp order.
    pub fn rows(&self) -> &[EventRow] {
        &self.rows
    }

    /// Mutable access for enrichment passes.
    pub(crate) fn rows_mut(&mut self) -> &mut [EventRow] {
        &mut self.rows
    }

    /// Consume the table, yielding its rows.
    pub fn into_rows(self) -> Vec<EventRow> {
        self.rows
    }
}

/// Normalize accumulated raw records into a typed table.
///
/// Rows with a blank or absent `percentage` are dropped first (legacy
/// batches carry them), the `_id`/`state` bookkeeping columns go next,
/// then the numeric columns are coerced, the `day` bucket and author/unit
/// columns are derived, and the rows are stable-sorted ascending by
/// `timestamp` so ties keep file order.
///
/// Coercion failure on a surviving row is fatal: the blank-`percentage`
/// filter already removed the only legitimately non-numeric case.
pub fn normalize(records: Vec<RawRecord>) -> Result<EventTable> {
    let mut rows = Vec::with_capacity(records.len());
    for mut record in records {
        if record.get(fields::PERCENTAGE).is_none_or(str::is_empty) {
            continue;
        }
        record.remove(fields::ID);
        record.remove(fields::STATE);
        rows.push(typed_row(record)?);
    }

    let mut table = EventTable { rows };
    enrich::add_author_unit(&mut table);
    table.rows.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    Ok(table)
}

fn typed_row(mut record: RawRecord) -> Result<EventRow> {
    let percentage = require_float(&mut record, fields::PERCENTAGE)?;
    let timestamp = require_float(&mut record, fields::TIMESTAMP)?;
    let time_spent = match record.remove(fields::TIME_SPENT) {
        Some(text) => Some(parse_float(fields::TIME_SPENT, &text)?),
        None => None,
    };
    let url = record.remove(fields::URL).ok_or(Error::MissingColumn {
        column: fields::URL,
    })?;
    // Empty means the payload carried a null tag; classification treats
    // both the same way.
    let unit_type = record.remove(fields::UNIT_TYPE).filter(|t| !t.is_empty());
    let day = day_of(timestamp)?;

    Ok(EventRow {
        percentage,
        timestamp,
        time_spent,
        day,
        url,
        author: String::new(),
        unit: String::new(),
        unit_type,
        extra: record.into_map(),
    })
}

fn require_float(record: &mut RawRecord, column: &'static str) -> Result<f64> {
    let text = record
        .remove(column)
        .ok_or(Error::MissingColumn { column })?;
    parse_float(column, &text)
}

fn parse_float(column: &'static str, text: &str) -> Result<f64> {
    text.trim().parse().map_err(|_| Error::MalformedColumn {
        column,
        value: text.to_string(),
    })
}

/// UTC calendar day for a Unix-seconds timestamp, floored to day.
fn day_of(timestamp: f64) -> Result<NaiveDate> {
    DateTime::from_timestamp(timestamp.floor() as i64, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| Error::MalformedColumn {
            column: fields::TIMESTAMP,
            value: timestamp.to_string(),
        })
}
