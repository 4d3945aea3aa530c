//! Defensive normalization of raw reservation records.
//!
//! The upstream dataset is produced by a batch job we only partially trust.
//! Each record is coerced independently into a [`Reservation`]; a record that
//! cannot be interpreted is replaced by a fallback. The output always has the
//! input's length.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Map, Value};

use crate::error::RecordError;
use crate::types::{FoodOrder, Metadata, OriginalData, Reservation};

/// Client name used when the upstream record has none.
pub const UNKNOWN_CLIENT: &str = "Unknown";

const RECOGNIZED_FIELDS: [&str; 8] = [
    "client_name",
    "date",
    "number_of_guests",
    "food_ordered",
    "special_requests",
    "preferences",
    "is_vip",
    "original_data",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Outcome of normalizing one raw record.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Every field was interpreted from the record.
    Clean(Reservation),
    /// The record was unusable and has been replaced by a fallback.
    Recovered {
        reservation: Reservation,
        error: RecordError,
    },
}

impl Normalized {
    #[must_use]
    pub fn reservation(&self) -> &Reservation {
        match self {
            Normalized::Clean(r) | Normalized::Recovered { reservation: r, .. } => r,
        }
    }

    #[must_use]
    pub fn into_reservation(self) -> Reservation {
        match self {
            Normalized::Clean(r) | Normalized::Recovered { reservation: r, .. } => r,
        }
    }

    #[must_use]
    pub fn is_recovered(&self) -> bool {
        matches!(self, Normalized::Recovered { .. })
    }
}

/// Normalizes one raw record, using the current time for a fallback date.
#[must_use]
pub fn normalize(raw: &Value) -> Reservation {
    normalize_record(raw, Utc::now().naive_utc()).into_reservation()
}

/// Normalizes one raw record; `now` becomes the date of a fallback record.
#[must_use]
pub fn normalize_record(raw: &Value, now: NaiveDateTime) -> Normalized {
    match try_normalize(raw) {
        Ok(reservation) => Normalized::Clean(reservation),
        Err(error) => Normalized::Recovered {
            reservation: fallback_record(raw, now),
            error,
        },
    }
}

/// Normalizes a whole batch. Output length always equals input length.
#[must_use]
pub fn normalize_batch(raw: &[Value]) -> Vec<Reservation> {
    normalize_batch_detailed(raw, Utc::now().naive_utc())
        .into_iter()
        .map(Normalized::into_reservation)
        .collect()
}

/// Like [`normalize_batch`] but keeps the per-record outcome.
///
/// Recovered records are logged at `warn` with their position in the batch.
#[must_use]
pub fn normalize_batch_detailed(raw: &[Value], now: NaiveDateTime) -> Vec<Normalized> {
    raw.iter()
        .enumerate()
        .map(|(index, record)| {
            let outcome = normalize_record(record, now);
            if let Normalized::Recovered { reservation, error } = &outcome {
                tracing::warn!(
                    index,
                    client = %reservation.client_name,
                    error = %error,
                    "reservation record unusable, substituted fallback"
                );
            }
            outcome
        })
        .collect()
}

/// Reads the envelope's `metadata` object leniently.
#[must_use]
pub fn normalize_metadata(raw: Option<&Value>) -> Metadata {
    let Some(fields) = raw.and_then(Value::as_object) else {
        return Metadata::default();
    };
    Metadata {
        processed_at: fields.get("processed_at").and_then(parse_date_value),
        input_file: fields
            .get("input_file")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

fn try_normalize(raw: &Value) -> Result<Reservation, RecordError> {
    let fields = raw.as_object().ok_or(RecordError::NotAnObject)?;

    let date_value = fields
        .get("date")
        .filter(|v| !v.is_null())
        .ok_or(RecordError::MissingDate)?;
    let mut date =
        parse_date_value(date_value).ok_or_else(|| RecordError::InvalidDate(date_value.to_string()))?;

    // A date-only value plus a separate `time` field describes one instant.
    if is_date_only(date_value) {
        if let Some(time) = fields.get("time").and_then(Value::as_str).and_then(parse_time) {
            date = date.date().and_time(time);
        }
    }

    let extra: Map<String, Value> = fields
        .iter()
        .filter(|(key, _)| !RECOGNIZED_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(Reservation {
        client_name: client_name(raw),
        date,
        number_of_guests: fields.get("number_of_guests").map_or(0, coerce_count),
        food_ordered: food_orders(fields.get("food_ordered")),
        special_requests: string_list(fields.get("special_requests")),
        preferences: string_list(fields.get("preferences")),
        is_vip: fields
            .get("is_vip")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        original_data: fields
            .get("original_data")
            .cloned()
            .map(OriginalData::new)
            .unwrap_or_default(),
        extra,
    })
}

/// The minimal safe record substituted for an unusable one.
fn fallback_record(raw: &Value, now: NaiveDateTime) -> Reservation {
    Reservation {
        client_name: client_name(raw),
        date: now,
        number_of_guests: 0,
        food_ordered: Vec::new(),
        special_requests: Vec::new(),
        preferences: Vec::new(),
        is_vip: false,
        original_data: OriginalData::default(),
        extra: Map::new(),
    }
}

fn client_name(raw: &Value) -> String {
    raw.get("client_name")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

/// Parses a date-like JSON value.
///
/// Strings may be RFC 3339 (converted to UTC), naive ISO date-times with or
/// without fractional seconds, or a bare `YYYY-MM-DD` (midnight). Integers
/// are Unix epoch milliseconds.
#[must_use]
pub fn parse_date_value(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.naive_utc()),
        _ => None,
    }
}

/// String form of [`parse_date_value`].
#[must_use]
pub fn parse_date_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

fn is_date_only(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").is_ok())
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Coerces a numeric-like value into a non-negative count.
///
/// Floats truncate toward zero, strings contribute their leading digits
/// (`"4 guests"` → 4). Negatives and anything else become 0.
#[must_use]
pub fn coerce_count(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n.as_u64().map_or_else(
            || n.as_f64().map_or(0, float_to_count),
            |u| u32::try_from(u).unwrap_or(u32::MAX),
        ),
        Value::String(s) => {
            let digits: String = s
                .trim()
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            digits
                .parse::<u64>()
                .map_or(0, |u| u32::try_from(u).unwrap_or(u32::MAX))
        }
        _ => 0,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_to_count(f: f64) -> u32 {
    if f.is_finite() && f > 0.0 {
        f.trunc().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

fn coerce_price(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|p| p.is_finite() && *p >= 0.0).unwrap_or(0.0)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn food_orders(value: Option<&Value>) -> Vec<FoodOrder> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|entry| {
            let fields = entry.as_object()?;
            let Some(item) = fields.get("item").and_then(Value::as_str) else {
                tracing::debug!(entry = %entry, "skipping food order without an item name");
                return None;
            };
            Some(FoodOrder {
                item: item.to_string(),
                quantity: fields.get("quantity").map_or(0, coerce_count),
                price: fields.get("price").map_or(0.0, coerce_price),
                dietary_tags: string_list(fields.get("dietary_tags")),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
