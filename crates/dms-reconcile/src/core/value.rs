//! SQL value types shared by both sides of a reconciliation.
//!
//! Values read from the source and target drivers land in [`SqlValue`]. The
//! two drivers rarely agree on representation for the same logical datum
//! (an Oracle `NUMBER` arrives as a decimal, the migrated PostgreSQL `int8`
//! as an integer, a text key may come back as `numeric`), so equality is
//! decided on a canonical form rather than on the enum variant.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Duration, DurationRound, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike,
};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Owned SQL cell value.
///
/// Integer widths are widened to `I64` on read; the comparison never needs
/// to know the declared width.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
}

impl SqlValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// True for values that are numbers on the wire.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SqlValue::I64(_) | SqlValue::F64(_) | SqlValue::Decimal(_)
        )
    }

    /// Canonical textual form used for equality and key alignment.
    ///
    /// Returns `None` for NULL. Rules:
    /// - numbers: plain decimal notation, no trailing zeros (`1.50` -> `1.5`)
    /// - booleans: `1` / `0`
    /// - text: CRLF folded to LF, trailing blanks trimmed (CHAR padding)
    /// - UUIDs: lower-case hyphenated
    /// - temporal: ISO 8601, rounded half up to microseconds
    /// - bytes: lower-case hex
    #[must_use]
    pub fn canonical(&self) -> Option<String> {
        let s = match self {
            SqlValue::Null => return None,
            SqlValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            SqlValue::I64(v) => v.to_string(),
            SqlValue::F64(v) => canonical_f64(*v),
            SqlValue::Decimal(d) => canonical_decimal(*d),
            SqlValue::Text(s) => s.replace("\r\n", "\n").trim_end_matches(' ').to_string(),
            SqlValue::Bytes(b) => hex::encode(b),
            SqlValue::Uuid(u) => u.hyphenated().to_string(),
            SqlValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            SqlValue::Time(t) => round_time(*t).format("%H:%M:%S%.6f").to_string(),
            SqlValue::DateTime(dt) => round_micros(*dt)
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            SqlValue::DateTimeOffset(dt) => round_micros(*dt)
                .naive_utc()
                .format("%Y-%m-%dT%H:%M:%S%.6fZ")
                .to_string(),
        };
        Some(s)
    }

    /// Value equality across driver representations.
    ///
    /// Same canonical form is equal. When the canonical forms differ, a
    /// second pass bridges the representation gaps drivers actually
    /// produce: number vs numeric text, date vs midnight timestamp, and UUID
    /// vs UUID text. Two NULLs are equal; NULL never equals a value.
    #[must_use]
    pub fn canonical_eq(&self, other: &SqlValue) -> bool {
        match (self.canonical(), other.canonical()) {
            (None, None) => return true,
            (None, Some(_)) | (Some(_), None) => return false,
            (Some(a), Some(b)) if a == b => return true,
            _ => {}
        }

        match (self, other) {
            (n, SqlValue::Text(t)) | (SqlValue::Text(t), n) if n.is_numeric() => {
                match (n.as_decimal(), Decimal::from_str(t.trim())) {
                    (Some(a), Ok(b)) => a.normalize() == b.normalize(),
                    _ => false,
                }
            }
            (SqlValue::Date(d), SqlValue::DateTime(dt))
            | (SqlValue::DateTime(dt), SqlValue::Date(d)) => {
                dt.time() == NaiveTime::MIN && dt.date() == *d
            }
            (SqlValue::Uuid(u), SqlValue::Text(t)) | (SqlValue::Text(t), SqlValue::Uuid(u)) => {
                Uuid::parse_str(t.trim()).map(|p| p == *u).unwrap_or(false)
            }
            _ => false,
        }
    }

    /// Numeric value as a decimal, when representable.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            SqlValue::I64(v) => Some(Decimal::from(*v)),
            SqlValue::F64(v) => Decimal::try_from(*v).ok(),
            SqlValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

fn canonical_decimal(d: Decimal) -> String {
    let n = d.normalize();
    if n.is_zero() {
        "0".to_string()
    } else {
        n.to_string()
    }
}

fn round_micros<T: DurationRound + Copy>(v: T) -> T {
    v.duration_round(Duration::microseconds(1)).unwrap_or(v)
}

fn round_time(t: NaiveTime) -> NaiveTime {
    let rem = i64::from(t.nanosecond() % 1_000);
    if rem >= 500 {
        t + Duration::nanoseconds(1_000 - rem)
    } else {
        t - Duration::nanoseconds(rem)
    }
}

fn canonical_f64(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    match Decimal::try_from(v) {
        Ok(d) => canonical_decimal(d),
        Err(_) => v.to_string(),
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical() {
            Some(s) => f.write_str(&s),
            None => f.write_str("NULL"),
        }
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.canonical() {
            Some(s) => serializer.serialize_str(&s),
            None => serializer.serialize_none(),
        }
    }
}

// From implementations for common types
impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::I64(v as i64)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

/// `real` / `float4` values keep their shortest decimal form; widening the
/// binary value to `f64` would add digits the source never had.
impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        match Decimal::from_str(&v.to_string()) {
            Ok(d) => SqlValue::Decimal(d),
            Err(_) => SqlValue::F64(f64::from(v)),
        }
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> SqlValue {
        SqlValue::Decimal(Decimal::from_str(s).unwrap())
    }

    #[test]
    fn test_null_semantics() {
        assert!(SqlValue::Null.canonical_eq(&SqlValue::Null));
        assert!(!SqlValue::Null.canonical_eq(&SqlValue::I64(0)));
        assert!(!SqlValue::Text(String::new()).canonical_eq(&SqlValue::Null));
    }

    #[test]
    fn test_numeric_representations_match() {
        assert!(SqlValue::I64(42).canonical_eq(&dec("42.000")));
        assert!(dec("1.50").canonical_eq(&SqlValue::F64(1.5)));
        assert!(SqlValue::F64(0.1).canonical_eq(&dec("0.1")));
        assert!(dec("-0.00").canonical_eq(&SqlValue::I64(0)));
        assert!(!SqlValue::I64(42).canonical_eq(&dec("42.01")));
    }

    #[test]
    fn test_number_vs_text_bridged() {
        assert!(dec("100").canonical_eq(&SqlValue::from("100.00")));
        assert!(SqlValue::from(" 7 ").canonical_eq(&SqlValue::I64(7)));
        assert!(!SqlValue::from("seven").canonical_eq(&SqlValue::I64(7)));
    }

    #[test]
    fn test_text_vs_text_is_exact() {
        // Leading zeros are significant in character data.
        assert!(!SqlValue::from("007").canonical_eq(&SqlValue::from("7")));
        assert!(SqlValue::from("a\r\nb").canonical_eq(&SqlValue::from("a\nb")));
        assert!(!SqlValue::from("A").canonical_eq(&SqlValue::from("a")));
    }

    #[test]
    fn test_char_padding_ignored() {
        assert!(SqlValue::from("ABC   ").canonical_eq(&SqlValue::from("ABC")));
        assert!(!SqlValue::from("  ABC").canonical_eq(&SqlValue::from("ABC")));
    }

    #[test]
    fn test_timestamp_canonical_form() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_micro_opt(8, 30, 0, 1500)
            .unwrap();
        assert_eq!(
            SqlValue::DateTime(dt).canonical().unwrap(),
            "2024-03-01T08:30:00.001500"
        );
    }

    #[test]
    fn test_sub_microsecond_rounds_half_up() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let up = date.and_hms_nano_opt(8, 30, 0, 1_000_500).unwrap();
        let down = date.and_hms_nano_opt(8, 30, 0, 1_000_499).unwrap();
        assert_eq!(
            SqlValue::DateTime(up).canonical().unwrap(),
            "2024-03-01T08:30:00.001001"
        );
        assert_eq!(
            SqlValue::DateTime(down).canonical().unwrap(),
            "2024-03-01T08:30:00.001000"
        );

        // datetime2(7) .9999995 carries into the next second
        let carry = date.and_hms_nano_opt(8, 30, 0, 999_999_500).unwrap();
        let next = date.and_hms_opt(8, 30, 1).unwrap();
        assert!(SqlValue::DateTime(carry).canonical_eq(&SqlValue::DateTime(next)));

        let t = NaiveTime::from_hms_nano_opt(23, 0, 0, 500).unwrap();
        assert_eq!(SqlValue::Time(t).canonical().unwrap(), "23:00:00.000001");
    }

    #[test]
    fn test_offset_timestamp_rounds_before_utc() {
        let dt = DateTime::parse_from_rfc3339("2024-03-01T10:30:00.0000005+02:00").unwrap();
        assert_eq!(
            SqlValue::DateTimeOffset(dt).canonical().unwrap(),
            "2024-03-01T08:30:00.000001Z"
        );
    }

    #[test]
    fn test_real_keeps_shortest_form() {
        let real = SqlValue::from(0.1f32);
        assert!(real.canonical_eq(&dec("0.1")));
        assert_eq!(real.canonical().unwrap(), "0.1");
        assert!(SqlValue::from(2.5f32).canonical_eq(&SqlValue::F64(2.5)));
        assert!(!SqlValue::from(0.1f32).canonical_eq(&dec("0.10001")));
        assert!(matches!(SqlValue::from(f32::NAN), SqlValue::F64(v) if v.is_nan()));
    }

    #[test]
    fn test_bool_matches_number() {
        assert!(SqlValue::Bool(true).canonical_eq(&SqlValue::I64(1)));
        assert!(SqlValue::Bool(false).canonical_eq(&dec("0")));
    }

    #[test]
    fn test_date_vs_midnight_timestamp() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let midnight = d.and_hms_opt(0, 0, 0).unwrap();
        let noon = d.and_hms_opt(12, 0, 0).unwrap();
        assert!(SqlValue::Date(d).canonical_eq(&SqlValue::DateTime(midnight)));
        assert!(!SqlValue::DateTime(noon).canonical_eq(&SqlValue::Date(d)));
    }

    #[test]
    fn test_uuid_vs_text() {
        let u = Uuid::parse_str("6f1c2a1e-8d8b-4c35-9a55-0c1f7b6f8d11").unwrap();
        assert!(SqlValue::Uuid(u).canonical_eq(&SqlValue::from("6F1C2A1E-8D8B-4C35-9A55-0C1F7B6F8D11")));
    }

    #[test]
    fn test_display() {
        assert_eq!(SqlValue::Null.to_string(), "NULL");
        assert_eq!(dec("12.3400").to_string(), "12.34");
        assert_eq!(SqlValue::Bytes(vec![0xde, 0xad]).to_string(), "dead");
    }

    #[test]
    fn test_from_option() {
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(5i64)), SqlValue::I64(5));
    }
}
