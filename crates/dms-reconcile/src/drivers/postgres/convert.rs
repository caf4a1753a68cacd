//! tokio-postgres row data to [`SqlValue`].

use std::error::Error;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use tokio_postgres::types::{FromSql, Type};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::core::SqlValue;
use crate::drivers::conversion_error;
use crate::error::{DbSide, Result};

/// Convert every cell of a row, in column order.
pub(super) fn row_values(row: &Row, side: DbSide) -> Result<Vec<SqlValue>> {
    (0..row.len()).map(|idx| cell_value(row, idx, side)).collect()
}

fn get<'a, T>(row: &'a Row, idx: usize) -> std::result::Result<Option<T>, tokio_postgres::Error>
where
    T: FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx)
}

/// Convert one cell based on its declared type. Types without a mapping are
/// read as text; a cell that cannot be read at all is a query error.
fn cell_value(row: &Row, idx: usize, side: DbSide) -> Result<SqlValue> {
    let column = &row.columns()[idx];
    let ty = column.type_();
    let fail = |e: tokio_postgres::Error| {
        conversion_error(side, column.name(), format!("{} ({})", ty, e))
    };

    let value = match *ty {
        Type::BOOL => get::<bool>(row, idx).map_err(fail)?.into(),
        Type::INT2 => get::<i16>(row, idx).map_err(fail)?.map(i64::from).into(),
        Type::INT4 => get::<i32>(row, idx).map_err(fail)?.map(i64::from).into(),
        Type::INT8 => get::<i64>(row, idx).map_err(fail)?.into(),
        Type::OID => get::<u32>(row, idx).map_err(fail)?.map(i64::from).into(),
        Type::FLOAT4 => get::<f32>(row, idx).map_err(fail)?.into(),
        Type::FLOAT8 => get::<f64>(row, idx).map_err(fail)?.into(),
        Type::NUMERIC => match get::<Decimal>(row, idx) {
            Ok(v) => v.into(),
            // NaN, infinities and more than 28 significant digits
            Err(_) => get::<NumericText>(row, idx)
                .map_err(fail)?
                .map(|n| SqlValue::Text(n.0))
                .unwrap_or(SqlValue::Null),
        },
        Type::UUID => get::<Uuid>(row, idx).map_err(fail)?.into(),
        Type::DATE => get::<NaiveDate>(row, idx).map_err(fail)?.into(),
        Type::TIME => get::<NaiveTime>(row, idx)
            .map_err(fail)?
            .map(SqlValue::Time)
            .unwrap_or(SqlValue::Null),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, idx).map_err(fail)?.into(),
        Type::TIMESTAMPTZ => get::<DateTime<FixedOffset>>(row, idx)
            .map_err(fail)?
            .map(SqlValue::DateTimeOffset)
            .unwrap_or(SqlValue::Null),
        Type::BYTEA => get::<Vec<u8>>(row, idx)
            .map_err(fail)?
            .map(SqlValue::Bytes)
            .unwrap_or(SqlValue::Null),
        Type::JSON | Type::JSONB => get::<serde_json::Value>(row, idx)
            .map_err(fail)?
            .map(|v| SqlValue::Text(v.to_string()))
            .unwrap_or(SqlValue::Null),
        _ => get::<String>(row, idx).map_err(fail)?.into(),
    };
    Ok(value)
}

/// Exact text of a binary `numeric` value.
struct NumericText(String);

impl<'a> FromSql<'a> for NumericText {
    fn from_sql(
        _: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn Error + Sync + Send>> {
        numeric_text(raw)
            .map(NumericText)
            .ok_or_else(|| "malformed numeric value".into())
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

/// Decode the binary `numeric` wire format: digit count, weight, sign and
/// display scale, then base-10000 digit groups.
fn numeric_text(raw: &[u8]) -> Option<String> {
    let word = |i: usize| raw.get(i..i + 2).map(|b| u16::from_be_bytes([b[0], b[1]]));

    let ndigits = usize::from(word(0)?);
    let weight = i32::from(word(2)? as i16);
    let sign = word(4)?;
    let dscale = usize::from(word(6)?);

    let negative = match sign {
        0x0000 => false,
        0x4000 => true,
        0xC000 => return Some("NaN".to_string()),
        0xD000 => return Some("Infinity".to_string()),
        0xF000 => return Some("-Infinity".to_string()),
        _ => return None,
    };

    let digits = (0..ndigits)
        .map(|i| word(8 + 2 * i))
        .collect::<Option<Vec<u16>>>()?;
    let group = |i: i32| {
        usize::try_from(i)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut text = String::new();
    if negative {
        text.push('-');
    }
    if weight < 0 {
        text.push('0');
    } else {
        text.push_str(&group(0).to_string());
        for i in 1..=weight {
            text.push_str(&format!("{:04}", group(i)));
        }
    }

    if dscale > 0 {
        let mut frac = String::new();
        let mut i = weight + 1;
        while frac.len() < dscale {
            frac.push_str(&format!("{:04}", group(i)));
            i += 1;
        }
        frac.truncate(dscale);
        text.push('.');
        text.push_str(&frac);
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(weight: i16, sign: u16, dscale: u16, digits: &[u16]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&(digits.len() as u16).to_be_bytes());
        raw.extend_from_slice(&weight.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&dscale.to_be_bytes());
        for d in digits {
            raw.extend_from_slice(&d.to_be_bytes());
        }
        raw
    }

    #[test]
    fn test_numeric_beyond_decimal_range() {
        // 10^30 + 7
        let raw = numeric(7, 0x0000, 0, &[100, 0, 0, 0, 0, 0, 0, 7]);
        assert_eq!(
            numeric_text(&raw).unwrap(),
            "1000000000000000000000000000007"
        );
    }

    #[test]
    fn test_numeric_fractions_and_sign() {
        let raw = numeric(1, 0x0000, 3, &[1, 2345, 6780]);
        assert_eq!(numeric_text(&raw).unwrap(), "12345.678");
        assert_eq!(numeric_text(&numeric(-1, 0x4000, 1, &[5000])).unwrap(), "-0.5");
        assert_eq!(numeric_text(&numeric(-2, 0x0000, 5, &[5000])).unwrap(), "0.00005");
        assert_eq!(numeric_text(&numeric(0, 0x0000, 2, &[])).unwrap(), "0.00");
        // trailing zero groups are not sent
        assert_eq!(numeric_text(&numeric(2, 0x0000, 0, &[12])).unwrap(), "1200000000");
    }

    #[test]
    fn test_numeric_special_values() {
        assert_eq!(numeric_text(&numeric(0, 0xC000, 0, &[])).unwrap(), "NaN");
        assert_eq!(numeric_text(&numeric(0, 0xF000, 0, &[])).unwrap(), "-Infinity");
    }

    #[test]
    fn test_malformed_numeric_rejected() {
        assert!(numeric_text(&[0, 2, 0, 0]).is_none());
        assert!(numeric_text(&numeric(0, 0x1234, 0, &[1])).is_none());
        assert!(NumericText::from_sql(&Type::NUMERIC, &[0, 1]).is_err());
        assert!(!NumericText::accepts(&Type::TEXT));
    }

    #[test]
    fn test_nan_is_not_null() {
        // Two NaN cells compare as equal text, never as a pair of NULLs.
        let raw = numeric(0, 0xC000, 0, &[]);
        let value = SqlValue::Text(NumericText::from_sql(&Type::NUMERIC, &raw).unwrap().0);
        assert!(!value.is_null());
        assert!(!value.canonical_eq(&SqlValue::Null));
    }
}
