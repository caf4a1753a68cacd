//! tiberius cell data to [`SqlValue`].

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use tiberius::numeric::Numeric;
use tiberius::{ColumnData, FromSql, Row};

use crate::core::SqlValue;
use crate::drivers::conversion_error;
use crate::error::{DbSide, Result};

/// Convert every cell of a row, in column order.
pub(super) fn row_values(row: Row, columns: &[String], side: DbSide) -> Result<Vec<SqlValue>> {
    row.into_iter()
        .enumerate()
        .map(|(idx, data)| {
            cell_value(&data).map_err(|e| {
                let name = columns.get(idx).map(String::as_str).unwrap_or("?");
                conversion_error(side, name, e)
            })
        })
        .collect()
}

/// Convert a single cell. A non-null cell never becomes NULL: it either
/// converts or the error reaches the caller.
pub(super) fn cell_value(data: &ColumnData<'static>) -> tiberius::Result<SqlValue> {
    let value = match data {
        ColumnData::Bit(v) => (*v).into(),
        ColumnData::U8(v) => v.map(i64::from).into(),
        ColumnData::I16(v) => v.map(i64::from).into(),
        ColumnData::I32(v) => v.map(i64::from).into(),
        ColumnData::I64(v) => (*v).into(),
        ColumnData::F32(v) => (*v).into(),
        ColumnData::F64(v) => (*v).into(),
        ColumnData::Guid(v) => (*v).into(),
        ColumnData::String(v) => v.as_ref().map(|s| s.to_string()).into(),
        ColumnData::Binary(v) => v
            .as_ref()
            .map(|b| SqlValue::Bytes(b.to_vec()))
            .unwrap_or(SqlValue::Null),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|x| SqlValue::Text(x.clone().into_owned().into_string()))
            .unwrap_or(SqlValue::Null),
        ColumnData::Numeric(v) => v.map(numeric_value).unwrap_or(SqlValue::Null),
        ColumnData::Date(_) => from_sql::<NaiveDate>(data)?.into(),
        ColumnData::Time(_) => from_sql::<NaiveTime>(data)?
            .map(SqlValue::Time)
            .unwrap_or(SqlValue::Null),
        ColumnData::DateTimeOffset(_) => from_sql::<DateTime<FixedOffset>>(data)?
            .map(SqlValue::DateTimeOffset)
            .unwrap_or(SqlValue::Null),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            from_sql::<NaiveDateTime>(data)?.into()
        }
    };
    Ok(value)
}

/// DECIMAL(38, s) holds more digits than [`Decimal`]; those values are kept
/// as their exact decimal text.
fn numeric_value(n: Numeric) -> SqlValue {
    match Decimal::try_from_i128_with_scale(n.value(), u32::from(n.scale())) {
        Ok(d) => SqlValue::Decimal(d),
        Err(_) => SqlValue::Text(numeric_text(n.value(), n.scale())),
    }
}

fn numeric_text(value: i128, scale: u8) -> String {
    let digits = value.unsigned_abs().to_string();
    let scale = usize::from(scale);
    let sign = if value < 0 { "-" } else { "" };
    if scale == 0 {
        return format!("{}{}", sign, digits);
    }
    let padded = format!("{:0>width$}", digits, width = scale + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    format!("{}{}.{}", sign, int_part, frac_part)
}

fn from_sql<'a, T: FromSql<'a>>(data: &'a ColumnData<'static>) -> tiberius::Result<Option<T>> {
    T::from_sql(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::str::FromStr;
    use uuid::Uuid;

    #[test]
    fn test_integers_widen() {
        assert_eq!(cell_value(&ColumnData::U8(Some(7))).unwrap(), SqlValue::I64(7));
        assert_eq!(cell_value(&ColumnData::I16(Some(-2))).unwrap(), SqlValue::I64(-2));
        assert_eq!(cell_value(&ColumnData::I32(Some(40))).unwrap(), SqlValue::I64(40));
        assert_eq!(cell_value(&ColumnData::I64(None)).unwrap(), SqlValue::Null);
    }

    #[test]
    fn test_numeric_within_decimal_range() {
        let n = Numeric::new_with_scale(12345, 2);
        assert_eq!(
            cell_value(&ColumnData::Numeric(Some(n))).unwrap(),
            SqlValue::Decimal(Decimal::from_str("123.45").unwrap())
        );
        assert_eq!(cell_value(&ColumnData::Numeric(None)).unwrap(), SqlValue::Null);
    }

    #[test]
    fn test_wide_numeric_kept_as_exact_text() {
        let n = Numeric::new_with_scale(10i128.pow(30) + 7, 0);
        let value = cell_value(&ColumnData::Numeric(Some(n))).unwrap();
        assert_eq!(value, SqlValue::Text("1000000000000000000000000000007".into()));

        let n = Numeric::new_with_scale(-(10i128.pow(30) + 7), 3);
        let value = cell_value(&ColumnData::Numeric(Some(n))).unwrap();
        assert_eq!(value, SqlValue::Text("-1000000000000000000000000000.007".into()));
    }

    #[test]
    fn test_numeric_text_pads_fraction() {
        assert_eq!(numeric_text(5, 3), "0.005");
        assert_eq!(numeric_text(-5, 1), "-0.5");
        assert_eq!(numeric_text(1200, 2), "12.00");
        assert_eq!(numeric_text(0, 0), "0");
    }

    #[test]
    fn test_real_matches_decimal_source() {
        let value = cell_value(&ColumnData::F32(Some(0.1))).unwrap();
        assert!(value.canonical_eq(&SqlValue::Decimal(Decimal::from_str("0.1").unwrap())));
    }

    #[test]
    fn test_mismatched_cell_is_an_error() {
        assert!(from_sql::<NaiveDate>(&ColumnData::I32(Some(1))).is_err());
    }

    #[test]
    fn test_text_and_binary() {
        assert_eq!(
            cell_value(&ColumnData::String(Some(Cow::Borrowed("Smith")))).unwrap(),
            SqlValue::Text("Smith".into())
        );
        assert_eq!(
            cell_value(&ColumnData::Binary(Some(Cow::Owned(vec![1, 2])))).unwrap(),
            SqlValue::Bytes(vec![1, 2])
        );
        assert_eq!(cell_value(&ColumnData::String(None)).unwrap(), SqlValue::Null);
    }

    #[test]
    fn test_bit_and_guid() {
        assert_eq!(
            cell_value(&ColumnData::Bit(Some(true))).unwrap(),
            SqlValue::Bool(true)
        );
        let id = Uuid::nil();
        assert_eq!(cell_value(&ColumnData::Guid(Some(id))).unwrap(), SqlValue::Uuid(id));
    }
}
