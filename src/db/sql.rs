//! Column conversions for the ordinal enumerations.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::models::{DiagramType, RelationType, Role};

macro_rules! ordinal_column {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(i64::from(*self)))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    let raw = i64::column_result(value)?;
                    <$ty>::try_from(raw).map_err(|_| FromSqlError::OutOfRange(raw))
                }
            }
        )+
    };
}

ordinal_column!(Role, RelationType, DiagramType);
