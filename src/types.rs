//! Logical column types and table descriptors.

use std::fmt;

use itertools::Itertools;

/// A row of textual fields as produced by a source. `None` is SQL null;
/// `Some("")` is a legitimate empty string.
pub type TextRow = Vec<Option<String>>;

/// PostgreSQL logical types this tool can encode.
///
/// Each tag names both an input grammar and a binary output layout; the
/// actual encoding lives in [`crate::binary::encode_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PgType {
    Int16,
    Int32,
    Int64,
    Float4,
    Float8,
    Bool,
    Text,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    MacAddr,
    Uuid,
    Json,
    Inet,
    Enum,
}

impl fmt::Display for PgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PgType::Int16 => "int2",
            PgType::Int32 => "int4",
            PgType::Int64 => "int8",
            PgType::Float4 => "float4",
            PgType::Float8 => "float8",
            PgType::Bool => "bool",
            PgType::Text => "text",
            PgType::Date => "date",
            PgType::Time => "time",
            PgType::Timestamp => "timestamp",
            PgType::TimestampTz => "timestamptz",
            PgType::MacAddr => "macaddr",
            PgType::Uuid => "uuid",
            PgType::Json => "json",
            PgType::Inet => "inet",
            PgType::Enum => "enum",
        })
    }
}

/// One column of a table mapping: name plus logical type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: PgType,
}

impl<S: Into<String>> From<(S, PgType)> for Column {
    fn from((name, ty): (S, PgType)) -> Self {
        Column {
            name: name.into(),
            ty,
        }
    }
}

/// A table to migrate: the same name is used on source and destination, and
/// the column order governs both the source `SELECT` list and the binary
/// field order. Column names are spliced into SQL literally, so callers must
/// supply safe identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new<N, C>(name: N, columns: C) -> Self
    where
        N: Into<String>,
        C: IntoIterator,
        C::Item: Into<Column>,
    {
        Table {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// The streaming query issued against the source.
    pub fn select_sql(&self) -> String {
        format!("SELECT {} FROM {}", self.column_list(), self.name)
    }

    /// The copy command issued against the destination.
    pub fn copy_sql(&self) -> String {
        format!(
            "COPY {} ({}) FROM STDIN BINARY",
            self.name,
            self.column_list()
        )
    }

    fn column_list(&self) -> String {
        self.columns.iter().map(|c| c.name.as_str()).join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Table {
        Table::new(
            "users",
            [
                ("id", PgType::Int64),
                ("username", PgType::Text),
                ("created_at", PgType::TimestampTz),
            ],
        )
    }

    #[test]
    fn select_preserves_column_order() {
        assert_eq!(
            users().select_sql(),
            "SELECT id, username, created_at FROM users"
        );
    }

    #[test]
    fn copy_names_every_column() {
        assert_eq!(
            users().copy_sql(),
            "COPY users (id, username, created_at) FROM STDIN BINARY"
        );
    }
}
