//! Row sources: where the textual field values come from.
//!
//! A [`Source`] hands out one [`SourceReader`] per table; the reader owns its
//! connection or file handle and yields rows of nullable strings in the
//! column order of the table mapping.

pub mod csv;
pub mod mysql;

use crate::errors::MigrateError;
use crate::types::{Table, TextRow};

/// A place rows can be pulled from. One reader is opened per table
/// migration, so a source must be shareable across worker threads.
pub trait Source: Sync {
    type Reader: SourceReader;

    fn reader(&self, table: &Table) -> Result<Self::Reader, MigrateError>;
}

/// An open per-table cursor. `rows` starts the streaming iteration; rows are
/// yielded in the order the underlying source produces them.
pub trait SourceReader {
    type Rows<'a>: Iterator<Item = Result<TextRow, MigrateError>>
    where
        Self: 'a;

    fn rows(&mut self) -> Result<Self::Rows<'_>, MigrateError>;
}
