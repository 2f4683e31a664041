//! Row source backed by one CSV file per table.
//!
//! A table named `users` is read from `<dir>/users.csv`. The file must carry
//! a header row; columns are addressed by name, so the file's column order
//! is free to differ from the mapping's. CSV has no null syntax, so an empty
//! cell is read as null.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use log::debug;

use super::{Source, SourceReader};
use crate::binary::EncodeError;
use crate::errors::MigrateError;
use crate::types::{Table, TextRow};

pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CsvSource { dir: dir.into() }
    }
}

impl Source for CsvSource {
    type Reader = CsvReader<File>;

    fn reader(&self, table: &Table) -> Result<CsvReader<File>, MigrateError> {
        let path = self.dir.join(format!("{}.csv", table.name));
        debug!("reading {}", path.display());
        let rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)?;
        CsvReader::new(rdr, table, path.display().to_string())
    }
}

#[derive(Debug)]
pub struct CsvReader<R: Read> {
    rdr: csv::Reader<R>,
    indices: Vec<usize>,
}

impl<R: Read> CsvReader<R> {
    /// Resolve every mapping column against the file's header row. A column
    /// the file does not carry is an error.
    pub fn new(mut rdr: csv::Reader<R>, table: &Table, path: String) -> Result<Self, MigrateError> {
        let headers = rdr.headers()?.clone();
        let indices = table
            .columns
            .iter()
            .map(|col| {
                headers.iter().position(|h| h == col.name).ok_or_else(|| {
                    MigrateError::CsvMissingColumn {
                        path: path.clone(),
                        column: col.name.clone(),
                    }
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(CsvReader { rdr, indices })
    }
}

impl<R: Read> SourceReader for CsvReader<R> {
    type Rows<'a> = CsvRows<'a, R> where Self: 'a;

    fn rows(&mut self) -> Result<CsvRows<'_, R>, MigrateError> {
        Ok(CsvRows {
            records: self.rdr.records(),
            indices: &self.indices,
        })
    }
}

pub struct CsvRows<'a, R: Read> {
    records: csv::StringRecordsIter<'a, R>,
    indices: &'a [usize],
}

impl<R: Read> Iterator for CsvRows<'_, R> {
    type Item = Result<TextRow, MigrateError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        Some(
            self.indices
                .iter()
                .map(|&i| match record.get(i) {
                    None => Err(EncodeError::SchemaMismatch {
                        expected: self.indices.len(),
                        actual: record.len(),
                    }
                    .into()),
                    Some("") => Ok(None),
                    Some(v) => Ok(Some(v.to_string())),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PgType;

    fn reader_for<'a>(data: &'a str, table: &Table) -> Result<CsvReader<&'a [u8]>, MigrateError> {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data.as_bytes());
        CsvReader::new(rdr, table, "users.csv".to_string())
    }

    #[test]
    fn columns_are_remapped_by_header_name() {
        let table = Table::new("users", [("id", PgType::Int64), ("name", PgType::Text)]);
        let mut reader = reader_for("name,id\nalice,1\nbob,2\n", &table).unwrap();
        let rows: Vec<TextRow> = reader.rows().unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Some("1".to_string()), Some("alice".to_string())],
                vec![Some("2".to_string()), Some("bob".to_string())],
            ]
        );
    }

    #[test]
    fn empty_cell_reads_as_null() {
        let table = Table::new("users", [("id", PgType::Int64), ("name", PgType::Text)]);
        let mut reader = reader_for("id,name\n1,\n", &table).unwrap();
        let rows: Vec<TextRow> = reader.rows().unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows, vec![vec![Some("1".to_string()), None]]);
    }

    #[test]
    fn missing_column_is_an_error() {
        let table = Table::new("users", [("id", PgType::Int64), ("email", PgType::Text)]);
        let err = reader_for("id,name\n1,alice\n", &table).unwrap_err();
        assert!(matches!(
            err,
            MigrateError::CsvMissingColumn { column, .. } if column == "email"
        ));
    }

    #[test]
    fn ragged_row_is_an_error() {
        let table = Table::new("users", [("id", PgType::Int64), ("name", PgType::Text)]);
        let mut reader = reader_for("id,name\n1\n", &table).unwrap();
        let results: Vec<_> = reader.rows().unwrap().collect();
        assert!(results[0].is_err());
    }
}
