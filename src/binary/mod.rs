//! The binary COPY encoding core: value converters, the row assembler and
//! the stream framing.
//!
//! Layout per the PostgreSQL "Binary Format" documentation: a fixed 19-byte
//! header, then one length-prefixed tuple per row, then a 2-byte trailer.
//! Everything multi-byte is big-endian.

mod value;

use std::io::Write;

use bytes::BufMut;
use thiserror::Error;

use crate::errors::MigrateError;
use crate::types::{Column, PgType, TextRow};

pub use value::encode_value;

/// 11-byte signature, 4-byte zero flags word, 4-byte zero extension length.
pub const COPY_HEADER: [u8; 19] = *b"PGCOPY\n\xFF\r\n\0\0\0\0\0\0\0\0\0";

/// Big-endian i16 `-1`, terminating the tuple sequence.
pub const COPY_TRAILER: [u8; 2] = [0xFF, 0xFF];

/// An error raised while encoding a single row. Pure of any I/O.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("invalid {ty} value {input:?}: {reason}")]
    InvalidInput {
        ty: PgType,
        input: String,
        reason: String,
    },

    #[error("{ty} value {input:?} is out of range")]
    OutOfRange { ty: PgType, input: String },

    #[error("row has {actual} fields but the column mapping has {expected}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("a mapping of {0} columns does not fit a copy tuple")]
    TooManyColumns(usize),

    #[error("{ty} payload of {len} bytes exceeds the copy field limit")]
    OversizedField { ty: PgType, len: usize },
}

impl EncodeError {
    pub(crate) fn invalid(ty: PgType, input: &str, reason: impl ToString) -> Self {
        EncodeError::InvalidInput {
            ty,
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn out_of_range(ty: PgType, input: &str) -> Self {
        EncodeError::OutOfRange {
            ty,
            input: input.to_string(),
        }
    }
}

/// Assemble one binary copy tuple from a row of nullable text fields.
///
/// `None` encodes as the 4-byte null sentinel `-1`; `Some(v)` as the
/// converter output length followed by the payload. Deterministic: the same
/// row and mapping always yield identical bytes.
pub fn encode_row(row: &[Option<String>], columns: &[Column]) -> Result<Vec<u8>, EncodeError> {
    if row.len() != columns.len() {
        return Err(EncodeError::SchemaMismatch {
            expected: columns.len(),
            actual: row.len(),
        });
    }
    let ncols =
        i16::try_from(columns.len()).map_err(|_| EncodeError::TooManyColumns(columns.len()))?;

    let mut out = Vec::with_capacity(2 + columns.len() * 8);
    out.put_i16(ncols);
    for (field, column) in row.iter().zip(columns) {
        match field {
            None => out.put_i32(-1),
            Some(input) => {
                let payload = encode_value(column.ty, input)?;
                let len = i32::try_from(payload.len()).map_err(|_| EncodeError::OversizedField {
                    ty: column.ty,
                    len: payload.len(),
                })?;
                out.put_i32(len);
                out.extend_from_slice(&payload);
            }
        }
    }
    Ok(out)
}

/// Write a complete copy stream (header, every row, trailer) into `wtr` and
/// return the number of rows written.
///
/// A row or converter error aborts before the trailer, which leaves the
/// stream unterminated and makes the server abort the copy transaction.
pub fn write_stream<W, I>(wtr: &mut W, columns: &[Column], rows: I) -> Result<u64, MigrateError>
where
    W: Write,
    I: IntoIterator<Item = Result<TextRow, MigrateError>>,
{
    wtr.write_all(&COPY_HEADER)
        .map_err(MigrateError::StreamWrite)?;
    let mut count = 0u64;
    for row in rows {
        let encoded = encode_row(&row?, columns)?;
        wtr.write_all(&encoded).map_err(MigrateError::StreamWrite)?;
        count += 1;
    }
    wtr.write_all(&COPY_TRAILER)
        .map_err(MigrateError::StreamWrite)?;
    Ok(count)
}
