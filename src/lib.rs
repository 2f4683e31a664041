//! Stream tables out of a MySQL-family database into PostgreSQL using the
//! binary `COPY ... FROM STDIN` protocol.
//!
//! The interesting part is the encoding core in [binary]: pure converters
//! from textual field values to PostgreSQL's wire binary payloads, a row
//! assembler and the header/trailer framing. Around it sit the row sources
//! ([sources], MySQL or one CSV file per table), the per-table COPY driver
//! ([migrate]) and a parallel dispatcher that claims tables off a shared
//! counter and stops on the first failure.
//!
//! ```no_run
//! use mygrate::sources::mysql::MySqlSource;
//! use mygrate::types::{PgType, Table};
//!
//! # fn main() -> Result<(), mygrate::MigrateError> {
//! # let (source_cfg, dest_cfg) = unimplemented!();
//! let tables = vec![Table::new(
//!     "users",
//!     [("id", PgType::Int64), ("username", PgType::Text)],
//! )];
//!
//! let source = MySqlSource::connect(&source_cfg, 4)?;
//! let pg = mygrate::migrate::connect_destination(&dest_cfg, 4)?;
//! mygrate::migrate_all(&source, &pg, &tables, 4)?;
//! # Ok(())
//! # }
//! ```

pub mod binary;
pub mod config;
mod dispatch;
mod errors;
pub mod migrate;
pub mod sources;
pub mod types;

pub use dispatch::{dispatch, migrate_all};
pub use errors::{EncodeError, MigrateError};
