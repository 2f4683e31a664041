//! Row source backed by a MySQL (or MariaDB) server.

use anyhow::anyhow;
use log::debug;
use r2d2::{Pool, PooledConnection};
use r2d2_mysql::{
    mysql::{prelude::Queryable, OptsBuilder, QueryResult, Row, Text},
    MySqlConnectionManager,
};

use super::{Source, SourceReader};
use crate::config::DbConfig;
use crate::errors::MigrateError;
use crate::types::{Table, TextRow};

pub struct MySqlSource {
    pool: Pool<MySqlConnectionManager>,
}

impl MySqlSource {
    /// Build a connection pool against the source server. The pool is sized
    /// to the worker count so that every in-flight table migration owns one
    /// connection.
    pub fn connect(config: &DbConfig, max_conns: u32) -> Result<Self, MigrateError> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(config.host.clone()))
            .tcp_port(config.port)
            .user(Some(config.user.clone()))
            .pass(Some(config.password.clone()))
            .db_name(Some(config.database.clone()));
        let manager = MySqlConnectionManager::new(opts);
        let pool = Pool::builder().max_size(max_conns).build(manager)?;
        Ok(MySqlSource { pool })
    }
}

impl Source for MySqlSource {
    type Reader = MySqlReader;

    fn reader(&self, table: &Table) -> Result<MySqlReader, MigrateError> {
        let conn = self.pool.get()?;
        Ok(MySqlReader {
            conn,
            select: table.select_sql(),
        })
    }
}

pub struct MySqlReader {
    conn: PooledConnection<MySqlConnectionManager>,
    select: String,
}

impl SourceReader for MySqlReader {
    type Rows<'a> = MySqlRows<'a>;

    fn rows(&mut self) -> Result<MySqlRows<'_>, MigrateError> {
        debug!("{}", self.select);
        let iter = self
            .conn
            .query_iter(&self.select)
            .map_err(MigrateError::Query)?;
        Ok(MySqlRows { iter })
    }
}

/// Streams rows off the text-protocol result set without buffering it.
pub struct MySqlRows<'a> {
    iter: QueryResult<'a, 'a, 'a, Text>,
}

impl Iterator for MySqlRows<'_> {
    type Item = Result<TextRow, MigrateError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.iter.next()? {
            Ok(row) => Some(take_text_fields(row)),
            Err(e) => Some(Err(MigrateError::Query(e))),
        }
    }
}

/// SQL NULL becomes `None`; everything else is kept as its textual form,
/// including empty strings.
fn take_text_fields(mut row: Row) -> Result<TextRow, MigrateError> {
    (0..row.len())
        .map(|i| {
            row.take::<Option<String>, _>(i)
                .ok_or_else(|| anyhow!("cannot read column {i} as text").into())
        })
        .collect()
}
