//! The per-table migration driver: one source cursor, one destination COPY
//! session, the binary stream in between.

use log::{debug, info, warn};
use postgres::{Client, NoTls};
use r2d2::Pool;
use r2d2_postgres::PostgresConnectionManager;

use crate::binary;
use crate::config::DbConfig;
use crate::errors::MigrateError;
use crate::sources::{Source, SourceReader};
use crate::types::Table;

pub type PgPool = Pool<PostgresConnectionManager<NoTls>>;

/// Build a connection pool against the destination server.
pub fn connect_destination(config: &DbConfig, max_conns: u32) -> Result<PgPool, MigrateError> {
    let mut pg = postgres::Config::new();
    pg.host(&config.host)
        .port(config.port)
        .dbname(&config.database)
        .user(&config.user)
        .password(&config.password);
    let manager = PostgresConnectionManager::new(pg, NoTls);
    Ok(Pool::builder().max_size(max_conns).build(manager)?)
}

/// Copy one table from the source into the destination. Returns the number
/// of rows written.
///
/// Failures are terminal for the table: an error mid-stream leaves the copy
/// unterminated, the server rolls the implicit transaction back, and no rows
/// are durably written.
pub fn migrate_table<S: Source>(
    source: &S,
    pg: &PgPool,
    table: &Table,
) -> Result<u64, MigrateError> {
    let mut client = pg.get()?;
    set_triggers(&mut client, table, false);
    let result = copy_table(source, &mut client, table);
    set_triggers(&mut client, table, true);
    result
}

fn copy_table<S: Source>(
    source: &S,
    client: &mut Client,
    table: &Table,
) -> Result<u64, MigrateError> {
    let mut reader = source.reader(table)?;

    let copy_sql = table.copy_sql();
    debug!("{copy_sql}");
    let mut writer = client
        .copy_in(copy_sql.as_str())
        .map_err(MigrateError::CopyStart)?;

    let rows = binary::write_stream(&mut writer, &table.columns, reader.rows()?)?;
    writer.finish().map_err(MigrateError::CopyFinish)?;
    info!("table {}: copied {rows} rows", table.name);
    Ok(rows)
}

/// Toggling triggers can legitimately fail: the table may have none, or the
/// role may lack permission. Either way the copy proceeds, so failures are
/// logged and swallowed.
fn set_triggers(client: &mut Client, table: &Table, enable: bool) {
    let verb = if enable { "ENABLE" } else { "DISABLE" };
    let sql = format!("ALTER TABLE {} {verb} TRIGGER ALL", table.name);
    if let Err(e) = client.batch_execute(&sql) {
        warn!("table {}: cannot {} triggers: {e}", table.name, verb.to_lowercase());
    }
}
