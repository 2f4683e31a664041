//! Dispatching CSV-backed tables end to end, minus the server.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use mygrate::binary::write_stream;
use mygrate::sources::csv::CsvSource;
use mygrate::sources::{Source, SourceReader};
use mygrate::types::{PgType, Table};

fn fixture_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("mygrate-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn every_table_is_copied_and_counted() {
    let dir = fixture_dir("dispatch");
    fs::write(dir.join("users.csv"), "id,username\n1,alice\n2,bob\n").unwrap();
    fs::write(dir.join("sites.csv"), "id,user_id\n10,1\n").unwrap();

    let tables = vec![
        Table::new("users", [("id", PgType::Int64), ("username", PgType::Text)]),
        Table::new("sites", [("id", PgType::Int64), ("user_id", PgType::Int64)]),
    ];
    let source = CsvSource::new(&dir);

    let total = AtomicU64::new(0);
    mygrate::dispatch(&tables, 2, |table| {
        let mut reader = source.reader(table)?;
        let mut sink = Vec::new();
        let rows = write_stream(&mut sink, &table.columns, reader.rows()?)?;
        total.fetch_add(rows, Ordering::SeqCst);
        Ok(rows)
    })
    .unwrap();

    assert_eq!(total.load(Ordering::SeqCst), 3);
}

#[test]
fn a_bad_cell_fails_the_dispatch() {
    let dir = fixture_dir("badcell");
    fs::write(dir.join("users.csv"), "id,username\nnot-a-number,alice\n").unwrap();

    let tables = vec![Table::new(
        "users",
        [("id", PgType::Int64), ("username", PgType::Text)],
    )];
    let source = CsvSource::new(&dir);

    let err = mygrate::dispatch(&tables, 1, |table| {
        let mut reader = source.reader(table)?;
        write_stream(&mut Vec::new(), &table.columns, reader.rows()?)
    })
    .unwrap_err();

    assert!(matches!(err, mygrate::MigrateError::Encode(_)));
}

#[test]
fn a_missing_file_fails_the_dispatch() {
    let dir = fixture_dir("nofile");
    let tables = vec![Table::new("ghosts", [("id", PgType::Int64)])];
    let source = CsvSource::new(&dir);

    let err = mygrate::dispatch(&tables, 1, |table| {
        let mut reader = source.reader(table)?;
        write_stream(&mut Vec::new(), &table.columns, reader.rows()?)
    })
    .unwrap_err();

    assert!(matches!(err, mygrate::MigrateError::Csv(_)));
}
