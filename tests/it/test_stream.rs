//! Byte-exact assembly of a full copy stream from a CSV reader.

use mygrate::binary::{write_stream, COPY_HEADER, COPY_TRAILER};
use mygrate::sources::csv::CsvReader;
use mygrate::sources::SourceReader;
use mygrate::types::{PgType, Table};

use pretty_assertions::assert_eq;

#[test]
fn csv_rows_become_a_well_formed_binary_stream() {
    let table = Table::new(
        "users",
        [
            ("id", PgType::Int64),
            ("name", PgType::Text),
            ("joined", PgType::TimestampTz),
        ],
    );
    let data = "\
id,name,joined
1,alice,2024-01-15 14:30:25+05:00
2,,2000-01-01 00:00:00Z
";
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data.as_bytes());
    let mut reader = CsvReader::new(rdr, &table, "users.csv".to_string()).unwrap();

    let mut stream = Vec::new();
    let rows = write_stream(&mut stream, &table.columns, reader.rows().unwrap()).unwrap();
    assert_eq!(rows, 2);

    let mut expected = COPY_HEADER.to_vec();
    // row 0: id 1, name "alice", joined 2024-01-15 09:30:25 UTC
    expected.extend_from_slice(&3i16.to_be_bytes());
    expected.extend_from_slice(&8i32.to_be_bytes());
    expected.extend_from_slice(&1i64.to_be_bytes());
    expected.extend_from_slice(&5i32.to_be_bytes());
    expected.extend_from_slice(b"alice");
    expected.extend_from_slice(&8i32.to_be_bytes());
    expected.extend_from_slice(&758_626_225_000_000i64.to_be_bytes());
    // row 1: id 2, name null, joined at the 2000-01-01 epoch
    expected.extend_from_slice(&3i16.to_be_bytes());
    expected.extend_from_slice(&8i32.to_be_bytes());
    expected.extend_from_slice(&2i64.to_be_bytes());
    expected.extend_from_slice(&(-1i32).to_be_bytes());
    expected.extend_from_slice(&8i32.to_be_bytes());
    expected.extend_from_slice(&0i64.to_be_bytes());
    expected.extend_from_slice(&COPY_TRAILER);

    assert_eq!(stream, expected);
}

#[test]
fn the_empty_stream_is_just_header_and_trailer() {
    let table = Table::new("empty", [("id", PgType::Int32)]);
    let mut stream = Vec::new();
    let rows = write_stream(
        &mut stream,
        &table.columns,
        Vec::<Result<_, mygrate::MigrateError>>::new(),
    )
    .unwrap();
    assert_eq!(rows, 0);

    let mut expected = COPY_HEADER.to_vec();
    expected.extend_from_slice(&COPY_TRAILER);
    assert_eq!(stream, expected);
}
