use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use env_logger::Env;

use mygrate::config;
use mygrate::migrate;
use mygrate::sources::{csv::CsvSource, mysql::MySqlSource};
use mygrate::types::{PgType, Table};
use mygrate::MigrateError;

/// Stream MySQL tables into PostgreSQL over the binary COPY protocol.
#[derive(Parser)]
#[command(name = "mygrate", version)]
struct Args {
    /// Read rows from one <table>.csv file per table instead of MySQL.
    #[arg(long)]
    csv: bool,

    /// Directory holding the per-table CSV files.
    #[arg(long, default_value = ".", requires = "csv")]
    csv_dir: PathBuf,

    /// Worker threads; defaults to host parallelism.
    #[arg(long, short = 'j')]
    workers: Option<usize>,
}

/// The tables to migrate and their column mappings, in the order the
/// destination expects the fields.
fn tables() -> Vec<Table> {
    vec![
        Table::new(
            "users",
            [
                ("id", PgType::Int64),
                ("username", PgType::Text),
                ("email", PgType::Text),
                ("password", PgType::Text),
                ("created_at", PgType::TimestampTz),
                ("updated_at", PgType::TimestampTz),
            ],
        ),
        Table::new(
            "sites",
            [
                ("id", PgType::Int64),
                ("name", PgType::Text),
                ("user_id", PgType::Int64),
                ("created_at", PgType::TimestampTz),
                ("updated_at", PgType::TimestampTz),
            ],
        ),
        Table::new(
            "jobs",
            [
                ("id", PgType::Int64),
                ("start_date", PgType::Date),
                ("site_id", PgType::Int64),
                ("created_at", PgType::TimestampTz),
                ("updated_at", PgType::TimestampTz),
            ],
        ),
    ]
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error during copy: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), MigrateError> {
    let workers = args.workers.unwrap_or_else(|| {
        thread::available_parallelism().map_or(1, usize::from)
    });
    let workers = workers.max(1);

    let config = config::resolve(args.csv)?;
    let pg = migrate::connect_destination(&config.dest, workers as u32)?;
    let tables = tables();

    if args.csv {
        let source = CsvSource::new(args.csv_dir);
        mygrate::migrate_all(&source, &pg, &tables, workers)
    } else {
        let source_config = config.source.ok_or_else(|| {
            MigrateError::InvalidConfig("a MySQL source is required without --csv".to_string())
        })?;
        let source = MySqlSource::connect(&source_config, workers as u32)?;
        mygrate::migrate_all(&source, &pg, &tables, workers)
    }
}
