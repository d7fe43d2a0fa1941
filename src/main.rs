use crate::config::SyncConfig;
use crate::db::connection::{init_db_embedded, Database};

mod config;
mod db;
mod domain;
mod errors;
mod export;
mod import;

#[cfg(test)]
mod tests;

const USAGE: &str = "\
Usage: marinesync <config.json> <command>

Commands:
  export [--if-due]     Write the Open Marine XML feed (skip if not due yet)
  import-feed           Fetch and import the configured remote feed
  import-csv <file>     Import a local CSV file
  template <out.csv>    Write a CSV import template with example data";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("{USAGE}");
        std::process::exit(2);
    }

    // 1️⃣ Load and validate the configuration
    let config = match SyncConfig::load(&args[0]) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    // 2️⃣ Create the database handle and apply the embedded schema
    let db = Database::new("marinesync.sqlite3");
    if let Err(e) = init_db_embedded(&db) {
        eprintln!("❌ Database initialization failed: {e}");
        std::process::exit(1);
    }

    // 3️⃣ Dispatch the command
    let result = match args[1].as_str() {
        "export" => {
            let only_if_due = args.get(2).map(String::as_str) == Some("--if-due");
            run_export(&db, &config, only_if_due)
        }
        "import-feed" => run_import_feed(&db, &config),
        "import-csv" => match args.get(2) {
            Some(path) => run_import_csv(&db, &config, path),
            None => {
                eprintln!("{USAGE}");
                std::process::exit(2);
            }
        },
        "template" => match args.get(2) {
            Some(path) => run_template(path),
            None => {
                eprintln!("{USAGE}");
                std::process::exit(2);
            }
        },
        other => {
            eprintln!("Unknown command {other:?}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}

fn run_export(
    db: &Database,
    config: &SyncConfig,
    only_if_due: bool,
) -> Result<(), errors::SyncError> {
    if let Some(outcome) = export::run_export(db, config, only_if_due)? {
        println!("{}", outcome.public_url);
    }
    Ok(())
}

fn run_import_feed(db: &Database, config: &SyncConfig) -> Result<(), errors::SyncError> {
    let summary = import::run_feed_import(db, config)?;
    println!("{}", summary.report());
    Ok(())
}

fn run_import_csv(db: &Database, config: &SyncConfig, path: &str) -> Result<(), errors::SyncError> {
    let summary = import::run_csv_import(db, config, path)?;
    println!("{}", summary.report());
    Ok(())
}

fn run_template(path: &str) -> Result<(), errors::SyncError> {
    export::template::write_template(path)?;
    println!("Template written to {path}");
    Ok(())
}
