//! Import customers from a CSV file into the CRM
//!
//! Usage:
//!   import_leads <file.csv> [--map COL=FIELD]... [--dry-run] [--config PATH]
//!
//! `--map 2=email` sends column 2 to the email field, `--map 4=-` ignores
//! column 4. With `--dry-run` rows are created in memory only.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crm_lib::csv_import::{CrmField, ImportSession, ImportSummary};
use crm_lib::store::InMemoryStore;
use crm_lib::CrmConfig;

#[derive(Debug, Default)]
struct Args {
    file: PathBuf,
    overrides: Vec<String>,
    dry_run: bool,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut file = None;
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--map" | "-m" => {
                let value = iter.next().context("--map needs COL=FIELD")?;
                args.overrides.push(value);
            }
            "--dry-run" => args.dry_run = true,
            "--config" => {
                let value = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(value));
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other if other.starts_with('-') => bail!("unknown option {}", other),
            other => {
                if file.is_some() {
                    bail!("only one input file is supported");
                }
                file = Some(PathBuf::from(other));
            }
        }
    }

    match file {
        Some(f) => args.file = f,
        None => {
            print_usage();
            bail!("no input file given");
        }
    }
    Ok(args)
}

fn print_usage() {
    eprintln!("Usage: import_leads <file.csv> [--map COL=FIELD]... [--dry-run] [--config PATH]");
    let fields: Vec<&str> = CrmField::ALL.iter().map(|f| f.as_str()).collect();
    eprintln!("Fields: {} (or - to ignore)", fields.join(", "));
}

fn print_preview(session: &ImportSession) {
    let preview = session.preview();
    println!("=== Preview ===");
    println!(
        "{} rows, delimiter '{}'",
        preview.row_count, preview.delimiter
    );
    println!();

    for column in &preview.columns {
        let field = session.mapping().get(column.index);
        println!(
            "  [{}] {:<20} -> {:<10} {}",
            column.index,
            column.name,
            field.as_str(),
            column.sample_values.join(" | ")
        );
    }
    println!();
}

fn print_summary(summary: &ImportSummary) {
    println!("=== Result ===");
    println!("Created: {}", summary.ok);
    println!("Failed:  {}", summary.failed);
    for customer in &summary.created {
        println!("  + {} ({})", customer.name, customer.status);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;

    let mut session = ImportSession::open(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    if session.parsed().is_empty() {
        bail!("{} is empty", args.file.display());
    }

    for entry in &args.overrides {
        session
            .apply_override(entry)
            .with_context(|| format!("Invalid --map {}", entry))?;
    }

    print_preview(&session);
    session
        .mapping()
        .validate()
        .context("Map exactly one column to the name field (e.g. --map 0=name)")?;

    let on_imported = |created: &[crm_lib::models::Customer]| {
        log::info!("{} customers added", created.len());
    };

    let summary = if args.dry_run {
        println!("Dry run: nothing is sent to the server\n");
        let store = InMemoryStore::new();
        session.run(&store, on_imported).await?
    } else {
        let config = CrmConfig::load(args.config.as_deref()).context("Failed to load config")?;
        let client = config
            .connect()
            .await
            .with_context(|| format!("Cannot reach {}", config.pocketbase_url))?;
        session.run(&client, on_imported).await?
    };

    print_summary(&summary);
    session.close(|| log::debug!("Done"));

    Ok(())
}
