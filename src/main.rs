// ==========================================
// Apparel Season Reconciliation - CLI Entry Point
// ==========================================
// Thin command-line front over the API layer. One subcommand per
// operator task; everything else lives in the library.
// ==========================================

use apparel_recon::api::{AdminApi, ImportApi, ImportOptions};
use apparel_recon::domain::types::FileType;
use apparel_recon::{get_default_db_path, APP_NAME, VERSION};
use std::process::ExitCode;

const USAGE: &str = "\
usage: apparel-recon <command> [args]

commands:
  import-season <line_list.xlsx> <season> [--landed <file>] [--pricing <file>] [--dry-run]
  import-sales <file> [--dry-run]
  import-pricing <file> [--dry-run]
  history [limit]
  seasons
  reset --confirm RESET-ALL-DATA

environment:
  APPAREL_RECON_DB_PATH  database location (default: user data dir)
  RUST_LOG               log filter (default: info)";

#[tokio::main]
async fn main() -> ExitCode {
    apparel_recon::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let db_path = get_default_db_path();
    tracing::info!("{} v{}, database: {}", APP_NAME, VERSION, db_path);

    match run(&args, &db_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String], db_path: &str) -> anyhow::Result<()> {
    let command = match args.first() {
        Some(c) => c.as_str(),
        None => {
            println!("{}", USAGE);
            return Ok(());
        }
    };

    match command {
        "import-season" => {
            let line_list = required(args, 1, "line list file")?;
            let season = required(args, 2, "target season")?;
            let landed = flag_value(args, "--landed");
            let pricing = flag_value(args, "--pricing");
            let options = options_from(args);

            let api = ImportApi::new(db_path)?;
            let response = api
                .import_season(line_list, landed, pricing, season, &options)
                .await?;
            println!("{}", response.message);
            println!(
                "  line-list rows: {}, landed matched: {}, landed dropped: {}, pricing overrides: {}",
                response.stats.line_list_rows,
                response.stats.landed_matched,
                response.stats.landed_unmatched,
                response.stats.pricing_overrides
            );
            if response.failed_rows > 0 {
                eprintln!("  WARNING: {} rows failed to persist", response.failed_rows);
            }
        }
        "import-sales" | "import-pricing" => {
            let path = required(args, 1, "input file")?;
            let file_type = if command == "import-sales" {
                FileType::Sales
            } else {
                FileType::Pricing
            };
            let options = options_from(args);

            let api = ImportApi::new(db_path)?;
            let response = api.import_file(path, file_type, &options).await?;
            println!("{}", response.message);
            for (season, count) in &response.by_season {
                println!("  {}: {} records", season, count);
            }
        }
        "history" => {
            let limit = args
                .get(1)
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(20);
            let api = ImportApi::new(db_path)?;
            for entry in api.import_history(limit)? {
                println!(
                    "{}  {:<12} {:<10} {:>8} rows  {}",
                    entry.imported_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.file_type,
                    entry.season.as_deref().unwrap_or("-"),
                    entry.record_count,
                    entry.file_name
                );
            }
        }
        "seasons" => {
            let api = AdminApi::new(db_path)?;
            for overview in api.seasons().await? {
                println!(
                    "{:<8} {:<20} {:<10} products={} costs={} pricing={} sales={}",
                    overview.code,
                    overview.display_name,
                    overview.status,
                    overview.product_count,
                    overview.cost_count,
                    overview.pricing_count,
                    overview.sales_count
                );
            }
        }
        "reset" => {
            let confirm = flag_value(args, "--confirm").unwrap_or("");
            let api = AdminApi::new(db_path)?;
            let response = api.reset(confirm).await?;
            println!("{}", response.message);
        }
        _ => {
            println!("{}", USAGE);
            anyhow::bail!("unknown command: {}", command);
        }
    }
    Ok(())
}

fn required<'a>(args: &'a [String], index: usize, what: &str) -> anyhow::Result<&'a str> {
    args.get(index)
        .map(|s| s.as_str())
        .filter(|s| !s.starts_with("--"))
        .ok_or_else(|| anyhow::anyhow!("missing argument: {}", what))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn options_from(args: &[String]) -> ImportOptions {
    ImportOptions {
        dry_run: args.iter().any(|a| a == "--dry-run"),
        replace_existing: true,
    }
}
