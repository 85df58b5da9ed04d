use console::style;
use tracing::info;
use crate::cli::commands::{BackupArgs, StatsArgs};
use crate::config::HexstrikeConfig;
use crate::db::maintenance::default_backup_path;
use crate::db::{Database, InitOutcome};
use crate::errors::HexstrikeError;
use crate::models::{AuditRecord, DatabaseStats};

pub fn handle_init(db: &Database, outcome: InitOutcome) -> Result<(), HexstrikeError> {
    let location = db.path().map(|p| p.display().to_string()).unwrap_or_default();
    let message = match outcome {
        InitOutcome::Created { version } => format!("Created schema v{} at {}", version, location),
        InitOutcome::Upgraded { from, to } => {
            format!("Upgraded schema v{} -> v{} at {}", from, to, location)
        }
        InitOutcome::UpToDate { version } => {
            format!("Schema v{} already current at {}", version, location)
        }
    };
    println!("{} {}", style("\u{2714}").green().bold(), message);
    Ok(())
}

pub fn handle_stats(db: &Database, args: StatsArgs) -> Result<(), HexstrikeError> {
    let stats = db.get_database_stats()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", render_stats(&stats));
    }
    Ok(())
}

fn render_stats(stats: &DatabaseStats) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n  {} {}\n  {} {}\n  {} v{} (current v{})\n\n",
        style("Path:").dim(),
        style(stats.database_path.as_deref().unwrap_or(":memory:")).white().bold(),
        style("Size:").dim(),
        style(format_bytes(stats.database_size_bytes)).white(),
        style("Schema:").dim(),
        stats.schema_version,
        stats.current_schema_version,
    ));
    for (table, count) in &stats.table_counts {
        out.push_str(&format!("  {:<18} {:>8}\n", style(table.name()).cyan(), count));
    }
    out
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

pub fn handle_vacuum(db: &Database) -> Result<(), HexstrikeError> {
    let before = db.get_database_stats()?.database_size_bytes;
    db.vacuum()?;
    let after = db.get_database_stats()?.database_size_bytes;
    db.log_action(&AuditRecord::action("vacuum"))?;
    println!(
        "{} Vacuumed: {} -> {}",
        style("\u{2714}").green().bold(),
        format_bytes(before),
        format_bytes(after)
    );
    Ok(())
}

pub fn handle_backup(
    db: &Database,
    args: BackupArgs,
    config: &HexstrikeConfig,
) -> Result<(), HexstrikeError> {
    // A configured backup directory only applies when no destination is given.
    let dest = args.dest.or_else(|| {
        let dir = config.backup_directory()?;
        let default = default_backup_path(db.path()?);
        Some(dir.join(default.file_name()?))
    });

    info!(destination = ?dest, "Starting backup");
    let written = db.backup(dest.as_deref())?;
    db.log_action(&AuditRecord {
        details: Some(written.display().to_string()),
        ..AuditRecord::action("backup")
    })?;
    println!(
        "{} Backup written to {}",
        style("\u{2714}").green().bold(),
        style(written.display()).white().bold()
    );
    Ok(())
}

/// Version, commit and build time.
pub fn render_version() -> String {
    let version = env!("CARGO_PKG_VERSION");
    let git_hash = option_env!("GIT_HASH").unwrap_or("dev");
    let build_ts = option_env!("BUILD_TIMESTAMP").unwrap_or("unknown");

    format!(
        "\n  {} {}\n  {} {}\n  {} {}\n",
        style("Version:").dim(),
        style(version).white().bold(),
        style("Commit:").dim(),
        style(git_hash).white(),
        style("Built:").dim(),
        style(build_ts).white(),
    )
}
