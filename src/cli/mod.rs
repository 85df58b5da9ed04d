pub mod audit;
pub mod commands;
pub mod maintenance;
pub mod settings;

pub use commands::{Cli, Commands};

use std::path::PathBuf;
use crate::config::HexstrikeConfig;
use crate::db::{default_db_path, Database};
use crate::errors::HexstrikeError;

/// Store location: `--db-path`, then the config file, then the default
/// beside the executable.
pub fn resolve_db_path(cli_path: Option<&PathBuf>, config: &HexstrikeConfig) -> PathBuf {
    cli_path
        .or_else(|| config.database_path())
        .cloned()
        .unwrap_or_else(default_db_path)
}

pub fn run(cli: Cli, config: &HexstrikeConfig) -> Result<(), HexstrikeError> {
    if let Commands::Version = cli.command {
        println!("{}", maintenance::render_version());
        return Ok(());
    }

    let path = resolve_db_path(cli.db_path.as_ref(), config);
    let (db, outcome) = Database::open_with_outcome(&path)?;

    match cli.command {
        Commands::Init => maintenance::handle_init(&db, outcome),
        Commands::Stats(args) => maintenance::handle_stats(&db, args),
        Commands::Vacuum => maintenance::handle_vacuum(&db),
        Commands::Backup(args) => maintenance::handle_backup(&db, args, config),
        Commands::Settings(args) => settings::handle_settings(&db, args),
        Commands::Get(args) => settings::handle_get(&db, args),
        Commands::Set(args) => settings::handle_set(&db, args),
        Commands::Audit(args) => audit::handle_audit(&db, args),
        Commands::Version => Ok(()),
    }
}
