use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hexstrike-db", version, about = "Manage the HexStrike persistence store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path (overrides the config file)
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the store or bring its schema up to date
    Init,
    /// Show row counts, file size and schema version
    Stats(StatsArgs),
    /// Reclaim free pages
    Vacuum,
    /// Copy the store to a backup file
    Backup(BackupArgs),
    /// List settings
    Settings(SettingsArgs),
    /// Print one setting
    Get(GetArgs),
    /// Create or update one setting
    Set(SetArgs),
    /// Show recent audit log entries
    Audit(AuditArgs),
    /// Show version and build information
    Version,
}

#[derive(Args, Clone)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct BackupArgs {
    /// Destination file (defaults to a timestamped copy beside the store)
    pub dest: Option<PathBuf>,
}

#[derive(Args, Clone)]
pub struct SettingsArgs {
    /// Only show this category
    #[arg(long)]
    pub category: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct GetArgs {
    pub category: String,
    pub key: String,
}

#[derive(Args, Clone)]
pub struct SetArgs {
    pub category: String,
    pub key: String,
    pub value: String,

    /// Value type: string, integer, float, boolean, json
    #[arg(long = "type", default_value = "string")]
    pub value_type: String,

    /// Human-readable description
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Clone)]
pub struct AuditArgs {
    /// Only entries with this action
    #[arg(long)]
    pub action: Option<String>,

    /// Only entries for this resource type
    #[arg(long)]
    pub resource_type: Option<String>,

    /// Maximum number of entries
    #[arg(long, default_value = "100")]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_with_type() {
        let cli = Cli::try_parse_from([
            "hexstrike-db",
            "--db-path",
            "/tmp/x.db",
            "set",
            "server",
            "port",
            "9999",
            "--type",
            "integer",
        ])
        .unwrap();
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/x.db")));
        match cli.command {
            Commands::Set(args) => {
                assert_eq!(args.category, "server");
                assert_eq!(args.value, "9999");
                assert_eq!(args.value_type, "integer");
            }
            _ => panic!("expected set"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["hexstrike-db", "stats", "--json", "-vv", "--no-color"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_color);
        assert!(matches!(cli.command, Commands::Stats(StatsArgs { json: true })));
    }

    #[test]
    fn test_audit_default_limit() {
        let cli = Cli::try_parse_from(["hexstrike-db", "audit"]).unwrap();
        match cli.command {
            Commands::Audit(args) => assert_eq!(args.limit, 100),
            _ => panic!("expected audit"),
        }
    }
}
