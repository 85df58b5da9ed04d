use clap::Parser;
use hexstrike::cli;
use hexstrike::config::{self, HexstrikeConfig, LogFormat};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = cli::Cli::parse();

    let config = match &cli.config {
        Some(path) => config::parse_config(path),
        None => Ok(HexstrikeConfig::default()),
    };
    init_logging(&cli, config.as_ref().ok());

    let result = config.and_then(|config| cli::run(cli, &config));

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn init_logging(cli: &cli::Cli, config: Option<&HexstrikeConfig>) {
    let configured = config.and_then(|c| c.log_level()).unwrap_or("info");
    let log_level = match cli.verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.map(|c| c.log_format()).unwrap_or_default() {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.with_ansi(!cli.no_color).init(),
    }
}
