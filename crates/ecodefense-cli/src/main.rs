//! EcoDefense CLI - respond to environmental licence requirements.

use clap::Parser;
use ecodefense_cli::{commands, repl};
use ecodefense_cli::{Cli, Command, Config, Desk, Formatter, SessionFile};
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so command output on stdout stays clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> ecodefense_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load config from the given file or the default location
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::path()?,
    };
    let config = Config::load_from(&config_path)?;

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    let session_file = SessionFile::resolve(cli.session)?;
    let mut session = session_file.load(&config)?;
    let mut desk = Desk::new(config)?.with_config_path(config_path);

    // Handle commands
    match cli.command {
        None | Some(Command::Repl) => {
            // Enter REPL mode
            repl::run_repl(&mut desk, &mut session, &session_file, &formatter)?;
        }
        Some(cmd) => {
            commands::execute(cmd, &mut desk, &mut session, &formatter)?;
            session_file.save(&session)?;
        }
    }

    Ok(())
}
