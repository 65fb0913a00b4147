//! Session and config command implementations.

use crate::cli::{ConfigAction, ConfigArgs, SessionAction, SessionArgs};
use crate::config::{Config, OutputFormat};
use crate::desk::Desk;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::session_file::new_session;
use ecodefense_domain::Session;

/// Execute the session command.
pub fn execute_session(
    args: SessionArgs,
    desk: &mut Desk,
    session: &mut Session,
    formatter: &Formatter,
) -> Result<()> {
    match args.action.unwrap_or(SessionAction::Show) {
        SessionAction::Show => {
            println!("{}", formatter.format_session(session)?);
        }
        SessionAction::Reset => {
            *session = new_session(desk.config());
            println!("{}", formatter.success("Session reset"));
        }
    }
    Ok(())
}

/// Execute the config command.
pub fn execute_config(args: ConfigArgs, desk: &mut Desk, formatter: &Formatter) -> Result<()> {
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => match formatter.format() {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(desk.config())?),
            _ => print!("{}", desk.config().to_toml()?),
        },
        ConfigAction::Path => {
            println!("{}", desk.config_path()?.display());
        }
        ConfigAction::Init { force } => {
            let path = desk.config_path()?;
            if path.exists() && !force {
                return Err(CliError::InvalidInput(format!(
                    "{} already exists; pass --force to overwrite",
                    path.display()
                )));
            }
            Config::default().save_to(&path)?;
            println!(
                "{}",
                formatter.success(&format!("Wrote {}", path.display()))
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reset_keeps_configured_signer() {
        let mut config = Config::default();
        config.signature.title = "Gerente Ambiental".to_string();
        let mut desk = Desk::new(config).unwrap();
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        let mut session = Session::new();
        session.queue.push("Apresentar cronograma de obras");
        execute_session(
            SessionArgs {
                action: Some(SessionAction::Reset),
            },
            &mut desk,
            &mut session,
            &formatter,
        )
        .unwrap();

        assert!(session.queue.is_empty());
        assert_eq!(session.signer_title, "Gerente Ambiental");
    }

    #[test]
    fn test_config_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut desk = Desk::new(Config::default()).unwrap().with_config_path(&path);
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let init = |force| ConfigArgs {
            action: Some(ConfigAction::Init { force }),
        };

        execute_config(init(false), &mut desk, &formatter).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        std::fs::write(&path, "[signature]\nname = \"Outro\"\n").unwrap();
        assert!(execute_config(init(false), &mut desk, &formatter).is_err());
        execute_config(init(true), &mut desk, &formatter).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());
    }
}
