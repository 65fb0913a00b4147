//! Interactive REPL (Read-Eval-Print Loop) mode.

use crate::cli::{
    ApproveArgs, Command, ConfigAction, ConfigArgs, EditArgs, GenerateArgs, ImportArgs, IndexArgs,
    OpenArgs, QueueAction, QueueArgs, RegistrantAction, RegistrantArgs, RenderArgs, ReportAction,
    ReportArgs, SessionAction, SessionArgs, SignerArgs,
};
use crate::cli::{parse_field, parse_mode};
use crate::commands;
use crate::config::Config;
use crate::desk::Desk;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::session_file::SessionFile;
use ecodefense_domain::Session;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

/// Run the interactive REPL, saving the session after every command.
pub fn run_repl(
    desk: &mut Desk,
    session: &mut Session,
    session_file: &SessionFile,
    formatter: &Formatter,
) -> Result<()> {
    println!(
        "{}",
        formatter.info("EcoDefense REPL - Type 'help' for commands, 'exit' to quit")
    );
    println!();

    // Initialize readline editor
    let editor_config = rustyline::Config::builder()
        .max_history_size(desk.config().settings.history_size)
        .map_err(readline_error)?
        .build();
    let mut editor = DefaultEditor::with_config(editor_config).map_err(readline_error)?;

    // Load history
    let history_path = Config::history_path()?;
    let _ = editor.load_history(&history_path);

    loop {
        let prompt = prompt(session);

        match editor.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                editor.add_history_entry(line).ok();

                // Parse command
                match parse_repl_command(line) {
                    Ok(ReplCommand::Exit) => {
                        println!("{}", formatter.info("Goodbye!"));
                        break;
                    }
                    Ok(ReplCommand::Help) => {
                        print_help(formatter);
                    }
                    Ok(ReplCommand::Command(cmd)) => {
                        if let Err(e) = commands::execute(cmd, desk, session, formatter) {
                            eprintln!("{}", formatter.error(&e.to_string()));
                        }
                        if let Err(e) = session_file.save(session) {
                            eprintln!("{}", formatter.error(&format!("Session not saved: {}", e)));
                        }
                    }
                    Err(e) => {
                        eprintln!("{}", formatter.error(&e.to_string()));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", formatter.info("Use 'exit' to quit"));
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("{}", formatter.error(&format!("Error: {}", err)));
                break;
            }
        }
    }

    // Save history
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    editor.save_history(&history_path).ok();

    Ok(())
}

fn readline_error(e: ReadlineError) -> CliError {
    CliError::Io(std::io::Error::other(format!(
        "Failed to initialize editor: {}",
        e
    )))
}

/// Prompt showing pending and approved counts, and an open draft.
fn prompt(session: &Session) -> String {
    let draft = if session.draft.is_some() { " *" } else { "" };
    format!(
        "ecodefense [{} pending, {} approved{}]> ",
        session.queue.len(),
        session.report.len(),
        draft
    )
}

/// REPL command type.
#[derive(Debug)]
enum ReplCommand {
    Exit,
    Help,
    Command(Command),
}

/// Parse a REPL command line.
fn parse_repl_command(line: &str) -> Result<ReplCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.is_empty() {
        return Err(CliError::InvalidInput("Empty command".to_string()));
    }

    let args = &parts[1..];
    let command = match parts[0] {
        "exit" | "quit" | "q" => return Ok(ReplCommand::Exit),
        "help" | "?" => return Ok(ReplCommand::Help),
        "import" => parse_import(args, false)?,
        "import-registrant" => parse_import(args, true)?,
        "registrant" => parse_registrant(args)?,
        "queue" => parse_queue(args)?,
        "add" => Command::Queue(QueueArgs {
            action: Some(QueueAction::Add { text: words(args) }),
        }),
        "open" => parse_open(args)?,
        "manual" => Command::Open(OpenArgs {
            index: None,
            text: Some(args.join(" ")),
            mode: None,
        }),
        "generate" | "gen" => Command::Generate(parse_generate(args)?),
        "regenerate" | "again" => Command::Regenerate(parse_generate(args)?),
        "edit" => Command::Edit(EditArgs {
            requirement: false,
            text: words(args),
        }),
        "edit-requirement" => Command::Edit(EditArgs {
            requirement: true,
            text: words(args),
        }),
        "draft" | "show" => Command::Draft,
        "approve" => Command::Approve(ApproveArgs {
            title: (!args.is_empty()).then(|| args.join(" ")),
        }),
        "cancel" => Command::Cancel,
        "report" => parse_report(args)?,
        "signer" => parse_signer(args)?,
        "render" => Command::Render(RenderArgs {
            output: args.first().map(PathBuf::from),
            date: None,
        }),
        "index" => Command::Index(IndexArgs {
            corpus: PathBuf::from(required(args, "Usage: index <corpus-directory>")?),
        }),
        "sources" => Command::Sources,
        "status" | "session" => parse_session(args)?,
        "config" => Command::Config(ConfigArgs {
            action: match args.first() {
                Some(&"path") => Some(ConfigAction::Path),
                _ => Some(ConfigAction::Show),
            },
        }),
        other => {
            return Err(CliError::InvalidInput(format!(
                "Unknown command: {}. Type 'help' for available commands.",
                other
            )))
        }
    };

    Ok(ReplCommand::Command(command))
}

// Simple command parsers for REPL (minimal argument parsing)

fn words(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

fn required<'a>(args: &[&'a str], usage: &str) -> Result<&'a str> {
    args.first()
        .copied()
        .ok_or_else(|| CliError::InvalidInput(usage.to_string()))
}

fn position(arg: &str) -> Result<usize> {
    arg.parse()
        .map_err(|_| CliError::InvalidInput(format!("'{}' is not a position", arg)))
}

fn parse_import(args: &[&str], registrant_only: bool) -> Result<Command> {
    if args.is_empty() {
        return Err(CliError::InvalidInput("Usage: import <file.pdf>".to_string()));
    }

    Ok(Command::Import(ImportArgs {
        file: PathBuf::from(args.join(" ")),
        registrant_only,
    }))
}

fn parse_registrant(args: &[&str]) -> Result<Command> {
    let action = match args.first() {
        None | Some(&"show") => RegistrantAction::Show,
        Some(&"set") if args.len() >= 3 => RegistrantAction::Set {
            field: parse_field(args[1]).map_err(CliError::InvalidInput)?,
            value: words(&args[2..]),
        },
        _ => {
            return Err(CliError::InvalidInput(
                "Usage: registrant [show | set <field> <value>]".to_string(),
            ))
        }
    };

    Ok(Command::Registrant(RegistrantArgs {
        action: Some(action),
    }))
}

fn parse_queue(args: &[&str]) -> Result<Command> {
    let action = match args.first() {
        None | Some(&"list") => QueueAction::List,
        Some(&"add") => QueueAction::Add {
            text: words(&args[1..]),
        },
        Some(&"remove") | Some(&"rm") => QueueAction::Remove {
            index: position(required(&args[1..], "Usage: queue remove <n>")?)?,
        },
        Some(&"clear") => QueueAction::Clear,
        _ => {
            return Err(CliError::InvalidInput(
                "Usage: queue [list | add <text> | remove <n> | clear]".to_string(),
            ))
        }
    };

    Ok(Command::Queue(QueueArgs {
        action: Some(action),
    }))
}

fn parse_open(args: &[&str]) -> Result<Command> {
    let index = position(required(args, "Usage: open <n> [mode]")?)?;
    let mode = match args.get(1) {
        Some(m) => Some(parse_mode(m).map_err(CliError::InvalidInput)?),
        None => None,
    };

    Ok(Command::Open(OpenArgs {
        index: Some(index),
        text: None,
        mode,
    }))
}

fn parse_generate(args: &[&str]) -> Result<GenerateArgs> {
    let mode = match args.first() {
        Some(m) => Some(parse_mode(m).map_err(CliError::InvalidInput)?),
        None => None,
    };
    Ok(GenerateArgs { mode })
}

fn parse_report(args: &[&str]) -> Result<Command> {
    let action = match args.first() {
        None | Some(&"list") => ReportAction::List,
        Some(&"remove") | Some(&"rm") => ReportAction::Remove {
            index: position(required(&args[1..], "Usage: report remove <n>")?)?,
        },
        _ => {
            return Err(CliError::InvalidInput(
                "Usage: report [list | remove <n>]".to_string(),
            ))
        }
    };

    Ok(Command::Report(ReportArgs {
        action: Some(action),
    }))
}

fn parse_signer(args: &[&str]) -> Result<Command> {
    let value = || args[1..].join(" ");
    let signer = match args.first() {
        None => SignerArgs {
            name: None,
            title: None,
        },
        Some(&"name") if args.len() > 1 => SignerArgs {
            name: Some(value()),
            title: None,
        },
        Some(&"title") if args.len() > 1 => SignerArgs {
            name: None,
            title: Some(value()),
        },
        _ => {
            return Err(CliError::InvalidInput(
                "Usage: signer [name <text> | title <text>]".to_string(),
            ))
        }
    };

    Ok(Command::Signer(signer))
}

fn parse_session(args: &[&str]) -> Result<Command> {
    let action = match args.first() {
        None | Some(&"show") => SessionAction::Show,
        Some(&"reset") => SessionAction::Reset,
        _ => {
            return Err(CliError::InvalidInput(
                "Usage: session [show | reset]".to_string(),
            ))
        }
    };

    Ok(Command::Session(SessionArgs {
        action: Some(action),
    }))
}

/// Print help message.
fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Available commands:"));
    println!();
    println!("  import <file.pdf>                 Import registrant and requirements");
    println!("  import-registrant <file.pdf>      Import registrant only (clears the queue)");
    println!("  registrant [set <field> <value>]  Show or edit registrant data");
    println!("  queue [add <text> | remove <n> | clear]");
    println!("                                    Show or edit pending requirements");
    println!("  add <text>                        Append a requirement");
    println!("  open <n> [mode]                   Open queued requirement n");
    println!("  manual <text>                     Open a free-form requirement");
    println!("  generate [mode]                   Generate a response (terse, balanced, detailed)");
    println!("  again [mode]                      Generate another candidate");
    println!("  edit <text>                       Replace the response by hand");
    println!("  edit-requirement <text>           Replace the requirement text");
    println!("  show                              Show the open requirement");
    println!("  approve [title]                   Approve the response into the report");
    println!("  cancel                            Discard the open requirement");
    println!("  report [remove <n>]               Show or edit the report");
    println!("  signer [name <text> | title <text>]");
    println!("                                    Show or set the signer");
    println!("  render [file.pdf]                 Write the report PDF");
    println!("  index <dir>                       Rebuild the knowledge base");
    println!("  sources                           List knowledge base documents");
    println!("  status [reset]                    Show or reset the session");
    println!("  config [path]                     Show the configuration");
    println!("  help                              Show this help");
    println!("  exit                              Exit REPL");
    println!();
}
