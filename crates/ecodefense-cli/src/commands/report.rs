//! Report, signer and render command implementations.

use crate::cli::{RenderArgs, ReportAction, ReportArgs, SignerArgs};
use crate::commands::to_index;
use crate::config::Config;
use crate::desk::Desk;
use crate::error::Result;
use crate::output::Formatter;
use chrono::NaiveDate;
use ecodefense_domain::Session;
use ecodefense_report::ReportRenderer;
use std::path::PathBuf;
use tracing::info;

/// Execute the report command.
pub fn execute_report(args: ReportArgs, session: &mut Session, formatter: &Formatter) -> Result<()> {
    match args.action.unwrap_or(ReportAction::List) {
        ReportAction::List => {
            println!("{}", formatter.format_report(&session.report)?);
        }
        ReportAction::Remove { index } => {
            let i = to_index(index)?;
            let item = session.remove_report_item(i)?;
            println!("{}", formatter.success(&format!("Removed '{}'", item.title)));
        }
    }
    Ok(())
}

/// Execute the signer command; with no option, show the current signer.
pub fn execute_signer(args: SignerArgs, session: &mut Session, formatter: &Formatter) -> Result<()> {
    if let Some(name) = args.name {
        session.signer_name = name.trim().to_string();
    }
    if let Some(title) = args.title {
        session.signer_title = title.trim().to_string();
    }

    println!(
        "{}",
        formatter.info(&format!(
            "Signed by {}, {}",
            session.signer_name, session.signer_title
        ))
    );
    Ok(())
}

/// Execute the render command.
pub fn execute_render(
    args: RenderArgs,
    desk: &Desk,
    session: &Session,
    formatter: &Formatter,
) -> Result<()> {
    let date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let path = match args.output {
        Some(path) => path,
        None => default_report_path(desk.config(), date),
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let renderer = ReportRenderer::new().with_title(desk.config().output.report_title.clone());
    renderer.render_to_file(&session.report, &session.signature(), date, &path)?;

    info!(path = %path.display(), items = session.report.len(), "Report written");
    println!(
        "{}",
        formatter.success(&format!(
            "Report with {} item(s) written to {}",
            session.report.len(),
            path.display()
        ))
    );
    Ok(())
}

/// `resposta-condicionantes-YYYY-MM-DD.pdf` in the configured directory.
fn default_report_path(config: &Config, date: NaiveDate) -> PathBuf {
    let name = format!("resposta-condicionantes-{}.pdf", date.format("%Y-%m-%d"));
    match &config.output.directory {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}
