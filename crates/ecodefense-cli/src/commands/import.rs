//! Import command implementation.

use crate::cli::ImportArgs;
use crate::desk::Desk;
use crate::error::Result;
use crate::output::Formatter;
use ecodefense_domain::Session;
use tracing::info;

/// Execute the import command.
///
/// A full import replaces the registrant and the queue. A registrant-only
/// import replaces the registrant and clears the queue.
pub fn execute_import(
    args: ImportArgs,
    desk: &mut Desk,
    session: &mut Session,
    formatter: &Formatter,
) -> Result<()> {
    let pipeline = desk.pipeline()?;
    info!(file = %args.file.display(), registrant_only = args.registrant_only, "Importing licence");

    if args.registrant_only {
        let import = desk.block_on(pipeline.import_registrant_only_file(&args.file))?;
        session.replace_registrant(import.registrant.clone());
        session.replace_queue(Vec::new());
        println!("{}", formatter.format_registrant_import(&import)?);
    } else {
        let import = desk.block_on(pipeline.import_full_file(&args.file))?;
        session.replace_registrant(import.registrant.clone());
        session.replace_queue(import.requirements.clone());
        println!("{}", formatter.format_import(&import)?);
    }

    Ok(())
}
