//! Registrant command implementation.

use crate::cli::{RegistrantAction, RegistrantArgs};
use crate::commands::join_text;
use crate::error::Result;
use crate::output::Formatter;
use ecodefense_domain::Session;

/// Execute the registrant command.
pub fn execute_registrant(
    args: RegistrantArgs,
    session: &mut Session,
    formatter: &Formatter,
) -> Result<()> {
    match args.action.unwrap_or(RegistrantAction::Show) {
        RegistrantAction::Show => {
            println!("{}", formatter.format_registrant(&session.registrant)?);
        }
        RegistrantAction::Set { field, value } => {
            let value = join_text(&value, "Value")?;
            session.set_registrant_field(field, value);
            println!("{}", formatter.success(&format!("{} updated", field.label())));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use ecodefense_domain::RegistrantField;

    #[test]
    fn test_set_field() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let mut session = Session::new();

        execute_registrant(
            RegistrantArgs {
                action: Some(RegistrantAction::Set {
                    field: RegistrantField::TaxId,
                    value: vec!["12.345.678/0001-90".to_string()],
                }),
            },
            &mut session,
            &formatter,
        )
        .unwrap();

        assert_eq!(session.registrant.tax_id, "12.345.678/0001-90");
        assert_eq!(session.registrant.company, "");
    }

    #[test]
    fn test_empty_value_rejected() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let mut session = Session::new();
        session.set_registrant_field(RegistrantField::City, "Blumenau");

        let result = execute_registrant(
            RegistrantArgs {
                action: Some(RegistrantAction::Set {
                    field: RegistrantField::City,
                    value: vec![],
                }),
            },
            &mut session,
            &formatter,
        );

        assert!(result.is_err());
        assert_eq!(session.registrant.city, "Blumenau");
    }
}
