//! Registrant field parsing from labelled model output

use ecodefense_domain::{RegistrantField, RegistrantRecord};
use once_cell::sync::Lazy;
use regex::Regex;

/// Field → label pattern; the value is the rest of the line after the colon
static FIELD_PATTERNS: Lazy<Vec<(RegistrantField, Regex)>> = Lazy::new(|| {
    vec![
        (
            RegistrantField::Company,
            Regex::new(r"(?i)\b(?:COMPANY|EMPRESA)[ \t*]*:[ \t*]*(\S[^\r\n]*)").unwrap(),
        ),
        (
            RegistrantField::TaxId,
            Regex::new(r"(?i)\b(?:TAX[ _]ID|CNPJ)[ \t*]*:[ \t*]*(\S[^\r\n]*)").unwrap(),
        ),
        (
            RegistrantField::Address,
            Regex::new(r"(?i)\b(?:ADDRESS|ENDERE[CÇ]O)[ \t*]*:[ \t*]*(\S[^\r\n]*)")
                .unwrap(),
        ),
        (
            RegistrantField::City,
            Regex::new(r"(?i)\b(?:CITY|CIDADE)[ \t*]*:[ \t*]*(\S[^\r\n]*)").unwrap(),
        ),
    ]
});

/// Outcome of a registrant parse
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistrantParse {
    /// Parsed record; unmatched fields stay empty
    pub record: RegistrantRecord,

    /// Fields no label matched, in canonical order
    pub missing: Vec<RegistrantField>,
}

impl RegistrantParse {
    /// True when every field was found
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Parse `LABEL: value` lines into a registrant record
///
/// Each field is searched independently; the first match wins and the value
/// is trimmed but otherwise left as written. Never fails.
pub fn parse_registrant(text: &str) -> RegistrantParse {
    let mut record = RegistrantRecord::default();
    let mut missing = Vec::new();

    for (field, pattern) in FIELD_PATTERNS.iter() {
        let value = pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().trim_end_matches('*').trim())
            .filter(|v| !v.is_empty());

        match value {
            Some(value) => record.set(*field, value),
            None => missing.push(*field),
        }
    }

    RegistrantParse { record, missing }
}
