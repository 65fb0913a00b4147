//! Registrant module - the licensee's identifying data

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four registrant fields extracted from a licence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrantField {
    /// Legal company name
    Company,

    /// Tax identifier (CNPJ for Brazilian licences)
    TaxId,

    /// Street address
    Address,

    /// City (usually with state suffix)
    City,
}

impl RegistrantField {
    /// All fields, in canonical order
    pub const ALL: [RegistrantField; 4] = [
        RegistrantField::Company,
        RegistrantField::TaxId,
        RegistrantField::Address,
        RegistrantField::City,
    ];

    /// Key used in serialized records
    pub fn key(&self) -> &'static str {
        match self {
            RegistrantField::Company => "company",
            RegistrantField::TaxId => "tax_id",
            RegistrantField::Address => "address",
            RegistrantField::City => "city",
        }
    }

    /// Canonical label used in the `LABEL: value` text format
    pub fn label(&self) -> &'static str {
        match self {
            RegistrantField::Company => "COMPANY",
            RegistrantField::TaxId => "TAX_ID",
            RegistrantField::Address => "ADDRESS",
            RegistrantField::City => "CITY",
        }
    }

    /// Parse a field from its key or label (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(' ', "_").as_str() {
            "company" | "empresa" => Some(RegistrantField::Company),
            "tax_id" | "taxid" | "cnpj" => Some(RegistrantField::TaxId),
            "address" | "endereco" | "endereço" => Some(RegistrantField::Address),
            "city" | "cidade" => Some(RegistrantField::City),
            _ => None,
        }
    }
}

impl fmt::Display for RegistrantField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Registrant data for one licence
///
/// All four fields are always present. A field the model did not return is
/// an empty string, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrantRecord {
    /// Legal company name
    #[serde(default)]
    pub company: String,

    /// Tax identifier
    #[serde(default)]
    pub tax_id: String,

    /// Street address
    #[serde(default)]
    pub address: String,

    /// City
    #[serde(default)]
    pub city: String,
}

impl RegistrantRecord {
    /// Get the value of a field
    pub fn get(&self, field: RegistrantField) -> &str {
        match field {
            RegistrantField::Company => &self.company,
            RegistrantField::TaxId => &self.tax_id,
            RegistrantField::Address => &self.address,
            RegistrantField::City => &self.city,
        }
    }

    /// Set the value of a field
    pub fn set(&mut self, field: RegistrantField, value: impl Into<String>) {
        let value = value.into();
        match field {
            RegistrantField::Company => self.company = value,
            RegistrantField::TaxId => self.tax_id = value,
            RegistrantField::Address => self.address = value,
            RegistrantField::City => self.city = value,
        }
    }

    /// Fields that currently hold an empty value
    pub fn missing_fields(&self) -> Vec<RegistrantField> {
        RegistrantField::ALL
            .into_iter()
            .filter(|field| self.get(*field).trim().is_empty())
            .collect()
    }

    /// True when every field is empty
    pub fn is_empty(&self) -> bool {
        self.missing_fields().len() == RegistrantField::ALL.len()
    }

    /// Render the record in the canonical `LABEL: value` text format
    ///
    /// # Examples
    ///
    /// ```
    /// use ecodefense_domain::RegistrantRecord;
    ///
    /// let record = RegistrantRecord {
    ///     company: "Acme".to_string(),
    ///     ..Default::default()
    /// };
    /// assert!(record.to_canonical().starts_with("COMPANY: Acme\n"));
    /// ```
    pub fn to_canonical(&self) -> String {
        RegistrantField::ALL
            .iter()
            .map(|field| format!("{}: {}", field.label(), self.get(*field)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
