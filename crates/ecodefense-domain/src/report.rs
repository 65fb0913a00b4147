//! Report module - approved responses in approval order

use crate::registrant::RegistrantRecord;
use serde::{Deserialize, Serialize};

/// One approved response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportItem {
    /// Heading shown in the rendered report
    pub title: String,

    /// Requirement text as approved (may be empty for free-form items)
    pub requirement: String,

    /// Response text as approved
    pub response: String,
}

impl ReportItem {
    /// Create a new report item
    pub fn new(
        title: impl Into<String>,
        requirement: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            requirement: requirement.into(),
            response: response.into(),
        }
    }
}

/// Approved items, in the order they were approved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report {
    items: Vec<ReportItem>,
}

impl Report {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an approved item and return its position
    pub fn approve(&mut self, item: ReportItem) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }

    /// Remove the item at `index`, keeping the rest in order
    pub fn remove(&mut self, index: usize) -> Option<ReportItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Approved items in approval order
    pub fn items(&self) -> &[ReportItem] {
        &self.items
    }

    /// Number of approved items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing has been approved yet
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Default title for the next approved item
    pub fn next_title(&self) -> String {
        format!("Item {}", self.items.len() + 1)
    }
}

/// Default signer name printed under the signature rule
pub const DEFAULT_SIGNER_NAME: &str = "Engenheiro Responsável";

/// Default signer title printed under the signer name
pub const DEFAULT_SIGNER_TITLE: &str = "Diretor Técnico";

/// The four strings printed in the report header and signature block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBlock {
    /// Company name (report header)
    pub company: String,

    /// City printed next to the date
    pub city: String,

    /// Signer name
    pub signer_name: String,

    /// Signer job title
    pub signer_title: String,
}

impl SignatureBlock {
    /// Build a signature block from a registrant record and signer details
    pub fn from_registrant(
        registrant: &RegistrantRecord,
        signer_name: impl Into<String>,
        signer_title: impl Into<String>,
    ) -> Self {
        Self {
            company: registrant.company.clone(),
            city: registrant.city.clone(),
            signer_name: signer_name.into(),
            signer_title: signer_title.into(),
        }
    }
}

impl Default for SignatureBlock {
    fn default() -> Self {
        Self {
            company: String::new(),
            city: String::new(),
            signer_name: DEFAULT_SIGNER_NAME.to_string(),
            signer_title: DEFAULT_SIGNER_TITLE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_title_counts_from_one() {
        let mut report = Report::new();
        assert_eq!(report.next_title(), "Item 1");

        report.approve(ReportItem::new("Item 1", "req", "resp"));
        assert_eq!(report.next_title(), "Item 2");
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut report = Report::new();
        report.approve(ReportItem::new("A", "", "a"));
        report.approve(ReportItem::new("B", "", "b"));
        report.approve(ReportItem::new("C", "", "c"));

        let removed = report.remove(0).unwrap();
        assert_eq!(removed.title, "A");

        let titles: Vec<_> = report.items().iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "C"]);
        assert!(report.remove(5).is_none());
    }

    #[test]
    fn test_signature_from_registrant() {
        let registrant = RegistrantRecord {
            company: "Acme Ltda".to_string(),
            city: "Sorocaba - SP".to_string(),
            ..Default::default()
        };

        let signature = SignatureBlock::from_registrant(&registrant, "Ana", "Engenheira");
        assert_eq!(signature.company, "Acme Ltda");
        assert_eq!(signature.city, "Sorocaba - SP");
        assert_eq!(signature.signer_name, "Ana");
    }

    #[test]
    fn test_default_signer() {
        let signature = SignatureBlock::default();
        assert_eq!(signature.signer_name, DEFAULT_SIGNER_NAME);
        assert_eq!(signature.signer_title, DEFAULT_SIGNER_TITLE);
    }
}
