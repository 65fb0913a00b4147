//! Session module - the state one operator owns while reviewing a licence
//!
//! Pipeline calls never touch a `Session`; callers apply their results here
//! between calls. Every method documents what it mutates.

use crate::registrant::{RegistrantField, RegistrantRecord};
use crate::report::{Report, ReportItem, SignatureBlock, DEFAULT_SIGNER_NAME, DEFAULT_SIGNER_TITLE};
use crate::requirement::RequirementQueue;
use crate::traits::Passage;
use crate::verbosity::VerbosityMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by session operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No requirement is open in the editor
    #[error("No requirement is open; select one from the queue first")]
    NoDraft,

    /// The open requirement has no response yet
    #[error("The open requirement has no response yet; generate or type one first")]
    NoResponse,

    /// Queue index out of range
    #[error("Queue index {index} out of range (queue has {len} items)")]
    QueueIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Queue length
        len: usize,
    },

    /// Report index out of range
    #[error("Report index {index} out of range (report has {len} items)")]
    ReportIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Report length
        len: usize,
    },
}

/// The in-progress edit buffer for one requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    /// Requirement text (editable by the operator)
    pub requirement: String,

    /// Queue position the requirement was taken from, if any
    pub queue_index: Option<usize>,

    /// Queue text at the time the draft was opened
    #[serde(default)]
    pub source_requirement: Option<String>,

    /// Verbosity mode for generation
    #[serde(default)]
    pub mode: VerbosityMode,

    /// Generated or typed response
    #[serde(default)]
    pub response: Option<String>,

    /// Context the response was generated against
    #[serde(default)]
    pub context: Option<String>,

    /// Passages behind `context`
    #[serde(default)]
    pub passages: Vec<Passage>,

    /// Why retrieval gave no context, when it was unavailable
    #[serde(default)]
    pub retrieval_unavailable: Option<String>,
}

impl Draft {
    /// Draft for a free-form requirement typed by the operator
    pub fn manual(requirement: impl Into<String>) -> Self {
        Self {
            requirement: requirement.into(),
            queue_index: None,
            source_requirement: None,
            mode: VerbosityMode::default(),
            response: None,
            context: None,
            passages: Vec::new(),
            retrieval_unavailable: None,
        }
    }
}

/// Review session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Registrant data (imported or typed)
    #[serde(default)]
    pub registrant: RegistrantRecord,

    /// Requirements awaiting a response
    #[serde(default)]
    pub queue: RequirementQueue,

    /// Approved responses
    #[serde(default)]
    pub report: Report,

    /// Requirement currently open in the editor
    #[serde(default)]
    pub draft: Option<Draft>,

    /// Name printed in the signature block
    #[serde(default = "default_signer_name")]
    pub signer_name: String,

    /// Title printed in the signature block
    #[serde(default = "default_signer_title")]
    pub signer_title: String,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            registrant: RegistrantRecord::default(),
            queue: RequirementQueue::default(),
            report: Report::default(),
            draft: None,
            signer_name: default_signer_name(),
            signer_title: default_signer_title(),
        }
    }
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registrant record (re-import). Mutates `registrant`.
    pub fn replace_registrant(&mut self, record: RegistrantRecord) {
        self.registrant = record;
    }

    /// Edit one registrant field by hand. Mutates `registrant`.
    pub fn set_registrant_field(&mut self, field: RegistrantField, value: impl Into<String>) {
        self.registrant.set(field, value);
    }

    /// Replace the pending requirements. Mutates `queue` and drops any
    /// draft that pointed into the old queue.
    pub fn replace_queue(&mut self, requirements: Vec<String>) {
        self.queue = RequirementQueue::from_requirements(requirements);
        if self.draft.as_ref().is_some_and(|d| d.queue_index.is_some()) {
            self.draft = None;
        }
    }

    /// Open the queued requirement at `index` in the editor. Mutates `draft`.
    pub fn open_draft(&mut self, index: usize) -> Result<&Draft, SessionError> {
        let requirement = self
            .queue
            .get(index)
            .ok_or(SessionError::QueueIndexOutOfRange {
                index,
                len: self.queue.len(),
            })?
            .to_string();

        let mode = self.draft.as_ref().map(|d| d.mode).unwrap_or_default();
        Ok(self.draft.insert(Draft {
            requirement: requirement.clone(),
            queue_index: Some(index),
            source_requirement: Some(requirement),
            mode,
            response: None,
            context: None,
            passages: Vec::new(),
            retrieval_unavailable: None,
        }))
    }

    /// Open a free-form requirement in the editor. Mutates `draft`.
    pub fn open_manual_draft(&mut self, requirement: impl Into<String>) -> &Draft {
        self.draft.insert(Draft::manual(requirement))
    }

    /// Current draft
    pub fn draft(&self) -> Result<&Draft, SessionError> {
        self.draft.as_ref().ok_or(SessionError::NoDraft)
    }

    /// Current draft, mutably
    pub fn draft_mut(&mut self) -> Result<&mut Draft, SessionError> {
        self.draft.as_mut().ok_or(SessionError::NoDraft)
    }

    /// Store a generated response and the context it used. Mutates `draft`.
    pub fn set_draft_response(
        &mut self,
        response: impl Into<String>,
        context: impl Into<String>,
    ) -> Result<(), SessionError> {
        let draft = self.draft_mut()?;
        draft.response = Some(response.into());
        draft.context = Some(context.into());
        Ok(())
    }

    /// Discard the draft without touching the queue or the report
    pub fn cancel_draft(&mut self) -> Option<Draft> {
        self.draft.take()
    }

    /// Approve a report item, consuming its queue entry when it came from the queue
    ///
    /// Mutates `report` and, when `origin` is in range, `queue`. Returns the
    /// item's position in the report.
    pub fn approve(&mut self, item: ReportItem, origin: Option<usize>) -> usize {
        if let Some(index) = origin {
            self.queue.remove(index);
        }
        self.report.approve(item)
    }

    /// Approve the open draft under `title` (or the suggested title)
    ///
    /// The queue entry is consumed only if it still holds the text the draft
    /// was opened with; if the queue shifted, the entry is located by text.
    /// Mutates `report`, `queue` and `draft`.
    pub fn approve_draft(&mut self, title: Option<&str>) -> Result<usize, SessionError> {
        let draft = self.draft()?;
        let response = draft.response.clone().ok_or(SessionError::NoResponse)?;

        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| self.report.next_title());
        let item = ReportItem::new(title, draft.requirement.clone(), response);
        let origin = self.locate_origin(draft);

        let position = self.approve(item, origin);
        self.draft = None;
        Ok(position)
    }

    /// Remove an approved item from the report. Mutates `report`.
    pub fn remove_report_item(&mut self, index: usize) -> Result<ReportItem, SessionError> {
        let len = self.report.len();
        self.report
            .remove(index)
            .ok_or(SessionError::ReportIndexOutOfRange { index, len })
    }

    /// Signature block for rendering
    pub fn signature(&self) -> SignatureBlock {
        SignatureBlock::from_registrant(&self.registrant, &self.signer_name, &self.signer_title)
    }

    fn locate_origin(&self, draft: &Draft) -> Option<usize> {
        let index = draft.queue_index?;
        let source = draft.source_requirement.as_deref()?;

        if self.queue.get(index) == Some(source) {
            return Some(index);
        }
        self.queue.iter().position(|queued| queued == source)
    }
}

fn default_signer_name() -> String {
    DEFAULT_SIGNER_NAME.to_string()
}

fn default_signer_title() -> String {
    DEFAULT_SIGNER_TITLE.to_string()
}
