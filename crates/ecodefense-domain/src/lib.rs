//! EcoDefense Domain Layer
//!
//! This crate contains the data model shared by every other crate in the
//! workspace. It defines what an operator works with during a review
//! session and the trait seams to the external services the pipeline calls.
//!
//! ## Key Concepts
//!
//! - **RegistrantRecord**: the licensee's identifying data (company, tax ID, address, city)
//! - **RequirementQueue**: compliance obligations awaiting a response, in document order
//! - **Report**: approved `{title, requirement, response}` items, in approval order
//! - **VerbosityMode**: terse / balanced / detailed response presets
//! - **Session**: the mutable state a single operator owns between pipeline calls
//!
//! ## Architecture
//!
//! - No I/O and no service clients here
//! - Pipeline operations are stateless; only `Session` carries state
//! - Trait definitions for the language model and the knowledge index

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod registrant;
pub mod report;
pub mod requirement;
pub mod session;
pub mod traits;
pub mod verbosity;

// Re-exports for convenience
pub use registrant::{RegistrantField, RegistrantRecord};
pub use report::{Report, ReportItem, SignatureBlock};
pub use requirement::RequirementQueue;
pub use session::{Draft, Session, SessionError};
pub use traits::{GenerationOptions, KnowledgeRetriever, LlmProvider, Passage};
pub use verbosity::VerbosityMode;
