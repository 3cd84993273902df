pub mod assertion;
pub mod complaint;
pub mod config;
pub mod cop;
pub mod extractor;
pub mod rules;
pub mod suppression;
pub mod tagger;
pub mod types;

pub use complaint::Complaint;
pub use config::{Config, RuleParameters};
pub use cop::Cop;
pub use extractor::{Batch, Extraction, ExtractionError, Extractor};
pub use suppression::Suppressions;
pub use types::*;
