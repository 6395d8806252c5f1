pub mod builder;
pub mod collection;
pub mod duplication;
pub mod finding;
pub mod filtered_log;
pub mod json;

pub use builder::FindingBuilder;
pub use collection::Report;
pub use duplication::DuplicationGroup;
pub use finding::{AdditionalProperties, Finding, LineRange, Severity};
pub use filtered_log::FilteredLog;
