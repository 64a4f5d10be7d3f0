//! YAML rule files for astguard.
//!
//! Each rule names one or more patterns, an optional `where:` filter written
//! in the filter language of [`parse_filter`], and a report template.

mod dsl;
mod frontend;
mod parser;

pub use dsl::parse_filter;
pub use frontend::YamlFrontend;
