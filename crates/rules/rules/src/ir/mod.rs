pub mod filter;
pub mod optimize;
pub mod pattern;
pub mod rule;
pub mod template;
