//! Parsing feature
//!
//! Grammar binding plus one lowering profile per supported language.

pub mod infrastructure;
pub mod plugins;
pub mod ports;

pub use infrastructure::TreeSitterParser;
pub use plugins::registry::{profile_for, ProfileRegistry};
pub use ports::LanguageId;
