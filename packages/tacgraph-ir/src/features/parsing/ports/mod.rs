//! Parsing ports

pub mod language;

pub use language::LanguageId;
