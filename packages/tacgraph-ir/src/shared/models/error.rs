//! Error types for the tacgraph-ir crate
//!
//! Lowering itself never fails: unsupported or malformed syntax degrades to
//! placeholder instructions. Errors are raised only at the edges of the
//! pipeline (language lookup, parsing, scoped extraction, configuration).

use std::fmt;

/// Error kind categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown language or grammar/parse failure
    Parse,
    /// Lowering driver errors (never raised for a valid tree)
    Lowering,
    /// CFG construction / rendering errors
    FlowGraph,
    /// Data-flow analysis errors
    DataFlow,
    /// Lookup of a function or label that does not exist
    NotFound,
    /// Configuration errors
    Config,
    /// IO errors
    IO,
    /// Serialization errors
    Serialization,
    /// Internal errors (bugs)
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Lowering => "lowering",
            ErrorKind::FlowGraph => "flow_graph",
            ErrorKind::DataFlow => "data_flow",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Config => "config",
            ErrorKind::IO => "io",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Unified error type
#[derive(Debug)]
pub struct TacError {
    pub kind: ErrorKind,
    pub message: String,
    pub file_path: Option<String>,
    pub line: Option<u32>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TacError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file_path: None,
            line: None,
            source: None,
        }
    }

    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn lowering(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lowering, message)
    }

    pub fn flow_graph(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FlowGraph, message)
    }

    pub fn data_flow(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataFlow, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl fmt::Display for TacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)?;
        if let Some(ref file) = self.file_path {
            write!(f, " in {}", file)?;
            if let Some(line) = self.line {
                write!(f, ":{}", line)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for TacError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TacError>;

impl From<serde_json::Error> for TacError {
    fn from(err: serde_json::Error) -> Self {
        TacError::new(
            ErrorKind::Serialization,
            format!("JSON serialization error: {}", err),
        )
        .with_source(err)
    }
}

impl From<std::io::Error> for TacError {
    fn from(err: std::io::Error) -> Self {
        TacError::new(ErrorKind::IO, format!("IO error: {}", err)).with_source(err)
    }
}
