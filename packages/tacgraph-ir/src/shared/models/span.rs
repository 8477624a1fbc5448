//! Source location attached to IR instructions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source span of the construct an instruction was lowered from.
///
/// Lines are 1-indexed, columns 0-indexed (tree-sitter convention).
/// The all-zero value is the "unknown" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl SourceLocation {
    pub const UNKNOWN: SourceLocation = SourceLocation {
        start_line: 0,
        start_col: 0,
        end_line: 0,
        end_col: 0,
    };

    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return write!(f, "<unknown>");
        }
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_sentinel() {
        assert!(SourceLocation::UNKNOWN.is_unknown());
        assert!(SourceLocation::default().is_unknown());
        assert_eq!(SourceLocation::UNKNOWN.to_string(), "<unknown>");
    }

    #[test]
    fn test_display_known() {
        let loc = SourceLocation::new(3, 4, 5, 0);
        assert!(!loc.is_unknown());
        assert_eq!(loc.to_string(), "3:4-5:0");
    }
}
