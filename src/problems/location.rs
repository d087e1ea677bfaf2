//! Source locations attached to reported problems.
//!
//! A location is display/navigation metadata only: it never acts as an identity
//! and the path is not checked for existence.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in a source artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    /// A whole file.
    File { path: String },
    /// A byte/character range inside a file. `offset` is zero-based.
    OffsetInFile {
        path: String,
        offset: u32,
        length: u32,
    },
    /// A line inside a file. `line` is one-based.
    LineInFile {
        path: String,
        line: u32,
        #[serde(default)]
        column: Option<u32>,
        #[serde(default)]
        length: Option<u32>,
    },
}

impl Location {
    pub fn file(path: impl Into<String>) -> Self {
        Self::File { path: path.into() }
    }

    pub fn offset_in_file(path: impl Into<String>, offset: u32, length: u32) -> Self {
        Self::OffsetInFile {
            path: path.into(),
            offset,
            length,
        }
    }

    pub fn line_in_file(path: impl Into<String>, line: u32) -> Self {
        Self::LineInFile {
            path: path.into(),
            line,
            column: None,
            length: None,
        }
    }

    /// Narrow a line location to a column span. No-op for other variants.
    pub fn with_column(self, column: u32, length: u32) -> Self {
        match self {
            Self::LineInFile { path, line, .. } => Self::LineInFile {
                path,
                line,
                column: Some(column),
                length: Some(length),
            },
            other => other,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::File { path } | Self::OffsetInFile { path, .. } | Self::LineInFile { path, .. } => {
                path
            }
        }
    }

    /// `(offset, length)` for offset locations.
    pub fn offset(&self) -> Option<(u32, u32)> {
        match self {
            Self::OffsetInFile { offset, length, .. } => Some((*offset, *length)),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path } => write!(f, "{path}"),
            Self::OffsetInFile {
                path,
                offset,
                length,
            } => write!(f, "{path}@{offset}+{length}"),
            Self::LineInFile {
                path, line, column, ..
            } => match column {
                Some(column) => write!(f, "{path}:{line}:{column}"),
                None => write!(f, "{path}:{line}"),
            },
        }
    }
}
