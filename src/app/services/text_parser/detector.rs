//! Input format detection
//!
//! The detector only looks for a header row. File extensions are checked by
//! the caller before content ever reaches this point.

use crate::constants::STRUCTURED_HEADER_TOKEN;
use tracing::debug;

/// Classification of a text export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    /// Tab-delimited export; the header row is at `header_line_index`
    /// (zero-based, counted over every line of the content)
    Structured { header_line_index: usize },

    /// Delimited text without a usable header; fields are positional
    Loose,
}

impl FormatKind {
    pub fn is_structured(&self) -> bool {
        matches!(self, FormatKind::Structured { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            FormatKind::Structured { .. } => "structured",
            FormatKind::Loose => "loose",
        }
    }
}

/// Detect the format of raw file content
///
/// The first line whose first whitespace-delimited token is exactly
/// `Timestamp` marks a structured export. Anything else, including empty
/// content, is loose.
pub fn detect_format(content: &str, file_name: &str) -> FormatKind {
    let header = content
        .lines()
        .position(|line| line.split_whitespace().next() == Some(STRUCTURED_HEADER_TOKEN));

    let kind = match header {
        Some(header_line_index) => FormatKind::Structured { header_line_index },
        None => FormatKind::Loose,
    };
    debug!("Detected {} format for {}", kind.name(), file_name);
    kind
}
