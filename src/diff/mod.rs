//! Incremental diff rendering for partially generated file rewrites.
//!
//! A streaming candidate is only a prefix of the eventual file, so original
//! lines it has not reached yet are treated as "not rendered yet" rather than
//! deleted. [`StreamingDiffRenderer`] works out how much of the original has
//! been superseded, diffs only that prefix, and wraps the result in a fenced
//! block that embedded backticks cannot close early.

pub mod aggregate;
pub mod alignment;
pub mod format;
pub mod lines;
pub mod render;
pub mod unified;

use thiserror::Error;

pub use aggregate::{
    create_structured_diff, optimize_diff_context, render_multi_file_diff, FileChange,
    FileDiff, StructuredDiff,
};
pub use alignment::{edit_script, find_last_non_deleted, EditOp};
pub use format::{create_progress_bar, fence_len, wrap_diff_block, Progress};
pub use lines::{assert_newlines, split_lines};
pub use render::{diff_partial_update, ContentResolver, StreamingDiffRenderer};
pub use unified::unified_diff;

/// Lines of unchanged context around each hunk.
pub const DEFAULT_CONTEXT_LINES: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiffError {
    /// A line other than the last one is missing its `\n` terminator.
    #[error("original line {line_index} is not newline-terminated: {line:?}")]
    MalformedInput { line_index: usize, line: String },
}
