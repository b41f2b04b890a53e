use super::render::StreamingDiffRenderer;
use super::DiffError;
use serde::{Deserialize, Serialize};

/// A completed rewrite of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub original: Vec<String>,
    pub updated: Vec<String>,
}

impl FileChange {
    pub fn new(path: impl Into<String>, original: Vec<String>, updated: Vec<String>) -> Self {
        Self {
            path: path.into(),
            original,
            updated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    pub diff: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDiff {
    pub files: Vec<FileDiff>,
}

/// Render each change as a final diff and collect them per path.
pub fn create_structured_diff(changes: &[FileChange]) -> Result<StructuredDiff, DiffError> {
    let renderer = StreamingDiffRenderer::new();
    let files = changes
        .iter()
        .map(|change| {
            Ok(FileDiff {
                path: change.path.clone(),
                diff: renderer.render(
                    &change.original,
                    &change.updated,
                    true,
                    Some(change.path.as_str()),
                )?,
            })
        })
        .collect::<Result<Vec<_>, DiffError>>()?;
    Ok(StructuredDiff { files })
}

/// Concatenate the final diffs of every change, in input order.
pub fn render_multi_file_diff(changes: &[FileChange]) -> Result<String, DiffError> {
    Ok(create_structured_diff(changes)?
        .files
        .into_iter()
        .map(|file| file.diff)
        .collect())
}

fn is_header_line(line: &str) -> bool {
    line.starts_with("---") || line.starts_with("+++") || line.starts_with("@@")
}

fn is_change_line(line: &str) -> bool {
    line.starts_with('+') || line.starts_with('-')
}

/// Shrink a rendered diff to fit a rough token budget.
///
/// Diffs with at most `max_tokens / 10` lines come back unchanged. Longer
/// ones keep every header and every added/removed line, but only
/// `max_tokens / 20` context lines split between the start and the end. The
/// result regroups lines by kind and is meant for prompts, not for applying.
/// A fenced block is reduced inside its fences, which are kept as they are.
pub fn optimize_diff_context(diff_text: &str, max_tokens: usize) -> String {
    let Some((open, body, close)) = split_fence(diff_text) else {
        return reduce_context(diff_text, max_tokens);
    };

    let mut reduced = reduce_context(body, max_tokens);
    if !reduced.is_empty() && !reduced.ends_with('\n') {
        reduced.push('\n');
    }
    format!("{open}{reduced}{close}")
}

/// Split a block rendered by `wrap_diff_block` into opening fence line, body
/// and closing fence (with whatever trails it).
fn split_fence(text: &str) -> Option<(&str, &str, &str)> {
    let fence_len = text.chars().take_while(|&ch| ch == '`').count();
    if fence_len < 3 {
        return None;
    }
    let fence = &text[..fence_len];
    let body_start = text.find('\n')? + 1;
    let close_start = text[body_start - 1..]
        .rfind(&format!("\n{fence}\n"))
        .map(|index| body_start + index)?;
    Some((
        &text[..body_start],
        &text[body_start..close_start],
        &text[close_start..],
    ))
}

fn reduce_context(diff_text: &str, max_tokens: usize) -> String {
    let lines: Vec<&str> = diff_text.split('\n').collect();
    if lines.len() <= max_tokens / 10 {
        return diff_text.to_string();
    }

    let (header_lines, body_lines): (Vec<&str>, Vec<&str>) =
        lines.into_iter().partition(|line| is_header_line(line));
    let (essential_lines, context_lines): (Vec<&str>, Vec<&str>) =
        body_lines.into_iter().partition(|line| is_change_line(line));

    let max_context = context_lines.len().min(max_tokens / 20);
    let head = max_context / 2;
    let tail = max_context - head;

    header_lines
        .into_iter()
        .chain(essential_lines)
        .chain(context_lines[..head].iter().copied())
        .chain(context_lines[context_lines.len() - tail..].iter().copied())
        .collect::<Vec<_>>()
        .join("\n")
}
