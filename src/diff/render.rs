use super::alignment::find_last_non_deleted;
use super::format::{wrap_diff_block, Progress};
use super::lines::assert_newlines;
use super::unified::unified_diff;
use super::{DiffError, DEFAULT_CONTEXT_LINES};

/// Source of the authoritative content for a named file.
///
/// Returning `None` (or no lines at all) tells the renderer to keep the
/// original the caller passed in.
pub trait ContentResolver {
    fn resolve(&self, name: &str) -> Option<Vec<String>>;
}

/// Renders progress-annotated diffs of a file rewrite while it streams in.
#[derive(Clone, Copy)]
pub struct StreamingDiffRenderer<'r> {
    context_lines: usize,
    resolver: Option<&'r dyn ContentResolver>,
}

impl Default for StreamingDiffRenderer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> StreamingDiffRenderer<'r> {
    pub fn new() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
            resolver: None,
        }
    }

    pub fn with_context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }

    pub fn with_resolver(mut self, resolver: &'r dyn ContentResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Render the diff between `original` and a possibly partial `candidate`.
    ///
    /// Unless `final_render` is set, only the prefix of `original` that the
    /// candidate has confirmed is compared, and the candidate's last line is
    /// replaced by a progress marker. Returns an empty string when the
    /// candidate does not line up with anything yet.
    pub fn render<A, B>(
        &self,
        original: &[A],
        candidate: &[B],
        final_render: bool,
        display_name: Option<&str>,
    ) -> Result<String, DiffError>
    where
        A: AsRef<str>,
        B: AsRef<str>,
    {
        if let (Some(resolver), Some(name)) = (self.resolver, display_name) {
            if let Some(canonical) = resolver.resolve(name).filter(|lines| !lines.is_empty()) {
                return self.render_lines(&canonical, candidate, final_render, display_name);
            }
        }
        self.render_lines(original, candidate, final_render, display_name)
    }

    fn render_lines<A, B>(
        &self,
        original: &[A],
        candidate: &[B],
        final_render: bool,
        display_name: Option<&str>,
    ) -> Result<String, DiffError>
    where
        A: AsRef<str>,
        B: AsRef<str>,
    {
        assert_newlines(original)?;

        let total = original.len();
        let confirmed = if final_render {
            Some(total)
        } else {
            find_last_non_deleted(original, candidate)
        };
        let Some(confirmed) = confirmed else {
            return Ok(String::new());
        };

        let progress = Progress::new(confirmed, total);
        let marker = progress.marker_line();

        let mut updated: Vec<&str> = candidate.iter().map(AsRef::as_ref).collect();
        if !final_render {
            updated.pop();
            updated.push(&marker);
        }

        let mut diff = unified_diff(&original[..confirmed], &updated, self.context_lines);
        if !diff.ends_with('\n') {
            diff.push('\n');
        }

        Ok(wrap_diff_block(&diff, display_name))
    }
}

/// Render with default settings and no canonical-content lookup.
pub fn diff_partial_update<A, B>(
    original: &[A],
    candidate: &[B],
    final_render: bool,
    display_name: Option<&str>,
) -> Result<String, DiffError>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    StreamingDiffRenderer::new().render(original, candidate, final_render, display_name)
}
