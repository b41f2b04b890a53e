//! Whole-file rewrites streamed from the generation backend.
//!
//! Text deltas accumulate into a candidate buffer; every time another line
//! completes, a fresh partial diff frame is rendered so the caller can show
//! the rewrite as it is produced.

use crate::api::{ApiClient, StreamParser};
use crate::diff::{split_lines, DiffError, StreamingDiffRenderer};
use crate::types::{ApiMessage, GenerationEvent};
use anyhow::{anyhow, Result};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You rewrite a single source file.\n\
Reply with the complete updated file content and nothing else.\n\
Do not add commentary, explanations, or markdown outside the file content.";

/// What to rewrite and how.
pub struct RewriteRequest<'a> {
    pub path: &'a str,
    pub original: &'a [String],
    pub instruction: &'a str,
}

impl RewriteRequest<'_> {
    pub fn prompt(&self) -> String {
        let content: String = self.original.concat();
        format!(
            "File: {}\n\nTask: {}\n\nCurrent content:\n{}",
            self.path, self.instruction, content
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub content: String,
    pub lines: Vec<String>,
    pub diff: String,
    pub frames: usize,
    pub stop_reason: Option<String>,
}

impl RewriteOutcome {
    pub fn changed(&self, original: &[String]) -> bool {
        self.lines.as_slice() != original
    }
}

/// Drop a markdown fence wrapped around the whole reply, if there is one.
///
/// A leading fence line is removed as soon as it appears; the closing fence
/// only once it is the last non-blank line. [`StreamingRewrite`] skips this
/// for files that themselves open with a fence.
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text;
    if body.starts_with("```") {
        body = match body.find('\n') {
            Some(newline) => &body[newline + 1..],
            None => "",
        };

        let trimmed = body.trim_end();
        if let Some(last_line_start) = trimmed.rfind('\n').map(|index| index + 1).or(Some(0)) {
            if trimmed[last_line_start..].trim_start().starts_with("```") {
                body = &body[..last_line_start];
            }
        }
    }
    body
}

/// Incremental state for one rewrite.
pub struct StreamingRewrite<'a> {
    original: &'a [String],
    display_name: Option<&'a str>,
    renderer: StreamingDiffRenderer<'a>,
    strip_fence: bool,
    buffer: String,
    completed_lines: usize,
    frames: usize,
}

impl<'a> StreamingRewrite<'a> {
    pub fn new(
        original: &'a [String],
        display_name: Option<&'a str>,
        renderer: StreamingDiffRenderer<'a>,
    ) -> Self {
        let opens_with_fence = original
            .first()
            .is_some_and(|line| line.trim_start().starts_with("```"));
        Self {
            original,
            display_name,
            renderer,
            strip_fence: !opens_with_fence,
            buffer: String::new(),
            completed_lines: 0,
            frames: 0,
        }
    }

    /// Candidate text so far, without a wrapping code fence.
    pub fn candidate(&self) -> &str {
        if self.strip_fence {
            strip_code_fence(&self.buffer)
        } else {
            &self.buffer
        }
    }

    /// Append streamed text. Returns a new frame once another line completes
    /// and the candidate lines up with the original.
    pub fn push_text(&mut self, delta: &str) -> Result<Option<String>, DiffError> {
        self.buffer.push_str(delta);
        let newlines = delta.matches('\n').count();
        if newlines == 0 {
            return Ok(None);
        }
        self.completed_lines += newlines;

        let candidate = split_lines(self.candidate());
        let frame = self
            .renderer
            .render(self.original, &candidate, false, self.display_name)?;
        if frame.is_empty() {
            return Ok(None);
        }
        self.frames += 1;
        Ok(Some(frame))
    }

    pub fn completed_lines(&self) -> usize {
        self.completed_lines
    }

    /// Treat the buffer as complete and render the final diff.
    pub fn finish(self, stop_reason: Option<String>) -> Result<RewriteOutcome, DiffError> {
        let content = self.candidate().to_string();
        let lines: Vec<String> = split_lines(&content)
            .into_iter()
            .map(str::to_string)
            .collect();
        let diff = self
            .renderer
            .render(self.original, &lines, true, self.display_name)?;
        Ok(RewriteOutcome {
            content,
            lines,
            diff,
            frames: self.frames,
            stop_reason,
        })
    }
}

/// Stream a rewrite from `client`, handing every partial diff to `on_frame`.
pub async fn run_rewrite<F>(
    client: &ApiClient,
    request: &RewriteRequest<'_>,
    renderer: StreamingDiffRenderer<'_>,
    cancel: &CancellationToken,
    mut on_frame: F,
) -> Result<RewriteOutcome>
where
    F: FnMut(&str) -> Result<()>,
{
    let messages = [ApiMessage::user(request.prompt())];
    let mut stream = client.create_stream(&messages, SYSTEM_PROMPT).await?;
    let mut parser = StreamParser::new();
    let mut session = StreamingRewrite::new(request.original, Some(request.path), renderer);
    let mut stop_reason = None;

    info!(path = request.path, model = client.model(), "streaming rewrite");
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(path = request.path, lines = session.completed_lines(), "rewrite cancelled");
                return Err(anyhow!("rewrite of {} cancelled", request.path));
            }
            next = stream.next() => next,
        };
        let Some(chunk) = next else {
            break;
        };

        for event in parser.process(&chunk?)? {
            match event {
                GenerationEvent::TextDelta(text) => {
                    if let Some(frame) = session.push_text(&text)? {
                        on_frame(&frame)?;
                    }
                }
                GenerationEvent::StopReason(reason) => stop_reason = Some(reason),
                GenerationEvent::Done => debug!("generation stream finished"),
            }
        }
    }

    let leftover = parser.flush();
    if !leftover.trim().is_empty() {
        debug!(bytes = leftover.len(), "discarding unterminated stream frame");
    }

    let outcome = session.finish(stop_reason)?;
    info!(
        path = request.path,
        frames = outcome.frames,
        lines = outcome.lines.len(),
        stop_reason = outcome.stop_reason.as_deref().unwrap_or("<none>"),
        "rewrite complete"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock_client::MockApiClient;
    use std::sync::Arc;

    fn lines(text: &str) -> Vec<String> {
        split_lines(text).into_iter().map(str::to_string).collect()
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("a\nb\n"), "a\nb\n");
        assert_eq!(strip_code_fence("```rust\na\nb\n```\n"), "a\nb\n");
        assert_eq!(strip_code_fence("```\na\n"), "a\n");
        assert_eq!(strip_code_fence("```py"), "");
        assert_eq!(strip_code_fence("```\n```"), "");
    }

    #[test]
    fn test_push_text_renders_on_completed_lines_only() {
        let original = lines("fn a() {}\nfn b() {}\nfn c() {}\n");
        let mut session = StreamingRewrite::new(&original, None, StreamingDiffRenderer::new());

        assert_eq!(session.push_text("fn a() {").expect("ok"), None);
        let frame = session
            .push_text("}\nfn b() {}\n")
            .expect("ok")
            .expect("two lines confirm a frame");
        assert!(frame.contains("lines ["));
        assert!(!frame.contains("-fn c() {}"));
        assert_eq!(session.completed_lines(), 2);
    }

    #[test]
    fn test_push_text_skips_frames_without_alignment() {
        let original = lines("a\nb\n");
        let mut session = StreamingRewrite::new(&original, None, StreamingDiffRenderer::new());
        assert_eq!(session.push_text("zzz\n").expect("ok"), None);
    }

    #[test]
    fn test_finish_strips_fence_and_renders_final_diff() {
        let original = lines("a\nb\nc\n");
        let mut session =
            StreamingRewrite::new(&original, Some("abc.txt"), StreamingDiffRenderer::new());
        session.push_text("```text\na\nB\n").expect("ok");
        session.push_text("```\n").expect("ok");

        let outcome = session.finish(Some("end_turn".to_string())).expect("ok");
        assert_eq!(outcome.content, "a\nB\n");
        assert!(outcome.diff.contains("--- abc.txt original\n"));
        assert!(outcome.diff.contains("-b\n-c\n+B\n"));
        assert!(outcome.changed(&original));
        assert_eq!(outcome.stop_reason.as_deref(), Some("end_turn"));
    }

    #[test]
    fn test_fenced_original_keeps_its_leading_fence() {
        let original = lines("```sh\nmake\n```\n\nNotes\n");
        let mut session =
            StreamingRewrite::new(&original, Some("README.md"), StreamingDiffRenderer::new());
        let frame = session.push_text("```sh\nmake\n").expect("ok");
        assert!(frame.is_some(), "leading fence lines up with the original");
        session.push_text("```\n\nMore notes\n").expect("ok");

        let outcome = session.finish(None).expect("ok");
        assert_eq!(outcome.content, "```sh\nmake\n```\n\nMore notes\n");
        assert!(outcome.diff.contains("-Notes\n+More notes\n"));
        assert!(!outcome.diff.contains("-```sh"));
    }

    #[tokio::test]
    async fn test_run_rewrite_streams_frames_from_backend() {
        let mock = Arc::new(MockApiClient::new(vec![MockApiClient::text_deltas(&[
            "one\n", "TWO\n", "three\n",
        ])]));
        let client = ApiClient::new_mock(mock.clone());
        let original = lines("one\ntwo\nthree\n");
        let request = RewriteRequest {
            path: "nums.txt",
            original: &original,
            instruction: "uppercase two",
        };

        let mut frames = Vec::new();
        let outcome = run_rewrite(
            &client,
            &request,
            StreamingDiffRenderer::new(),
            &CancellationToken::new(),
            |frame| {
                frames.push(frame.to_string());
                Ok(())
            },
        )
        .await
        .expect("rewrite completes");

        assert_eq!(outcome.content, "one\nTWO\nthree\n");
        assert_eq!(outcome.frames, frames.len());
        assert!(!frames.is_empty());
        assert!(outcome.diff.contains("-two\n+TWO\n"));
        assert_eq!(outcome.stop_reason.as_deref(), Some("end_turn"));

        let prompts = mock.prompts();
        assert!(prompts[0][0].content.contains("Task: uppercase two"));
        assert!(prompts[0][0].content.contains("one\ntwo\nthree\n"));
    }

    #[tokio::test]
    async fn test_run_rewrite_honours_cancellation() {
        let mock = Arc::new(MockApiClient::new(vec![MockApiClient::text_deltas(&[
            "one\n",
        ])]));
        let client = ApiClient::new_mock(mock);
        let original = lines("one\n");
        let request = RewriteRequest {
            path: "one.txt",
            original: &original,
            instruction: "noop",
        };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = run_rewrite(
            &client,
            &request,
            StreamingDiffRenderer::new(),
            &cancel,
            |_| Ok(()),
        )
        .await;
        assert!(result.is_err());
    }
}
