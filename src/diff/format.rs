const BAR_WIDTH: usize = 30;
const BAR_FILLED: char = '█';
const BAR_EMPTY: char = '░';
const MIN_FENCE_LEN: usize = 3;

/// Render a fixed-width bar with `floor(30 * pct / 100)` filled slots.
///
/// Out-of-range percentages saturate instead of panicking.
pub fn create_progress_bar(percentage: f64) -> String {
    let filled = ((BAR_WIDTH as f64) * percentage / 100.0).floor().max(0.0) as usize;
    let filled = filled.min(BAR_WIDTH);
    let mut bar = String::with_capacity(BAR_WIDTH * BAR_FILLED.len_utf8());
    bar.extend(std::iter::repeat(BAR_FILLED).take(filled));
    bar.extend(std::iter::repeat(BAR_EMPTY).take(BAR_WIDTH - filled));
    bar
}

/// How far a streaming render has progressed through the original file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub confirmed: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(confirmed: usize, total: usize) -> Self {
        Self { confirmed, total }
    }

    /// Percentage of original lines confirmed; 50 when the original is empty.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            50.0
        } else {
            self.confirmed as f64 * 100.0 / self.total as f64
        }
    }

    pub fn bar(&self) -> String {
        create_progress_bar(self.percent())
    }

    /// The synthetic line that stands in for the candidate's unfinished tail.
    ///
    /// The bar is filled from the unrounded percentage while the label is
    /// rounded, so the two can disagree by one slot at boundaries.
    pub fn marker_line(&self) -> String {
        format!(
            " {:>3} / {:>3} lines [{}] {:>3.0}%\n",
            self.confirmed,
            self.total,
            self.bar(),
            self.percent()
        )
    }
}

/// Pick a backtick fence longer than any backtick run inside `body`.
///
/// At least three backticks are used. Bodies that already hold very long runs
/// get a correspondingly longer fence rather than an unsafe one.
pub fn fence_len(body: &str) -> usize {
    let mut longest = 0usize;
    let mut current = 0usize;
    for ch in body.chars() {
        if ch == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    MIN_FENCE_LEN.max(longest + 1)
}

/// Wrap a diff body in a fenced `diff` block with an optional file header.
pub fn wrap_diff_block(body: &str, display_name: Option<&str>) -> String {
    let len = fence_len(body).max(display_name.map_or(MIN_FENCE_LEN, fence_len));
    let fence = "`".repeat(len);
    let mut show = format!("{fence}diff\n");
    if let Some(name) = display_name {
        show.push_str(&format!("--- {name} original\n"));
        show.push_str(&format!("+++ {name} updated\n"));
    }
    show.push_str(body);
    show.push_str(&format!("{fence}\n\n"));
    show
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_width_is_fixed() {
        for pct in [0.0, 1.0, 33.3, 50.0, 66.67, 99.9, 100.0] {
            assert_eq!(create_progress_bar(pct).chars().count(), BAR_WIDTH);
        }
    }

    #[test]
    fn test_progress_bar_floors_fill() {
        let bar = create_progress_bar(66.666_666);
        assert_eq!(bar.chars().filter(|c| *c == BAR_FILLED).count(), 19);
        assert_eq!(create_progress_bar(0.0), "░".repeat(30));
        assert_eq!(create_progress_bar(100.0), "█".repeat(30));
    }

    #[test]
    fn test_progress_bar_saturates_out_of_range() {
        assert_eq!(create_progress_bar(-10.0), "░".repeat(30));
        assert_eq!(create_progress_bar(150.0), "█".repeat(30));
    }

    #[test]
    fn test_progress_percent_defaults_to_half_for_empty_original() {
        assert_eq!(Progress::new(0, 0).percent(), 50.0);
        assert_eq!(Progress::new(3, 4).percent(), 75.0);
    }

    #[test]
    fn test_marker_line_rounds_label() {
        let line = Progress::new(2, 3).marker_line();
        assert_eq!(
            line,
            format!("   2 /   3 lines [{}{}]  67%\n", "█".repeat(20), "░".repeat(10))
        );
    }

    #[test]
    fn test_fence_len_steps_past_longest_run() {
        assert_eq!(fence_len("plain"), 3);
        assert_eq!(fence_len("a ` b `` c"), 3);
        assert_eq!(fence_len("```rust\n```\n"), 4);
        assert_eq!(fence_len("````` and ```"), 6);
        assert_eq!(fence_len(&"`".repeat(9)), 10);
    }

    #[test]
    fn test_wrap_diff_block_with_header() {
        let block = wrap_diff_block("@@ -1 +1 @@\n-a\n+b\n", Some("src/lib.rs"));
        assert_eq!(
            block,
            "```diff\n--- src/lib.rs original\n+++ src/lib.rs updated\n@@ -1 +1 @@\n-a\n+b\n```\n\n"
        );
    }
}
