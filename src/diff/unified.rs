use super::alignment::{edit_script, EditOp};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpTag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// A run of lines sharing one tag, as ranges into both sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opcode {
    pub tag: OpTag,
    pub old: Range<usize>,
    pub new: Range<usize>,
}

impl Opcode {
    fn new(tag: OpTag, old: Range<usize>, new: Range<usize>) -> Self {
        Self { tag, old, new }
    }
}

/// Collapse the edit script into equal/replace/delete/insert runs.
pub fn opcodes<A, B>(original: &[A], candidate: &[B]) -> Vec<Opcode>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let script = edit_script(original, candidate);
    let mut out = Vec::new();
    let mut old_pos = 0usize;
    let mut new_pos = 0usize;
    let mut index = 0usize;

    while index < script.len() {
        let (old_start, new_start) = (old_pos, new_pos);
        if matches!(script[index], EditOp::Kept { .. }) {
            while index < script.len() && matches!(script[index], EditOp::Kept { .. }) {
                old_pos += 1;
                new_pos += 1;
                index += 1;
            }
            out.push(Opcode::new(OpTag::Equal, old_start..old_pos, new_start..new_pos));
            continue;
        }

        while index < script.len() {
            match script[index] {
                EditOp::Kept { .. } => break,
                EditOp::Removed { .. } => old_pos += 1,
                EditOp::Added { .. } => new_pos += 1,
            }
            index += 1;
        }
        let tag = match (old_pos > old_start, new_pos > new_start) {
            (true, true) => OpTag::Replace,
            (true, false) => OpTag::Delete,
            _ => OpTag::Insert,
        };
        out.push(Opcode::new(tag, old_start..old_pos, new_start..new_pos));
    }

    out
}

/// Split opcodes into hunks, keeping at most `context` equal lines around
/// each change. Runs of unchanged lines longer than twice the context start a
/// new hunk.
pub fn grouped_opcodes(codes: Vec<Opcode>, context: usize) -> Vec<Vec<Opcode>> {
    let mut codes = codes;
    if codes.is_empty() {
        return Vec::new();
    }

    if let Some(first) = codes.first_mut() {
        if first.tag == OpTag::Equal {
            first.old.start = first.old.start.max(first.old.end.saturating_sub(context));
            first.new.start = first.new.start.max(first.new.end.saturating_sub(context));
        }
    }
    if let Some(last) = codes.last_mut() {
        if last.tag == OpTag::Equal {
            last.old.end = last.old.end.min(last.old.start + context);
            last.new.end = last.new.end.min(last.new.start + context);
        }
    }

    let mut groups = Vec::new();
    let mut group = Vec::new();
    for mut code in codes {
        if code.tag == OpTag::Equal && code.old.len() > context * 2 {
            group.push(Opcode::new(
                OpTag::Equal,
                code.old.start..code.old.end.min(code.old.start + context),
                code.new.start..code.new.end.min(code.new.start + context),
            ));
            groups.push(std::mem::take(&mut group));
            code.old.start = code.old.start.max(code.old.end.saturating_sub(context));
            code.new.start = code.new.start.max(code.new.end.saturating_sub(context));
        }
        group.push(code);
    }

    if !(group.is_empty() || (group.len() == 1 && group[0].tag == OpTag::Equal)) {
        groups.push(group);
    }
    groups.retain(|group| group.iter().any(|code| code.tag != OpTag::Equal));
    groups
}

/// Render a unified diff body (hunks only, no `---`/`+++` header lines).
///
/// Every emitted line ends in `\n`, including lines whose source text was
/// the unterminated last line of a sequence.
pub fn unified_diff<A, B>(original: &[A], candidate: &[B], context: usize) -> String
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let mut out = String::new();
    for group in grouped_opcodes(opcodes(original, candidate), context) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            format_range(first.old.start, last.old.end),
            format_range(first.new.start, last.new.end)
        ));

        for code in &group {
            match code.tag {
                OpTag::Equal => push_lines(&mut out, ' ', &original[code.old.clone()]),
                OpTag::Delete => push_lines(&mut out, '-', &original[code.old.clone()]),
                OpTag::Insert => push_lines(&mut out, '+', &candidate[code.new.clone()]),
                OpTag::Replace => {
                    push_lines(&mut out, '-', &original[code.old.clone()]);
                    push_lines(&mut out, '+', &candidate[code.new.clone()]);
                }
            }
        }
    }
    out
}

fn push_lines<S: AsRef<str>>(out: &mut String, marker: char, lines: &[S]) {
    for line in lines {
        let line = line.as_ref();
        out.push(marker);
        out.push_str(line);
        if !line.ends_with('\n') {
            out.push('\n');
        }
    }
}

/// `start,len` with 1-based start; a single line prints only its number and
/// an empty range points at the line before it.
fn format_range(start: usize, stop: usize) -> String {
    let length = stop - start;
    match length {
        1 => format!("{}", start + 1),
        0 => format!("{start},0"),
        _ => format!("{},{length}", start + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(count: usize) -> Vec<String> {
        (1..=count).map(|n| format!("line {n}\n")).collect()
    }

    #[test]
    fn test_unified_diff_single_replacement() {
        let diff = unified_diff(&["a\n", "b\n", "c\n"], &["a\n", "X\n", "c\n"], 5);
        assert_eq!(diff, "@@ -1,3 +1,3 @@\n a\n-b\n+X\n c\n");
    }

    #[test]
    fn test_unified_diff_identical_is_empty() {
        let lines = numbered(4);
        assert_eq!(unified_diff(&lines, &lines, 5), "");
    }

    #[test]
    fn test_unified_diff_splits_distant_hunks() {
        let original = numbered(20);
        let mut candidate = original.clone();
        candidate[1] = "changed 2\n".to_string();
        candidate[17] = "changed 18\n".to_string();

        let diff = unified_diff(&original, &candidate, 2);
        let headers: Vec<&str> = diff.lines().filter(|l| l.starts_with("@@")).collect();
        assert_eq!(headers, vec!["@@ -1,4 +1,4 @@", "@@ -16,5 +16,5 @@"]);
    }

    #[test]
    fn test_unified_diff_trims_context() {
        let original = numbered(12);
        let mut candidate = original.clone();
        candidate[6] = "seven\n".to_string();

        let diff = unified_diff(&original, &candidate, 1);
        assert_eq!(diff, "@@ -6,3 +6,3 @@\n line 6\n-line 7\n+seven\n line 8\n");
    }

    #[test]
    fn test_unified_diff_insert_into_empty() {
        let empty: [&str; 0] = [];
        assert_eq!(unified_diff(&empty, &["new\n"], 5), "@@ -0,0 +1 @@\n+new\n");
    }

    #[test]
    fn test_unified_diff_terminates_unterminated_lines() {
        let diff = unified_diff(&["a\n", "b"], &["a\n", "c"], 5);
        assert_eq!(diff, "@@ -1,2 +1,2 @@\n a\n-b\n+c\n");
    }

    #[test]
    fn test_opcodes_tags() {
        let codes = opcodes(&["a\n", "b\n", "c\n"], &["a\n", "c\n", "d\n"]);
        let tags: Vec<OpTag> = codes.iter().map(|c| c.tag).collect();
        assert_eq!(
            tags,
            vec![OpTag::Equal, OpTag::Delete, OpTag::Equal, OpTag::Insert]
        );
        assert_eq!(codes[3].new, 2..3);
    }
}
