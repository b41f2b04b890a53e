use super::DiffError;

/// Split text into lines, keeping each `\n` terminator.
///
/// Only the final line can come back without a terminator.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Check that every line but the last is non-empty and ends in `\n`.
pub fn assert_newlines<S: AsRef<str>>(lines: &[S]) -> Result<(), DiffError> {
    let Some((_, head)) = lines.split_last() else {
        return Ok(());
    };

    for (line_index, line) in head.iter().enumerate() {
        let line = line.as_ref();
        if !line.ends_with('\n') {
            return Err(DiffError::MalformedInput {
                line_index,
                line: line.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_keeps_terminators() {
        assert_eq!(split_lines("a\nb\nc"), vec!["a\n", "b\n", "c"]);
        assert_eq!(split_lines("a\n\n"), vec!["a\n", "\n"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_assert_newlines_exempts_last_line() {
        assert!(assert_newlines(&["a\n", "b"]).is_ok());
        assert!(assert_newlines::<&str>(&[]).is_ok());
        assert!(assert_newlines(&["only"]).is_ok());
    }

    #[test]
    fn test_assert_newlines_rejects_unterminated_inner_line() {
        let err = assert_newlines(&["a\n", "b", "c\n"]).expect_err("inner line lacks newline");
        assert_eq!(
            err,
            DiffError::MalformedInput {
                line_index: 1,
                line: "b".to_string(),
            }
        );
    }

    #[test]
    fn test_assert_newlines_rejects_empty_inner_line() {
        assert!(assert_newlines(&["", "b\n"]).is_err());
    }
}
